//! The decoded MIME tree.

use serde::Serialize;

use super::headers::HeaderMap;
use crate::error::Result;
use crate::parser::content_type::ContentType;
use crate::parser::transfer::TransferEncoding;

/// How an entity was classified by its Content-Type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PartKind {
    /// `text/*`: `decoded_body` is set, `parts` is empty.
    Text,
    /// `multipart/*`: `parts` is non-empty, `decoded_body` is `None`.
    Multipart,
    /// Any other media type. Only the raw body is kept; see
    /// [`Message::decoded_bytes`] for its transfer-decoded octets.
    Opaque,
}

/// One MIME entity: the whole message or one body part.
///
/// Nodes are built once by the parser and own their children.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    /// Unfolded, undecoded header fields.
    pub raw_headers: HeaderMap,

    /// Header block exactly as it appeared, including the empty line that
    /// ends it. `raw_header_block` followed by `raw_body` reproduces the
    /// entity's original bytes.
    pub raw_header_block: Vec<u8>,

    /// Body bytes before any transfer or charset decoding.
    /// Set for every node, including multipart containers.
    pub raw_body: Vec<u8>,

    /// Same keys and value counts as `raw_headers`, encoded-words decoded.
    pub decoded_headers: HeaderMap,

    /// Transfer-decoded and transcoded text, for `text/*` entities only.
    pub decoded_body: Option<String>,

    /// Child entities of a `multipart/*` entity, in order.
    pub parts: Vec<Message>,

    pub kind: PartKind,

    /// Parsed Content-Type (or the RFC 2045 default when that was requested).
    pub content_type: ContentType,
}

impl Message {
    pub fn is_text(&self) -> bool {
        self.kind == PartKind::Text
    }

    pub fn is_multipart(&self) -> bool {
        self.kind == PartKind::Multipart
    }

    pub fn is_opaque(&self) -> bool {
        self.kind == PartKind::Opaque
    }

    /// Decoded `Subject`, if present.
    pub fn subject(&self) -> Option<&str> {
        self.decoded_headers.first("Subject")
    }

    pub fn transfer_encoding(&self) -> TransferEncoding {
        TransferEncoding::from_header(self.raw_headers.first("Content-Transfer-Encoding"))
    }

    /// The body with its transfer encoding removed, without charset decoding.
    pub fn decoded_bytes(&self) -> Result<Vec<u8>> {
        Ok(self.transfer_encoding().decode(&self.raw_body)?.into_owned())
    }

    /// The entity's original bytes: header block followed by body.
    pub fn raw_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.raw_header_block.len() + self.raw_body.len());
        bytes.extend_from_slice(&self.raw_header_block);
        bytes.extend_from_slice(&self.raw_body);
        bytes
    }

    /// The descendant at `path` (child indexes from this node); `&[]` is `self`.
    pub fn part(&self, path: &[usize]) -> Option<&Message> {
        path.iter()
            .try_fold(self, |node, &index| node.parts.get(index))
    }

    /// All nodes in depth-first order, each with its index path.
    pub fn walk(&self) -> Vec<(Vec<usize>, &Message)> {
        let mut out = Vec::new();
        let mut stack = vec![(Vec::new(), self)];
        while let Some((path, node)) = stack.pop() {
            for (index, child) in node.parts.iter().enumerate().rev() {
                let mut child_path = path.clone();
                child_path.push(index);
                stack.push((child_path, child));
            }
            out.push((path, node));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf(media_type: &str, body: &str) -> Message {
        Message {
            raw_headers: HeaderMap::new(),
            raw_header_block: b"\n".to_vec(),
            raw_body: body.as_bytes().to_vec(),
            decoded_headers: HeaderMap::new(),
            decoded_body: Some(body.to_string()),
            parts: Vec::new(),
            kind: PartKind::Text,
            content_type: ContentType::parse(media_type).unwrap(),
        }
    }

    fn container(parts: Vec<Message>) -> Message {
        Message {
            decoded_body: None,
            parts,
            kind: PartKind::Multipart,
            content_type: ContentType::parse("multipart/mixed; boundary=x").unwrap(),
            ..leaf("multipart/mixed", "")
        }
    }

    #[test]
    fn test_part_and_walk_order() {
        let tree = container(vec![
            leaf("text/plain", "a"),
            container(vec![leaf("text/plain", "b"), leaf("text/html", "c")]),
        ]);

        assert_eq!(tree.part(&[]).unwrap().kind, PartKind::Multipart);
        assert_eq!(tree.part(&[1, 1]).unwrap().decoded_body.as_deref(), Some("c"));
        assert!(tree.part(&[2]).is_none());

        let paths: Vec<Vec<usize>> = tree.walk().into_iter().map(|(p, _)| p).collect();
        assert_eq!(
            paths,
            vec![vec![], vec![0], vec![1], vec![1, 0], vec![1, 1]]
        );
    }

    #[test]
    fn test_raw_bytes_joins_header_block_and_body() {
        assert_eq!(leaf("text/plain", "body").raw_bytes(), b"\nbody");
    }

    #[test]
    fn test_decoded_bytes_uses_transfer_encoding() {
        let mut node = leaf("application/octet-stream", "AAEC");
        node.kind = PartKind::Opaque;
        node.raw_headers.append("Content-Transfer-Encoding", "base64");
        assert_eq!(node.decoded_bytes().unwrap(), vec![0u8, 1, 2]);
        assert!(node.is_opaque());
    }
}
