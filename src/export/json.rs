//! JSON rendering of a decoded message tree.

use serde::Serialize;

use crate::model::headers::HeaderMap;
use crate::model::message::{Message, PartKind};
use crate::parser::content_type::ContentType;

use super::format_path;

/// Serializable view of one node.
#[derive(Debug, Serialize)]
pub struct MessageView<'a> {
    pub path: String,
    pub kind: PartKind,
    pub content_type: &'a ContentType,
    pub headers: &'a HeaderMap,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw: Option<RawView<'a>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub parts: Vec<MessageView<'a>>,
}

/// Undecoded data of a node; byte fields are converted lossily to UTF-8.
#[derive(Debug, Serialize)]
pub struct RawView<'a> {
    pub headers: &'a HeaderMap,
    pub header_block: String,
    pub body: String,
}

impl<'a> MessageView<'a> {
    pub fn new(message: &'a Message, include_raw: bool) -> Self {
        Self::build(message, Vec::new(), include_raw)
    }

    fn build(message: &'a Message, path: Vec<usize>, include_raw: bool) -> Self {
        let parts = message
            .parts
            .iter()
            .enumerate()
            .map(|(index, child)| {
                let mut child_path = path.clone();
                child_path.push(index);
                Self::build(child, child_path, include_raw)
            })
            .collect();
        let raw = include_raw.then(|| RawView {
            headers: &message.raw_headers,
            header_block: String::from_utf8_lossy(&message.raw_header_block).into_owned(),
            body: String::from_utf8_lossy(&message.raw_body).into_owned(),
        });
        Self {
            path: format_path(&path),
            kind: message.kind,
            content_type: &message.content_type,
            headers: &message.decoded_headers,
            body: message.decoded_body.as_deref(),
            raw,
            parts,
        }
    }
}

/// Serialize `message` as JSON.
pub fn to_json(message: &Message, include_raw: bool, pretty: bool) -> serde_json::Result<String> {
    let view = MessageView::new(message, include_raw);
    if pretty {
        serde_json::to_string_pretty(&view)
    } else {
        serde_json::to_string(&view)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::eml::parse_bytes;

    const MESSAGE: &[u8] = b"Subject: =?ISO-8859-1?Q?caf=E9?=\r\n\
Content-Type: multipart/alternative; boundary=\"sep\"\r\n\
\r\n\
--sep\r\n\
Content-Type: text/plain\r\n\
\r\n\
plain\r\n\
--sep--\r\n";

    #[test]
    fn test_json_structure() {
        let msg = parse_bytes(MESSAGE).unwrap();
        let json = to_json(&msg, false, false).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["path"], "root");
        assert_eq!(value["kind"], "multipart");
        assert_eq!(value["headers"]["Subject"][0], "café");
        assert_eq!(value["content_type"]["media_type"], "multipart/alternative");
        assert!(value.get("body").is_none());
        assert!(value.get("raw").is_none());
        assert_eq!(value["parts"][0]["path"], "0");
        assert_eq!(value["parts"][0]["body"], "plain");
    }

    #[test]
    fn test_json_raw_view() {
        let msg = parse_bytes(MESSAGE).unwrap();
        let value: serde_json::Value =
            serde_json::from_str(&to_json(&msg, true, true).unwrap()).unwrap();
        assert_eq!(value["raw"]["headers"]["Subject"][0], "=?ISO-8859-1?Q?caf=E9?=");
        assert_eq!(value["parts"][0]["raw"]["body"], "plain");
        assert_eq!(
            value["parts"][0]["raw"]["header_block"],
            "Content-Type: text/plain\r\n\r\n"
        );
    }
}
