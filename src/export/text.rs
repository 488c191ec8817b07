//! Plain-text rendering: tree outlines and header listings.

use std::fmt::Write;

use humansize::{format_size, BINARY};

use crate::model::headers::HeaderMap;
use crate::model::message::{Message, PartKind};

use super::format_path;

/// Indented outline of the tree, one node per line.
///
/// Each line shows the index path, media type, kind, raw body size and, when
/// present, the decoded Subject.
pub fn render_tree(message: &Message) -> String {
    let mut out = String::new();
    for (path, node) in message.walk() {
        let indent = "  ".repeat(path.len());
        let kind = match node.kind {
            PartKind::Text => "text",
            PartKind::Multipart => "multipart",
            PartKind::Opaque => "opaque",
        };
        let size = format_size(node.raw_body.len() as u64, BINARY);
        let _ = write!(
            out,
            "{indent}{}  {}  [{kind}, {size}]",
            format_path(&path),
            node.content_type.media_type
        );
        if let Some(charset) = node.content_type.charset() {
            let _ = write!(out, "  charset={charset}");
        }
        if node.is_multipart() {
            let _ = write!(out, "  {} part(s)", node.parts.len());
        }
        if let Some(subject) = node.subject() {
            let _ = write!(out, "  Subject: {subject}");
        }
        out.push('\n');
    }
    out
}

/// `Name: value` lines, one per value, in header order.
pub fn render_headers(headers: &HeaderMap) -> String {
    let mut out = String::new();
    for (name, values) in headers.iter() {
        for value in values {
            let _ = writeln!(out, "{name}: {value}");
        }
    }
    out
}
