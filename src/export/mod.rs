//! Rendering of decoded message trees: indented text outlines and JSON.

pub mod json;
pub mod text;

use std::num::ParseIntError;

/// Dotted form of an index path; the root is `root`.
pub fn format_path(path: &[usize]) -> String {
    if path.is_empty() {
        return "root".to_string();
    }
    path.iter()
        .map(|i| i.to_string())
        .collect::<Vec<_>>()
        .join(".")
}

/// Parse a dotted index path such as `1.0`. Empty input and `root` select the root.
pub fn parse_path(s: &str) -> Result<Vec<usize>, ParseIntError> {
    let s = s.trim();
    if s.is_empty() || s == "root" {
        return Ok(Vec::new());
    }
    s.split('.').map(|piece| piece.trim().parse()).collect()
}
