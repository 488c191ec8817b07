//! Boundary-delimited body splitting (RFC 2046 §5.1.1).

use super::header::split_header_block;
use crate::error::{EmlError, Result};
use crate::model::headers::HeaderMap;

/// One body part as it appears between two delimiter lines.
#[derive(Debug)]
pub struct RawPart<'a> {
    /// Unfolded header fields of the part.
    pub headers: HeaderMap,
    /// The part's header block, including its terminating empty line.
    pub header_block: &'a [u8],
    /// Everything after the header block up to the next delimiter's line break.
    pub body: &'a [u8],
}

/// Split a multipart body at `boundary`.
///
/// The preamble before the first delimiter and the epilogue after the close
/// delimiter are ignored. The line break in front of a delimiter belongs to
/// the delimiter, so part bodies never end with it.
pub fn split_parts<'a>(body: &'a [u8], boundary: &str) -> Result<Vec<RawPart<'a>>> {
    let delimiter = format!("--{boundary}");
    let mut parts = Vec::new();
    let mut open: Option<usize> = None;
    let mut line_start = 0;

    loop {
        let eol = body[line_start..]
            .iter()
            .position(|&b| b == b'\n')
            .map(|p| line_start + p);
        let next = eol.map_or(body.len(), |e| e + 1);
        let line = &body[line_start..eol.unwrap_or(body.len())];

        if let Some(is_close) = match_delimiter(line, delimiter.as_bytes()) {
            if let Some(start) = open {
                let end = strip_line_break(body, start, line_start);
                let part =
                    parse_part(&body[start..end]).map_err(|e| EmlError::in_part(parts.len(), e))?;
                parts.push(part);
            }
            if is_close {
                if parts.is_empty() {
                    return Err(EmlError::Format(format!(
                        "multipart body with boundary {boundary:?} has no parts"
                    )));
                }
                return Ok(parts);
            }
            open = Some(next);
        }

        if eol.is_none() {
            break;
        }
        line_start = next;
    }

    Err(EmlError::Format(match open {
        Some(_) => format!("multipart body ended before closing boundary {boundary:?}"),
        None => format!("no boundary {boundary:?} found in multipart body"),
    }))
}

/// `Some(is_close)` when `line` is a delimiter line for `delimiter`.
fn match_delimiter(line: &[u8], delimiter: &[u8]) -> Option<bool> {
    let line = line.strip_suffix(b"\r").unwrap_or(line);
    let rest = line.strip_prefix(delimiter)?;
    let (is_close, rest) = match rest.strip_prefix(b"--") {
        Some(rest) => (true, rest),
        None => (false, rest),
    };
    // transport padding
    rest.iter()
        .all(|b| matches!(b, b' ' | b'\t'))
        .then_some(is_close)
}

/// End of the part that starts at `start`, excluding the CRLF or LF in front
/// of the delimiter line at `delimiter_start`.
fn strip_line_break(body: &[u8], start: usize, delimiter_start: usize) -> usize {
    let mut end = delimiter_start;
    if end > start && body[end - 1] == b'\n' {
        end -= 1;
        if end > start && body[end - 1] == b'\r' {
            end -= 1;
        }
    }
    end
}

fn parse_part(region: &[u8]) -> Result<RawPart<'_>> {
    let (headers, header_len) = split_header_block(region)?;
    Ok(RawPart {
        headers,
        header_block: &region[..header_len],
        body: &region[header_len..],
    })
}
