//! Content-Transfer-Encoding decoders: base64 and quoted-printable.

use std::borrow::Cow;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use crate::error::{EmlError, Result};

/// A body transfer encoding, as named by `Content-Transfer-Encoding`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferEncoding {
    Base64,
    QuotedPrintable,
    /// `7bit`, `8bit`, `binary`, absent or unrecognized: octets are used as-is.
    Identity,
}

impl TransferEncoding {
    /// Classify a header value; matching ignores case and surrounding whitespace.
    pub fn from_header(value: Option<&str>) -> Self {
        match value.map(|v| v.trim().to_ascii_lowercase()).as_deref() {
            Some("base64") => Self::Base64,
            Some("quoted-printable") => Self::QuotedPrintable,
            _ => Self::Identity,
        }
    }

    /// Decode `raw` body octets.
    pub fn decode<'a>(&self, raw: &'a [u8]) -> Result<Cow<'a, [u8]>> {
        match self {
            Self::Base64 => decode_base64(raw).map(Cow::Owned),
            Self::QuotedPrintable => decode_quoted_printable(raw).map(Cow::Owned),
            Self::Identity => Ok(Cow::Borrowed(raw)),
        }
    }
}

/// Decode a base64 body. Line breaks and blanks between characters are ignored;
/// anything else outside the standard alphabet, or bad padding, is an error.
pub fn decode_base64(raw: &[u8]) -> Result<Vec<u8>> {
    let cleaned: Vec<u8> = raw
        .iter()
        .copied()
        .filter(|b| !matches!(b, b'\r' | b'\n' | b' ' | b'\t'))
        .collect();
    STANDARD.decode(&cleaned).map_err(|e| EmlError::Encoding {
        encoding: "base64".to_string(),
        reason: e.to_string(),
    })
}

/// Decode a quoted-printable body (RFC 2045 §6.7).
///
/// Trailing blanks on each line are dropped, a final `=` is a soft line break,
/// and `=XX` (either case of hex digit) is an escaped octet. Line endings are
/// kept as they appear in the input.
pub fn decode_quoted_printable(raw: &[u8]) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(raw.len());
    let mut rest = raw;
    let mut line_no = 1;

    while !rest.is_empty() {
        let (line, ending, next): (&[u8], &[u8], &[u8]) =
            match rest.iter().position(|&b| b == b'\n') {
                Some(pos) if pos > 0 && rest[pos - 1] == b'\r' => {
                    (&rest[..pos - 1], &b"\r\n"[..], &rest[pos + 1..])
                }
                Some(pos) => (&rest[..pos], &b"\n"[..], &rest[pos + 1..]),
                None => (rest, &b""[..], &rest[rest.len()..]),
            };

        let line = trim_trailing_blanks(line);
        let (line, soft_break) = match line.strip_suffix(b"=") {
            Some(stripped) => (stripped, true),
            None => (line, false),
        };

        decode_qp_line(line, &mut out).map_err(|reason| EmlError::Encoding {
            encoding: "quoted-printable".to_string(),
            reason: format!("line {line_no}: {reason}"),
        })?;
        if !soft_break {
            out.extend_from_slice(ending);
        }

        rest = next;
        line_no += 1;
    }

    Ok(out)
}

fn decode_qp_line(line: &[u8], out: &mut Vec<u8>) -> std::result::Result<(), String> {
    let mut i = 0;
    while i < line.len() {
        match line[i] {
            b'=' => {
                let pair = line.get(i + 1..i + 3);
                match pair.and_then(|p| Some((hex_val(p[0])? << 4) | hex_val(p[1])?)) {
                    Some(byte) => out.push(byte),
                    None => {
                        let shown = String::from_utf8_lossy(&line[i..line.len().min(i + 3)]);
                        return Err(format!("invalid escape sequence {shown:?}"));
                    }
                }
                i += 3;
            }
            b if (b < b' ' && b != b'\t' && b != b'\r') || b == 0x7f => {
                return Err(format!("unexpected control byte 0x{b:02x}"));
            }
            b => {
                out.push(b);
                i += 1;
            }
        }
    }
    Ok(())
}

fn trim_trailing_blanks(line: &[u8]) -> &[u8] {
    let end = line
        .iter()
        .rposition(|b| !matches!(b, b' ' | b'\t'))
        .map_or(0, |pos| pos + 1);
    &line[..end]
}

pub(crate) fn hex_val(b: u8) -> Option<u8> {
    (b as char).to_digit(16).map(|d| d as u8)
}
