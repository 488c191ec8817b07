//! RFC 5322 header handling: splitting the header block, unfolding, and
//! decoding encoded-words (RFC 2047).

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use super::charset;
use super::transfer::hex_val;
use crate::error::{EmlError, Result};
use crate::model::headers::HeaderMap;

/// Split the header block off the front of `data`.
///
/// Returns the unfolded fields and the length of the header block in bytes,
/// including the empty line that terminates it. End of input also ends the
/// block, in which case the body is empty.
pub fn split_header_block(data: &[u8]) -> Result<(HeaderMap, usize)> {
    let mut lines: Vec<&[u8]> = Vec::new();
    let mut pos = if data.starts_with(&[0xEF, 0xBB, 0xBF]) { 3 } else { 0 };
    let mut header_len = data.len();

    while pos < data.len() {
        let (line, next) = match data[pos..].iter().position(|&b| b == b'\n') {
            Some(nl) => (&data[pos..pos + nl], pos + nl + 1),
            None => (&data[pos..], data.len()),
        };
        let line = line.strip_suffix(b"\r").unwrap_or(line);
        if line.is_empty() {
            header_len = next;
            break;
        }
        lines.push(line);
        pos = next;
    }

    let headers = unfold_headers(&lines)?;
    Ok((headers, header_len))
}

/// Decode raw header bytes to a string.
///
/// Tries UTF-8 first, then falls back to Windows-1252 (which accepts every byte).
fn decode_header_bytes(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(s) => s.to_string(),
        Err(_) => {
            let (decoded, _, _) = encoding_rs::WINDOWS_1252.decode(bytes);
            decoded.into_owned()
        }
    }
}

/// Unfold header lines: join continuation lines (starting with space or tab)
/// with the previous field, separated by a single space.
fn unfold_headers(lines: &[&[u8]]) -> Result<HeaderMap> {
    let mut headers = HeaderMap::new();
    let mut current: Option<(String, String)> = None;

    for raw in lines {
        let line = decode_header_bytes(raw);

        if line.starts_with(' ') || line.starts_with('\t') {
            let Some((_, value)) = current.as_mut() else {
                return Err(EmlError::Format(format!(
                    "header block starts with a continuation line: {line:?}"
                )));
            };
            let piece = line.trim();
            if !piece.is_empty() {
                value.push(' ');
                value.push_str(piece);
            }
            continue;
        }

        let Some(colon_pos) = line.find(':') else {
            return Err(EmlError::Format(format!("malformed header line: {line:?}")));
        };
        let name = &line[..colon_pos];
        if !is_valid_field_name(name) {
            return Err(EmlError::Format(format!("invalid header field name: {name:?}")));
        }

        if let Some((name, value)) = current.take() {
            headers.append(&name, value.trim());
        }
        current = Some((name.to_string(), line[colon_pos + 1..].trim().to_string()));
    }

    if let Some((name, value)) = current {
        headers.append(&name, value.trim());
    }
    Ok(headers)
}

fn is_valid_field_name(name: &str) -> bool {
    !name.is_empty() && name.bytes().all(|b| b.is_ascii_graphic() && b != b':')
}

/// Decode every value of every field, keeping keys and value counts.
pub fn decode_headers(raw: &HeaderMap) -> Result<HeaderMap> {
    raw.try_map_values(decode_field)
}

/// Decode the encoded-words of one header value.
///
/// Fails with [`EmlError::HeaderDecode`] naming `field` and `value` when an
/// encoded word carries a malformed payload.
pub fn decode_field(field: &str, value: &str) -> Result<String> {
    decode_encoded_words(value).map_err(|reason| EmlError::HeaderDecode {
        field: field.to_string(),
        value: value.to_string(),
        reason,
    })
}

/// Decode RFC 2047 encoded-words in a header value.
///
/// Example: `"=?UTF-8?B?SG9sYQ==?= =?UTF-8?B?IG11bmRv?="` → `"Hola mundo"`
///
/// Text that does not form a complete encoded word is kept literally.
pub fn decode_encoded_words(input: &str) -> std::result::Result<String, String> {
    if !input.contains("=?") {
        return Ok(input.to_string());
    }

    let mut result = String::with_capacity(input.len());
    let mut remaining = input;
    let mut last_was_encoded = false;

    while let Some(start) = remaining.find("=?") {
        let before = &remaining[..start];
        let after_start = &remaining[start + 2..];

        match EncodedWord::parse(after_start) {
            Some(word) => {
                // Whitespace between two encoded words is dropped (RFC 2047 §6.2)
                if !last_was_encoded || !before.trim().is_empty() {
                    result.push_str(before);
                }
                result.push_str(&word.decode()?);
                remaining = &after_start[word.consumed..];
                last_was_encoded = true;
            }
            None => {
                result.push_str(before);
                result.push_str("=?");
                remaining = after_start;
                last_was_encoded = false;
            }
        }
    }

    result.push_str(remaining);
    Ok(result)
}

struct EncodedWord<'a> {
    charset: &'a str,
    encoding: u8,
    text: &'a str,
    consumed: usize, // bytes consumed from the string *after* the initial "=?"
}

impl<'a> EncodedWord<'a> {
    /// Recognize `charset?B|Q?encoded_text?=` at the start of `s`.
    fn parse(s: &'a str) -> Option<Self> {
        let first_q = s.find('?')?;
        let charset = &s[..first_q];
        if charset.is_empty() || charset.contains(char::is_whitespace) {
            return None;
        }

        let rest = &s[first_q + 1..];
        let encoding = *rest.as_bytes().first()?;
        if !matches!(encoding, b'B' | b'b' | b'Q' | b'q') {
            return None;
        }
        let rest = rest[1..].strip_prefix('?')?;
        let end = rest.find("?=")?;

        Some(Self {
            charset,
            encoding: encoding.to_ascii_uppercase(),
            text: &rest[..end],
            consumed: first_q + 3 + end + 2,
        })
    }

    fn decode(&self) -> std::result::Result<String, String> {
        let bytes = match self.encoding {
            b'B' => STANDARD
                .decode(self.text)
                .map_err(|e| format!("invalid base64 in encoded word: {e}"))?,
            _ => decode_q_encoding(self.text)?,
        };
        // RFC 2231 allows `charset*language`
        let charset_name = self.charset.split('*').next().unwrap_or(self.charset);
        Ok(charset::decode(charset_name, &bytes))
    }
}

/// Decode Q-encoding (RFC 2047): underscores → spaces, `=XX` → byte.
fn decode_q_encoding(input: &str) -> std::result::Result<Vec<u8>, String> {
    let bytes = input.as_bytes();
    let mut result = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'_' => result.push(b' '),
            b'=' => {
                let byte = bytes
                    .get(i + 1..i + 3)
                    .and_then(|p| Some((hex_val(p[0])? << 4) | hex_val(p[1])?))
                    .ok_or_else(|| format!("invalid escape in Q-encoded word {input:?}"))?;
                result.push(byte);
                i += 2;
            }
            b @ (b' '..=b'~' | b'\t' | b'\r' | b'\n') => result.push(b),
            b => return Err(format!("unexpected byte 0x{b:02x} in Q-encoded word")),
        }
        i += 1;
    }
    Ok(result)
}
