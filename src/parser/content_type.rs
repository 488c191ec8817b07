//! Content-Type parsing: media type plus parameters (RFC 2045 §5.1, RFC 2231).

use serde::Serialize;

use super::charset;
use super::transfer::hex_val;
use crate::error::{EmlError, Result};

/// A parsed `Content-Type` value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContentType {
    /// Lower-cased `type/subtype` (or a bare `type`).
    pub media_type: String,
    /// Parameters in order of appearance; names lower-cased, values unquoted.
    pub params: Vec<(String, String)>,
}

impl ContentType {
    /// The RFC 2045 default for entities without a Content-Type.
    pub fn default_text() -> Self {
        Self {
            media_type: "text/plain".to_string(),
            params: vec![("charset".to_string(), "us-ascii".to_string())],
        }
    }

    /// Parse a raw header value.
    pub fn parse(value: &str) -> Result<Self> {
        let (base, params) = match value.find(';') {
            Some(pos) => (&value[..pos], &value[pos..]),
            None => (value, ""),
        };
        let base = base.trim();
        check_media_type(base).map_err(|reason| malformed(value, reason))?;

        let raw = parse_params(params).map_err(|reason| malformed(value, reason))?;
        Ok(Self {
            media_type: base.to_ascii_lowercase(),
            params: assemble_params(&raw),
        })
    }

    /// Value of parameter `name` (case-insensitive).
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn charset(&self) -> Option<&str> {
        self.param("charset")
    }

    pub fn boundary(&self) -> Option<&str> {
        self.param("boundary")
    }

    pub fn main_type(&self) -> &str {
        self.media_type
            .split_once('/')
            .map_or(self.media_type.as_str(), |(main, _)| main)
    }

    pub fn sub_type(&self) -> Option<&str> {
        self.media_type.split_once('/').map(|(_, sub)| sub)
    }

    pub fn is_text(&self) -> bool {
        self.media_type.starts_with("text/")
    }

    pub fn is_multipart(&self) -> bool {
        self.media_type.starts_with("multipart/")
    }
}

fn malformed(value: &str, reason: &str) -> EmlError {
    EmlError::Format(format!("malformed Content-Type {value:?}: {reason}"))
}

fn is_tspecial(c: char) -> bool {
    "()<>@,;:\\\"/[]?=".contains(c)
}

fn is_token_char(c: char) -> bool {
    c.is_ascii() && !c.is_ascii_control() && c != ' ' && !is_tspecial(c)
}

/// Split off the leading token of `s`.
fn consume_token(s: &str) -> (&str, &str) {
    let end = s.find(|c| !is_token_char(c)).unwrap_or(s.len());
    s.split_at(end)
}

fn check_media_type(s: &str) -> std::result::Result<(), &'static str> {
    let (main, rest) = consume_token(s);
    if main.is_empty() {
        return Err("no media type");
    }
    if rest.is_empty() {
        return Ok(());
    }
    let Some(rest) = rest.strip_prefix('/') else {
        return Err("expected slash after first token");
    };
    let (sub, rest) = consume_token(rest);
    if sub.is_empty() {
        return Err("expected token after slash");
    }
    if !rest.is_empty() {
        return Err("unexpected content after media subtype");
    }
    Ok(())
}

/// Parse `; name=value` pairs as written, rejecting duplicates.
fn parse_params(mut rest: &str) -> std::result::Result<Vec<(String, String)>, &'static str> {
    let mut params: Vec<(String, String)> = Vec::new();
    loop {
        rest = rest.trim_start();
        if rest.is_empty() {
            break;
        }
        let Some(after) = rest.strip_prefix(';') else {
            return Err("expected ';' between parameters");
        };
        rest = after.trim_start();
        if rest.is_empty() {
            // trailing semicolon
            break;
        }

        let (name, after) = consume_token(rest);
        if name.is_empty() {
            return Err("invalid parameter name");
        }
        let Some(after) = after.trim_start().strip_prefix('=') else {
            return Err("expected '=' after parameter name");
        };
        let (value, after) = consume_value(after.trim_start())?;

        let name = name.to_ascii_lowercase();
        if params.iter().any(|(k, _)| *k == name) {
            return Err("duplicate parameter name");
        }
        params.push((name, value));
        rest = after;
    }
    Ok(params)
}

fn consume_value(s: &str) -> std::result::Result<(String, &str), &'static str> {
    let Some(quoted) = s.strip_prefix('"') else {
        let (token, rest) = consume_token(s);
        if token.is_empty() {
            return Err("missing parameter value");
        }
        return Ok((token.to_string(), rest));
    };

    let mut value = String::new();
    let mut chars = quoted.char_indices();
    while let Some((i, c)) = chars.next() {
        match c {
            '"' => return Ok((value, &quoted[i + 1..])),
            '\\' => match quoted[i + 1..].chars().next() {
                Some(next) if is_tspecial(next) => {
                    value.push(next);
                    chars.next();
                }
                _ => value.push('\\'),
            },
            '\r' | '\n' => return Err("line break inside quoted value"),
            c => value.push(c),
        }
    }
    Err("unterminated quoted value")
}

/// Resolve RFC 2231 extended (`name*`) and continued (`name*0`, `name*1*`)
/// parameters into plain name/value pairs, keeping first-appearance order.
fn assemble_params(raw: &[(String, String)]) -> Vec<(String, String)> {
    let get = |key: &str| {
        raw.iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    };

    let mut names: Vec<&str> = Vec::new();
    for (key, _) in raw {
        let base = key.split('*').next().unwrap_or(key);
        if !names.contains(&base) {
            names.push(base);
        }
    }

    let mut params = Vec::with_capacity(names.len());
    for name in names {
        let value = if let Some(ext) = get(format!("{name}*").as_str()) {
            Some(decode_extended(ext))
        } else if get(format!("{name}*0").as_str()).is_some()
            || get(format!("{name}*0*").as_str()).is_some()
        {
            Some(join_continuations(name, get))
        } else {
            get(name).map(str::to_string)
        };
        if let Some(value) = value {
            params.push((name.to_string(), value));
        }
    }
    params
}

fn join_continuations<'a>(name: &str, get: impl Fn(&str) -> Option<&'a str>) -> String {
    let mut charset_name = String::new();
    let mut bytes = Vec::new();
    for n in 0.. {
        if let Some(plain) = get(format!("{name}*{n}").as_str()) {
            bytes.extend_from_slice(plain.as_bytes());
        } else if let Some(encoded) = get(format!("{name}*{n}*").as_str()) {
            let encoded = if n == 0 {
                let (cs, rest) = split_extended(encoded);
                charset_name = cs.to_string();
                rest
            } else {
                encoded
            };
            bytes.extend(percent_decode(encoded));
        } else {
            break;
        }
    }
    charset::decode(&charset_name, &bytes)
}

fn decode_extended(value: &str) -> String {
    let (cs, encoded) = split_extended(value);
    charset::decode(cs, &percent_decode(encoded))
}

/// Split `charset'language'text` into charset and text.
fn split_extended(value: &str) -> (&str, &str) {
    let mut pieces = value.splitn(3, '\'');
    match (pieces.next(), pieces.next(), pieces.next()) {
        (Some(cs), Some(_lang), Some(text)) => (cs, text),
        _ => ("", value),
    }
}

/// `%XX` escapes to octets; malformed escapes are kept literally.
fn percent_decode(s: &str) -> Vec<u8> {
    let bytes = s.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let hex = bytes
                .get(i + 1..i + 3)
                .and_then(|p| Some((hex_val(p[0])? << 4) | hex_val(p[1])?));
            if let Some(byte) = hex {
                out.push(byte);
                i += 3;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    out
}
