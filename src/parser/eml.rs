//! Decoder for individual `.eml` messages (RFC 5322 messages without MBOX framing).
//!
//! The message is split into its header block and body once, then each entity
//! is decoded recursively: `text/*` bodies are transfer-decoded and
//! transcoded, `multipart/*` bodies are split at their boundary and every part
//! is decoded the same way.

use std::io::Read;
use std::path::Path;

use tracing::debug;

use super::charset;
use super::content_type::ContentType;
use super::header::{decode_headers, split_header_block};
use super::multipart::split_parts;
use super::transfer::TransferEncoding;
use crate::error::{EmlError, Result};
use crate::model::headers::HeaderMap;
use crate::model::message::{Message, PartKind};

/// Nesting limit used when none is configured.
pub const DEFAULT_MAX_DEPTH: usize = 32;

/// Knobs for [`MessageParser`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeOptions {
    /// Deepest multipart nesting accepted; the root entity is depth 0.
    pub max_depth: usize,
    /// Use `text/plain; charset=us-ascii` (RFC 2045 §5.2) for entities
    /// without a Content-Type instead of failing.
    pub default_content_type: bool,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            default_content_type: false,
        }
    }
}

/// Outcome of classifying an entity by its media type.
enum MediaClass<'a> {
    Text { charset: Option<&'a str> },
    Multipart { boundary: &'a str },
    Opaque,
}

impl<'a> MediaClass<'a> {
    fn of(content_type: &'a ContentType) -> Result<Self> {
        if content_type.is_text() {
            Ok(Self::Text {
                charset: content_type.charset(),
            })
        } else if content_type.is_multipart() {
            let boundary = content_type
                .boundary()
                .ok_or_else(|| EmlError::MissingParameter {
                    media_type: content_type.media_type.clone(),
                    parameter: "boundary".to_string(),
                })?;
            if boundary.is_empty() {
                return Err(EmlError::Format(format!(
                    "empty boundary parameter on {}",
                    content_type.media_type
                )));
            }
            Ok(Self::Multipart { boundary })
        } else {
            Ok(Self::Opaque)
        }
    }
}

/// Recursive MIME decoder.
#[derive(Debug, Clone, Default)]
pub struct MessageParser {
    options: DecodeOptions,
}

impl MessageParser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: DecodeOptions) -> Self {
        Self { options }
    }

    pub fn max_depth(mut self, max_depth: usize) -> Self {
        self.options.max_depth = max_depth;
        self
    }

    pub fn default_content_type(mut self, enabled: bool) -> Self {
        self.options.default_content_type = enabled;
        self
    }

    pub fn options(&self) -> &DecodeOptions {
        &self.options
    }

    /// Decode a complete message held in memory.
    pub fn parse_bytes(&self, data: &[u8]) -> Result<Message> {
        let (headers, header_len) = split_header_block(data)?;
        let message = self.decode_entity(&data[..header_len], headers, &data[header_len..], 0)?;
        debug!(
            bytes = data.len(),
            parts = message.parts.len(),
            "Decoded message"
        );
        Ok(message)
    }

    /// Read `reader` to the end and decode its contents.
    pub fn parse<R: Read>(&self, mut reader: R) -> Result<Message> {
        let mut data = Vec::new();
        reader.read_to_end(&mut data)?;
        self.parse_bytes(&data)
    }

    /// Read and decode a `.eml` file.
    pub fn parse_file(&self, path: impl AsRef<Path>) -> Result<Message> {
        let path = path.as_ref();
        let data = std::fs::read(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                EmlError::FileNotFound(path.to_path_buf())
            } else {
                EmlError::io(path, e)
            }
        })?;
        self.parse_bytes(&data)
    }

    /// Decode one entity from its body and already-split header fields.
    pub fn decode(&self, raw_body: &[u8], raw_headers: HeaderMap) -> Result<Message> {
        self.decode_entity(&[], raw_headers, raw_body, 0)
    }

    fn decode_entity(
        &self,
        header_block: &[u8],
        raw_headers: HeaderMap,
        raw_body: &[u8],
        depth: usize,
    ) -> Result<Message> {
        if depth > self.options.max_depth {
            return Err(EmlError::DepthExceeded {
                limit: self.options.max_depth,
            });
        }

        let decoded_headers = decode_headers(&raw_headers)?;

        let content_type = match raw_headers.first("Content-Type") {
            Some(value) => ContentType::parse(value)?,
            None if self.options.default_content_type => ContentType::default_text(),
            None => return Err(EmlError::MissingHeader("Content-Type".to_string())),
        };
        let transfer = TransferEncoding::from_header(raw_headers.first("Content-Transfer-Encoding"));

        let (kind, decoded_body, parts) = match MediaClass::of(&content_type)? {
            MediaClass::Text { charset } => {
                let text = decode_body(charset, transfer, raw_body)?;
                (PartKind::Text, Some(text), Vec::new())
            }
            MediaClass::Multipart { boundary } => {
                let mut parts = Vec::new();
                for (index, part) in split_parts(raw_body, boundary)?.into_iter().enumerate() {
                    let child = self
                        .decode_entity(part.header_block, part.headers, part.body, depth + 1)
                        .map_err(|e| EmlError::in_part(index, e))?;
                    parts.push(child);
                }
                (PartKind::Multipart, None, parts)
            }
            MediaClass::Opaque => (PartKind::Opaque, None, Vec::new()),
        };

        debug!(
            media_type = %content_type.media_type,
            depth,
            parts = parts.len(),
            "Decoded entity"
        );

        Ok(Message {
            raw_headers,
            raw_header_block: header_block.to_vec(),
            raw_body: raw_body.to_vec(),
            decoded_headers,
            decoded_body,
            parts,
            kind,
            content_type,
        })
    }
}

/// Decode a message stream with the default options.
pub fn parse<R: Read>(reader: R) -> Result<Message> {
    MessageParser::default().parse(reader)
}

/// Decode an in-memory message with the default options.
pub fn parse_bytes(data: &[u8]) -> Result<Message> {
    MessageParser::default().parse_bytes(data)
}

/// Decode a `.eml` file with the default options.
pub fn parse_file(path: impl AsRef<Path>) -> Result<Message> {
    MessageParser::default().parse_file(path)
}

/// Turn a text body into a string: transfer decoding first, then charset
/// transcoding through the fixed table.
pub fn decode_body(
    charset_name: Option<&str>,
    transfer: TransferEncoding,
    raw: &[u8],
) -> Result<String> {
    let octets = transfer.decode(raw)?;
    let charset_name = charset_name.unwrap_or_default();
    if !charset_name.is_empty() && !charset::is_known(charset_name) {
        debug!(charset = charset_name, "Charset not in table, passing text through");
    }
    Ok(charset::decode(charset_name, &octets))
}
