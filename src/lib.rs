//! `emltree`: a recursive MIME message decoder.
//!
//! This crate turns a raw RFC 5322 message into a tree of [`Message`] nodes
//! holding both the original and the decoded form of every header and
//! text body, with `multipart/*` entities expanded into their parts.

pub mod config;
pub mod error;
pub mod export;
pub mod model;
pub mod parser;

pub use error::{EmlError, Result};
pub use model::headers::HeaderMap;
pub use model::message::{Message, PartKind};
pub use parser::content_type::ContentType;
pub use parser::eml::{parse, parse_bytes, parse_file, DecodeOptions, MessageParser};
