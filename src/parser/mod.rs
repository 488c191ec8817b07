//! MIME decoding: header splitting and encoded-words, Content-Type, transfer
//! encodings, charsets, and multipart boundaries.

pub mod charset;
pub mod content_type;
pub mod eml;
pub mod header;
pub mod multipart;
pub mod transfer;
