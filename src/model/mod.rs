//! Core data model types: header maps and the decoded message tree.

pub mod headers;
pub mod message;
