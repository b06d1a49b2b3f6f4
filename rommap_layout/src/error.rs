#![allow(missing_docs)]

use std::{error::Error, fmt};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LayoutError {
    MissingDocuments { found: usize },
    MalformedDocument(String),
    MissingMetadata(String),
    InvalidCleanHash(String),
    MalformedScriptTable { table: String, message: String },
}

impl fmt::Display for LayoutError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LayoutError::MissingDocuments { found } => {
                write!(
                    f,
                    "expected a metadata document and an entry map, found {} document(s)",
                    found
                )
            }
            LayoutError::MalformedDocument(message) => write!(f, "malformed document: {}", message),
            LayoutError::MissingMetadata(key) => write!(f, "missing metadata key: {}", key),
            LayoutError::InvalidCleanHash(hash) => {
                write!(f, "clean hash must be 40 hex characters, found '{}'", hash)
            }
            LayoutError::MalformedScriptTable { table, message } => {
                write!(f, "malformed script table '{}': {}", table, message)
            }
        }
    }
}

impl Error for LayoutError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LayoutLookupError {
    UndefinedEntry(String),
    UndefinedScriptTable(String),
}

impl fmt::Display for LayoutLookupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LayoutLookupError::UndefinedEntry(name) => {
                write!(f, "undefined entry name: {}", name)
            }
            LayoutLookupError::UndefinedScriptTable(name) => {
                write!(f, "undefined script table: {}", name)
            }
        }
    }
}

impl Error for LayoutLookupError {}

/// Error returned when converting text back into script bytes, which is
/// intentionally unsupported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextToBytesUnsupported;

impl fmt::Display for TextToBytesUnsupported {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "converting text back into script bytes is not implemented")
    }
}

impl Error for TextToBytesUnsupported {}
