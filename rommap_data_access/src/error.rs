#![allow(missing_docs)]

use std::{error::Error, fmt};

use rommap_data_type::ValueTypeError;
use rommap_expr::SizeError;

#[derive(Debug, Clone)]
pub enum DataError {
    Context {
        context: String,
        error: Box<DataError>,
    },
    Size(SizeError),
    ValueType(ValueTypeError),
    ReadPastEnd {
        requested: usize,
        available: usize,
    },
    ArrayLengthMismatch {
        expected: usize,
        consumed: usize,
    },
    IntTooWide {
        size: usize,
    },
    UnsupportedEncoding(String),
    UnsupportedTileFormat(String),
    MissingField(String),
    ExtraField(String),
}

impl DataError {
    /// Wrap an error with the name of the enclosing entry, so a deep nested
    /// failure reads as a path from the root.
    pub fn in_entry(self, name: &str) -> Self {
        DataError::Context {
            context: format!("error in {}", name),
            error: Box::new(self),
        }
    }
}

impl fmt::Display for DataError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataError::Context { context, error } => write!(f, "{}: {}", context, error),
            DataError::Size(error) => write!(f, "{}", error),
            DataError::ValueType(error) => write!(f, "{}", error),
            DataError::ReadPastEnd {
                requested,
                available,
            } => write!(
                f,
                "read past end of source: needed {} byte(s), {} available",
                requested, available
            ),
            DataError::ArrayLengthMismatch { expected, consumed } => write!(
                f,
                "array length mismatch: {} byte(s) declared, element decode consumed {}",
                expected, consumed
            ),
            DataError::IntTooWide { size } => {
                write!(f, "cannot decode a {} byte integer", size)
            }
            DataError::UnsupportedEncoding(name) => {
                write!(f, "unsupported character encoding: {}", name)
            }
            DataError::UnsupportedTileFormat(format) => {
                write!(f, "unsupported tile format: {}", format)
            }
            DataError::MissingField(name) => {
                write!(f, "missing field when encoding struct: {}", name)
            }
            DataError::ExtraField(name) => {
                write!(f, "extra field when encoding struct: {}", name)
            }
        }
    }
}

impl Error for DataError {}

impl From<SizeError> for DataError {
    fn from(v: SizeError) -> Self {
        Self::Size(v)
    }
}

impl From<ValueTypeError> for DataError {
    fn from(v: ValueTypeError) -> Self {
        Self::ValueType(v)
    }
}
