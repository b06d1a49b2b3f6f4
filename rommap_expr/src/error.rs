#![allow(missing_docs)]

use std::{error::Error, fmt};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExprError {
    SyntaxError(String),
    UndefinedVariable(String),
    DivideByZero,
}

impl fmt::Display for ExprError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExprError::SyntaxError(message) => write!(f, "syntax error: {}", message),
            ExprError::UndefinedVariable(name) => write!(f, "undefined variable: {}", name),
            ExprError::DivideByZero => write!(f, "division by zero"),
        }
    }
}

impl Error for ExprError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SizeError {
    Unresolved,
    InvalidExpression { expr: String, error: ExprError },
    NegativeSize { expr: String, value: i64 },
}

impl fmt::Display for SizeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SizeError::Unresolved => write!(f, "size is not known"),
            SizeError::InvalidExpression { expr, error } => {
                write!(f, "invalid size expression '{}': {}", expr, error)
            }
            SizeError::NegativeSize { expr, value } => {
                write!(f, "size expression '{}' evaluated to {}", expr, value)
            }
        }
    }
}

impl Error for SizeError {}
