//! Integer math expressions used for schema field sizes.
//!
//! A field's size in a layout document is either a literal integer or a small
//! arithmetic expression over the bytes already consumed in the enclosing
//! run, bound as `ARG_00`, `ARG_01`, etc. This crate provides the expression
//! evaluator and the size-resolution binding on top of it.

#![warn(
    missing_docs,
    missing_debug_implementations,
    rust_2018_idioms,
    unreachable_pub
)]

pub use error::*;
pub use eval::*;
pub use size::*;

mod error;
mod eval;
mod size;
