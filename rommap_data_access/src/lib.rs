//! Reading and writing game data against a loaded layout.
//!
//! The decode engine walks a schema [Entry](rommap_data_type::Entry) against
//! a byte source, producing a [Value](rommap_data_type::Value) tree and the
//! number of bytes consumed. Encoding is the structural inverse. Projections
//! render a decoded value as display text, a structured-document node, or
//! JSON.

#![warn(
    missing_docs,
    missing_debug_implementations,
    rust_2018_idioms,
    unreachable_pub
)]

pub use decode::*;
pub use encode::*;
pub use error::*;
pub use project::*;
pub use source::*;

mod decode;
mod encode;
mod error;
mod project;
mod source;
