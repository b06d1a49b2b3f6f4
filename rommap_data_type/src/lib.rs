//! Schema nodes, diagnostics, and decoded values for game data layouts.
//!
//! An [Entry] describes one address range or substructure in a game image:
//! its kind (integer, struct, array, script text, ...), its size, and the
//! kind-specific formatting attributes. Decoding bytes against an [Entry]
//! produces a [Value] tree.

#![warn(
    missing_docs,
    missing_debug_implementations,
    rust_2018_idioms,
    unreachable_pub
)]

pub use entry::*;
pub use error::*;
pub use issue::*;
pub use value::*;

mod entry;
mod error;
mod issue;
mod value;
