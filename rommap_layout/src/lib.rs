//! Loading and validating game data layouts from structured documents.
//!
//! A layout document has two logical sub-documents: metadata (title, country,
//! script tables) and an entry map (name to tagged schema node). The loader
//! in this crate turns them into a [RomLayout], attaching non-fatal
//! diagnostics to the offending entries instead of failing, so that a
//! reporting tool can show everything wrong with a document at once.
//!
//! The document parser itself lives outside this crate; parsed trees arrive
//! through the [DocNode] abstraction.

#![warn(
    missing_docs,
    missing_debug_implementations,
    rust_2018_idioms,
    unreachable_pub
)]

pub use build::*;
pub use doc::*;
pub use error::*;
pub use rom_layout::*;
pub use script_table::*;

mod build;
mod doc;
mod error;
mod rom_layout;
mod script_table;
