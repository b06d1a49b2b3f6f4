//! The loaded layout: metadata, script tables, and top-level entries.

use std::fmt;

use indexmap::IndexMap;
use rommap_data_type::{Entry, EntryKind};
use serde::{Deserialize, Serialize};

use crate::{LayoutLookupError, ScriptTable};

/// A loaded and validated layout for one game image.
///
/// Top-level entries are ordered by the source document but addressed by
/// name. Decoding and projection consume this aggregate read-only.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RomLayout {
    /// The game's title.
    pub title: String,
    /// The release region the layout describes.
    pub country: String,
    /// SHA-1 of a clean image, when known. Always 40 hex characters.
    pub clean_hash: Option<String>,
    /// The script table used when a script entry names none.
    pub default_script: Option<String>,
    /// Script tables by name.
    pub script_tables: IndexMap<String, ScriptTable>,
    /// Top-level entries by name, in document order.
    pub entries: IndexMap<String, Entry>,
}

impl RomLayout {
    /// Look up a top-level entry by name.
    pub fn entry(&self, name: &str) -> Result<&Entry, LayoutLookupError> {
        self.entries
            .get(name)
            .ok_or_else(|| LayoutLookupError::UndefinedEntry(name.to_string()))
    }

    /// Look up a script table by name.
    pub fn script_table(&self, name: &str) -> Result<&ScriptTable, LayoutLookupError> {
        self.script_tables
            .get(name)
            .ok_or_else(|| LayoutLookupError::UndefinedScriptTable(name.to_string()))
    }

    /// The name of the top-level entry at exactly `address`, if any.
    pub fn name_for_address(&self, address: u64) -> Option<&str> {
        self.entries
            .values()
            .find(|entry| entry.address == Some(address))
            .map(|entry| entry.name.as_str())
    }

    /// A human-readable label for an address.
    ///
    /// The first top-level entry (in document order) whose byte range covers
    /// the address wins. Array entries are labeled by explicit offset label
    /// or element index; other entries by their name, an offset label, or a
    /// `name+offset` form. An address no entry covers is rendered as a bare
    /// hex offset.
    pub fn label_for_address(&self, address: u64) -> String {
        let containing = self.entries.values().find_map(|entry| {
            let start = entry.address?;
            if address < start {
                return None;
            }
            let size = self.real_size(entry).unwrap_or(0) as u64;
            if address > start + size {
                return None;
            }
            Some((entry, address - start))
        });

        let (entry, offset) = match containing {
            Some(found) => found,
            None => return format!("{:#X}", address),
        };

        if let EntryKind::Array {
            element, labels, ..
        } = &entry.kind
        {
            if let Some(label) = labels.get(&offset) {
                return format!("{}[{}]", entry.name, label);
            }
            let element_size = self.real_size(element).unwrap_or(0).max(1) as u64;
            return format!("{}[{}]", entry.name, offset / element_size);
        }

        if offset == 0 {
            return entry.name.clone();
        }
        if let EntryKind::Assembly { labels, .. } = &entry.kind {
            if let Some(label) = labels.get(&offset) {
                return format!("{}#{}", entry.name, label);
            }
        }
        format!("{}+{:#X}", entry.name, offset)
    }

    /// The resolved byte size of an entry, when its size is a literal or an
    /// expression with no run dependencies.
    pub fn real_size(&self, entry: &Entry) -> Option<usize> {
        rommap_expr::resolve_size(entry.size.as_deref(), &[]).ok()
    }
}

impl fmt::Display for RomLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} ({})", self.title, self.country)?;
        for entry in self.entries.values() {
            writeln!(f, "{}", entry)?;
        }
        Ok(())
    }
}
