//! Variable-length byte-run to text tables for in-game script.

use std::collections::BTreeMap;
use std::fmt::Write;

use serde::{Deserialize, Serialize};

use crate::{DocKind, DocNode, LayoutError, TextToBytesUnsupported};

/// A trie over byte values mapping variable-length byte runs to display
/// text.
///
/// Each level holds a size expression (default `"1"`) evaluated over the
/// bytes matched so far, which drives how far a match extends. A node with
/// no children always terminates a match.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScriptTable {
    root: ScriptNode,
}

/// One trie level of a [ScriptTable].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScriptNode {
    replacement: Option<String>,
    size: String,
    children: BTreeMap<u8, ScriptNode>,
}

impl Default for ScriptNode {
    fn default() -> Self {
        ScriptNode {
            replacement: None,
            size: "1".to_string(),
            children: BTreeMap::new(),
        }
    }
}

impl ScriptTable {
    /// An empty table. Decoding with it renders every byte as a hex escape.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a table from its document node.
    ///
    /// The node is processed in two passes: `Lengths` first, so the trie
    /// structure and per-level size expressions exist, then `Replacements`,
    /// which attaches terminal strings to the nodes the first pass created.
    pub fn from_doc(name: &str, node: &DocNode) -> Result<Self, LayoutError> {
        let malformed = |message: &str| LayoutError::MalformedScriptTable {
            table: name.to_string(),
            message: message.to_string(),
        };

        if !node.is_mapping() {
            return Err(malformed("table node must be a mapping"));
        }

        let mut root = ScriptNode::default();
        if let Some(lengths) = node.get("Lengths") {
            apply_lengths(&mut root, lengths).map_err(|message| malformed(&message))?;
        }
        if let Some(replacements) = node.get("Replacements") {
            apply_replacements(&mut root, replacements).map_err(|message| malformed(&message))?;
        }
        Ok(ScriptTable { root })
    }

    /// Register the byte run `bytes` with the given replacement text,
    /// leaving per-level sizes at their defaults.
    pub fn insert(&mut self, bytes: &[u8], replacement: impl Into<String>) {
        let mut node = &mut self.root;
        for byte in bytes {
            node = node.children.entry(*byte).or_default();
        }
        node.replacement = Some(replacement.into());
    }

    /// Set the size expression of the node reached by `bytes`.
    pub fn set_size(&mut self, bytes: &[u8], size: impl Into<String>) {
        let mut node = &mut self.root;
        for byte in bytes {
            node = node.children.entry(*byte).or_default();
        }
        node.size = size.into();
    }

    /// Decode a byte sequence to display text.
    ///
    /// Bytes with no table entry become bracketed hex escapes, so decoding
    /// is total over any input and always terminates.
    pub fn decode(&self, bytes: &[u8]) -> String {
        let mut out = String::new();
        let mut i = 0;
        while i < bytes.len() {
            let mut node = match self.root.children.get(&bytes[i]) {
                Some(node) => node,
                None => {
                    let _ = write!(out, "[{:02X}]", bytes[i]);
                    i += 1;
                    continue;
                }
            };

            let start = i;
            i += 1;
            while !node.children.is_empty() {
                // The size expression sees the bytes matched so far as
                // ARG_00..; an unresolvable size stops the run at one byte.
                let wanted = rommap_expr::resolve_size(Some(node.size.as_str()), &bytes[start..i])
                    .unwrap_or(1);
                if i - start >= wanted {
                    break;
                }
                match bytes.get(i).and_then(|byte| node.children.get(byte)) {
                    Some(child) => {
                        node = child;
                        i += 1;
                    }
                    None => break,
                }
            }

            match &node.replacement {
                Some(text) => out.push_str(text),
                None => {
                    for byte in &bytes[start..i] {
                        let _ = write!(out, "[{:02X}]", byte);
                    }
                }
            }
        }
        out
    }

    /// Convert display text back into script bytes.
    ///
    /// Unsupported: there is no well-defined inverse for tables whose
    /// replacements overlap, and nothing upstream needs one.
    pub fn encode(&self, _text: &str) -> Result<Vec<u8>, TextToBytesUnsupported> {
        Err(TextToBytesUnsupported)
    }

    /// The number of byte values with an entry at the top trie level.
    pub fn len(&self) -> usize {
        self.root.children.len()
    }

    /// Return true if the table has no entries.
    pub fn is_empty(&self) -> bool {
        self.root.children.is_empty()
    }
}

fn parse_byte_key(key: &str) -> Result<u8, String> {
    crate::parse_int_scalar(key)
        .and_then(|value| u8::try_from(value).ok())
        .ok_or_else(|| format!("'{}' is not a byte value", key))
}

fn apply_lengths(node: &mut ScriptNode, doc: &DocNode) -> Result<(), String> {
    let pairs = doc
        .as_mapping()
        .ok_or_else(|| "Lengths node must be a mapping".to_string())?;
    for (key, value) in pairs {
        if key == "=" || key.eq_ignore_ascii_case("default") {
            node.size = value
                .as_scalar()
                .ok_or_else(|| "default size must be a scalar".to_string())?
                .to_string();
            continue;
        }
        let byte = parse_byte_key(key)?;
        let child = node.children.entry(byte).or_default();
        match value.doc_kind() {
            DocKind::Scalar(size) => child.size = size.clone(),
            DocKind::Mapping(_) => apply_lengths(child, value)?,
            DocKind::Sequence(_) => {
                return Err(format!("length entry for byte {:#04X} is a sequence", byte))
            }
        }
    }
    Ok(())
}

fn apply_replacements(node: &mut ScriptNode, doc: &DocNode) -> Result<(), String> {
    let pairs = doc
        .as_mapping()
        .ok_or_else(|| "Replacements node must be a mapping".to_string())?;
    for (key, value) in pairs {
        let byte = parse_byte_key(key)?;
        let child = node.children.entry(byte).or_default();
        match value.doc_kind() {
            DocKind::Scalar(text) => child.replacement = Some(text.clone()),
            DocKind::Mapping(_) => apply_replacements(child, value)?,
            DocKind::Sequence(_) => {
                return Err(format!(
                    "replacement entry for byte {:#04X} is a sequence",
                    byte
                ))
            }
        }
    }
    Ok(())
}
