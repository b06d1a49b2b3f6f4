//! Types and functions for representing schema entries.

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::{IntValue, Issue, IssueLevel};

/// One schema node: a named address range or substructure in a game image.
///
/// Top-level entries carry an absolute `address`; nested entries are
/// positioned by cumulative byte consumption during decode and never store
/// an offset of their own.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    /// The canonical (uppercase) name of the entry.
    pub name: String,
    /// A display name for humans, when the canonical name is too terse.
    pub pretty_name: Option<String>,
    /// What the data means.
    pub description: Option<String>,
    /// Free-form research notes.
    pub notes: Option<String>,
    /// Absolute offset in the image. Only present on top-level entries.
    pub address: Option<u64>,
    /// A literal byte count or a math expression over `ARG_NN` variables
    /// bound to bytes earlier in the enclosing run. `None` means the size is
    /// unknown until a terminator or child-driven length is found.
    pub size: Option<String>,
    /// A byte value that ends an unsized entry.
    pub terminator: Option<u8>,
    /// The kind of data, with kind-specific attributes.
    pub kind: EntryKind,
    /// Diagnostics attached to this entry (not to descendants).
    pub problems: Vec<Issue>,
}

/// The closed set of entry kinds, with per-kind attributes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data")]
pub enum EntryKind {
    /// A plain integer.
    Integer(IntFormat),
    /// An integer holding an address within the image.
    Pointer {
        /// Display formatting for the stored address.
        format: IntFormat,
        /// The base subtracted from the stored value to get an image offset.
        pointer_base: Option<u64>,
    },
    /// An integer interpreted bit by bit.
    Bitfield {
        /// Display formatting for the raw integer.
        format: IntFormat,
        /// A label per bit, lowest bit first.
        bit_values: Vec<String>,
    },
    /// An ordered sequence of named members.
    Struct {
        /// The members, in decode order.
        fields: Vec<Entry>,
    },
    /// A repetition of a single element type.
    Array {
        /// The element prototype; every element decodes against it.
        element: Box<Entry>,
        /// Names for notable byte offsets within the array.
        labels: IndexMap<u64, String>,
        /// Names for scratch locations within the array.
        local_variables: IndexMap<u64, String>,
    },
    /// Graphics tile data.
    Tile {
        /// The pixel packing, e.g. `2bpp`.
        format: String,
    },
    /// Palette color data.
    Color,
    /// In-game text decoded through a script table.
    Script {
        /// The script table (or built-in encoding) used for text projection.
        char_set: Option<String>,
    },
    /// Machine code, kept as raw bytes and annotated for disassembly.
    Assembly {
        /// Argument name to description.
        arguments: IndexMap<String, String>,
        /// Machine state on entry.
        initial_state: IndexMap<String, String>,
        /// Machine state on exit.
        final_state: IndexMap<String, String>,
        /// Return value name to description.
        return_values: IndexMap<String, String>,
        /// Machine state at each labeled location.
        label_states: IndexMap<String, IndexMap<String, String>>,
        /// Names for notable byte offsets within the routine.
        labels: IndexMap<u64, String>,
        /// Names for scratch locations used by the routine.
        local_variables: IndexMap<u64, String>,
    },
    /// Bytes known to be unused.
    Null,
    /// Bytes whose meaning is not yet known.
    Undefined,
}

/// Display formatting for integer-shaped entries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntFormat {
    /// The base used when rendering the value.
    pub base: NumberBase,
    /// Whether the value is interpreted as two's complement.
    pub signed: bool,
    /// The byte order applied when rendering the value.
    ///
    /// Decoding always accumulates bytes in stream order; endianness is a
    /// projection-time concern.
    pub endian: Endianness,
    /// Named values, when the integer is an enumeration.
    pub values: Option<ValueLabels>,
}

impl Default for IntFormat {
    fn default() -> Self {
        IntFormat {
            base: NumberBase::Hexadecimal,
            signed: false,
            endian: Endianness::Little,
            values: None,
        }
    }
}

/// The rendering base for an integer entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NumberBase {
    /// Base 10.
    Decimal,
    /// Base 16.
    Hexadecimal,
    /// Base 2.
    Binary,
}

/// The rendering byte order for an integer entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Endianness {
    /// Least significant byte first.
    Little,
    /// Most significant byte first.
    Big,
}

/// Named values for an enumeration-like integer entry, in document order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValueLabels {
    labels: Vec<(IntValue, String)>,
}

impl ValueLabels {
    /// An empty label set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a label for a value.
    pub fn insert(&mut self, value: IntValue, label: impl Into<String>) {
        self.labels.push((value, label.into()));
    }

    /// Look up the label for a value.
    pub fn label(&self, value: IntValue) -> Option<&str> {
        self.labels
            .iter()
            .find(|(v, _)| *v == value)
            .map(|(_, label)| label.as_str())
    }

    /// The number of labeled values.
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    /// Return true if no values are labeled.
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Iterate over `(value, label)` pairs in document order.
    pub fn iter(&self) -> impl Iterator<Item = (IntValue, &str)> {
        self.labels.iter().map(|(v, label)| (*v, label.as_str()))
    }
}

impl Entry {
    /// Create an entry with the given name and kind and no other attributes.
    pub fn new(name: impl Into<String>, kind: EntryKind) -> Self {
        Entry {
            name: name.into(),
            pretty_name: None,
            description: None,
            notes: None,
            address: None,
            size: None,
            terminator: None,
            kind,
            problems: Vec::new(),
        }
    }

    /// The kind tag, matching the document type tags.
    pub fn kind_name(&self) -> &'static str {
        self.kind.name()
    }

    /// Return true if the entry is formatted as an integer
    /// (integer, pointer, or bitfield).
    pub fn is_integer_like(&self) -> bool {
        matches!(
            self.kind,
            EntryKind::Integer(_) | EntryKind::Pointer { .. } | EntryKind::Bitfield { .. }
        )
    }

    /// The integer format, for integer-shaped kinds.
    pub fn int_format(&self) -> Option<&IntFormat> {
        match &self.kind {
            EntryKind::Integer(format) => Some(format),
            EntryKind::Pointer { format, .. } => Some(format),
            EntryKind::Bitfield { format, .. } => Some(format),
            _ => None,
        }
    }

    /// Iterate over the direct children of this entry.
    ///
    /// Struct members are yielded in decode order; an array yields its
    /// element prototype once. Other kinds have no children.
    pub fn children(&self) -> impl Iterator<Item = &Entry> {
        let children: Vec<&Entry> = match &self.kind {
            EntryKind::Struct { fields } => fields.iter().collect(),
            EntryKind::Array { element, .. } => vec![element.as_ref()],
            _ => Vec::new(),
        };
        children.into_iter()
    }

    /// Attach a diagnostic to this entry.
    pub fn flag(&mut self, issue: Issue) {
        self.problems.push(issue);
    }

    /// All diagnostics on this entry and its descendants, depth-first.
    pub fn problems(&self) -> Vec<&Issue> {
        let mut problems: Vec<&Issue> = self.problems.iter().collect();
        for child in self.children() {
            problems.extend(child.problems());
        }
        problems
    }

    /// Return true if this entry or any descendant has a severe problem.
    pub fn has_severe(&self) -> bool {
        self.problems()
            .iter()
            .any(|issue| issue.level == IssueLevel::Severe)
    }
}

impl EntryKind {
    /// The kind tag, matching the document type tags.
    pub fn name(&self) -> &'static str {
        match self {
            EntryKind::Integer(_) => "integer",
            EntryKind::Pointer { .. } => "pointer",
            EntryKind::Bitfield { .. } => "bitfield",
            EntryKind::Struct { .. } => "struct",
            EntryKind::Array { .. } => "array",
            EntryKind::Tile { .. } => "tile",
            EntryKind::Color => "color",
            EntryKind::Script { .. } => "script",
            EntryKind::Assembly { .. } => "assembly",
            EntryKind::Null => "null",
            EntryKind::Undefined => "undefined",
        }
    }
}

impl fmt::Display for Entry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.name, self.kind)?;
        if let Some(size) = &self.size {
            write!(f, "[{}]", size)?;
        }
        if let Some(address) = self.address {
            write!(f, " @ {:#X}", address)?;
        }
        Ok(())
    }
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntryKind::Struct { fields } => {
                writeln!(f, "struct {{")?;
                for field in fields {
                    writeln!(f, "  {}", format!("{}", field).replace('\n', "\n  "))?;
                }
                write!(f, "}}")
            }
            EntryKind::Array { element, .. } => write!(f, "array[{}]", element.kind),
            _ => write!(f, "{}", self.name()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flagged(name: &str, kind: EntryKind, issue: Issue) -> Entry {
        let mut entry = Entry::new(name, kind);
        entry.flag(issue);
        entry
    }

    #[test]
    fn problems_are_collected_depth_first() {
        let inner = flagged(
            "INNER",
            EntryKind::Integer(IntFormat::default()),
            Issue::incomplete("inner problem", "fix inner"),
        );
        let mut outer = Entry::new("OUTER", EntryKind::Struct { fields: vec![inner] });
        outer.flag(Issue::severe("outer problem", "fix outer"));

        let problems = outer.problems();
        assert_eq!(problems.len(), 2);
        assert_eq!(problems[0].reason, "outer problem");
        assert_eq!(problems[1].reason, "inner problem");
        assert!(outer.has_severe());
    }

    #[test]
    fn array_element_is_walked_once() {
        let element = flagged(
            "ELEM",
            EntryKind::Integer(IntFormat::default()),
            Issue::incomplete("element problem", "fix"),
        );
        let array = Entry::new(
            "ARR",
            EntryKind::Array {
                element: Box::new(element),
                labels: IndexMap::new(),
                local_variables: IndexMap::new(),
            },
        );
        assert_eq!(array.problems().len(), 1);
    }

    #[test]
    fn value_labels_lookup() {
        let mut labels = ValueLabels::new();
        labels.insert(0, "Off");
        labels.insert(1, "On");
        assert_eq!(labels.label(1), Some("On"));
        assert_eq!(labels.label(2), None);
        assert_eq!(labels.len(), 2);
    }
}
