//! Constructing and validating schema entries from layout documents.
//!
//! Construction is diagnostic-first: recoverable problems become [Issue]s on
//! the offending entry, and only document shapes that make the whole load
//! meaningless (missing metadata, non-mapping documents) fail hard.

use std::collections::HashSet;

use indexmap::IndexMap;
use log::{debug, warn};
use rommap_data_type::{
    Endianness, Entry, EntryKind, IntFormat, IntValue, Issue, IssueLevel, NumberBase, ValueLabels,
};
use rommap_expr::SizeError;

use crate::{
    parse_bool_scalar, parse_int_scalar, DocKind, DocNode, LayoutError, RomLayout, ScriptTable,
};

/// The closed set of entry type tags, in no particular order.
const KIND_TAGS: &[&str] = &[
    "integer",
    "pointer",
    "struct",
    "array",
    "bitfield",
    "tile",
    "color",
    "assembly",
    "script",
    "null",
    "undefined",
];

/// Legacy lowercase keys and their canonical replacements.
const DEPRECATED_KEYS: &[(&str, &str)] = &[
    ("description", "Description"),
    ("notes", "Notes"),
    ("size", "Size"),
    ("address", "Address"),
    ("values", "Values"),
];

/// Load a layout from its parsed sub-documents.
///
/// `documents[0]` is the metadata document and `documents[1]` the entry map;
/// fewer than two documents is a hard error.
pub fn load_documents(documents: &[DocNode]) -> Result<RomLayout, LayoutError> {
    if documents.len() < 2 {
        return Err(LayoutError::MissingDocuments {
            found: documents.len(),
        });
    }
    load_layout(&documents[0], &documents[1])
}

/// Load a layout from its metadata document and entry map.
pub fn load_layout(metadata: &DocNode, entry_map: &DocNode) -> Result<RomLayout, LayoutError> {
    if !metadata.is_mapping() {
        return Err(LayoutError::MalformedDocument(
            "metadata document is not a mapping".to_string(),
        ));
    }

    let title = require_scalar(metadata, "Title")?;
    let country = require_scalar(metadata, "Country")?;
    debug!("loading layout for {} ({})", title, country);

    let clean_hash = match metadata.get("Clean Hash") {
        Some(node) => {
            let hash = node
                .as_scalar()
                .ok_or_else(|| LayoutError::InvalidCleanHash(String::new()))?;
            if hash.len() != 40 || !hash.chars().all(|c| c.is_ascii_hexdigit()) {
                return Err(LayoutError::InvalidCleanHash(hash.to_string()));
            }
            Some(hash.to_string())
        }
        None => None,
    };

    let default_script = metadata
        .get("Default Script")
        .and_then(|node| node.as_scalar())
        .map(|text| text.to_string());

    let mut script_tables = IndexMap::new();
    if let Some(node) = metadata.get("Script Tables") {
        let pairs = node.as_mapping().ok_or_else(|| {
            LayoutError::MalformedDocument("'Script Tables' is not a mapping".to_string())
        })?;
        for (name, table_node) in pairs {
            script_tables.insert(name.clone(), ScriptTable::from_doc(name, table_node)?);
        }
    }

    let entry_pairs = entry_map.as_mapping().ok_or_else(|| {
        LayoutError::MalformedDocument("entry map document is not a mapping".to_string())
    })?;

    let mut entries: IndexMap<String, Entry> = IndexMap::new();
    // Start and end of the previous addressed entry, in document order.
    let mut previous: Option<(u64, u64)> = None;
    for (entry_name, node) in entry_pairs {
        let mut entry = build_entry(entry_name, node);

        if entries.contains_key(&entry.name) {
            entry.flag(Issue::severe(
                format!("duplicate entry name '{}'", entry.name),
                "rename one of the entries",
            ));
        }

        let size = match rommap_expr::resolve_size(entry.size.as_deref(), &[]) {
            Ok(size) => Some(size),
            Err(SizeError::Unresolved) => {
                entry.flag(Issue::incomplete("entry has no size", "add a Size key"));
                None
            }
            Err(error) => {
                entry.flag(Issue::severe(
                    format!("size does not resolve: {}", error),
                    "fix the size expression",
                ));
                None
            }
        };

        if let Some(start) = entry.address {
            if let Some((previous_start, previous_end)) = previous {
                if start < previous_start {
                    entry.flag(Issue::incomplete(
                        "entry is out of address order",
                        "sort entries by address",
                    ));
                }
                if start < previous_end {
                    entry.flag(Issue::severe(
                        "entry overlaps the previous entry",
                        "fix the addresses or sizes so entries do not overlap",
                    ));
                }
            }
            previous = Some((start, start + size.unwrap_or(0) as u64));
        }

        entries.insert(entry.name.clone(), entry);
    }

    let layout = RomLayout {
        title,
        country,
        clean_hash,
        default_script,
        script_tables,
        entries,
    };

    let severe = layout
        .entries
        .values()
        .flat_map(|entry| entry.problems())
        .filter(|issue| issue.level == IssueLevel::Severe)
        .count();
    if severe > 0 {
        warn!(
            "layout {} loaded with {} severe issue(s)",
            layout.title, severe
        );
    }

    Ok(layout)
}

/// Construct one entry from its document node.
///
/// Dispatches on the node's type tag through the closed tag table, decaying
/// to the legacy constructor when the node carries no tag.
pub fn build_entry(name: &str, node: &DocNode) -> Entry {
    // Surrounding whitespace in a document key is never meaningful, and
    // trimming is what lets two spellings of one name collide in the
    // duplicate checks.
    let name = name.trim();
    match node.tag() {
        Some(tag) => match kind_for_tag(tag) {
            Some(tag) => build_kind(name, node, tag, false),
            None => {
                let unknown = tag.to_string();
                let mut entry = build_legacy(name, node);
                entry.flag(Issue::severe(
                    format!("unrecognized type tag '{}'", unknown),
                    "use one of the known type tags",
                ));
                entry
            }
        },
        None => build_legacy(name, node),
    }
}

fn kind_for_tag(tag: &str) -> Option<&'static str> {
    KIND_TAGS
        .iter()
        .copied()
        .find(|known| known.eq_ignore_ascii_case(tag))
}

/// Construct an entry from a legacy untagged node: a bare scalar is an
/// integer size, and a mapping takes its kind from a lowercase `type` key.
fn build_legacy(name: &str, node: &DocNode) -> Entry {
    match node.doc_kind() {
        DocKind::Scalar(size) => {
            let mut entry = Entry::new(name, default_kind("integer"));
            if !size.trim().is_empty() {
                entry.size = Some(size.clone());
            }
            entry
        }
        DocKind::Mapping(_) => match node.get("type").and_then(|type_node| type_node.as_scalar()) {
            Some(type_name) => match kind_for_tag(type_name) {
                Some(tag) => build_kind(name, node, tag, true),
                None => {
                    let unknown = type_name.to_string();
                    let mut entry = build_kind(name, node, "integer", true);
                    entry.flag(Issue::severe(
                        format!("unrecognized type '{}'", unknown),
                        "use one of the known type names",
                    ));
                    entry
                }
            },
            None => build_kind(name, node, "integer", true),
        },
        DocKind::Sequence(_) => {
            let mut entry = Entry::new(name, EntryKind::Undefined);
            entry.flag(Issue::severe(
                "entry node is a sequence",
                "write the entry as a mapping",
            ));
            entry
        }
    }
}

/// The shared construction pass, parameterized by kind.
fn build_kind(name: &str, node: &DocNode, tag: &'static str, legacy: bool) -> Entry {
    let mut entry = Entry::new(name, default_kind(tag));

    let pairs = match node.doc_kind() {
        DocKind::Mapping(pairs) => pairs,
        DocKind::Scalar(size) => {
            // A tagged scalar is shorthand for an entry with only a size.
            if !size.trim().is_empty() {
                entry.size = Some(size.clone());
            }
            return entry;
        }
        DocKind::Sequence(_) => {
            entry.flag(Issue::severe(
                "entry node is a sequence",
                "write the entry as a mapping",
            ));
            return entry;
        }
    };

    let mut keys = Keys::new(pairs);
    for (old, new) in keys.renamed.clone() {
        entry.flag(Issue::incomplete(
            format!("deprecated key '{}'", old),
            format!("rename it to '{}'", new),
        ));
    }
    if legacy {
        keys.take("type");
    }

    entry.pretty_name = scalar_key(&mut entry.problems, &mut keys, "Pretty Name");
    entry.description = scalar_key(&mut entry.problems, &mut keys, "Description");
    entry.notes = scalar_key(&mut entry.problems, &mut keys, "Notes");
    entry.size = scalar_key(&mut entry.problems, &mut keys, "Size");

    if let Some(text) = scalar_key(&mut entry.problems, &mut keys, "Address") {
        match parse_int_scalar(&text).and_then(|value| u64::try_from(value).ok()) {
            Some(address) => entry.address = Some(address),
            None => entry.flag(Issue::severe(
                format!("'{}' is not a valid address", text),
                "write the address as a non-negative integer",
            )),
        }
    }

    if let Some(text) = scalar_key(&mut entry.problems, &mut keys, "Terminator") {
        match parse_int_scalar(&text).and_then(|value| u8::try_from(value).ok()) {
            Some(terminator) => entry.terminator = Some(terminator),
            None => entry.flag(Issue::severe(
                format!("'{}' is not a valid terminator byte", text),
                "write the terminator as a byte value",
            )),
        }
    }

    let integer_like = matches!(tag, "integer" | "pointer" | "bitfield");
    if integer_like {
        let mut format = IntFormat::default();
        if let Some(text) = scalar_key(&mut entry.problems, &mut keys, "Base") {
            match parse_base(&text) {
                Some(base) => format.base = base,
                None => entry.flag(Issue::severe(
                    format!("unknown number base '{}'", text),
                    "use decimal, hexadecimal, or binary",
                )),
            }
        }
        if let Some(text) = scalar_key(&mut entry.problems, &mut keys, "Signed") {
            match parse_bool_scalar(&text) {
                Some(signed) => format.signed = signed,
                None => entry.flag(Issue::severe(
                    format!("'{}' is not a boolean", text),
                    "write Signed as true or false",
                )),
            }
        }
        if let Some(text) = scalar_key(&mut entry.problems, &mut keys, "Endianness") {
            match text.to_ascii_lowercase().as_str() {
                "little" => format.endian = Endianness::Little,
                "big" => format.endian = Endianness::Big,
                _ => entry.flag(Issue::severe(
                    format!("unknown endianness '{}'", text),
                    "use little or big",
                )),
            }
        }
        if let Some(values_node) = keys.take("Values") {
            match build_values(values_node) {
                Ok(labels) => format.values = Some(labels),
                Err(issue) => entry.flag(issue),
            }
        }
        match &mut entry.kind {
            EntryKind::Integer(slot) => *slot = format,
            EntryKind::Pointer { format: slot, .. } => *slot = format,
            EntryKind::Bitfield { format: slot, .. } => *slot = format,
            _ => {}
        }
    } else {
        for key in ["Base", "Signed", "Endianness", "Values"] {
            if keys.take(key).is_some() {
                entry.flag(Issue::incomplete(
                    format!("'{}' is meaningless in this context", key),
                    format!("remove it; {} entries do not use it", tag),
                ));
            }
        }
    }

    if tag == "pointer" {
        if let Some(text) = scalar_key(&mut entry.problems, &mut keys, "Pointer Base") {
            match parse_int_scalar(&text).and_then(|value| u64::try_from(value).ok()) {
                Some(base) => {
                    if let EntryKind::Pointer { pointer_base, .. } = &mut entry.kind {
                        *pointer_base = Some(base);
                    }
                }
                None => entry.flag(Issue::severe(
                    format!("'{}' is not a valid pointer base", text),
                    "write the pointer base as a non-negative integer",
                )),
            }
        }
        if let Ok(size) = rommap_expr::resolve_size(entry.size.as_deref(), &[]) {
            if size > 8 {
                entry.flag(Issue::severe(
                    format!("pointer is {} bytes wide", size),
                    "pointers cannot exceed 8 bytes",
                ));
            }
        }
    }

    if tag == "bitfield" {
        if let Some(values_node) = keys.take("Bit Values") {
            match values_node.as_sequence() {
                Some(items) => {
                    let mut values = Vec::new();
                    for item in items {
                        match item.as_scalar() {
                            Some(text) => values.push(text.to_string()),
                            None => entry.flag(Issue::severe(
                                "'Bit Values' entries must be scalars",
                                "write one label per bit",
                            )),
                        }
                    }
                    if let EntryKind::Bitfield { bit_values, .. } = &mut entry.kind {
                        *bit_values = values;
                    }
                }
                None => entry.flag(Issue::severe(
                    "'Bit Values' must be a sequence",
                    "write one label per bit",
                )),
            }
        }
    }

    if let Some(entries_node) = keys.take("Entries") {
        if tag == "struct" {
            match entries_node.as_mapping() {
                Some(child_pairs) => {
                    // First pass: construct each member.
                    let mut fields: Vec<Entry> = child_pairs
                        .iter()
                        .map(|(child_name, child_node)| build_entry(child_name, child_node))
                        .collect();
                    // Second pass: structural checks on the constructed members.
                    let mut seen = HashSet::new();
                    for field in &mut fields {
                        if field.address.is_some() {
                            field.flag(Issue::severe(
                                "nested entry carries an absolute address",
                                "remove the Address key; nested entries are placed by decode order",
                            ));
                        }
                        if field.name.chars().any(|c| c.is_ascii_lowercase()) {
                            field.flag(Issue::incomplete(
                                "entry name is not uppercase",
                                "rename it and use Pretty Name for display",
                            ));
                        }
                        if !seen.insert(field.name.clone()) {
                            field.flag(Issue::severe(
                                format!("duplicate member name '{}'", field.name),
                                "rename one of the members",
                            ));
                        }
                    }
                    if let EntryKind::Struct { fields: slot } = &mut entry.kind {
                        *slot = fields;
                    }
                }
                None => entry.flag(Issue::severe(
                    "'Entries' must be a mapping",
                    "write members as name: node pairs",
                )),
            }
        } else {
            entry.flag(Issue::severe(
                "'Entries' is only valid on struct entries",
                "remove it or make this a struct",
            ));
        }
    }

    if let Some(item_node) = keys.take("Item Type") {
        if tag == "array" {
            let mut element = build_entry(name, item_node);
            if element.address.is_some() {
                element.flag(Issue::severe(
                    "array element carries an absolute address",
                    "remove the Address key; elements are placed by decode order",
                ));
            }
            if let EntryKind::Array { element: slot, .. } = &mut entry.kind {
                *slot = Box::new(element);
            }
        } else {
            entry.flag(Issue::severe(
                "'Item Type' is only valid on array entries",
                "remove it or make this an array",
            ));
        }
    }

    if matches!(tag, "array" | "assembly") {
        let labels = offset_map_key(&mut entry.problems, &mut keys, "Labels");
        let locals = offset_map_key(&mut entry.problems, &mut keys, "Local Variables");
        match &mut entry.kind {
            EntryKind::Array {
                labels: label_slot,
                local_variables: local_slot,
                ..
            } => {
                *label_slot = labels;
                *local_slot = locals;
            }
            EntryKind::Assembly {
                labels: label_slot,
                local_variables: local_slot,
                ..
            } => {
                *label_slot = labels;
                *local_slot = locals;
            }
            _ => {}
        }
    }

    if tag == "assembly" {
        let arguments = string_map_key(&mut entry.problems, &mut keys, "Arguments");
        let initial_state = string_map_key(&mut entry.problems, &mut keys, "Initial State");
        let final_state = string_map_key(&mut entry.problems, &mut keys, "Final State");
        let return_values = string_map_key(&mut entry.problems, &mut keys, "Return Values");
        let label_states = nested_string_map_key(&mut entry.problems, &mut keys, "Label States");
        if let EntryKind::Assembly {
            arguments: arguments_slot,
            initial_state: initial_slot,
            final_state: final_slot,
            return_values: return_slot,
            label_states: states_slot,
            ..
        } = &mut entry.kind
        {
            *arguments_slot = arguments;
            *initial_slot = initial_state;
            *final_slot = final_state;
            *return_slot = return_values;
            *states_slot = label_states;
        }
    }

    if tag == "script" {
        let char_set = scalar_key(&mut entry.problems, &mut keys, "Char Set");
        if let EntryKind::Script { char_set: slot } = &mut entry.kind {
            *slot = char_set;
        }
    }

    if tag == "tile" {
        if let Some(text) = scalar_key(&mut entry.problems, &mut keys, "Format") {
            if let EntryKind::Tile { format } = &mut entry.kind {
                *format = text;
            }
        }
    }

    for key in keys.unconsumed() {
        entry.flag(Issue::incomplete(
            format!("unknown key '{}'", key),
            "remove it or fix the spelling",
        ));
    }

    entry
}

fn default_kind(tag: &str) -> EntryKind {
    match tag {
        "integer" => EntryKind::Integer(IntFormat::default()),
        "pointer" => EntryKind::Pointer {
            format: IntFormat::default(),
            pointer_base: None,
        },
        "bitfield" => EntryKind::Bitfield {
            format: IntFormat::default(),
            bit_values: Vec::new(),
        },
        "struct" => EntryKind::Struct { fields: Vec::new() },
        "array" => EntryKind::Array {
            element: Box::new(default_element()),
            labels: IndexMap::new(),
            local_variables: IndexMap::new(),
        },
        "tile" => EntryKind::Tile {
            format: "1bpp".to_string(),
        },
        "color" => EntryKind::Color,
        "script" => EntryKind::Script { char_set: None },
        "assembly" => EntryKind::Assembly {
            arguments: IndexMap::new(),
            initial_state: IndexMap::new(),
            final_state: IndexMap::new(),
            return_values: IndexMap::new(),
            label_states: IndexMap::new(),
            labels: IndexMap::new(),
            local_variables: IndexMap::new(),
        },
        "null" => EntryKind::Null,
        _ => EntryKind::Undefined,
    }
}

/// The element type an array gets when the document declares none:
/// a single unsigned byte.
fn default_element() -> Entry {
    let mut element = Entry::new("ITEM", EntryKind::Integer(IntFormat::default()));
    element.size = Some("1".to_string());
    element
}

fn require_scalar(doc: &DocNode, key: &str) -> Result<String, LayoutError> {
    doc.get(key)
        .and_then(|node| node.as_scalar())
        .map(|text| text.to_string())
        .ok_or_else(|| LayoutError::MissingMetadata(key.to_string()))
}

fn parse_base(text: &str) -> Option<NumberBase> {
    match text.to_ascii_lowercase().as_str() {
        "decimal" | "10" => Some(NumberBase::Decimal),
        "hexadecimal" | "hex" | "16" => Some(NumberBase::Hexadecimal),
        "binary" | "2" => Some(NumberBase::Binary),
        _ => None,
    }
}

fn build_values(node: &DocNode) -> Result<ValueLabels, Issue> {
    let mut labels = ValueLabels::new();
    match node.doc_kind() {
        DocKind::Mapping(pairs) => {
            for (key, value) in pairs {
                let label = value.as_scalar().ok_or_else(|| {
                    Issue::severe("'Values' labels must be scalars", "write value: label pairs")
                })?;
                match parse_int_scalar(key) {
                    Some(value) => labels.insert(value, label),
                    None => {
                        return Err(Issue::severe(
                            format!("value '{}' is not an integer", key),
                            "use integer keys in Values",
                        ))
                    }
                }
            }
        }
        DocKind::Sequence(items) => {
            for (index, item) in items.iter().enumerate() {
                let label = item.as_scalar().ok_or_else(|| {
                    Issue::severe(
                        "'Values' labels must be scalars",
                        "write a list of label strings",
                    )
                })?;
                labels.insert(index as IntValue, label);
            }
        }
        DocKind::Scalar(_) => {
            return Err(Issue::severe(
                "'Values' must be a mapping or a sequence",
                "write value: label pairs or a list of labels",
            ))
        }
    }
    Ok(labels)
}

/// A read-only view of a mapping's keys with deprecated names promoted to
/// their canonical replacements. The source document is never modified.
struct Keys<'a> {
    pairs: IndexMap<String, &'a DocNode>,
    renamed: Vec<(String, String)>,
    consumed: HashSet<String>,
}

impl<'a> Keys<'a> {
    fn new(pairs: &'a IndexMap<String, DocNode>) -> Self {
        let mut view = IndexMap::new();
        let mut renamed = Vec::new();
        for (key, value) in pairs {
            match DEPRECATED_KEYS
                .iter()
                .find(|(old, _)| *old == key.as_str())
                .map(|(_, new)| *new)
            {
                Some(new) => {
                    renamed.push((key.clone(), new.to_string()));
                    view.insert(new.to_string(), value);
                }
                None => {
                    view.insert(key.clone(), value);
                }
            }
        }
        Keys {
            pairs: view,
            renamed,
            consumed: HashSet::new(),
        }
    }

    fn take(&mut self, key: &str) -> Option<&'a DocNode> {
        let value = *self.pairs.get(key)?;
        self.consumed.insert(key.to_string());
        Some(value)
    }

    fn unconsumed(&self) -> Vec<String> {
        self.pairs
            .keys()
            .filter(|key| !self.consumed.contains(*key))
            .cloned()
            .collect()
    }
}

fn scalar_key(problems: &mut Vec<Issue>, keys: &mut Keys<'_>, key: &str) -> Option<String> {
    let node = keys.take(key)?;
    match node.as_scalar() {
        Some(text) => Some(text.to_string()),
        None => {
            problems.push(Issue::severe(
                format!("'{}' must be a scalar", key),
                "replace it with a single value",
            ));
            None
        }
    }
}

fn offset_map_key(
    problems: &mut Vec<Issue>,
    keys: &mut Keys<'_>,
    key: &str,
) -> IndexMap<u64, String> {
    let mut map = IndexMap::new();
    let node = match keys.take(key) {
        Some(node) => node,
        None => return map,
    };
    let pairs = match node.as_mapping() {
        Some(pairs) => pairs,
        None => {
            problems.push(Issue::severe(
                format!("'{}' must be a mapping", key),
                "write offset: name pairs",
            ));
            return map;
        }
    };
    for (offset_text, name_node) in pairs {
        let offset = parse_int_scalar(offset_text).and_then(|value| u64::try_from(value).ok());
        match (offset, name_node.as_scalar()) {
            (Some(offset), Some(label)) => {
                map.insert(offset, label.to_string());
            }
            _ => problems.push(Issue::severe(
                format!("bad entry '{}' in '{}'", offset_text, key),
                "write offset: name pairs",
            )),
        }
    }
    map
}

fn string_map_key(
    problems: &mut Vec<Issue>,
    keys: &mut Keys<'_>,
    key: &str,
) -> IndexMap<String, String> {
    let mut map = IndexMap::new();
    let node = match keys.take(key) {
        Some(node) => node,
        None => return map,
    };
    let pairs = match node.as_mapping() {
        Some(pairs) => pairs,
        None => {
            problems.push(Issue::severe(
                format!("'{}' must be a mapping", key),
                "write name: description pairs",
            ));
            return map;
        }
    };
    for (name, value_node) in pairs {
        match value_node.as_scalar() {
            Some(text) => {
                map.insert(name.clone(), text.to_string());
            }
            None => problems.push(Issue::severe(
                format!("bad entry '{}' in '{}'", name, key),
                "write name: description pairs",
            )),
        }
    }
    map
}

fn nested_string_map_key(
    problems: &mut Vec<Issue>,
    keys: &mut Keys<'_>,
    key: &str,
) -> IndexMap<String, IndexMap<String, String>> {
    let mut map = IndexMap::new();
    let node = match keys.take(key) {
        Some(node) => node,
        None => return map,
    };
    let pairs = match node.as_mapping() {
        Some(pairs) => pairs,
        None => {
            problems.push(Issue::severe(
                format!("'{}' must be a mapping", key),
                "write label: state pairs",
            ));
            return map;
        }
    };
    for (label, states_node) in pairs {
        match states_node.as_mapping() {
            Some(states) => {
                let mut inner = IndexMap::new();
                for (state_name, state_node) in states {
                    match state_node.as_scalar() {
                        Some(text) => {
                            inner.insert(state_name.clone(), text.to_string());
                        }
                        None => problems.push(Issue::severe(
                            format!("bad state '{}' under '{}'", state_name, label),
                            "write name: description pairs",
                        )),
                    }
                }
                map.insert(label.clone(), inner);
            }
            None => problems.push(Issue::severe(
                format!("bad entry '{}' in '{}'", label, key),
                "write label: state pairs",
            )),
        }
    }
    map
}
