//! Rendering decoded values as text, structured documents, and JSON.

use encoding::{all::ASCII, all::WINDOWS_31J, DecoderTrap, EncodingRef};
use rommap_data_type::{Endianness, Entry, EntryKind, IntFormat, IntValue, NumberBase, Value};
use rommap_layout::{DocNode, RomLayout};

use crate::DataError;

/// Project a decoded script value to display text.
///
/// The entry's char set picks a loaded script table; a name matching no
/// table falls back to the built-in `ascii` and `shift-jis` codecs, and
/// anything else fails with `UnsupportedEncoding`. When the entry names no
/// char set, the layout's default script is used.
///
/// # Panics
///
/// Panics if the entry is not a script entry; text projection of other
/// kinds is a contract violation, not a recoverable error.
#[track_caller]
pub fn script_text(value: &Value, entry: &Entry, layout: &RomLayout) -> Result<String, DataError> {
    let char_set = match &entry.kind {
        EntryKind::Script { char_set } => char_set.as_deref(),
        _ => panic!("text projection of non-script entry {}", entry.name),
    };

    let bytes = value.try_as_bytes()?;
    let name = char_set.or(layout.default_script.as_deref()).unwrap_or("");

    if let Ok(table) = layout.script_table(name) {
        return Ok(table.decode(bytes));
    }
    builtin_text(name, bytes)
}

/// Decode bytes with one of the two built-in codecs.
fn builtin_text(name: &str, bytes: &[u8]) -> Result<String, DataError> {
    let codec: EncodingRef = match name.to_ascii_lowercase().as_str() {
        "ascii" => ASCII,
        "shift-jis" | "shift_jis" | "sjis" => WINDOWS_31J,
        _ => return Err(DataError::UnsupportedEncoding(name.to_string())),
    };
    codec
        .decode(bytes, DecoderTrap::Replace)
        .map_err(|_| DataError::UnsupportedEncoding(name.to_string()))
}

/// Project a decoded value to a structured-document node mirroring the
/// entry's kind, substituting value and bit labels for raw integers where
/// the schema defines them.
pub fn to_doc(value: &Value, entry: &Entry) -> DocNode {
    match (value, &entry.kind) {
        (Value::Int(stored), _) => int_doc(*stored, entry),
        (Value::Struct(values), EntryKind::Struct { fields }) => DocNode::mapping(
            values
                .iter()
                .map(|(name, member)| {
                    let node = match fields.iter().find(|field| &field.name == name) {
                        Some(field) => to_doc(member, field),
                        None => generic_doc(member),
                    };
                    (name.clone(), node)
                })
                .collect::<Vec<_>>(),
        ),
        (Value::Array(elements), EntryKind::Array { element, .. }) => {
            DocNode::sequence(elements.iter().map(|item| to_doc(item, element)))
        }
        (Value::Bytes(bytes), _) => DocNode::scalar(hex_bytes(bytes)),
        (value, _) => generic_doc(value),
    }
}

/// Project a decoded value to JSON mirroring the entry's kind.
pub fn to_json(value: &Value, entry: &Entry) -> serde_json::Value {
    match (value, &entry.kind) {
        (Value::Int(stored), _) => int_json(*stored, entry),
        (Value::Struct(values), EntryKind::Struct { fields }) => serde_json::Value::Object(
            values
                .iter()
                .map(|(name, member)| {
                    let json = match fields.iter().find(|field| &field.name == name) {
                        Some(field) => to_json(member, field),
                        None => generic_json(member),
                    };
                    (name.clone(), json)
                })
                .collect(),
        ),
        (Value::Array(elements), EntryKind::Array { element, .. }) => serde_json::Value::Array(
            elements.iter().map(|item| to_json(item, element)).collect(),
        ),
        (Value::Bytes(bytes), _) => serde_json::Value::Array(
            bytes
                .iter()
                .map(|byte| serde_json::Value::from(*byte))
                .collect(),
        ),
        (value, _) => generic_json(value),
    }
}

/// Render an integer the way the schema says to display it: endianness
/// swapped over the declared size, signed reinterpretation, then base
/// formatting or a value label.
pub fn display_int(stored: IntValue, entry: &Entry) -> String {
    match entry.int_format() {
        Some(format) => {
            let size = declared_size(entry);
            let value = projected_int(stored, format, size);
            if let Some(labels) = &format.values {
                if let Some(label) = labels.label(value) {
                    return label.to_string();
                }
            }
            match format.base {
                NumberBase::Decimal => format!("{}", value),
                NumberBase::Hexadecimal => {
                    if value < 0 {
                        format!("-{:#X}", value.unsigned_abs())
                    } else {
                        format!("{:#X}", value)
                    }
                }
                NumberBase::Binary => {
                    if value < 0 {
                        format!("-{:#b}", value.unsigned_abs())
                    } else {
                        format!("{:#b}", value)
                    }
                }
            }
        }
        None => format!("{}", stored),
    }
}

/// Apply projection-time integer semantics: byte order and signedness.
fn projected_int(stored: IntValue, format: &IntFormat, size: usize) -> IntValue {
    let mut value = stored;
    if format.endian == Endianness::Big && size > 1 {
        let mut swapped: IntValue = 0;
        for index in 0..size {
            let byte = (value >> (8 * index)) & 0xFF;
            swapped |= byte << (8 * (size - 1 - index));
        }
        value = swapped;
    }
    // A full-width i128 is already two's complement; narrower sizes need
    // the sign bit extended by hand.
    if format.signed && size > 0 && size < 16 {
        let sign_bit = 1i128 << (8 * size - 1);
        if value & sign_bit != 0 {
            value -= sign_bit << 1;
        }
    }
    value
}

/// The bits a decoded bitfield has set, as schema labels where defined.
pub fn bit_labels(stored: IntValue, entry: &Entry) -> Vec<String> {
    let bit_values = match &entry.kind {
        EntryKind::Bitfield { bit_values, .. } => bit_values,
        _ => return Vec::new(),
    };
    let mut labels = Vec::new();
    for bit in 0..128 {
        if stored & (1i128 << bit) != 0 {
            match bit_values.get(bit) {
                Some(label) => labels.push(label.clone()),
                None => labels.push(format!("bit {}", bit)),
            }
        }
    }
    labels
}

/// Unpack a decoded tile into a 2-D grid of pixel indices.
///
/// The entry's format names the packing as `<N>bpp`; pixels are unpacked
/// MSB-first into rows of eight.
///
/// # Panics
///
/// Panics if the entry is not a tile entry.
#[track_caller]
pub fn tile_grid(value: &Value, entry: &Entry) -> Result<Vec<Vec<u8>>, DataError> {
    let format = match &entry.kind {
        EntryKind::Tile { format } => format,
        _ => panic!("tile projection of non-tile entry {}", entry.name),
    };
    let bits_per_pixel = match format.trim().strip_suffix("bpp") {
        Some(digits) => match digits.parse::<u32>() {
            Ok(bits @ (1 | 2 | 4 | 8)) => bits,
            _ => return Err(DataError::UnsupportedTileFormat(format.clone())),
        },
        None => return Err(DataError::UnsupportedTileFormat(format.clone())),
    };

    let bytes = value.try_as_bytes()?;
    let mut pixels = Vec::new();
    for byte in bytes {
        let mut shift = 8 - bits_per_pixel;
        loop {
            pixels.push((byte >> shift) & ((1 << bits_per_pixel) - 1) as u8);
            if shift == 0 {
                break;
            }
            shift -= bits_per_pixel;
        }
    }

    Ok(pixels.chunks(8).map(|row| row.to_vec()).collect())
}

fn int_doc(stored: IntValue, entry: &Entry) -> DocNode {
    if let EntryKind::Bitfield { bit_values, .. } = &entry.kind {
        if !bit_values.is_empty() {
            return DocNode::sequence(bit_labels(stored, entry).into_iter().map(DocNode::scalar));
        }
    }
    DocNode::scalar(display_int(stored, entry))
}

fn int_json(stored: IntValue, entry: &Entry) -> serde_json::Value {
    if let EntryKind::Bitfield { bit_values, .. } = &entry.kind {
        if !bit_values.is_empty() {
            return serde_json::Value::Array(
                bit_labels(stored, entry)
                    .into_iter()
                    .map(serde_json::Value::String)
                    .collect(),
            );
        }
    }
    if let Some(format) = entry.int_format() {
        let value = projected_int(stored, format, declared_size(entry));
        if let Some(labels) = &format.values {
            if let Some(label) = labels.label(value) {
                return serde_json::Value::String(label.to_string());
            }
        }
        if let Ok(small) = i64::try_from(value) {
            return serde_json::Value::from(small);
        }
        return serde_json::Value::String(display_int(stored, entry));
    }
    match i64::try_from(stored) {
        Ok(small) => serde_json::Value::from(small),
        Err(_) => serde_json::Value::String(format!("{}", stored)),
    }
}

/// The entry's literal size, for endianness and sign projection. Sizes that
/// depend on run context fall back to the stored value's width.
fn declared_size(entry: &Entry) -> usize {
    rommap_expr::resolve_size(entry.size.as_deref(), &[]).unwrap_or(0)
}

fn generic_doc(value: &Value) -> DocNode {
    match value {
        Value::Int(stored) => DocNode::scalar(format!("{}", stored)),
        Value::Bytes(bytes) => DocNode::scalar(hex_bytes(bytes)),
        Value::Struct(values) => DocNode::mapping(
            values
                .iter()
                .map(|(name, member)| (name.clone(), generic_doc(member)))
                .collect::<Vec<_>>(),
        ),
        Value::Array(elements) => DocNode::sequence(elements.iter().map(generic_doc)),
    }
}

fn generic_json(value: &Value) -> serde_json::Value {
    match value {
        Value::Int(stored) => match i64::try_from(*stored) {
            Ok(small) => serde_json::Value::from(small),
            Err(_) => serde_json::Value::String(format!("{}", stored)),
        },
        Value::Bytes(bytes) => serde_json::Value::Array(
            bytes
                .iter()
                .map(|byte| serde_json::Value::from(*byte))
                .collect(),
        ),
        Value::Struct(values) => serde_json::Value::Object(
            values
                .iter()
                .map(|(name, member)| (name.clone(), generic_json(member)))
                .collect(),
        ),
        Value::Array(elements) => {
            serde_json::Value::Array(elements.iter().map(generic_json).collect())
        }
    }
}

fn hex_bytes(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|byte| format!("{:02X}", byte))
        .collect::<Vec<_>>()
        .join(" ")
}
