//! The structural inverse of the decode engine.

use rommap_data_type::{Entry, EntryKind, Value};

use crate::DataError;

/// Re-encode a decoded value to bytes.
///
/// The result is byte-identical to the original source for every kind except
/// integers whose declared size exceeds the number of significant bytes in
/// the stored value.
pub fn encode(value: &Value, entry: &Entry) -> Result<Vec<u8>, DataError> {
    let mut run = Vec::new();
    encode_entry(value, entry, &mut run).map_err(|error| error.in_entry(&entry.name))?;
    Ok(run)
}

fn encode_entry(value: &Value, entry: &Entry, run: &mut Vec<u8>) -> Result<(), DataError> {
    match &entry.kind {
        EntryKind::Integer(_) | EntryKind::Pointer { .. } | EntryKind::Bitfield { .. } => {
            // The size expression sees the same run prefix it saw during
            // decode: everything emitted so far in the enclosing run.
            let size = rommap_expr::resolve_size(entry.size.as_deref(), run)?;
            let stored = value.try_as_int()?;
            for index in 0..size {
                run.push((stored >> (8 * index)) as u8);
            }
            Ok(())
        }
        EntryKind::Struct { fields } => {
            let values = value.try_as_struct()?;
            for name in values.keys() {
                if !fields.iter().any(|field| &field.name == name) {
                    return Err(DataError::ExtraField(name.clone()));
                }
            }
            let mut inner = Vec::new();
            for field in fields {
                let member = values
                    .get(&field.name)
                    .ok_or_else(|| DataError::MissingField(field.name.clone()))?;
                encode_entry(member, field, &mut inner)
                    .map_err(|error| error.in_entry(&field.name))?;
            }
            run.extend_from_slice(&inner);
            Ok(())
        }
        EntryKind::Array { element, .. } => {
            let elements = value.try_as_array()?;
            let mut inner = Vec::new();
            for item in elements {
                encode_entry(item, element, &mut inner)
                    .map_err(|error| error.in_entry(&element.name))?;
            }
            run.extend_from_slice(&inner);
            Ok(())
        }
        EntryKind::Script { .. }
        | EntryKind::Assembly { .. }
        | EntryKind::Null
        | EntryKind::Undefined
        | EntryKind::Tile { .. }
        | EntryKind::Color => {
            let bytes = value.try_as_bytes()?;
            run.extend_from_slice(bytes);
            Ok(())
        }
    }
}
