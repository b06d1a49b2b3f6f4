//! The recursive decode engine.

use indexmap::IndexMap;
use log::debug;
use rommap_data_type::{Decoded, Entry, EntryKind, IntValue, Value};
use rommap_layout::RomLayout;

use crate::{ByteRead, DataError};

/// Decode one entry from a byte source.
///
/// A top-level entry's `address` skips that many bytes from the source's
/// current position first. The result pairs the value tree with the total
/// byte consumption, not counting the skip.
pub fn decode(
    source: &mut impl ByteRead,
    entry: &Entry,
    layout: &RomLayout,
) -> Result<Decoded, DataError> {
    debug!("decoding {} against layout {}", entry.name, layout.title);
    if let Some(address) = entry.address {
        source.skip(address as usize)?;
    }
    let mut run = Vec::new();
    let value =
        decode_entry(source, entry, &mut run).map_err(|error| error.in_entry(&entry.name))?;
    Ok(Decoded {
        value,
        size: run.len(),
    })
}

/// Decode `entry` against `source`.
///
/// `run` holds the bytes consumed so far in the enclosing run; the entry's
/// size expression binds them as `ARG_NN`, and every byte this call consumes
/// is appended so later siblings can see it.
fn decode_entry(
    source: &mut impl ByteRead,
    entry: &Entry,
    run: &mut Vec<u8>,
) -> Result<Value, DataError> {
    match &entry.kind {
        EntryKind::Integer(_) | EntryKind::Pointer { .. } | EntryKind::Bitfield { .. } => {
            let size = rommap_expr::resolve_size(entry.size.as_deref(), run)?;
            if size > 16 {
                return Err(DataError::IntTooWide { size });
            }
            let mut buf = vec![0; size];
            source.read_exact(&mut buf)?;
            // Bytes accumulate in stream order; declared endianness is
            // applied at projection time, not here.
            let mut value: IntValue = 0;
            for (index, byte) in buf.iter().enumerate() {
                value |= IntValue::from(*byte) << (8 * index);
            }
            run.extend_from_slice(&buf);
            Ok(Value::Int(value))
        }
        EntryKind::Struct { fields } => {
            // Members bind their size expressions over the struct's own run.
            let mut inner = Vec::new();
            let mut values = IndexMap::new();
            for field in fields {
                let value = decode_entry(source, field, &mut inner)
                    .map_err(|error| error.in_entry(&field.name))?;
                values.insert(field.name.clone(), value);
            }
            run.extend_from_slice(&inner);
            Ok(Value::Struct(Box::new(values)))
        }
        EntryKind::Array { element, .. } => {
            let total = rommap_expr::resolve_size(entry.size.as_deref(), run)?;
            let mut inner = Vec::new();
            let mut elements = Vec::new();
            while inner.len() < total {
                let value = decode_entry(source, element, &mut inner)
                    .map_err(|error| error.in_entry(&element.name))?;
                if inner.len() > total {
                    return Err(DataError::ArrayLengthMismatch {
                        expected: total,
                        consumed: inner.len(),
                    });
                }
                elements.push(value);
            }
            run.extend_from_slice(&inner);
            Ok(Value::Array(elements))
        }
        EntryKind::Script { .. }
        | EntryKind::Assembly { .. }
        | EntryKind::Null
        | EntryKind::Undefined
        | EntryKind::Tile { .. }
        | EntryKind::Color => {
            let bytes = read_raw(source, entry, run)?;
            Ok(Value::Bytes(bytes))
        }
    }
}

/// Read an entry's raw payload: `size` bytes when the size resolves, or
/// through the declared terminator byte (inclusive) when it does not.
fn read_raw(
    source: &mut impl ByteRead,
    entry: &Entry,
    run: &mut Vec<u8>,
) -> Result<Vec<u8>, DataError> {
    match rommap_expr::resolve_size(entry.size.as_deref(), run) {
        Ok(size) => {
            let mut buf = vec![0; size];
            source.read_exact(&mut buf)?;
            run.extend_from_slice(&buf);
            Ok(buf)
        }
        Err(size_error) => {
            let terminator = match entry.terminator {
                Some(terminator) => terminator,
                None => return Err(size_error.into()),
            };
            let mut buf = Vec::new();
            loop {
                let byte = source.read_u8()?;
                buf.push(byte);
                if byte == terminator {
                    break;
                }
            }
            run.extend_from_slice(&buf);
            Ok(buf)
        }
    }
}
