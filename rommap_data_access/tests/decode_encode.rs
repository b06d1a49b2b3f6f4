//! Decode/encode engine behavior over in-memory sources.

use indexmap::IndexMap;
use pretty_assertions::assert_eq;
use rommap_data_access::{decode, encode, DataError, SliceReader};
use rommap_data_type::{Entry, EntryKind, IntFormat, Value};
use rommap_layout::RomLayout;

fn integer(name: &str, size: &str) -> Entry {
    let mut entry = Entry::new(name, EntryKind::Integer(IntFormat::default()));
    entry.size = Some(size.to_string());
    entry
}

fn raw(name: &str, size: Option<&str>) -> Entry {
    let mut entry = Entry::new(name, EntryKind::Undefined);
    entry.size = size.map(|size| size.to_string());
    entry
}

fn array_of(name: &str, size: &str, element: Entry) -> Entry {
    let mut entry = Entry::new(
        name,
        EntryKind::Array {
            element: Box::new(element),
            labels: IndexMap::new(),
            local_variables: IndexMap::new(),
        },
    );
    entry.size = Some(size.to_string());
    entry
}

fn struct_of(name: &str, fields: Vec<Entry>) -> Entry {
    Entry::new(name, EntryKind::Struct { fields })
}

fn layout() -> RomLayout {
    RomLayout::default()
}

#[test]
fn integer_accumulation_is_little_endian_by_position() {
    let bytes = [0, 1, 2, 3];
    let layout = layout();

    let decoded = decode(&mut SliceReader::new(&bytes), &integer("N", "4"), &layout).unwrap();
    assert_eq!(decoded.value, Value::Int(0x03020100));
    assert_eq!(decoded.size, 4);

    let decoded = decode(&mut SliceReader::new(&bytes), &integer("N", "3"), &layout).unwrap();
    assert_eq!(decoded.value, Value::Int(0x020100));
    assert_eq!(decoded.size, 3);
}

#[test]
fn struct_members_split_the_source() {
    let bytes = [0, 1, 2, 3];
    let entry = struct_of("PAIR", vec![integer("A", "2"), integer("B", "2")]);
    let decoded = decode(&mut SliceReader::new(&bytes), &entry, &layout()).unwrap();

    let members = decoded.value.as_struct();
    assert_eq!(members["A"], Value::Int(0x0100));
    assert_eq!(members["B"], Value::Int(0x0302));
    assert_eq!(decoded.size, 4);
}

#[test]
fn arrays_repeat_the_element_prototype() {
    let bytes = [0, 1, 2, 3];
    let entry = array_of("TABLE", "4", integer("ITEM", "2"));
    let decoded = decode(&mut SliceReader::new(&bytes), &entry, &layout()).unwrap();

    assert_eq!(
        decoded.value,
        Value::Array(vec![Value::Int(0x0100), Value::Int(0x0302)])
    );
}

#[test]
fn array_overshoot_is_a_length_mismatch() {
    let bytes = [0, 1, 2, 3];
    let entry = array_of("TABLE", "3", integer("ITEM", "2"));
    assert!(matches!(
        decode(&mut SliceReader::new(&bytes), &entry, &layout()),
        Err(DataError::Context { .. })
    ));
}

#[test]
fn short_source_is_read_past_end() {
    let bytes = [0, 1];
    let error = decode(&mut SliceReader::new(&bytes), &integer("N", "4"), &layout()).unwrap_err();
    assert!(error.to_string().contains("read past end"));
    assert!(error.to_string().contains("error in N"));
}

#[test]
fn root_address_skips_into_the_source() {
    let bytes = [0xAA, 0xBB, 0xCC, 0x11, 0x22];
    let mut entry = integer("N", "2");
    entry.address = Some(3);
    let decoded = decode(&mut SliceReader::new(&bytes), &entry, &layout()).unwrap();
    assert_eq!(decoded.value, Value::Int(0x2211));
    // The skip does not count as consumption.
    assert_eq!(decoded.size, 2);
}

#[test]
fn length_prefixed_payload() {
    // LEN declares how many payload bytes follow it.
    let bytes = [3, 0xAA, 0xBB, 0xCC, 0xDD];
    let entry = struct_of("MSG", vec![integer("LEN", "1"), raw("DATA", Some("ARG_00"))]);
    let decoded = decode(&mut SliceReader::new(&bytes), &entry, &layout()).unwrap();

    let members = decoded.value.as_struct();
    assert_eq!(members["LEN"], Value::Int(3));
    assert_eq!(members["DATA"], Value::Bytes(vec![0xAA, 0xBB, 0xCC]));
    assert_eq!(decoded.size, 4);
}

#[test]
fn unsized_entry_reads_through_its_terminator() {
    let bytes = [0x41, 0x42, 0xFF, 0x43];
    let mut entry = raw("TEXT", None);
    entry.terminator = Some(0xFF);
    let decoded = decode(&mut SliceReader::new(&bytes), &entry, &layout()).unwrap();
    assert_eq!(decoded.value, Value::Bytes(vec![0x41, 0x42, 0xFF]));
    assert_eq!(decoded.size, 3);
}

#[test]
fn unsized_entry_without_terminator_fails() {
    let bytes = [0x41];
    let error = decode(&mut SliceReader::new(&bytes), &raw("TEXT", None), &layout()).unwrap_err();
    assert!(error.to_string().contains("size is not known"));
}

#[test]
fn nested_error_context_names_the_path() {
    let bytes = [0, 1, 2];
    let entry = struct_of(
        "OUTER",
        vec![struct_of("INNER", vec![integer("A", "2"), integer("B", "2")])],
    );
    let error = decode(&mut SliceReader::new(&bytes), &entry, &layout()).unwrap_err();
    let message = error.to_string();
    assert!(message.contains("error in OUTER"));
    assert!(message.contains("error in INNER"));
    assert!(message.contains("error in B"));
}

#[test]
fn round_trips_are_byte_identical() {
    let layout = layout();
    let cases: Vec<(Entry, Vec<u8>)> = vec![
        (integer("N", "4"), vec![0, 1, 2, 3]),
        (
            struct_of("PAIR", vec![integer("A", "2"), integer("B", "2")]),
            vec![4, 5, 6, 7],
        ),
        (
            array_of("TABLE", "4", integer("ITEM", "2")),
            vec![8, 9, 10, 11],
        ),
        (raw("BLOB", Some("3")), vec![1, 2, 3]),
        (
            struct_of("MSG", vec![integer("LEN", "1"), raw("DATA", Some("ARG_00"))]),
            vec![2, 0xAA, 0xBB],
        ),
    ];

    for (entry, bytes) in cases {
        let decoded = decode(&mut SliceReader::new(&bytes), &entry, &layout).unwrap();
        let encoded = encode(&decoded.value, &entry).unwrap();
        assert_eq!(encoded, bytes, "round trip for {}", entry.name);
    }
}

#[test]
fn oversized_integer_encode_is_not_byte_identical() {
    // A 4-byte integer whose value fits in one byte still re-encodes to
    // 4 bytes; the declared size wins.
    let bytes = [7, 0, 0, 0];
    let entry = integer("N", "4");
    let decoded = decode(&mut SliceReader::new(&bytes), &entry, &layout()).unwrap();
    assert_eq!(decoded.value, Value::Int(7));
    assert_eq!(encode(&decoded.value, &entry).unwrap(), vec![7, 0, 0, 0]);
}

#[test]
fn encode_checks_struct_fields() {
    let entry = struct_of("PAIR", vec![integer("A", "2"), integer("B", "2")]);

    let mut missing = IndexMap::new();
    missing.insert("A".to_string(), Value::Int(1));
    let error = encode(&Value::Struct(Box::new(missing)), &entry).unwrap_err();
    assert!(error.to_string().contains("missing field"));

    let mut extra = IndexMap::new();
    extra.insert("A".to_string(), Value::Int(1));
    extra.insert("B".to_string(), Value::Int(2));
    extra.insert("C".to_string(), Value::Int(3));
    let error = encode(&Value::Struct(Box::new(extra)), &entry).unwrap_err();
    assert!(error.to_string().contains("extra field"));
}

#[test]
fn int_wider_than_sixteen_bytes_fails() {
    let bytes = [0; 32];
    let error = decode(&mut SliceReader::new(&bytes), &integer("N", "17"), &layout()).unwrap_err();
    assert!(error.to_string().contains("17 byte integer"));
}
