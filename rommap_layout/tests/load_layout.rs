//! End-to-end loading and validation of layout documents.

use pretty_assertions::assert_eq;
use rommap_data_type::{EntryKind, IssueLevel};
use rommap_layout::{build_entry, load_documents, load_layout, DocNode, LayoutError};

fn metadata() -> DocNode {
    DocNode::mapping([
        ("Title", DocNode::scalar("Example Quest")),
        ("Country", DocNode::scalar("Japan")),
    ])
}

fn entry_map<K: Into<String>>(pairs: impl IntoIterator<Item = (K, DocNode)>) -> DocNode {
    DocNode::mapping(pairs)
}

fn empty_entries() -> DocNode {
    DocNode::mapping(Vec::<(String, DocNode)>::new())
}

fn integer(size: &str, address: &str) -> DocNode {
    DocNode::mapping([
        ("Size", DocNode::scalar(size)),
        ("Address", DocNode::scalar(address)),
    ])
    .with_tag("!integer")
}

#[test]
fn minimal_document_loads() {
    let layout = load_layout(&metadata(), &entry_map([("HP", integer("2", "0x100"))])).unwrap();
    assert_eq!(layout.title, "Example Quest");
    assert_eq!(layout.country, "Japan");
    let entry = layout.entry("HP").unwrap();
    assert_eq!(entry.address, Some(0x100));
    assert_eq!(entry.size.as_deref(), Some("2"));
    assert!(entry.problems().is_empty());
}

#[test]
fn missing_metadata_fails() {
    let no_title = DocNode::mapping([("Country", DocNode::scalar("Japan"))]);
    assert_eq!(
        load_layout(&no_title, &empty_entries()),
        Err(LayoutError::MissingMetadata("Title".to_string()))
    );

    let no_country = DocNode::mapping([("Title", DocNode::scalar("Example Quest"))]);
    assert_eq!(
        load_layout(&no_country, &empty_entries()),
        Err(LayoutError::MissingMetadata("Country".to_string()))
    );
}

#[test]
fn too_few_documents_fails() {
    assert_eq!(
        load_documents(&[metadata()]),
        Err(LayoutError::MissingDocuments { found: 1 })
    );
}

#[test]
fn non_mapping_documents_fail() {
    assert!(matches!(
        load_layout(&DocNode::scalar("nope"), &empty_entries()),
        Err(LayoutError::MalformedDocument(_))
    ));
    assert!(matches!(
        load_layout(&metadata(), &DocNode::scalar("nope")),
        Err(LayoutError::MalformedDocument(_))
    ));
}

#[test]
fn clean_hash_is_validated() {
    let mut meta_pairs = vec![
        ("Title", DocNode::scalar("Example Quest")),
        ("Country", DocNode::scalar("Japan")),
        ("Clean Hash", DocNode::scalar("abc123")),
    ];
    let meta = DocNode::mapping(meta_pairs.clone());
    assert_eq!(
        load_layout(&meta, &empty_entries()),
        Err(LayoutError::InvalidCleanHash("abc123".to_string()))
    );

    let hash = "0123456789abcdef0123456789abcdef01234567";
    meta_pairs[2] = ("Clean Hash", DocNode::scalar(hash));
    let layout = load_layout(&DocNode::mapping(meta_pairs), &empty_entries()).unwrap();
    assert_eq!(layout.clean_hash.as_deref(), Some(hash));
}

#[test]
fn overlap_is_flagged_severe_on_the_second_entry() {
    let layout = load_layout(
        &metadata(),
        &entry_map([
            ("FIRST", integer("4", "0x10")),
            ("SECOND", integer("2", "0x12")),
        ]),
    )
    .unwrap();

    assert!(layout.entry("FIRST").unwrap().problems().is_empty());
    let second = layout.entry("SECOND").unwrap();
    assert!(second
        .problems()
        .iter()
        .any(|issue| issue.level == IssueLevel::Severe && issue.reason.contains("overlap")));
}

#[test]
fn out_of_order_is_flagged_incomplete() {
    let layout = load_layout(
        &metadata(),
        &entry_map([
            ("LATER", integer("2", "0x20")),
            ("EARLIER", integer("2", "0x10")),
        ]),
    )
    .unwrap();

    let earlier = layout.entry("EARLIER").unwrap();
    assert!(earlier
        .problems()
        .iter()
        .any(|issue| issue.level == IssueLevel::Incomplete && issue.reason.contains("order")));
}

#[test]
fn missing_root_size_is_flagged_incomplete() {
    let node = DocNode::mapping([("Address", DocNode::scalar("0"))]).with_tag("!undefined");
    let layout = load_layout(&metadata(), &entry_map([("BLOB", node)])).unwrap();
    let entry = layout.entry("BLOB").unwrap();
    assert!(entry
        .problems()
        .iter()
        .any(|issue| issue.level == IssueLevel::Incomplete && issue.reason.contains("size")));
}

#[test]
fn malformed_size_expression_is_flagged_severe() {
    let node = DocNode::mapping([
        ("Size", DocNode::scalar("2 +")),
        ("Address", DocNode::scalar("0")),
    ])
    .with_tag("!integer");
    let layout = load_layout(&metadata(), &entry_map([("BAD", node)])).unwrap();
    assert!(layout.entry("BAD").unwrap().has_severe());
}

#[test]
fn deprecated_keys_are_renamed_once() {
    let node = DocNode::mapping([
        ("size", DocNode::scalar("2")),
        ("description", DocNode::scalar("legacy keys")),
        ("Address", DocNode::scalar("0")),
    ])
    .with_tag("!integer");
    let entry = build_entry("HP", &node);
    assert_eq!(entry.size.as_deref(), Some("2"));
    assert_eq!(entry.description.as_deref(), Some("legacy keys"));
    let renames = entry
        .problems()
        .iter()
        .filter(|issue| issue.reason.contains("deprecated"))
        .count();
    assert_eq!(renames, 2);

    // Idempotence: an already-migrated document produces no renames.
    let canonical = DocNode::mapping([
        ("Size", DocNode::scalar("2")),
        ("Description", DocNode::scalar("legacy keys")),
        ("Address", DocNode::scalar("0")),
    ])
    .with_tag("!integer");
    let entry = build_entry("HP", &canonical);
    assert!(entry
        .problems()
        .iter()
        .all(|issue| !issue.reason.contains("deprecated")));
}

#[test]
fn signed_outside_integer_context_is_dropped() {
    let node = DocNode::mapping([
        ("Size", DocNode::scalar("4")),
        ("Signed", DocNode::scalar("true")),
        (
            "Entries",
            DocNode::mapping([("A", DocNode::scalar("2").with_tag("!integer"))]),
        ),
    ])
    .with_tag("!struct");
    let entry = build_entry("PLAYER", &node);
    assert!(entry
        .problems
        .iter()
        .any(|issue| issue.reason.contains("meaningless")));
}

#[test]
fn entries_only_on_structs() {
    let node = DocNode::mapping([
        ("Size", DocNode::scalar("2")),
        ("Entries", DocNode::mapping([("A", DocNode::scalar("1"))])),
    ])
    .with_tag("!integer");
    let entry = build_entry("HP", &node);
    assert!(entry
        .problems
        .iter()
        .any(|issue| issue.level == IssueLevel::Severe && issue.reason.contains("Entries")));
}

#[test]
fn struct_member_checks() {
    let node = DocNode::mapping([
        ("Size", DocNode::scalar("6")),
        (
            "Entries",
            DocNode::mapping([
                (
                    "NESTED",
                    DocNode::mapping([
                        ("Size", DocNode::scalar("2")),
                        ("Address", DocNode::scalar("0x20")),
                    ])
                    .with_tag("!integer"),
                ),
                ("lower", DocNode::scalar("2")),
                ("B", DocNode::scalar("2")),
            ]),
        ),
    ])
    .with_tag("!struct");
    let entry = build_entry("PLAYER", &node);
    let problems = entry.problems();
    assert!(problems
        .iter()
        .any(|issue| issue.reason.contains("absolute address")));
    assert!(problems
        .iter()
        .any(|issue| issue.reason.contains("not uppercase")));

    // The nested address is flagged but kept.
    if let EntryKind::Struct { fields } = &entry.kind {
        assert_eq!(fields[0].address, Some(0x20));
        assert_eq!(fields.len(), 3);
    } else {
        panic!("expected a struct kind");
    }
}

#[test]
fn duplicate_member_names_are_flagged() {
    // Mapping keys are unique, but names are trimmed after lookup, so two
    // spellings of one name still collide.
    let node = DocNode::mapping([(
        "Entries",
        DocNode::mapping([
            ("A", DocNode::scalar("1")),
            ("B", DocNode::scalar("1")),
            ("A ", DocNode::scalar("1")),
        ]),
    )])
    .with_tag("!struct");
    let entry = build_entry("PLAYER", &node);
    if let EntryKind::Struct { fields } = &entry.kind {
        assert_eq!(fields.len(), 3);
    } else {
        panic!("expected a struct kind");
    }
    assert!(entry
        .problems()
        .iter()
        .any(|issue| issue.level == IssueLevel::Severe && issue.reason.contains("duplicate")));
}

#[test]
fn duplicate_top_level_names_are_flagged() {
    let layout = load_layout(
        &metadata(),
        &entry_map([("HP", integer("2", "0x0")), ("HP ", integer("2", "0x2"))]),
    )
    .unwrap();
    // The later entry wins the name but carries the diagnostic.
    assert_eq!(layout.entries.len(), 1);
    let entry = layout.entry("HP").unwrap();
    assert_eq!(entry.address, Some(0x2));
    assert!(entry
        .problems()
        .iter()
        .any(|issue| issue.level == IssueLevel::Severe && issue.reason.contains("duplicate")));
}

#[test]
fn array_item_type_and_default_element() {
    let node = DocNode::mapping([
        ("Size", DocNode::scalar("6")),
        ("Item Type", DocNode::scalar("2").with_tag("!integer")),
    ])
    .with_tag("!array");
    let entry = build_entry("TABLE", &node);
    if let EntryKind::Array { element, .. } = &entry.kind {
        assert_eq!(element.size.as_deref(), Some("2"));
    } else {
        panic!("expected an array kind");
    }

    // No Item Type: the element defaults to a single byte.
    let node = DocNode::mapping([("Size", DocNode::scalar("6"))]).with_tag("!array");
    let entry = build_entry("TABLE", &node);
    if let EntryKind::Array { element, .. } = &entry.kind {
        assert_eq!(element.size.as_deref(), Some("1"));
    } else {
        panic!("expected an array kind");
    }
}

#[test]
fn array_item_with_address_is_flagged() {
    let node = DocNode::mapping([
        ("Size", DocNode::scalar("6")),
        (
            "Item Type",
            DocNode::mapping([
                ("Size", DocNode::scalar("2")),
                ("Address", DocNode::scalar("0x10")),
            ])
            .with_tag("!integer"),
        ),
    ])
    .with_tag("!array");
    let entry = build_entry("TABLE", &node);
    assert!(entry
        .problems()
        .iter()
        .any(|issue| issue.reason.contains("absolute address")));
}

#[test]
fn unknown_keys_are_flagged_per_key() {
    let node = DocNode::mapping([
        ("Size", DocNode::scalar("2")),
        ("Sizee", DocNode::scalar("2")),
        ("Commentary", DocNode::scalar("oops")),
    ])
    .with_tag("!integer");
    let entry = build_entry("HP", &node);
    let unknown = entry
        .problems
        .iter()
        .filter(|issue| issue.reason.contains("unknown key"))
        .count();
    assert_eq!(unknown, 2);
}

#[test]
fn pointer_wider_than_eight_bytes_is_severe() {
    let node = DocNode::mapping([("Size", DocNode::scalar("9"))]).with_tag("!pointer");
    let entry = build_entry("PTR", &node);
    assert!(entry.has_severe());

    let node = DocNode::mapping([("Size", DocNode::scalar("4"))]).with_tag("!pointer");
    let entry = build_entry("PTR", &node);
    assert!(!entry.has_severe());
}

#[test]
fn legacy_entries_decay() {
    // A bare scalar is an integer size.
    let entry = build_entry("HP", &DocNode::scalar("2"));
    assert_eq!(entry.size.as_deref(), Some("2"));
    assert!(matches!(entry.kind, EntryKind::Integer(_)));

    // A mapping with a lowercase type key picks its kind from it.
    let node = DocNode::mapping([
        ("type", DocNode::scalar("script")),
        ("Size", DocNode::scalar("8")),
    ]);
    let entry = build_entry("DIALOG", &node);
    assert!(matches!(entry.kind, EntryKind::Script { .. }));
    assert!(entry
        .problems()
        .iter()
        .all(|issue| !issue.reason.contains("unknown key")));
}

#[test]
fn values_shapes() {
    let mapping = DocNode::mapping([
        ("Size", DocNode::scalar("1")),
        (
            "Values",
            DocNode::mapping([("0", DocNode::scalar("Off")), ("1", DocNode::scalar("On"))]),
        ),
    ])
    .with_tag("!integer");
    let entry = build_entry("FLAG", &mapping);
    if let EntryKind::Integer(format) = &entry.kind {
        let values = format.values.as_ref().unwrap();
        assert_eq!(values.label(1), Some("On"));
    } else {
        panic!("expected an integer kind");
    }

    let bad = DocNode::mapping([
        ("Size", DocNode::scalar("1")),
        ("Values", DocNode::scalar("On")),
    ])
    .with_tag("!integer");
    let entry = build_entry("FLAG", &bad);
    assert!(entry.has_severe());
}

#[test]
fn script_tables_and_labels() {
    let meta = DocNode::mapping([
        ("Title", DocNode::scalar("Example Quest")),
        ("Country", DocNode::scalar("Japan")),
        ("Default Script", DocNode::scalar("main")),
        (
            "Script Tables",
            DocNode::mapping([(
                "main",
                DocNode::mapping([(
                    "Replacements",
                    DocNode::mapping([("0x00", DocNode::scalar("Yes"))]),
                )]),
            )]),
        ),
    ]);
    let layout = load_layout(&meta, &empty_entries()).unwrap();
    assert_eq!(layout.default_script.as_deref(), Some("main"));
    let table = layout.script_table("main").unwrap();
    assert_eq!(table.decode(&[0]), "Yes");
    assert!(layout.script_table("missing").is_err());
}

#[test]
fn layouts_round_trip_through_serde() {
    let meta = DocNode::mapping([
        ("Title", DocNode::scalar("Example Quest")),
        ("Country", DocNode::scalar("Japan")),
        (
            "Script Tables",
            DocNode::mapping([(
                "main",
                DocNode::mapping([(
                    "Replacements",
                    DocNode::mapping([("0x00", DocNode::scalar("Yes"))]),
                )]),
            )]),
        ),
    ]);
    let layout = load_layout(
        &meta,
        &entry_map([
            ("HP", integer("2", "0x0")),
            (
                "TABLE",
                DocNode::mapping([
                    ("Size", DocNode::scalar("6")),
                    ("Address", DocNode::scalar("0x2")),
                    ("Item Type", DocNode::scalar("2").with_tag("!integer")),
                    ("Labels", DocNode::mapping([("2", DocNode::scalar("Mid"))])),
                ])
                .with_tag("!array"),
            ),
        ]),
    )
    .unwrap();

    let json = serde_json::to_string(&layout).unwrap();
    let restored: rommap_layout::RomLayout = serde_json::from_str(&json).unwrap();
    assert_eq!(restored, layout);
}

#[test]
fn address_resolution() {
    let one = DocNode::mapping([
        ("Size", DocNode::scalar("3")),
        ("Address", DocNode::scalar("0")),
        ("Item Type", DocNode::scalar("1").with_tag("!integer")),
        (
            "Labels",
            DocNode::mapping([
                ("1", DocNode::scalar("Test")),
                ("2", DocNode::scalar("Test2")),
            ]),
        ),
    ])
    .with_tag("!array");
    let two = DocNode::mapping([
        ("Size", DocNode::scalar("2")),
        ("Address", DocNode::scalar("4")),
    ])
    .with_tag("!integer");

    let layout = load_layout(&metadata(), &entry_map([("One", one), ("Two", two)])).unwrap();

    assert_eq!(layout.name_for_address(0), Some("One"));
    assert_eq!(layout.name_for_address(4), Some("Two"));
    assert_eq!(layout.name_for_address(1), None);

    assert_eq!(layout.label_for_address(0), "One[0]");
    assert_eq!(layout.label_for_address(1), "One[Test]");
    assert_eq!(layout.label_for_address(2), "One[Test2]");
    assert_eq!(layout.label_for_address(3), "One[3]");
    assert_eq!(layout.label_for_address(4), "Two");
    assert_eq!(layout.label_for_address(0x100), "0x100");
}
