//! A generic structured-document tree.
//!
//! The document parser is an external collaborator; loaders in this crate
//! only need mapping/sequence/scalar nodes, optional type tags, and ordered
//! key iteration, so that is all this abstraction exposes.

use indexmap::IndexMap;
use rommap_data_type::IntValue;

/// One node of a parsed structured document.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DocNode {
    tag: Option<String>,
    kind: DocKind,
}

/// The shape of a [DocNode].
#[derive(Debug, Clone, PartialEq)]
pub enum DocKind {
    /// Key-value pairs in document order.
    Mapping(IndexMap<String, DocNode>),
    /// An ordered list of nodes.
    Sequence(Vec<DocNode>),
    /// A leaf string.
    Scalar(String),
}

impl Default for DocKind {
    fn default() -> Self {
        DocKind::Scalar(String::new())
    }
}

impl DocNode {
    /// A scalar node.
    pub fn scalar(value: impl Into<String>) -> Self {
        DocNode {
            tag: None,
            kind: DocKind::Scalar(value.into()),
        }
    }

    /// A sequence node.
    pub fn sequence(items: impl IntoIterator<Item = DocNode>) -> Self {
        DocNode {
            tag: None,
            kind: DocKind::Sequence(items.into_iter().collect()),
        }
    }

    /// A mapping node, preserving the order of the given pairs.
    pub fn mapping<K: Into<String>>(pairs: impl IntoIterator<Item = (K, DocNode)>) -> Self {
        DocNode {
            tag: None,
            kind: DocKind::Mapping(
                pairs
                    .into_iter()
                    .map(|(key, value)| (key.into(), value))
                    .collect(),
            ),
        }
    }

    /// Attach a type tag, replacing any existing tag.
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    /// The node's type tag, with any leading `!` stripped.
    pub fn tag(&self) -> Option<&str> {
        self.tag.as_deref().map(|tag| tag.trim_start_matches('!'))
    }

    /// The node's shape.
    pub fn doc_kind(&self) -> &DocKind {
        &self.kind
    }

    /// Return true if the node is a mapping.
    pub fn is_mapping(&self) -> bool {
        matches!(self.kind, DocKind::Mapping(_))
    }

    /// Return true if the node is a sequence.
    pub fn is_sequence(&self) -> bool {
        matches!(self.kind, DocKind::Sequence(_))
    }

    /// Return true if the node is a scalar.
    pub fn is_scalar(&self) -> bool {
        matches!(self.kind, DocKind::Scalar(_))
    }

    /// The node's pairs, if it is a mapping.
    pub fn as_mapping(&self) -> Option<&IndexMap<String, DocNode>> {
        if let DocKind::Mapping(pairs) = &self.kind {
            Some(pairs)
        } else {
            None
        }
    }

    /// The node's items, if it is a sequence.
    pub fn as_sequence(&self) -> Option<&[DocNode]> {
        if let DocKind::Sequence(items) = &self.kind {
            Some(items)
        } else {
            None
        }
    }

    /// The node's text, if it is a scalar.
    pub fn as_scalar(&self) -> Option<&str> {
        if let DocKind::Scalar(text) = &self.kind {
            Some(text)
        } else {
            None
        }
    }

    /// Look up a key in a mapping node.
    pub fn get(&self, key: &str) -> Option<&DocNode> {
        self.as_mapping().and_then(|pairs| pairs.get(key))
    }
}

/// Parse a scalar as an integer, accepting decimal and `0x` hex with an
/// optional leading minus.
pub fn parse_int_scalar(text: &str) -> Option<IntValue> {
    let text = text.trim();
    let (negative, digits) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text),
    };
    let value = if let Some(hex) = digits.strip_prefix("0x").or_else(|| digits.strip_prefix("0X")) {
        IntValue::from_str_radix(hex, 16).ok()?
    } else {
        digits.parse().ok()?
    };
    Some(if negative { -value } else { value })
}

/// Parse a scalar as a boolean, accepting `true`/`false` and `yes`/`no`.
pub fn parse_bool_scalar(text: &str) -> Option<bool> {
    match text.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" => Some(true),
        "false" | "no" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tags_strip_leading_bang() {
        let node = DocNode::scalar("1").with_tag("!integer");
        assert_eq!(node.tag(), Some("integer"));
        let node = DocNode::scalar("1").with_tag("integer");
        assert_eq!(node.tag(), Some("integer"));
    }

    #[test]
    fn mapping_preserves_order() {
        let node = DocNode::mapping([("B", DocNode::scalar("1")), ("A", DocNode::scalar("2"))]);
        let keys: Vec<&String> = node.as_mapping().unwrap().keys().collect();
        assert_eq!(keys, ["B", "A"]);
    }

    #[test]
    fn int_scalars() {
        assert_eq!(parse_int_scalar("12"), Some(12));
        assert_eq!(parse_int_scalar("0x1F"), Some(31));
        assert_eq!(parse_int_scalar("-4"), Some(-4));
        assert_eq!(parse_int_scalar("zzz"), None);
    }

    #[test]
    fn bool_scalars() {
        assert_eq!(parse_bool_scalar("true"), Some(true));
        assert_eq!(parse_bool_scalar("No"), Some(false));
        assert_eq!(parse_bool_scalar("maybe"), None);
    }
}
