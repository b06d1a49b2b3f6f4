//! Non-fatal diagnostics attached to schema entries during construction.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A problem discovered while constructing a schema entry.
///
/// Issues accumulate on the owning entry instead of aborting construction;
/// a separate reporting tool renders them after a document load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    /// What is wrong.
    pub reason: String,
    /// How to fix it.
    pub fix: String,
    /// Whether the problem breaks parsing or is stylistic.
    pub level: IssueLevel,
}

/// The severity of an [Issue].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IssueLevel {
    /// The entry cannot be decoded correctly until this is fixed.
    Severe,
    /// The entry works but the schema is incomplete or unidiomatic.
    Incomplete,
}

impl Issue {
    /// A parse-breaking issue.
    pub fn severe(reason: impl Into<String>, fix: impl Into<String>) -> Self {
        Issue {
            reason: reason.into(),
            fix: fix.into(),
            level: IssueLevel::Severe,
        }
    }

    /// A stylistic or non-fatal issue.
    pub fn incomplete(reason: impl Into<String>, fix: impl Into<String>) -> Self {
        Issue {
            reason: reason.into(),
            fix: fix.into(),
            level: IssueLevel::Incomplete,
        }
    }
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} ({})", self.level, self.reason, self.fix)
    }
}

impl fmt::Display for IssueLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IssueLevel::Severe => write!(f, "severe"),
            IssueLevel::Incomplete => write!(f, "incomplete"),
        }
    }
}
