//! Core identifier types for domain entities.
//!
//! These newtype wrappers keep table prefixes and row identifiers from being
//! mixed up with free-form strings.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Longest namespace accepted as a table prefix.
pub const MAX_NAMESPACE_LEN: usize = 32;

/// Rejected namespace input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NamespaceError {
    #[error("namespace is longer than {MAX_NAMESPACE_LEN} characters")]
    TooLong,

    #[error("namespace may only contain ASCII letters, digits and '_': {0:?}")]
    InvalidCharacter(String),
}

/// Operator-supplied prefix for the two per-user tables.
///
/// Every storage call takes a namespace explicitly; there is no process-wide
/// default. Only `[A-Za-z0-9_]` is accepted, so the derived table names are
/// always safe to quote as identifiers.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Namespace(String);

impl Namespace {
    /// Validates and wraps a namespace.
    pub fn new(raw: impl Into<String>) -> Result<Self, NamespaceError> {
        let raw = raw.into();
        if raw.len() > MAX_NAMESPACE_LEN {
            return Err(NamespaceError::TooLong);
        }
        if !raw.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(NamespaceError::InvalidCharacter(raw));
        }
        Ok(Self(raw))
    }

    /// Returns the raw prefix.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Name of the table holding classified messages.
    pub fn emails_table(&self) -> String {
        format!("{}emails", self.0)
    }

    /// Name of the table holding vocabulary lists.
    pub fn extras_table(&self) -> String {
        format!("{}extras", self.0)
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for Namespace {
    type Error = NamespaceError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<Namespace> for String {
    fn from(ns: Namespace) -> Self {
        ns.0
    }
}

/// Auto-incremented row identifier in the emails table.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct RowId(pub i64);

impl fmt::Display for RowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn namespace_builds_table_names() {
        let ns = Namespace::new("alice").unwrap();
        assert_eq!(ns.emails_table(), "aliceemails");
        assert_eq!(ns.extras_table(), "aliceextras");
    }

    #[test]
    fn empty_namespace_is_allowed() {
        let ns = Namespace::new("").unwrap();
        assert_eq!(ns.emails_table(), "emails");
    }

    #[test]
    fn namespace_rejects_sql_metacharacters() {
        assert!(matches!(
            Namespace::new("bob; DROP TABLE x"),
            Err(NamespaceError::InvalidCharacter(_))
        ));
        assert!(Namespace::new("quote\"d").is_err());
    }

    #[test]
    fn namespace_rejects_long_input() {
        let long = "a".repeat(MAX_NAMESPACE_LEN + 1);
        assert_eq!(Namespace::new(long), Err(NamespaceError::TooLong));
    }

    #[test]
    fn namespace_deserializes_with_validation() {
        let ns: Namespace = serde_json::from_str("\"team_1\"").unwrap();
        assert_eq!(ns.as_str(), "team_1");

        let bad: Result<Namespace, _> = serde_json::from_str("\"no spaces\"");
        assert!(bad.is_err());
    }

    #[test]
    fn row_id_orders_numerically() {
        assert!(RowId(2) > RowId(1));
        assert_eq!(RowId(7).to_string(), "7");
    }
}
