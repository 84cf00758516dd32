//! Vocabulary lists that bias the classifier toward consistent labels.

use serde::{Deserialize, Serialize};
use std::fmt;

/// One of the four append-only lists kept in the extras table.
///
/// The variant set doubles as the allow-list of extras columns: storage code
/// only ever interpolates [`VocabularyList::column`], never caller input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VocabularyList {
    /// Alert labels (`alerts_types`).
    AlertTypes,
    /// Sender categories (`sender_types`).
    SenderTypes,
    /// Addresses the user has a reply history with (`known_addresses`).
    KnownAddresses,
    /// What senders ask for (`want_types`).
    WantTypes,
}

impl VocabularyList {
    /// All lists in column order.
    pub const ALL: [VocabularyList; 4] = [
        VocabularyList::AlertTypes,
        VocabularyList::SenderTypes,
        VocabularyList::KnownAddresses,
        VocabularyList::WantTypes,
    ];

    /// Column name in the extras table.
    pub fn column(self) -> &'static str {
        match self {
            VocabularyList::AlertTypes => "alerts_types",
            VocabularyList::SenderTypes => "sender_types",
            VocabularyList::KnownAddresses => "known_addresses",
            VocabularyList::WantTypes => "want_types",
        }
    }

    /// Starter values seeded into a fresh namespace.
    pub fn defaults(self) -> &'static [&'static str] {
        match self {
            VocabularyList::AlertTypes => DEFAULT_ALERTS,
            VocabularyList::SenderTypes => DEFAULT_SENDER_TYPES,
            VocabularyList::KnownAddresses => &[],
            VocabularyList::WantTypes => DEFAULT_WANTS,
        }
    }
}

impl fmt::Display for VocabularyList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

const DEFAULT_WANTS: &[&str] = &[
    "New Project",
    "Question about billing",
    "When will a deliverable be delivered",
    "Problem with the work",
    "Terminate Contract",
    "Renew Contract",
    "Expand project",
    "Change scope",
    "ask for an estimate",
    "payment questions",
    "new work",
    "agreement in place",
];

const DEFAULT_SENDER_TYPES: &[&str] = &[
    "Client",
    "Vendor",
    "Marketing",
    "Junk",
    "Employees",
    "Prospective Client",
    "Contractor",
];

const DEFAULT_ALERTS: &[&str] = &[
    "Client Communication",
    "Deliverable not working",
    "Billing problem",
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn columns_are_distinct() {
        let columns: std::collections::HashSet<_> =
            VocabularyList::ALL.iter().map(|l| l.column()).collect();
        assert_eq!(columns.len(), 4);
    }

    #[test]
    fn known_addresses_have_no_defaults() {
        assert!(VocabularyList::KnownAddresses.defaults().is_empty());
        assert!(VocabularyList::SenderTypes.defaults().contains(&"Client"));
        assert!(VocabularyList::WantTypes.defaults().contains(&"New Project"));
    }

    #[test]
    fn display_uses_column_name() {
        assert_eq!(VocabularyList::AlertTypes.to_string(), "alerts_types");
    }
}
