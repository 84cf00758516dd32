//! Classification output attached to a message.

use serde::{Deserialize, Serialize};
use std::cmp::Reverse;

use super::MessageRecord;

/// Highest urgency score a model may assign.
pub const MAX_URGENCY: u8 = 100;

/// The four fields parsed from a model response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassificationResult {
    /// Kind of sender (e.g. "Client", "Vendor").
    pub sender_type: String,
    /// What the sender wants (e.g. "New Project").
    pub sender_want: String,
    /// Short alert label, at most a handful of words.
    pub alert: String,
    /// How soon a reply is needed, 0 to 100.
    pub urgency: u8,
}

/// A message together with its classification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassifiedEmail {
    pub record: MessageRecord,
    pub classification: ClassificationResult,
    /// Whether the sender was in the known set when the prompt was built.
    pub known: bool,
}

impl ClassifiedEmail {
    pub fn new(record: MessageRecord, classification: ClassificationResult, known: bool) -> Self {
        Self {
            record,
            classification,
            known,
        }
    }
}

/// Anything that carries an urgency score.
pub trait Urgency {
    /// Score used for ordering; higher is more urgent.
    fn urgency(&self) -> u8;
}

impl Urgency for ClassificationResult {
    fn urgency(&self) -> u8 {
        self.urgency
    }
}

impl Urgency for ClassifiedEmail {
    fn urgency(&self) -> u8 {
        self.classification.urgency
    }
}

/// Sorts most urgent first. The sort is stable, so equal scores keep their
/// input order.
pub fn sort_by_urgency<T: Urgency>(items: &mut [T]) {
    items.sort_by_key(|item| Reverse(item.urgency()));
}
