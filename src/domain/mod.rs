//! Domain layer types for inbox-triage.
//!
//! Message records, classification output, stored rows and the vocabulary
//! lists shared by the classifier and the store.

mod classification;
mod message;
mod row;
mod types;
mod vocabulary;

pub use classification::{
    sort_by_urgency, ClassificationResult, ClassifiedEmail, Urgency, MAX_URGENCY,
};
pub use message::MessageRecord;
pub use row::PersistedEmailRow;
pub use types::{Namespace, NamespaceError, RowId, MAX_NAMESPACE_LEN};
pub use vocabulary::VocabularyList;
