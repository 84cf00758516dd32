//! End-to-end processing of one mailbox archive.
//!
//! Reads the archive, cleans it, classifies every selected message in order,
//! then persists the rows and grows the vocabulary lists. Nothing is written
//! until every message has been classified.

use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::config::{PipelineSettings, ReplyLookup};
use crate::domain::{ClassifiedEmail, MessageRecord, Namespace, PersistedEmailRow, VocabularyList};
use crate::providers::mailbox::{self, MailboxError};
use crate::storage::queries::{emails, extras, tables};
use crate::storage::{Database, DatabaseError};

use super::classifier::{ClassificationContext, ClassifyError, Classifier};
use super::normalizer::{normalize_address, normalize_records};

/// Rows that must agree before a sender type becomes permanent.
pub const PERMANENT_TAG_WINDOW: usize = emails::RECENT_WINDOW;

/// Errors that stop a pipeline run.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("storage error: {0}")]
    Database(#[from] DatabaseError),

    #[error("mailbox error: {0}")]
    Mailbox(#[from] MailboxError),

    #[error("classification failed: {0}")]
    Classify(#[from] ClassifyError),

    #[error("background task failed: {0}")]
    TaskFailed(String),
}

pub type PipelineResult<T> = Result<T, PipelineError>;

/// What a run did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub mailbox: PathBuf,
    pub messages_read: usize,
    pub classified: usize,
    pub inserted: usize,
    pub vocabulary_added: usize,
    pub known_senders: usize,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl RunSummary {
    pub fn elapsed(&self) -> chrono::Duration {
        self.finished_at - self.started_at
    }
}

/// Permanent sender type for a message given the sender's latest rows.
///
/// An already assigned type is kept. Otherwise exactly
/// [`PERMANENT_TAG_WINDOW`] rows must exist and all must share the first
/// row's sender type; anything else yields an empty string.
pub fn infer_permanent_type(record: &MessageRecord, recent: &[PersistedEmailRow]) -> String {
    if record.has_perm_type() {
        return record.perm_type.clone();
    }
    if recent.len() != PERMANENT_TAG_WINDOW {
        return String::new();
    }

    let first = recent[0].sender_type_str();
    if recent.iter().all(|row| row.sender_type_str() == first) {
        first.to_string()
    } else {
        String::new()
    }
}

/// Senders the user is considered to know, as bare addresses.
///
/// Builds a message-id to sender index (later duplicates win) and resolves
/// each record's lookup key through it. Records with an empty key are
/// skipped.
pub fn find_known_senders(records: &[MessageRecord], lookup: ReplyLookup) -> BTreeSet<String> {
    let by_id: HashMap<&str, &str> = records
        .iter()
        .filter(|r| !r.message_id.is_empty())
        .map(|r| (r.message_id.as_str(), r.sender.as_str()))
        .collect();

    records
        .iter()
        .filter_map(|record| match lookup {
            ReplyLookup::MessageId => Some(record.message_id.as_str()),
            ReplyLookup::InReplyTo => record.in_reply_to.as_deref(),
        })
        .filter(|key| !key.is_empty())
        .filter_map(|key| by_id.get(key))
        .map(|sender| normalize_address(sender))
        .collect()
}

/// Runs archives through classification into one namespace.
#[derive(Debug, Clone)]
pub struct Pipeline {
    db: Database,
    ns: Namespace,
    classifier: Classifier,
    settings: PipelineSettings,
}

impl Pipeline {
    pub fn new(db: Database, ns: Namespace, classifier: Classifier) -> Self {
        Self {
            db,
            ns,
            classifier,
            settings: PipelineSettings::default(),
        }
    }

    pub fn with_settings(mut self, settings: PipelineSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn namespace(&self) -> &Namespace {
        &self.ns
    }

    /// Processes the first `limit` messages of the archive, or all of them
    /// when `limit` is `None`.
    pub async fn run(&self, path: impl AsRef<Path>, limit: Option<usize>) -> PipelineResult<RunSummary> {
        let started_at = Utc::now();
        let path = path.as_ref().to_path_buf();

        if self.settings.reset_on_new_inbox {
            tables::drop_all(&self.db, &self.ns).await?;
        }
        self.db.ensure_schema(&self.ns).await?;
        extras::load_defaults(&self.db, &self.ns).await?;

        let mut records = read_archive(path.clone()).await?;
        normalize_records(&mut records);
        let messages_read = records.len();

        let known = find_known_senders(&records, self.settings.reply_lookup);
        tracing::info!(
            namespace = %self.ns,
            messages = messages_read,
            known = known.len(),
            "mailbox loaded"
        );

        let take = limit.map_or(messages_read, |n| n.min(messages_read));
        let mut classified = Vec::with_capacity(take);
        for (index, mut record) in records.into_iter().take(take).enumerate() {
            let ctx = self.context(&known).await;
            let classification = self.classifier.classify(&record, &ctx).await.map_err(|e| {
                tracing::error!(index, sender = %record.sender, error = %e, "classification failed");
                e
            })?;

            let recent = self.recent_rows(&record.sender).await;
            record.perm_type = infer_permanent_type(&record, &recent);

            let is_known = ctx.is_known(&record.sender);
            tracing::debug!(
                index,
                sender = %record.sender,
                sender_type = %classification.sender_type,
                urgency = classification.urgency,
                "message classified"
            );
            classified.push(ClassifiedEmail::new(record, classification, is_known));
        }

        let inserted = match emails::insert_records(&self.db, &self.ns, &classified).await {
            Ok(n) => n,
            Err(DatabaseError::PartialInsert { inserted, source }) => {
                tracing::warn!(
                    namespace = %self.ns,
                    inserted,
                    total = classified.len(),
                    error = %source,
                    "stored only part of the classified messages"
                );
                inserted
            }
            Err(e) => {
                tracing::warn!(namespace = %self.ns, error = %e, "failed to store classified messages");
                0
            }
        };
        let vocabulary_added = self.extend_vocabulary(&classified, &known).await;

        let summary = RunSummary {
            mailbox: path,
            messages_read,
            classified: classified.len(),
            inserted,
            vocabulary_added,
            known_senders: known.len(),
            started_at,
            finished_at: Utc::now(),
        };
        tracing::info!(
            namespace = %self.ns,
            classified = summary.classified,
            inserted = summary.inserted,
            vocabulary_added = summary.vocabulary_added,
            "run complete"
        );
        Ok(summary)
    }

    /// Current vocabulary plus the archive's known senders. Lists that fail
    /// to load are treated as empty.
    async fn context(&self, known: &BTreeSet<String>) -> ClassificationContext {
        let stored_known = self.vocabulary(VocabularyList::KnownAddresses).await;

        ClassificationContext {
            known_senders: known.iter().cloned().chain(stored_known).collect(),
            sender_types: self.vocabulary(VocabularyList::SenderTypes).await,
            want_types: self.vocabulary(VocabularyList::WantTypes).await,
            alert_types: self.vocabulary(VocabularyList::AlertTypes).await,
        }
    }

    async fn vocabulary(&self, list: VocabularyList) -> Vec<String> {
        extras::fetch_vocabulary(&self.db, &self.ns, list)
            .await
            .unwrap_or_else(|e| {
                tracing::warn!(list = %list, error = %e, "failed to read vocabulary");
                Vec::new()
            })
    }

    async fn recent_rows(&self, sender: &str) -> Vec<PersistedEmailRow> {
        emails::recent_by_sender(&self.db, &self.ns, sender, PERMANENT_TAG_WINDOW)
            .await
            .unwrap_or_else(|e| {
                tracing::warn!(sender, error = %e, "failed to read sender history");
                Vec::new()
            })
    }

    async fn extend_vocabulary(&self, classified: &[ClassifiedEmail], known: &BTreeSet<String>) -> usize {
        let batches: [(VocabularyList, Vec<String>); 4] = [
            (
                VocabularyList::AlertTypes,
                classified.iter().map(|e| e.classification.alert.clone()).collect(),
            ),
            (
                VocabularyList::SenderTypes,
                classified.iter().map(|e| e.classification.sender_type.clone()).collect(),
            ),
            (
                VocabularyList::WantTypes,
                classified.iter().map(|e| e.classification.sender_want.clone()).collect(),
            ),
            (VocabularyList::KnownAddresses, known.iter().cloned().collect()),
        ];

        let mut added = 0;
        for (list, values) in batches {
            match extras::append_vocabulary(&self.db, &self.ns, list, values).await {
                Ok(n) => added += n,
                Err(e) => tracing::warn!(list = %list, error = %e, "failed to extend vocabulary"),
            }
        }
        added
    }
}

async fn read_archive(path: PathBuf) -> PipelineResult<Vec<MessageRecord>> {
    tokio::task::spawn_blocking(move || mailbox::read_mailbox(path))
        .await
        .map_err(|e| PipelineError::TaskFailed(e.to_string()))?
        .map_err(PipelineError::from)
}
