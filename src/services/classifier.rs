//! Language model classification of single messages.
//!
//! Each message becomes one prompt carrying its headers, cleaned body, whether
//! the sender is known, and the current vocabulary lists. The reply must be
//! four `|||` separated fields.

use std::collections::BTreeSet;
use std::sync::Arc;

use thiserror::Error;

use crate::domain::{ClassificationResult, MessageRecord, MAX_URGENCY};
use crate::providers::ai::{CompletionRequest, LlmError, LlmProvider};

/// Separator between fields in a model reply.
pub const FIELD_DELIMITER: &str = "|||";

/// Number of fields a reply must contain.
pub const FIELD_COUNT: usize = 4;

/// Persona used when none is configured.
pub const DEFAULT_PERSONA: &str = "a software engineer";

/// Errors from classifying a message.
#[derive(Debug, Error)]
pub enum ClassifyError {
    #[error("completion failed: {0}")]
    Llm(#[from] LlmError),

    #[error("expected 4 fields in reply, found {found}")]
    FieldCount { found: usize },

    #[error("urgency is not an integer: {0:?}")]
    InvalidUrgency(String),

    #[error("urgency {0} is outside 0..=100")]
    UrgencyOutOfRange(i64),
}

pub type ClassifyResult<T> = Result<T, ClassifyError>;

/// Store-derived data that goes into every prompt.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassificationContext {
    pub known_senders: BTreeSet<String>,
    pub sender_types: Vec<String>,
    pub want_types: Vec<String>,
    pub alert_types: Vec<String>,
}

impl ClassificationContext {
    pub fn is_known(&self, sender: &str) -> bool {
        self.known_senders.contains(sender)
    }
}

fn known_flag(known: bool) -> &'static str {
    if known {
        "True"
    } else {
        "False"
    }
}

/// Renders the instruction prompt for one message.
pub fn build_prompt(record: &MessageRecord, ctx: &ClassificationContext, persona: &str) -> String {
    let known = known_flag(ctx.is_known(&record.sender));

    format!(
        "You will be passed the following information surrounding an email:
Sender, Subject, Date, Body, and whether the sender is known to the user.
Sender = {sender},
Subject = {subject},
Date = {date},
Body = {body},
Known = {known},
With the given information, act as an AI email assistant for {persona} by marking emails as follows:
1) Determine what type of sender sent the email, choose from the following if applicable({sender_types}) If the email cannot be categorized into those, create a new sender type that describes the sender DO NOT SAY UNKNOWN.
2) Determine what the sender wants, choose from the following if applicable ({want_types}) If the email cannot be categorized into those, create a new want that describes what the sender wants.
3) Determine what alert the email falls under, choose from the following if applicable ({alert_types}) If the email cannot be categorized into those, create a new alert that describes the email in 5 words or less.
4) Give each email a score out of 100 determining how urgently the user needs to respond to the email. Give marketing emails a score of 0.
Your response should be formatted as follows. Do not label the data, just print it. '|||' should be included.
[Sender Type] ||| [Sender Want] ||| [Alert] ||| [Urgency(just the number)]
",
        sender = record.sender,
        subject = record.subject,
        date = record.date,
        body = record.body,
        sender_types = ctx.sender_types.join(", "),
        want_types = ctx.want_types.join(", "),
        alert_types = ctx.alert_types.join(", "),
    )
}

/// Parses a `type ||| want ||| alert ||| urgency` reply. Brackets anywhere in
/// the text are discarded first.
pub fn parse_response(text: &str) -> ClassifyResult<ClassificationResult> {
    let cleaned: String = text.chars().filter(|c| *c != '[' && *c != ']').collect();
    let fields: Vec<&str> = cleaned.split(FIELD_DELIMITER).map(str::trim).collect();

    let [sender_type, sender_want, alert, urgency] = fields.as_slice() else {
        return Err(ClassifyError::FieldCount { found: fields.len() });
    };

    let score: i64 = urgency
        .parse()
        .map_err(|_| ClassifyError::InvalidUrgency(urgency.to_string()))?;
    let urgency = u8::try_from(score)
        .ok()
        .filter(|u| *u <= MAX_URGENCY)
        .ok_or(ClassifyError::UrgencyOutOfRange(score))?;

    Ok(ClassificationResult {
        sender_type: sender_type.to_string(),
        sender_want: sender_want.to_string(),
        alert: alert.to_string(),
        urgency,
    })
}

/// Sends prompts to a completion provider and parses the replies.
#[derive(Clone)]
pub struct Classifier {
    provider: Arc<dyn LlmProvider>,
    persona: String,
    temperature: f32,
    max_tokens: Option<usize>,
}

impl Classifier {
    pub fn new(provider: Arc<dyn LlmProvider>) -> Self {
        Self {
            provider,
            persona: DEFAULT_PERSONA.to_string(),
            temperature: 0.7,
            max_tokens: None,
        }
    }

    pub fn with_persona(mut self, persona: impl Into<String>) -> Self {
        self.persona = persona.into();
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: Option<usize>) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn persona(&self) -> &str {
        &self.persona
    }

    /// Classifies one message with a single completion call. No retries.
    pub async fn classify(
        &self,
        record: &MessageRecord,
        ctx: &ClassificationContext,
    ) -> ClassifyResult<ClassificationResult> {
        let request = CompletionRequest::prompt(build_prompt(record, ctx, &self.persona))
            .with_temperature(self.temperature)
            .with_max_tokens(self.max_tokens);

        let response = self.provider.complete(&request).await?;
        tracing::debug!(sender = %record.sender, reply = %response.text, "model reply");

        parse_response(&response.text)
    }
}

impl std::fmt::Debug for Classifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Classifier")
            .field("persona", &self.persona)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .finish_non_exhaustive()
    }
}
