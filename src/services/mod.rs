//! Business services layer.
//!
//! Services sit between the command loop and the infrastructure:
//!
//! ```text
//! Application Layer (REPL commands)
//!          |
//!          v
//!    Services Layer
//!          |
//!          v
//! Infrastructure (Providers, Storage)
//! ```
//!
//! - [`normalizer`]: body cleanup and sender address normalization
//! - [`Classifier`]: prompt building and reply parsing around an [`LlmProvider`]
//! - [`Pipeline`]: archive to classified rows, end to end
//!
//! [`LlmProvider`]: crate::providers::ai::LlmProvider

mod classifier;
pub mod normalizer;
mod pipeline;

pub use classifier::{
    build_prompt, parse_response, ClassificationContext, Classifier, ClassifyError,
    ClassifyResult, DEFAULT_PERSONA, FIELD_COUNT, FIELD_DELIMITER,
};
pub use pipeline::{
    find_known_senders, infer_permanent_type, Pipeline, PipelineError, PipelineResult,
    RunSummary, PERMANENT_TAG_WINDOW,
};
