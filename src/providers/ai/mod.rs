//! Language-model providers.
//!
//! The classifier talks to a model through [`LlmProvider`]; the only shipped
//! implementation targets OpenAI-compatible chat completion endpoints.

mod openai;
mod traits;

pub use openai::{OpenAiCompatibleProvider, OPENAI_BASE_URL};
pub use traits::{
    CompletionRequest, CompletionResponse, LlmError, LlmProvider, LlmResult, Message, Role,
    TokenUsage,
};

#[cfg(test)]
pub use traits::MockLlmProvider;
