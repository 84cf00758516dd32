//! Configuration and settings management.
//!
//! Settings are read from a JSON file in the user's config directory, then
//! overridden by environment variables and command-line flags.

mod settings;

pub use settings::{
    api_key_from_env, AiSettings, ConfigError, PipelineSettings, ReplyLookup, Settings,
    ENV_API_KEYS, ENV_BASE_URL, ENV_DATABASE, ENV_MODEL, ENV_NAMESPACE,
};
