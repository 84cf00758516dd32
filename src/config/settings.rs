//! Application settings and configuration types.
//!
//! Settings live in `settings.json` under the platform config directory
//! (`~/.config/inbox-triage/` on Linux). Every field has a default, so a
//! missing or partial file is fine. Environment variables override the file.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::domain::{Namespace, NamespaceError};

/// Overrides the database path.
pub const ENV_DATABASE: &str = "INBOX_TRIAGE_DB";
/// Overrides the namespace.
pub const ENV_NAMESPACE: &str = "INBOX_TRIAGE_NAMESPACE";
/// Overrides the completion endpoint base URL.
pub const ENV_BASE_URL: &str = "INBOX_TRIAGE_BASE_URL";
/// Overrides the model name.
pub const ENV_MODEL: &str = "INBOX_TRIAGE_MODEL";
/// API key variables, checked in order before the keychain.
pub const ENV_API_KEYS: [&str; 2] = ["INBOX_TRIAGE_API_KEY", "OPENAI_API_KEY"];

const SETTINGS_FILE: &str = "settings.json";
const DATABASE_FILE: &str = "inbox-triage.db";

/// Errors raised while loading settings.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read settings file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid settings file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid namespace: {0}")]
    Namespace(#[from] NamespaceError),

    #[error("no home directory available")]
    NoHomeDir,
}

/// Top-level application settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// SQLite database file.
    pub database_path: PathBuf,
    /// Table prefix; prompted for at startup when absent.
    pub namespace: Option<String>,
    /// Completion endpoint configuration.
    pub ai: AiSettings,
    /// Pipeline behaviour.
    pub pipeline: PipelineSettings,
}

impl Default for Settings {
    fn default() -> Self {
        let database_path = project_dirs()
            .map(|dirs| dirs.data_dir().join(DATABASE_FILE))
            .unwrap_or_else(|| PathBuf::from(DATABASE_FILE));

        Self {
            database_path,
            namespace: None,
            ai: AiSettings::default(),
            pipeline: PipelineSettings::default(),
        }
    }
}

/// Model endpoint configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AiSettings {
    /// OpenAI-compatible base URL, without `/chat/completions`.
    pub base_url: String,
    /// Model identifier.
    pub model: String,
    /// Sampling temperature.
    pub temperature: f32,
    /// Maximum tokens in the reply.
    pub max_tokens: Option<usize>,
    /// Keychain entry holding the API key.
    pub api_key_keychain_id: String,
    /// Who the assistant works for, as phrased in the prompt.
    pub persona: String,
}

impl Default for AiSettings {
    fn default() -> Self {
        Self {
            base_url: crate::providers::ai::OPENAI_BASE_URL.to_string(),
            model: "gpt-3.5-turbo".to_string(),
            temperature: 0.7,
            max_tokens: None,
            api_key_keychain_id: crate::storage::KeychainAccess::api_key_entry("openai"),
            persona: crate::services::DEFAULT_PERSONA.to_string(),
        }
    }
}

/// Pipeline behaviour switches.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineSettings {
    /// Which header identifies a reply when collecting known senders.
    pub reply_lookup: ReplyLookup,
    /// Drop both namespace tables before each new inbox run.
    pub reset_on_new_inbox: bool,
}

/// Key used to match a message against the message-id index when looking
/// for senders the user has corresponded with.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplyLookup {
    /// Look up each message's own `Message-ID`. Every sender with an id
    /// ends up known.
    #[default]
    MessageId,
    /// Look up `In-Reply-To`, so only senders of messages that were
    /// answered inside the archive are known.
    InReplyTo,
}

impl Settings {
    /// Default settings file location.
    pub fn default_path() -> Option<PathBuf> {
        project_dirs().map(|dirs| dirs.config_dir().join(SETTINGS_FILE))
    }

    /// Loads settings from `path`, or from the default location when `path`
    /// is `None`. A missing default file yields defaults; a missing explicit
    /// file is an error.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let (path, required) = match path {
            Some(p) => (p.to_path_buf(), true),
            None => match Self::default_path() {
                Some(p) => (p, false),
                None => return Ok(Self::default()),
            },
        };

        if !required && !path.exists() {
            tracing::debug!(path = %path.display(), "no settings file, using defaults");
            return Ok(Self::default());
        }

        let text = std::fs::read_to_string(&path).map_err(|source| ConfigError::Io {
            path: path.clone(),
            source,
        })?;
        let settings =
            serde_json::from_str(&text).map_err(|source| ConfigError::Parse { path, source })?;
        Ok(settings)
    }

    /// Applies environment overrides from the process environment.
    pub fn apply_env(&mut self) {
        self.apply_env_from(|key| std::env::var(key).ok());
    }

    /// Applies overrides from an arbitrary variable lookup. Empty values are
    /// ignored.
    pub fn apply_env_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(db) = get(ENV_DATABASE) {
            self.database_path = PathBuf::from(db);
        }
        if let Some(ns) = get(ENV_NAMESPACE) {
            self.namespace = Some(ns);
        }
        if let Some(url) = get(ENV_BASE_URL) {
            self.ai.base_url = url;
        }
        if let Some(model) = get(ENV_MODEL) {
            self.ai.model = model;
        }
    }

    /// Validated namespace, if one is configured.
    pub fn namespace(&self) -> Result<Option<Namespace>, ConfigError> {
        self.namespace
            .as_deref()
            .map(|ns| Namespace::new(ns.trim()).map_err(ConfigError::from))
            .transpose()
    }
}

/// First non-empty API key found in the environment.
pub fn api_key_from_env<F>(lookup: F) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    ENV_API_KEYS
        .iter()
        .filter_map(|key| lookup(key))
        .map(|v| v.trim().to_string())
        .find(|v| !v.is_empty())
}

fn project_dirs() -> Option<directories::ProjectDirs> {
    directories::ProjectDirs::from("io", "inbox-triage", "inbox-triage")
}
