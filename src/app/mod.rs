//! Interactive command loop and one-shot runs.

mod commands;
mod console;
mod render;

pub use commands::{Command, MessageLimit};
pub use console::Console;

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::io::{AsyncBufRead, AsyncWrite};

use crate::config::{api_key_from_env, Settings};
use crate::domain::{sort_by_urgency, Namespace, VocabularyList};
use crate::providers::ai::{LlmProvider, OpenAiCompatibleProvider, OPENAI_BASE_URL};
use crate::services::{Classifier, Pipeline, RunSummary};
use crate::storage::queries::{emails, extras, tables};
use crate::storage::StorageLayer;

const NAMESPACE_PROMPT: &str = "Enter your username: ";
const COMMAND_PROMPT: &str = "Enter Command: ";
const MBOX_PROMPT: &str = "Enter your MBOX file path: ";
const COUNT_PROMPT: &str = "How many emails would you like to process? ('all' for whole inbox): ";
const KEY_PROMPT: &str = "Enter API key: ";

enum Flow {
    Continue,
    Quit,
}

/// Wires settings, storage and the model provider together.
pub struct App {
    settings: Settings,
    storage: StorageLayer,
    provider: Option<Arc<dyn LlmProvider>>,
}

impl App {
    /// Opens the configured database.
    pub async fn new(settings: Settings) -> Result<Self> {
        let storage = StorageLayer::new(&settings.database_path)
            .await
            .with_context(|| format!("opening database {}", settings.database_path.display()))?;
        Ok(Self::with_storage(settings, storage))
    }

    pub fn with_storage(settings: Settings, storage: StorageLayer) -> Self {
        Self {
            settings,
            storage,
            provider: None,
        }
    }

    /// Uses a fixed provider instead of building one from settings.
    pub fn with_provider(mut self, provider: Arc<dyn LlmProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    pub fn storage(&self) -> &StorageLayer {
        &self.storage
    }

    /// Processes one archive without prompting.
    pub async fn run_once(&self, ns: Namespace, mbox: &Path, limit: Option<usize>) -> Result<RunSummary> {
        let pipeline = self.pipeline(ns).await?;
        let summary = pipeline
            .run(mbox, limit)
            .await
            .with_context(|| format!("processing {}", mbox.display()))?;
        Ok(summary)
    }

    /// Reads commands until `QUIT` or end of input.
    pub async fn run_interactive<R, W>(&self, console: &mut Console<R, W>) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let Some(ns) = self.resolve_namespace(console).await? else {
            return Ok(());
        };
        tracing::info!(namespace = %ns, "session started");

        while let Some(line) = console.ask(COMMAND_PROMPT).await? {
            let Some(command) = Command::parse(&line) else {
                continue;
            };
            tracing::debug!(%command, "command received");

            match self.handle(&ns, &command, console).await {
                Ok(Flow::Quit) => break,
                Ok(Flow::Continue) => {}
                Err(e) => {
                    tracing::error!(%command, error = %e, "command failed");
                    console.print(&format!("{} failed: {:#}\n", command, e)).await?;
                }
            }
        }
        Ok(())
    }

    async fn resolve_namespace<R, W>(&self, console: &mut Console<R, W>) -> Result<Option<Namespace>>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        if let Some(ns) = self.settings.namespace()? {
            return Ok(Some(ns));
        }

        while let Some(name) = console.ask(NAMESPACE_PROMPT).await? {
            match Namespace::new(&name) {
                Ok(ns) => return Ok(Some(ns)),
                Err(e) => console.print(&format!("{}\n", e)).await?,
            }
        }
        Ok(None)
    }

    async fn handle<R, W>(&self, ns: &Namespace, command: &Command, console: &mut Console<R, W>) -> Result<Flow>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let db = self.storage.db();

        match command {
            Command::NewInbox => {
                let Some(path) = console.ask(MBOX_PROMPT).await? else {
                    return Ok(Flow::Quit);
                };
                let Some(count) = console.ask(COUNT_PROMPT).await? else {
                    return Ok(Flow::Quit);
                };
                let limit = match count.parse::<MessageLimit>() {
                    Ok(limit) => limit,
                    Err(e) => {
                        console.print(&format!("{}\n", e)).await?;
                        return Ok(Flow::Continue);
                    }
                };

                let summary = self.run_once(ns.clone(), Path::new(&path), limit.0).await?;
                console.print(&render::summary(&summary)).await?;
            }
            Command::ShowEmails | Command::ShowUrgent => {
                db.ensure_schema(ns).await?;
                let mut rows = emails::list_all(db, ns).await?;
                if *command == Command::ShowUrgent {
                    sort_by_urgency(&mut rows);
                }
                console.print(&render::email_rows(&rows)).await?;
            }
            Command::ShowVocab => {
                db.ensure_schema(ns).await?;
                let mut out = String::new();
                for list in VocabularyList::ALL {
                    let values = extras::fetch_vocabulary(db, ns, list).await?;
                    out.push_str(&render::vocabulary(list, &values));
                }
                console.print(&out).await?;
            }
            Command::Reset => {
                tables::drop_all(db, ns).await?;
                tracing::info!(namespace = %ns, "tables dropped");
                console.print(&format!("Dropped tables for {}.\n", ns)).await?;
            }
            Command::SetKey => {
                let Some(key) = console.ask(KEY_PROMPT).await? else {
                    return Ok(Flow::Quit);
                };
                if key.is_empty() {
                    console.print("No key entered.\n").await?;
                } else {
                    self.storage
                        .keychain()
                        .store(&self.settings.ai.api_key_keychain_id, &key)
                        .await?;
                    console.print("API key saved.\n").await?;
                }
            }
            Command::Help => {
                let mut out = String::new();
                for command in Command::ALL {
                    out.push_str(&format!("  {:<12} {}\n", command.to_string(), command.description()));
                }
                console.print(&out).await?;
            }
            Command::Quit => return Ok(Flow::Quit),
            Command::Unknown(word) => {
                console
                    .print(&format!("Unknown command {}. Type HELP for a list.\n", word))
                    .await?;
            }
        }
        Ok(Flow::Continue)
    }

    async fn pipeline(&self, ns: Namespace) -> Result<Pipeline> {
        let ai = &self.settings.ai;
        let classifier = Classifier::new(self.provider().await?)
            .with_persona(ai.persona.clone())
            .with_temperature(ai.temperature)
            .with_max_tokens(ai.max_tokens);

        Ok(Pipeline::new(self.storage.db().clone(), ns, classifier)
            .with_settings(self.settings.pipeline.clone()))
    }

    async fn provider(&self) -> Result<Arc<dyn LlmProvider>> {
        if let Some(provider) = &self.provider {
            return Ok(Arc::clone(provider));
        }

        let ai = &self.settings.ai;
        let api_key = match api_key_from_env(|key| std::env::var(key).ok()) {
            Some(key) => Some(key),
            None => self
                .storage
                .keychain()
                .retrieve(&ai.api_key_keychain_id)
                .await
                .unwrap_or_else(|e| {
                    tracing::warn!(error = %e, "keychain unavailable");
                    None
                }),
        };

        if api_key.is_none() && ai.base_url.trim_end_matches('/') == OPENAI_BASE_URL {
            anyhow::bail!("no API key found; set INBOX_TRIAGE_API_KEY or run SET_KEY");
        }

        tracing::debug!(base_url = %ai.base_url, model = %ai.model, "building provider");
        Ok(Arc::new(OpenAiCompatibleProvider::custom(
            ai.base_url.clone(),
            api_key,
            ai.model.clone(),
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::ai::{CompletionResponse, MockLlmProvider};

    async fn app(settings: Settings) -> App {
        let storage = StorageLayer::in_memory().await.unwrap();
        App::with_storage(settings, storage)
    }

    async fn session(app: &App, input: &str) -> String {
        let mut console = Console::new(input.as_bytes(), Vec::new());
        app.run_interactive(&mut console).await.unwrap();
        String::from_utf8(console.into_output()).unwrap()
    }

    #[tokio::test]
    async fn prompts_for_namespace_until_valid() {
        let app = app(Settings::default()).await;
        let out = session(&app, "bad name\nalice\nquit\n").await;

        assert_eq!(out.matches(NAMESPACE_PROMPT).count(), 2);
        assert_eq!(out.matches(COMMAND_PROMPT).count(), 1);
    }

    #[tokio::test]
    async fn unknown_command_prints_hint() {
        let mut settings = Settings::default();
        settings.namespace = Some("alice".into());
        let out = session(&app(settings).await, "frobnicate\n").await;

        assert!(out.contains("Unknown command FROBNICATE. Type HELP for a list."));
    }

    #[tokio::test]
    async fn show_emails_on_fresh_namespace() {
        let mut settings = Settings::default();
        settings.namespace = Some("alice".into());
        let out = session(&app(settings).await, "show_emails\nshow_vocab\nquit\n").await;

        assert!(out.contains("No stored emails."));
        assert!(out.contains(&format!("{}: (empty)", VocabularyList::KnownAddresses)));
    }

    #[tokio::test]
    async fn bad_count_does_not_run() {
        let mut settings = Settings::default();
        settings.namespace = Some("alice".into());
        let app = app(settings).await.with_provider(Arc::new(MockLlmProvider::new()));
        let out = session(&app, "NEW_INBOX\n/tmp/x.mbox\nmany\nquit\n").await;

        assert!(out.contains("expected 'all' or a number"));
    }

    #[tokio::test]
    async fn missing_archive_reports_failure_and_continues() {
        let mut settings = Settings::default();
        settings.namespace = Some("alice".into());
        let mut provider = MockLlmProvider::new();
        provider
            .expect_complete()
            .never()
            .returning(|_| Ok(CompletionResponse::text("")));
        let app = app(settings).await.with_provider(Arc::new(provider));

        let out = session(&app, "NEW_INBOX\n/no/such/file.mbox\nall\nhelp\n").await;
        assert!(out.contains("NEW_INBOX failed"));
        assert!(out.contains("SHOW_URGENT"));
    }

    #[tokio::test]
    async fn reset_drops_tables() {
        let mut settings = Settings::default();
        settings.namespace = Some("alice".into());
        let app = app(settings).await;
        let ns = Namespace::new("alice").unwrap();
        app.storage().db().ensure_schema(&ns).await.unwrap();

        let out = session(&app, "reset\n").await;
        assert!(out.contains("Dropped tables for alice."));
        assert!(!tables::exists(app.storage().db(), &ns, crate::storage::Table::Emails)
            .await
            .unwrap());
    }
}
