//! inbox-triage - Entry point for the command loop

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use inbox_triage::app::{Console, MessageLimit};
use inbox_triage::config::Settings;
use inbox_triage::App;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "inbox-triage")]
#[command(about = "Classify an mbox archive with a language model and store the results")]
struct Cli {
    /// Settings file (defaults to the platform config directory)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// SQLite database file
    #[arg(short, long)]
    database: Option<PathBuf>,

    /// Table prefix for this user
    #[arg(short, long)]
    namespace: Option<String>,

    /// Process this archive and exit instead of starting the prompt
    #[arg(short, long)]
    mbox: Option<PathBuf>,

    /// Messages to process with --mbox ('all' or a number)
    #[arg(long, default_value = "all")]
    count: MessageLimit,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut settings = Settings::load(cli.config.as_deref())?;
    settings.apply_env();
    if let Some(database) = cli.database {
        settings.database_path = database;
    }
    if let Some(namespace) = cli.namespace {
        settings.namespace = Some(namespace);
    }

    tracing::info!(database = %settings.database_path.display(), "starting inbox-triage");
    let app = App::new(settings.clone()).await?;

    match cli.mbox {
        Some(mbox) => {
            let Some(ns) = settings.namespace()? else {
                anyhow::bail!("--mbox needs a namespace");
            };
            let summary = app.run_once(ns, &mbox, cli.count.0).await?;
            println!(
                "Processed {} of {} messages: {} rows stored.",
                summary.classified, summary.messages_read, summary.inserted
            );
        }
        None => app.run_interactive(&mut Console::stdio()).await?,
    }

    Ok(())
}
