//! inbox-triage - Classify an exported mailbox with a language model
//!
//! Reads an mbox archive, cleans each message, asks an OpenAI-compatible
//! model to label the sender, their request, an alert and an urgency score,
//! and stores the results in per-namespace SQLite tables.

pub mod app;
pub mod config;
pub mod domain;
pub mod providers;
pub mod services;
pub mod storage;

pub use app::App;
