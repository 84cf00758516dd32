//! Input sources and external services.
//!
//! - [`mailbox`] - mbox archive reader
//! - [`ai`] - language-model providers

pub mod ai;
pub mod mailbox;
