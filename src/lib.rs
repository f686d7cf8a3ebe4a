//! Telegram Dialog Exporter Library
//!
//! This library provides tools to:
//! - Persist an opaque session token so interactive login happens once
//! - Enumerate and classify the account's dialogs
//! - Export a dialog's message history into HTML, Markdown or JSON
//! - Drive the above through a small interactive menu

pub mod config;
pub mod dialogs;
pub mod error;
pub mod exporter;
pub mod render;
pub mod session;
pub mod shell;

// Re-export common types
pub use config::{Config, ExportFormat};
pub use dialogs::{list_dialogs, DialogEntry, DialogInfo, DialogKind, DialogList};
pub use error::{Error, Result};
pub use exporter::{Direction, MediaKind, MessageRecord};
pub use session::{SessionLock, SessionStore, TelegramClient};
