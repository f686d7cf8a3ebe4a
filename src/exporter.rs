//! Message export: history pagination, record mapping, file naming
//!
//! Fetches a dialog's history newest-first, maps every raw message into a
//! flat `MessageRecord`, and writes the rendered document into the output
//! directory. A message whose sender cannot be resolved is still exported,
//! labeled "Unknown".

use std::fmt;
use std::fs;
use std::path::PathBuf;

use chrono::{DateTime, Local, Utc};
use grammers_client::types::peer::Peer;
use grammers_client::types::{Media, Message};
use grammers_client::Client;
use regex::Regex;
use serde::Serialize;
use tracing::{info, warn};

use crate::config::{Config, ExportFormat};
use crate::dialogs::{DialogEntry, DialogInfo};
use crate::error::Result;
use crate::render;

/// Sender id used when a message has no resolvable sender.
const NO_SENDER: i64 = 0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Direction {
    Incoming,
    Outgoing,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Incoming => "Incoming",
            Self::Outgoing => "Outgoing",
        })
    }
}

/// Closed set of attached-media kinds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum MediaKind {
    Photo,
    Document(String),
    Video,
    Voice,
    Audio,
    Other,
}

impl MediaKind {
    /// Short human-readable tag for rendered documents.
    pub fn label(&self) -> String {
        match self {
            Self::Photo => "Photo".to_string(),
            Self::Document(mime) => format!("Document ({})", mime),
            Self::Video => "Video".to_string(),
            Self::Voice => "Voice Message".to_string(),
            Self::Audio => "Audio".to_string(),
            Self::Other => "Other media".to_string(),
        }
    }
}

/// Flat, immutable record of one exported message.
#[derive(Debug, Clone, Serialize)]
pub struct MessageRecord {
    pub id: i32,
    pub date: DateTime<Utc>,
    pub sender: String,
    pub direction: Direction,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub media: Option<MediaKind>,
    pub forwarded: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_to: Option<i32>,
    pub edited: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub views: Option<i32>,
}

/// Export one dialog's history into a document in `config.output_dir`.
///
/// Fetches newest-first, up to `config.limit` messages (unbounded when
/// `None`). Returns the path of the written file.
pub async fn export(client: &Client, entry: &DialogEntry, config: &Config) -> Result<PathBuf> {
    info!("Exporting {}: {}", entry.info.kind, entry.info.name);

    let me = client.get_me().await?;
    let my_id = me.raw.id();

    let records = fetch_records(client, entry, my_id, config.limit).await;
    info!("Fetched {} messages", records.len());

    fs::create_dir_all(&config.output_dir)?;

    let exported_at = Local::now();
    let timestamp = exported_at.format("%Y%m%d_%H%M%S").to_string();
    let path = config
        .output_dir
        .join(export_file_name(&entry.info, &timestamp, config.format));

    let document = match config.format {
        ExportFormat::Html => render::render_html(&entry.info, &records, exported_at),
        ExportFormat::Markdown => render::render_markdown(&entry.info, &records, exported_at),
        ExportFormat::Json => render::render_json(&entry.info, &records, exported_at)?,
    };
    fs::write(&path, document)?;

    info!(
        "Exported {} messages to {}",
        records.len(),
        path.display()
    );
    Ok(path)
}

/// Paginate the dialog's history, newest-first, mapping each message.
async fn fetch_records(
    client: &Client,
    entry: &DialogEntry,
    my_id: i64,
    limit: Option<usize>,
) -> Vec<MessageRecord> {
    let mut records = Vec::new();
    let mut iter = client.iter_messages(&entry.peer);

    loop {
        if reached_limit(records.len(), limit) {
            break;
        }

        match iter.next().await {
            Ok(Some(msg)) => {
                records.push(map_message(&msg, my_id));
                if records.len() % 100 == 0 {
                    info!("Fetched {} messages so far", records.len());
                }
            }
            Ok(None) => break,
            Err(e) => {
                warn!(
                    "History fetch for '{}' stopped early: {}",
                    entry.info.name, e
                );
                break;
            }
        }
    }

    records
}

/// True once the collected count has hit the configured limit.
///
/// Checked before every fetch, so `Some(0)` exports nothing and `None`
/// never stops the pagination.
fn reached_limit(fetched: usize, limit: Option<usize>) -> bool {
    matches!(limit, Some(limit) if fetched >= limit)
}

/// Map one raw message into a `MessageRecord`.
fn map_message(msg: &Message, my_id: i64) -> MessageRecord {
    let sender = msg.sender();

    MessageRecord {
        id: msg.id(),
        date: msg.date(),
        sender: sender_label(sender),
        direction: direction_for(sender_id(sender), my_id),
        text: msg.text().to_string(),
        media: msg.media().map(|m| media_kind(&m)),
        forwarded: msg.forward_header().is_some(),
        reply_to: msg.reply_to_message_id(),
        edited: msg.edit_date().is_some(),
        views: msg.view_count(),
    }
}

/// A message is outgoing exactly when its sender is the authenticated user.
fn direction_for(sender_id: i64, my_id: i64) -> Direction {
    if sender_id != NO_SENDER && sender_id == my_id {
        Direction::Outgoing
    } else {
        Direction::Incoming
    }
}

/// Extract sender id from a peer; `NO_SENDER` when unresolvable.
fn sender_id(sender: Option<&Peer>) -> i64 {
    sender
        .map(|s| match s {
            Peer::User(u) => u.raw.id(),
            Peer::Group(g) => match &g.raw {
                grammers_tl_types::enums::Chat::Chat(c) => c.id,
                grammers_tl_types::enums::Chat::Forbidden(f) => f.id,
                _ => NO_SENDER,
            },
            Peer::Channel(c) => c.raw.id,
        })
        .unwrap_or(NO_SENDER)
}

/// Display label for a message sender, with "(@handle)" when public.
fn sender_label(sender: Option<&Peer>) -> String {
    let Some(peer) = sender else {
        return "Unknown".to_string();
    };

    let (name, username) = match peer {
        Peer::User(u) => (u.full_name(), u.username().map(|s| s.to_string())),
        Peer::Group(g) => (g.title().unwrap_or("Group").to_string(), None),
        Peer::Channel(c) => (c.title().to_string(), c.username().map(|s| s.to_string())),
    };

    let name = if name.trim().is_empty() {
        "Unknown".to_string()
    } else {
        name
    };

    match username {
        Some(handle) => format!("{} (@{})", name, handle),
        None => name,
    }
}

/// Collapse a grammers media object into the closed `MediaKind` set.
fn media_kind(media: &Media) -> MediaKind {
    match media {
        Media::Photo(_) => MediaKind::Photo,
        Media::Document(doc) => match doc.mime_type() {
            Some(mime) => kind_from_mime(mime),
            None => MediaKind::Document("unknown".to_string()),
        },
        _ => MediaKind::Other,
    }
}

/// Sub-classify a document by MIME type.
///
/// Telegram voice notes arrive as `audio/ogg` documents.
fn kind_from_mime(mime: &str) -> MediaKind {
    if mime.starts_with("video/") {
        MediaKind::Video
    } else if mime == "audio/ogg" {
        MediaKind::Voice
    } else if mime.starts_with("audio/") {
        MediaKind::Audio
    } else {
        MediaKind::Document(mime.to_string())
    }
}

/// Strip a dialog name down to `[A-Za-z0-9 _-]` for use in a file name.
pub fn sanitize_dialog_name(name: &str) -> String {
    let re = Regex::new(r"[^A-Za-z0-9 _-]").expect("static regex");
    let cleaned = re.replace_all(name, "");
    let trimmed = cleaned.trim();
    if trimmed.is_empty() {
        "unknown_dialog".to_string()
    } else {
        trimmed.to_string()
    }
}

/// `{sanitized-name}_{kind}_{timestamp}.{ext}`
pub fn export_file_name(info: &DialogInfo, timestamp: &str, format: ExportFormat) -> String {
    format!(
        "{}_{}_{}.{}",
        sanitize_dialog_name(&info.name),
        info.kind,
        timestamp,
        format.extension()
    )
}
