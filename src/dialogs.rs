//! Dialog enumeration and classification
//!
//! Walks the account's dialog list and normalizes every conversation into
//! a `DialogInfo` descriptor. Classification is a pure function of the
//! underlying entity; one bad dialog never aborts the enumeration.

use std::fmt;

use grammers_client::types::peer::Peer;
use grammers_client::Client;
use serde::Serialize;
use tracing::warn;

use crate::error::Result;

/// Conversation type, as shown to the user and in export file names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DialogKind {
    Channel,
    Group,
    #[serde(rename = "Private Chat")]
    PrivateChat,
    Unknown,
}

impl DialogKind {
    /// Every kind, in the order dialog summaries are printed.
    pub const ALL: [DialogKind; 4] = [
        DialogKind::PrivateChat,
        DialogKind::Group,
        DialogKind::Channel,
        DialogKind::Unknown,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Channel => "Channel",
            Self::Group => "Group",
            Self::PrivateChat => "Private Chat",
            Self::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for DialogKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Normalized conversation descriptor. Immutable after creation.
#[derive(Debug, Clone, Serialize)]
pub struct DialogInfo {
    pub id: i64,
    pub name: String,
    pub kind: DialogKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    pub unread: i32,
}

/// A descriptor together with the entity reference needed to fetch history.
#[derive(Debug, Clone)]
pub struct DialogEntry {
    pub info: DialogInfo,
    pub peer: Peer,
}

/// Result of one enumeration pass.
#[derive(Debug, Clone)]
pub struct DialogList {
    pub entries: Vec<DialogEntry>,
    /// True when a page read failed and the list stopped early.
    pub truncated: bool,
}

/// Fetch and normalize every dialog of the account.
///
/// Re-queries the backend on every call. A failed page read is logged and
/// ends the enumeration with whatever was collected so far, marked as
/// truncated so callers can tell the list may be incomplete.
pub async fn list_dialogs(client: &Client) -> Result<DialogList> {
    let mut entries = Vec::new();
    let mut truncated = false;
    let mut dialogs = client.iter_dialogs();

    loop {
        match dialogs.next().await {
            Ok(Some(dialog)) => {
                let peer = dialog.peer.clone();
                let info = DialogInfo {
                    id: peer_id(&peer),
                    name: dialog_title(&peer),
                    kind: classify_peer(&peer),
                    username: peer_username(&peer),
                    unread: extract_unread_count(&dialog),
                };
                entries.push(DialogEntry { info, peer });
            }
            Ok(None) => break,
            Err(e) => {
                warn!("Failed to read a dialog page, keeping what we have: {}", e);
                truncated = true;
                break;
            }
        }
    }

    Ok(DialogList { entries, truncated })
}

/// Classify a peer into a `DialogKind`.
///
/// Broadcast channels are `Channel`; megagroup channels and basic group
/// chats are `Group`; regular users are `PrivateChat`; empty or forbidden
/// entities are `Unknown`.
pub fn classify_peer(peer: &Peer) -> DialogKind {
    match peer {
        Peer::Channel(c) => {
            if c.raw.broadcast {
                DialogKind::Channel
            } else {
                DialogKind::Group
            }
        }
        Peer::Group(g) => match &g.raw {
            grammers_tl_types::enums::Chat::Chat(_)
            | grammers_tl_types::enums::Chat::Channel(_) => DialogKind::Group,
            grammers_tl_types::enums::Chat::Empty(_)
            | grammers_tl_types::enums::Chat::Forbidden(_)
            | grammers_tl_types::enums::Chat::ChannelForbidden(_) => DialogKind::Unknown,
        },
        Peer::User(u) => match &u.raw {
            grammers_tl_types::enums::User::User(_) => DialogKind::PrivateChat,
            grammers_tl_types::enums::User::Empty(_) => DialogKind::Unknown,
        },
    }
}

fn dialog_title(peer: &Peer) -> String {
    match peer {
        Peer::Channel(c) => c.title().to_string(),
        Peer::Group(g) => g.title().unwrap_or("Group").to_string(),
        Peer::User(u) => u.full_name(),
    }
}

fn peer_id(peer: &Peer) -> i64 {
    match peer {
        Peer::Channel(c) => c.raw.id,
        Peer::Group(g) => match &g.raw {
            grammers_tl_types::enums::Chat::Empty(c) => c.id,
            grammers_tl_types::enums::Chat::Chat(c) => c.id,
            grammers_tl_types::enums::Chat::Forbidden(c) => c.id,
            grammers_tl_types::enums::Chat::Channel(c) => c.id,
            grammers_tl_types::enums::Chat::ChannelForbidden(c) => c.id,
        },
        Peer::User(u) => u.raw.id(),
    }
}

fn peer_username(peer: &Peer) -> Option<String> {
    match peer {
        Peer::User(u) => u.username().map(|s| s.to_string()),
        Peer::Channel(c) => c.username().map(|s| s.to_string()),
        Peer::Group(_) => None,
    }
}

fn extract_unread_count(dialog: &grammers_client::types::Dialog) -> i32 {
    match &dialog.raw {
        grammers_tl_types::enums::Dialog::Dialog(d) => d.unread_count,
        grammers_tl_types::enums::Dialog::Folder(folder) => {
            folder.unread_muted_messages_count + folder.unread_unmuted_messages_count
        }
    }
}
