//! Interactive menu loop over the enumerated dialogs
//!
//! Startup authenticates and lists dialogs; the menu then offers exporting
//! one dialog, exporting all of them, or quitting. A failed export is
//! logged and the loop continues.

use std::io::{self, Write};

use tracing::{error, info};

use crate::config::Config;
use crate::dialogs::{list_dialogs, DialogEntry, DialogInfo, DialogKind, DialogList};
use crate::error::{Error, Result};
use crate::exporter;
use crate::session::{connect_client, ensure_authorized, SessionLock, SessionStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MenuChoice {
    ExportOne,
    ExportAll,
    Quit,
}

fn parse_choice(input: &str) -> Option<MenuChoice> {
    match input.trim() {
        "1" => Some(MenuChoice::ExportOne),
        "2" => Some(MenuChoice::ExportAll),
        "0" => Some(MenuChoice::Quit),
        _ => None,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Selection {
    Cancel,
    Pick(usize),
}

/// Parse a 1-based dialog selection; `0` cancels.
fn parse_selection(input: &str, count: usize) -> Result<Selection> {
    let number: usize = input
        .trim()
        .parse()
        .map_err(|_| Error::InvalidArgument("Please enter a number".to_string()))?;

    if number == 0 {
        Ok(Selection::Cancel)
    } else if number <= count {
        Ok(Selection::Pick(number - 1))
    } else {
        Err(Error::InvalidArgument(format!(
            "Dialog number out of range (1-{})",
            count
        )))
    }
}

/// Run the interactive export session.
pub async fn run(config: &Config) -> Result<()> {
    let _lock = SessionLock::acquire(&config.lock_file)?;
    let store = SessionStore::new(&config.session_file);

    let client = connect_client(config, &store).await?;
    ensure_authorized(&client, config, &store).await?;
    info!("Client is ready");

    println!("Listing dialogs...");
    let DialogList {
        entries: dialogs,
        truncated,
    } = list_dialogs(&client).await?;
    println!("\nFound {} dialogs", dialogs.len());

    let infos: Vec<&DialogInfo> = dialogs.iter().map(|entry| &entry.info).collect();
    print!("{}", dialog_summary(&infos, truncated));

    loop {
        println!("\nChoose an action:");
        println!("1. Export one dialog");
        println!("2. Export all dialogs");
        println!("0. Quit");

        let choice = prompt_line("Your choice: ")?;
        match parse_choice(&choice) {
            Some(MenuChoice::ExportOne) => {
                println!("\nAvailable dialogs:");
                for (i, entry) in dialogs.iter().enumerate() {
                    println!("{}. {} ({})", i + 1, display_name(&entry.info), entry.info.kind);
                }

                let input = prompt_line("Dialog number to export (0 to cancel): ")?;
                match parse_selection(&input, dialogs.len()) {
                    Ok(Selection::Pick(idx)) => export_one(&client, &dialogs[idx], config).await,
                    Ok(Selection::Cancel) => {}
                    Err(e) => println!("{}", e),
                }
            }
            Some(MenuChoice::ExportAll) => {
                println!("\nExporting all dialogs...");
                for (i, entry) in dialogs.iter().enumerate() {
                    println!("Processing dialog {}/{}", i + 1, dialogs.len());
                    export_one(&client, entry, config).await;
                }
                println!("All dialogs processed");
                break;
            }
            Some(MenuChoice::Quit) => break,
            None => println!("Please enter 1, 2 or 0"),
        }
    }

    client.disconnect();
    Ok(())
}

/// Export one dialog; failures are logged, never propagated.
async fn export_one(
    client: &crate::session::TelegramClient,
    entry: &DialogEntry,
    config: &Config,
) {
    match exporter::export(client, entry, config).await {
        Ok(path) => println!("Saved to {}", path.display()),
        Err(e) => error!("Export of '{}' failed: {}", entry.info.name, e),
    }
}

fn display_name(info: &DialogInfo) -> String {
    match &info.username {
        Some(handle) => format!("{} (@{})", info.name, handle),
        None => info.name.clone(),
    }
}

/// Dialogs grouped by kind, with unread counts and a note when the
/// enumeration stopped early.
fn dialog_summary(infos: &[&DialogInfo], truncated: bool) -> String {
    let mut out = String::new();

    for kind in DialogKind::ALL {
        let group: Vec<&DialogInfo> = infos
            .iter()
            .filter(|d| d.kind == kind)
            .copied()
            .collect();
        if group.is_empty() {
            continue;
        }

        out.push_str(&format!("\n{}s ({}):\n", kind, group.len()));
        for (i, info) in group.iter().enumerate() {
            let unread = if info.unread > 0 {
                format!(" [{} unread]", info.unread)
            } else {
                String::new()
            };
            out.push_str(&format!("{}. {}{}\n", i + 1, display_name(info), unread));
        }
    }

    if truncated {
        out.push_str("\nWarning: the dialog list stopped early; some dialogs may be missing\n");
    }

    out
}

fn prompt_line(message: &str) -> Result<String> {
    print!("{}", message);
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(input.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_choice_menu_entries() {
        assert_eq!(parse_choice("1"), Some(MenuChoice::ExportOne));
        assert_eq!(parse_choice("2"), Some(MenuChoice::ExportAll));
        assert_eq!(parse_choice("0"), Some(MenuChoice::Quit));
    }

    #[test]
    fn parse_choice_trims_whitespace() {
        assert_eq!(parse_choice(" 1 \n"), Some(MenuChoice::ExportOne));
    }

    #[test]
    fn parse_choice_rejects_garbage() {
        assert_eq!(parse_choice("3"), None);
        assert_eq!(parse_choice("export"), None);
        assert_eq!(parse_choice(""), None);
    }

    #[test]
    fn parse_selection_picks_in_range() {
        assert_eq!(parse_selection("1", 3).unwrap(), Selection::Pick(0));
        assert_eq!(parse_selection("3", 3).unwrap(), Selection::Pick(2));
    }

    #[test]
    fn parse_selection_zero_cancels() {
        assert_eq!(parse_selection("0", 3).unwrap(), Selection::Cancel);
    }

    #[test]
    fn parse_selection_out_of_range_is_error() {
        let err = parse_selection("4", 3).unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
        assert!(err.to_string().contains("out of range"));
    }

    #[test]
    fn parse_selection_non_numeric_is_error() {
        let err = parse_selection("abc", 3).unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
    }

    #[test]
    fn parse_selection_empty_list_only_cancels() {
        assert_eq!(parse_selection("0", 0).unwrap(), Selection::Cancel);
        assert!(parse_selection("1", 0).is_err());
    }

    fn info(name: &str, kind: DialogKind, unread: i32) -> DialogInfo {
        DialogInfo {
            id: 1,
            name: name.to_string(),
            kind,
            username: None,
            unread,
        }
    }

    #[test]
    fn summary_groups_by_kind_with_unread() {
        let a = info("John", DialogKind::PrivateChat, 3);
        let b = info("Rust Fans", DialogKind::Group, 0);
        let summary = dialog_summary(&[&a, &b], false);

        assert!(summary.contains("Private Chats (1):"));
        assert!(summary.contains("1. John [3 unread]"));
        assert!(summary.contains("Groups (1):"));
        assert!(summary.contains("1. Rust Fans\n"));
        assert!(!summary.contains("Warning"));
    }

    #[test]
    fn summary_notes_truncated_listing() {
        let a = info("John", DialogKind::PrivateChat, 0);
        let summary = dialog_summary(&[&a], true);

        assert!(summary.contains("some dialogs may be missing"));
    }

    #[test]
    fn summary_of_empty_listing_can_still_warn() {
        assert_eq!(dialog_summary(&[], false), "");
        assert!(dialog_summary(&[], true).contains("stopped early"));
    }
}
