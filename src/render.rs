//! Document rendering for exported dialogs
//!
//! Records arrive newest-first (the fetch order) and are rendered oldest
//! first. Every record renders, even with an empty text body; annotations
//! for media, forwards, replies, edits and views render when present.

use chrono::{DateTime, Local};
use serde::Serialize;

use crate::dialogs::DialogInfo;
use crate::error::Result;
use crate::exporter::{Direction, MessageRecord};

const HTML_STYLE: &str = r#"body { font-family: Arial, sans-serif; margin: 20px; background: #f5f5f5; }
.message {
    margin: 10px 0;
    padding: 15px;
    border-radius: 10px;
    max-width: 80%;
}
.incoming {
    background: #ffffff;
    margin-right: 20%;
    border-left: 4px solid #2196F3;
}
.outgoing {
    background: #E3F2FD;
    margin-left: 20%;
    border-right: 4px solid #2196F3;
}
.media { color: #666; margin-top: 5px; }
.forward { color: #888; margin-top: 5px; }
.reply { color: #0066cc; margin-top: 5px; }
.edited { color: #888; font-style: italic; margin-top: 5px; }
.views { color: #888; margin-top: 5px; }
.meta { color: #666; font-size: 0.9em; margin-bottom: 5px; }"#;

/// Self-contained styled HTML document.
pub fn render_html(
    info: &DialogInfo,
    records: &[MessageRecord],
    exported_at: DateTime<Local>,
) -> String {
    let mut out = String::new();

    out.push_str("<html>\n<head>\n<meta charset=\"utf-8\">\n<style>\n");
    out.push_str(HTML_STYLE);
    out.push_str("\n</style>\n</head>\n<body>\n");
    out.push_str(&format!(
        "<h1>{} ({})</h1>\n",
        escape_html(&info.name),
        info.kind
    ));
    out.push_str(&format!(
        "<p>Exported: {}</p>\n",
        exported_at.format("%Y-%m-%d %H:%M:%S")
    ));
    out.push_str(&format!("<p>Total messages: {}</p>\n", records.len()));

    // Chronological order: reverse of the newest-first fetch order
    for record in records.iter().rev() {
        out.push_str(&render_html_block(record));
    }

    out.push_str("</body></html>\n");
    out
}

fn render_html_block(record: &MessageRecord) -> String {
    let class = match record.direction {
        Direction::Outgoing => "outgoing",
        Direction::Incoming => "incoming",
    };

    let mut block = format!("<div class='message {}'>\n", class);
    block.push_str(&format!(
        "<div class='meta'>{} - {} ({})</div>\n",
        record.date.to_rfc3339(),
        escape_html(&record.sender),
        record.direction
    ));

    if let Some(media) = &record.media {
        block.push_str(&format!(
            "<div class='media'>[{}]</div>\n",
            escape_html(&media.label())
        ));
    }
    if record.forwarded {
        block.push_str("<div class='forward'>[Forwarded]</div>\n");
    }
    if let Some(reply_to) = record.reply_to {
        block.push_str(&format!(
            "<div class='reply'>[Reply to message {}]</div>\n",
            reply_to
        ));
    }

    block.push_str(&escape_html(&record.text));
    block.push('\n');

    if record.edited {
        block.push_str("<div class='edited'>[Edited]</div>\n");
    }
    // Zero view counts render nothing
    if let Some(views) = record.views.filter(|v| *v > 0) {
        block.push_str(&format!("<div class='views'>👁 {}</div>\n", views));
    }

    block.push_str("</div>\n");
    block
}

/// Plain Markdown document.
pub fn render_markdown(
    info: &DialogInfo,
    records: &[MessageRecord],
    exported_at: DateTime<Local>,
) -> String {
    let mut out = String::new();
    out.push_str(&format!("# {} ({})\n\n", info.name, info.kind));
    out.push_str(&format!(
        "Exported: {}\n",
        exported_at.format("%Y-%m-%d %H:%M:%S")
    ));
    out.push_str(&format!("Messages: {}\n\n---\n\n", records.len()));

    for record in records.iter().rev() {
        out.push_str(&format!(
            "**{}** ({}, {}):\n",
            record.sender,
            record.date.format("%d.%m.%Y %H:%M:%S"),
            record.direction
        ));

        let mut tags = Vec::new();
        if let Some(media) = &record.media {
            tags.push(format!("[{}]", media.label()));
        }
        if record.forwarded {
            tags.push("[Forwarded]".to_string());
        }
        if let Some(reply_to) = record.reply_to {
            tags.push(format!("[Reply to message {}]", reply_to));
        }
        if record.edited {
            tags.push("[Edited]".to_string());
        }
        if let Some(views) = record.views.filter(|v| *v > 0) {
            tags.push(format!("[{} views]", views));
        }
        if !tags.is_empty() {
            out.push_str(&tags.join(" "));
            out.push('\n');
        }

        out.push_str(&record.text);
        out.push_str("\n\n");
    }

    out
}

#[derive(Serialize)]
struct JsonDocument<'a> {
    dialog: &'a DialogInfo,
    exported_at: DateTime<Local>,
    total_messages: usize,
    messages: Vec<&'a MessageRecord>,
}

/// Pretty-printed JSON document; messages in chronological order.
pub fn render_json(
    info: &DialogInfo,
    records: &[MessageRecord],
    exported_at: DateTime<Local>,
) -> Result<String> {
    let document = JsonDocument {
        dialog: info,
        exported_at,
        total_messages: records.len(),
        messages: records.iter().rev().collect(),
    };
    Ok(serde_json::to_string_pretty(&document)?)
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
