//! Runtime configuration for the exporter
//!
//! All settings come from the environment (a `.env` file is honored) or
//! from CLI flags; the resulting `Config` is built once at startup and
//! passed by reference into every component.

use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Default session file when `SESSION_FILE` is not set.
pub const DEFAULT_SESSION_FILE: &str = "exporter.session";
/// Default output directory when `OUTPUT_DIR` is not set.
pub const DEFAULT_OUTPUT_DIR: &str = "exports";

/// Output document format tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Html,
    Markdown,
    Json,
}

impl ExportFormat {
    pub fn parse(raw: &str) -> Result<Self> {
        match raw.to_ascii_lowercase().as_str() {
            "html" | "htm" => Ok(Self::Html),
            "markdown" | "md" => Ok(Self::Markdown),
            "json" => Ok(Self::Json),
            other => Err(Error::InvalidArgument(format!(
                "Unsupported export format '{}'. Use html|md|json",
                other
            ))),
        }
    }

    /// File extension for the rendered document.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Html => "html",
            Self::Markdown => "md",
            Self::Json => "json",
        }
    }
}

/// Parse the `LIMIT` setting: a number, or `none`/`unbounded`/empty for no limit.
pub fn parse_limit(raw: &str) -> Result<Option<usize>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    match trimmed.to_ascii_lowercase().as_str() {
        "none" | "unbounded" => Ok(None),
        _ => trimmed
            .parse::<usize>()
            .map(Some)
            .map_err(|_| Error::InvalidArgument(format!("Invalid message limit '{}'", raw))),
    }
}

/// Main configuration struct.
#[derive(Debug, Clone)]
pub struct Config {
    pub api_id: i32,
    pub api_hash: String,
    /// Phone number for first-time login; prompted interactively when absent.
    pub phone: Option<String>,
    pub session_file: PathBuf,
    pub lock_file: PathBuf,
    /// Maximum messages per dialog; `None` means unbounded.
    pub limit: Option<usize>,
    pub format: ExportFormat,
    pub output_dir: PathBuf,
}

impl Config {
    /// Build and validate a configuration from raw settings.
    #[allow(clippy::too_many_arguments)]
    pub fn build(
        api_id: i32,
        api_hash: String,
        phone: Option<String>,
        session_file: PathBuf,
        limit_raw: Option<&str>,
        format_raw: &str,
        output_dir: PathBuf,
    ) -> Result<Self> {
        if api_id == 0 {
            return Err(Error::InvalidConfig("API_ID is not set".to_string()));
        }
        if api_hash.is_empty() {
            return Err(Error::InvalidConfig("API_HASH is not set".to_string()));
        }

        let limit = match limit_raw {
            Some(raw) => parse_limit(raw)?,
            None => None,
        };
        let format = ExportFormat::parse(format_raw)?;
        let lock_file = lock_file_for(&session_file);

        Ok(Self {
            api_id,
            api_hash,
            phone: phone.filter(|p| !p.trim().is_empty()),
            session_file,
            lock_file,
            limit,
            format,
            output_dir,
        })
    }
}

/// Lock file path derived from the session file path.
fn lock_file_for(session_file: &Path) -> PathBuf {
    let mut name = session_file.as_os_str().to_os_string();
    name.push(".lock");
    PathBuf::from(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build_valid() -> Config {
        Config::build(
            12345,
            "hash".to_string(),
            None,
            PathBuf::from(DEFAULT_SESSION_FILE),
            None,
            "html",
            PathBuf::from(DEFAULT_OUTPUT_DIR),
        )
        .expect("valid config")
    }

    #[test]
    fn export_format_parse_html() {
        assert!(matches!(ExportFormat::parse("html"), Ok(ExportFormat::Html)));
        assert!(matches!(ExportFormat::parse("HTM"), Ok(ExportFormat::Html)));
    }

    #[test]
    fn export_format_parse_markdown() {
        assert!(matches!(
            ExportFormat::parse("markdown"),
            Ok(ExportFormat::Markdown)
        ));
        assert!(matches!(
            ExportFormat::parse("md"),
            Ok(ExportFormat::Markdown)
        ));
    }

    #[test]
    fn export_format_parse_json() {
        assert!(matches!(ExportFormat::parse("JSON"), Ok(ExportFormat::Json)));
    }

    #[test]
    fn export_format_parse_invalid() {
        assert!(ExportFormat::parse("pdf").is_err());
        assert!(ExportFormat::parse("").is_err());
    }

    #[test]
    fn export_format_extensions() {
        assert_eq!(ExportFormat::Html.extension(), "html");
        assert_eq!(ExportFormat::Markdown.extension(), "md");
        assert_eq!(ExportFormat::Json.extension(), "json");
    }

    #[test]
    fn parse_limit_number() {
        assert_eq!(parse_limit("100").unwrap(), Some(100));
        assert_eq!(parse_limit(" 5 ").unwrap(), Some(5));
    }

    #[test]
    fn parse_limit_unbounded_spellings() {
        assert_eq!(parse_limit("none").unwrap(), None);
        assert_eq!(parse_limit("None").unwrap(), None);
        assert_eq!(parse_limit("unbounded").unwrap(), None);
        assert_eq!(parse_limit("").unwrap(), None);
    }

    #[test]
    fn parse_limit_rejects_garbage() {
        assert!(parse_limit("ten").is_err());
        assert!(parse_limit("-3").is_err());
    }

    #[test]
    fn build_rejects_missing_api_id() {
        let result = Config::build(
            0,
            "hash".to_string(),
            None,
            PathBuf::from("s.session"),
            None,
            "html",
            PathBuf::from("out"),
        );
        assert!(matches!(result, Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn build_rejects_missing_api_hash() {
        let result = Config::build(
            1,
            String::new(),
            None,
            PathBuf::from("s.session"),
            None,
            "html",
            PathBuf::from("out"),
        );
        assert!(matches!(result, Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn build_parses_limit_and_format() {
        let config = Config::build(
            1,
            "hash".to_string(),
            None,
            PathBuf::from("s.session"),
            Some("250"),
            "md",
            PathBuf::from("out"),
        )
        .unwrap();

        assert_eq!(config.limit, Some(250));
        assert_eq!(config.format, ExportFormat::Markdown);
    }

    #[test]
    fn build_derives_lock_file_from_session_file() {
        let config = build_valid();
        assert_eq!(
            config.lock_file,
            PathBuf::from(format!("{}.lock", DEFAULT_SESSION_FILE))
        );
    }

    #[test]
    fn build_drops_blank_phone() {
        let config = Config::build(
            1,
            "hash".to_string(),
            Some("   ".to_string()),
            PathBuf::from("s.session"),
            None,
            "html",
            PathBuf::from("out"),
        )
        .unwrap();

        assert!(config.phone.is_none());
    }

    #[test]
    fn build_keeps_phone() {
        let config = Config::build(
            1,
            "hash".to_string(),
            Some("+1999".to_string()),
            PathBuf::from("s.session"),
            None,
            "html",
            PathBuf::from("out"),
        )
        .unwrap();

        assert_eq!(config.phone.as_deref(), Some("+1999"));
    }

    #[test]
    fn config_clone_and_debug() {
        let config = build_valid();
        let cloned = config.clone();
        assert_eq!(cloned.api_id, config.api_id);

        let debug_str = format!("{:?}", config);
        assert!(debug_str.contains("Config"));
        assert!(debug_str.contains("session_file"));
    }
}
