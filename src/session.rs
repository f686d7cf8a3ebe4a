//! Session management for the Telegram client
//!
//! Provides:
//! - A file-based store for the opaque session token (base64 of the
//!   serialized grammers session)
//! - File-based session locking to prevent parallel execution
//! - Client creation and first-time login

use std::fs::{self, File, OpenOptions};
use std::io::{self, ErrorKind, Write};
use std::path::PathBuf;
use std::sync::Arc;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use fs2::FileExt;
use grammers_client::Client;
use grammers_mtsender::{SenderPool, SenderPoolHandle};
use grammers_session::storages::TlSession as Session;
use tracing::info;

use crate::config::Config;
use crate::error::{Error, Result};

/// File-backed store for the opaque session token.
///
/// The token is an opaque credential string; a missing (or empty) file is
/// the normal "not logged in yet" state, never an error.
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    /// Read the saved token. Returns `None` when the file does not exist
    /// or holds nothing but whitespace.
    pub fn load(&self) -> Result<Option<String>> {
        match fs::read_to_string(&self.path) {
            Ok(content) => {
                let token = content.trim().to_string();
                if token.is_empty() {
                    Ok(None)
                } else {
                    Ok(Some(token))
                }
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Overwrite the token file with the given token.
    pub fn save(&self, token: &str) -> Result<()> {
        fs::write(&self.path, token)?;
        Ok(())
    }
}

/// Serialize a session into the opaque token string.
pub fn encode_session(session: &Session) -> String {
    BASE64.encode(session.save())
}

/// Rebuild a session from a saved token string.
pub fn decode_session(token: &str) -> Result<Session> {
    let bytes = BASE64
        .decode(token)
        .map_err(|e| Error::InvalidSession(format!("not valid base64: {}", e)))?;
    Session::load(&bytes).map_err(|e| Error::InvalidSession(e.to_string()))
}

/// Session lock guard that ensures exclusive access to the Telegram session.
pub struct SessionLock {
    path: PathBuf,
    lock_file: Option<File>,
}

impl SessionLock {
    /// Acquire an exclusive lock at the given path.
    pub fn acquire<P: Into<PathBuf>>(path: P) -> Result<Self> {
        let path = path.into();
        let lock_file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&path)
            .map_err(|e| Error::LockError(format!("Failed to open lock file: {}", e)))?;

        match lock_file.try_lock_exclusive() {
            Ok(()) => Ok(Self {
                path,
                lock_file: Some(lock_file),
            }),
            Err(_) => Err(Error::SessionLocked),
        }
    }

    /// Release the lock manually
    pub fn release(&mut self) {
        if let Some(ref file) = self.lock_file {
            let _ = file.unlock();
        }
        self.lock_file = None;
        let _ = fs::remove_file(&self.path);
    }
}

impl Drop for SessionLock {
    fn drop(&mut self) {
        self.release();
    }
}

/// Holder for SenderPool components and Client
pub struct TelegramClient {
    pub client: Client,
    pub handle: SenderPoolHandle,
    session: Arc<Session>,
    _runner_handle: tokio::task::JoinHandle<()>,
}

impl TelegramClient {
    /// Create a new TelegramClient from a session
    pub async fn connect(session: Arc<Session>, api_id: i32) -> Result<Self> {
        let pool = SenderPool::new(session.clone(), api_id);

        // Create client from pool (need reference to whole pool)
        let client = Client::new(&pool);

        // Get handle and runner after client is created
        let SenderPool {
            runner,
            updates: _updates,
            handle,
        } = pool;

        // Spawn the runner in background
        let runner_handle = tokio::spawn(async move {
            runner.run().await;
        });

        Ok(Self {
            client,
            handle,
            session,
            _runner_handle: runner_handle,
        })
    }

    /// Current session serialized as an opaque token string.
    pub fn token(&self) -> String {
        encode_session(&self.session)
    }

    /// Stop the background runner and drop the connection.
    pub fn disconnect(self) {
        self._runner_handle.abort();
    }
}

// Implement Deref to allow using TelegramClient as &Client
impl std::ops::Deref for TelegramClient {
    type Target = Client;

    fn deref(&self) -> &Self::Target {
        &self.client
    }
}

/// Connect using the stored token when present, or a fresh session otherwise.
pub async fn connect_client(config: &Config, store: &SessionStore) -> Result<TelegramClient> {
    let session = match store.load()? {
        Some(token) => {
            info!("Found saved session");
            Arc::new(decode_session(&token)?)
        }
        None => {
            info!("No saved session, starting fresh");
            Arc::new(Session::new())
        }
    };

    TelegramClient::connect(session, config.api_id).await
}

/// Run the interactive login-code flow when the session is not authorized.
///
/// Saves the session token exactly once, after a successful first login.
pub async fn ensure_authorized(
    client: &TelegramClient,
    config: &Config,
    store: &SessionStore,
) -> Result<()> {
    if client
        .is_authorized()
        .await
        .map_err(|e| Error::TelegramError(e.to_string()))?
    {
        return Ok(());
    }

    let phone = match &config.phone {
        Some(phone) => phone.clone(),
        None => prompt("Phone number (international format): ")?,
    };

    info!("Requesting login code for {}", phone);
    let login_token = client
        .request_login_code(&phone, &config.api_hash)
        .await
        .map_err(|e| Error::AuthFailed(format!("Failed to request code: {}", e)))?;

    let code = prompt("Enter the code from Telegram: ")?;
    let user = client
        .sign_in(&login_token, &code)
        .await
        .map_err(|e| Error::AuthFailed(format!("Failed to sign in: {}", e)))?;

    store.save(&client.token())?;
    info!(
        "Signed in as {} (@{})",
        user.full_name(),
        user.username().unwrap_or("-")
    );

    Ok(())
}

fn prompt(message: &str) -> Result<String> {
    print!("{}", message);
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(input.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn load_missing_file_returns_none() {
        let temp = tempdir().expect("tempdir");
        let store = SessionStore::new(temp.path().join("absent.session"));

        assert!(store.load().expect("load").is_none());
    }

    #[test]
    fn save_then_load_returns_token() {
        let temp = tempdir().expect("tempdir");
        let store = SessionStore::new(temp.path().join("token.session"));

        store.save("opaque-token").expect("save");
        assert_eq!(store.load().unwrap().as_deref(), Some("opaque-token"));
    }

    #[test]
    fn save_is_idempotent() {
        let temp = tempdir().expect("tempdir");
        let store = SessionStore::new(temp.path().join("token.session"));

        store.save("same-token").expect("save");
        store.save("same-token").expect("save again");
        assert_eq!(store.load().unwrap().as_deref(), Some("same-token"));
    }

    #[test]
    fn save_overwrites_previous_token() {
        let temp = tempdir().expect("tempdir");
        let store = SessionStore::new(temp.path().join("token.session"));

        store.save("first").expect("save");
        store.save("second").expect("save");
        assert_eq!(store.load().unwrap().as_deref(), Some("second"));
    }

    #[test]
    fn empty_file_counts_as_absent() {
        let temp = tempdir().expect("tempdir");
        let path = temp.path().join("token.session");
        std::fs::write(&path, "  \n").expect("write");

        let store = SessionStore::new(&path);
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn load_trims_trailing_newline() {
        let temp = tempdir().expect("tempdir");
        let path = temp.path().join("token.session");
        std::fs::write(&path, "token-value\n").expect("write");

        let store = SessionStore::new(&path);
        assert_eq!(store.load().unwrap().as_deref(), Some("token-value"));
    }

    #[test]
    fn decode_rejects_invalid_base64() {
        let result = decode_session("not base64 at all!!!");
        assert!(matches!(result, Err(Error::InvalidSession(_))));
    }

    #[test]
    fn encode_decode_roundtrip() {
        let session = Session::new();
        let token = encode_session(&session);
        assert!(!token.is_empty());

        decode_session(&token).expect("token should decode back into a session");
    }

    #[test]
    fn lock_file_is_created_on_acquire() {
        let temp = tempdir().expect("tempdir");
        let path = temp.path().join("exporter.session.lock");

        assert!(!path.exists());
        let mut lock = SessionLock::acquire(&path).expect("lock");
        assert!(path.exists());
        lock.release();
    }

    #[test]
    fn release_removes_lock_file() {
        let temp = tempdir().expect("tempdir");
        let path = temp.path().join("exporter.session.lock");

        let mut lock = SessionLock::acquire(&path).expect("lock");
        assert!(path.exists());
        lock.release();
        assert!(!path.exists());
    }

    #[test]
    fn lock_dropped_releases_automatically() {
        let temp = tempdir().expect("tempdir");
        let path = temp.path().join("exporter.session.lock");

        {
            let _lock = SessionLock::acquire(&path).expect("lock");
            assert!(path.exists());
        }
        // Lock should be released after drop
        assert!(!path.exists());
    }

    #[test]
    fn double_release_is_safe() {
        let temp = tempdir().expect("tempdir");
        let path = temp.path().join("exporter.session.lock");

        let mut lock = SessionLock::acquire(&path).expect("lock");
        lock.release();
        lock.release(); // Should not panic
    }

}
