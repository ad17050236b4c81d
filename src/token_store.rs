//! Persistent storage for access and refresh tokens.
//!
//! Every token write goes through a [`TokenStore`]; what the store holds
//! is the single source of truth for "am I logged in". Storage being
//! unavailable degrades to "no token" with a logged warning, never an
//! error surfaced to the caller.

use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use tracing::warn;

pub trait TokenStore: Send + Sync {
    /// Persist the access token, overwriting any prior value.
    fn save_access_token(&self, token: &str);

    /// The last-saved access token, if any.
    fn access_token(&self) -> Option<String>;

    /// Persist the refresh token, overwriting any prior value.
    fn save_refresh_token(&self, token: &str);

    /// The last-saved refresh token, if any.
    fn refresh_token(&self) -> Option<String>;

    /// Remove both tokens. Used by logout.
    fn clear(&self);
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct StoredTokens {
    access: Option<String>,
    refresh: Option<String>,
}

/// Token store backed by a small JSON file, the CLI analog of the
/// browser's persistent storage. Each operation is a whole-file
/// read-modify-write; the file never holds partial state.
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn read(&self) -> StoredTokens {
        match fs::read_to_string(&self.path) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
                warn!(path = %self.path.display(), error = %e, "Token file is corrupt, treating as empty");
                StoredTokens::default()
            }),
            Err(e) if e.kind() == ErrorKind::NotFound => StoredTokens::default(),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Failed to read token file");
                StoredTokens::default()
            }
        }
    }

    fn write(&self, tokens: &StoredTokens) {
        let content = match serde_json::to_string(tokens) {
            Ok(content) => content,
            Err(e) => {
                warn!(error = %e, "Failed to serialize tokens");
                return;
            }
        };
        if let Err(e) = fs::write(&self.path, content) {
            warn!(path = %self.path.display(), error = %e, "Failed to write token file");
        }
    }
}

impl TokenStore for FileTokenStore {
    fn save_access_token(&self, token: &str) {
        let mut tokens = self.read();
        tokens.access = Some(token.to_string());
        self.write(&tokens);
    }

    fn access_token(&self) -> Option<String> {
        self.read().access
    }

    fn save_refresh_token(&self, token: &str) {
        let mut tokens = self.read();
        tokens.refresh = Some(token.to_string());
        self.write(&tokens);
    }

    fn refresh_token(&self) -> Option<String> {
        self.read().refresh
    }

    fn clear(&self) {
        match fs::remove_file(&self.path) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Failed to remove token file");
            }
        }
    }
}

/// In-process token store for tests and throwaway sessions.
#[derive(Default)]
pub struct MemoryTokenStore {
    tokens: Mutex<StoredTokens>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, StoredTokens> {
        // A poisoned lock still holds coherent token state.
        self.tokens.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl TokenStore for MemoryTokenStore {
    fn save_access_token(&self, token: &str) {
        self.lock().access = Some(token.to_string());
    }

    fn access_token(&self) -> Option<String> {
        self.lock().access.clone()
    }

    fn save_refresh_token(&self, token: &str) {
        self.lock().refresh = Some(token.to_string());
    }

    fn refresh_token(&self) -> Option<String> {
        self.lock().refresh.clone()
    }

    fn clear(&self) {
        *self.lock() = StoredTokens::default();
    }
}
