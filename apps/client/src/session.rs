//! Durable key-value persistence for session data and preferences.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::Result;

/// Stable storage keys. These are part of the on-device format and must
/// not change between releases.
pub mod keys {
    pub const SESSION_TOKEN: &str = "session_token";
    pub const OAUTH_PROVIDER: &str = "oauth_provider";
    /// Legacy fallback credential from before server-side auth existed.
    pub const GEMINI_API_KEY: &str = "gemini_api_key";
    pub const DARK_MODE: &str = "dark_mode";
}

/// Platform key-value store for the session token, selected OAuth
/// provider, and user preferences.
///
/// Within a process, a completed `set` must be visible to the next
/// `get` on the same key (read-after-write). No cross-process locking
/// is promised.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>>;
    async fn set(&self, key: &str, value: &str) -> Result<()>;
    async fn clear(&self, key: &str) -> Result<()>;
}

/// In-memory session store.
///
/// Used by tests and as the ephemeral fallback on platforms without
/// durable key-value storage.
#[derive(Default)]
pub struct MemorySessionStore {
    values: Mutex<HashMap<String, String>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.values.lock().unwrap().get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        self.values
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn clear(&self, key: &str) -> Result<()> {
        self.values.lock().unwrap().remove(key);
        Ok(())
    }
}
