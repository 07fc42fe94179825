//! Persistent session keys.
//!
//! Exactly two values survive a restart: the access token and the user
//! identifier. Each lives under its own string key as a small file in the
//! app data directory. Nothing else persists.

use std::path::PathBuf;

use anyhow::{Context, Result};

/// Storage key for the bearer token
const TOKEN_KEY: &str = "token";

/// Storage key for the authenticated user's identifier
const USER_ID_KEY: &str = "user_id";

#[derive(Debug, Clone)]
pub struct TokenStore {
    data_dir: PathBuf,
}

impl TokenStore {
    pub fn new(data_dir: PathBuf) -> Self {
        Self { data_dir }
    }

    pub fn token(&self) -> Result<Option<String>> {
        self.read_key(TOKEN_KEY)
    }

    pub fn set_token(&self, token: &str) -> Result<()> {
        self.write_key(TOKEN_KEY, token)
    }

    pub fn user_id(&self) -> Result<Option<i64>> {
        // A value that doesn't parse is treated as absent, not as an error
        Ok(self.read_key(USER_ID_KEY)?.and_then(|value| value.parse().ok()))
    }

    pub fn set_user_id(&self, user_id: i64) -> Result<()> {
        self.write_key(USER_ID_KEY, &user_id.to_string())
    }

    /// Remove both keys. Missing keys are not an error.
    pub fn clear(&self) -> Result<()> {
        self.remove_key(TOKEN_KEY)?;
        self.remove_key(USER_ID_KEY)
    }

    fn key_path(&self, key: &str) -> PathBuf {
        self.data_dir.join(key)
    }

    fn read_key(&self, key: &str) -> Result<Option<String>> {
        let path = self.key_path(key);
        if !path.exists() {
            return Ok(None);
        }
        let value = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read stored key: {}", key))?;
        let value = value.trim();
        if value.is_empty() {
            Ok(None)
        } else {
            Ok(Some(value.to_string()))
        }
    }

    fn write_key(&self, key: &str, value: &str) -> Result<()> {
        std::fs::create_dir_all(&self.data_dir).context("Failed to create data directory")?;
        std::fs::write(self.key_path(key), value)
            .with_context(|| format!("Failed to write stored key: {}", key))
    }

    fn remove_key(&self, key: &str) -> Result<()> {
        let path = self.key_path(key);
        if path.exists() {
            std::fs::remove_file(&path)
                .with_context(|| format!("Failed to remove stored key: {}", key))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_store(name: &str) -> TokenStore {
        let dir = std::env::temp_dir().join(format!(
            "pipedesk-store-{}-{}",
            name,
            std::process::id()
        ));
        let _ = std::fs::remove_dir_all(&dir);
        TokenStore::new(dir)
    }

    #[test]
    fn test_token_round_trip() {
        let store = temp_store("token");
        assert_eq!(store.token().unwrap(), None);
        store.set_token("tok1").unwrap();
        assert_eq!(store.token().unwrap().as_deref(), Some("tok1"));
        store.set_token("tok2").unwrap();
        assert_eq!(store.token().unwrap().as_deref(), Some("tok2"));
    }

    #[test]
    fn test_user_id_round_trip() {
        let store = temp_store("user-id");
        assert_eq!(store.user_id().unwrap(), None);
        store.set_user_id(7).unwrap();
        assert_eq!(store.user_id().unwrap(), Some(7));
    }

    #[test]
    fn test_clear_removes_both_keys() {
        let store = temp_store("clear");
        store.set_token("tok1").unwrap();
        store.set_user_id(7).unwrap();
        store.clear().unwrap();
        assert_eq!(store.token().unwrap(), None);
        assert_eq!(store.user_id().unwrap(), None);
    }

    #[test]
    fn test_clear_when_nothing_stored_is_a_no_op() {
        let store = temp_store("clear-empty");
        store.clear().unwrap();
        store.clear().unwrap();
    }

    #[test]
    fn test_malformed_user_id_reads_as_absent() {
        let store = temp_store("malformed");
        std::fs::create_dir_all(&store.data_dir).unwrap();
        std::fs::write(store.key_path(USER_ID_KEY), "not-a-number").unwrap();
        assert_eq!(store.user_id().unwrap(), None);
    }
}
