use anyhow::{Context, Result};
use keyring::Entry;

const SERVICE_NAME: &str = "pipedesk";

/// OS-keychain storage for remembered login passwords, keyed by username.
pub struct CredentialStore;

impl CredentialStore {
    /// Remember a password in the OS keychain
    pub fn store(username: &str, password: &str) -> Result<()> {
        let entry =
            Entry::new(SERVICE_NAME, username).context("Failed to create keyring entry")?;
        entry
            .set_password(password)
            .context("Failed to store password in keychain")?;
        Ok(())
    }

    /// Look up the remembered password for a username
    pub fn password(username: &str) -> Result<String> {
        let entry =
            Entry::new(SERVICE_NAME, username).context("Failed to create keyring entry")?;
        entry
            .get_password()
            .context("Failed to retrieve password from keychain")
    }

    /// Forget the remembered password for a username
    pub fn forget(username: &str) -> Result<()> {
        let entry =
            Entry::new(SERVICE_NAME, username).context("Failed to create keyring entry")?;
        entry
            .delete_credential()
            .context("Failed to delete credential from keychain")?;
        Ok(())
    }

    /// Whether a password is remembered for a username
    pub fn has_credentials(username: &str) -> bool {
        match Entry::new(SERVICE_NAME, username) {
            Ok(entry) => entry.get_password().is_ok(),
            Err(_) => false,
        }
    }
}
