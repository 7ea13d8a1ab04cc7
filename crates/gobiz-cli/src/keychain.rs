//! Saved GoBiz password for `--remember`, kept in the OS keychain.

use anyhow::{Context, Result};
use keyring::{Entry, Error as KeyringError};
use tracing::debug;

const SERVICE_NAME: &str = "gobiz-proxy";

/// Keychain slot for one login email.
pub struct SavedPassword {
    email: String,
    entry: Entry,
}

impl SavedPassword {
    pub fn for_email(email: &str) -> Result<Self> {
        let entry = Entry::new(SERVICE_NAME, email)
            .with_context(|| format!("No keychain entry available for {}", email))?;
        Ok(Self {
            email: email.to_string(),
            entry,
        })
    }

    /// The saved password, if any. An unreadable keychain counts as nothing saved.
    pub fn load(&self) -> Option<String> {
        match self.entry.get_password() {
            Ok(password) => Some(password),
            Err(KeyringError::NoEntry) => None,
            Err(e) => {
                debug!(email = %self.email, error = %e, "Keychain read failed");
                None
            }
        }
    }

    pub fn save(&self, password: &str) -> Result<()> {
        self.entry
            .set_password(password)
            .with_context(|| format!("Failed to save password for {} in keychain", self.email))
    }

    /// Remove the saved password. Returns false when nothing was saved.
    pub fn forget(&self) -> Result<bool> {
        match self.entry.delete_credential() {
            Ok(()) => Ok(true),
            Err(KeyringError::NoEntry) => Ok(false),
            Err(e) => Err(e)
                .with_context(|| format!("Failed to remove password for {} from keychain", self.email)),
        }
    }
}
