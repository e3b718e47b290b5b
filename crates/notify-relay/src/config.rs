//! Relay configuration.
//!
//! Configuration comes from environment-style key/value inputs:
//!
//! | key                | fallback key          | meaning                          |
//! |--------------------|-----------------------|----------------------------------|
//! | `encryptedHookUrl` | `kmsEncryptedHookUrl` | base64 KMS ciphertext of the URL |
//! | `plainHookUrl`     | `unencryptedHookUrl`  | literal hook URL                 |
//! | `channelOverride`  | `slackChannel`        | destination channel name         |
//! | `hookTimeoutSecs`  |                       | HTTP request timeout             |
//!
//! Exactly one of the two URL sources must be set. An encrypted value of the
//! form `<...>` is a template placeholder and counts as unset.

use std::fmt;

use crate::credential::CredentialSource;
use crate::error::{RelayError, Result};

/// Key holding the encrypted hook URL.
pub const ENCRYPTED_HOOK_URL: &str = "encryptedHookUrl";
/// Key holding the plaintext hook URL.
pub const PLAIN_HOOK_URL: &str = "plainHookUrl";
/// Key holding the channel override.
pub const CHANNEL_OVERRIDE: &str = "channelOverride";
/// Key holding the request timeout in seconds.
pub const TIMEOUT_SECS: &str = "hookTimeoutSecs";

const LEGACY_ENCRYPTED_HOOK_URL: &str = "kmsEncryptedHookUrl";
const LEGACY_PLAIN_HOOK_URL: &str = "unencryptedHookUrl";
const LEGACY_CHANNEL_OVERRIDE: &str = "slackChannel";

/// Default HTTP request timeout.
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Relay configuration.
#[derive(Clone, PartialEq, Eq)]
pub struct RelayConfig {
    /// Base64-encoded ciphertext of the hook URL.
    pub encrypted_hook_url: Option<String>,
    /// Literal hook URL.
    pub plain_hook_url: Option<String>,
    /// Channel to post to instead of the webhook's default.
    pub channel_override: Option<String>,
    /// HTTP request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            encrypted_hook_url: None,
            plain_hook_url: None,
            channel_override: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl fmt::Debug for RelayConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let redact = |value: &Option<String>| value.as_ref().map(|_| "[REDACTED]");
        f.debug_struct("RelayConfig")
            .field("encrypted_hook_url", &redact(&self.encrypted_hook_url))
            .field("plain_hook_url", &redact(&self.plain_hook_url))
            .field("channel_override", &self.channel_override)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl RelayConfig {
    /// Reads the configuration from process environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if `hookTimeoutSecs` is not a number.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads the configuration through a key lookup function.
    ///
    /// Empty values count as unset. Primary keys win over their fallbacks.
    ///
    /// # Errors
    ///
    /// Returns an error if `hookTimeoutSecs` is not a number.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        let either = |key: &str, fallback: &str| get(key).or_else(|| get(fallback));

        let timeout_secs = match get(TIMEOUT_SECS) {
            Some(raw) => raw.trim().parse::<u64>().map_err(|e| {
                RelayError::Config(format!("invalid {TIMEOUT_SECS} '{raw}': {e}"))
            })?,
            None => DEFAULT_TIMEOUT_SECS,
        };

        Ok(Self {
            encrypted_hook_url: either(ENCRYPTED_HOOK_URL, LEGACY_ENCRYPTED_HOOK_URL),
            plain_hook_url: either(PLAIN_HOOK_URL, LEGACY_PLAIN_HOOK_URL),
            channel_override: either(CHANNEL_OVERRIDE, LEGACY_CHANNEL_OVERRIDE),
            timeout_secs,
        })
    }

    /// Sets the plaintext hook URL.
    #[must_use]
    pub fn with_plain_hook_url(mut self, url: impl Into<String>) -> Self {
        self.plain_hook_url = Some(url.into());
        self
    }

    /// Sets the encrypted hook URL.
    #[must_use]
    pub fn with_encrypted_hook_url(mut self, blob: impl Into<String>) -> Self {
        self.encrypted_hook_url = Some(blob.into());
        self
    }

    /// Sets the channel override.
    #[must_use]
    pub fn with_channel_override(mut self, channel: impl Into<String>) -> Self {
        self.channel_override = Some(channel.into());
        self
    }

    /// Sets the request timeout.
    #[must_use]
    pub const fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    /// Returns the encrypted hook URL unless it is missing or a placeholder.
    #[must_use]
    pub fn usable_encrypted_hook_url(&self) -> Option<&str> {
        self.encrypted_hook_url
            .as_deref()
            .filter(|blob| !is_placeholder(blob))
    }

    /// Determines where the hook URL comes from.
    ///
    /// # Errors
    ///
    /// Returns `RelayError::Config` if neither or both sources are set.
    pub fn credential_source(&self) -> Result<CredentialSource> {
        match (self.plain_hook_url.as_deref(), self.usable_encrypted_hook_url()) {
            (Some(_), Some(_)) => Err(RelayError::Config(format!(
                "{PLAIN_HOOK_URL} and {ENCRYPTED_HOOK_URL} are mutually exclusive"
            ))),
            (Some(url), None) => Ok(CredentialSource::Plain(url.to_string())),
            (None, Some(blob)) => Ok(CredentialSource::Encrypted(blob.to_string())),
            (None, None) => Err(RelayError::Config("Hook URL has not been set.".to_string())),
        }
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns `RelayError::Config` if the URL sources are unusable or the
    /// timeout is zero.
    pub fn validate(&self) -> Result<()> {
        self.credential_source()?;

        if self.timeout_secs == 0 {
            return Err(RelayError::Config(format!(
                "{TIMEOUT_SECS} must be greater than 0"
            )));
        }

        Ok(())
    }
}

fn is_placeholder(value: &str) -> bool {
    let value = value.trim();
    value.starts_with('<') && value.ends_with('>')
}
