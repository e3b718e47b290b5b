//! Hook URL resolution.
//!
//! The hook URL is a credential. It either arrives in plaintext or as a
//! base64 ciphertext that a key-management service decrypts. The
//! [`CredentialResolver`] resolves it once and keeps it for the rest of the
//! process:
//!
//! ```text
//! Unresolved --resolve()--> Resolving --ok--> Resolved (cached forever)
//!      ^                        |
//!      +--------- error --------+
//! ```
//!
//! Failures are never cached; the next call tries again.

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use parking_lot::Mutex;
use tracing::{debug, info, warn};
use url::Url;
use zeroize::Zeroizing;

use crate::config::RelayConfig;
use crate::error::{RelayError, Result};

/// Where the hook URL comes from.
#[derive(Clone, PartialEq, Eq)]
pub enum CredentialSource {
    /// A literal URL.
    Plain(String),
    /// A base64-encoded ciphertext of the URL.
    Encrypted(String),
}

impl CredentialSource {
    /// Returns the source kind as a string.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Plain(_) => "plain",
            Self::Encrypted(_) => "encrypted",
        }
    }
}

impl fmt::Debug for CredentialSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CredentialSource::{}([REDACTED])", self.kind())
    }
}

/// A validated webhook URL.
#[derive(Clone, PartialEq, Eq)]
pub struct HookUrl(Url);

impl HookUrl {
    /// Parses a hook URL.
    ///
    /// A value without a scheme (`hooks.example.com/services/abc`) is taken to
    /// be HTTPS.
    ///
    /// # Errors
    ///
    /// Returns `RelayError::Config` if the value is not an http(s) URL with a
    /// host.
    pub fn parse(raw: &str) -> Result<Self> {
        let raw = raw.trim();
        let url = if has_scheme(raw) {
            Url::parse(raw)
        } else {
            Url::parse(&format!("https://{raw}"))
        }
        .map_err(|e| RelayError::Config(format!("invalid hook URL: {e}")))?;

        if !matches!(url.scheme(), "http" | "https") {
            return Err(RelayError::Config(format!(
                "hook URL scheme must be http or https, got '{}'",
                url.scheme()
            )));
        }
        if url.host_str().is_none_or(str::is_empty) {
            return Err(RelayError::Config("hook URL has no host".to_string()));
        }

        Ok(Self(url))
    }

    /// Returns the URL.
    #[must_use]
    pub const fn as_url(&self) -> &Url {
        &self.0
    }

    /// Returns the host, which is safe to log.
    #[must_use]
    pub fn host(&self) -> &str {
        self.0.host_str().unwrap_or_default()
    }
}

impl fmt::Debug for HookUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HookUrl({}://{}/[REDACTED])", self.0.scheme(), self.host())
    }
}

// `scheme://` at the start of the value; a `://` later on (in a query, say)
// does not count.
fn has_scheme(raw: &str) -> bool {
    raw.split_once("://").is_some_and(|(scheme, _)| {
        scheme.starts_with(|c: char| c.is_ascii_alphabetic())
            && scheme
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
    })
}

/// Decrypts ciphertext through a key-management service.
pub trait Decryptor: Send + Sync {
    /// Decrypts a ciphertext blob.
    ///
    /// # Errors
    ///
    /// Returns `RelayError::Decryption` if the service rejects the request.
    fn decrypt(&self, ciphertext: &[u8]) -> impl Future<Output = Result<Vec<u8>>> + Send;
}

/// Observable resolver state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolverState {
    /// Nothing resolved yet, or the last attempt failed.
    Unresolved,
    /// A resolution is in flight.
    Resolving,
    /// The URL is cached.
    Resolved,
}

enum Slot {
    Unresolved,
    Resolving,
    Resolved(HookUrl),
}

/// Resolves the hook URL once per process.
pub struct CredentialResolver<D> {
    config: RelayConfig,
    decryptor: D,
    slot: Mutex<Slot>,
}

impl<D> fmt::Debug for CredentialResolver<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialResolver")
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

impl<D> CredentialResolver<D> {
    /// Creates an unresolved resolver.
    #[must_use]
    pub fn new(config: RelayConfig, decryptor: D) -> Self {
        Self {
            config,
            decryptor,
            slot: Mutex::new(Slot::Unresolved),
        }
    }

    /// Returns the current state.
    pub fn state(&self) -> ResolverState {
        match *self.slot.lock() {
            Slot::Unresolved => ResolverState::Unresolved,
            Slot::Resolving => ResolverState::Resolving,
            Slot::Resolved(_) => ResolverState::Resolved,
        }
    }

    /// Returns the cached URL, if resolution has succeeded.
    pub fn cached(&self) -> Option<HookUrl> {
        match &*self.slot.lock() {
            Slot::Resolved(url) => Some(url.clone()),
            _ => None,
        }
    }

    /// Returns the decryption collaborator.
    pub const fn decryptor(&self) -> &D {
        &self.decryptor
    }
}

impl<D: Decryptor> CredentialResolver<D> {
    /// Returns the hook URL, resolving it on first use.
    ///
    /// # Errors
    ///
    /// - `RelayError::Config` if no usable source is configured or the URL is
    ///   malformed
    /// - `RelayError::Decryption` if the key-management call fails
    pub async fn resolve(&self) -> Result<HookUrl> {
        if let Some(url) = self.cached() {
            return Ok(url);
        }

        let source = self.config.credential_source()?;
        {
            let mut slot = self.slot.lock();
            if matches!(*slot, Slot::Unresolved) {
                *slot = Slot::Resolving;
            }
        }

        let outcome = self.resolve_source(&source).await;

        let mut slot = self.slot.lock();
        match outcome {
            Ok(url) => {
                if let Slot::Resolved(existing) = &*slot {
                    return Ok(existing.clone());
                }
                info!(source = source.kind(), host = url.host(), "resolved hook URL");
                *slot = Slot::Resolved(url.clone());
                Ok(url)
            }
            Err(err) => {
                if matches!(*slot, Slot::Resolving) {
                    *slot = Slot::Unresolved;
                }
                warn!(source = source.kind(), error = %err, "hook URL resolution failed");
                Err(err)
            }
        }
    }

    async fn resolve_source(&self, source: &CredentialSource) -> Result<HookUrl> {
        match source {
            CredentialSource::Plain(raw) => HookUrl::parse(raw),
            CredentialSource::Encrypted(blob) => {
                let ciphertext = STANDARD.decode(blob.trim()).map_err(|e| {
                    RelayError::Config(format!("encrypted hook URL is not valid base64: {e}"))
                })?;

                debug!(bytes = ciphertext.len(), "decrypting hook URL");
                let plaintext = Zeroizing::new(self.decryptor.decrypt(&ciphertext).await?);

                let text = std::str::from_utf8(&plaintext)
                    .ok()
                    .filter(|text| text.is_ascii())
                    .ok_or_else(|| RelayError::Decryption {
                        reason: "decrypted hook URL is not ASCII".to_string(),
                    })?;

                HookUrl::parse(text)
            }
        }
    }
}

/// In-memory decryptor for testing.
///
/// Clones share their call counter.
#[derive(Debug, Clone, Default)]
pub struct FakeDecryptor {
    plaintext: Vec<u8>,
    failures_left: Arc<AtomicUsize>,
    calls: Arc<AtomicUsize>,
}

impl FakeDecryptor {
    /// Creates a decryptor that always returns `plaintext`.
    #[must_use]
    pub fn returning(plaintext: impl Into<Vec<u8>>) -> Self {
        Self {
            plaintext: plaintext.into(),
            ..Self::default()
        }
    }

    /// Fails the next `times` calls before succeeding.
    #[must_use]
    pub fn failing_first(self, times: usize) -> Self {
        self.failures_left.store(times, Ordering::SeqCst);
        self
    }

    /// Returns how many times `decrypt` was called.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Decryptor for FakeDecryptor {
    async fn decrypt(&self, _ciphertext: &[u8]) -> Result<Vec<u8>> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let failing = self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(1))
            .is_ok();
        if failing {
            return Err(RelayError::Decryption {
                reason: "simulated key-management failure".to_string(),
            });
        }

        Ok(self.plaintext.clone())
    }
}
