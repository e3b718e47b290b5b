//! Relays infrastructure notifications to a chat webhook.
//!
//! `notify-relay` takes pub/sub notification events, renders them with
//! [`notify_format`] and posts the result to an incoming-webhook URL:
//!
//! - [`config`]: environment-style configuration
//! - [`credential`]: hook URL resolution, plaintext or KMS-encrypted, cached
//!   for the process lifetime
//! - [`kms`]: AWS KMS decryptor
//! - [`delivery`]: the webhook client and its status handling
//! - [`relay`]: the per-event handler
//!
//! # Example
//!
//! ```rust,no_run
//! use notify_relay::{FakeDecryptor, Relay, RelayConfig};
//!
//! # async fn example() -> notify_relay::Result<()> {
//! let config = RelayConfig::default().with_plain_hook_url("https://hooks.example.com/services/abc");
//! let relay = Relay::new(config, FakeDecryptor::default())?;
//!
//! let outcomes = relay
//!     .handle_event(r#"{"subject": "deploy", "message": "done"}"#)
//!     .await?;
//! assert!(outcomes[0].is_delivered());
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod config;
pub mod credential;
pub mod delivery;
pub mod error;
pub mod kms;
pub mod relay;

pub use config::RelayConfig;
pub use credential::{
    CredentialResolver, CredentialSource, Decryptor, FakeDecryptor, HookUrl, ResolverState,
};
pub use delivery::{DeliveryOutcome, StatusClass, WebhookClient, classify_status};
pub use error::{RelayError, Result};
pub use kms::KmsDecryptor;
pub use relay::{Relay, prepare, render_event};
