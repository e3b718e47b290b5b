//! The notification handler.
//!
//! For each envelope in an event: render the chat message, apply the channel
//! override, resolve the hook URL and post once. Records are handled in order
//! and the first failure stops the batch so the host redelivers the event.

use std::time::Duration;

use notify_format::{ChatMessage, Envelope, parse_event, render};
use tracing::{debug, info, instrument};

use crate::config::RelayConfig;
use crate::credential::{CredentialResolver, Decryptor};
use crate::delivery::{DeliveryOutcome, WebhookClient};
use crate::error::Result;

/// Renders an envelope and applies the channel override.
#[must_use]
pub fn prepare(envelope: &Envelope, channel_override: Option<&str>) -> ChatMessage {
    let message = render(envelope);
    match channel_override {
        Some(channel) => message.with_channel(channel),
        None => message,
    }
}

/// Parses an event document and renders every record without delivering.
///
/// # Errors
///
/// Returns `RelayError::Event` if the document is not a notification event.
pub fn render_event(document: &str, channel_override: Option<&str>) -> Result<Vec<ChatMessage>> {
    Ok(parse_event(document)?
        .iter()
        .map(|envelope| prepare(envelope, channel_override))
        .collect())
}

/// Relays notifications to the chat webhook.
#[derive(Debug)]
pub struct Relay<D> {
    resolver: CredentialResolver<D>,
    client: WebhookClient,
    channel_override: Option<String>,
}

impl<D: Decryptor> Relay<D> {
    /// Creates a relay from configuration.
    ///
    /// The hook URL is not resolved until the first delivery.
    ///
    /// # Errors
    ///
    /// Returns `RelayError::Transport` if the HTTP client cannot be built.
    pub fn new(config: RelayConfig, decryptor: D) -> Result<Self> {
        let client = WebhookClient::new(Duration::from_secs(config.timeout_secs))?;
        let channel_override = config.channel_override.clone();
        Ok(Self::from_parts(
            CredentialResolver::new(config, decryptor),
            client,
            channel_override,
        ))
    }

    /// Creates a relay from its parts.
    #[must_use]
    pub const fn from_parts(
        resolver: CredentialResolver<D>,
        client: WebhookClient,
        channel_override: Option<String>,
    ) -> Self {
        Self {
            resolver,
            client,
            channel_override,
        }
    }

    /// Returns the credential resolver.
    pub const fn resolver(&self) -> &CredentialResolver<D> {
        &self.resolver
    }

    /// Handles one envelope.
    ///
    /// # Errors
    ///
    /// Returns the resolver's or the delivery client's error.
    #[instrument(skip_all, fields(subject = envelope.subject_or_empty()))]
    pub async fn handle_envelope(&self, envelope: &Envelope) -> Result<DeliveryOutcome> {
        let message = prepare(envelope, self.channel_override.as_deref());
        debug!(text = %message.text, "rendered notification");

        let url = self.resolver.resolve().await?;
        self.client.post(&url, &message).await
    }

    /// Handles every record of an event document.
    ///
    /// # Errors
    ///
    /// Returns `RelayError::Event` if the document cannot be parsed, or the
    /// first record's delivery error.
    pub async fn handle_event(&self, document: &str) -> Result<Vec<DeliveryOutcome>> {
        let envelopes = parse_event(document)?;
        info!(records = envelopes.len(), "handling notification event");

        let mut outcomes = Vec::with_capacity(envelopes.len());
        for envelope in &envelopes {
            outcomes.push(self.handle_envelope(envelope).await?);
        }
        Ok(outcomes)
    }
}
