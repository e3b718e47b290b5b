//! Webhook delivery.
//!
//! One POST per message. The response status decides the outcome:
//!
//! | status  | outcome                                 |
//! |---------|-----------------------------------------|
//! | < 400   | delivered                               |
//! | 400-499 | rejected, logged, treated as handled    |
//! | >= 500  | [`RelayError::ServerUnavailable`]       |

use std::time::Duration;

use notify_format::ChatMessage;
use reqwest::StatusCode;
use reqwest::header::CONTENT_TYPE;
use reqwest::redirect::Policy;
use tracing::{error, info};

use crate::credential::HookUrl;
use crate::error::{RelayError, Result};

/// How a response status is handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusClass {
    /// The webhook accepted the message.
    Success,
    /// The webhook refused the message; redelivery would not help.
    ClientError,
    /// The webhook failed; redelivery may help.
    ServerError,
}

/// Maps an HTTP status code to its handling.
#[must_use]
pub const fn classify_status(status: u16) -> StatusClass {
    match status {
        0..=399 => StatusClass::Success,
        400..=499 => StatusClass::ClientError,
        _ => StatusClass::ServerError,
    }
}

/// Result of a delivery that did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryOutcome {
    /// Accepted by the webhook.
    Delivered {
        /// HTTP status code.
        status: u16,
    },
    /// Refused with a 4xx status.
    Rejected {
        /// HTTP status code.
        status: u16,
        /// Canonical reason phrase.
        reason: String,
    },
}

impl DeliveryOutcome {
    /// Returns the HTTP status code.
    #[must_use]
    pub const fn status(&self) -> u16 {
        match self {
            Self::Delivered { status } | Self::Rejected { status, .. } => *status,
        }
    }

    /// Returns true if the webhook accepted the message.
    #[must_use]
    pub const fn is_delivered(&self) -> bool {
        matches!(self, Self::Delivered { .. })
    }
}

/// HTTP client for the chat webhook.
#[derive(Debug, Clone)]
pub struct WebhookClient {
    http: reqwest::Client,
}

impl WebhookClient {
    /// Creates a client with the given request timeout.
    ///
    /// Redirects are not followed; a 3xx answer is the outcome of the post.
    ///
    /// # Errors
    ///
    /// Returns `RelayError::Transport` if the TLS backend cannot be set up.
    pub fn new(timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .redirect(Policy::none())
            .build()?;
        Ok(Self { http })
    }

    /// Posts a message to the webhook.
    ///
    /// # Errors
    ///
    /// - `RelayError::ServerUnavailable` on a 5xx response
    /// - `RelayError::Transport` if no response arrived
    /// - `RelayError::Serialization` if the message cannot be encoded
    pub async fn post(&self, url: &HookUrl, message: &ChatMessage) -> Result<DeliveryOutcome> {
        let body = serde_json::to_vec(message)?;

        let response = self
            .http
            .post(url.as_url().clone())
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await?;

        let status = response.status();
        let reason = reason_phrase(status);

        match classify_status(status.as_u16()) {
            StatusClass::Success => {
                info!(host = url.host(), status = status.as_u16(), "message posted");
                Ok(DeliveryOutcome::Delivered {
                    status: status.as_u16(),
                })
            }
            StatusClass::ClientError => {
                let body = response.text().await.unwrap_or_default();
                error!(
                    host = url.host(),
                    status = status.as_u16(),
                    reason = %reason,
                    body = %body,
                    "webhook rejected message"
                );
                Ok(DeliveryOutcome::Rejected {
                    status: status.as_u16(),
                    reason,
                })
            }
            StatusClass::ServerError => {
                let body = response.text().await.unwrap_or_default();
                error!(
                    host = url.host(),
                    status = status.as_u16(),
                    reason = %reason,
                    body = %body,
                    "webhook unavailable"
                );
                Err(RelayError::ServerUnavailable {
                    status: status.as_u16(),
                    reason,
                })
            }
        }
    }
}

fn reason_phrase(status: StatusCode) -> String {
    status.canonical_reason().unwrap_or("Unknown").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(200, StatusClass::Success ; "ok")]
    #[test_case(204, StatusClass::Success ; "no content")]
    #[test_case(302, StatusClass::Success ; "redirect")]
    #[test_case(399, StatusClass::Success ; "upper success bound")]
    #[test_case(400, StatusClass::ClientError ; "bad request")]
    #[test_case(404, StatusClass::ClientError ; "not found")]
    #[test_case(499, StatusClass::ClientError ; "upper client bound")]
    #[test_case(500, StatusClass::ServerError ; "internal error")]
    #[test_case(503, StatusClass::ServerError ; "unavailable")]
    fn status_classes(status: u16, expected: StatusClass) {
        assert_eq!(classify_status(status), expected);
    }

    #[test]
    fn reason_phrases() {
        assert_eq!(reason_phrase(StatusCode::SERVICE_UNAVAILABLE), "Service Unavailable");
        assert_eq!(reason_phrase(StatusCode::NOT_FOUND), "Not Found");
    }

    #[test]
    fn outcome_accessors() {
        let delivered = DeliveryOutcome::Delivered { status: 200 };
        let rejected = DeliveryOutcome::Rejected {
            status: 404,
            reason: "Not Found".to_string(),
        };
        assert!(delivered.is_delivered());
        assert!(!rejected.is_delivered());
        assert_eq!(rejected.status(), 404);
    }
}
