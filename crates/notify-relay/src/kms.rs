//! KMS-backed [`Decryptor`].

use aws_config::BehaviorVersion;
use aws_sdk_kms::Client;
use aws_sdk_kms::error::DisplayErrorContext;
use aws_sdk_kms::primitives::Blob;
use tokio::sync::OnceCell;
use tracing::debug;

use crate::credential::Decryptor;
use crate::error::{RelayError, Result};

/// Decrypts the hook URL with AWS KMS.
///
/// The SDK client is built from the ambient AWS configuration on first use,
/// so a relay configured with a plaintext URL never touches AWS.
#[derive(Debug, Default)]
pub struct KmsDecryptor {
    client: OnceCell<Client>,
}

impl KmsDecryptor {
    /// Creates a decryptor that loads the AWS configuration lazily.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a decryptor around an existing client.
    #[must_use]
    pub fn with_client(client: Client) -> Self {
        Self {
            client: OnceCell::new_with(Some(client)),
        }
    }

    async fn client(&self) -> &Client {
        self.client
            .get_or_init(|| async {
                debug!("loading AWS configuration for KMS");
                let config = aws_config::defaults(BehaviorVersion::latest()).load().await;
                Client::new(&config)
            })
            .await
    }
}

impl Decryptor for KmsDecryptor {
    async fn decrypt(&self, ciphertext: &[u8]) -> Result<Vec<u8>> {
        let output = self
            .client()
            .await
            .decrypt()
            .ciphertext_blob(Blob::new(ciphertext.to_vec()))
            .send()
            .await
            .map_err(|e| RelayError::Decryption {
                reason: DisplayErrorContext(&e).to_string(),
            })?;

        output
            .plaintext()
            .map(|blob| blob.clone().into_inner())
            .ok_or_else(|| RelayError::Decryption {
                reason: "KMS response carried no plaintext".to_string(),
            })
    }
}
