use serde::Serialize;

use crate::cipher::TransactionCipher;
use crate::config::RaveConfig;
use crate::error::RaveError;
use crate::response::{interpret, Outcome};
use crate::submitter::Submitter;

/// Client for the card charge endpoints.
///
/// Everything inside is read-only after construction: the credentials, the
/// derived cipher key and the submitter. Wrap it in an `Arc` to share it
/// across tasks; each call builds its own request values.
pub struct RaveClient<S> {
    config: RaveConfig,
    cipher: TransactionCipher,
    submitter: S,
}

#[cfg(feature = "full")]
impl RaveClient<crate::submitter::HttpSubmitter> {
    /// Build a client that talks HTTP to the host selected by `config`.
    pub fn new(config: RaveConfig) -> Result<Self, RaveError> {
        let submitter = crate::submitter::HttpSubmitter::new(&config)?;
        Self::with_submitter(config, submitter)
    }
}

impl<S: Submitter> RaveClient<S> {
    /// Build a client over any [`Submitter`]. Derives the cipher key once.
    pub fn with_submitter(config: RaveConfig, submitter: S) -> Result<Self, RaveError> {
        if config.credentials.public_key().trim().is_empty() {
            return Err(RaveError::missing("public key"));
        }
        let cipher =
            TransactionCipher::from_secret_key(config.credentials.secret_key(), config.encoding)?;
        tracing::debug!(
            base_url = config.base_url(),
            environment = ?config.environment,
            "rave client ready"
        );
        Ok(Self {
            config,
            cipher,
            submitter,
        })
    }

    pub fn config(&self) -> &RaveConfig {
        &self.config
    }

    pub fn cipher(&self) -> &TransactionCipher {
        &self.cipher
    }

    pub fn submitter(&self) -> &S {
        &self.submitter
    }

    pub(crate) fn public_key(&self) -> &str {
        self.config.credentials.public_key()
    }

    pub(crate) fn secret_key(&self) -> &str {
        self.config.credentials.secret_key()
    }

    /// Serialize `payload`, submit it to `path` and classify the answer.
    pub(crate) async fn post<T: Serialize>(
        &self,
        path: &str,
        payload: &T,
    ) -> Result<Outcome, RaveError> {
        let body = serde_json::to_value(payload)?;
        let raw = self.submitter.submit(path, &body).await?;
        let outcome = interpret(&raw)?;
        tracing::debug!(
            path,
            status = outcome.status_code,
            code = outcome.response_code.as_deref().unwrap_or("-"),
            successful = outcome.is_successful,
            "classified gateway response"
        );
        Ok(outcome)
    }
}
