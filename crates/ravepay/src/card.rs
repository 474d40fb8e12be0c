//! Card charge authorization flow.
//!
//! ```text
//! Init -> Encrypted -> Submitted -> Success | PendingAuth(kind) | Failed
//!                         ^   |
//!                         +---+  PendingAuth(PIN), once
//! ```
//!
//! Only a PIN challenge is answered automatically, and only once. OTP, AVS and
//! redirect challenges go back to the caller, who collects the factor and
//! calls [`RaveClient::validate_card_charge`].

use crate::client::RaveClient;
use crate::constants::{
    ALGORITHM_TAG, CHARGE_PATH, PIN_AUTH, VALIDATE_CHARGE_PATH, VALIDATE_PATH,
};
use crate::error::RaveError;
use crate::payload::{
    AuthChallenge, ChargePlaintext, ChargeRequest, EncryptedEnvelope, ValidateCardPayload,
    ValidateChargeRequest, ValidateLegacyPayload,
};
use crate::response::Outcome;
use crate::submitter::Submitter;

/// Terminal state of [`RaveClient::charge_card`].
#[derive(Debug, Clone, PartialEq)]
pub enum ChargeResult {
    /// Charge completed.
    Success(Outcome),
    /// The card holder must supply another factor before the charge completes.
    PendingAuth {
        challenge: AuthChallenge,
        outcome: Outcome,
    },
    /// The gateway declined. Carries its response code and message.
    Failed(Outcome),
}

impl ChargeResult {
    pub fn outcome(&self) -> &Outcome {
        match self {
            ChargeResult::Success(o) | ChargeResult::Failed(o) => o,
            ChargeResult::PendingAuth { outcome, .. } => outcome,
        }
    }

    /// Pending challenge, if the flow stopped for one.
    pub fn challenge(&self) -> Option<AuthChallenge> {
        match self {
            ChargeResult::PendingAuth { challenge, .. } => Some(*challenge),
            _ => None,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ChargeResult::Success(_))
    }

    /// Unwrap the outcome, turning a decline into [`RaveError::Gateway`].
    /// Pending results are returned as `Ok`.
    pub fn into_outcome(self) -> Result<Outcome, RaveError> {
        match self {
            ChargeResult::Success(o) | ChargeResult::PendingAuth { outcome: o, .. } => Ok(o),
            ChargeResult::Failed(o) => Err(RaveError::Gateway {
                code: o.response_code,
                message: o.response_message,
            }),
        }
    }
}

impl<S: Submitter> RaveClient<S> {
    /// Encrypt a charge into the envelope posted to `/charge`.
    pub fn encrypt_charge(&self, request: &ChargeRequest) -> Result<EncryptedEnvelope, RaveError> {
        let plaintext = ChargePlaintext {
            public_key: self.public_key(),
            request,
        };
        Ok(EncryptedEnvelope {
            public_key: self.public_key().to_string(),
            client: self.cipher().encrypt_json(&plaintext)?,
            alg: ALGORITHM_TAG.to_string(),
        })
    }

    /// Charge a card, answering a PIN challenge at most once.
    ///
    /// `request` is never modified; resubmissions work on a private copy.
    pub async fn charge_card(&self, request: &ChargeRequest) -> Result<ChargeResult, RaveError> {
        request.check_required()?;
        let mut attempt = request.clone();

        let first = self.submit_charge(&attempt).await?;
        let challenge = first.suggested_auth();
        tracing::info!(
            card = %request.masked_card(),
            status = first.status_code,
            ?challenge,
            "card charge submitted"
        );

        if challenge != AuthChallenge::Pin {
            return Ok(conclude(first, challenge));
        }

        if attempt.pin.as_deref().map_or(true, |p| p.trim().is_empty()) {
            return Err(RaveError::missing("pin"));
        }
        attempt.suggested_auth = Some(PIN_AUTH.to_string());

        tracing::info!(card = %request.masked_card(), "resubmitting charge with PIN");
        let second = self.submit_charge(&attempt).await?;
        let challenge = second.suggested_auth();
        Ok(conclude(second, challenge))
    }

    /// Validate a pending charge through the legacy `/validate` endpoint.
    pub async fn validate_charge(
        &self,
        request: &ValidateChargeRequest,
    ) -> Result<Outcome, RaveError> {
        request.check_required()?;
        let payload = ValidateLegacyPayload {
            public_key: self.public_key(),
            transaction_reference: &request.transaction_reference,
            otp: &request.otp,
            extra: &request.extra,
        };
        self.post(VALIDATE_PATH, &payload).await
    }

    /// Validate a pending card charge with the OTP the card holder entered.
    ///
    /// Single shot: a failed validation is returned, not retried.
    pub async fn validate_card_charge(
        &self,
        request: &ValidateChargeRequest,
    ) -> Result<Outcome, RaveError> {
        request.check_required()?;
        let payload = ValidateCardPayload {
            public_key: self.public_key(),
            transaction_reference: &request.transaction_reference,
            otp: &request.otp,
            extra: &request.extra,
        };
        let outcome = self.post(VALIDATE_CHARGE_PATH, &payload).await?;
        tracing::info!(
            reference = %request.transaction_reference,
            successful = outcome.is_successful,
            "card charge validation"
        );
        Ok(outcome)
    }

    async fn submit_charge(&self, attempt: &ChargeRequest) -> Result<Outcome, RaveError> {
        let envelope = self.encrypt_charge(attempt)?;
        self.post(CHARGE_PATH, &envelope).await
    }
}

/// Map a classified charge response onto a terminal state. A PIN request at
/// this point means the PIN already sent was rejected.
fn conclude(outcome: Outcome, challenge: AuthChallenge) -> ChargeResult {
    match challenge {
        AuthChallenge::Pin => {
            tracing::warn!(
                code = outcome.response_code.as_deref().unwrap_or("-"),
                "gateway asked for a PIN again, not retrying"
            );
            ChargeResult::Failed(outcome)
        }
        AuthChallenge::None if outcome.requires_validation => ChargeResult::PendingAuth {
            challenge: AuthChallenge::Otp,
            outcome,
        },
        AuthChallenge::None if outcome.is_successful => ChargeResult::Success(outcome),
        AuthChallenge::None => ChargeResult::Failed(outcome),
        challenge => ChargeResult::PendingAuth { challenge, outcome },
    }
}
