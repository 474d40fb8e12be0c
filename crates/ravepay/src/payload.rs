use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::constants::PIN_AUTH;
use crate::error::RaveError;

/// Card charge fields supplied by the merchant.
///
/// The charge flow never mutates the caller's value: each attempt works on
/// its own clone.
#[derive(Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChargeRequest {
    pub cardno: String,
    pub cvv: String,
    pub expirymonth: String,
    pub expiryyear: String,
    pub amount: String,
    pub currency: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(rename = "txRef", skip_serializing_if = "Option::is_none")]
    pub tx_ref: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pin: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggested_auth: Option<String>,
    /// Any other gateway field (`phonenumber`, `firstname`, `billingzip`, ...).
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ChargeRequest {
    /// Fail with a validation error if a field the gateway always needs is absent.
    pub fn check_required(&self) -> Result<(), RaveError> {
        if is_blank(self.redirect_url.as_deref()) {
            return Err(RaveError::missing("redirect_url"));
        }
        Ok(())
    }

    /// Last four digits of the card, for logs.
    pub fn masked_card(&self) -> String {
        let digits = self.cardno.len();
        match self.cardno.get(digits.saturating_sub(4)..) {
            Some(last4) if digits > 4 => format!("****{last4}"),
            _ => "****".to_string(),
        }
    }
}

impl fmt::Debug for ChargeRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChargeRequest")
            .field("cardno", &self.masked_card())
            .field("cvv", &"[REDACTED]")
            .field("expirymonth", &self.expirymonth)
            .field("expiryyear", &self.expiryyear)
            .field("amount", &self.amount)
            .field("currency", &self.currency)
            .field("email", &self.email)
            .field("country", &self.country)
            .field("tx_ref", &self.tx_ref)
            .field("redirect_url", &self.redirect_url)
            .field("pin", &self.pin.as_ref().map(|_| "[REDACTED]"))
            .field("suggested_auth", &self.suggested_auth)
            .field("extra", &self.extra.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Plaintext that gets encrypted into [`EncryptedEnvelope::client`].
#[derive(Serialize)]
pub(crate) struct ChargePlaintext<'a> {
    #[serde(rename = "PBFPubKey")]
    pub public_key: &'a str,
    #[serde(flatten)]
    pub request: &'a ChargeRequest,
}

/// Body of a `/charge` POST.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptedEnvelope {
    #[serde(rename = "PBFPubKey")]
    pub public_key: String,
    /// Encrypted, text-encoded [`ChargeRequest`].
    pub client: String,
    pub alg: String,
}

/// OTP (or other token) collected from the card holder after a charge
/// came back pending.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidateChargeRequest {
    /// `flwRef` of the pending charge.
    pub transaction_reference: String,
    pub otp: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ValidateChargeRequest {
    pub fn new(transaction_reference: impl Into<String>, otp: impl Into<String>) -> Self {
        Self {
            transaction_reference: transaction_reference.into(),
            otp: otp.into(),
            extra: Map::new(),
        }
    }

    pub fn check_required(&self) -> Result<(), RaveError> {
        if is_blank(Some(&self.transaction_reference)) {
            return Err(RaveError::missing("transaction_reference"));
        }
        if is_blank(Some(&self.otp)) {
            return Err(RaveError::missing("otp"));
        }
        Ok(())
    }
}

/// `/validatecharge` body.
#[derive(Serialize)]
pub(crate) struct ValidateCardPayload<'a> {
    #[serde(rename = "PBFPubKey")]
    pub public_key: &'a str,
    pub transaction_reference: &'a str,
    pub otp: &'a str,
    #[serde(flatten)]
    pub extra: &'a Map<String, Value>,
}

/// `/validate` body. The legacy endpoint spells the reference without an underscore.
#[derive(Serialize)]
pub(crate) struct ValidateLegacyPayload<'a> {
    #[serde(rename = "PBFPubKey")]
    pub public_key: &'a str,
    #[serde(rename = "transactionreference")]
    pub transaction_reference: &'a str,
    pub otp: &'a str,
    #[serde(flatten)]
    pub extra: &'a Map<String, Value>,
}

/// Requery parameters for a transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerifyRequest {
    pub flw_ref: String,
    pub currency: String,
    pub amount: f64,
}

impl VerifyRequest {
    pub fn new(flw_ref: impl Into<String>, currency: impl Into<String>, amount: f64) -> Self {
        Self {
            flw_ref: flw_ref.into(),
            currency: currency.into(),
            amount,
        }
    }

    pub fn check_required(&self) -> Result<(), RaveError> {
        if is_blank(Some(&self.flw_ref)) {
            return Err(RaveError::missing("flw_ref"));
        }
        if is_blank(Some(&self.currency)) {
            return Err(RaveError::missing("currency"));
        }
        if !self.amount.is_finite() || self.amount <= 0.0 {
            return Err(RaveError::missing("amount"));
        }
        Ok(())
    }
}

/// `/verify` body. Carries the secret key, never the public one.
#[derive(Serialize)]
pub(crate) struct VerifyPayload<'a> {
    #[serde(rename = "SECKEY")]
    pub secret_key: &'a str,
    #[serde(flatten)]
    pub request: &'a VerifyRequest,
}

/// Second factor the gateway asks for after the first charge submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AuthChallenge {
    None,
    Pin,
    Otp,
    Avs,
    Redirect,
}

impl AuthChallenge {
    /// Map a `suggested_auth` value onto a challenge.
    pub fn from_suggestion(value: &str) -> Self {
        let value = value.trim().to_ascii_uppercase();
        match value.as_str() {
            "" => AuthChallenge::None,
            PIN_AUTH => AuthChallenge::Pin,
            "OTP" => AuthChallenge::Otp,
            "REDIRECT" | "VBVSECURECODE" | "3DS" => AuthChallenge::Redirect,
            v if v.contains("AVS") || v == "NOAUTH_INTERNATIONAL" => AuthChallenge::Avs,
            other => {
                tracing::warn!(suggested_auth = other, "unknown suggested auth, ignoring");
                AuthChallenge::None
            }
        }
    }
}

fn is_blank(value: Option<&str>) -> bool {
    value.map_or(true, |v| v.trim().is_empty())
}
