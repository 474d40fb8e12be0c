//! Normalizes gateway responses into a single [`Outcome`].
//!
//! The gateway has shipped several body shapes over time. Classification only
//! relies on the top-level `status`, the nested response code (spelled
//! `responsecode` or `responseCode`) and the nested message, so every shape
//! reduces to the same verdict.

use serde::Serialize;
use serde_json::Value;

use crate::constants::{SUCCESS_CODES, VALIDATION_REQUIRED_CODE};
use crate::error::RaveError;
use crate::payload::AuthChallenge;

/// Status code and undecoded body of one HTTP round trip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

impl RawResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }
}

/// Version-independent result of a gateway call.
///
/// `is_successful` and `requires_validation` are both true only for response
/// code `"02"`: the charge went through but still needs an OTP.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Outcome {
    pub status_code: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_message: Option<String>,
    /// Full decoded body. `None` for 5xx responses.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_data: Option<Value>,
    pub is_successful: bool,
    pub requires_validation: bool,
}

impl Outcome {
    fn server_error(status_code: u16) -> Self {
        Self {
            status_code,
            response_code: None,
            response_message: None,
            response_data: None,
            is_successful: false,
            requires_validation: false,
        }
    }

    /// The nested `data` object, if the body has one.
    pub fn data(&self) -> Option<&Value> {
        self.response_data
            .as_ref()
            .and_then(|body| body.get("data"))
            .filter(|data| data.is_object())
    }

    /// Second factor the gateway is asking for, if any.
    ///
    /// Reads `suggested_auth` from `data` (or the doubly nested `data.data`
    /// some deployments return), then falls back to a non-placeholder
    /// `authurl`, which means the card holder must be redirected.
    pub fn suggested_auth(&self) -> AuthChallenge {
        let Some(data) = self.data() else {
            return AuthChallenge::None;
        };

        let suggestion = data
            .get("suggested_auth")
            .or_else(|| data.get("data").and_then(|inner| inner.get("suggested_auth")))
            .and_then(Value::as_str);
        if let Some(s) = suggestion {
            let challenge = AuthChallenge::from_suggestion(s);
            if challenge != AuthChallenge::None {
                return challenge;
            }
        }

        match data.get("authurl").and_then(Value::as_str) {
            Some(url) if is_redirect_url(url) => AuthChallenge::Redirect,
            _ => AuthChallenge::None,
        }
    }

    /// Read a string field from `data`.
    pub fn data_str(&self, key: &str) -> Option<&str> {
        self.data().and_then(|d| d.get(key)).and_then(Value::as_str)
    }

    /// Gateway reference of the charge, used when validating an OTP.
    pub fn flw_ref(&self) -> Option<&str> {
        self.data_str("flwRef").or_else(|| self.data_str("flw_ref"))
    }

    /// Convert an unsuccessful outcome into [`RaveError::Gateway`].
    pub fn into_result(self) -> Result<Outcome, RaveError> {
        if self.is_successful {
            Ok(self)
        } else {
            Err(RaveError::Gateway {
                code: self.response_code,
                message: self.response_message,
            })
        }
    }
}

fn is_redirect_url(url: &str) -> bool {
    let url = url.trim();
    !url.is_empty() && !url.eq_ignore_ascii_case("N/A")
}

/// Classify a raw response body.
///
/// A 5xx status yields a failed outcome without touching the body. Below 500
/// the body must be a JSON object, otherwise this is a
/// [`RaveError::MalformedResponse`].
pub fn classify(body: &str, status_code: u16) -> Result<Outcome, RaveError> {
    if status_code >= 500 {
        return Ok(Outcome::server_error(status_code));
    }

    let parsed: Value = serde_json::from_str(body)
        .map_err(|e| RaveError::MalformedResponse(format!("invalid JSON body: {e}")))?;
    if !parsed.is_object() {
        return Err(RaveError::MalformedResponse(
            "response body is not a JSON object".to_string(),
        ));
    }

    let data = parsed.get("data").filter(|d| d.is_object());
    let response_code = data.and_then(|d| field(d, &["responsecode", "responseCode"]));
    let response_message = data
        .and_then(|d| field(d, &["responsemessage", "responseMessage"]))
        .or_else(|| parsed.get("message").and_then(text));

    let requires_validation = response_code.as_deref() == Some(VALIDATION_REQUIRED_CODE);
    let is_successful = parsed.get("status").and_then(Value::as_str) == Some("success")
        && status_code == 200
        && response_code
            .as_deref()
            .is_some_and(|code| SUCCESS_CODES.contains(&code));

    Ok(Outcome {
        status_code,
        response_code,
        response_message,
        response_data: Some(parsed),
        is_successful,
        requires_validation,
    })
}

/// Classify, then turn a 5xx into [`RaveError::Server`].
pub(crate) fn interpret(raw: &RawResponse) -> Result<Outcome, RaveError> {
    let outcome = classify(&raw.body, raw.status)?;
    if outcome.status_code >= 500 {
        return Err(RaveError::Server {
            status: outcome.status_code,
        });
    }
    Ok(outcome)
}

/// First non-empty value among `keys`, accepting strings or numbers.
fn field(obj: &Value, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|k| obj.get(*k))
        .filter_map(text)
        .find(|s| !s.is_empty())
}

fn text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
