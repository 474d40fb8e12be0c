//! Transaction requery.
//!
//! Two response layouts exist. The nested one is recognised by its `flwMeta`
//! object and carries `flwMeta.chargecode`, `transaction_currency` and
//! `charged_amount`; the flat legacy one has `chargecode`, `currency` and
//! `chargedamount` side by side.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::client::RaveClient;
use crate::constants::VERIFY_PATH;
use crate::error::RaveError;
use crate::payload::{VerifyPayload, VerifyRequest};
use crate::submitter::Submitter;

/// Settled state of a transaction as reported by a requery.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationResult {
    pub transaction_ref: Option<String>,
    pub currency_code: String,
    pub charge_code: String,
    pub charged_amount: f64,
}

#[derive(Debug, Deserialize)]
struct NestedLayout {
    #[serde(rename = "flwMeta")]
    flw_meta: FlwMeta,
    transaction_currency: Option<String>,
    charged_amount: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct FlwMeta {
    chargecode: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct FlatLayout {
    chargecode: Option<Value>,
    currency: Option<String>,
    chargedamount: Option<Value>,
}

enum VerifyLayout {
    Nested(NestedLayout),
    Flat(FlatLayout),
}

impl VerifyLayout {
    fn detect(data: &Value) -> Result<Self, RaveError> {
        let has_meta = data.get("flwMeta").is_some_and(|m| !m.is_null());
        let layout = if has_meta {
            VerifyLayout::Nested(NestedLayout::deserialize(data).map_err(malformed)?)
        } else {
            VerifyLayout::Flat(FlatLayout::deserialize(data).map_err(malformed)?)
        };
        Ok(layout)
    }
}

impl VerificationResult {
    /// Reconcile a requery `data` object in either layout.
    pub fn reconcile(data: &Value) -> Result<Self, RaveError> {
        let (charge_code, currency, amount) = match VerifyLayout::detect(data)? {
            VerifyLayout::Nested(n) => (n.flw_meta.chargecode, n.transaction_currency, n.charged_amount),
            VerifyLayout::Flat(f) => (f.chargecode, f.currency, f.chargedamount),
        };

        let charge_code = charge_code
            .as_ref()
            .and_then(code_text)
            .ok_or_else(|| missing_field("chargecode"))?;
        let currency_code = currency
            .filter(|c| !c.is_empty())
            .ok_or_else(|| missing_field("currency"))?;
        let charged_amount = amount
            .as_ref()
            .and_then(amount_value)
            .ok_or_else(|| missing_field("charged amount"))?;

        let transaction_ref = ["flw_ref", "flwref"]
            .iter()
            .filter_map(|k| data.get(*k).and_then(Value::as_str))
            .find(|s| !s.is_empty())
            .map(str::to_string);

        Ok(Self {
            transaction_ref,
            currency_code,
            charge_code,
            charged_amount,
        })
    }

    /// True when the requery shows a successful charge in the expected
    /// currency for at least the expected amount.
    pub fn confirms(&self, request: &VerifyRequest) -> bool {
        matches!(self.charge_code.as_str(), "00" | "0")
            && self.currency_code.eq_ignore_ascii_case(&request.currency)
            && self.charged_amount >= request.amount
    }
}

impl<S: Submitter> RaveClient<S> {
    /// Requery a transaction with the secret key and reconcile its final state.
    pub async fn verify_transaction(
        &self,
        request: &VerifyRequest,
    ) -> Result<VerificationResult, RaveError> {
        request.check_required()?;
        let payload = VerifyPayload {
            secret_key: self.secret_key(),
            request,
        };
        let outcome = self.post(VERIFY_PATH, &payload).await?;

        let body = outcome.response_data.as_ref().ok_or_else(|| {
            RaveError::MalformedResponse("requery response has no body".to_string())
        })?;
        if body.get("status").and_then(Value::as_str) != Some("success") {
            return Err(RaveError::Gateway {
                code: outcome.response_code,
                message: outcome.response_message,
            });
        }

        let data = outcome.data().unwrap_or(body);
        let mut result = VerificationResult::reconcile(data)?;
        result
            .transaction_ref
            .get_or_insert_with(|| request.flw_ref.clone());

        tracing::info!(
            reference = result.transaction_ref.as_deref().unwrap_or("-"),
            charge_code = %result.charge_code,
            confirmed = result.confirms(request),
            "transaction verified"
        );
        Ok(result)
    }
}

fn malformed(e: serde_json::Error) -> RaveError {
    RaveError::MalformedResponse(format!("unexpected requery layout: {e}"))
}

fn missing_field(name: &str) -> RaveError {
    RaveError::MalformedResponse(format!("requery response has no {name}"))
}

fn code_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn amount_value(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_flat_layout() {
        let r = VerificationResult::reconcile(
            &json!({"chargecode":"00","currency":"NGN","chargedamount":500}),
        )
        .unwrap();
        assert_eq!(r.charge_code, "00");
        assert_eq!(r.currency_code, "NGN");
        assert_eq!(r.charged_amount, 500.0);
        assert!(r.transaction_ref.is_none());
    }

    #[test]
    fn test_nested_layout_matches_flat() {
        let flat = VerificationResult::reconcile(
            &json!({"chargecode":"00","currency":"NGN","chargedamount":500}),
        )
        .unwrap();
        let nested = VerificationResult::reconcile(&json!({
            "flwMeta": {"chargecode": "00"},
            "transaction_currency": "NGN",
            "charged_amount": 500
        }))
        .unwrap();
        assert_eq!(flat, nested);
    }

    #[test]
    fn test_nested_layout_preferred_when_marker_present() {
        let r = VerificationResult::reconcile(&json!({
            "flwMeta": {"chargecode": "00"},
            "chargecode": "RR",
            "currency": "USD",
            "transaction_currency": "NGN",
            "charged_amount": "750.50",
            "chargedamount": 1
        }))
        .unwrap();
        assert_eq!(r.charge_code, "00");
        assert_eq!(r.currency_code, "NGN");
        assert_eq!(r.charged_amount, 750.5);
    }

    #[test]
    fn test_reference_fallback() {
        let r = VerificationResult::reconcile(&json!({
            "flwref": "FLW-LEGACY-1",
            "chargecode": "00", "currency": "NGN", "chargedamount": 1
        }))
        .unwrap();
        assert_eq!(r.transaction_ref.as_deref(), Some("FLW-LEGACY-1"));

        let r = VerificationResult::reconcile(&json!({
            "flw_ref": "FLW-NEW-1", "flwref": "FLW-LEGACY-1",
            "chargecode": "00", "currency": "NGN", "chargedamount": 1
        }))
        .unwrap();
        assert_eq!(r.transaction_ref.as_deref(), Some("FLW-NEW-1"));
    }

    #[test]
    fn test_missing_fields_are_malformed() {
        let err = VerificationResult::reconcile(&json!({"currency":"NGN","chargedamount":1}))
            .unwrap_err();
        assert!(matches!(err, RaveError::MalformedResponse(_)));

        let err = VerificationResult::reconcile(&json!({"flwMeta": "oops"})).unwrap_err();
        assert!(matches!(err, RaveError::MalformedResponse(_)));
    }

    #[test]
    fn test_confirms() {
        let r = VerificationResult::reconcile(
            &json!({"chargecode":"00","currency":"NGN","chargedamount":500}),
        )
        .unwrap();
        assert!(r.confirms(&VerifyRequest::new("FLW-1", "ngn", 500.0)));
        assert!(!r.confirms(&VerifyRequest::new("FLW-1", "NGN", 600.0)));
        assert!(!r.confirms(&VerifyRequest::new("FLW-1", "USD", 500.0)));
    }
}
