mod common;

use common::{client, ScriptedSubmitter, SECRET_KEY};
use ravepay::constants::VERIFY_PATH;
use ravepay::{RaveError, VerifyRequest};
use serde_json::json;

#[tokio::test]
async fn test_verify_nested_layout() {
    let c = client(ScriptedSubmitter::new(vec![(
        200,
        json!({
            "status": "success",
            "message": "Tx Fetched",
            "data": {
                "flw_ref": "FLW-MOCK-9a1b",
                "flwMeta": {"chargecode": "00", "chargemessage": "Approved"},
                "transaction_currency": "NGN",
                "charged_amount": 300
            }
        }),
    )]));
    let request = VerifyRequest::new("FLW-MOCK-9a1b", "NGN", 300.0);

    let result = c.verify_transaction(&request).await.unwrap();
    assert_eq!(result.transaction_ref.as_deref(), Some("FLW-MOCK-9a1b"));
    assert_eq!(result.charge_code, "00");
    assert_eq!(result.currency_code, "NGN");
    assert_eq!(result.charged_amount, 300.0);
    assert!(result.confirms(&request));

    let calls = c.submitter().calls();
    assert_eq!(calls.len(), 1);
    let (path, body) = &calls[0];
    assert_eq!(path, VERIFY_PATH);
    assert_eq!(body["SECKEY"], SECRET_KEY);
    assert_eq!(body["flw_ref"], "FLW-MOCK-9a1b");
    assert_eq!(body["currency"], "NGN");
    assert!(body.get("PBFPubKey").is_none());
}

#[tokio::test]
async fn test_verify_flat_layout_with_legacy_reference() {
    let c = client(ScriptedSubmitter::new(vec![(
        200,
        json!({
            "status": "success",
            "data": {
                "flwref": "FLW-LEGACY-77",
                "chargecode": "0",
                "currency": "NGN",
                "chargedamount": "300"
            }
        }),
    )]));

    let result = c
        .verify_transaction(&VerifyRequest::new("FLW-LEGACY-77", "NGN", 300.0))
        .await
        .unwrap();
    assert_eq!(result.transaction_ref.as_deref(), Some("FLW-LEGACY-77"));
    assert_eq!(result.charge_code, "0");
    assert_eq!(result.charged_amount, 300.0);
}

#[tokio::test]
async fn test_verify_falls_back_to_requested_reference() {
    let c = client(ScriptedSubmitter::new(vec![(
        200,
        json!({"status":"success","data":{"chargecode":"00","currency":"NGN","chargedamount":500}}),
    )]));

    let result = c
        .verify_transaction(&VerifyRequest::new("FLW-ASKED-1", "NGN", 500.0))
        .await
        .unwrap();
    assert_eq!(result.transaction_ref.as_deref(), Some("FLW-ASKED-1"));
}

#[tokio::test]
async fn test_verify_error_status_is_gateway_error() {
    let c = client(ScriptedSubmitter::new(vec![(
        400,
        json!({"status":"error","message":"No transaction found","data":null}),
    )]));

    let err = c
        .verify_transaction(&VerifyRequest::new("FLW-NOPE", "NGN", 500.0))
        .await
        .unwrap_err();
    match err {
        RaveError::Gateway { message, .. } => {
            assert_eq!(message.as_deref(), Some("No transaction found"))
        }
        other => panic!("expected gateway error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_verify_required_fields_checked_before_sending() {
    let c = client(ScriptedSubmitter::new(vec![]));

    for request in [
        VerifyRequest::new("", "NGN", 500.0),
        VerifyRequest::new("FLW-1", " ", 500.0),
        VerifyRequest::new("FLW-1", "NGN", f64::NAN),
    ] {
        let err = c.verify_transaction(&request).await.unwrap_err();
        assert!(matches!(err, RaveError::Validation(_)));
    }
    assert!(c.submitter().calls().is_empty());
}

#[tokio::test]
async fn test_verify_server_error() {
    let c = client(ScriptedSubmitter::with_raw(vec![ravepay::RawResponse::new(
        500,
        "Internal Server Error",
    )]));

    let err = c
        .verify_transaction(&VerifyRequest::new("FLW-1", "NGN", 500.0))
        .await
        .unwrap_err();
    assert!(matches!(err, RaveError::Server { status: 500 }));
}
