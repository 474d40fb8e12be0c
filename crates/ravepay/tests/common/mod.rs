#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Mutex;

use ravepay::{
    ChargeRequest, Environment, RaveClient, RaveConfig, RaveError, RawResponse, Submitter,
};
use serde_json::Value;

pub const PUBLIC_KEY: &str = "FLWPUBK-e634d14d9ded04eaf05d5b63a0a06d2f-X";
pub const SECRET_KEY: &str = "FLWSECK-bb971402072265fb156e90a3578fe5e6-X";

/// Replays canned responses in order and records every submission.
#[derive(Default)]
pub struct ScriptedSubmitter {
    responses: Mutex<VecDeque<RawResponse>>,
    calls: Mutex<Vec<(String, Value)>>,
}

impl ScriptedSubmitter {
    pub fn new(responses: Vec<(u16, Value)>) -> Self {
        Self {
            responses: Mutex::new(
                responses
                    .into_iter()
                    .map(|(status, body)| RawResponse::new(status, body.to_string()))
                    .collect(),
            ),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn with_raw(responses: Vec<RawResponse>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<(String, Value)> {
        self.calls.lock().unwrap().clone()
    }
}

impl Submitter for ScriptedSubmitter {
    async fn submit(&self, path: &str, body: &Value) -> Result<RawResponse, RaveError> {
        self.calls
            .lock()
            .unwrap()
            .push((path.to_string(), body.clone()));
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| RaveError::Network("connection reset".to_string()))
    }
}

pub fn config() -> RaveConfig {
    RaveConfig::new(PUBLIC_KEY, SECRET_KEY, Environment::Staging)
}

pub fn client<S: Submitter>(submitter: S) -> RaveClient<S> {
    RaveClient::with_submitter(config(), submitter).unwrap()
}

pub fn card_request() -> ChargeRequest {
    ChargeRequest {
        cardno: "5438898014560229".to_string(),
        cvv: "789".to_string(),
        expirymonth: "09".to_string(),
        expiryyear: "19".to_string(),
        amount: "300".to_string(),
        currency: "NGN".to_string(),
        email: "tester@flutter.co".to_string(),
        tx_ref: Some("MXX-ASC-4578".to_string()),
        redirect_url: Some("https://merchant.example/callback".to_string()),
        ..Default::default()
    }
}

/// Decrypt the `client` field of a recorded `/charge` body.
pub fn decrypt_client<S: Submitter>(client: &RaveClient<S>, body: &Value) -> Value {
    let ciphertext = body["client"].as_str().expect("client field");
    let plain = client.cipher().decrypt(ciphertext).expect("decrypt");
    serde_json::from_str(&plain).expect("plaintext is JSON")
}
