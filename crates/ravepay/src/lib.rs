//! Client for the Rave card charge API.
//!
//! Card details are encrypted with a triple-DES key derived from the merchant
//! secret key and posted to `/charge`. The gateway may then ask for a second
//! factor: a PIN is answered automatically (once), while OTP, address
//! verification and redirect challenges are handed back to the caller.
//!
//! # Flow
//!
//! 1. [`RaveClient::charge_card`] returns a [`ChargeResult`]
//! 2. On [`ChargeResult::PendingAuth`], collect the OTP and call
//!    [`RaveClient::validate_card_charge`]
//! 3. Confirm settlement server-side with [`RaveClient::verify_transaction`]
//!
//! # Quick example
//!
//! ```no_run
//! use ravepay::{ChargeRequest, ChargeResult, Environment, RaveClient, RaveConfig};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), ravepay::RaveError> {
//! let config = RaveConfig::new("FLWPUBK-xxxx-X", "FLWSECK-xxxxxxxxxxxxxxxx-X", Environment::Staging);
//! let client = RaveClient::new(config)?;
//!
//! let request = ChargeRequest {
//!     cardno: "5438898014560229".into(),
//!     cvv: "789".into(),
//!     expirymonth: "09".into(),
//!     expiryyear: "19".into(),
//!     amount: "100".into(),
//!     currency: "NGN".into(),
//!     email: "user@example.com".into(),
//!     redirect_url: Some("https://merchant.example/callback".into()),
//!     pin: Some("3310".into()),
//!     ..Default::default()
//! };
//!
//! match client.charge_card(&request).await? {
//!     ChargeResult::Success(outcome) => println!("charged: {:?}", outcome.response_message),
//!     ChargeResult::PendingAuth { challenge, .. } => println!("need {challenge:?}"),
//!     ChargeResult::Failed(outcome) => println!("declined: {:?}", outcome.response_message),
//! }
//! # Ok(())
//! # }
//! ```

pub mod cipher;
pub mod config;
pub mod constants;
pub mod error;
pub mod payload;
pub mod response;
pub mod submitter;

pub mod card;
pub mod client;
pub mod verify;

pub use card::ChargeResult;
pub use cipher::{derive_key, CipherKey, TransactionCipher};
pub use client::RaveClient;
pub use config::{ConfigError, Credentials, Environment, RaveConfig, WireEncoding};
pub use error::RaveError;
pub use payload::{
    AuthChallenge, ChargeRequest, EncryptedEnvelope, ValidateChargeRequest, VerifyRequest,
};
pub use response::{classify, Outcome, RawResponse};
pub use submitter::Submitter;
pub use verify::VerificationResult;

#[cfg(feature = "full")]
pub use submitter::HttpSubmitter;
