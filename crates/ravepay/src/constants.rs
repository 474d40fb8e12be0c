use std::time::Duration;

/// Sandbox host used for `staging`, `test` and any unrecognised environment.
pub const STAGING_URL: &str = "https://ravesandboxapi.flutterwave.com";

/// Live host.
pub const PRODUCTION_URL: &str = "https://api.ravepay.co";

/// Card charge endpoint.
pub const CHARGE_PATH: &str = "/flwv3-pug/getpaidx/api/charge";

/// Legacy OTP validation endpoint.
pub const VALIDATE_PATH: &str = "/flwv3-pug/getpaidx/api/validate";

/// OTP validation endpoint for card charges.
pub const VALIDATE_CHARGE_PATH: &str = "/flwv3-pug/getpaidx/api/validatecharge";

/// Transaction requery endpoint.
pub const VERIFY_PATH: &str = "/flwv3-pug/getpaidx/api/verify";

/// Envelope `alg` value. Tells the gateway which key schedule to decrypt with.
pub const ALGORITHM_TAG: &str = "3DES-24";

/// Prefix stripped from the secret key before taking its first 12 characters.
pub const SECRET_KEY_PREFIX: &str = "FLWSECK-";

/// `suggested_auth` value sent when resubmitting a charge with its PIN.
pub const PIN_AUTH: &str = "PIN";

/// Response code meaning "accepted, but an OTP step is still pending".
pub const VALIDATION_REQUIRED_CODE: &str = "02";

/// Response codes the gateway uses for a successful charge.
pub const SUCCESS_CODES: [&str; 3] = ["00", "0", VALIDATION_REQUIRED_CODE];

/// Request timeout when none is configured.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// JSON content type the gateway expects on every POST.
pub const CONTENT_TYPE: &str = "application/json;charset=UTF-8";
