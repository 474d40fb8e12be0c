use std::env;
use std::fmt;
use std::time::Duration;

use url::Url;

use crate::constants::{DEFAULT_TIMEOUT, PRODUCTION_URL, STAGING_URL};

/// Deployment the client talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Environment {
    #[default]
    Staging,
    Production,
}

impl Environment {
    /// Parse an environment name. Unknown names fall back to staging so a typo
    /// never routes live card data.
    pub fn parse(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "production" => Environment::Production,
            "staging" | "test" => Environment::Staging,
            other => {
                tracing::warn!(environment = other, "unrecognised environment, using staging");
                Environment::Staging
            }
        }
    }

    pub fn base_url(self) -> &'static str {
        match self {
            Environment::Staging => STAGING_URL,
            Environment::Production => PRODUCTION_URL,
        }
    }
}

/// Text encoding of the cipher output on the wire.
///
/// Base64 is what the gateway expects today. Hex is kept for peers that still
/// speak the older format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WireEncoding {
    #[default]
    Base64,
    Hex,
}

impl WireEncoding {
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "base64" => Some(WireEncoding::Base64),
            "hex" => Some(WireEncoding::Hex),
            _ => None,
        }
    }
}

/// Merchant key pair. Immutable once built.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    public_key: String,
    secret_key: String,
}

impl Credentials {
    pub fn new(public_key: impl Into<String>, secret_key: impl Into<String>) -> Self {
        Self {
            public_key: public_key.into(),
            secret_key: secret_key.into(),
        }
    }

    pub fn public_key(&self) -> &str {
        &self.public_key
    }

    pub fn secret_key(&self) -> &str {
        &self.secret_key
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("public_key", &self.public_key)
            .field("secret_key", &"[REDACTED]")
            .finish()
    }
}

/// Client configuration. Built once and only read afterwards.
#[derive(Clone)]
pub struct RaveConfig {
    pub credentials: Credentials,
    pub environment: Environment,
    /// Overrides the environment's host when set.
    pub base_url: Option<String>,
    /// Upper bound on every network round trip.
    pub timeout: Duration,
    pub encoding: WireEncoding,
}

impl fmt::Debug for RaveConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RaveConfig")
            .field("credentials", &self.credentials)
            .field("environment", &self.environment)
            .field("base_url", &self.base_url())
            .field("timeout", &self.timeout)
            .field("encoding", &self.encoding)
            .finish()
    }
}

impl RaveConfig {
    pub fn new(
        public_key: impl Into<String>,
        secret_key: impl Into<String>,
        environment: Environment,
    ) -> Self {
        Self {
            credentials: Credentials::new(public_key, secret_key),
            environment,
            base_url: None,
            timeout: DEFAULT_TIMEOUT,
            encoding: WireEncoding::default(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_encoding(mut self, encoding: WireEncoding) -> Self {
        self.encoding = encoding;
        self
    }

    /// Host every endpoint path is appended to.
    pub fn base_url(&self) -> &str {
        self.base_url
            .as_deref()
            .unwrap_or_else(|| self.environment.base_url())
            .trim_end_matches('/')
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        let public_key = env::var("RAVE_PUBLIC_KEY")
            .ok()
            .filter(|s| !s.is_empty())
            .ok_or(ConfigError::MissingRequired("RAVE_PUBLIC_KEY"))?;
        let secret_key = env::var("RAVE_SECRET_KEY")
            .ok()
            .filter(|s| !s.is_empty())
            .ok_or(ConfigError::MissingRequired("RAVE_SECRET_KEY"))?;

        let environment = env::var("RAVE_ENV")
            .map(|s| Environment::parse(&s))
            .unwrap_or_default();

        let mut config = Self::new(public_key, secret_key, environment);

        if let Some(base_url) = env::var("RAVE_BASE_URL").ok().filter(|s| !s.is_empty()) {
            Url::parse(&base_url).map_err(|_| ConfigError::InvalidUrl(base_url.clone()))?;
            config = config.with_base_url(base_url);
        }

        if let Ok(secs) = env::var("RAVE_TIMEOUT_SECS") {
            config = config.with_timeout(parse_timeout_secs(&secs)?);
        }

        if let Ok(name) = env::var("RAVE_WIRE_ENCODING") {
            let encoding =
                WireEncoding::parse(&name).ok_or(ConfigError::InvalidEncoding(name))?;
            config = config.with_encoding(encoding);
        }

        if config.environment == Environment::Production && config.base_url.is_some() {
            tracing::warn!(
                base_url = config.base_url(),
                "RAVE_BASE_URL overrides the production host"
            );
        }

        Ok(config)
    }
}

/// Whole seconds, at least one. A zero timeout would fail every call.
fn parse_timeout_secs(raw: &str) -> Result<Duration, ConfigError> {
    match raw.trim().parse::<u64>() {
        Ok(secs) if secs > 0 => Ok(Duration::from_secs(secs)),
        _ => Err(ConfigError::InvalidTimeout(raw.to_string())),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingRequired(&'static str),

    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    #[error("invalid timeout: {0}")]
    InvalidTimeout(String),

    #[error("invalid wire encoding: {0} (expected base64 or hex)")]
    InvalidEncoding(String),
}
