//! The one transport primitive every endpoint goes through.

use std::future::Future;

use serde_json::Value;

use crate::error::RaveError;
use crate::response::RawResponse;

/// Posts a JSON body to a gateway path and hands back the raw response.
///
/// Implementations must not keep per-request state between calls; the
/// charge flow may call `submit` from many tasks at once.
pub trait Submitter: Send + Sync {
    fn submit(
        &self,
        path: &str,
        body: &Value,
    ) -> impl Future<Output = Result<RawResponse, RaveError>> + Send;
}

#[cfg(feature = "full")]
pub use http::HttpSubmitter;

#[cfg(feature = "full")]
mod http {
    use std::time::Duration;

    use serde_json::Value;

    use super::Submitter;
    use crate::config::RaveConfig;
    use crate::constants::CONTENT_TYPE;
    use crate::error::RaveError;
    use crate::response::RawResponse;

    /// [`Submitter`] over `reqwest`. Cheap to clone; clones share the
    /// connection pool.
    #[derive(Debug, Clone)]
    pub struct HttpSubmitter {
        http: reqwest::Client,
        base_url: String,
        timeout: Duration,
    }

    impl HttpSubmitter {
        pub fn new(config: &RaveConfig) -> Result<Self, RaveError> {
            let http = reqwest::Client::builder()
                .timeout(config.timeout)
                .build()
                .map_err(|e| RaveError::Network(format!("failed to build HTTP client: {e}")))?;
            Ok(Self::with_http_client(http, config))
        }

        /// Use a caller-built `reqwest::Client`. The configured timeout is
        /// still applied per request.
        pub fn with_http_client(http: reqwest::Client, config: &RaveConfig) -> Self {
            Self {
                http,
                base_url: config.base_url().to_string(),
                timeout: config.timeout,
            }
        }

        pub fn base_url(&self) -> &str {
            &self.base_url
        }
    }

    impl Submitter for HttpSubmitter {
        async fn submit(&self, path: &str, body: &Value) -> Result<RawResponse, RaveError> {
            let url = format!("{}{}", self.base_url, path);
            let body_bytes = serde_json::to_vec(body)?;

            let resp = self
                .http
                .post(&url)
                .header(reqwest::header::CONTENT_TYPE, CONTENT_TYPE)
                .timeout(self.timeout)
                .body(body_bytes)
                .send()
                .await
                .map_err(|e| {
                    if e.is_timeout() {
                        RaveError::Network(format!("request to {path} timed out"))
                    } else {
                        RaveError::Network(format!("request to {path} failed: {e}"))
                    }
                })?;

            let status = resp.status().as_u16();
            let body = resp
                .text()
                .await
                .map_err(|e| RaveError::Network(format!("failed to read response body: {e}")))?;

            tracing::debug!(path, status, "gateway responded");
            Ok(RawResponse { status, body })
        }
    }

    #[cfg(test)]
    mod tests {
        use std::time::Instant;

        use tokio::io::{AsyncReadExt, AsyncWriteExt};
        use tokio::net::TcpListener;

        use super::*;
        use crate::config::Environment;
        use crate::constants::CHARGE_PATH;

        #[test]
        fn test_base_url_follows_config() {
            let config = RaveConfig::new("pk", "sk", Environment::Production);
            let submitter = HttpSubmitter::new(&config).unwrap();
            assert_eq!(submitter.base_url(), crate::constants::PRODUCTION_URL);

            let config = RaveConfig::new("pk", "sk", Environment::parse("qa"));
            let submitter = HttpSubmitter::new(&config).unwrap();
            assert_eq!(submitter.base_url(), crate::constants::STAGING_URL);
        }

        #[tokio::test]
        async fn test_unreachable_host_is_network_error() {
            let config = RaveConfig::new("pk", "sk", Environment::Staging)
                .with_base_url("http://127.0.0.1:1")
                .with_timeout(Duration::from_secs(2));
            let submitter = HttpSubmitter::new(&config).unwrap();
            let err = submitter
                .submit("/charge", &serde_json::json!({}))
                .await
                .unwrap_err();
            assert!(matches!(err, RaveError::Network(_)));
        }

        #[tokio::test]
        async fn test_silent_gateway_times_out_as_network_error() {
            let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
            let addr = listener.local_addr().unwrap();
            tokio::spawn(async move {
                // accept and never answer
                let (_socket, _) = listener.accept().await.unwrap();
                tokio::time::sleep(Duration::from_secs(30)).await;
            });

            let config = RaveConfig::new("pk", "sk", Environment::Staging)
                .with_base_url(format!("http://{addr}"))
                .with_timeout(Duration::from_millis(300));
            let submitter = HttpSubmitter::new(&config).unwrap();

            let started = Instant::now();
            let err = submitter
                .submit("/charge", &serde_json::json!({}))
                .await
                .unwrap_err();
            let elapsed = started.elapsed();

            match err {
                RaveError::Network(msg) => assert!(msg.contains("timed out"), "{msg}"),
                other => panic!("expected network error, got {other:?}"),
            }
            assert!(elapsed >= Duration::from_millis(250), "{elapsed:?}");
            assert!(elapsed < Duration::from_secs(5), "{elapsed:?}");
        }

        #[tokio::test]
        async fn test_request_is_json_post_to_joined_url() {
            let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
            let addr = listener.local_addr().unwrap();
            let (tx, rx) = tokio::sync::oneshot::channel::<String>();
            tokio::spawn(async move {
                let (mut socket, _) = listener.accept().await.unwrap();
                let mut raw = Vec::new();
                let mut buf = [0u8; 1024];
                while !raw.windows(4).any(|w| w == b"\r\n\r\n") {
                    let n = socket.read(&mut buf).await.unwrap();
                    if n == 0 {
                        break;
                    }
                    raw.extend_from_slice(&buf[..n]);
                }
                socket
                    .write_all(
                        b"HTTP/1.1 200 OK\r\ncontent-length: 2\r\nconnection: close\r\n\r\n{}",
                    )
                    .await
                    .unwrap();
                let _ = tx.send(String::from_utf8_lossy(&raw).into_owned());
                // keep the socket open until the client has read the reply
                tokio::time::sleep(Duration::from_secs(1)).await;
            });

            // trailing slash on the base URL must not double up
            let config = RaveConfig::new("pk", "sk", Environment::Staging)
                .with_base_url(format!("http://{addr}/"));
            let submitter = HttpSubmitter::new(&config).unwrap();

            let resp = submitter
                .submit(CHARGE_PATH, &serde_json::json!({"PBFPubKey": "pk"}))
                .await
                .unwrap();
            assert_eq!(resp.status, 200);
            assert_eq!(resp.body, "{}");

            let head = rx.await.unwrap();
            let request_line = head.lines().next().unwrap_or_default();
            assert_eq!(request_line, format!("POST {CHARGE_PATH} HTTP/1.1"));
            assert!(
                head.to_ascii_lowercase()
                    .contains(&format!("content-type: {}", CONTENT_TYPE.to_ascii_lowercase())),
                "{head}"
            );
        }
    }
}
