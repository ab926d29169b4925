//! Outbound exchanges over HTTP.

use async_trait::async_trait;
use mesh_core::transport::Result;
use mesh_core::{
    ExchangeTransport, PeerRecord, RegistrySnapshot, Signature, TransportError, EXCHANGE_PATH,
    SIGNATURE_HEADER,
};
use std::time::Duration;
use tracing::debug;

/// reqwest-backed `ExchangeTransport`.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    timeout: Duration,
}

impl HttpTransport {
    pub fn new(timeout: Duration) -> Self {
        Self {
            client: reqwest::Client::new(),
            timeout,
        }
    }
}

#[async_trait]
impl ExchangeTransport for HttpTransport {
    async fn exchange(
        &self,
        address: &str,
        signature: &Signature,
        identity: &PeerRecord,
    ) -> Result<RegistrySnapshot> {
        let url = exchange_url(address);
        debug!("POST {}", url);

        let response = self
            .client
            .post(&url)
            .header(SIGNATURE_HEADER, signature.as_str())
            .json(identity)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(classify)?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Status(status.as_u16()));
        }

        response
            .json::<RegistrySnapshot>()
            .await
            .map_err(|e| TransportError::MalformedBody(e.to_string()))
    }
}

fn classify(e: reqwest::Error) -> TransportError {
    if e.is_timeout() {
        TransportError::Timeout
    } else if e.is_connect() {
        TransportError::ConnectionFailed(e.to_string())
    } else {
        TransportError::Other(e.to_string())
    }
}

/// `<address>/exchange`, assuming `http://` when the address has no scheme.
pub fn exchange_url(address: &str) -> String {
    let base = address.trim_end_matches('/');
    if base.contains("://") {
        format!("{}{}", base, EXCHANGE_PATH)
    } else {
        format!("http://{}{}", base, EXCHANGE_PATH)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exchange_url_with_scheme() {
        assert_eq!(
            exchange_url("https://b.example:2000"),
            "https://b.example:2000/exchange"
        );
    }

    #[test]
    fn test_exchange_url_without_scheme() {
        assert_eq!(exchange_url("b:2000"), "http://b:2000/exchange");
    }

    #[test]
    fn test_exchange_url_trailing_slash() {
        assert_eq!(exchange_url("http://b:2000/"), "http://b:2000/exchange");
    }
}
