use std::sync::Arc;
use std::time::Duration;
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, RequestBuilder, Response, StatusCode, Url};
use tracing::debug;

use crate::config::TelemetryConfig;
use crate::kernel::telemetry::event::{BatchPayload, IngestResponse};
use super::identity::IdentityProvider;
use super::{SendOutcome, Transport, TransportError};

/// JSON-over-HTTP ingestion client.
///
/// Teardown sends go out through the same client with the authorization
/// header intact and a short per-request deadline. There is no native
/// equivalent of a header-less unload beacon, so the teardown path waits for
/// this one bounded attempt before the process goes away.
#[derive(Clone)]
pub struct HttpTransport {
    client: Client,
    endpoint: Url,
    identity: Arc<dyn IdentityProvider>,
    teardown_timeout: Duration,
}

impl HttpTransport {
    pub fn new(config: &TelemetryConfig, identity: Arc<dyn IdentityProvider>) -> Result<Self, TransportError> {
        let endpoint = Url::parse(&config.ingest_url)
            .map_err(|e| TransportError::InvalidUrl(format!("{}: {}", config.ingest_url, e)))?;

        let client = Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .build()?;

        Ok(Self {
            client,
            endpoint,
            identity,
            teardown_timeout: Duration::from_millis(config.teardown_timeout_ms),
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    fn request(&self, payload: &BatchPayload) -> Result<RequestBuilder, TransportError> {
        let body = serde_json::to_vec(payload)?;
        let request = self.client
            .post(self.endpoint.clone())
            .header(CONTENT_TYPE, "application/json")
            .body(body);
        Ok(match self.identity.current() {
            Some(identity) => request.bearer_auth(identity.credential),
            None => request,
        })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, payload: &BatchPayload) -> SendOutcome {
        let request = match self.request(payload) {
            Ok(request) => request,
            Err(e) => return SendOutcome::ClientError(e.to_string()),
        };
        match request.send().await {
            Ok(response) => classify(response, payload.events.len()).await,
            Err(e) if e.is_timeout() => SendOutcome::Transient(format!("timed out: {}", e)),
            Err(e) => SendOutcome::Transient(e.to_string()),
        }
    }

    async fn send_reliable(&self, payload: &BatchPayload) -> Result<(), TransportError> {
        let response = self.request(payload)?
            .timeout(self.teardown_timeout)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    TransportError::Timeout(self.teardown_timeout)
                } else {
                    TransportError::Http(e)
                }
            })?;

        if !response.status().is_success() {
            return Err(TransportError::Status(response.status().as_u16()));
        }
        Ok(())
    }
}

async fn classify(response: Response, sent: usize) -> SendOutcome {
    let status = response.status();

    if status.is_success() {
        return match response.json::<IngestResponse>().await {
            Ok(body) => SendOutcome::Accepted(body.count),
            Err(e) => {
                debug!("unreadable ingestion response, assuming full batch stored: {}", e);
                SendOutcome::Accepted(sent)
            }
        };
    }

    if is_retryable(status) {
        return SendOutcome::Transient(format!("ingestion answered {}", status));
    }

    let details = response.text().await.unwrap_or_default();
    SendOutcome::ClientError(format!("{}: {}", status, details))
}

fn is_retryable(status: StatusCode) -> bool {
    !status.is_client_error()
        || status == StatusCode::REQUEST_TIMEOUT
        || status == StatusCode::TOO_MANY_REQUESTS
}
