//! Outbound HTTP for the authorization API and callback delivery.
//!
//! Timeouts and transport-level retries live here, at the call boundary.
//! Any HTTP answer, whatever its status, is handed back as an
//! [`UpstreamResponse`] so callers can tell a rejection from a network fault.

use crate::domain::callback::CallbackPayload;
use crate::domain::ports::{
    AuthorizationApi, AuthorizationRequest, CallbackSender, UpstreamResponse,
};
use crate::error::Result;
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;
use tracing::warn;

pub const CORRELATION_HEADER: &str = "X-Client-Correlation-ID";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HttpPolicy {
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    /// Extra attempts after a connection or timeout error.
    pub transport_retries: u32,
    pub retry_backoff: Duration,
}

impl Default for HttpPolicy {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(2),
            request_timeout: Duration::from_secs(10),
            transport_retries: 1,
            retry_backoff: Duration::from_millis(200),
        }
    }
}

#[derive(Clone)]
pub struct HttpTransport {
    client: Client,
    policy: HttpPolicy,
}

impl HttpTransport {
    pub fn new(policy: HttpPolicy) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(policy.connect_timeout)
            .timeout(policy.request_timeout)
            .build()?;
        Ok(Self { client, policy })
    }

    /// POSTs `body` as JSON, retrying only transport failures.
    pub async fn post_json<T>(
        &self,
        url: &str,
        headers: &[(&str, &str)],
        body: &T,
    ) -> Result<UpstreamResponse>
    where
        T: Serialize + ?Sized,
    {
        let mut attempt = 0;
        loop {
            let mut request = self.client.post(url).json(body);
            for (name, value) in headers {
                request = request.header(*name, *value);
            }

            match request.send().await {
                Ok(response) => {
                    let status = response.status().as_u16();
                    let body = response.text().await?;
                    return Ok(UpstreamResponse { status, body });
                }
                Err(e)
                    if (e.is_connect() || e.is_timeout())
                        && attempt < self.policy.transport_retries =>
                {
                    attempt += 1;
                    warn!(%url, attempt, error = %e, "transport error, retrying");
                    tokio::time::sleep(self.policy.retry_backoff).await;
                }
                Err(e) => return Err(e.into()),
            }
        }
    }
}

/// Batch authorization over REST: `POST {base}/batches/{batchId}`.
#[derive(Clone)]
pub struct RestAuthorizationApi {
    transport: HttpTransport,
    base_url: String,
}

impl RestAuthorizationApi {
    pub fn new(transport: HttpTransport, base_url: impl Into<String>) -> Self {
        Self {
            transport,
            base_url: base_url.into(),
        }
    }

    fn endpoint(&self, batch_id: &str) -> String {
        format!("{}/batches/{}", self.base_url.trim_end_matches('/'), batch_id)
    }
}

#[async_trait]
impl AuthorizationApi for RestAuthorizationApi {
    async fn authorize(
        &self,
        request: &AuthorizationRequest,
        correlation_id: &str,
    ) -> Result<UpstreamResponse> {
        let url = self.endpoint(&request.batch_id);
        self.transport
            .post_json(&url, &[(CORRELATION_HEADER, correlation_id)], request)
            .await
    }
}

#[derive(Clone)]
pub struct RestCallbackSender {
    transport: HttpTransport,
}

impl RestCallbackSender {
    pub fn new(transport: HttpTransport) -> Self {
        Self { transport }
    }
}

#[async_trait]
impl CallbackSender for RestCallbackSender {
    async fn send(&self, url: &str, payload: &CallbackPayload) -> Result<UpstreamResponse> {
        self.transport.post_json(url, &[], payload).await
    }
}
