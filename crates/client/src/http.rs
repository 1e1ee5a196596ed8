//! HTTP transports for the three services.
//!
//! Uses `ureq` (sync) wrapped in `tokio::task::spawn_blocking` to keep
//! blocking I/O off the async runtime, with the configured per-call timeout
//! applied around the blocking task. Dropping the caller's future abandons
//! the await; nothing in this layer retries on its own.

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};

use provenant_core::{ChannelId, SubmissionReceipt};

use crate::config::ConnectionConfig;
use crate::transport::{
    LogTransport, MirrorPage, MirrorTransport, RegistryReceipt, RegistryTransport, ResourceBudget,
    SnapshotFields, TransportError,
};

/// One connection value implementing all three transports against the
/// endpoints in a [`ConnectionConfig`].
pub struct HttpConnection {
    config: ConnectionConfig,
}

impl HttpConnection {
    pub fn new(config: ConnectionConfig) -> Self {
        HttpConnection { config }
    }

    /// Join a base endpoint and a path, tolerating a trailing slash on the
    /// base: `join_url("http://log/", "v1/channels")` → `http://log/v1/channels`.
    fn join_url(base: &str, path: &str) -> String {
        format!("{}/{}", base.trim_end_matches('/'), path)
    }

    async fn get_json(&self, url: String) -> Result<serde_json::Value, TransportError> {
        let auth_token = self.config.auth_token.clone();

        let task = tokio::task::spawn_blocking(move || {
            let agent = ureq::Agent::new_with_defaults();
            let mut request = agent.get(&url);

            if let Some(ref token) = auth_token {
                request = request.header("Authorization", &format!("Bearer {}", token));
            }

            let response = request.call().map_err(map_ureq_error)?;

            response
                .into_body()
                .read_json()
                .map_err(|e| TransportError::Body(e.to_string()))
        });

        self.await_with_timeout(task).await
    }

    async fn post_json(
        &self,
        url: String,
        body: serde_json::Value,
    ) -> Result<serde_json::Value, TransportError> {
        let auth_token = self.config.auth_token.clone();

        let task = tokio::task::spawn_blocking(move || {
            let agent = ureq::Agent::new_with_defaults();
            let mut request = agent.post(&url);

            if let Some(ref token) = auth_token {
                request = request.header("Authorization", &format!("Bearer {}", token));
            }

            let response = request.send_json(body).map_err(map_ureq_error)?;

            response
                .into_body()
                .read_json()
                .map_err(|e| TransportError::Body(e.to_string()))
        });

        self.await_with_timeout(task).await
    }

    async fn await_with_timeout<T: Send + 'static>(
        &self,
        task: tokio::task::JoinHandle<Result<T, TransportError>>,
    ) -> Result<T, TransportError> {
        match tokio::time::timeout(self.config.timeout, task).await {
            Err(_) => Err(TransportError::Timeout {
                after: self.config.timeout,
            }),
            Ok(Err(join)) => Err(TransportError::Connect(format!("task join error: {}", join))),
            Ok(Ok(result)) => result,
        }
    }
}

fn map_ureq_error(err: ureq::Error) -> TransportError {
    match err {
        ureq::Error::StatusCode(code) => TransportError::Status { status: code },
        other => TransportError::Connect(other.to_string()),
    }
}

#[async_trait]
impl LogTransport for HttpConnection {
    async fn create_channel(&self) -> Result<ChannelId, TransportError> {
        let url = Self::join_url(&self.config.log_endpoint, "v1/channels");
        let value = self.post_json(url, serde_json::json!({})).await?;

        let id = value
            .get("channel_id")
            .and_then(serde_json::Value::as_str)
            .ok_or_else(|| TransportError::Body("missing channel_id".to_string()))?;

        Ok(ChannelId::from(id))
    }

    async fn submit(
        &self,
        channel: &ChannelId,
        payload: &[u8],
        submission_id: &str,
    ) -> Result<SubmissionReceipt, TransportError> {
        let url = Self::join_url(
            &self.config.log_endpoint,
            &format!("v1/channels/{}/messages", channel),
        );
        let body = serde_json::json!({
            "payload": BASE64.encode(payload),
            "submission_id": submission_id,
        });
        let value = self.post_json(url, body).await?;

        let accepted = value
            .get("accepted")
            .and_then(serde_json::Value::as_bool)
            .ok_or_else(|| TransportError::Body("missing accepted flag".to_string()))?;

        Ok(SubmissionReceipt {
            accepted,
            submission_id: submission_id.to_string(),
        })
    }
}

#[async_trait]
impl MirrorTransport for HttpConnection {
    async fn fetch_page(
        &self,
        channel: &ChannelId,
        cursor: Option<&str>,
        page_size: u32,
    ) -> Result<MirrorPage, TransportError> {
        let mut url = Self::join_url(
            &self.config.mirror_endpoint,
            &format!("v1/channels/{}/messages?limit={}", channel, page_size),
        );
        if let Some(cursor) = cursor {
            url.push_str(&format!("&cursor={}", cursor));
        }

        let value = self.get_json(url).await?;
        serde_json::from_value(value).map_err(|e| TransportError::Body(e.to_string()))
    }
}

#[async_trait]
impl RegistryTransport for HttpConnection {
    async fn create(
        &self,
        product_id: &str,
        name: &str,
        description: &str,
        status: &str,
        budget: ResourceBudget,
    ) -> Result<RegistryReceipt, TransportError> {
        self.registry_write("create", product_id, name, description, status, budget)
            .await
    }

    async fn update(
        &self,
        product_id: &str,
        name: &str,
        description: &str,
        status: &str,
        budget: ResourceBudget,
    ) -> Result<RegistryReceipt, TransportError> {
        self.registry_write("update", product_id, name, description, status, budget)
            .await
    }

    async fn query(
        &self,
        product_id: &str,
        budget: ResourceBudget,
    ) -> Result<Option<SnapshotFields>, TransportError> {
        let url = Self::join_url(
            &self.config.registry_endpoint,
            &format!("v1/registry/products/{}?budget={}", product_id, budget.limit),
        );
        let value = self.get_json(url).await?;

        let found = value
            .get("found")
            .and_then(serde_json::Value::as_bool)
            .ok_or_else(|| TransportError::Body("missing found flag".to_string()))?;
        if !found {
            return Ok(None);
        }

        let fields: SnapshotFields =
            serde_json::from_value(value).map_err(|e| TransportError::Body(e.to_string()))?;
        Ok(Some(fields))
    }
}

impl HttpConnection {
    async fn registry_write(
        &self,
        function: &str,
        product_id: &str,
        name: &str,
        description: &str,
        status: &str,
        budget: ResourceBudget,
    ) -> Result<RegistryReceipt, TransportError> {
        let url = Self::join_url(
            &self.config.registry_endpoint,
            &format!("v1/registry/{}", function),
        );
        let body = serde_json::json!({
            "product_id": product_id,
            "name": name,
            "description": description,
            "status": status,
            "budget": budget.limit,
        });
        let value = self.post_json(url, body).await?;
        serde_json::from_value(value).map_err(|e| TransportError::Body(e.to_string()))
    }
}
