//! Connection parameters supplied by the embedding application.
//!
//! Explicit values passed to constructors — no globals, no environment
//! lookups inside the core. The embedding application owns credential
//! sourcing and hands the result over as an opaque config.

use std::time::Duration;

use provenant_core::ChannelId;

/// Connection parameters for the three external services.
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    /// Base URL of the consensus log service.
    pub log_endpoint: String,
    /// Base URL of the mirror/replica query service.
    pub mirror_endpoint: String,
    /// Base URL of the on-chain registry gateway.
    pub registry_endpoint: String,
    /// Optional bearer token sent with every request.
    pub auth_token: Option<String>,
    /// Pre-existing channel id. When set, channel creation is skipped
    /// entirely and this id is used as-is.
    pub channel_override: Option<ChannelId>,
    /// Per-call timeout for all network operations.
    pub timeout: Duration,
}

impl ConnectionConfig {
    pub fn new(
        log_endpoint: impl Into<String>,
        mirror_endpoint: impl Into<String>,
        registry_endpoint: impl Into<String>,
    ) -> Self {
        ConnectionConfig {
            log_endpoint: log_endpoint.into(),
            mirror_endpoint: mirror_endpoint.into(),
            registry_endpoint: registry_endpoint.into(),
            auth_token: None,
            channel_override: None,
            timeout: Duration::from_secs(30),
        }
    }

    pub fn with_auth_token(mut self, token: impl Into<String>) -> Self {
        self.auth_token = Some(token.into());
        self
    }

    pub fn with_channel_override(mut self, channel: ChannelId) -> Self {
        self.channel_override = Some(channel);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}
