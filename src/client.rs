//! Device API client for devolo PLC adapters.
//!
//! The vendor protocol is treated as an opaque collaborator behind the
//! [`DeviceClient`]/[`DeviceSession`] seam: the collector connects, sets the
//! device password, runs one network-overview query, and drops the session.
//! [`PlcApiClient`] is the production implementation, a thin HTTP adapter for
//! the device's local API.

use async_trait::async_trait;
use tracing::debug;

use crate::model::NetworkOverview;

/// Port of the PLC network API on the device.
const PLCNET_API_PORT: u16 = 47219;

/// Error type for device client operations.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("Connection failed: {0}")]
    Connection(String),
    #[error("Authentication failed: {0}")]
    Auth(String),
    #[error("Protocol error: {0}")]
    Protocol(String),
}

/// Factory for device sessions.
///
/// One session is opened per scrape and released when it goes out of scope,
/// whatever the exit path. Implementations must tolerate being called from
/// concurrent scrapes; whether the physical device accepts parallel sessions
/// is a property of the device, and shows up as a per-scrape
/// [`ClientError::Connection`] if it does not.
#[async_trait]
pub trait DeviceClient: Send + Sync + 'static {
    type Session: DeviceSession;

    /// Open a session to the device at `address`.
    async fn connect(&self, address: &str) -> Result<Self::Session, ClientError>;
}

/// A scoped connection to one device.
#[async_trait]
pub trait DeviceSession: Send {
    /// Set the password used to authenticate subsequent queries.
    fn set_password(&mut self, password: &str);

    /// Query the device for the full PLC network overview.
    ///
    /// This performs the actual network round trip and authentication
    /// handshake. No timeout is enforced at this layer.
    async fn get_network_overview(&mut self) -> Result<NetworkOverview, ClientError>;
}

/// HTTP client for the devolo PLC network API.
#[derive(Debug, Clone, Default)]
pub struct PlcApiClient;

impl PlcApiClient {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl DeviceClient for PlcApiClient {
    type Session = PlcApiSession;

    async fn connect(&self, address: &str) -> Result<Self::Session, ClientError> {
        let http = reqwest::Client::builder()
            .build()
            .map_err(|e| ClientError::Connection(e.to_string()))?;

        debug!(address, "Opened device session");

        Ok(PlcApiSession {
            http,
            base_url: format!("http://{}:{}", address, PLCNET_API_PORT),
            password: None,
        })
    }
}

/// One HTTP session against a device's PLC network API.
///
/// Dropping the session releases the underlying connection pool.
pub struct PlcApiSession {
    http: reqwest::Client,
    base_url: String,
    password: Option<String>,
}

#[async_trait]
impl DeviceSession for PlcApiSession {
    fn set_password(&mut self, password: &str) {
        self.password = Some(password.to_string());
    }

    async fn get_network_overview(&mut self) -> Result<NetworkOverview, ClientError> {
        let url = format!("{}/plcnet/v0/network/overview", self.base_url);

        let mut request = self.http.get(&url);
        if let Some(password) = &self.password {
            request = request.basic_auth("devolo", Some(password));
        }

        let response = request.send().await.map_err(|e| {
            if e.is_connect() || e.is_timeout() {
                ClientError::Connection(e.to_string())
            } else {
                ClientError::Protocol(e.to_string())
            }
        })?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            return Err(ClientError::Auth(format!(
                "device rejected credentials ({})",
                status
            )));
        }
        if !status.is_success() {
            return Err(ClientError::Protocol(format!(
                "unexpected status {} from {}",
                status, url
            )));
        }

        response
            .json::<NetworkOverview>()
            .await
            .map_err(|e| ClientError::Protocol(e.to_string()))
    }
}

impl Drop for PlcApiSession {
    fn drop(&mut self) {
        debug!(url = %self.base_url, "Closed device session");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_connect_builds_base_url() {
        let client = PlcApiClient::new();
        let session = client.connect("192.0.2.10").await.unwrap();
        assert_eq!(session.base_url, "http://192.0.2.10:47219");
        assert!(session.password.is_none());
    }

    #[tokio::test]
    async fn test_set_password_is_kept_for_queries() {
        let client = PlcApiClient::new();
        let mut session = client.connect("192.0.2.10").await.unwrap();
        session.set_password("secret");
        assert_eq!(session.password.as_deref(), Some("secret"));
    }

    #[test]
    fn test_error_display() {
        let err = ClientError::Connection("refused".to_string());
        assert_eq!(err.to_string(), "Connection failed: refused");

        let err = ClientError::Auth("401".to_string());
        assert!(err.to_string().starts_with("Authentication failed"));
    }
}
