//! One-scrape orchestration.
//!
//! A [`PlcNetCollector`] owns the device address and credential and runs the
//! full cycle on every invocation: open a session, authenticate, query the
//! network overview, transform it into metric families. Nothing is cached
//! between scrapes and concurrent scrapes share no mutable state.

use std::sync::Arc;

use tracing::{debug, info};

use crate::client::{ClientError, DeviceClient, DeviceSession};
use crate::metrics::{self, BuildError, MetricFamily};

/// Error type for one scrape.
#[derive(Debug, thiserror::Error)]
pub enum CollectError {
    #[error(transparent)]
    Client(#[from] ClientError),
    #[error("Metric build failed: {0}")]
    Build(#[from] BuildError),
}

/// Collector polling a single devolo PLC device.
pub struct PlcNetCollector<C> {
    client: C,
    ip_address: String,
    password: String,
}

impl<C: DeviceClient> PlcNetCollector<C> {
    /// Create a collector for the device at `ip_address`.
    pub fn new(client: C, ip_address: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            client,
            ip_address: ip_address.into(),
            password: password.into(),
        }
    }

    /// Address of the polled device.
    pub fn ip_address(&self) -> &str {
        &self.ip_address
    }

    /// Run one full scrape cycle.
    ///
    /// Returns the four metric families in fixed order: info, connected
    /// devices, tx rate, rx rate. The device session is released on every
    /// exit path, including build failures.
    pub async fn collect(&self) -> Result<Vec<MetricFamily>, CollectError> {
        info!(ip_address = %self.ip_address, "Collecting from device");

        let mut session = self.client.connect(&self.ip_address).await?;
        session.set_password(&self.password);
        let network = session.get_network_overview().await?;
        drop(session);

        let families = metrics::build(&network)?.into_families();

        debug!(
            devices = network.devices.len(),
            data_rates = network.data_rates.len(),
            "Scrape complete"
        );

        Ok(families)
    }
}

/// Shareable collector handle registered once at startup.
pub type SharedCollector<C> = Arc<PlcNetCollector<C>>;
