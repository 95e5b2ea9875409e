//! Data model for one PLC network snapshot.
//!
//! Everything here lives for a single scrape: the device API returns one
//! [`NetworkOverview`], the metric builder reads it, and it is dropped.

use serde::{Deserialize, Serialize};

/// One PLC adapter as reported by the device's network overview.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Device {
    /// User-assigned display name (e.g., "Living Room").
    pub user_device_name: String,

    /// IPv4 address of the adapter.
    pub ipv4_address: String,

    /// User-assigned name of the PLC network the adapter belongs to.
    pub user_network_name: String,

    /// Vendor product name (e.g., "devolo Magic 2 LAN").
    pub product_name: String,

    /// Vendor product identifier.
    pub product_id: String,

    /// Short firmware version string.
    pub friendly_version: String,

    /// Full firmware version string.
    pub full_version: String,

    /// MAC address; unique within one snapshot and used as the join key
    /// for data-rate records.
    pub mac_address: String,

    /// Topology code (0 = unknown, 1 = local, 2 = remote).
    pub topology: u8,

    /// PLC technology code (see [`crate::metrics::technology_label`]).
    pub technology: u8,

    /// Whether the adapter is attached to the network gateway.
    pub attached_to_router: bool,

    /// MAC addresses of devices bridged through this adapter.
    #[serde(default)]
    pub bridged_devices: Vec<String>,
}

/// A directed link measurement between two adapters in the same snapshot.
///
/// Both MAC addresses must reference devices present in the snapshot's
/// device list; the metric builder treats a dangling reference as a hard
/// failure for the whole scrape.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataRate {
    /// MAC address of the transmitting adapter.
    pub mac_address_from: String,

    /// MAC address of the receiving adapter.
    pub mac_address_to: String,

    /// Transmit rate in megabits per second.
    pub tx_rate: f64,

    /// Receive rate in megabits per second.
    pub rx_rate: f64,
}

/// The full network overview returned by one device query.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NetworkOverview {
    /// All adapters visible in the PLC network, in device-reported order.
    #[serde(default)]
    pub devices: Vec<Device>,

    /// Pairwise link data rates, in device-reported order.
    #[serde(default)]
    pub data_rates: Vec<DataRate>,
}
