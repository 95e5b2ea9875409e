//! Prometheus exporter for devolo PLC network devices.
//!
//! On every scrape the exporter queries one devolo adapter for its PLC
//! network overview and exposes the result as four metric families: device
//! info, connected-device counts, and directional tx/rx link rates.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐     ┌─────────────────┐     ┌─────────────────┐
//! │  devolo device  │<────│    Collector    │<────│   HTTP Server   │
//! │  (PLC net API)  │     │  (per-scrape)   │     │   (/metrics)    │
//! └─────────────────┘     └─────────────────┘     └─────────────────┘
//! ```
//!
//! Each scrape is independent: the collector opens a fresh device session,
//! authenticates, queries, transforms, and returns. Nothing is cached
//! between scrapes. Whether the physical device tolerates simultaneous
//! sessions is a device property; a device that does not will fail one of
//! two overlapping scrapes with a connection error.
//!
//! # Usage
//!
//! Run the exporter binary with a YAML config file:
//!
//! ```bash
//! devolo-exporter config.yml
//! ```
//!
//! # Configuration
//!
//! See [`config::ExporterConfig`] for configuration options.

pub mod client;
pub mod collector;
pub mod config;
pub mod http;
pub mod metrics;
pub mod model;

pub use client::{ClientError, DeviceClient, DeviceSession, PlcApiClient};
pub use collector::{CollectError, PlcNetCollector, SharedCollector};
pub use config::ExporterConfig;
pub use http::HttpServer;
pub use metrics::{MetricFamily, ScrapeMetrics};
pub use model::{DataRate, Device, NetworkOverview};
