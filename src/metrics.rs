//! Metric model and the snapshot-to-metrics transform.
//!
//! [`build`] turns one [`NetworkOverview`] into the exporter's four metric
//! families. The transform is pure: it reads the snapshot, builds a scratch
//! MAC-to-device table to resolve data-rate endpoints, and leaves nothing
//! behind. Rendering to the Prometheus text exposition format lives here as
//! well.

use std::collections::HashMap;
use std::io::Write;

use crate::model::{Device, NetworkOverview};

/// Label schema for the per-device families (info, connected devices).
pub const DEVICE_LABELS: &[&str] = &["hostname", "ip_address", "network_name"];

/// Label schema for the directional link families (tx, rx).
pub const LINK_LABELS: &[&str] = &[
    "from_hostname",
    "to_hostname",
    "from_ip_address",
    "to_ip_address",
    "network_name",
];

/// Error type for the metric build step.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    /// A data rate references a MAC address with no matching device in the
    /// same snapshot. The whole scrape is aborted so that link metrics never
    /// reference devices absent from the info/count families.
    #[error("data rate references unknown device {mac}")]
    UnknownMac { mac: String },
}

/// Metric kind in the exposition output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricKind {
    Gauge,
    Info,
}

impl MetricKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricKind::Gauge => "gauge",
            MetricKind::Info => "info",
        }
    }
}

/// One sample within a metric family.
#[derive(Debug, Clone)]
pub struct Sample {
    /// Values for the family's label schema, in schema order.
    pub label_values: Vec<String>,

    /// Numeric value; always 1 for info samples.
    pub value: f64,

    /// Extra key/value labels carried by info samples.
    pub attributes: Vec<(&'static str, String)>,
}

impl Sample {
    fn gauge(label_values: Vec<String>, value: f64) -> Self {
        Self {
            label_values,
            value,
            attributes: Vec::new(),
        }
    }

    fn info(label_values: Vec<String>, attributes: Vec<(&'static str, String)>) -> Self {
        Self {
            label_values,
            value: 1.0,
            attributes,
        }
    }
}

/// A named, typed collection of samples sharing one label schema.
///
/// Built fresh on every scrape and immutable once handed to the HTTP layer.
#[derive(Debug, Clone)]
pub struct MetricFamily {
    pub name: &'static str,
    pub help: &'static str,
    pub unit: Option<&'static str>,
    pub kind: MetricKind,
    pub label_names: &'static [&'static str],
    pub samples: Vec<Sample>,
}

impl MetricFamily {
    fn gauge(
        name: &'static str,
        help: &'static str,
        unit: &'static str,
        label_names: &'static [&'static str],
    ) -> Self {
        Self {
            name,
            help,
            unit: Some(unit),
            kind: MetricKind::Gauge,
            label_names,
            samples: Vec::new(),
        }
    }

    fn info(name: &'static str, help: &'static str, label_names: &'static [&'static str]) -> Self {
        Self {
            name,
            help,
            unit: None,
            kind: MetricKind::Info,
            label_names,
            samples: Vec::new(),
        }
    }

    /// Full metric name in the exposition output, unit-suffixed for gauges
    /// that carry a unit.
    pub fn full_name(&self) -> String {
        match self.unit {
            Some(unit) => format!("{}_{}", self.name, unit),
            None => self.name.to_string(),
        }
    }
}

/// The four families produced by one scrape, in emission order.
#[derive(Debug, Clone)]
pub struct ScrapeMetrics {
    pub info: MetricFamily,
    pub connected: MetricFamily,
    pub tx: MetricFamily,
    pub rx: MetricFamily,
}

impl ScrapeMetrics {
    /// Fixed emission order: info, count, tx, rx.
    pub fn into_families(self) -> Vec<MetricFamily> {
        vec![self.info, self.connected, self.tx, self.rx]
    }
}

/// Map a topology code to its label.
pub fn topology_label(code: u8) -> &'static str {
    match code {
        1 => "local",
        2 => "remote",
        _ => "unknown",
    }
}

/// Map a PLC technology code to its label.
pub fn technology_label(code: u8) -> &'static str {
    match code {
        3 => "HomePluvAV Thunderbolt",
        4 => "HomePlugAV Panther",
        7 => "G.hn Spirit",
        _ => "unknown",
    }
}

/// Transform one network snapshot into the four metric families.
///
/// Devices are emitted in snapshot order, keyed by
/// (hostname, ip_address, network_name). Data rates are resolved through a
/// scratch MAC lookup table built from the device loop; a dangling MAC fails
/// the whole build with [`BuildError::UnknownMac`] rather than dropping the
/// entry.
pub fn build(network: &NetworkOverview) -> Result<ScrapeMetrics, BuildError> {
    let mut info = MetricFamily::info(
        "devolo_device_info",
        "General device information",
        DEVICE_LABELS,
    );
    let mut connected = MetricFamily::gauge(
        "devolo_connected_devices",
        "Number of connected devices",
        "amount",
        DEVICE_LABELS,
    );
    let mut tx = MetricFamily::gauge("devolo_tx_rate", "Device tx rate", "megabits", LINK_LABELS);
    let mut rx = MetricFamily::gauge("devolo_rx_rate", "Device rx rate", "megabits", LINK_LABELS);

    let mut mac_to_device: HashMap<&str, &Device> = HashMap::with_capacity(network.devices.len());

    for device in &network.devices {
        let label_values = vec![
            device.user_device_name.clone(),
            device.ipv4_address.clone(),
            device.user_network_name.clone(),
        ];

        info.samples.push(Sample::info(
            label_values.clone(),
            vec![
                ("product_name", device.product_name.clone()),
                ("product_id", device.product_id.clone()),
                ("friendly_version", device.friendly_version.clone()),
                ("full_version", device.full_version.clone()),
                ("mac_address", device.mac_address.clone()),
                ("topology", topology_label(device.topology).to_string()),
                ("technology", technology_label(device.technology).to_string()),
                ("attached_to_gateway", device.attached_to_router.to_string()),
                ("network_name", device.user_network_name.clone()),
                ("ipv4_address", device.ipv4_address.clone()),
            ],
        ));

        connected.samples.push(Sample::gauge(
            label_values,
            device.bridged_devices.len() as f64,
        ));

        mac_to_device.insert(device.mac_address.as_str(), device);
    }

    for data_rate in &network.data_rates {
        let from_device = lookup(&mac_to_device, &data_rate.mac_address_from)?;
        let to_device = lookup(&mac_to_device, &data_rate.mac_address_to)?;

        let label_values = vec![
            from_device.user_device_name.clone(),
            to_device.user_device_name.clone(),
            from_device.ipv4_address.clone(),
            to_device.ipv4_address.clone(),
            from_device.user_network_name.clone(),
        ];

        tx.samples
            .push(Sample::gauge(label_values.clone(), data_rate.tx_rate));
        rx.samples.push(Sample::gauge(label_values, data_rate.rx_rate));
    }

    Ok(ScrapeMetrics {
        info,
        connected,
        tx,
        rx,
    })
}

fn lookup<'a>(
    mac_to_device: &HashMap<&str, &'a Device>,
    mac: &str,
) -> Result<&'a Device, BuildError> {
    mac_to_device
        .get(mac)
        .copied()
        .ok_or_else(|| BuildError::UnknownMac {
            mac: mac.to_string(),
        })
}

/// Render metric families in Prometheus text exposition format.
pub fn render(families: &[MetricFamily]) -> String {
    let mut output = Vec::with_capacity(families.len() * 256);

    for family in families {
        let name = family.full_name();

        writeln!(output, "# HELP {} {}", name, family.help).ok();
        writeln!(output, "# TYPE {} {}", name, family.kind.as_str()).ok();
        if let Some(unit) = family.unit {
            writeln!(output, "# UNIT {} {}", name, unit).ok();
        }

        for sample in &family.samples {
            let mut labels: Vec<(&str, &str)> = family
                .label_names
                .iter()
                .copied()
                .zip(sample.label_values.iter().map(String::as_str))
                .collect();
            for (key, value) in &sample.attributes {
                labels.push((key, value.as_str()));
            }

            writeln!(
                output,
                "{}{} {}",
                name,
                format_labels(&labels),
                format_value(sample.value)
            )
            .ok();
        }
    }

    String::from_utf8(output).unwrap_or_default()
}

/// Escape special characters in label values.
fn escape_label_value(value: &str) -> String {
    let mut result = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => result.push_str("\\\\"),
            '"' => result.push_str("\\\""),
            '\n' => result.push_str("\\n"),
            _ => result.push(c),
        }
    }
    result
}

/// Format a floating point value for Prometheus.
fn format_value(value: f64) -> String {
    if value.is_nan() {
        "NaN".to_string()
    } else if value.is_infinite() {
        if value.is_sign_positive() {
            "+Inf".to_string()
        } else {
            "-Inf".to_string()
        }
    } else if value.fract() == 0.0 {
        format!("{:.0}", value)
    } else {
        format!("{}", value)
    }
}

/// Format labels for the exposition format.
fn format_labels(labels: &[(&str, &str)]) -> String {
    if labels.is_empty() {
        return String::new();
    }

    let parts: Vec<String> = labels
        .iter()
        .map(|(k, v)| format!("{}=\"{}\"", k, escape_label_value(v)))
        .collect();

    format!("{{{}}}", parts.join(","))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::DataRate;

    fn make_device(name: &str, ip: &str, mac: &str, bridged: &[&str]) -> Device {
        Device {
            user_device_name: name.to_string(),
            ipv4_address: ip.to_string(),
            user_network_name: "home".to_string(),
            product_name: "devolo Magic 2 LAN".to_string(),
            product_id: "MT3056".to_string(),
            friendly_version: "7.12.5.124".to_string(),
            full_version: "magic-2-lan 7.12.5.124".to_string(),
            mac_address: mac.to_string(),
            topology: 1,
            technology: 7,
            attached_to_router: false,
            bridged_devices: bridged.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn two_device_network() -> NetworkOverview {
        NetworkOverview {
            devices: vec![
                make_device("host1", "10.0.0.1", "AA", &[]),
                make_device("host2", "10.0.0.2", "BB", &["x"]),
            ],
            data_rates: vec![DataRate {
                mac_address_from: "AA".to_string(),
                mac_address_to: "BB".to_string(),
                tx_rate: 100.0,
                rx_rate: 50.0,
            }],
        }
    }

    #[test]
    fn test_one_entry_per_device_in_input_order() {
        let metrics = build(&two_device_network()).unwrap();

        assert_eq!(metrics.info.samples.len(), 2);
        assert_eq!(metrics.connected.samples.len(), 2);
        assert_eq!(
            metrics.info.samples[0].label_values,
            vec!["host1", "10.0.0.1", "home"]
        );
        assert_eq!(
            metrics.info.samples[1].label_values,
            vec!["host2", "10.0.0.2", "home"]
        );
    }

    #[test]
    fn test_topology_code_mapping() {
        assert_eq!(topology_label(0), "unknown");
        assert_eq!(topology_label(1), "local");
        assert_eq!(topology_label(2), "remote");
        assert_eq!(topology_label(99), "unknown");
    }

    #[test]
    fn test_technology_code_mapping() {
        assert_eq!(technology_label(0), "unknown");
        assert_eq!(technology_label(3), "HomePluvAV Thunderbolt");
        assert_eq!(technology_label(4), "HomePlugAV Panther");
        assert_eq!(technology_label(7), "G.hn Spirit");
        assert_eq!(technology_label(5), "unknown");
    }

    #[test]
    fn test_connected_devices_counts_bridged_list() {
        let metrics = build(&two_device_network()).unwrap();

        assert_eq!(metrics.connected.samples[0].value, 0.0);
        assert_eq!(metrics.connected.samples[1].value, 1.0);
    }

    #[test]
    fn test_data_rate_join_is_directional() {
        let metrics = build(&two_device_network()).unwrap();

        assert_eq!(metrics.tx.samples.len(), 1);
        assert_eq!(
            metrics.tx.samples[0].label_values,
            vec!["host1", "host2", "10.0.0.1", "10.0.0.2", "home"]
        );
        assert_eq!(metrics.tx.samples[0].value, 100.0);
        assert_eq!(metrics.rx.samples[0].label_values, metrics.tx.samples[0].label_values);
        assert_eq!(metrics.rx.samples[0].value, 50.0);
    }

    #[test]
    fn test_bidirectional_links_produce_independent_entries() {
        let mut network = two_device_network();
        network.data_rates.push(DataRate {
            mac_address_from: "BB".to_string(),
            mac_address_to: "AA".to_string(),
            tx_rate: 90.0,
            rx_rate: 45.0,
        });

        let metrics = build(&network).unwrap();

        assert_eq!(metrics.tx.samples.len(), 2);
        assert_eq!(
            metrics.tx.samples[1].label_values,
            vec!["host2", "host1", "10.0.0.2", "10.0.0.1", "home"]
        );
    }

    #[test]
    fn test_unknown_mac_fails_the_whole_build() {
        let mut network = two_device_network();
        network.data_rates.push(DataRate {
            mac_address_from: "AA".to_string(),
            mac_address_to: "CC".to_string(),
            tx_rate: 1.0,
            rx_rate: 1.0,
        });

        let err = build(&network).unwrap_err();
        assert!(matches!(err, BuildError::UnknownMac { ref mac } if mac == "CC"));
    }

    #[test]
    fn test_empty_snapshot_yields_empty_families() {
        let metrics = build(&NetworkOverview::default()).unwrap();

        assert!(metrics.info.samples.is_empty());
        assert!(metrics.connected.samples.is_empty());
        assert!(metrics.tx.samples.is_empty());
        assert!(metrics.rx.samples.is_empty());
    }

    #[test]
    fn test_family_order_and_names() {
        let families = build(&NetworkOverview::default()).unwrap().into_families();

        let names: Vec<String> = families.iter().map(|f| f.full_name()).collect();
        assert_eq!(
            names,
            vec![
                "devolo_device_info",
                "devolo_connected_devices_amount",
                "devolo_tx_rate_megabits",
                "devolo_rx_rate_megabits",
            ]
        );
    }

    #[test]
    fn test_info_attributes() {
        let metrics = build(&two_device_network()).unwrap();
        let attrs = &metrics.info.samples[0].attributes;

        let get = |key: &str| {
            attrs
                .iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| v.as_str())
        };

        assert_eq!(get("product_name"), Some("devolo Magic 2 LAN"));
        assert_eq!(get("mac_address"), Some("AA"));
        assert_eq!(get("topology"), Some("local"));
        assert_eq!(get("technology"), Some("G.hn Spirit"));
        assert_eq!(get("attached_to_gateway"), Some("false"));
        assert_eq!(get("ipv4_address"), Some("10.0.0.1"));
    }

    #[test]
    fn test_render_scenario() {
        let families = build(&two_device_network()).unwrap().into_families();
        let output = render(&families);

        assert!(output.contains("# TYPE devolo_device_info info"));
        assert!(output.contains("# TYPE devolo_connected_devices_amount gauge"));
        assert!(output.contains("# UNIT devolo_connected_devices_amount amount"));
        assert!(output.contains(
            "devolo_connected_devices_amount{hostname=\"host1\",ip_address=\"10.0.0.1\",network_name=\"home\"} 0"
        ));
        assert!(output.contains(
            "devolo_tx_rate_megabits{from_hostname=\"host1\",to_hostname=\"host2\",from_ip_address=\"10.0.0.1\",to_ip_address=\"10.0.0.2\",network_name=\"home\"} 100"
        ));
        assert!(output.contains("devolo_rx_rate_megabits{"));
        assert!(output.contains("} 50"));
    }

    #[test]
    fn test_render_empty_families_has_metadata_only() {
        let families = build(&NetworkOverview::default()).unwrap().into_families();
        let output = render(&families);

        assert!(output.contains("# HELP devolo_device_info"));
        assert!(
            output
                .lines()
                .all(|l| l.starts_with('#') || l.trim().is_empty())
        );
    }

    #[test]
    fn test_escape_label_value() {
        assert_eq!(escape_label_value("simple"), "simple");
        assert_eq!(escape_label_value("with\"quote"), "with\\\"quote");
        assert_eq!(escape_label_value("with\\backslash"), "with\\\\backslash");
        assert_eq!(escape_label_value("with\nnewline"), "with\\nnewline");
    }

    #[test]
    fn test_format_value() {
        assert_eq!(format_value(42.0), "42");
        assert_eq!(format_value(3.14), "3.14");
        assert_eq!(format_value(f64::NAN), "NaN");
        assert_eq!(format_value(f64::INFINITY), "+Inf");
    }
}
