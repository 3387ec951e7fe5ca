// Domain model: normalized devices and snapshots.
//
// `marstek-api` hands over loosely typed wire records; here they become
// the stable shape the rest of the workspace consumes. Metric keys are
// stored in a sorted map so snapshot rendering and hashing stay
// deterministic.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, TimeZone, Utc};
use serde::Serialize;

use marstek_api::CloudDevice;

/// A single telemetry reading.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum MetricValue {
    Number(f64),
    Text(String),
}

impl MetricValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Text(_) => None,
        }
    }
}

impl fmt::Display for MetricValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

/// One battery system, normalized from the vendor record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Device {
    /// Vendor device identifier, the stable key across polls.
    pub id: String,
    pub name: Option<String>,
    pub serial: Option<String>,
    pub firmware_version: Option<String>,
    /// Telemetry by metric name (`soc`, `charge`, `discharge`, `load`,
    /// `pv`, `profit`). Absent keys mean the vendor omitted the field.
    pub metrics: BTreeMap<String, MetricValue>,
    /// When the device last reported in, per the vendor.
    pub report_time: Option<DateTime<Utc>>,
}

impl Device {
    pub fn metric(&self, name: &str) -> Option<&MetricValue> {
        self.metrics.get(name)
    }
}

impl From<CloudDevice> for Device {
    fn from(raw: CloudDevice) -> Self {
        let mut metrics = BTreeMap::new();
        for (key, value) in [
            ("soc", raw.soc),
            ("charge", raw.charge),
            ("discharge", raw.discharge),
            ("load", raw.load),
            ("pv", raw.pv),
            ("profit", raw.profit),
        ] {
            if let Some(v) = value {
                metrics.insert(key.to_owned(), MetricValue::Number(v));
            }
        }

        Self {
            id: raw.devid,
            name: raw.name,
            serial: raw.sn,
            firmware_version: raw.version,
            metrics,
            report_time: raw
                .report_time
                .and_then(|ts| Utc.timestamp_opt(ts, 0).single()),
        }
    }
}

/// The full device list from one poll, in vendor order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DeviceSnapshot {
    pub devices: Vec<Device>,
}

impl DeviceSnapshot {
    pub fn from_cloud(raw: Vec<CloudDevice>) -> Self {
        Self {
            devices: raw.into_iter().map(Device::from).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    /// Look up a device by its vendor identifier.
    pub fn device(&self, id: &str) -> Option<&Device> {
        self.devices.iter().find(|d| d.id == id)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw_device() -> CloudDevice {
        serde_json::from_value(json!({
            "devid": "dev-1",
            "name": "Venus E",
            "sn": "SN-001",
            "version": "151",
            "soc": 87,
            "charge": 250.0,
            "load": "430",
            "report_time": 1_718_000_000
        }))
        .unwrap()
    }

    #[test]
    fn normalizes_cloud_device() {
        let device = Device::from(raw_device());

        assert_eq!(device.id, "dev-1");
        assert_eq!(device.serial.as_deref(), Some("SN-001"));
        assert_eq!(device.metric("soc").and_then(MetricValue::as_f64), Some(87.0));
        assert_eq!(device.metric("load").and_then(MetricValue::as_f64), Some(430.0));
        // `discharge` was absent on the wire, so the key is absent here.
        assert!(device.metric("discharge").is_none());
        assert_eq!(
            device.report_time.unwrap().timestamp(),
            1_718_000_000
        );
    }

    #[test]
    fn snapshot_lookup_by_id() {
        let snapshot = DeviceSnapshot::from_cloud(vec![raw_device()]);
        assert_eq!(snapshot.len(), 1);
        assert!(snapshot.device("dev-1").is_some());
        assert!(snapshot.device("dev-2").is_none());
    }
}
