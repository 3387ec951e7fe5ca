// Wire-level response models for the Marstek Cloud API.
//
// The vendor payloads are loosely typed: the `code` field arrives as a
// JSON number on some endpoints and a string on others, and telemetry
// values occasionally come back as numeric strings. Everything here
// deserializes leniently so one sloppy field never sinks a whole
// snapshot.

use serde::de::{self, Deserializer};
use serde::Deserialize;
use serde_json::Value;

// ── Vendor status codes ─────────────────────────────────────────────

/// Codes meaning the token is expired or invalid.
pub const TOKEN_ERROR_CODES: [&str; 3] = ["-1", "401", "403"];
/// "No access permission" — a distinct fatal-auth class.
pub const NO_ACCESS_CODE: &str = "8";
/// Rate limit exceeded.
pub const RATE_LIMIT_CODE: &str = "5";
/// Success code of the login endpoint.
pub const LOGIN_SUCCESS_CODE: &str = "2";
/// Success code of the device-list endpoint.
pub const DEVICES_SUCCESS_CODE: &str = "1";

/// A vendor status code, normalized to its string form.
///
/// The API returns `code` as either a JSON number or a string depending
/// on the endpoint (and sometimes the error), so all comparisons go
/// through the normalized representation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiCode(String);

impl ApiCode {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_token_error(&self) -> bool {
        TOKEN_ERROR_CODES.contains(&self.0.as_str())
    }
}

impl From<&str> for ApiCode {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

impl std::fmt::Display for ApiCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for ApiCode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match Value::deserialize(deserializer)? {
            Value::String(s) => Ok(Self(s)),
            Value::Number(n) => Ok(Self(n.to_string())),
            other => Err(de::Error::custom(format!(
                "expected string or number status code, got {other}"
            ))),
        }
    }
}

// ── Response envelopes ──────────────────────────────────────────────

/// Login response: `{ code?, token?, msg? }`.
///
/// The success signal is the token itself; `code` is advisory and has
/// been observed missing entirely.
#[derive(Debug, Deserialize)]
pub(crate) struct LoginResponse {
    #[serde(default)]
    pub code: Option<ApiCode>,
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub msg: Option<String>,
}

/// Device-list response: `{ code, data?, msg? }`.
#[derive(Debug, Deserialize)]
pub(crate) struct DeviceListResponse {
    pub code: ApiCode,
    #[serde(default)]
    pub data: Option<Vec<CloudDevice>>,
    #[serde(default)]
    pub msg: Option<String>,
}

// ── Device record ───────────────────────────────────────────────────

/// One device record as returned by `getDeviceList`.
///
/// Telemetry fields are optional and coerced: the vendor has been
/// observed sending both `"soc": 87` and `"soc": "87"`.
#[derive(Debug, Clone, Deserialize)]
pub struct CloudDevice {
    /// Vendor device identifier.
    #[serde(default)]
    pub devid: String,

    /// Display name assigned in the vendor app.
    #[serde(default, deserialize_with = "lenient_string")]
    pub name: Option<String>,

    /// Hardware serial number.
    #[serde(default, deserialize_with = "lenient_string")]
    pub sn: Option<String>,

    /// Firmware version (sometimes a bare number on the wire).
    #[serde(default, deserialize_with = "lenient_string")]
    pub version: Option<String>,

    /// State of charge, percent.
    #[serde(default, deserialize_with = "lenient_f64")]
    pub soc: Option<f64>,

    /// Charging power, watts.
    #[serde(default, deserialize_with = "lenient_f64")]
    pub charge: Option<f64>,

    /// Discharging power, watts.
    #[serde(default, deserialize_with = "lenient_f64")]
    pub discharge: Option<f64>,

    /// Household load, watts.
    #[serde(default, deserialize_with = "lenient_f64")]
    pub load: Option<f64>,

    /// Solar input power, watts.
    #[serde(default, deserialize_with = "lenient_f64")]
    pub pv: Option<f64>,

    /// Accumulated profit figure from the vendor app.
    #[serde(default, deserialize_with = "lenient_f64")]
    pub profit: Option<f64>,

    /// Unix timestamp of the device's last report.
    #[serde(default, deserialize_with = "lenient_i64")]
    pub report_time: Option<i64>,
}

// ── Lenient field deserializers ─────────────────────────────────────

fn lenient_f64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f64>, D::Error> {
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    })
}

fn lenient_i64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<i64>, D::Error> {
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Number(n)) => n.as_i64(),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    })
}

fn lenient_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn api_code_from_number_and_string() {
        let n: ApiCode = serde_json::from_value(json!(8)).unwrap();
        let s: ApiCode = serde_json::from_value(json!("8")).unwrap();
        assert_eq!(n, s);
        assert_eq!(n.as_str(), "8");
    }

    #[test]
    fn api_code_rejects_other_shapes() {
        assert!(serde_json::from_value::<ApiCode>(json!([1])).is_err());
    }

    #[test]
    fn token_error_codes_match() {
        assert!(ApiCode::from("-1").is_token_error());
        assert!(ApiCode::from("401").is_token_error());
        assert!(!ApiCode::from("8").is_token_error());
    }

    #[test]
    fn device_deserializes_mixed_field_types() {
        let device: CloudDevice = serde_json::from_value(json!({
            "devid": "dev-1",
            "name": "Venus E",
            "sn": "SN123",
            "version": 147,
            "soc": "87",
            "charge": 250.5,
            "discharge": null,
            "load": "bogus",
            "report_time": "1718000000"
        }))
        .unwrap();

        assert_eq!(device.version.as_deref(), Some("147"));
        assert_eq!(device.soc, Some(87.0));
        assert_eq!(device.charge, Some(250.5));
        assert_eq!(device.discharge, None);
        assert_eq!(device.load, None);
        assert_eq!(device.report_time, Some(1_718_000_000));
    }
}
