// Marstek Cloud HTTP client
//
// Wraps `reqwest::Client` with vendor URL construction and envelope
// decoding. The login flow lives in `auth.rs`; this module owns the
// transport mechanics and the code-to-error classification.

use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::error::Error;
use crate::models::{
    ApiCode, CloudDevice, DeviceListResponse, DEVICES_SUCCESS_CODE, NO_ACCESS_CODE,
    RATE_LIMIT_CODE,
};

/// Default vendor cloud endpoint.
pub const DEFAULT_BASE_URL: &str = "https://eap.hememess.com";

/// Login endpoint path (vendor-fixed).
pub(crate) const LOGIN_PATH: &str = "app/Solar/v2_get_device.php";
/// Device-list endpoint path (vendor-fixed).
pub(crate) const DEVICES_PATH: &str = "ems/api/v1/getDeviceList";

/// Raw HTTP client for the Marstek Cloud API.
///
/// Stateless with respect to authentication: callers hold the token and
/// pass it into each call. Token lifecycle belongs to `marstek-core`.
pub struct CloudClient {
    http: reqwest::Client,
    base_url: Url,
}

impl CloudClient {
    /// Create a new client from a `TransportConfig`.
    pub fn new(base_url: Url, transport: &crate::transport::TransportConfig) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Ok(Self { http, base_url })
    }

    /// Create a client with a pre-built `reqwest::Client`.
    pub fn with_client(http: reqwest::Client, base_url: Url) -> Self {
        Self { http, base_url }
    }

    /// The vendor base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// The underlying HTTP client (for the login flow in `auth.rs`).
    pub(crate) fn http(&self) -> &reqwest::Client {
        &self.http
    }

    /// Build a full URL for a vendor endpoint path.
    pub(crate) fn endpoint_url(&self, path: &str) -> Result<Url, Error> {
        let base = self.base_url.as_str().trim_end_matches('/');
        Ok(Url::parse(&format!("{base}/{path}"))?)
    }

    /// Fetch the account's device list.
    ///
    /// The token goes in the query string (vendor contract). Non-success
    /// vendor codes map to typed errors; `-1`/`401`/`403` in particular
    /// become [`Error::InvalidToken`] so the caller can refresh and retry.
    pub async fn get_devices(&self, token: &SecretString) -> Result<Vec<CloudDevice>, Error> {
        let url = self.endpoint_url(DEVICES_PATH)?;
        debug!("GET {}", url);

        let resp = self
            .http
            .get(url)
            .query(&[("token", token.expose_secret())])
            .send()
            .await
            .map_err(Error::Transport)?;

        let envelope: DeviceListResponse = decode_body(resp).await?;

        if envelope.code.as_str() != DEVICES_SUCCESS_CODE {
            return Err(classify_device_code(&envelope.code, envelope.msg.as_deref()));
        }

        envelope.data.ok_or_else(|| Error::Deserialization {
            message: "success response without a data payload".into(),
            body: String::new(),
        })
    }
}

/// Decode an HTTP response body as JSON after status screening.
///
/// The vendor reports most failures through the in-band `code` field with
/// HTTP 200; real HTTP errors are surfaced as transport-level failures.
pub(crate) async fn decode_body<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, Error> {
    let status = resp.status();

    if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
        return Err(Error::InvalidToken {
            code: status.as_u16().to_string(),
        });
    }

    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(Error::Api {
            code: status.as_u16().to_string(),
            message: body.chars().take(200).collect(),
        });
    }

    let body = resp.text().await.map_err(Error::Transport)?;

    serde_json::from_str(&body).map_err(|e| {
        let preview: String = body.chars().take(200).collect();
        Error::Deserialization {
            message: format!("{e} (body preview: {preview:?})"),
            body,
        }
    })
}

/// Map a non-success device-list code to a typed error.
fn classify_device_code(code: &ApiCode, msg: Option<&str>) -> Error {
    if code.is_token_error() {
        return Error::InvalidToken {
            code: code.as_str().to_owned(),
        };
    }
    match code.as_str() {
        NO_ACCESS_CODE => Error::Permission {
            code: code.as_str().to_owned(),
        },
        RATE_LIMIT_CODE => Error::RateLimited,
        other => Error::Api {
            code: other.to_owned(),
            message: msg.unwrap_or("unknown error").to_owned(),
        },
    }
}
