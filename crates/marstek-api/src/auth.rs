// Marstek Cloud authentication
//
// Token-based login: the vendor requires the password as an MD5 hex
// digest in the query string. That hash is a transport encoding the
// vendor mandates, not a secrecy measure -- always use HTTPS.

use std::fmt::Write as _;

use md5::{Digest, Md5};
use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, warn};

use crate::client::{decode_body, CloudClient, LOGIN_PATH};
use crate::error::Error;
use crate::models::{LoginResponse, LOGIN_SUCCESS_CODE, RATE_LIMIT_CODE};

/// The vendor's required password transport encoding: lowercase MD5 hex.
pub fn hash_password(password: &SecretString) -> String {
    let digest = Md5::digest(password.expose_secret().as_bytes());
    let mut out = String::with_capacity(32);
    for byte in digest {
        let _ = write!(out, "{byte:02x}");
    }
    out
}

impl CloudClient {
    /// Authenticate and obtain a fresh API token.
    ///
    /// Rejected credentials surface as [`Error::Authentication`] -- that
    /// class is fatal and must not be retried. Server-side instability
    /// during login maps to transient errors instead.
    pub async fn login(&self, email: &str, password: &SecretString) -> Result<SecretString, Error> {
        let url = self.endpoint_url(LOGIN_PATH)?;
        debug!("logging in at {}", url);

        let resp = self
            .http()
            .post(url)
            .query(&[("pwd", hash_password(password).as_str()), ("mailbox", email)])
            .send()
            .await
            .map_err(Error::Transport)?;

        let status = resp.status();
        if !status.is_success() {
            if status.is_server_error() {
                return Err(Error::Api {
                    code: status.as_u16().to_string(),
                    message: "login failed with server error".into(),
                });
            }
            return Err(Error::Authentication {
                message: format!("login failed (HTTP {status})"),
            });
        }

        let envelope: LoginResponse = decode_body(resp).await?;

        // A token means success regardless of what `code` says.
        if let Some(token) = envelope.token {
            if let Some(code) = &envelope.code {
                if code.as_str() != LOGIN_SUCCESS_CODE {
                    warn!(%code, "login returned a token with an unexpected status code");
                }
            }
            debug!("obtained new API token");
            return Ok(SecretString::from(token));
        }

        match &envelope.code {
            Some(code) if code.as_str() == RATE_LIMIT_CODE => Err(Error::RateLimited),
            code => Err(Error::Authentication {
                message: envelope.msg.unwrap_or_else(|| match code {
                    Some(code) => format!("login rejected (code {code})"),
                    None => "login response carried no token".into(),
                }),
            }),
        }
    }
}
