// Token lifecycle.
//
// The vendor never reports a token lifetime, so expiry is assumed
// (`token_ttl`) and refresh happens a buffer ahead of it. A token the
// API rejects mid-flight is dropped via `invalidate` and the next
// `ensure_token` logs in again.

use std::time::{Duration, Instant};

use secrecy::SecretString;
use tracing::debug;

use marstek_api::CloudClient;

use crate::config::Credentials;
use crate::error::CoreError;

#[derive(Debug)]
struct Session {
    token: SecretString,
    issued_at: Instant,
}

#[derive(Debug)]
pub struct TokenManager {
    ttl: Duration,
    refresh_buffer: Duration,
    session: Option<Session>,
}

impl TokenManager {
    pub fn new(ttl: Duration, refresh_buffer: Duration) -> Self {
        Self {
            ttl,
            refresh_buffer,
            session: None,
        }
    }

    pub fn has_session(&self) -> bool {
        self.session.is_some()
    }

    fn needs_refresh(&self, now: Instant) -> bool {
        match &self.session {
            None => true,
            Some(session) => {
                let usable_for = self.ttl.saturating_sub(self.refresh_buffer);
                now.duration_since(session.issued_at) >= usable_for
            }
        }
    }

    /// A token valid at `now`, logging in if the session is missing or
    /// inside the refresh buffer. Login failures pass through the usual
    /// error mapping, so rejected credentials surface as fatal.
    pub async fn ensure_token(
        &mut self,
        client: &CloudClient,
        credentials: &Credentials,
        now: Instant,
    ) -> Result<SecretString, CoreError> {
        if !self.needs_refresh(now) {
            if let Some(session) = &self.session {
                return Ok(session.token.clone());
            }
        }

        debug!("session missing or near expiry, logging in");
        let token = client
            .login(&credentials.email, &credentials.password)
            .await?;
        self.session = Some(Session {
            token: token.clone(),
            issued_at: now,
        });
        Ok(token)
    }

    /// Drop the current session; the next `ensure_token` logs in again.
    pub fn invalidate(&mut self) {
        self.session = None;
        debug!("session invalidated");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manager_with_session(issued_at: Instant) -> TokenManager {
        let mut manager = TokenManager::new(Duration::from_secs(3600), Duration::from_secs(300));
        manager.session = Some(Session {
            token: SecretString::from("tok-123".to_string()),
            issued_at,
        });
        manager
    }

    #[test]
    fn fresh_session_is_reused() {
        let issued = Instant::now();
        let manager = manager_with_session(issued);
        assert!(!manager.needs_refresh(issued + Duration::from_secs(3299)));
    }

    #[test]
    fn refreshes_inside_the_buffer() {
        let issued = Instant::now();
        let manager = manager_with_session(issued);
        // ttl 3600 - buffer 300 = usable for 3300 seconds.
        assert!(manager.needs_refresh(issued + Duration::from_secs(3300)));
    }

    #[test]
    fn missing_session_needs_refresh() {
        let manager = TokenManager::new(Duration::from_secs(3600), Duration::from_secs(300));
        assert!(manager.needs_refresh(Instant::now()));
        assert!(!manager.has_session());
    }

    #[test]
    fn invalidate_drops_session() {
        let mut manager = manager_with_session(Instant::now());
        manager.invalidate();
        assert!(!manager.has_session());
    }
}
