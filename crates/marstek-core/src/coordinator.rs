// Fetch orchestrator.
//
// Single entry point for device data. Every read runs through `fetch`,
// which consults the breaker, the cache, and the token manager in that
// order, commits successful results, and degrades to stale data when
// the upstream misbehaves. A background loop drives scheduled polls at
// the adaptive cadence.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use marstek_api::{CloudClient, TransportConfig};

use crate::config::PollerConfig;
use crate::error::CoreError;
use crate::model::DeviceSnapshot;
use crate::poll::cache::CacheEntry;
use crate::poll::{AdaptiveInterval, BreakerState, CircuitBreaker, SnapshotCache, TokenManager};

/// Where the data in a [`FetchOutcome`] came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchSource {
    /// Fresh from the vendor API.
    Network,
    /// Served from the cache within its TTL.
    FreshCache,
    /// Cached data past its TTL, served because the fetch failed or the
    /// breaker is open.
    StaleFallback,
}

/// The result of one successful `fetch`.
#[derive(Debug, Clone)]
pub struct FetchOutcome {
    pub snapshot: Arc<DeviceSnapshot>,
    /// Wall-clock time the snapshot was committed to the cache.
    pub fetched_at: DateTime<Utc>,
    /// Device-call latency; `None` when served from cache.
    pub latency: Option<Duration>,
    pub source: FetchSource,
}

/// Consumer-visible connection health.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionStatus {
    /// No fetch has completed yet.
    Idle,
    /// The last fetch reached the vendor and succeeded.
    Connected,
    /// Serving stale data after a failure.
    Degraded,
    /// The circuit breaker is suppressing calls.
    BreakerOpen,
    /// Credentials or permissions were rejected.
    AuthFailed,
}

/// Snapshot of coordinator health, published on a watch channel.
#[derive(Debug, Clone)]
pub struct Diagnostics {
    pub last_update: Option<DateTime<Utc>>,
    pub api_latency_ms: Option<f64>,
    pub connection_status: ConnectionStatus,
}

impl Default for Diagnostics {
    fn default() -> Self {
        Self {
            last_update: None,
            api_latency_ms: None,
            connection_status: ConnectionStatus::Idle,
        }
    }
}

// State the fetch path mutates. One tokio Mutex serializes fetches, so
// a manual refresh racing a scheduled tick queues behind it and then
// gets absorbed by the fresh-cache check instead of hitting the
// network twice.
struct FetchState {
    tokens: TokenManager,
    breaker: CircuitBreaker,
    interval: AdaptiveInterval,
}

struct CoordinatorInner {
    config: PollerConfig,
    client: CloudClient,
    cache: SnapshotCache,
    fetch_state: Mutex<FetchState>,
    diagnostics: watch::Sender<Diagnostics>,
    cancel: CancellationToken,
    poll_handle: Mutex<Option<JoinHandle<()>>>,
}

/// Cloud polling coordinator. Cheap to clone; all clones share state.
#[derive(Clone)]
pub struct Coordinator {
    inner: Arc<CoordinatorInner>,
}

impl Coordinator {
    pub fn new(config: PollerConfig) -> Result<Self, CoreError> {
        config.validate()?;

        let transport = TransportConfig {
            connect_timeout: config.connect_timeout,
            timeout: config.request_timeout,
        };
        let client = CloudClient::new(config.base_url.clone(), &transport)?;

        let fetch_state = FetchState {
            tokens: TokenManager::new(config.token_ttl, config.token_refresh_buffer),
            breaker: CircuitBreaker::new(config.breaker_threshold, config.breaker_cooldown),
            interval: AdaptiveInterval::new(
                config.base_interval,
                config.adaptive_min,
                config.adaptive_max,
            ),
        };
        let (diagnostics, _) = watch::channel(Diagnostics::default());

        Ok(Self {
            inner: Arc::new(CoordinatorInner {
                cache: SnapshotCache::new(config.cache_ttl),
                config,
                client,
                fetch_state: Mutex::new(fetch_state),
                diagnostics,
                cancel: CancellationToken::new(),
                poll_handle: Mutex::new(None),
            }),
        })
    }

    pub fn config(&self) -> &PollerConfig {
        &self.inner.config
    }

    /// Current diagnostics.
    pub fn diagnostics(&self) -> Diagnostics {
        self.inner.diagnostics.borrow().clone()
    }

    /// Subscribe to diagnostics updates.
    pub fn subscribe_diagnostics(&self) -> watch::Receiver<Diagnostics> {
        self.inner.diagnostics.subscribe()
    }

    /// The most recent snapshot regardless of age, without any I/O.
    pub fn latest(&self) -> Option<Arc<DeviceSnapshot>> {
        self.inner.cache.force_get().map(|e| Arc::clone(&e.snapshot))
    }

    /// The delay before the next scheduled poll.
    pub async fn next_interval(&self) -> Duration {
        self.inner.fetch_state.lock().await.interval.next_interval()
    }

    /// Fetch device data: cached when fresh, from the network otherwise,
    /// stale as a last resort.
    pub async fn fetch(&self) -> Result<FetchOutcome, CoreError> {
        let mut state = self.inner.fetch_state.lock().await;
        let now = Instant::now();

        if !state.breaker.allow_call(now) {
            debug!("circuit breaker open, suppressing vendor call");
            self.publish(|d| d.connection_status = ConnectionStatus::BreakerOpen);
            return match self.inner.cache.force_get() {
                Some(entry) => Ok(outcome_from_entry(&entry, FetchSource::StaleFallback)),
                None => Err(CoreError::NoData {
                    reason: "circuit breaker open and no snapshot cached".into(),
                }),
            };
        }

        // A fresh entry short-circuits the network. This is also how a
        // caller that queued behind an in-flight fetch joins its result.
        if let Some(entry) = self.inner.cache.get(now) {
            debug!("serving cached snapshot");
            state.interval.on_fetch_result(false);
            return Ok(outcome_from_entry(&entry, FetchSource::FreshCache));
        }

        match self.fetch_remote(&mut state, now).await {
            Ok(outcome) => Ok(outcome),
            Err(err) => self.recover(&mut state, now, err),
        }
    }

    async fn fetch_remote(
        &self,
        state: &mut FetchState,
        now: Instant,
    ) -> Result<FetchOutcome, CoreError> {
        let credentials = &self.inner.config.credentials;
        let token = state
            .tokens
            .ensure_token(&self.inner.client, credentials, now)
            .await?;

        let started = Instant::now();
        let result = match self.inner.client.get_devices(&token).await {
            Err(err) if err.is_invalid_token() => {
                warn!(code = err.api_error_code(), "token rejected, refreshing and retrying once");
                state.tokens.invalidate();
                let token = state
                    .tokens
                    .ensure_token(&self.inner.client, credentials, Instant::now())
                    .await?;
                self.inner.client.get_devices(&token).await
            }
            other => other,
        };

        let raw = result.map_err(CoreError::from)?;
        let latency = started.elapsed();

        let snapshot = DeviceSnapshot::from_cloud(raw);
        let (snapshot, changed) = self.inner.cache.put(snapshot, Instant::now());
        state.breaker.record_success();
        state.interval.on_fetch_result(changed);

        let fetched_at = Utc::now();
        debug!(
            devices = snapshot.len(),
            changed,
            latency_ms = latency.as_millis(),
            "fetch complete"
        );
        self.publish(|d| {
            d.last_update = Some(fetched_at);
            d.api_latency_ms = Some(latency.as_secs_f64() * 1000.0);
            d.connection_status = ConnectionStatus::Connected;
        });

        Ok(FetchOutcome {
            snapshot,
            fetched_at,
            latency: Some(latency),
            source: FetchSource::Network,
        })
    }

    /// Degrade a failed fetch: fatal errors surface immediately, while
    /// transient ones feed the breaker and fall back to stale data.
    fn recover(
        &self,
        state: &mut FetchState,
        now: Instant,
        err: CoreError,
    ) -> Result<FetchOutcome, CoreError> {
        match &err {
            CoreError::Permission { .. } => {
                // Not a breaker matter: the vendor answered, it just said no.
                state.tokens.invalidate();
                warn!(error = %err, "vendor denied access");
                match self.inner.cache.force_get() {
                    Some(entry) => {
                        self.publish(|d| d.connection_status = ConnectionStatus::Degraded);
                        Ok(outcome_from_entry(&entry, FetchSource::StaleFallback))
                    }
                    None => {
                        self.publish(|d| d.connection_status = ConnectionStatus::AuthFailed);
                        Err(err)
                    }
                }
            }
            CoreError::Authentication { .. } => {
                warn!(error = %err, "credentials rejected");
                self.publish(|d| d.connection_status = ConnectionStatus::AuthFailed);
                Err(err)
            }
            // Not upstream instability; surfaces without advancing the
            // failure counter.
            CoreError::Config { .. } => {
                warn!(error = %err, "fetch aborted by configuration problem");
                self.publish(|d| d.connection_status = ConnectionStatus::Degraded);
                Err(err)
            }
            _ => {
                state.breaker.record_failure(now);
                let failures = state.breaker.consecutive_failures();
                warn!(error = %err, failures, "fetch failed");

                let status = if state.breaker.state() == BreakerState::Open {
                    ConnectionStatus::BreakerOpen
                } else {
                    ConnectionStatus::Degraded
                };
                match self.inner.cache.force_get() {
                    Some(entry) => {
                        self.publish(|d| d.connection_status = status);
                        Ok(outcome_from_entry(&entry, FetchSource::StaleFallback))
                    }
                    None => {
                        self.publish(|d| d.connection_status = status);
                        Err(CoreError::NoData {
                            reason: err.to_string(),
                        })
                    }
                }
            }
        }
    }

    fn publish<F: FnOnce(&mut Diagnostics)>(&self, update: F) {
        self.inner.diagnostics.send_modify(update);
    }

    /// Start the background polling loop. Idempotent.
    pub async fn start(&self) {
        let mut guard = self.inner.poll_handle.lock().await;
        if guard.is_some() {
            return;
        }
        let coordinator = self.clone();
        let cancel = self.inner.cancel.clone();
        *guard = Some(tokio::spawn(poll_task(coordinator, cancel)));
        info!("polling loop started");
    }

    /// Stop the polling loop and wait for it to finish.
    pub async fn shutdown(&self) {
        self.inner.cancel.cancel();
        if let Some(handle) = self.inner.poll_handle.lock().await.take() {
            let _ = handle.await;
        }
        debug!("coordinator shut down");
    }
}

async fn poll_task(coordinator: Coordinator, cancel: CancellationToken) {
    loop {
        if let Err(err) = coordinator.fetch().await {
            warn!(error = %err, "scheduled fetch failed");
        }
        let delay = coordinator.next_interval().await;
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            () = tokio::time::sleep(delay) => {}
        }
    }
    debug!("polling loop stopped");
}

fn outcome_from_entry(entry: &CacheEntry, source: FetchSource) -> FetchOutcome {
    FetchOutcome {
        snapshot: Arc::clone(&entry.snapshot),
        fetched_at: entry.fetched_at_utc,
        latency: None,
        source,
    }
}
