//! Polling coordinator for the Marstek Cloud API.
//!
//! The cloud endpoint is slow, rate limited, and occasionally flaky, so
//! this crate never exposes a raw request path. Every read goes through
//! the [`Coordinator`], which owns the token lifecycle, a TTL'd snapshot
//! cache, a circuit breaker, and an adaptive poll interval.

pub mod config;
pub mod coordinator;
pub mod error;
pub mod model;
pub mod poll;

pub use config::{Credentials, PollerConfig};
pub use coordinator::{ConnectionStatus, Coordinator, Diagnostics, FetchOutcome, FetchSource};
pub use error::CoreError;
pub use model::{Device, DeviceSnapshot, MetricValue};
