//! Poll-loop building blocks: token lifecycle, snapshot cache, circuit
//! breaker, and the adaptive interval controller.
//!
//! Each piece is a plain state machine taking explicit `Instant`s so its
//! behavior is testable without a clock; the coordinator wires them
//! together.

pub mod breaker;
pub mod cache;
pub mod interval;
pub mod token;

pub use breaker::{BreakerState, CircuitBreaker};
pub use cache::{CacheEntry, SnapshotCache};
pub use interval::AdaptiveInterval;
pub use token::TokenManager;
