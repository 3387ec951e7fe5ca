// marstek-api: Async Rust client for the Marstek Cloud vendor API.

pub mod auth;
pub mod client;
pub mod error;
pub mod models;
pub mod transport;

pub use client::CloudClient;
pub use error::Error;
pub use models::{ApiCode, CloudDevice};
pub use transport::TransportConfig;
