//! # Feast Client
//!
//! `feast-client` is a thin SDK over the Feast online serving gRPC API. It turns simple
//! key/value [`Row`]s into `GetOnlineFeaturesV2` requests and reshapes the responses back
//! into rows, keeping the per-field retrieval status.
//!
//! ## Key Components
//!
//! * **[`FeastClient`]:** The async client. It owns the (intercepted) transport and exposes
//!   the `GetFeastServingInfo` and `GetOnlineFeaturesV2` calls.
//! * **[`BlockingFeastClient`]:** A synchronous facade over [`FeastClient`] backed by its own
//!   Tokio runtime, for callers that are not async.
//! * **[`Row`]:** The user-facing entity/feature row.
//! * **[`SecurityConfig`]:** Selects plaintext, system TLS or custom-certificate TLS, and the
//!   optional [`CallCredentials`] attached to every call.
//!
//! ## Example
//!
//! ```rust,no_run
//! use feast_client::{FeastClient, Row};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let client = FeastClient::create("localhost", 6566)?;
//!
//! let rows = vec![Row::create().set("driver_id", 123), Row::create().set("driver_id", 456)];
//! let features = ["driver:driver_id", "driver:driver_name"];
//!
//! for row in client.get_online_features(&features, &rows).await? {
//!     println!("{row}");
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Re-exports
//!
//! This crate re-exports `prost`, `prost-types`, and `tonic` to ensure that consumers
//! use compatible versions of these underlying dependencies.
pub mod blocking;
pub mod channel;
pub mod client;
pub mod credentials;
pub mod feature_ref;
pub mod interceptor;
pub mod proto;
pub mod row;
pub mod security;

pub use blocking::{BlockingClientError, BlockingFeastClient};
pub use channel::{ConfigError, TransportSecurity};
pub use client::{CHANNEL_SHUTDOWN_TIMEOUT, CallError, FeastClient};
pub use credentials::{BearerToken, CallCredentials};
pub use feature_ref::FeatureReference;
pub use interceptor::{TraceParent, with_trace_parent};
pub use row::{FieldStatus, Row, Value};
pub use security::SecurityConfig;

// Re-exports
pub use prost;
pub use prost_types;
pub use tonic;

/// Type alias for the standard boxed error used in generic bounds.
type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;
