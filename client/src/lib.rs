//! Native client for the safe-route server: HTTP calls, a cancellable
//! calculation dispatcher polling with `tokio::time`, and configuration.

pub mod api;
pub mod config;
pub mod dispatch;
pub mod error;

pub use api::RouteClient;
pub use config::ClientConfig;
pub use dispatch::{Dispatcher, Outcome, RouteHandle};
pub use error::ClientError;
