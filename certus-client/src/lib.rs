//! CERTUS Client
//!
//! Glue between the sync layer and an application: configuration file
//! loading, tracing setup, toast notifications and the wallet session that
//! owns a user's stores.

pub mod config;
pub mod error;
pub mod notifications;
pub mod telemetry;
pub mod wallet;

pub use config::{ClientConfig, ConfigError, NotificationConfig, TelemetryConfig};
pub use error::{ClientError, ClientResult};
pub use notifications::{Notification, Toasts};
pub use telemetry::init_tracing;
pub use wallet::{LedgerTransport, WalletSession};
