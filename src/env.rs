//! Environment variable names read by [`crate::config::AppConfig`].
//!
//! These are purely helpers; the store and scheduler types remain
//! decoupled from environment access.

/// Store connection string; the scheme selects the backend (required).
pub const STORE_URI_ENV: &str = "LOG_PUSHER_STORE_URI";

/// Database name override for MongoDB.
pub const DATABASE_ENV: &str = "LOG_PUSHER_DATABASE";

/// Target collection (MongoDB) or index (OpenSearch).
pub const COLLECTION_ENV: &str = "LOG_PUSHER_COLLECTION";

/// Liveness server bind host.
pub const HOST_ENV: &str = "LOG_PUSHER_HOST";

/// Liveness server bind port.
pub const PORT_ENV: &str = "LOG_PUSHER_PORT";

/// Seconds between two pushes.
pub const INTERVAL_SECS_ENV: &str = "LOG_PUSHER_INTERVAL_SECS";

/// Upper bound in seconds on a single batch write.
pub const WRITE_TIMEOUT_SECS_ENV: &str = "LOG_PUSHER_WRITE_TIMEOUT_SECS";

/// Actor the pushed records are attributed to.
pub const USERNAME_ENV: &str = "LOG_PUSHER_USERNAME";

/// Tracing filter, used when `RUST_LOG` is not set.
pub const LOG_LEVEL_ENV: &str = "LOG_LEVEL";
