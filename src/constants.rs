//! Board Constants
//!
//! Wire names, rendering identifiers, and tuning values shared across the crate.

/// Topic the board joins by default
pub const DEFAULT_TOPIC: &str = "checks:all";

/// Event name carrying alert payloads
pub const DEFAULT_EVENT: &str = "event";

/// Container id of the rendered table body
pub const TABLE_CONTAINER_ID: &str = "alerts";

/// Prefix for per-row identifiers (`alert-<id>`)
pub const ROW_ID_PREFIX: &str = "alert-";

/// Diagnostics ring buffer capacity
pub const DIAGNOSTICS_CAPACITY: usize = 200;

/// Batch processing thresholds
pub const INGEST_BATCH_SIZE: usize = 2048;
pub const INGEST_INTERVAL_MS: u64 = 100;

/// Retry configuration
pub const RETRY_INITIAL_DELAY_MS: u64 = 1000;
pub const RETRY_MAX_DELAY_MS: u64 = 60000;
pub const RETRY_MULTIPLIER: f64 = 2.0;
pub const RETRY_JITTER: f64 = 0.1;

/// Snapshot page refresh interval
pub const SNAPSHOT_REFRESH_SECS: u32 = 5;
