//! Connection Supervisor
//!
//! Tracks the transport connection state and computes exponential backoff for
//! connect attempts. Topic joins are never retried.

use crate::domain::RetrySettings;
use std::sync::atomic::{AtomicU8, AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Retry configuration for connect attempts
#[derive(Clone, Debug)]
pub struct RetryConfig {
    /// Initial delay before first retry
    pub initial_delay: Duration,
    /// Maximum delay between retries
    pub max_delay: Duration,
    /// Multiplier for exponential backoff
    pub multiplier: f64,
    /// Jitter factor (0.0 - 1.0) to randomize delays
    pub jitter: f64,
    /// Maximum number of retry attempts (0 = unlimited)
    pub max_attempts: u32,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self::from(&RetrySettings::default())
    }
}

impl From<&RetrySettings> for RetryConfig {
    fn from(settings: &RetrySettings) -> Self {
        Self {
            initial_delay: Duration::from_millis(settings.initial_delay_ms),
            max_delay: Duration::from_millis(settings.max_delay_ms),
            multiplier: settings.multiplier,
            jitter: settings.jitter.clamp(0.0, 1.0),
            max_attempts: settings.max_attempts,
        }
    }
}

/// Connection state of a transport
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConnectionState {
    /// Not connected, not trying to connect
    Disconnected = 0,
    /// Attempting to connect
    Connecting = 1,
    /// Successfully connected
    Connected = 2,
    /// Waiting before next retry attempt
    Backoff = 3,
}

/// Supervisor for a transport connection
pub struct Supervisor {
    /// Transport name (for logging)
    service_name: Arc<str>,
    config: RetryConfig,
    state: AtomicU8,
    attempt: AtomicU32,
}

impl Supervisor {
    pub fn new(service_name: impl Into<Arc<str>>, config: RetryConfig) -> Self {
        Self {
            service_name: service_name.into(),
            config,
            state: AtomicU8::new(ConnectionState::Disconnected as u8),
            attempt: AtomicU32::new(0),
        }
    }

    /// Get the current connection state
    pub fn state(&self) -> ConnectionState {
        match self.state.load(Ordering::SeqCst) {
            0 => ConnectionState::Disconnected,
            1 => ConnectionState::Connecting,
            2 => ConnectionState::Connected,
            _ => ConnectionState::Backoff,
        }
    }

    fn set_state(&self, state: ConnectionState) {
        self.state.store(state as u8, Ordering::SeqCst);
    }

    /// Mark a connect attempt as started
    pub fn on_connecting(&self) {
        self.set_state(ConnectionState::Connecting);
        tracing::debug!("{}: Connecting", self.service_name);
    }

    /// Mark connection as successful
    pub fn on_connected(&self) {
        self.attempt.store(0, Ordering::SeqCst);
        self.set_state(ConnectionState::Connected);
        tracing::info!("{}: Connected", self.service_name);
    }

    /// Mark connection as lost
    pub fn on_disconnected(&self, reason: &str) {
        self.set_state(ConnectionState::Disconnected);
        tracing::warn!("{}: Disconnected - {}", self.service_name, reason);
    }

    /// Calculate the next retry delay, or `None` once attempts are exhausted
    pub fn next_retry_delay(&self) -> Option<Duration> {
        let attempt = self.attempt.fetch_add(1, Ordering::SeqCst) + 1;

        if self.config.max_attempts > 0 && attempt > self.config.max_attempts {
            self.set_state(ConnectionState::Disconnected);
            tracing::error!(
                "{}: Giving up after {} attempts",
                self.service_name,
                self.config.max_attempts
            );
            return None;
        }

        let base_delay = self.config.initial_delay.as_millis() as f64
            * self.config.multiplier.powi((attempt - 1) as i32);
        let capped_delay = base_delay.min(self.config.max_delay.as_millis() as f64);

        let jitter_range = capped_delay * self.config.jitter;
        let jitter = (rand_jitter() * 2.0 - 1.0) * jitter_range;
        let delay = Duration::from_millis((capped_delay + jitter).max(0.0) as u64);

        self.set_state(ConnectionState::Backoff);
        tracing::info!(
            "{}: Reconnecting in {}ms (attempt {}/{})",
            self.service_name,
            delay.as_millis(),
            attempt,
            if self.config.max_attempts == 0 {
                "unlimited".to_string()
            } else {
                self.config.max_attempts.to_string()
            }
        );

        Some(delay)
    }

    /// Get current attempt count
    pub fn attempt_count(&self) -> u32 {
        self.attempt.load(Ordering::SeqCst)
    }

    pub fn service_name(&self) -> &str {
        &self.service_name
    }
}

/// Pseudo-random jitter in 0.0 - 1.0 from the clock's sub-second nanos
fn rand_jitter() -> f64 {
    use std::time::SystemTime;
    let nanos = SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .map(|d| d.subsec_nanos())
        .unwrap_or(0);
    (nanos % 1000) as f64 / 1000.0
}

impl std::fmt::Debug for Supervisor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Supervisor")
            .field("service", &self.service_name)
            .field("state", &self.state())
            .field("attempt", &self.attempt_count())
            .finish()
    }
}
