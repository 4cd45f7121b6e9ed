//! Status Board
//!
//! Owns the injected transport and the status table. Joins the configured
//! topic, then drains transport events in batches and applies each alert
//! payload to the table in arrival order. Handling never fails: bad payloads
//! are logged, recorded, and dropped.

use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError};
use serde_json::Value;

use crate::constants::INGEST_BATCH_SIZE;
use crate::domain::{AlertEvent, ChannelConfig};
use crate::error::{Error, Result};
use crate::services::{DiagnosticKind, Diagnostics, Supervisor};
use crate::transport::{JoinReply, Transport, TransportEvent};
use crate::view::{RowChange, StatusTableView};

/// Outcome of joining the topic
#[derive(Clone, Debug, PartialEq)]
pub enum JoinStatus {
    Pending,
    Joined(JoinReply),
    Failed(String),
}

/// Event counters
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BoardStats {
    /// Payloads received for the subscribed event
    pub received: u64,
    /// Payloads applied to the table
    pub applied: u64,
    /// Payloads dropped as malformed
    pub dropped: u64,
    /// Messages for other topics or events
    pub ignored: u64,
}

/// Result of one [`StatusBoard::pump`] call
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PumpReport {
    /// Transport events handled
    pub handled: usize,
    /// Whether any row was created or changed
    pub table_changed: bool,
}

/// Live board: transport subscription feeding a [`StatusTableView`]
pub struct StatusBoard<T: Transport> {
    transport: T,
    channel: ChannelConfig,
    rx: Receiver<TransportEvent>,
    view: StatusTableView,
    join_status: JoinStatus,
    stats: BoardStats,
    diagnostics: Diagnostics,
}

impl<T: Transport> StatusBoard<T> {
    pub fn new(transport: T, channel: ChannelConfig) -> Self {
        let rx = transport.events();
        Self {
            transport,
            channel,
            rx,
            view: StatusTableView::new(),
            join_status: JoinStatus::Pending,
            stats: BoardStats::default(),
            diagnostics: Diagnostics::default(),
        }
    }

    /// Connect and join the topic
    ///
    /// Only a connection failure is returned; a rejected join is logged and
    /// kept in [`Self::join_status`].
    pub async fn start(&mut self) -> Result<()> {
        self.transport.connect().await?;
        self.join().await;
        Ok(())
    }

    /// Connect with supervised backoff, then join the topic
    pub async fn start_supervised(&mut self, supervisor: &Supervisor) -> Result<()> {
        loop {
            supervisor.on_connecting();
            match self.transport.connect().await {
                Ok(()) => {
                    supervisor.on_connected();
                    break;
                }
                Err(e) => {
                    supervisor.on_disconnected(&e.to_string());
                    match supervisor.next_retry_delay() {
                        Some(delay) => tokio::time::sleep(delay).await,
                        None => return Err(e),
                    }
                }
            }
        }
        self.join().await;
        Ok(())
    }

    async fn join(&mut self) {
        let topic = self.channel.topic.clone();
        match self.transport.join(&topic).await {
            Ok(reply) => {
                tracing::info!(
                    "Joined successfully: topic={} join_ref={} response={}",
                    reply.topic,
                    reply.join_ref,
                    reply.response
                );
                self.join_status = JoinStatus::Joined(reply);
            }
            Err(e) => {
                let reason = match e {
                    Error::Join { reason, .. } => reason,
                    other => other.to_string(),
                };
                tracing::error!("Unable to join {}: {}", topic, reason);
                self.diagnostics
                    .record(DiagnosticKind::JoinFailed, format!("{topic}: {reason}"));
                self.join_status = JoinStatus::Failed(reason);
            }
        }
    }

    /// Leave the topic if joined, then disconnect
    pub async fn stop(&mut self) -> Result<()> {
        if matches!(self.join_status, JoinStatus::Joined(_)) {
            self.transport.leave(&self.channel.topic).await?;
            self.join_status = JoinStatus::Pending;
        }
        self.transport.disconnect().await?;
        tracing::info!("Board stopped ({} rows)", self.view.len());
        Ok(())
    }

    /// Wait up to `timeout` for events, then handle one batch
    pub fn pump(&mut self, timeout: Duration) -> PumpReport {
        let mut report = PumpReport::default();

        let first = match self.rx.recv_timeout(timeout) {
            Ok(event) => event,
            Err(RecvTimeoutError::Timeout) => return report,
            Err(RecvTimeoutError::Disconnected) => {
                tracing::trace!("Transport event channel closed");
                return report;
            }
        };

        let mut batch = Vec::with_capacity(64);
        batch.push(first);
        while batch.len() < INGEST_BATCH_SIZE {
            match self.rx.try_recv() {
                Ok(event) => batch.push(event),
                Err(_) => break,
            }
        }

        for event in batch {
            report.table_changed |= self.handle(event);
            report.handled += 1;
        }
        report
    }

    /// Handle a single transport event. Returns whether the table changed.
    pub fn handle(&mut self, event: TransportEvent) -> bool {
        match event {
            TransportEvent::Message { topic, event, payload } => {
                if *topic != *self.channel.topic || *event != *self.channel.event {
                    tracing::trace!("Ignoring {} on {}", event, topic);
                    self.stats.ignored += 1;
                    return false;
                }
                self.stats.received += 1;
                self.apply_payload(&payload)
            }

            TransportEvent::ConnectionState { connected, detail } => {
                if connected {
                    tracing::info!("{}: connected ({})", self.transport.name(), detail);
                } else {
                    tracing::warn!("{}: disconnected ({})", self.transport.name(), detail);
                    self.diagnostics
                        .record(DiagnosticKind::Disconnected, detail.to_string());
                }
                false
            }
        }
    }

    fn apply_payload(&mut self, payload: &Value) -> bool {
        tracing::debug!("Received payload: {}", payload);

        let event = match AlertEvent::from_payload(payload) {
            Ok(event) => event,
            Err(e) => {
                tracing::warn!("Dropping event: {}", e);
                self.diagnostics
                    .record(DiagnosticKind::MalformedEvent, e.to_string());
                self.stats.dropped += 1;
                return false;
            }
        };

        let outcome = self.view.apply_event(&event);
        self.stats.applied += 1;

        if outcome.change == RowChange::Inserted {
            tracing::debug!("New row for alert {}", event.alert_id);
        }
        if let Some(warning) = outcome.warning {
            tracing::warn!("Alert {}: {}", event.alert_id, warning);
            self.diagnostics.record(
                DiagnosticKind::UnknownStatus,
                format!("alert {}: {}", event.alert_id, warning),
            );
        }
        true
    }

    pub fn view(&self) -> &StatusTableView {
        &self.view
    }

    pub fn join_status(&self) -> &JoinStatus {
        &self.join_status
    }

    pub fn stats(&self) -> BoardStats {
        self.stats
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn channel(&self) -> &ChannelConfig {
        &self.channel
    }
}

impl<T: Transport> std::fmt::Debug for StatusBoard<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StatusBoard")
            .field("transport", &self.transport.name())
            .field("topic", &self.channel.topic)
            .field("rows", &self.view.len())
            .field("join_status", &self.join_status)
            .field("stats", &self.stats)
            .finish()
    }
}
