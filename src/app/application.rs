//! Application - Board Wiring and Event Loop
//!
//! Builds the Redis-backed board from configuration, then pumps events until
//! Ctrl-C, republishing the table whenever it changes.

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use crate::constants::INGEST_INTERVAL_MS;
use crate::domain::AppConfig;
use crate::error::Result;
use crate::helpers::{ensure_parent_dir, expand_home};
use crate::services::{
    PumpReport, RetryConfig, StatusBoard, Supervisor, block_on, spawn_named_in_tokio,
};
use crate::transport::{RedisTransport, Transport};
use crate::view::HtmlRenderer;

/// Where the rendered table goes
#[derive(Debug, Clone)]
pub enum Output {
    /// Rewrite a standalone HTML page
    Snapshot(PathBuf),
    /// Print the `<tbody>` fragment to stdout
    Stdout,
}

impl Output {
    pub fn from_config(config: &AppConfig) -> Self {
        match &config.render.output {
            Some(path) => Output::Snapshot(expand_home(path)),
            None => Output::Stdout,
        }
    }
}

/// Renders the board's table to its output
pub struct Publisher {
    renderer: HtmlRenderer,
    output: Output,
}

impl Publisher {
    pub fn new(renderer: HtmlRenderer, output: Output) -> Result<Self> {
        if let Output::Snapshot(path) = &output {
            ensure_parent_dir(path)?;
        }
        Ok(Self { renderer, output })
    }

    /// Render the current table; failures are logged, never fatal
    pub fn publish<T: Transport>(&self, board: &StatusBoard<T>) {
        match &self.output {
            Output::Snapshot(path) => {
                if let Err(e) = self.renderer.write_snapshot(board.view(), path) {
                    tracing::error!("Failed to write snapshot {}: {}", path.display(), e);
                }
            }
            Output::Stdout => {
                let mut stdout = std::io::stdout().lock();
                let _ = writeln!(stdout, "{}", self.renderer.render_tbody(board.view()));
            }
        }
    }
}

/// Handle one batch and republish if the table changed
pub fn drive_once<T: Transport>(
    board: &mut StatusBoard<T>,
    publisher: &Publisher,
    wait: Duration,
) -> PumpReport {
    let report = board.pump(wait);
    if report.table_changed {
        tracing::debug!(
            "Table updated: {} rows after {} events",
            board.view().len(),
            report.handled
        );
        publisher.publish(board);
    }
    report
}

/// Run the status board until Ctrl-C
pub fn run_app(config: AppConfig) -> Result<()> {
    let transport = RedisTransport::new(&config.server, &config.retry);
    let supervisor = Supervisor::new(transport.name(), RetryConfig::from(&config.retry));
    let mut board = StatusBoard::new(transport, config.channel.clone());
    let publisher = Publisher::new(HtmlRenderer::new(&config.render), Output::from_config(&config))?;

    tracing::info!(
        "Subscribing to {} on {} ({})",
        config.channel.topic,
        config.server.display_name(),
        config.channel.event
    );

    publisher.publish(&board);
    block_on(board.start_supervised(&supervisor))?;

    let shutdown = Arc::new(AtomicBool::new(false));
    let flag = shutdown.clone();
    spawn_named_in_tokio("ctrl-c", async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Shutdown requested");
            flag.store(true, Ordering::SeqCst);
        }
    });

    let wait = Duration::from_millis(INGEST_INTERVAL_MS);
    while !shutdown.load(Ordering::SeqCst) {
        drive_once(&mut board, &publisher, wait);
    }

    let stats = board.stats();
    tracing::info!(
        "Processed {} events ({} applied, {} dropped, {} ignored)",
        stats.received + stats.ignored,
        stats.applied,
        stats.dropped,
        stats.ignored
    );
    block_on(board.stop())
}
