//! Redis Pub/Sub Transport
//!
//! Joins topics by subscribing to the Redis channel of the same name. Every
//! message must be an [`Envelope`] encoded as JSON.
//!
//! The subscriber client reconnects on its own with the configured backoff and
//! re-subscribes to every joined channel. Drops and recoveries are reported as
//! [`TransportEvent::ConnectionState`].

use std::sync::Mutex;

use crossbeam_channel::{Receiver, Sender};
use fred::clients::SubscriberClient;
use fred::prelude::*;
use fred::types::Message;
use fred::types::config::{Server, ServerConfig as FredServerConfig};
use futures::future::{BoxFuture, FutureExt};
use serde_json::json;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;

use crate::domain::{RetrySettings, ServerConfig};
use crate::error::{Error, Result};
use crate::services::{TaskGuard, spawn_named_in_tokio};
use crate::transport::{Envelope, JoinReply, Transport, TransportEvent};

/// A live subscriber client and the tasks bound to it
struct Connection {
    client: SubscriberClient,
    _forwarder: TaskGuard,
    _subscriptions: TaskGuard,
}

/// Transport backed by Redis pub/sub
pub struct RedisTransport {
    config: ServerConfig,
    retry: RetrySettings,
    connection: Mutex<Option<Connection>>,
    tx: Sender<TransportEvent>,
    rx: Receiver<TransportEvent>,
}

impl RedisTransport {
    pub fn new(config: &ServerConfig, retry: &RetrySettings) -> Self {
        let (tx, rx) = crossbeam_channel::unbounded();
        Self {
            config: config.clone(),
            retry: retry.clone(),
            connection: Mutex::new(None),
            tx,
            rx,
        }
    }

    fn client(&self) -> Result<SubscriberClient> {
        self.connection
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .as_ref()
            .map(|connection| connection.client.clone())
            .ok_or_else(|| Error::Connection {
                message: format!("not connected to {}", self.config.display_name()),
            })
    }

    async fn open(&self) -> Result<()> {
        if let Err(e) = self.close().await {
            tracing::warn!("Failed to close previous Redis connection: {}", e);
        }

        tracing::info!("Connecting to Redis at {}", self.config.display_name());

        let timeout = self.config.timeout();
        let (max_attempts, min_delay, max_delay, mult) = backoff_params(&self.retry);
        let client = Builder::from_config(client_config(&self.config))
            .with_connection_config(|conn| {
                conn.connection_timeout = timeout;
            })
            .set_policy(ReconnectPolicy::new_exponential(
                max_attempts,
                min_delay,
                max_delay,
                mult,
            ))
            .build_subscriber_client()?;
        client.init().await?;

        let forwarder = spawn_named_in_tokio(
            "redis-message-forwarder",
            forward(
                client.message_rx(),
                client.error_rx(),
                client.reconnect_rx(),
                self.tx.clone(),
            ),
        );
        let subscriptions = client.manage_subscriptions();

        *self
            .connection
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(Connection {
            client,
            _forwarder: TaskGuard::new(forwarder),
            _subscriptions: TaskGuard::new(subscriptions),
        });

        let _ = self.tx.send(TransportEvent::ConnectionState {
            connected: true,
            detail: self.config.display_name().into(),
        });
        Ok(())
    }

    async fn subscribe(&self, topic: &str) -> Result<JoinReply> {
        let client = self.client()?;
        client.subscribe(topic).await.map_err(|e| Error::Join {
            topic: topic.to_string(),
            reason: e.to_string(),
        })?;
        Ok(JoinReply::new(
            topic,
            json!({ "server": self.config.display_name() }),
        ))
    }

    async fn unsubscribe(&self, topic: &str) -> Result<()> {
        let client = self.client()?;
        client.unsubscribe(topic).await?;
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        let connection = self
            .connection
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take();
        if let Some(connection) = connection {
            connection.client.quit().await?;
            tracing::info!("Disconnected from Redis");
        }
        Ok(())
    }
}

/// Build the client config directly so the password is never URL-parsed
fn client_config(server: &ServerConfig) -> Config {
    Config {
        server: FredServerConfig::new_centralized(server.host.clone(), server.port),
        password: server.password().map(str::to_string),
        ..Default::default()
    }
}

/// Reconnect policy arguments: attempts (0 = unlimited), min and max delay in
/// milliseconds, and the integral growth factor
fn backoff_params(retry: &RetrySettings) -> (u32, u32, u32, u32) {
    let min_delay = u32::try_from(retry.initial_delay_ms).unwrap_or(u32::MAX);
    let max_delay = u32::try_from(retry.max_delay_ms)
        .unwrap_or(u32::MAX)
        .max(min_delay);
    let mult = retry.multiplier.round().clamp(1.0, u32::MAX as f64) as u32;
    (retry.max_attempts, min_delay, max_delay, mult)
}

/// Connection lifecycle signals raised by the client
#[derive(Debug, Clone, PartialEq)]
enum ConnectionSignal {
    Lost(String),
    Restored(String),
    Closed,
}

fn connection_event(signal: ConnectionSignal) -> TransportEvent {
    match signal {
        ConnectionSignal::Lost(detail) => TransportEvent::ConnectionState {
            connected: false,
            detail: detail.into(),
        },
        ConnectionSignal::Restored(server) => TransportEvent::ConnectionState {
            connected: true,
            detail: format!("reconnected to {}", server).into(),
        },
        ConnectionSignal::Closed => TransportEvent::ConnectionState {
            connected: false,
            detail: "message stream closed".into(),
        },
    }
}

/// Forward messages and connection signals until the client goes away
async fn forward(
    mut messages: broadcast::Receiver<Message>,
    mut errors: broadcast::Receiver<(fred::error::Error, Option<Server>)>,
    mut reconnects: broadcast::Receiver<Server>,
    tx: Sender<TransportEvent>,
) {
    loop {
        let signal = tokio::select! {
            message = messages.recv() => match message {
                Ok(message) => {
                    if let Some(event) = decode_message(&message.channel, message.value.as_string()) {
                        if tx.send(event).is_err() {
                            break;
                        }
                    }
                    continue;
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!("Redis message stream lagged, {} messages skipped", skipped);
                    continue;
                }
                Err(RecvError::Closed) => ConnectionSignal::Closed,
            },
            error = errors.recv() => match error {
                Ok((error, server)) => {
                    tracing::warn!("Redis connection lost: {}", error);
                    let detail = match server {
                        Some(server) => format!("{}: {}", server, error),
                        None => error.to_string(),
                    };
                    ConnectionSignal::Lost(detail)
                }
                Err(RecvError::Lagged(_)) => continue,
                Err(RecvError::Closed) => ConnectionSignal::Closed,
            },
            server = reconnects.recv() => match server {
                Ok(server) => {
                    tracing::info!("Reconnected to Redis at {}", server);
                    ConnectionSignal::Restored(server.to_string())
                }
                Err(RecvError::Lagged(_)) => continue,
                Err(RecvError::Closed) => ConnectionSignal::Closed,
            },
        };

        let closed = signal == ConnectionSignal::Closed;
        if tx.send(connection_event(signal)).is_err() || closed {
            break;
        }
    }
}

/// Turn a raw pub/sub message into a transport event
fn decode_message(channel: &str, body: Option<String>) -> Option<TransportEvent> {
    let Some(body) = body else {
        tracing::warn!("Dropping non-text message on {}", channel);
        return None;
    };

    match serde_json::from_str::<Envelope>(&body) {
        Ok(envelope) => Some(envelope.into_event(channel)),
        Err(e) => {
            tracing::warn!("Dropping invalid envelope on {}: {}", channel, e);
            None
        }
    }
}

impl Transport for RedisTransport {
    fn name(&self) -> &str {
        "redis"
    }

    fn connect(&self) -> BoxFuture<'_, Result<()>> {
        self.open().boxed()
    }

    fn join<'a>(&'a self, topic: &'a str) -> BoxFuture<'a, Result<JoinReply>> {
        self.subscribe(topic).boxed()
    }

    fn leave<'a>(&'a self, topic: &'a str) -> BoxFuture<'a, Result<()>> {
        self.unsubscribe(topic).boxed()
    }

    fn disconnect(&self) -> BoxFuture<'_, Result<()>> {
        self.close().boxed()
    }

    fn events(&self) -> Receiver<TransportEvent> {
        self.rx.clone()
    }
}

impl std::fmt::Debug for RedisTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisTransport")
            .field("server", &self.config.display_name())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_message() {
        let event = decode_message(
            "checks:all",
            Some(r#"{"event":"event","payload":{"status":"warn"}}"#.to_string()),
        )
        .expect("event");

        assert_eq!(
            event,
            TransportEvent::Message {
                topic: "checks:all".into(),
                event: "event".into(),
                payload: json!({"status": "warn"}),
            }
        );
    }

    #[test]
    fn test_decode_message_drops_garbage() {
        assert!(decode_message("checks:all", Some("not json".to_string())).is_none());
        assert!(decode_message("checks:all", Some(r#"{"payload":{}}"#.to_string())).is_none());
        assert!(decode_message("checks:all", None).is_none());
    }

    #[test]
    fn test_client_config_keeps_reserved_password_characters() {
        for password in ["a/b", "x#y", "q?r", "p@ss:word%"] {
            let server = ServerConfig {
                host: "checks.internal".to_string(),
                port: 6380,
                password: Some(password.to_string()),
                ..Default::default()
            };
            let config = client_config(&server);

            assert_eq!(config.password.as_deref(), Some(password));
            match config.server {
                FredServerConfig::Centralized { server } => {
                    assert_eq!(&*server.host, "checks.internal");
                    assert_eq!(server.port, 6380);
                }
                other => panic!("expected a centralized server, got {:?}", other),
            }
        }
    }

    #[test]
    fn test_client_config_without_password() {
        let mut server = ServerConfig::default();
        assert_eq!(client_config(&server).password, None);

        server.password = Some(String::new());
        assert_eq!(client_config(&server).password, None);
    }

    #[test]
    fn test_backoff_params_follow_retry_settings() {
        let retry = RetrySettings {
            initial_delay_ms: 250,
            max_delay_ms: 8_000,
            multiplier: 2.0,
            jitter: 0.1,
            max_attempts: 0,
        };
        assert_eq!(backoff_params(&retry), (0, 250, 8_000, 2));

        let odd = RetrySettings {
            initial_delay_ms: 5_000,
            max_delay_ms: 1_000,
            multiplier: 0.5,
            jitter: 0.0,
            max_attempts: 3,
        };
        assert_eq!(backoff_params(&odd), (3, 5_000, 5_000, 1));
    }

    #[test]
    fn test_connection_signals_map_to_state_events() {
        assert_eq!(
            connection_event(ConnectionSignal::Lost("127.0.0.1:6379: connection reset".into())),
            TransportEvent::ConnectionState {
                connected: false,
                detail: "127.0.0.1:6379: connection reset".into(),
            }
        );
        assert_eq!(
            connection_event(ConnectionSignal::Restored("127.0.0.1:6379".into())),
            TransportEvent::ConnectionState {
                connected: true,
                detail: "reconnected to 127.0.0.1:6379".into(),
            }
        );
        assert!(matches!(
            connection_event(ConnectionSignal::Closed),
            TransportEvent::ConnectionState { connected: false, .. }
        ));
    }

    #[test]
    fn test_join_without_connection_fails() {
        let transport = RedisTransport::new(&ServerConfig::default(), &RetrySettings::default());
        let err = futures::executor::block_on(transport.join("checks:all")).expect_err("no client");
        assert!(matches!(err, Error::Connection { .. }));
    }

    #[test]
    fn test_disconnect_without_connection_is_noop() {
        let transport = RedisTransport::new(&ServerConfig::default(), &RetrySettings::default());
        futures::executor::block_on(transport.disconnect()).expect("nothing to close");
        assert!(transport.client().is_err());
    }
}
