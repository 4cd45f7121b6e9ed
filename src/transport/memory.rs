//! In-process Transport
//!
//! A pub/sub bus living in the same process. Used by tests and by hosts that
//! already receive payloads some other way and only need the board.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use ahash::{AHashMap, AHashSet};
use crossbeam_channel::{Receiver, Sender};
use futures::future::{self, BoxFuture, FutureExt};
use serde_json::{Value, json};

use crate::error::{Error, Result};
use crate::transport::{JoinReply, Transport, TransportEvent};

#[derive(Default)]
struct Topics {
    joined: AHashSet<Arc<str>>,
    rejected: AHashMap<Arc<str>, String>,
}

struct Inner {
    connected: AtomicBool,
    topics: Mutex<Topics>,
    tx: Sender<TransportEvent>,
    rx: Receiver<TransportEvent>,
}

/// Cloneable in-process transport; clones share the same bus
#[derive(Clone)]
pub struct MemoryTransport {
    inner: Arc<Inner>,
}

impl MemoryTransport {
    pub fn new() -> Self {
        let (tx, rx) = crossbeam_channel::unbounded();
        Self {
            inner: Arc::new(Inner {
                connected: AtomicBool::new(false),
                topics: Mutex::new(Topics::default()),
                tx,
                rx,
            }),
        }
    }

    fn topics(&self) -> MutexGuard<'_, Topics> {
        // State is plain sets; a poisoned lock is still consistent.
        self.inner
            .topics
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn ensure_connected(&self) -> Result<()> {
        if self.is_connected() {
            Ok(())
        } else {
            Err(Error::Connection {
                message: "memory transport is not connected".to_string(),
            })
        }
    }

    /// Make later joins of `topic` fail with `reason`
    pub fn reject_topic(&self, topic: &str, reason: impl Into<String>) {
        self.topics().rejected.insert(topic.into(), reason.into());
    }

    /// Publish a message. Returns whether it was delivered (topic joined).
    pub fn publish(&self, topic: &str, event: &str, payload: Value) -> Result<bool> {
        self.ensure_connected()?;

        if !self.topics().joined.contains(topic) {
            tracing::trace!("Dropping {event} on unjoined topic {topic}");
            return Ok(false);
        }

        self.inner
            .tx
            .send(TransportEvent::Message {
                topic: topic.into(),
                event: event.into(),
                payload,
            })
            .map_err(|e| Error::ChannelSend {
                message: e.to_string(),
            })?;
        Ok(true)
    }

    /// Report a connection drop to subscribers
    pub fn drop_connection(&self, detail: &str) {
        self.inner.connected.store(false, Ordering::SeqCst);
        let _ = self.inner.tx.send(TransportEvent::ConnectionState {
            connected: false,
            detail: detail.into(),
        });
    }

    pub fn is_connected(&self) -> bool {
        self.inner.connected.load(Ordering::SeqCst)
    }

    pub fn is_joined(&self, topic: &str) -> bool {
        self.topics().joined.contains(topic)
    }
}

impl Default for MemoryTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for MemoryTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryTransport")
            .field("connected", &self.is_connected())
            .field("pending", &self.inner.rx.len())
            .finish()
    }
}

impl Transport for MemoryTransport {
    fn name(&self) -> &str {
        "memory"
    }

    fn connect(&self) -> BoxFuture<'_, Result<()>> {
        self.inner.connected.store(true, Ordering::SeqCst);
        let _ = self.inner.tx.send(TransportEvent::ConnectionState {
            connected: true,
            detail: "Connected".into(),
        });
        future::ready(Ok(())).boxed()
    }

    fn join<'a>(&'a self, topic: &'a str) -> BoxFuture<'a, Result<JoinReply>> {
        let result = self.ensure_connected().and_then(|()| {
            let mut topics = self.topics();
            if let Some(reason) = topics.rejected.get(topic) {
                return Err(Error::Join {
                    topic: topic.to_string(),
                    reason: reason.clone(),
                });
            }
            topics.joined.insert(topic.into());
            Ok(JoinReply::new(topic, json!({})))
        });
        future::ready(result).boxed()
    }

    fn leave<'a>(&'a self, topic: &'a str) -> BoxFuture<'a, Result<()>> {
        self.topics().joined.remove(topic);
        future::ready(Ok(())).boxed()
    }

    fn disconnect(&self) -> BoxFuture<'_, Result<()>> {
        self.topics().joined.clear();
        self.inner.connected.store(false, Ordering::SeqCst);
        future::ready(Ok(())).boxed()
    }

    fn events(&self) -> Receiver<TransportEvent> {
        self.inner.rx.clone()
    }
}
