//! Transport Layer
//!
//! Abstraction over the publish/subscribe transport that feeds the board.
//! Transports run their I/O wherever they like and hand events to the board
//! through a crossbeam channel.
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────────────────────────┐
//! │  Transport (memory / redis)   │  connect / join / leave / disconnect
//! └───────────────────────────────┘
//!                 │
//!                 ▼ TransportEvent (crossbeam)
//! ┌───────────────────────────────┐
//! │          StatusBoard          │  parse + apply_event
//! └───────────────────────────────┘
//!                 │
//!                 ▼
//! ┌───────────────────────────────┐
//! │        StatusTableView        │  row registry
//! └───────────────────────────────┘
//! ```

mod memory;
mod redis;

pub use memory::*;
pub use redis::*;

use std::sync::Arc;

use crossbeam_channel::Receiver;
use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Result;

/// Server acknowledgement of a topic join
#[derive(Clone, Debug, PartialEq)]
pub struct JoinReply {
    /// Joined topic
    pub topic: Arc<str>,
    /// Reference of this join, unique per join
    pub join_ref: Arc<str>,
    /// Reply body sent by the server, if any
    pub response: Value,
}

impl JoinReply {
    pub fn new(topic: &str, response: Value) -> Self {
        Self {
            topic: topic.into(),
            join_ref: uuid::Uuid::now_v7().to_string().into(),
            response,
        }
    }
}

/// Events delivered by a transport
#[derive(Clone, Debug, PartialEq)]
pub enum TransportEvent {
    /// A message published on a joined topic
    Message {
        topic: Arc<str>,
        event: Arc<str>,
        payload: Value,
    },

    /// Connection state changed
    ConnectionState {
        connected: bool,
        /// Additional detail (e.g., "message stream closed")
        detail: Arc<str>,
    },
}

/// Message envelope carried over pub/sub systems without native event names
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Envelope {
    pub event: String,
    #[serde(default)]
    pub payload: Value,
}

impl Envelope {
    /// Decode an envelope received on `topic`
    pub fn into_event(self, topic: &str) -> TransportEvent {
        TransportEvent::Message {
            topic: topic.into(),
            event: self.event.into(),
            payload: self.payload,
        }
    }
}

/// A publish/subscribe transport
///
/// Methods return boxed futures so the board can hold a `Box<dyn Transport>`.
pub trait Transport: Send + Sync {
    /// Short name for logs (e.g., "redis")
    fn name(&self) -> &str;

    /// Open the connection
    fn connect(&self) -> BoxFuture<'_, Result<()>>;

    /// Join a topic; messages published on it are delivered afterwards
    fn join<'a>(&'a self, topic: &'a str) -> BoxFuture<'a, Result<JoinReply>>;

    /// Leave a previously joined topic
    fn leave<'a>(&'a self, topic: &'a str) -> BoxFuture<'a, Result<()>>;

    /// Close the connection
    fn disconnect(&self) -> BoxFuture<'_, Result<()>>;

    /// Receiver of all events produced by this transport
    fn events(&self) -> Receiver<TransportEvent>;
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn connect(&self) -> BoxFuture<'_, Result<()>> {
        (**self).connect()
    }

    fn join<'a>(&'a self, topic: &'a str) -> BoxFuture<'a, Result<JoinReply>> {
        (**self).join(topic)
    }

    fn leave<'a>(&'a self, topic: &'a str) -> BoxFuture<'a, Result<()>> {
        (**self).leave(topic)
    }

    fn disconnect(&self) -> BoxFuture<'_, Result<()>> {
        (**self).disconnect()
    }

    fn events(&self) -> Receiver<TransportEvent> {
        (**self).events()
    }
}
