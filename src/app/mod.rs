//! Application Layer
//!
//! Wires configuration, transport, board and rendering together.

pub mod application;
