//! Service Layer
//!
//! Drives the board: runtime bridge, connection supervision, and the event
//! loop that feeds transport events into the status table.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        StatusBoard                           │
//! │  ┌─────────────┐  ┌─────────────┐  ┌──────────────────┐    │
//! │  │  Transport  │  │ Diagnostics │  │    Supervisor    │    │
//! │  │  (pub/sub)  │  │ (ring buf)  │  │ (connect retry)  │    │
//! │  └─────────────┘  └─────────────┘  └──────────────────┘    │
//! └─────────────────────────────────────────────────────────────┘
//!                            │
//!                            ▼ AlertEvent
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     StatusTableView                          │
//! └─────────────────────────────────────────────────────────────┘
//! ```

mod board;
mod diagnostics;
mod runtime;
mod supervisor;

pub use board::*;
pub use diagnostics::*;
pub use runtime::*;
pub use supervisor::*;
