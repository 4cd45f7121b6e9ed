//! Domain - Pure Data Structures and Wire Types
//!
//! These types don't depend on any transport and represent the checks domain.

pub mod alert;
pub mod config;

pub use alert::*;
pub use config::*;
