//! View Layer
//!
//! The live status table and its HTML rendering.

mod html;
mod status_table;

pub use html::*;
pub use status_table::*;
