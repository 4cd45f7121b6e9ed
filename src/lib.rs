//! Status Board Library
//!
//! A live status table for check results. The board joins the `checks:all`
//! topic on a pub/sub transport and keeps one row per alert, updated in place
//! as events arrive.

pub mod app;
pub mod constants;
pub mod domain;
pub mod error;
pub mod helpers;
pub mod services;
pub mod transport;
pub mod utils;
pub mod view;
