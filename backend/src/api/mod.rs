//! HTTP API module.
//!
//! This module provides the HTTP server, the API types and the activity log
//! shared with the conversion pipeline.

pub mod server;
pub mod types;
pub mod logs;

pub use server::start_server;
pub use types::*;
pub use logs::*;
