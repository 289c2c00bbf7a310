//! # Trackadmin Realtime
//!
//! Keeps one WebSocket open to the tracking server, announces the admin
//! session, and hands every `adminUpdate` to an [`UpdateHandler`].

pub mod handler;
pub mod listener;

pub use handler::UpdateHandler;
pub use listener::{AdminListener, DEFAULT_RECONNECT_DELAY};
