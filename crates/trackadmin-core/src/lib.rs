//! # Trackadmin Core
//!
//! Errors, configuration, API payload types and the realtime update
//! protocol shared by every trackadmin crate.

pub mod config;
pub mod error;
pub mod realtime;
pub mod types;

pub use config::TrackAdminConfig;
pub use error::{Result, TrackAdminError};
pub use realtime::{AdminUpdate, RefreshTarget};
