//! # Trackadmin Client
//! Typed access to the tracker's admin API and its internal privilege API.

pub mod admin;
pub mod internal;

pub use admin::AdminApi;
pub use internal::InternalApi;

/// Shortest password the server accepts on reset.
pub const MIN_PASSWORD_LEN: usize = 4;
