//! # Trackadmin Store
//! Direct writes against the tracker's SQLite database, for when the
//! server is down or unreachable.

pub mod users;

pub use users::{StoredUser, UserStore};
