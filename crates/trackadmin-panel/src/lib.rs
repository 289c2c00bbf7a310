//! # Trackadmin Panel
//!
//! Terminal rendition of the admin panel: cached views of stats, users
//! and support tickets, the operator actions on them, and the refresh
//! handler the realtime listener drives.

pub mod panel;
pub mod state;
pub mod view;

pub use panel::Panel;
pub use state::{ArchiveFilter, PanelState, SortDirection, SortField, StatusFilter, UserSort};
