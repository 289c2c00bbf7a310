//! Handler trait for typed admin updates.

use async_trait::async_trait;
use trackadmin_core::error::Result;
use trackadmin_core::realtime::AdminUpdate;

/// Receives admin updates one at a time, in arrival order.
///
/// Implementations must be idempotent: the server may repeat a
/// notification, and a reconnect can replay state through fresh loads.
/// Errors are logged by the listener and never close the connection.
#[async_trait]
pub trait UpdateHandler: Send + Sync {
    async fn handle(&self, update: AdminUpdate) -> Result<()>;
}
