//! `users` table access, privilege flag only.
//!
//! The tracking server owns this schema; the store never creates or
//! migrates tables and refuses to open a file that lacks `users`.

use rusqlite::{Connection, OpenFlags, OptionalExtension, params};
use trackadmin_core::error::{Result, TrackAdminError};
use trackadmin_core::types::PrivilegeChange;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredUser {
    pub id: i64,
    pub username: String,
    pub is_admin: bool,
}

pub struct UserStore {
    conn: Connection,
}

impl UserStore {
    /// Open an existing tracker database. `~` is expanded.
    pub fn open(path: &str) -> Result<Self> {
        let path = shellexpand::tilde(path).into_owned();
        let conn = Connection::open_with_flags(&path, OpenFlags::SQLITE_OPEN_READ_WRITE)
            .map_err(|e| TrackAdminError::database(format!("DB open error ({path}): {e}")))?;
        tracing::debug!("Opened tracker database at {path}");
        Self::from_connection(conn)
    }

    /// Wrap an already-open connection (checked for a `users` table).
    pub fn from_connection(conn: Connection) -> Result<Self> {
        let has_users: bool = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name='users'",
                [],
                |row| row.get::<_, i64>(0),
            )
            .map(|n| n > 0)
            .map_err(|e| TrackAdminError::database(format!("Schema check: {e}")))?;
        if !has_users {
            return Err(TrackAdminError::database("no users table; is this the tracker database?"));
        }
        Ok(Self { conn })
    }

    pub fn find_user(&self, username: &str) -> Result<Option<StoredUser>> {
        self.conn
            .query_row(
                "SELECT id, username, is_admin FROM users WHERE username=?1",
                params![username],
                |row| {
                    Ok(StoredUser {
                        id: row.get(0)?,
                        username: row.get(1)?,
                        is_admin: row.get::<_, Option<i64>>(2)?.unwrap_or(0) != 0,
                    })
                },
            )
            .optional()
            .map_err(|e| TrackAdminError::database(format!("Get user: {e}")))
    }

    /// Set `is_admin` for `username`. Unknown users are `NotFound`.
    pub fn set_admin(&self, username: &str, is_admin: bool) -> Result<PrivilegeChange> {
        let user = self
            .find_user(username)?
            .ok_or_else(|| TrackAdminError::NotFound(format!("user '{username}'")))?;

        let message = if user.is_admin == is_admin {
            if is_admin {
                format!("User '{username}' is already an admin")
            } else {
                format!("User '{username}' is not an admin")
            }
        } else {
            self.conn
                .execute(
                    "UPDATE users SET is_admin=?1 WHERE id=?2",
                    params![is_admin as i64, user.id],
                )
                .map_err(|e| TrackAdminError::database(format!("Update is_admin: {e}")))?;
            tracing::info!("is_admin={} written for '{}' (id={})", is_admin, username, user.id);
            if is_admin {
                format!("Admin rights granted to '{username}'")
            } else {
                format!("Admin rights revoked from '{username}'")
            }
        };

        Ok(PrivilegeChange { message, username: user.username, user_id: user.id })
    }
}
