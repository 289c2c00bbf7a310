//! Realtime update protocol.
//!
//! After connecting, the admin client announces itself with an `auth`
//! frame. The server then pushes `adminUpdate` frames whose `updateType`
//! says which cached admin views went stale.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Result;

/// Frames sent by the admin client.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ClientMessage {
    #[serde(rename_all = "camelCase")]
    Auth { user_id: i64, is_admin: bool },
}

impl ClientMessage {
    pub fn admin_auth(user_id: i64) -> Self {
        Self::Auth { user_id, is_admin: true }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

#[derive(Debug, Deserialize)]
struct RawFrame {
    #[serde(rename = "type")]
    kind: Option<String>,
    #[serde(rename = "updateType")]
    update_type: Option<String>,
    #[serde(default)]
    data: Value,
    #[serde(rename = "userId", default)]
    user_id: Value,
}

/// A typed `adminUpdate` notification.
#[derive(Debug, Clone, PartialEq)]
pub enum AdminUpdate {
    UserRegistered(Value),
    UserDeleted(Value),
    AdminToggled(Value),
    EntryAdded { user_id: Value },
    WaterAdded { user_id: Value },
    TicketUpdate,
    Unknown(String),
}

/// Admin view that must be reloaded after an update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RefreshTarget {
    Stats,
    Users,
    Tickets,
    /// Messages of the selected ticket; skipped when none is selected.
    CurrentTicketMessages,
}

impl AdminUpdate {
    /// Parse a server text frame.
    ///
    /// Returns `Ok(None)` for well-formed frames that are not admin
    /// updates; malformed JSON is an error.
    pub fn parse(text: &str) -> Result<Option<Self>> {
        let frame: RawFrame = serde_json::from_str(text)?;
        if frame.kind.as_deref() != Some("adminUpdate") {
            return Ok(None);
        }
        let update = match frame.update_type.as_deref().unwrap_or_default() {
            "userRegistered" => Self::UserRegistered(frame.data),
            "userDeleted" => Self::UserDeleted(frame.data),
            "adminToggled" => Self::AdminToggled(frame.data),
            "entryAdded" => Self::EntryAdded { user_id: frame.user_id },
            "waterAdded" => Self::WaterAdded { user_id: frame.user_id },
            "ticketUpdate" => Self::TicketUpdate,
            other => Self::Unknown(other.to_string()),
        };
        Ok(Some(update))
    }

    pub fn kind(&self) -> &str {
        match self {
            Self::UserRegistered(_) => "userRegistered",
            Self::UserDeleted(_) => "userDeleted",
            Self::AdminToggled(_) => "adminToggled",
            Self::EntryAdded { .. } => "entryAdded",
            Self::WaterAdded { .. } => "waterAdded",
            Self::TicketUpdate => "ticketUpdate",
            Self::Unknown(kind) => kind,
        }
    }

    /// Views to reload, in order.
    pub fn refresh_targets(&self) -> &'static [RefreshTarget] {
        use RefreshTarget::*;
        match self {
            Self::UserRegistered(_) | Self::UserDeleted(_) | Self::AdminToggled(_) => {
                &[Stats, Users]
            }
            // Per-user activity only moves the global counters.
            Self::EntryAdded { .. } | Self::WaterAdded { .. } => &[Stats],
            Self::TicketUpdate => &[Tickets, CurrentTicketMessages],
            Self::Unknown(_) => &[],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_auth_frame() {
        let text = ClientMessage::admin_auth(5).to_json().unwrap();
        let v: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(v, json!({"type": "auth", "userId": 5, "isAdmin": true}));
    }

    #[test]
    fn test_parse_user_updates() {
        let u = AdminUpdate::parse(
            r#"{"type":"adminUpdate","updateType":"userRegistered","data":{"id":9,"username":"neo"}}"#,
        )
        .unwrap()
        .unwrap();
        assert_eq!(u, AdminUpdate::UserRegistered(json!({"id": 9, "username": "neo"})));
        assert_eq!(u.refresh_targets(), &[RefreshTarget::Stats, RefreshTarget::Users]);
    }

    #[test]
    fn test_activity_refreshes_stats_only() {
        let u = AdminUpdate::parse(r#"{"type":"adminUpdate","updateType":"waterAdded","userId":3}"#)
            .unwrap()
            .unwrap();
        assert_eq!(u, AdminUpdate::WaterAdded { user_id: json!(3) });
        assert_eq!(u.refresh_targets(), &[RefreshTarget::Stats]);
    }

    #[test]
    fn test_ticket_update_targets() {
        let u = AdminUpdate::parse(r#"{"type":"adminUpdate","updateType":"ticketUpdate"}"#)
            .unwrap()
            .unwrap();
        assert_eq!(
            u.refresh_targets(),
            &[RefreshTarget::Tickets, RefreshTarget::CurrentTicketMessages]
        );
    }

    #[test]
    fn test_non_admin_frames_ignored() {
        assert!(AdminUpdate::parse(r#"{"type":"entryAdded","userId":1}"#).unwrap().is_none());
        assert!(AdminUpdate::parse(r#"{"hello":"world"}"#).unwrap().is_none());
    }

    #[test]
    fn test_unknown_update_type() {
        let u = AdminUpdate::parse(r#"{"type":"adminUpdate","updateType":"weightAdded"}"#)
            .unwrap()
            .unwrap();
        assert_eq!(u.kind(), "weightAdded");
        assert!(u.refresh_targets().is_empty());
    }

    #[test]
    fn test_malformed_json_is_error() {
        assert!(AdminUpdate::parse("not json").is_err());
    }
}
