//! Payloads exchanged with the tracking server's admin API.
//!
//! Row-shaped payloads (users, tickets, messages) keep the server's
//! snake_case column names; stats and auth payloads are camelCase.
//! SQLite booleans arrive as 0/1, so flags accept both numbers and bools.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;

/// Accept `true`/`false`, `0`/`1`, `"1"`/`"true"` and null.
pub fn flexible_bool<'de, D>(d: D) -> std::result::Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(d)? {
        Some(Value::Bool(b)) => b,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|v| v != 0.0),
        Some(Value::String(s)) => matches!(s.as_str(), "1" | "true"),
        _ => false,
    })
}

/// Counters may be missing or null; both mean zero.
fn flexible_count<'de, D>(d: D) -> std::result::Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(d)? {
        Some(Value::Number(n)) => n.as_u64().unwrap_or(0),
        Some(Value::String(s)) => s.parse().unwrap_or(0),
        _ => 0,
    })
}

// ── Users ────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "Option<String>", into = "String")]
pub enum Gender {
    Female,
    #[default]
    Male,
}

impl From<Option<String>> for Gender {
    fn from(value: Option<String>) -> Self {
        match value.as_deref() {
            Some("female") => Gender::Female,
            _ => Gender::Male,
        }
    }
}

impl From<Gender> for String {
    fn from(g: Gender) -> Self {
        match g {
            Gender::Female => "female".into(),
            Gender::Male => "male".into(),
        }
    }
}

impl Gender {
    pub fn label(self) -> &'static str {
        match self {
            Gender::Female => "female",
            Gender::Male => "male",
        }
    }

    /// Ordering key used by the user table: female rows first.
    pub fn sort_key(self) -> u8 {
        match self {
            Gender::Female => 0,
            Gender::Male => 1,
        }
    }
}

/// Row of `GET /api/admin/users`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserSummary {
    pub id: i64,
    pub username: String,
    #[serde(default)]
    pub gender: Gender,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default, deserialize_with = "flexible_bool")]
    pub is_admin: bool,
    #[serde(default)]
    pub entries_count: Option<u64>,
    #[serde(default)]
    pub water_logs_count: Option<u64>,
    #[serde(default)]
    pub weight_logs_count: Option<u64>,
}

impl UserSummary {
    /// Entries + water logs + weight logs, missing counters as zero.
    pub fn total_logs(&self) -> u64 {
        self.entries_count.unwrap_or(0)
            + self.water_logs_count.unwrap_or(0)
            + self.weight_logs_count.unwrap_or(0)
    }

    pub fn role_label(&self) -> &'static str {
        if self.is_admin { "admin" } else { "user" }
    }
}

/// `GET /api/admin/users/{id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserDetail {
    #[serde(flatten)]
    pub summary: UserSummary,
    #[serde(default)]
    pub avatar: Option<String>,
    #[serde(default)]
    pub last_entry: Option<String>,
    #[serde(default)]
    pub last_water_log: Option<String>,
}

// ── Stats ────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecentUser {
    pub username: String,
    #[serde(default)]
    pub created_at: Option<String>,
}

/// `GET /api/admin/stats`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stats {
    #[serde(default, deserialize_with = "flexible_count")]
    pub total_users: u64,
    #[serde(default, deserialize_with = "flexible_count")]
    pub admin_count: u64,
    #[serde(default, deserialize_with = "flexible_count")]
    pub total_entries: u64,
    #[serde(default, deserialize_with = "flexible_count")]
    pub total_water_logs: u64,
    #[serde(default, deserialize_with = "flexible_count")]
    pub total_weight_logs: u64,
    #[serde(default, deserialize_with = "flexible_count")]
    pub total_visits: u64,
    #[serde(default, deserialize_with = "flexible_count")]
    pub registered_visits: u64,
    #[serde(default, deserialize_with = "flexible_count")]
    pub anonymous_visits: u64,
    #[serde(default)]
    pub recent_users: Vec<RecentUser>,
}

// ── Tickets ────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TicketStatus {
    Open,
    InProgress,
    Resolved,
    Closed,
    /// Status the server knows and we don't; kept verbatim.
    Other(String),
}

impl From<String> for TicketStatus {
    fn from(s: String) -> Self {
        match s.as_str() {
            "open" => Self::Open,
            "in_progress" => Self::InProgress,
            "resolved" => Self::Resolved,
            "closed" => Self::Closed,
            _ => Self::Other(s),
        }
    }
}

impl From<TicketStatus> for String {
    fn from(s: TicketStatus) -> Self {
        s.as_str().to_string()
    }
}

impl TicketStatus {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Open => "open",
            Self::InProgress => "in_progress",
            Self::Resolved => "resolved",
            Self::Closed => "closed",
            Self::Other(s) => s,
        }
    }

    pub fn label(&self) -> &str {
        match self {
            Self::Open => "Open",
            Self::InProgress => "In progress",
            Self::Resolved => "Resolved",
            Self::Closed => "Closed",
            Self::Other(s) => s,
        }
    }
}

impl fmt::Display for TicketStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for TicketStatus {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self::from(s.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "Option<String>", into = "String")]
pub enum SenderRole {
    Admin,
    #[default]
    User,
}

impl From<Option<String>> for SenderRole {
    fn from(value: Option<String>) -> Self {
        match value.as_deref() {
            Some("admin") => SenderRole::Admin,
            _ => SenderRole::User,
        }
    }
}

impl From<SenderRole> for String {
    fn from(r: SenderRole) -> Self {
        match r {
            SenderRole::Admin => "admin".into(),
            SenderRole::User => "user".into(),
        }
    }
}

/// Row of `GET /api/admin/support/tickets`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ticket {
    pub id: i64,
    pub subject: String,
    #[serde(default)]
    pub username: Option<String>,
    pub status: TicketStatus,
    #[serde(default)]
    pub updated_at: Option<String>,
    #[serde(default, deserialize_with = "flexible_bool")]
    pub archived: bool,
    #[serde(default)]
    pub closed_by_admin_name: Option<String>,
    #[serde(default)]
    pub last_message: Option<String>,
    #[serde(default)]
    pub last_sender_role: Option<SenderRole>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TicketMessage {
    #[serde(default)]
    pub sender_role: SenderRole,
    #[serde(default)]
    pub sender_name: Option<String>,
    pub message: String,
    #[serde(default)]
    pub created_at: Option<String>,
}

// ── Auth & actions ────────────────────────────────────

/// `GET /api/me`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Me {
    pub id: i64,
    pub username: String,
}

/// `GET /api/admin/check`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AdminCheck {
    #[serde(rename = "isAdmin", default, deserialize_with = "flexible_bool")]
    pub is_admin: bool,
}

/// Generic `{ "message": ... }` acknowledgement of a mutation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActionResult {
    #[serde(default)]
    pub message: String,
}

/// Response of the internal grant/revoke endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrivilegeChange {
    #[serde(default)]
    pub message: String,
    pub username: String,
    #[serde(rename = "userId")]
    pub user_id: i64,
}
