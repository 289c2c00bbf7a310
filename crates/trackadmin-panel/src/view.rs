//! Text rendering of panel views.

use chrono::{DateTime, FixedOffset, Local, NaiveDate, NaiveDateTime, Utc};
use trackadmin_core::types::{SenderRole, Stats, TicketMessage, TicketStatus, UserDetail, UserSummary};

use crate::state::PanelState;

/// Longest last-message preview shown in the ticket list.
const PREVIEW_CHARS: usize = 80;

/// Parse a server timestamp. Values without a zone are UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%d %H:%M:%S%.f%:z", "%Y-%m-%d %H:%M:%S%.f%z"] {
        if let Ok(dt) = DateTime::parse_from_str(raw, fmt) {
            return Some(dt.with_timezone(&Utc));
        }
    }
    for fmt in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Zone dates are displayed in: the operator's local zone, or a fixed offset.
#[derive(Debug, Clone, Copy, Default)]
pub struct DateFormat {
    fixed: Option<FixedOffset>,
}

impl DateFormat {
    pub fn local() -> Self {
        Self { fixed: None }
    }

    pub fn fixed(offset: FixedOffset) -> Self {
        Self { fixed: Some(offset) }
    }

    /// `dd.mm.yyyy, HH:MM`; `n/a` when missing, the raw text when unparseable.
    pub fn format(&self, raw: Option<&str>) -> String {
        const FMT: &str = "%d.%m.%Y, %H:%M";
        let Some(raw) = raw.filter(|s| !s.trim().is_empty()) else {
            return "n/a".into();
        };
        match parse_timestamp(raw) {
            Some(dt) => match self.fixed {
                Some(offset) => dt.with_timezone(&offset).format(FMT).to_string(),
                None => dt.with_timezone(&Local).format(FMT).to_string(),
            },
            None => raw.to_string(),
        }
    }
}

fn truncate_chars(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

fn render_table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (w, cell) in widths.iter_mut().zip(row) {
            *w = (*w).max(cell.chars().count());
        }
    }
    let line = |cells: Vec<&str>| {
        cells
            .iter()
            .zip(&widths)
            .map(|(cell, &width)| format!("{cell:<width$}"))
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    };

    let mut out = vec![line(headers.to_vec())];
    out.push(widths.iter().map(|w| "-".repeat(*w)).collect::<Vec<_>>().join("  "));
    out.extend(rows.iter().map(|r| line(r.iter().map(String::as_str).collect())));
    out.join("\n")
}

pub fn render_stats(stats: &Stats, dates: &DateFormat) -> String {
    let mut lines = vec![
        format!("Users: {}   Admins: {}", stats.total_users, stats.admin_count),
        format!(
            "Entries: {}   Water logs: {}   Weight logs: {}",
            stats.total_entries, stats.total_water_logs, stats.total_weight_logs
        ),
        format!(
            "Visits: {} (registered {}, anonymous {})",
            stats.total_visits, stats.registered_visits, stats.anonymous_visits
        ),
    ];
    if !stats.recent_users.is_empty() {
        lines.push("Recent users:".into());
        lines.extend(stats.recent_users.iter().map(|u| {
            format!("  {}  {}", u.username, dates.format(u.created_at.as_deref()))
        }));
    }
    lines.join("\n")
}

pub fn render_users(users: &[UserSummary], dates: &DateFormat) -> String {
    if users.is_empty() {
        return "No users found".into();
    }
    let rows: Vec<Vec<String>> = users
        .iter()
        .map(|u| {
            vec![
                u.id.to_string(),
                u.username.clone(),
                u.gender.label().to_string(),
                u.email.clone().unwrap_or_else(|| "none".into()),
                dates.format(u.created_at.as_deref()),
                u.total_logs().to_string(),
                u.role_label().to_string(),
            ]
        })
        .collect();
    render_table(
        &["ID", "Username", "Gender", "Email", "Registered", "Logs", "Role"],
        &rows,
    )
}

pub fn render_user_details(user: &UserDetail, dates: &DateFormat) -> String {
    let s = &user.summary;
    let avatar = match &user.avatar {
        Some(url) => url.clone(),
        None => format!(
            "[{}]",
            s.username.chars().next().map(|c| c.to_uppercase().to_string()).unwrap_or_default()
        ),
    };
    let role = if s.is_admin { "administrator" } else { "user" };
    let last_entry = match user.last_entry.as_deref() {
        Some(ts) => dates.format(Some(ts)),
        None => "no entries".into(),
    };
    let last_water = match user.last_water_log.as_deref() {
        Some(ts) => dates.format(Some(ts)),
        None => "no logs".into(),
    };

    [
        format!("Avatar:          {avatar}"),
        format!("ID:              {}", s.id),
        format!("Username:        {}", s.username),
        format!("Gender:          {}", s.gender.label()),
        format!("Email:           {}", s.email.as_deref().unwrap_or("not set")),
        format!("Role:            {role}"),
        format!("Registered:      {}", dates.format(s.created_at.as_deref())),
        format!("Entries:         {}", s.entries_count.unwrap_or(0)),
        format!("Water logs:      {}", s.water_logs_count.unwrap_or(0)),
        format!("Last entry:      {last_entry}"),
        format!("Last water log:  {last_water}"),
    ]
    .join("\n")
}

pub fn render_tickets(state: &PanelState, dates: &DateFormat) -> String {
    let tickets = state.visible_tickets();
    if tickets.is_empty() {
        return "No tickets yet".into();
    }

    let mut lines = Vec::new();
    for t in tickets {
        let marker = if state.current_ticket_id == Some(t.id) { "▶" } else { " " };
        lines.push(format!("{marker} #{} {}", t.id, t.subject));
        lines.push(format!(
            "    {} • {} • {}",
            t.username.as_deref().unwrap_or_default(),
            dates.format(t.updated_at.as_deref()),
            t.status.label()
        ));
        if t.status == TicketStatus::Closed {
            if let Some(admin) = &t.closed_by_admin_name {
                lines.push(format!("    Closed by: {admin}"));
            }
        }
        if let Some(msg) = t.last_message.as_deref().filter(|m| !m.is_empty()) {
            let who = match t.last_sender_role {
                Some(SenderRole::Admin) => "Admin",
                _ => "User",
            };
            lines.push(format!("    {who}: {}", truncate_chars(msg, PREVIEW_CHARS)));
        }
    }
    lines.join("\n")
}

pub fn render_ticket_messages(messages: &[TicketMessage], dates: &DateFormat) -> String {
    if messages.is_empty() {
        return "No messages".into();
    }
    messages
        .iter()
        .map(|m| {
            let role = match m.sender_role {
                SenderRole::Admin => "Admin",
                SenderRole::User => "User",
            };
            let who = match &m.sender_name {
                Some(name) => format!("{role}: {name}"),
                None => role.to_string(),
            };
            format!("[{who}] {}\n  {}", dates.format(m.created_at.as_deref()), m.message)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Header and messages of the selected ticket.
pub fn render_conversation(state: &PanelState, dates: &DateFormat) -> String {
    let Some(ticket) = state.current_ticket() else {
        return "No ticket selected".into();
    };
    format!(
        "{}\n{} • {}\n\n{}",
        ticket.subject,
        ticket.username.as_deref().unwrap_or("User"),
        ticket.status.label(),
        render_ticket_messages(&state.messages, dates)
    )
}

/// Full panel frame.
pub fn render_panel(state: &PanelState, dates: &DateFormat) -> String {
    let mut sections = Vec::new();
    if let Some(stats) = &state.stats {
        sections.push(format!("== Stats ==\n{}", render_stats(stats, dates)));
    }
    sections.push(format!("== Users ==\n{}", render_users(&state.visible_users(), dates)));
    let archive = if state.archive_filter.is_archived() { " (archived)" } else { "" };
    sections.push(format!("== Tickets{archive} ==\n{}", render_tickets(state, dates)));
    if state.current_ticket_id.is_some() {
        sections.push(format!("== Conversation ==\n{}", render_conversation(state, dates)));
    }
    sections.join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use trackadmin_core::types::{Gender, RecentUser, Ticket};

    fn utc() -> DateFormat {
        DateFormat::fixed(FixedOffset::east_opt(0).unwrap())
    }

    fn ticket(id: i64, status: TicketStatus) -> Ticket {
        Ticket {
            id,
            subject: format!("Ticket {id}"),
            username: Some("olga".into()),
            status,
            updated_at: Some("2024-05-02 09:30:00".into()),
            archived: false,
            closed_by_admin_name: Some("root".into()),
            last_message: None,
            last_sender_role: None,
        }
    }

    #[test]
    fn test_naive_timestamps_are_utc() {
        let msk = DateFormat::fixed(FixedOffset::east_opt(3 * 3600).unwrap());
        assert_eq!(msk.format(Some("2024-05-02 21:30:00")), "03.05.2024, 00:30");
        assert_eq!(utc().format(Some("2024-05-02T21:30:00+02:00")), "02.05.2024, 19:30");
        assert_eq!(utc().format(Some("2024-05-02 21:30:00.123")), "02.05.2024, 21:30");
    }

    #[test]
    fn test_missing_and_bad_dates() {
        assert_eq!(utc().format(None), "n/a");
        assert_eq!(utc().format(Some("")), "n/a");
        assert_eq!(utc().format(Some("yesterday")), "yesterday");
    }

    #[test]
    fn test_users_table() {
        let users = vec![UserSummary {
            id: 3,
            username: "olga".into(),
            gender: Gender::Female,
            email: None,
            created_at: Some("2024-01-01 00:00:00".into()),
            is_admin: true,
            entries_count: Some(2),
            water_logs_count: Some(3),
            weight_logs_count: None,
        }];
        let out = render_users(&users, &utc());
        let lines: Vec<&str> = out.lines().collect();
        assert!(lines[0].starts_with("ID  Username"));
        assert!(lines[2].contains("olga"));
        assert!(lines[2].contains("female"));
        assert!(lines[2].contains("none"));
        assert!(lines[2].contains("01.01.2024, 00:00"));
        assert!(lines[2].ends_with("5     admin"));

        assert_eq!(render_users(&[], &utc()), "No users found");
    }

    #[test]
    fn test_stats_block() {
        let stats = Stats {
            total_users: 10,
            admin_count: 1,
            recent_users: vec![RecentUser { username: "neo".into(), created_at: None }],
            ..Default::default()
        };
        let out = render_stats(&stats, &utc());
        assert!(out.starts_with("Users: 10   Admins: 1"));
        assert!(out.ends_with("  neo  n/a"));
    }

    #[test]
    fn test_ticket_list() {
        let mut closed = ticket(2, TicketStatus::Closed);
        closed.last_message = Some("x".repeat(100));
        closed.last_sender_role = Some(SenderRole::Admin);
        let state = PanelState {
            tickets: vec![ticket(1, TicketStatus::InProgress), closed],
            current_ticket_id: Some(2),
            ..Default::default()
        };
        let out = render_tickets(&state, &utc());
        assert!(out.contains("  #1 Ticket 1"));
        assert!(out.contains("olga • 02.05.2024, 09:30 • In progress"));
        assert!(out.contains("▶ #2 Ticket 2"));
        // Only closed tickets show who closed them.
        assert_eq!(out.matches("Closed by: root").count(), 1);
        assert!(out.contains(&format!("Admin: {}", "x".repeat(80))));
        assert!(!out.contains(&"x".repeat(81)));

        assert_eq!(render_tickets(&PanelState::default(), &utc()), "No tickets yet");
    }

    #[test]
    fn test_conversation() {
        let state = PanelState {
            tickets: vec![ticket(1, TicketStatus::Open)],
            current_ticket_id: Some(1),
            messages: vec![
                TicketMessage {
                    sender_role: SenderRole::User,
                    sender_name: None,
                    message: "Chart is empty".into(),
                    created_at: None,
                },
                TicketMessage {
                    sender_role: SenderRole::Admin,
                    sender_name: Some("root".into()),
                    message: "Fixed".into(),
                    created_at: Some("2024-05-02 10:00:00".into()),
                },
            ],
            ..Default::default()
        };
        let out = render_conversation(&state, &utc());
        assert!(out.starts_with("Ticket 1\nolga • Open"));
        assert!(out.contains("[User] n/a\n  Chart is empty"));
        assert!(out.contains("[Admin: root] 02.05.2024, 10:00\n  Fixed"));

        assert_eq!(render_ticket_messages(&[], &utc()), "No messages");
    }

    #[test]
    fn test_user_details_without_avatar() {
        let detail = UserDetail {
            summary: UserSummary {
                id: 8,
                username: "zed".into(),
                gender: Gender::Male,
                email: Some("z@x.io".into()),
                created_at: None,
                is_admin: false,
                entries_count: None,
                water_logs_count: Some(4),
                weight_logs_count: None,
            },
            avatar: None,
            last_entry: None,
            last_water_log: Some("2024-02-02 12:00:00".into()),
        };
        let out = render_user_details(&detail, &utc());
        assert!(out.contains("Avatar:          [Z]"));
        assert!(out.contains("Role:            user"));
        assert!(out.contains("Last entry:      no entries"));
        assert!(out.contains("Last water log:  02.02.2024, 12:00"));
    }
}
