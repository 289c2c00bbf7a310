//! Cached panel data and the local operations on it (search, sort, filter).

use std::cmp::Ordering;
use std::str::FromStr;

use trackadmin_core::types::{Stats, Ticket, TicketMessage, TicketStatus, UserSummary};

use crate::view::parse_timestamp;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    Id,
    Username,
    Gender,
    Email,
    CreatedAt,
    TotalLogs,
    EntriesCount,
    WaterLogsCount,
    IsAdmin,
}

impl FromStr for SortField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "id" => Self::Id,
            "username" => Self::Username,
            "gender" => Self::Gender,
            "email" => Self::Email,
            "created_at" => Self::CreatedAt,
            "total_logs" => Self::TotalLogs,
            "entries_count" => Self::EntriesCount,
            "water_logs_count" => Self::WaterLogsCount,
            "is_admin" => Self::IsAdmin,
            other => return Err(format!("unknown sort field '{other}'")),
        })
    }
}

impl SortField {
    fn compare(self, a: &UserSummary, b: &UserSummary) -> Ordering {
        match self {
            Self::Id => a.id.cmp(&b.id),
            Self::Username => a.username.to_lowercase().cmp(&b.username.to_lowercase()),
            Self::Gender => a.gender.sort_key().cmp(&b.gender.sort_key()),
            Self::Email => {
                let key = |u: &UserSummary| u.email.as_deref().unwrap_or_default().to_lowercase();
                key(a).cmp(&key(b))
            }
            // Unparseable or missing dates sort first.
            Self::CreatedAt => {
                let key = |u: &UserSummary| u.created_at.as_deref().and_then(parse_timestamp);
                key(a).cmp(&key(b))
            }
            Self::TotalLogs => a.total_logs().cmp(&b.total_logs()),
            Self::EntriesCount => a.entries_count.unwrap_or(0).cmp(&b.entries_count.unwrap_or(0)),
            Self::WaterLogsCount => a
                .water_logs_count
                .unwrap_or(0)
                .cmp(&b.water_logs_count.unwrap_or(0)),
            Self::IsAdmin => a.is_admin.cmp(&b.is_admin),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

/// Column sort of the user table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UserSort {
    pub field: Option<SortField>,
    pub direction: SortDirection,
}

impl UserSort {
    /// Same column flips direction; a new column starts ascending.
    pub fn click(&mut self, field: SortField) {
        if self.field == Some(field) {
            self.direction = match self.direction {
                SortDirection::Asc => SortDirection::Desc,
                SortDirection::Desc => SortDirection::Asc,
            };
        } else {
            self.field = Some(field);
            self.direction = SortDirection::Asc;
        }
    }

    /// Stable sort; no-op until a column was chosen.
    pub fn apply(&self, users: &mut [UserSummary]) {
        let Some(field) = self.field else { return };
        users.sort_by(|a, b| {
            let ord = field.compare(a, b);
            match self.direction {
                SortDirection::Asc => ord,
                SortDirection::Desc => ord.reverse(),
            }
        });
    }
}

/// Local status filter of the ticket list.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum StatusFilter {
    #[default]
    All,
    Only(TicketStatus),
}

impl FromStr for StatusFilter {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "all" | "" => Self::All,
            other => Self::Only(TicketStatus::from(other.to_string())),
        })
    }
}

/// Which ticket set the server is asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ArchiveFilter {
    #[default]
    Active,
    Archived,
}

impl ArchiveFilter {
    pub fn is_archived(self) -> bool {
        self == Self::Archived
    }
}

/// Case-insensitive match on username, email or decimal id.
pub fn search_users<'a>(users: &'a [UserSummary], query: &str) -> Vec<&'a UserSummary> {
    let query = query.trim().to_lowercase();
    if query.is_empty() {
        return users.iter().collect();
    }
    users
        .iter()
        .filter(|u| {
            u.username.to_lowercase().contains(&query)
                || u.email.as_deref().is_some_and(|e| e.to_lowercase().contains(&query))
                || u.id.to_string().contains(&query)
        })
        .collect()
}

#[derive(Debug, Clone, Default)]
pub struct PanelState {
    pub stats: Option<Stats>,
    pub users: Vec<UserSummary>,
    pub tickets: Vec<Ticket>,
    pub current_ticket_id: Option<i64>,
    pub messages: Vec<TicketMessage>,
    pub sort: UserSort,
    pub search: String,
    pub status_filter: StatusFilter,
    pub archive_filter: ArchiveFilter,
}

impl PanelState {
    /// Users as the table shows them: sorted, then searched.
    pub fn visible_users(&self) -> Vec<UserSummary> {
        let mut sorted = self.users.clone();
        self.sort.apply(&mut sorted);
        search_users(&sorted, &self.search).into_iter().cloned().collect()
    }

    pub fn visible_tickets(&self) -> Vec<&Ticket> {
        self.tickets
            .iter()
            .filter(|t| match &self.status_filter {
                StatusFilter::All => true,
                StatusFilter::Only(status) => &t.status == status,
            })
            .collect()
    }

    pub fn current_ticket(&self) -> Option<&Ticket> {
        let id = self.current_ticket_id?;
        self.tickets.iter().find(|t| t.id == id)
    }

    /// Store a fresh ticket list, keeping the selection.
    pub fn set_tickets(&mut self, tickets: Vec<Ticket>) {
        self.tickets = tickets;
    }

    pub fn set_ticket_status(&mut self, ticket_id: i64, status: TicketStatus) {
        if let Some(t) = self.tickets.iter_mut().find(|t| t.id == ticket_id) {
            t.status = status;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use trackadmin_core::types::Gender;

    fn user(id: i64, name: &str, email: Option<&str>, created: &str, logs: u64) -> UserSummary {
        UserSummary {
            id,
            username: name.into(),
            gender: if id % 2 == 0 { Gender::Female } else { Gender::Male },
            email: email.map(String::from),
            created_at: Some(created.into()),
            is_admin: id == 1,
            entries_count: Some(logs),
            water_logs_count: None,
            weight_logs_count: Some(1),
        }
    }

    fn sample() -> Vec<UserSummary> {
        vec![
            user(1, "Zoe", Some("zoe@mail.ru"), "2024-03-01 10:00:00", 5),
            user(2, "adam", None, "2023-12-31 23:59:00", 10),
            user(13, "Mila", Some("mila@example.com"), "2024-01-15T08:00:00Z", 0),
        ]
    }

    fn ids(users: &[UserSummary]) -> Vec<i64> {
        users.iter().map(|u| u.id).collect()
    }

    #[test]
    fn test_search_matches_username_email_id() {
        let users = sample();
        let by_name: Vec<i64> = search_users(&users, "  ZO ").iter().map(|u| u.id).collect();
        assert_eq!(by_name, vec![1]);
        let by_email: Vec<i64> = search_users(&users, "example").iter().map(|u| u.id).collect();
        assert_eq!(by_email, vec![13]);
        let by_id: Vec<i64> = search_users(&users, "1").iter().map(|u| u.id).collect();
        assert_eq!(by_id, vec![1, 13]);
        assert_eq!(search_users(&users, "").len(), 3);
    }

    #[test]
    fn test_sort_click_toggles_direction() {
        let mut sort = UserSort::default();
        sort.click(SortField::Username);
        assert_eq!(sort.direction, SortDirection::Asc);
        sort.click(SortField::Username);
        assert_eq!(sort.direction, SortDirection::Desc);
        sort.click(SortField::Id);
        assert_eq!(sort.field, Some(SortField::Id));
        assert_eq!(sort.direction, SortDirection::Asc);
    }

    #[test]
    fn test_sort_fields() {
        let mut users = sample();
        let mut sort = UserSort::default();

        sort.click(SortField::Username);
        sort.apply(&mut users);
        assert_eq!(ids(&users), vec![2, 13, 1]);

        sort.click(SortField::CreatedAt);
        sort.apply(&mut users);
        assert_eq!(ids(&users), vec![2, 13, 1]);

        sort.click(SortField::TotalLogs);
        sort.click(SortField::TotalLogs);
        sort.apply(&mut users);
        assert_eq!(ids(&users), vec![2, 1, 13]);

        sort.click(SortField::Gender);
        sort.apply(&mut users);
        assert_eq!(users[0].gender, Gender::Female);

        sort.click(SortField::IsAdmin);
        sort.click(SortField::IsAdmin);
        sort.apply(&mut users);
        assert_eq!(users[0].id, 1);
    }

    #[test]
    fn test_visible_users_sorted_then_searched() {
        let mut state = PanelState { users: sample(), ..Default::default() };
        state.sort.click(SortField::Id);
        state.sort.click(SortField::Id);
        state.search = "1".into();
        assert_eq!(ids(&state.visible_users()), vec![13, 1]);
    }

    #[test]
    fn test_sort_field_parse() {
        assert_eq!("water_logs_count".parse::<SortField>().unwrap(), SortField::WaterLogsCount);
        assert!("password".parse::<SortField>().is_err());
    }

    #[test]
    fn test_status_filter() {
        let ticket = |id, status: &str| Ticket {
            id,
            subject: format!("t{id}"),
            username: None,
            status: TicketStatus::from(status.to_string()),
            updated_at: None,
            archived: false,
            closed_by_admin_name: None,
            last_message: None,
            last_sender_role: None,
        };
        let mut state = PanelState {
            tickets: vec![ticket(1, "open"), ticket(2, "closed"), ticket(3, "open")],
            ..Default::default()
        };
        assert_eq!(state.visible_tickets().len(), 3);

        state.status_filter = "open".parse().unwrap();
        let open: Vec<i64> = state.visible_tickets().iter().map(|t| t.id).collect();
        assert_eq!(open, vec![1, 3]);

        state.set_ticket_status(1, TicketStatus::Resolved);
        assert_eq!(state.visible_tickets().len(), 1);

        state.current_ticket_id = Some(2);
        assert_eq!(state.current_ticket().unwrap().status, TicketStatus::Closed);
    }
}
