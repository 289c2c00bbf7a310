//! Panel controller: loads views from the admin API, runs operator
//! actions, and reacts to realtime updates.
//!
//! The cache lock is never held across an API call; each reload fetches
//! first and swaps the result in afterwards.

use async_trait::async_trait;
use tokio::sync::{Mutex, mpsc};
use trackadmin_client::AdminApi;
use trackadmin_core::error::{Result, TrackAdminError};
use trackadmin_core::realtime::{AdminUpdate, RefreshTarget};
use trackadmin_core::types::TicketStatus;
use trackadmin_realtime::UpdateHandler;

use crate::state::{ArchiveFilter, PanelState, SortField, StatusFilter};
use crate::view::{self, DateFormat};

pub struct Panel {
    api: AdminApi,
    state: Mutex<PanelState>,
    dates: DateFormat,
    frames: Option<mpsc::UnboundedSender<String>>,
}

impl Panel {
    pub fn new(api: AdminApi) -> Self {
        Self {
            api,
            state: Mutex::new(PanelState::default()),
            dates: DateFormat::local(),
            frames: None,
        }
    }

    /// Emit a rendered frame on `tx` after every handled update.
    pub fn with_frames(mut self, tx: mpsc::UnboundedSender<String>) -> Self {
        self.frames = Some(tx);
        self
    }

    pub fn with_date_format(mut self, dates: DateFormat) -> Self {
        self.dates = dates;
        self
    }

    pub fn api(&self) -> &AdminApi {
        &self.api
    }

    pub async fn snapshot(&self) -> PanelState {
        self.state.lock().await.clone()
    }

    pub async fn render(&self) -> String {
        view::render_panel(&*self.state.lock().await, &self.dates)
    }

    // ── Loading ────────────────────────────────────

    pub async fn load_stats(&self) -> Result<()> {
        let stats = self.api.stats().await?;
        tracing::debug!("📊 Stats loaded: {} users", stats.total_users);
        self.state.lock().await.stats = Some(stats);
        Ok(())
    }

    pub async fn load_users(&self) -> Result<()> {
        let users = self.api.users().await?;
        tracing::debug!("Loaded {} users", users.len());
        self.state.lock().await.users = users;
        Ok(())
    }

    pub async fn load_tickets(&self) -> Result<()> {
        let archived = self.state.lock().await.archive_filter.is_archived();
        let tickets = self.api.tickets(archived).await?;
        tracing::debug!("🎫 Loaded {} tickets (archived={archived})", tickets.len());
        self.state.lock().await.set_tickets(tickets);
        Ok(())
    }

    /// Reload messages of the selected ticket; nothing selected is a no-op.
    pub async fn load_ticket_messages(&self) -> Result<()> {
        let Some(id) = self.state.lock().await.current_ticket_id else {
            return Ok(());
        };
        let messages = self.api.ticket_messages(id).await?;
        let mut state = self.state.lock().await;
        // The selection may have moved while we were fetching.
        if state.current_ticket_id == Some(id) {
            state.messages = messages;
        }
        Ok(())
    }

    /// Initial load of stats, users and tickets, concurrently.
    ///
    /// Every view is attempted; the first failure is returned.
    pub async fn load_all(&self) -> Result<()> {
        let (stats, users, tickets) =
            tokio::join!(self.load_stats(), self.load_users(), self.load_tickets());
        for (name, result) in [("stats", &stats), ("users", &users), ("tickets", &tickets)] {
            if let Err(e) = result {
                tracing::error!("Failed to load {name}: {e}");
            }
        }
        stats.and(users).and(tickets)
    }

    pub async fn refresh(&self, target: RefreshTarget) -> Result<()> {
        match target {
            RefreshTarget::Stats => self.load_stats().await,
            RefreshTarget::Users => self.load_users().await,
            RefreshTarget::Tickets => self.load_tickets().await,
            RefreshTarget::CurrentTicketMessages => self.load_ticket_messages().await,
        }
    }

    /// Reload every target in order. A failed reload keeps the previous
    /// view and does not stop the remaining ones.
    async fn reload(&self, targets: &[RefreshTarget], after: &str) {
        for target in targets {
            if let Err(e) = self.refresh(*target).await {
                tracing::warn!("Refresh of {target:?} after {after} failed: {e}");
            }
        }
    }

    // ── Local view controls ────────────────────────────────────

    pub async fn set_search(&self, query: &str) {
        self.state.lock().await.search = query.to_string();
    }

    pub async fn click_sort(&self, field: SortField) {
        self.state.lock().await.sort.click(field);
    }

    pub async fn set_status_filter(&self, filter: StatusFilter) {
        self.state.lock().await.status_filter = filter;
    }

    /// Switch between active and archived tickets; reloads the list.
    pub async fn set_archive_filter(&self, filter: ArchiveFilter) -> Result<()> {
        self.state.lock().await.archive_filter = filter;
        self.load_tickets().await
    }

    // ── User actions ────────────────────────────────────

    pub async fn user_details(&self, user_id: i64) -> Result<String> {
        let detail = self.api.user(user_id).await?;
        Ok(view::render_user_details(&detail, &self.dates))
    }

    /// Flip admin rights, then reload users and stats.
    pub async fn toggle_admin(&self, user_id: i64) -> Result<String> {
        let result = self.api.toggle_admin(user_id).await?;
        tracing::info!("🔐 Toggled admin for user {user_id}: {}", result.message);
        self.reload(&[RefreshTarget::Users, RefreshTarget::Stats], "toggle-admin").await;
        Ok(result.message)
    }

    pub async fn delete_user(&self, user_id: i64) -> Result<String> {
        let result = self.api.delete_user(user_id).await?;
        tracing::info!("🗑 Deleted user {user_id}: {}", result.message);
        self.reload(&[RefreshTarget::Users, RefreshTarget::Stats], "delete-user").await;
        Ok(result.message)
    }

    pub async fn reset_password(&self, user_id: i64, new_password: &str) -> Result<String> {
        let result = self.api.reset_password(user_id, new_password).await?;
        tracing::info!("🔑 Password reset for user {user_id}");
        Ok(result.message)
    }

    // ── Ticket actions ────────────────────────────────────

    async fn require_ticket(&self) -> Result<i64> {
        self.state
            .lock()
            .await
            .current_ticket_id
            .ok_or_else(|| TrackAdminError::validation("no ticket selected"))
    }

    pub async fn select_ticket(&self, ticket_id: i64) -> Result<()> {
        {
            let mut state = self.state.lock().await;
            state.current_ticket_id = Some(ticket_id);
            state.messages.clear();
        }
        self.load_ticket_messages().await
    }

    /// Persist a new status and patch the cached row.
    pub async fn save_ticket_status(&self, status: TicketStatus) -> Result<()> {
        let id = self.require_ticket().await?;
        self.api.set_ticket_status(id, &status).await?;
        tracing::info!("Ticket #{id} status -> {status}");
        self.state.lock().await.set_ticket_status(id, status);
        Ok(())
    }

    /// Archive or unarchive the selected ticket. Returns the new flag.
    pub async fn toggle_current_archive(&self) -> Result<bool> {
        let id = self.require_ticket().await?;
        let archived = {
            let state = self.state.lock().await;
            let ticket = state
                .current_ticket()
                .ok_or_else(|| TrackAdminError::NotFound(format!("ticket #{id}")))?;
            !ticket.archived
        };
        self.api.set_ticket_archived(id, archived).await?;
        tracing::info!("Ticket #{id} archived={archived}");
        self.reload(&[RefreshTarget::Tickets], "archive").await;
        Ok(archived)
    }

    /// Send a reply on the selected ticket. Blank text is ignored.
    pub async fn send_reply(&self, text: &str) -> Result<bool> {
        let id = self.require_ticket().await?;
        if text.trim().is_empty() {
            return Ok(false);
        }
        self.api.reply_ticket(id, text).await?;
        self.reload(&[RefreshTarget::CurrentTicketMessages], "reply").await;
        Ok(true)
    }

    async fn emit_frame(&self) {
        if let Some(tx) = &self.frames {
            let frame = self.render().await;
            if tx.send(frame).is_err() {
                tracing::debug!("Frame receiver gone");
            }
        }
    }
}

#[async_trait]
impl UpdateHandler for Panel {
    async fn handle(&self, update: AdminUpdate) -> Result<()> {
        let targets = update.refresh_targets();
        if targets.is_empty() {
            tracing::debug!("No views depend on '{}'", update.kind());
            return Ok(());
        }
        // The next update retries whatever failed here.
        self.reload(targets, &format!("'{}'", update.kind())).await;
        self.emit_frame().await;
        Ok(())
    }
}
