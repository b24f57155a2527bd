//! Edit session over one month's schedule.
//!
//! The session owns the working container map. Drags and copies change it in
//! memory and mark it dirty; `save` writes it back in one replace, `discard`
//! reloads it from the store.

use std::sync::Arc;
use log::{debug, info, warn};
use serde::{Serialize, Deserialize};

use crate::error::{Result, SchedulerError};
use crate::schedule::drag::DragState;
use crate::schedule::pool::{filtered_pool, seed_pools};
use crate::schedule::propagation::plan_copy;
use crate::schedule::{
    ContainerId, ContainerMap, CopyCommand, CopyPlan, DragEngine, DropAction, MonthKey, PoolFilter,
    ShiftTemplate, Token, TokenClock,
};
use crate::store::ScheduleStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Viewer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Viewing,
    Editing,
}

/// Result of asking to switch edit mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EditToggle {
    Entered,
    Exited,
    /// Leaving with unsaved changes; ask again with confirmation to discard them
    NeedsConfirmation,
}

/// Inputs that stay fixed for a session
#[derive(Debug, Clone)]
pub struct SessionSettings {
    pub template: ShiftTemplate,
    pub special_labels: Vec<String>,
    pub editor: String,
}

impl Default for SessionSettings {
    fn default() -> Self {
        SessionSettings {
            template: ShiftTemplate::default(),
            special_labels: vec!["Closed".to_string(), "Month End".to_string()],
            editor: "admin".to_string(),
        }
    }
}

/// Serializable snapshot handed to the UI
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionView {
    pub month: MonthKey,
    pub role: Role,
    pub is_edit_mode: bool,
    pub has_changes: bool,
    pub published: bool,
    pub schedule_exists: bool,
    pub pool_filter: PoolFilter,
    pub visible_pool: Vec<Token>,
    pub containers: ContainerMap,
}

pub struct Session {
    store: Arc<dyn ScheduleStore>,
    role: Role,
    settings: SessionSettings,
    month: MonthKey,
    containers: ContainerMap,
    published: bool,
    schedule_exists: bool,
    mode: Mode,
    has_changes: bool,
    drag: DragEngine,
    clock: TokenClock,
    pool_filter: PoolFilter,
}

impl Session {
    /// Opens `month` in view mode. Viewers see an unpublished or missing month as empty.
    pub async fn open(
        store: Arc<dyn ScheduleStore>,
        role: Role,
        month: MonthKey,
        settings: SessionSettings,
    ) -> Result<Session> {
        let mut session = Session {
            store,
            role,
            settings,
            month,
            containers: ContainerMap::new(),
            published: false,
            schedule_exists: false,
            mode: Mode::Viewing,
            has_changes: false,
            drag: DragEngine::new(),
            clock: TokenClock::new(),
            pool_filter: PoolFilter::All,
        };
        session.reload().await?;
        Ok(session)
    }

    /// Replaces the stamp source, e.g. with a deterministic clock in tests
    pub fn with_clock(mut self, clock: TokenClock) -> Self {
        self.clock = clock;
        self
    }

    /// Full reset from the store: containers, pools, publish flag, drag state, dirty flag
    async fn reload(&mut self) -> Result<()> {
        let stored = self.store.get_schedule(self.month).await?;
        let staff = self.store.get_sales_staff().await?;

        let (mut containers, published, exists) = match stored {
            Some(schedule) => (schedule.containers, schedule.published, true),
            None => (ContainerMap::new(), false, false),
        };
        if self.role == Role::Viewer && !published {
            containers = ContainerMap::new();
        }
        seed_pools(&mut containers, &staff, &self.settings.special_labels);

        self.containers = containers;
        self.published = published;
        self.schedule_exists = exists;
        self.has_changes = false;
        self.drag = DragEngine::new();
        debug!("Loaded {} ({} containers, published: {})", self.month.label(), self.containers.len(), published);
        Ok(())
    }

    pub fn containers(&self) -> &ContainerMap {
        &self.containers
    }

    pub fn month(&self) -> MonthKey {
        self.month
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn is_edit_mode(&self) -> bool {
        self.mode == Mode::Editing
    }

    pub fn has_changes(&self) -> bool {
        self.has_changes
    }

    pub fn published(&self) -> bool {
        self.published
    }

    pub fn schedule_exists(&self) -> bool {
        self.schedule_exists
    }

    pub fn drag_state(&self) -> &DragState {
        self.drag.state()
    }

    pub fn template(&self) -> &ShiftTemplate {
        &self.settings.template
    }

    pub fn pool_filter(&self) -> PoolFilter {
        self.pool_filter
    }

    pub fn set_pool_filter(&mut self, filter: PoolFilter) {
        self.pool_filter = filter;
    }

    /// Salespeople pool entries under the current filter
    pub fn visible_pool(&self) -> Vec<&Token> {
        filtered_pool(&self.containers, self.pool_filter)
    }

    pub fn view(&self) -> SessionView {
        SessionView {
            month: self.month,
            role: self.role,
            is_edit_mode: self.is_edit_mode(),
            has_changes: self.has_changes,
            published: self.published,
            schedule_exists: self.schedule_exists,
            pool_filter: self.pool_filter,
            visible_pool: self.visible_pool().into_iter().cloned().collect(),
            containers: self.containers.clone(),
        }
    }

    fn require_admin(&self) -> Result<()> {
        match self.role {
            Role::Admin => Ok(()),
            Role::Viewer => Err(SchedulerError::NotAuthorized),
        }
    }

    fn require_editing(&self) -> Result<()> {
        self.require_admin()?;
        if self.mode != Mode::Editing {
            return Err(SchedulerError::NotEditing);
        }
        Ok(())
    }

    /// Enters or leaves edit mode. Leaving with unsaved changes needs
    /// `confirm_discard`; a confirmed exit reloads the stored schedule.
    pub async fn toggle_edit_mode(&mut self, confirm_discard: bool) -> Result<EditToggle> {
        self.require_admin()?;
        match self.mode {
            Mode::Viewing => {
                self.mode = Mode::Editing;
                info!("Editing {}", self.month.label());
                Ok(EditToggle::Entered)
            }
            Mode::Editing if !self.has_changes => {
                self.mode = Mode::Viewing;
                self.drag = DragEngine::new();
                Ok(EditToggle::Exited)
            }
            Mode::Editing if !confirm_discard => Ok(EditToggle::NeedsConfirmation),
            Mode::Editing => {
                self.discard().await?;
                self.mode = Mode::Viewing;
                Ok(EditToggle::Exited)
            }
        }
    }

    pub fn start_drag(&mut self, item: Token, source: ContainerId) -> Result<()> {
        self.require_editing()?;
        self.drag.start_drag(item, source);
        Ok(())
    }

    /// Ends the current drag on `target` (None when released outside any container)
    pub fn end_drag(&mut self, target: Option<&ContainerId>) -> Result<DropAction> {
        self.require_editing()?;
        let action = self.drag.end_drag(
            target,
            &mut self.containers,
            &self.month,
            &self.settings.template,
            &mut self.clock,
        );
        if action.mutates() {
            self.has_changes = true;
        }
        debug!("Drop resolved as {:?}", action);
        Ok(action)
    }

    async fn previous_month_containers(&self, command: &CopyCommand) -> Result<Option<ContainerMap>> {
        if !command.reads_previous_month(&self.month)? {
            return Ok(None);
        }
        let stored = self.store.get_schedule(self.month.previous()?).await?;
        Ok(Some(stored.map(|s| s.containers).unwrap_or_default()))
    }

    /// Plans a copy without touching the working map. The plan's prompt is what
    /// the user confirms before `apply_copy`.
    pub async fn plan_copy(&mut self, command: CopyCommand) -> Result<CopyPlan> {
        self.require_editing()?;
        let previous = self.previous_month_containers(&command).await?;
        plan_copy(command, &self.month, &self.containers, previous.as_ref(), &mut self.clock)
    }

    /// Runs a confirmed plan's command against the current working map and
    /// merges the result. Returns the number of slots written.
    pub async fn apply_copy(&mut self, plan: CopyPlan) -> Result<usize> {
        self.require_editing()?;
        if plan.month != self.month {
            return Err(SchedulerError::StalePlan { month: plan.month.month(), year: plan.month.year() });
        }

        let previous = self.previous_month_containers(&plan.command).await?;
        let current = plan_copy(plan.command, &self.month, &self.containers, previous.as_ref(), &mut self.clock)?;
        let mut partial = current.partial;
        let month = self.month;
        let template = &self.settings.template;
        partial.retain(|id, _| match id.as_slot() {
            Some(key) => template.is_valid_slot(&month, key),
            None => false,
        });

        let written = partial.len();
        if written > 0 {
            self.containers.merge(partial);
            self.has_changes = true;
        }
        info!("Copied into {} slots of {}", written, self.month.label());
        Ok(written)
    }

    /// Writes the working map to the store. Local state survives a failed save.
    pub async fn save(&mut self) -> Result<()> {
        self.require_editing()?;
        let result = self
            .store
            .update_schedule(self.month, self.containers.clone(), &self.settings.editor)
            .await;
        match result {
            Ok(()) => {
                self.has_changes = false;
                self.schedule_exists = true;
                info!("Saved {} as {}", self.month.label(), self.settings.editor);
                Ok(())
            }
            Err(e) => {
                warn!("Saving {} failed: {}", self.month.label(), e);
                Err(e)
            }
        }
    }

    /// Abandons in-memory changes by reloading the stored schedule
    pub async fn discard(&mut self) -> Result<()> {
        self.require_admin()?;
        self.reload().await?;
        info!("Discarded changes to {}", self.month.label());
        Ok(())
    }

    /// Flips the stored publish flag. Independent of edit mode and unsaved changes.
    pub async fn toggle_publish(&mut self) -> Result<bool> {
        self.require_admin()?;
        let next = !self.published;
        self.store.toggle_publish_schedule(self.month, next).await?;
        self.published = next;
        info!("{} is now {}", self.month.label(), if next { "published" } else { "a draft" });
        Ok(next)
    }

    /// Opens another month. Viewers may only open published months.
    pub async fn navigate(&mut self, month: MonthKey) -> Result<()> {
        if self.has_changes {
            return Err(SchedulerError::UnsavedChanges);
        }
        if self.role == Role::Viewer {
            let published = self
                .store
                .get_schedule(month)
                .await?
                .map(|s| s.published)
                .unwrap_or(false);
            if !published {
                return Err(SchedulerError::NotPublished { month: month.month(), year: month.year() });
            }
        }
        let current = self.month;
        self.month = month;
        if let Err(e) = self.reload().await {
            self.month = current;
            return Err(e);
        }
        Ok(())
    }

    pub async fn next_month(&mut self) -> Result<()> {
        let next = self.month.next()?;
        self.navigate(next).await
    }

    pub async fn previous_month(&mut self) -> Result<()> {
        let previous = self.month.previous()?;
        self.navigate(previous).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::{PoolId, SalesStaff, StaffType};
    use crate::store::MemoryStore;

    fn staff() -> Vec<SalesStaff> {
        vec![
            SalesStaff { name: "Gio".to_string(), staff_type: StaffType::New, display_name: String::new() },
            SalesStaff { name: "Ana".to_string(), staff_type: StaffType::Used, display_name: String::new() },
        ]
    }

    async fn admin_session(store: Arc<MemoryStore>) -> Session {
        let month = MonthKey::new(3, 2024).unwrap();
        Session::open(store, Role::Admin, month, SessionSettings::default())
            .await
            .unwrap()
            .with_clock(TokenClock::starting_at(1))
    }

    #[tokio::test]
    async fn editing_requires_admin() {
        let store = Arc::new(MemoryStore::with_staff(staff()));
        let month = MonthKey::new(3, 2024).unwrap();
        let mut viewer = Session::open(store, Role::Viewer, month, SessionSettings::default()).await.unwrap();
        assert!(matches!(viewer.toggle_edit_mode(false).await, Err(SchedulerError::NotAuthorized)));
        assert!(matches!(viewer.toggle_publish().await, Err(SchedulerError::NotAuthorized)));
    }

    #[tokio::test]
    async fn drags_need_edit_mode() {
        let store = Arc::new(MemoryStore::with_staff(staff()));
        let mut session = admin_session(store).await;
        let result = session.start_drag(Token::parse("new:Gio"), ContainerId::Pool(PoolId::Salespeople));
        assert!(matches!(result, Err(SchedulerError::NotEditing)));
    }

    #[tokio::test]
    async fn leaving_edit_mode_clean_needs_no_confirmation() {
        let store = Arc::new(MemoryStore::with_staff(staff()));
        let mut session = admin_session(store).await;
        assert_eq!(session.toggle_edit_mode(false).await.unwrap(), EditToggle::Entered);
        assert_eq!(session.toggle_edit_mode(false).await.unwrap(), EditToggle::Exited);
        assert_eq!(session.mode(), Mode::Viewing);
    }

    #[tokio::test]
    async fn pools_are_seeded_from_directory_and_settings() {
        let store = Arc::new(MemoryStore::with_staff(staff()));
        let mut session = admin_session(store).await;
        assert_eq!(session.containers().pool(PoolId::Salespeople).len(), 2);
        assert_eq!(session.containers().pool(PoolId::SpecialLabels).len(), 2);

        session.set_pool_filter(PoolFilter::Used);
        let visible: Vec<String> = session.visible_pool().iter().map(|t| t.to_string()).collect();
        assert_eq!(visible, vec!["used:Ana"]);
    }

    #[tokio::test]
    async fn copy_plans_from_another_month_are_rejected() {
        let store = Arc::new(MemoryStore::with_staff(staff()));
        let mut session = admin_session(store).await;
        session.toggle_edit_mode(false).await.unwrap();
        let plan = session.plan_copy(CopyCommand::ToFutureWeekdays { day: 4 }).await.unwrap();

        let mut other = plan.clone();
        other.month = MonthKey::new(4, 2024).unwrap();
        assert!(matches!(session.apply_copy(other).await, Err(SchedulerError::StalePlan { .. })));
        assert_eq!(session.apply_copy(plan).await.unwrap(), 0);
        assert!(!session.has_changes());
    }

    #[tokio::test]
    async fn leaving_edit_mode_drops_an_unfinished_drag() {
        let store = Arc::new(MemoryStore::with_staff(staff()));
        let mut session = admin_session(store).await;
        session.toggle_edit_mode(false).await.unwrap();
        session.start_drag(Token::parse("new:Gio"), ContainerId::Pool(PoolId::Salespeople)).unwrap();
        assert_eq!(session.toggle_edit_mode(false).await.unwrap(), EditToggle::Exited);
        assert_eq!(session.drag_state(), &DragState::Idle);

        session.toggle_edit_mode(false).await.unwrap();
        let action = session.end_drag(Some(&ContainerId::slot(4, 0))).unwrap();
        assert_eq!(action, DropAction::Ignore);
        assert!(session.containers().slot(4, 0).is_empty());
        assert!(!session.has_changes());
    }
}
