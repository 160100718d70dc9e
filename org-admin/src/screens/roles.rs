use super::{parse_row, parse_rows, report_commit, report_error, report_removals, GridEvent, RoleAction};
use crate::config::ConsoleConfig;
use crate::entities::{Permission, Role};
use crate::http_client::{ApiClient, RestCollection};
use crate::notify::{LogNotifier, Notification, NotificationSink};
use grid_staging::{BulkAction, Identity, LinkedOutcome, MasterDetailController, MasterState, RemoteCollection};
use std::collections::VecDeque;

/// Role grid with the permission grid of the selected role underneath.
pub struct RolePermissionScreen<RR, RP, N = LogNotifier> {
    controller: MasterDetailController<Role, Permission, RR, RP>,
    notifier: N,
    pending_actions: VecDeque<RoleAction>,
    last_outcome: Option<LinkedOutcome>,
}

impl RolePermissionScreen<RestCollection<Role>, RestCollection<Permission>> {
    pub fn connect(config: &ConsoleConfig) -> anyhow::Result<Self> {
        let api = ApiClient::new(&config.api)?;
        log::info!("Role screen connected to {}", api.base_url());
        let controller = MasterDetailController::new(
            "roles",
            "permissions",
            api.collection::<Role>(),
            api.collection::<Permission>(),
            config.engine.clone(),
        );
        Ok(Self::new(controller, LogNotifier))
    }
}

impl<RR, RP, N> RolePermissionScreen<RR, RP, N>
where
    RR: RemoteCollection<Role>,
    RP: RemoteCollection<Permission>,
    N: NotificationSink,
{
    pub fn new(controller: MasterDetailController<Role, Permission, RR, RP>, notifier: N) -> Self {
        Self {
            controller,
            notifier,
            pending_actions: VecDeque::new(),
            last_outcome: None,
        }
    }

    pub fn controller(&self) -> &MasterDetailController<Role, Permission, RR, RP> {
        &self.controller
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    pub fn notifier_mut(&mut self) -> &mut N {
        &mut self.notifier
    }

    pub fn last_outcome(&self) -> Option<&LinkedOutcome> {
        self.last_outcome.as_ref()
    }

    /// Enables the "assign permission" button.
    pub fn can_assign(&self) -> bool {
        self.controller.is_detail_action_enabled(BulkAction::Assign)
    }

    pub fn dispatch(&mut self, action: RoleAction) {
        log::debug!("Dispatching action: {:?}", action.description());
        self.pending_actions.push_back(action);
    }

    /// Processes one queued action.
    pub async fn update(&mut self) {
        if let Some(action) = self.pending_actions.pop_front() {
            log::debug!("Processing action: {}", action.description());
            self.handle_action(action).await;
        }
    }

    pub fn has_pending_actions(&self) -> bool {
        !self.pending_actions.is_empty()
    }

    pub fn clear_pending_actions(&mut self) {
        self.pending_actions.clear();
    }

    async fn handle_action(&mut self, action: RoleAction) {
        match action {
            RoleAction::Load => {
                if let Err(e) = self.controller.load().await {
                    report_error(&e, &mut self.notifier);
                }
            }
            RoleAction::SelectRole { row } => {
                let master = match row {
                    Some(key) => match parse_row(&key, &mut self.notifier) {
                        Some(identity) => Some(identity),
                        None => return,
                    },
                    None => None,
                };
                self.select_role(master).await;
            }
            RoleAction::AddRole => {
                let identity = self.controller.add_master_row(None, Role::default());
                self.controller.master_selection_mut().select([identity]);
            }
            RoleAction::AddPermission { menu_code } => self.handle_add_permission(menu_code),
            RoleAction::RemoveSelectedRoles => {
                if !self.controller.is_master_action_enabled(BulkAction::Delete) {
                    self.notifier
                        .notify(Notification::warning("Select at least one role that is not a system role"));
                    return;
                }
                let selected: Vec<Identity> = self.controller.master().selection().identities().cloned().collect();
                let outcomes = self.controller.remove_master_rows(selected);
                report_removals(outcomes, &mut self.notifier);
            }
            RoleAction::RemoveSelectedPermissions => {
                if !self.controller.is_detail_action_enabled(BulkAction::Delete) {
                    self.notifier.notify(Notification::warning("Select at least one permission"));
                    return;
                }
                let selected: Vec<Identity> = self.controller.detail().selection().identities().cloned().collect();
                let outcomes = self.controller.remove_detail_rows(selected);
                report_removals(outcomes, &mut self.notifier);
            }
            RoleAction::RoleGrid(event) => self.handle_role_grid(event).await,
            RoleAction::PermissionGrid(event) => self.handle_permission_grid(event),
            RoleAction::Commit => self.handle_commit().await,
            RoleAction::Cancel => {
                self.controller.cancel();
                self.notifier.notify(Notification::warning("Unsaved changes were discarded"));
            }
        }
    }

    async fn select_role(&mut self, master: Option<Identity>) {
        if let Err(e) = self.controller.on_master_selected(master).await {
            report_error(&e, &mut self.notifier);
        }
    }

    fn handle_add_permission(&mut self, menu_code: String) {
        if !self.can_assign() {
            let message = match self.controller.master_state() {
                MasterState::NoneSelected => "Select a role first",
                _ => "Save the role before assigning permissions",
            };
            self.notifier.notify(Notification::warning(message));
            return;
        }
        let Some(role) = self.controller.selected_master().cloned() else {
            return;
        };
        if let Err(e) = self.controller.add_detail_row(Permission::new(role, &menu_code)) {
            report_error(&e, &mut self.notifier);
        }
    }

    async fn handle_role_grid(&mut self, event: GridEvent<Role>) {
        match event {
            GridEvent::CellValueChanged { row, payload } => {
                let Some(identity) = parse_row(&row, &mut self.notifier) else {
                    return;
                };
                if let Err(e) = self.controller.edit_master(&identity, payload) {
                    report_error(&e, &mut self.notifier);
                }
            }
            GridEvent::SelectionChanged(keys) => {
                let selected = parse_rows(&keys, &mut self.notifier);
                self.controller.master_selection_mut().select(selected);
            }
            GridEvent::RowClicked(key) => {
                if let Some(identity) = parse_row(&key, &mut self.notifier) {
                    self.select_role(Some(identity)).await;
                }
            }
        }
    }

    fn handle_permission_grid(&mut self, event: GridEvent<Permission>) {
        match event {
            GridEvent::CellValueChanged { row, payload } => {
                let Some(identity) = parse_row(&row, &mut self.notifier) else {
                    return;
                };
                if let Err(e) = self.controller.edit_detail(&identity, payload) {
                    report_error(&e, &mut self.notifier);
                }
            }
            GridEvent::SelectionChanged(keys) => {
                let selected = parse_rows(&keys, &mut self.notifier);
                self.controller.detail_selection_mut().select(selected);
            }
            GridEvent::RowClicked(key) => {
                if let Some(identity) = parse_row(&key, &mut self.notifier) {
                    self.controller.detail_selection_mut().toggle(identity);
                }
            }
        }
    }

    async fn handle_commit(&mut self) {
        match self.controller.commit().await {
            Ok(outcome) => {
                let committed = outcome.master.committed_count() + outcome.detail.committed_count();
                report_commit(committed, outcome.len(), &mut self.notifier);
                let skipped = outcome.detail.skipped().count();
                if skipped > 0 {
                    self.notifier.notify(Notification::warning(format!(
                        "{skipped} permission(s) were not sent because their role could not be saved"
                    )));
                }
                self.last_outcome = Some(outcome);
            }
            Err(e) => report_error(&e, &mut self.notifier),
        }
    }
}
