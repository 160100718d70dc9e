use super::{parse_row, parse_rows, report_commit, report_error, report_removals, GridEvent, PositionAction};
use crate::config::ConsoleConfig;
use crate::entities::Position;
use crate::http_client::{ApiClient, RestCollection};
use crate::notify::{LogNotifier, Notification, NotificationSink};
use grid_staging::grouping::{is_row_group_boundary, merge_spans};
use grid_staging::{BulkAction, CommitOutcome, EditSession, Entity, MasterState, RemoteCollection, RowStatus};
use std::collections::VecDeque;
use std::ops::Range;

/// One rendered grid line.
#[derive(Debug, Clone, PartialEq)]
pub struct PositionLine {
    pub row_key: String,
    pub status: RowStatus,
    pub position: Position,
    pub error: Option<String>,
    /// Draw a separator below this line.
    pub group_end: bool,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PositionLayout {
    pub lines: Vec<PositionLine>,
    /// Line ranges whose status column is merged into one cell.
    pub status_spans: Vec<Range<usize>>,
}

/// Positions grouped by concurrent status, one representative per group.
pub struct PositionScreen<R, N = LogNotifier> {
    session: EditSession<Position, R>,
    notifier: N,
    pending_actions: VecDeque<PositionAction>,
    last_outcome: Option<CommitOutcome>,
}

impl PositionScreen<RestCollection<Position>> {
    pub fn connect(config: &ConsoleConfig) -> anyhow::Result<Self> {
        let api = ApiClient::new(&config.api)?;
        log::info!("Position screen connected to {}", api.base_url());
        let session = EditSession::new("positions", api.collection::<Position>(), config.engine.clone());
        Ok(Self::new(session, LogNotifier))
    }
}

impl<R, N> PositionScreen<R, N>
where
    R: RemoteCollection<Position>,
    N: NotificationSink,
{
    pub fn new(session: EditSession<Position, R>, notifier: N) -> Self {
        Self {
            session,
            notifier,
            pending_actions: VecDeque::new(),
            last_outcome: None,
        }
    }

    pub fn session(&self) -> &EditSession<Position, R> {
        &self.session
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    pub fn notifier_mut(&mut self) -> &mut N {
        &mut self.notifier
    }

    pub fn last_outcome(&self) -> Option<&CommitOutcome> {
        self.last_outcome.as_ref()
    }

    pub fn dispatch(&mut self, action: PositionAction) {
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

    /// Rows in display order with group separators and merged status cells.
    pub fn layout(&self) -> PositionLayout {
        let rows = self.session.collection().ordered();
        let lines = rows
            .iter()
            .enumerate()
            .map(|(index, row)| PositionLine {
                row_key: row.identity().row_key(),
                status: row.status(),
                position: row.payload().clone(),
                error: row.error().map(str::to_string),
                group_end: is_row_group_boundary(&rows, index),
            })
            .collect();
        let status_spans = merge_spans(&rows, |row| row.payload().group_key());
        PositionLayout { lines, status_spans }
    }

    async fn handle_action(&mut self, action: PositionAction) {
        match action {
            PositionAction::Load => {
                if let Err(e) = self.session.load().await {
                    report_error(&e, &mut self.notifier);
                }
            }
            PositionAction::AddPosition { concurrent_status_code } => {
                // The first position of a new status starts as its representative.
                let group_has_representative = self.session.collection().rows().iter().any(|row| {
                    let position = row.payload();
                    row.is_live()
                        && position.is_representative
                        && position.concurrent_status_code == concurrent_status_code
                });
                let defaults = Position {
                    is_representative: !group_has_representative,
                    ..Position::default()
                };
                self.session.add_row(Some(concurrent_status_code), defaults);
            }
            PositionAction::SetRepresentative { row } => {
                let Some(identity) = parse_row(&row, &mut self.notifier) else {
                    return;
                };
                if let Err(e) = self.session.set_representative(&identity) {
                    report_error(&e, &mut self.notifier);
                }
            }
            PositionAction::RemoveSelected => {
                let enabled = self
                    .session
                    .collection()
                    .is_bulk_action_enabled(BulkAction::Delete, MasterState::NoneSelected);
                if !enabled {
                    self.notifier.notify(Notification::warning("Select at least one position"));
                    return;
                }
                let outcomes = self.session.remove_selected();
                report_removals(outcomes, &mut self.notifier);
            }
            PositionAction::Grid(event) => self.handle_grid(event),
            PositionAction::Commit => match self.session.commit().await {
                Ok(outcome) => {
                    report_commit(outcome.committed_count(), outcome.rows.len(), &mut self.notifier);
                    self.last_outcome = Some(outcome);
                }
                Err(e) => report_error(&e, &mut self.notifier),
            },
            PositionAction::Cancel => {
                self.session.cancel();
                self.notifier.notify(Notification::warning("Unsaved changes were discarded"));
            }
        }
    }

    fn handle_grid(&mut self, event: GridEvent<Position>) {
        match event {
            GridEvent::CellValueChanged { row, payload } => {
                let Some(identity) = parse_row(&row, &mut self.notifier) else {
                    return;
                };
                if let Err(e) = self.session.edit(&identity, payload) {
                    report_error(&e, &mut self.notifier);
                }
            }
            GridEvent::SelectionChanged(keys) => {
                let selected = parse_rows(&keys, &mut self.notifier);
                self.session.selection_mut().select(selected);
            }
            GridEvent::RowClicked(key) => {
                if let Some(identity) = parse_row(&key, &mut self.notifier) {
                    self.session.selection_mut().toggle(identity);
                }
            }
        }
    }
}
