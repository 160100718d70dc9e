pub mod actions;
pub mod positions;
pub mod roles;


pub use actions::{PositionAction, RoleAction};
pub use positions::{PositionLayout, PositionLine, PositionScreen};
pub use roles::RolePermissionScreen;

use crate::notify::{Notification, NotificationSink};
use grid_staging::{Identity, RemovalOutcome, StagingError};

/// Events emitted by a grid widget. Rows are addressed by their row key
/// (`Identity::row_key`), so unsaved rows render before they have ids.
#[derive(Debug, Clone, PartialEq)]
pub enum GridEvent<E> {
    CellValueChanged { row: String, payload: E },
    SelectionChanged(Vec<String>),
    RowClicked(String),
}

impl<E> GridEvent<E> {
    pub fn description(&self) -> &'static str {
        match self {
            GridEvent::CellValueChanged { .. } => "Applying cell edit",
            GridEvent::SelectionChanged(_) => "Updating selection",
            GridEvent::RowClicked(_) => "Row clicked",
        }
    }
}

pub(crate) fn parse_row(key: &str, notifier: &mut impl NotificationSink) -> Option<Identity> {
    match key.parse::<Identity>() {
        Ok(identity) => Some(identity),
        Err(e) => {
            notifier.notify(Notification::error(e.to_string()));
            None
        }
    }
}

pub(crate) fn parse_rows(keys: &[String], notifier: &mut impl NotificationSink) -> Vec<Identity> {
    keys.iter().filter_map(|key| parse_row(key, notifier)).collect()
}

pub(crate) fn report_removals(outcomes: Vec<grid_staging::Result<RemovalOutcome>>, notifier: &mut impl NotificationSink) {
    for outcome in outcomes {
        if let Err(e) = outcome {
            notifier.notify(Notification::error(e.to_string()));
        }
    }
}

/// Turns a finished commit into one notification.
pub(crate) fn report_commit(committed: usize, total: usize, notifier: &mut impl NotificationSink) {
    if total == 0 {
        notifier.notify(Notification::warning("Nothing to save"));
    } else if committed == total {
        notifier.notify(Notification::success(format!("Saved {total} change(s)")));
    } else {
        notifier.notify(Notification::warning(format!(
            "{} of {total} change(s) failed; failed rows are still marked as modified",
            total - committed
        )));
    }
}

pub(crate) fn report_error(error: &StagingError, notifier: &mut impl NotificationSink) {
    match error {
        StagingError::Validation(report) => {
            notifier.notify(Notification::error(format!("Nothing was saved, {report}")));
        }
        other => notifier.notify(Notification::error(other.to_string())),
    }
}
