use anyhow::Result;
use tracing::{debug, warn};

use super::LineEditor;
use super::host::Control;
use crate::line::Line;
use crate::remote::{AnnotationService, ServiceFuture};

const TRAINING_FLAG_ALERT: &str = "Unable to set training flag. Check your remote connection.";
const DELETE_FLAG_ALERT: &str = "Unable to set delete flag. Check your remote connection.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitOutcome {
    Committed,
    /// The remote call failed and the local value was restored.
    RolledBack,
    NoLine,
}

/// A boolean line field changed locally first and confirmed remotely.
struct FlagCommit {
    control: Control,
    field: fn(&mut Line) -> &mut bool,
    value: bool,
    call: ServiceFuture<()>,
    failure_alert: &'static str,
}

fn training_field(line: &mut Line) -> &mut bool {
    &mut line.for_training
}

fn valid_field(line: &mut Line) -> &mut bool {
    &mut line.valid
}

impl<S: AnnotationService> LineEditor<S> {
    pub async fn set_training_flag(&mut self, line_id: &str, included: bool) -> CommitOutcome {
        let Some(index) = self.index_of(line_id) else {
            return CommitOutcome::NoLine;
        };
        let commit = FlagCommit {
            control: Control::Training,
            field: training_field,
            value: included,
            call: self.service.set_training_flag(line_id, included),
            failure_alert: TRAINING_FLAG_ALERT,
        };
        let outcome = self.optimistic_commit(index, commit).await;
        let line = &self.lines[index];
        self.host.panel.set_row_training(line.row, line.for_training);
        outcome
    }

    pub async fn set_delete_flag(&mut self, line_id: &str, deleted: bool) -> CommitOutcome {
        let Some(index) = self.index_of(line_id) else {
            return CommitOutcome::NoLine;
        };
        let commit = FlagCommit {
            control: Control::Delete,
            field: valid_field,
            value: !deleted,
            call: self.service.set_delete_flag(line_id, deleted),
            failure_alert: DELETE_FLAG_ALERT,
        };
        let outcome = self.optimistic_commit(index, commit).await;
        if outcome == CommitOutcome::Committed {
            self.host.panel.focus_row(self.lines[index].row);
        }
        outcome
    }

    /// Flips the training flag of the focused line.
    pub async fn toggle_training(&mut self) -> CommitOutcome {
        let Some(line) = self.focused_line() else {
            return CommitOutcome::NoLine;
        };
        let (line_id, included) = (line.id.clone(), !line.for_training);
        self.set_training_flag(&line_id, included).await
    }

    /// Deletes the focused line, or restores it when already deleted.
    pub async fn toggle_delete(&mut self) -> CommitOutcome {
        let Some(line) = self.focused_line() else {
            return CommitOutcome::NoLine;
        };
        let (line_id, deleted) = (line.id.clone(), line.valid);
        self.set_delete_flag(&line_id, deleted).await
    }

    async fn optimistic_commit(&mut self, index: usize, commit: FlagCommit) -> CommitOutcome {
        let previous = std::mem::replace((commit.field)(&mut self.lines[index]), commit.value);
        self.restyle(index);
        self.busy.insert(commit.control);
        self.host.panel.set_control_enabled(commit.control, false);

        let pending = PendingCommit {
            editor: self,
            index,
            control: commit.control,
            field: commit.field,
            previous,
            armed: true,
        };
        let result = commit.call.await;
        pending.finish(result, commit.failure_alert)
    }
}

/// An applied optimistic value whose remote call has not finished yet.
/// Dropping it before `finish` restores the previous value and releases
/// the control.
struct PendingCommit<'a, S: AnnotationService> {
    editor: &'a mut LineEditor<S>,
    index: usize,
    control: Control,
    field: fn(&mut Line) -> &mut bool,
    previous: bool,
    armed: bool,
}

impl<S: AnnotationService> PendingCommit<'_, S> {
    fn finish(mut self, result: Result<()>, failure_alert: &str) -> CommitOutcome {
        self.armed = false;
        let outcome = match result {
            Ok(()) => CommitOutcome::Committed,
            Err(err) => {
                if let Some(line) = self.editor.lines.get(self.index) {
                    warn!(
                        "rolling back {:?} on line {}: {:#}",
                        self.control, line.id, err
                    );
                }
                self.rollback();
                self.editor.host.notifier.alert(failure_alert);
                CommitOutcome::RolledBack
            }
        };
        self.release();
        outcome
    }

    fn rollback(&mut self) {
        if let Some(line) = self.editor.lines.get_mut(self.index) {
            *(self.field)(line) = self.previous;
        }
    }

    fn release(&mut self) {
        let editor = &mut *self.editor;
        editor.busy.remove(&self.control);
        editor.host.panel.set_control_enabled(self.control, true);
        editor.restyle(self.index);
        if editor.focused == Some(self.index) {
            editor.refresh_controls();
        }
    }
}

impl<S: AnnotationService> Drop for PendingCommit<'_, S> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        debug!("{:?} call abandoned; restoring previous value", self.control);
        self.rollback();
        self.release();
    }
}
