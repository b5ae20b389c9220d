//! Status transitions.
//!
//! Every status may move to every other status, including back out of
//! `completed`. Validation only classifies the move so callers know whether
//! the task has to leave its current position sequence.

use crate::model::{ScopeMode, TaskStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Unchanged(TaskStatus),
    Changed { from: TaskStatus, to: TaskStatus },
}

impl Transition {
    pub fn target(self) -> TaskStatus {
        match self {
            Transition::Unchanged(status) => status,
            Transition::Changed { to, .. } => to,
        }
    }

    pub fn is_change(self) -> bool {
        matches!(self, Transition::Changed { .. })
    }

    /// A status change moves the task into another column only when
    /// positions are scoped per status.
    pub fn requires_reposition(self, mode: ScopeMode) -> bool {
        self.is_change() && mode == ScopeMode::Status
    }
}

pub fn validate(from: TaskStatus, to: TaskStatus) -> Transition {
    if from == to {
        Transition::Unchanged(from)
    } else {
        Transition::Changed { from, to }
    }
}
