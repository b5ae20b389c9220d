//! Client-side view of one column with optimistic moves.
//!
//! A drag-and-drop client reorders its local copy at once and sends the
//! move. The server answer is then reconciled: success adopts the server's
//! column order, failure discards the local guess and re-reads the
//! authoritative order. Each session owns its own `OptimisticColumn`.

use serde::Serialize;

use crate::board::TaskBoard;
use crate::error::Result;
use crate::model::{Scope, TaskId};
use crate::reorder::{MoveOutcome, MoveRequest};
use crate::storage::BoardStore;

#[derive(Debug, Clone, Serialize)]
pub struct OptimisticColumn {
    scope: Scope,
    order: Vec<TaskId>,
    pending: Option<TaskId>,
}

impl OptimisticColumn {
    pub fn new(scope: Scope, order: Vec<TaskId>) -> Self {
        Self {
            scope,
            order,
            pending: None,
        }
    }

    /// Load the column's current order from the board.
    pub fn load<S: BoardStore>(board: &TaskBoard<S>, scope: Scope) -> Result<Self> {
        let order = board
            .column(&scope)?
            .into_iter()
            .map(|task| task.id)
            .collect();
        Ok(Self::new(scope, order))
    }

    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    pub fn order(&self) -> &[TaskId] {
        &self.order
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Place `task` at `index` locally and build the request to send.
    pub fn drop_task(&mut self, task: TaskId, index: usize) -> MoveRequest {
        self.order.retain(|id| id != &task);
        let index = index.min(self.order.len());
        self.order.insert(index, task.clone());
        self.pending = Some(task.clone());

        MoveRequest {
            task,
            milestone: Some(self.scope.milestone.clone()),
            status: self.scope.status,
            index: i64::try_from(index).unwrap_or(i64::MAX),
        }
    }

    /// Drop `task` from the local view when it is dragged to another column.
    pub fn remove(&mut self, task: &TaskId) -> bool {
        let before = self.order.len();
        self.order.retain(|id| id != task);
        self.order.len() != before
    }

    /// Settle the local view against the server's answer to a move.
    pub fn reconcile<S: BoardStore>(
        &mut self,
        board: &TaskBoard<S>,
        result: &Result<MoveOutcome>,
    ) -> Result<()> {
        self.pending = None;
        match result {
            Ok(outcome) if outcome.scope == self.scope => {
                self.order = outcome.column.clone();
                Ok(())
            }
            Ok(_) => self.refresh(board),
            Err(err) => {
                tracing::debug!(scope = %self.scope, %err, "move rejected, reloading column");
                self.refresh(board)
            }
        }
    }

    fn refresh<S: BoardStore>(&mut self, board: &TaskBoard<S>) -> Result<()> {
        *self = Self::load(board, self.scope.clone())?;
        Ok(())
    }
}
