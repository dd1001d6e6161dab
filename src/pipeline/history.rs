//! Undo/redo for pipeline edits.
//!
//! History stores operation-level before/after snapshots, never pixels.
//! Every edit knows how to apply itself to an operation list and how to
//! revert itself; undo reverts the newest edit and moves it to the redo
//! stack. Recording a new edit clears the redo stack.

use super::operation::Operation;

/// One reversible change to an operation list.
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineEdit {
    Insert {
        index: usize,
        operation: Operation,
    },
    Remove {
        index: usize,
        operation: Operation,
    },
    Replace {
        index: usize,
        before: Operation,
        after: Operation,
    },
    Move {
        from: usize,
        to: usize,
    },
}

impl PipelineEdit {
    /// Apply the edit going forward.
    pub(crate) fn apply(&self, ops: &mut Vec<Operation>) {
        match self {
            PipelineEdit::Insert { index, operation } => ops.insert(*index, operation.clone()),
            PipelineEdit::Remove { index, .. } => {
                ops.remove(*index);
            }
            PipelineEdit::Replace { index, after, .. } => ops[*index] = after.clone(),
            PipelineEdit::Move { from, to } => move_item(ops, *from, *to),
        }
    }

    /// Undo the edit.
    pub(crate) fn revert(&self, ops: &mut Vec<Operation>) {
        match self {
            PipelineEdit::Insert { index, .. } => {
                ops.remove(*index);
            }
            PipelineEdit::Remove { index, operation } => ops.insert(*index, operation.clone()),
            PipelineEdit::Replace { index, before, .. } => ops[*index] = before.clone(),
            PipelineEdit::Move { from, to } => move_item(ops, *to, *from),
        }
    }
}

pub(crate) fn move_item(ops: &mut Vec<Operation>, from: usize, to: usize) {
    let op = ops.remove(from);
    ops.insert(to, op);
}

#[derive(Debug, Clone, Default)]
pub struct History {
    undo: Vec<PipelineEdit>,
    redo: Vec<PipelineEdit>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, edit: PipelineEdit) {
        self.undo.push(edit);
        self.redo.clear();
    }

    pub fn undo(&mut self, ops: &mut Vec<Operation>) -> Option<&PipelineEdit> {
        let edit = self.undo.pop()?;
        edit.revert(ops);
        self.redo.push(edit);
        self.redo.last()
    }

    pub fn redo(&mut self, ops: &mut Vec<Operation>) -> Option<&PipelineEdit> {
        let edit = self.redo.pop()?;
        edit.apply(ops);
        self.undo.push(edit);
        self.undo.last()
    }

    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    pub fn clear(&mut self) {
        self.undo.clear();
        self.redo.clear();
    }
}
