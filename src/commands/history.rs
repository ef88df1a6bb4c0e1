//! Undo/redo history

use std::collections::VecDeque;

use log::debug;

use super::Command;
use crate::model::XsdTree;

/// Default number of undoable steps kept
pub const DEFAULT_MAX_UNDO: usize = 100;

/// Bounded undo and redo stacks
pub struct CommandHistory {
    undo_stack: VecDeque<Box<dyn Command>>,
    redo_stack: Vec<Box<dyn Command>>,
    max_undo: usize,
}

impl std::fmt::Debug for CommandHistory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandHistory")
            .field("undo", &self.undo_stack.len())
            .field("redo", &self.redo_stack.len())
            .field("max_undo", &self.max_undo)
            .finish()
    }
}

impl Default for CommandHistory {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_UNDO)
    }
}

impl CommandHistory {
    /// Create a history keeping at most `max_undo` steps (at least one)
    pub fn new(max_undo: usize) -> Self {
        Self {
            undo_stack: VecDeque::new(),
            redo_stack: Vec::new(),
            max_undo: max_undo.max(1),
        }
    }

    /// Execute a command and record it
    ///
    /// A successful command clears the redo stack and is merged into the
    /// previous step when that step accepts it.
    pub fn execute(&mut self, tree: &mut XsdTree, mut command: Box<dyn Command>) -> bool {
        if !command.execute(tree) {
            return false;
        }
        Self::release_all(tree, self.redo_stack.drain(..));

        if let Some(top) = self.undo_stack.back_mut() {
            if top.can_merge_with(command.as_ref()) && top.merge(command.as_ref()) {
                debug!("merged '{}' into previous step", command.description());
                return true;
            }
        }

        self.undo_stack.push_back(command);
        while self.undo_stack.len() > self.max_undo {
            if let Some(mut dropped) = self.undo_stack.pop_front() {
                dropped.release(tree);
            }
        }
        true
    }

    fn release_all(tree: &mut XsdTree, commands: impl Iterator<Item = Box<dyn Command>>) {
        for mut command in commands {
            command.release(tree);
        }
    }

    /// Undo the most recent step
    pub fn undo(&mut self, tree: &mut XsdTree) -> bool {
        let Some(mut command) = self.undo_stack.pop_back() else {
            return false;
        };
        if command.undo(tree) {
            self.redo_stack.push(command);
            true
        } else {
            self.undo_stack.push_back(command);
            false
        }
    }

    /// Re-apply the most recently undone step
    pub fn redo(&mut self, tree: &mut XsdTree) -> bool {
        let Some(mut command) = self.redo_stack.pop() else {
            return false;
        };
        if command.execute(tree) {
            self.undo_stack.push_back(command);
            true
        } else {
            self.redo_stack.push(command);
            false
        }
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Description of the step `undo` would revert
    pub fn undo_description(&self) -> Option<String> {
        self.undo_stack.back().map(|c| c.description())
    }

    /// Description of the step `redo` would re-apply
    pub fn redo_description(&self) -> Option<String> {
        self.redo_stack.last().map(|c| c.description())
    }

    pub fn undo_len(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_len(&self) -> usize {
        self.redo_stack.len()
    }

    pub fn max_undo(&self) -> usize {
        self.max_undo
    }

    /// Forget every step
    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }
}
