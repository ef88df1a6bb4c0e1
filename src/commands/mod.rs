//! Undoable edits over an [`XsdTree`]
//!
//! - [`Command`]: one reversible mutation; `execute`/`undo` report `false`
//!   and leave the tree untouched when a precondition fails
//! - [`CommandHistory`]: bounded undo/redo stacks with edit coalescing
//!
//! Every command moves through `Unexecuted -> Executed <-> Undone`. Undoing a
//! command that is not executed, or executing one that already is, is a no-op
//! returning `false`.

mod composite;
mod facet;
mod history;
mod nodes;
mod property;
mod rename;

use std::any::Any;

use crate::model::XsdTree;

pub use composite::CompositeCommand;
pub use facet::AddFacetCommand;
pub use history::{CommandHistory, DEFAULT_MAX_UNDO};
pub use nodes::{AddNodeCommand, DeleteNodeCommand, MoveNodeCommand};
pub use property::SetPropertyCommand;
pub use rename::RenameComponentCommand;

/// Lifecycle of a command
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CommandState {
    #[default]
    Unexecuted,
    Executed,
    Undone,
}

impl CommandState {
    /// Check if `execute` may run
    pub fn can_execute(&self) -> bool {
        !matches!(self, CommandState::Executed)
    }

    /// Check if `undo` may run
    pub fn can_undo(&self) -> bool {
        matches!(self, CommandState::Executed)
    }
}

/// A reversible mutation of the tree
pub trait Command: Any {
    /// Apply the mutation; `false` means nothing changed
    fn execute(&mut self, tree: &mut XsdTree) -> bool;

    /// Revert a successful `execute`; `false` means nothing changed
    fn undo(&mut self, tree: &mut XsdTree) -> bool;

    /// Human-readable label for menus and logs
    fn description(&self) -> String;

    /// Current lifecycle state
    fn state(&self) -> CommandState;

    /// Whether `other`, executed right after this command, can be folded into it
    fn can_merge_with(&self, _other: &dyn Command) -> bool {
        false
    }

    /// Fold an already executed `other` into this command
    fn merge(&mut self, _other: &dyn Command) -> bool {
        false
    }

    /// Called when the history drops this command for good
    ///
    /// Frees detached nodes that only this command could have restored.
    fn release(&mut self, _tree: &mut XsdTree) {}

    fn as_any(&self) -> &dyn Any;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_transitions() {
        assert!(CommandState::Unexecuted.can_execute());
        assert!(!CommandState::Unexecuted.can_undo());
        assert!(!CommandState::Executed.can_execute());
        assert!(CommandState::Executed.can_undo());
        assert!(CommandState::Undone.can_execute());
        assert!(!CommandState::Undone.can_undo());
    }
}
