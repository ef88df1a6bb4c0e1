//! All-or-nothing command sequences

use std::any::Any;

use log::debug;

use super::{Command, CommandState};
use crate::model::XsdTree;

/// Runs several commands as one
///
/// If any step fails the steps already applied are undone, so the tree is
/// left as it was.
pub struct CompositeCommand {
    description: String,
    commands: Vec<Box<dyn Command>>,
    state: CommandState,
}

impl std::fmt::Debug for CompositeCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompositeCommand")
            .field("description", &self.description)
            .field("commands", &self.commands.len())
            .field("state", &self.state)
            .finish()
    }
}

impl CompositeCommand {
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            commands: Vec::new(),
            state: CommandState::Unexecuted,
        }
    }

    /// Append a step
    pub fn push(&mut self, command: impl Command) {
        self.commands.push(Box::new(command));
    }

    /// Append a step, builder style
    pub fn with(mut self, command: impl Command) -> Self {
        self.push(command);
        self
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

impl Command for CompositeCommand {
    fn execute(&mut self, tree: &mut XsdTree) -> bool {
        if !self.state.can_execute() || self.commands.is_empty() {
            return false;
        }
        for i in 0..self.commands.len() {
            if !self.commands[i].execute(tree) {
                debug!("'{}' failed at step {}, rolling back", self.description, i);
                for done in self.commands[..i].iter_mut().rev() {
                    done.undo(tree);
                }
                return false;
            }
        }
        self.state = CommandState::Executed;
        true
    }

    fn undo(&mut self, tree: &mut XsdTree) -> bool {
        if !self.state.can_undo() {
            return false;
        }
        let count = self.commands.len();
        for i in (0..count).rev() {
            if !self.commands[i].undo(tree) {
                for redone in self.commands[i + 1..].iter_mut() {
                    redone.execute(tree);
                }
                return false;
            }
        }
        self.state = CommandState::Undone;
        true
    }

    fn description(&self) -> String {
        self.description.clone()
    }

    fn state(&self) -> CommandState {
        self.state
    }

    fn release(&mut self, tree: &mut XsdTree) {
        for command in self.commands.iter_mut().rev() {
            command.release(tree);
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
