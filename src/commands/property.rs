//! Property edits

use std::any::Any;

use super::{Command, CommandState};
use crate::model::{NodeId, NodeProperty, XsdTree};

/// Set one property of one node
///
/// Consecutive edits of the same property on the same node merge into one
/// history entry (typing a name character by character undoes in one step).
#[derive(Debug, Clone)]
pub struct SetPropertyCommand {
    node: NodeId,
    property: NodeProperty,
    new_value: Option<String>,
    old_value: Option<String>,
    state: CommandState,
}

impl SetPropertyCommand {
    pub fn new(node: NodeId, property: NodeProperty, value: Option<String>) -> Self {
        Self {
            node,
            property,
            new_value: value,
            old_value: None,
            state: CommandState::Unexecuted,
        }
    }

    pub fn node(&self) -> NodeId {
        self.node
    }

    pub fn property(&self) -> NodeProperty {
        self.property
    }

    pub fn new_value(&self) -> Option<&str> {
        self.new_value.as_deref()
    }

    pub fn old_value(&self) -> Option<&str> {
        self.old_value.as_deref()
    }
}

impl Command for SetPropertyCommand {
    fn execute(&mut self, tree: &mut XsdTree) -> bool {
        if !self.state.can_execute() {
            return false;
        }
        let old = tree.property(self.node, self.property);
        if !tree.set_property(self.node, self.property, self.new_value.clone()) {
            return false;
        }
        self.old_value = old;
        self.state = CommandState::Executed;
        true
    }

    fn undo(&mut self, tree: &mut XsdTree) -> bool {
        if !self.state.can_undo() || !tree.set_property(self.node, self.property, self.old_value.clone()) {
            return false;
        }
        self.state = CommandState::Undone;
        true
    }

    fn description(&self) -> String {
        format!("Set {}", self.property)
    }

    fn state(&self) -> CommandState {
        self.state
    }

    fn can_merge_with(&self, other: &dyn Command) -> bool {
        match other.as_any().downcast_ref::<SetPropertyCommand>() {
            Some(other) => {
                self.state == CommandState::Executed
                    && other.state == CommandState::Executed
                    && other.node == self.node
                    && other.property == self.property
            }
            None => false,
        }
    }

    fn merge(&mut self, other: &dyn Command) -> bool {
        if !self.can_merge_with(other) {
            return false;
        }
        match other.as_any().downcast_ref::<SetPropertyCommand>() {
            Some(other) => {
                self.new_value = other.new_value.clone();
                true
            }
            None => false,
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
