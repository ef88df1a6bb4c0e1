//! Structural commands: add, delete and move nodes

use std::any::Any;

use log::debug;

use super::{Command, CommandState};
use crate::model::{NodeId, NodeKind, XsdTree};

fn label(tree: &XsdTree, id: NodeId) -> String {
    match tree.get(id) {
        Some(node) => match node.name() {
            Some(name) => format!("{} '{}'", node.kind().local_name(), name),
            None => node.kind().local_name().to_string(),
        },
        None => id.to_string(),
    }
}

/// Check that `parent` can own children (references cannot)
fn accepts_children(tree: &XsdTree, parent: NodeId) -> bool {
    tree.get(parent).map(|p| !p.is_reference()).unwrap_or(false)
}

/// Insert a detached node under a parent
#[derive(Debug)]
pub struct AddNodeCommand {
    parent: NodeId,
    node: NodeId,
    index: Option<usize>,
    inserted_at: Option<usize>,
    state: CommandState,
    description: String,
}

impl AddNodeCommand {
    /// Append `node` to `parent`'s children
    pub fn new(parent: NodeId, node: NodeId) -> Self {
        Self {
            parent,
            node,
            index: None,
            inserted_at: None,
            state: CommandState::Unexecuted,
            description: "Add node".to_string(),
        }
    }

    /// Insert `node` at `index` in `parent`'s children
    pub fn at(parent: NodeId, index: usize, node: NodeId) -> Self {
        Self {
            index: Some(index),
            ..Self::new(parent, node)
        }
    }

    /// Create a fresh detached node in `tree` and a command appending it
    pub fn create(tree: &mut XsdTree, parent: NodeId, kind: NodeKind, name: Option<String>) -> Self {
        let node = tree.create_node(kind, name);
        let mut command = Self::new(parent, node);
        command.description = format!("Add {}", label(tree, node));
        command
    }

    /// Node this command inserts
    pub fn node(&self) -> NodeId {
        self.node
    }
}

impl Command for AddNodeCommand {
    fn execute(&mut self, tree: &mut XsdTree) -> bool {
        if !self.state.can_execute() || !tree.contains(self.node) || tree.parent(self.node).is_some() {
            return false;
        }
        if !accepts_children(tree, self.parent) {
            return false;
        }
        let index = self.index.unwrap_or_else(|| tree.children(self.parent).len());
        if !tree.insert_child(self.parent, index, self.node) {
            return false;
        }
        debug!("added {} under {}", self.node, self.parent);
        self.inserted_at = Some(index);
        self.state = CommandState::Executed;
        true
    }

    fn undo(&mut self, tree: &mut XsdTree) -> bool {
        if !self.state.can_undo() || tree.index_of(self.parent, self.node) != self.inserted_at {
            return false;
        }
        tree.remove_child(self.parent, self.node);
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
        if self.state == CommandState::Undone {
            tree.discard(self.node);
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Remove a node from its parent, keeping it for undo
#[derive(Debug)]
pub struct DeleteNodeCommand {
    parent: NodeId,
    node: NodeId,
    removed_at: Option<usize>,
    state: CommandState,
}

impl DeleteNodeCommand {
    /// Delete `node`, which must currently be a child of `parent`
    pub fn new(parent: NodeId, node: NodeId) -> Self {
        Self {
            parent,
            node,
            removed_at: None,
            state: CommandState::Unexecuted,
        }
    }

    /// Delete `node` from whatever parent it has now
    pub fn of(tree: &XsdTree, node: NodeId) -> Option<Self> {
        tree.parent(node).map(|parent| Self::new(parent, node))
    }

    /// Index the node occupied when it was removed
    pub fn removed_at(&self) -> Option<usize> {
        self.removed_at
    }
}

impl Command for DeleteNodeCommand {
    fn execute(&mut self, tree: &mut XsdTree) -> bool {
        if !self.state.can_execute() {
            return false;
        }
        match tree.remove_child(self.parent, self.node) {
            Some(index) => {
                debug!("deleted {} from {} at {}", self.node, self.parent, index);
                self.removed_at = Some(index);
                self.state = CommandState::Executed;
                true
            }
            None => false,
        }
    }

    fn undo(&mut self, tree: &mut XsdTree) -> bool {
        if !self.state.can_undo() || tree.parent(self.node).is_some() {
            return false;
        }
        let Some(index) = self.removed_at else {
            return false;
        };
        if !tree.insert_child(self.parent, index, self.node) {
            return false;
        }
        self.state = CommandState::Undone;
        true
    }

    fn description(&self) -> String {
        "Delete node".to_string()
    }

    fn state(&self) -> CommandState {
        self.state
    }

    fn release(&mut self, tree: &mut XsdTree) {
        if self.state == CommandState::Executed {
            tree.discard(self.node);
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Move a node to a new parent or position
#[derive(Debug)]
pub struct MoveNodeCommand {
    node: NodeId,
    new_parent: NodeId,
    index: Option<usize>,
    origin: Option<(NodeId, usize)>,
    moved_to: Option<usize>,
    state: CommandState,
}

impl MoveNodeCommand {
    /// Move `node` to the end of `new_parent`'s children
    pub fn new(node: NodeId, new_parent: NodeId) -> Self {
        Self {
            node,
            new_parent,
            index: None,
            origin: None,
            moved_to: None,
            state: CommandState::Unexecuted,
        }
    }

    /// Move `node` to `index` in `new_parent` (index counted without the node itself)
    pub fn to_index(node: NodeId, new_parent: NodeId, index: usize) -> Self {
        Self {
            index: Some(index),
            ..Self::new(node, new_parent)
        }
    }
}

impl Command for MoveNodeCommand {
    fn execute(&mut self, tree: &mut XsdTree) -> bool {
        if !self.state.can_execute() || !accepts_children(tree, self.new_parent) {
            return false;
        }
        let Some(parent) = tree.parent(self.node) else {
            return false;
        };
        let Some(old_index) = tree.index_of(parent, self.node) else {
            return false;
        };
        let len = tree.children(self.new_parent).len() - usize::from(parent == self.new_parent);
        let index = self.index.unwrap_or(len);
        if !tree.insert_child(self.new_parent, index, self.node) {
            return false;
        }
        self.origin = Some((parent, old_index));
        self.moved_to = Some(index);
        self.state = CommandState::Executed;
        true
    }

    fn undo(&mut self, tree: &mut XsdTree) -> bool {
        if !self.state.can_undo() || tree.index_of(self.new_parent, self.node) != self.moved_to {
            return false;
        }
        let Some((parent, index)) = self.origin else {
            return false;
        };
        if !tree.insert_child(parent, index, self.node) {
            return false;
        }
        self.state = CommandState::Undone;
        true
    }

    fn description(&self) -> String {
        "Move node".to_string()
    }

    fn state(&self) -> CommandState {
        self.state
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
