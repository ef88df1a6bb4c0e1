//! Selection state for editor views
//!
//! A set of selected nodes plus one primary node. The model only stores node
//! identities; it never looks at the tree.

use indexmap::IndexSet;

use crate::model::NodeId;

/// Notification sent when the selection actually changes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionChange {
    pub old: IndexSet<NodeId>,
    pub new: IndexSet<NodeId>,
    pub old_primary: Option<NodeId>,
    pub new_primary: Option<NodeId>,
}

type Listener = Box<dyn FnMut(&SelectionChange)>;

/// Selected nodes and the primary selection
#[derive(Default)]
pub struct SelectionModel {
    selected: IndexSet<NodeId>,
    primary: Option<NodeId>,
    listeners: Vec<Listener>,
}

impl std::fmt::Debug for SelectionModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SelectionModel")
            .field("selected", &self.selected)
            .field("primary", &self.primary)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl SelectionModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener for selection changes
    pub fn add_listener(&mut self, listener: impl FnMut(&SelectionChange) + 'static) {
        self.listeners.push(Box::new(listener));
    }

    /// Replace the selection with `node`, or clear it when `None`
    pub fn select(&mut self, node: Option<NodeId>) {
        self.update(|selected, primary| {
            selected.clear();
            *primary = node;
            if let Some(node) = node {
                selected.insert(node);
            }
        });
    }

    /// Add `node`; it becomes primary only if the selection was empty
    pub fn add_to_selection(&mut self, node: Option<NodeId>) {
        let Some(node) = node else {
            return;
        };
        self.update(|selected, primary| {
            selected.insert(node);
            if primary.is_none() {
                *primary = Some(node);
            }
        });
    }

    /// Remove `node`; a removed primary is replaced by a remaining member
    pub fn remove_from_selection(&mut self, node: Option<NodeId>) {
        let Some(node) = node else {
            return;
        };
        self.update(|selected, primary| {
            if selected.shift_remove(&node) && *primary == Some(node) {
                *primary = selected.first().copied();
            }
        });
    }

    /// Add `node` if absent, remove it if present
    pub fn toggle_selection(&mut self, node: Option<NodeId>) {
        let Some(id) = node else {
            return;
        };
        if self.selected.contains(&id) {
            self.remove_from_selection(node);
        } else {
            self.add_to_selection(node);
        }
    }

    /// Replace the selection with `nodes`; the first becomes primary
    pub fn select_multiple(&mut self, nodes: impl IntoIterator<Item = NodeId>) {
        let nodes: IndexSet<NodeId> = nodes.into_iter().collect();
        self.update(|selected, primary| {
            *primary = match *primary {
                Some(p) if nodes.contains(&p) => Some(p),
                _ => nodes.first().copied(),
            };
            *selected = nodes;
        });
    }

    /// Empty the selection
    pub fn clear_selection(&mut self) {
        self.select(None);
    }

    /// Read-only view of the selected nodes in selection order
    pub fn selected_nodes(&self) -> &IndexSet<NodeId> {
        &self.selected
    }

    pub fn primary(&self) -> Option<NodeId> {
        self.primary
    }

    pub fn is_selected(&self, node: NodeId) -> bool {
        self.selected.contains(&node)
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    pub fn len(&self) -> usize {
        self.selected.len()
    }

    fn update(&mut self, change: impl FnOnce(&mut IndexSet<NodeId>, &mut Option<NodeId>)) {
        let old = self.selected.clone();
        let old_primary = self.primary;
        change(&mut self.selected, &mut self.primary);

        let same_members = old.len() == self.selected.len() && old.iter().all(|n| self.selected.contains(n));
        if same_members && old_primary == self.primary {
            return;
        }
        let event = SelectionChange {
            old,
            new: self.selected.clone(),
            old_primary,
            new_primary: self.primary,
        };
        for listener in self.listeners.iter_mut() {
            listener(&event);
        }
    }
}
