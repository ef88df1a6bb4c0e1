//! Renaming global components together with the references to them

use std::any::Any;

use log::debug;

use super::{Command, CommandState};
use crate::index::{reference_sites, ComponentCategory, NameIndex};
use crate::model::{NodeId, NodeProperty, NodeTag, XsdTree};
use crate::names::{is_valid_ncname, with_local_part};

/// One attribute value rewritten by a rename
#[derive(Debug, Clone, PartialEq, Eq)]
struct Rewrite {
    node: NodeId,
    property: NodeProperty,
    old: Option<String>,
    new: Option<String>,
}

/// Rename a global definition and every reference that resolves to it
///
/// Refused when the new name is not an NCName (prefixes included), when
/// another definition of the same category already uses it, or when the node
/// is not a named global definition.
#[derive(Debug)]
pub struct RenameComponentCommand {
    node: NodeId,
    new_name: String,
    old_name: Option<String>,
    rewrites: Vec<Rewrite>,
    state: CommandState,
}

impl RenameComponentCommand {
    pub fn new(node: NodeId, new_name: impl Into<String>) -> Self {
        Self {
            node,
            new_name: new_name.into(),
            old_name: None,
            rewrites: Vec::new(),
            state: CommandState::Unexecuted,
        }
    }

    /// Number of references rewritten by the last execution
    pub fn rewritten_references(&self) -> usize {
        self.rewrites.len()
    }

    fn is_global(tree: &XsdTree, node: NodeId) -> bool {
        match tree.parent(node) {
            Some(parent) if parent == tree.root() => true,
            Some(parent) => matches!(tree.tag(parent), Some(NodeTag::Redefine) | Some(NodeTag::Override)),
            None => false,
        }
    }

    /// References resolving to `self.node`, with their rewritten values
    fn plan(&self, tree: &XsdTree, index: &NameIndex, category: ComponentCategory) -> Vec<Rewrite> {
        let mut rewrites: Vec<Rewrite> = Vec::new();
        for node in tree.descendants(tree.root()) {
            let sites = reference_sites(tree, node);
            let mut touched: Vec<NodeProperty> = Vec::new();
            for site in &sites {
                if site.category != category || touched.contains(&site.property) {
                    continue;
                }
                if index.resolve_from(tree, node, category, &site.name) == Some(self.node) {
                    touched.push(site.property);
                }
            }

            for property in touched {
                let old = tree.property(node, property);
                let new = if property == NodeProperty::MemberTypes {
                    let members: Vec<String> = sites
                        .iter()
                        .filter(|s| s.property == NodeProperty::MemberTypes)
                        .map(|s| {
                            if index.resolve_from(tree, node, category, &s.name) == Some(self.node) {
                                with_local_part(&s.name, &self.new_name)
                            } else {
                                s.name.clone()
                            }
                        })
                        .collect();
                    Some(members.join(" "))
                } else {
                    old.as_deref().map(|v| with_local_part(v, &self.new_name))
                };
                rewrites.push(Rewrite {
                    node,
                    property,
                    old,
                    new,
                });
            }
        }
        rewrites
    }
}

impl Command for RenameComponentCommand {
    fn execute(&mut self, tree: &mut XsdTree) -> bool {
        if !self.state.can_execute() || !tree.is_attached(self.node) || !Self::is_global(tree, self.node) {
            return false;
        }
        let Some(node) = tree.get(self.node) else {
            return false;
        };
        if node.is_reference() {
            return false;
        }
        let (Some(category), Some(old_name)) = (ComponentCategory::of(node.tag()), node.name()) else {
            return false;
        };
        let old_name = old_name.to_string();
        if !is_valid_ncname(&self.new_name) || old_name == self.new_name {
            debug!("rename of {} to '{}' refused: not a new NCName", self.node, self.new_name);
            return false;
        }

        let index = NameIndex::build(tree);
        if let Some(existing) = index.lookup(category, &self.new_name) {
            if existing != self.node {
                debug!("rename of {} refused: {} '{}' already exists", self.node, category, self.new_name);
                return false;
            }
        }

        let rewrites = self.plan(tree, &index, category);
        tree.set_name(self.node, Some(self.new_name.clone()));
        for rewrite in &rewrites {
            tree.set_property(rewrite.node, rewrite.property, rewrite.new.clone());
        }
        debug!(
            "renamed {} '{}' to '{}', {} reference(s) rewritten",
            category,
            old_name,
            self.new_name,
            rewrites.len()
        );

        self.old_name = Some(old_name);
        self.rewrites = rewrites;
        self.state = CommandState::Executed;
        true
    }

    fn undo(&mut self, tree: &mut XsdTree) -> bool {
        if !self.state.can_undo() || tree.get(self.node).and_then(|n| n.name()) != Some(self.new_name.as_str()) {
            return false;
        }
        for rewrite in self.rewrites.iter().rev() {
            tree.set_property(rewrite.node, rewrite.property, rewrite.old.clone());
        }
        tree.set_name(self.node, self.old_name.clone());
        self.state = CommandState::Undone;
        true
    }

    fn description(&self) -> String {
        match self.old_name {
            Some(ref old) => format!("Rename '{}' to '{}'", old, self.new_name),
            None => format!("Rename to '{}'", self.new_name),
        }
    }

    fn state(&self) -> CommandState {
        self.state
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
