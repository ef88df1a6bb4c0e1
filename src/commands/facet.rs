//! Adding facets, with on-demand inline restriction wrappers

use std::any::Any;

use super::{Command, CommandState};
use crate::model::{DerivationData, FacetData, FacetKind, NodeId, NodeKind, NodeProperty, NodeTag, XsdTree};

/// Inline `simpleType`/`restriction` synthesized around a plain `type`
#[derive(Debug, Clone, Copy)]
struct Wrapper {
    simple_type: NodeId,
    restriction: NodeId,
}

/// Where the facet will go
enum Placement {
    Existing(NodeId),
    Wrap(Option<String>),
}

/// Append a facet to an element, attribute, simple type or restriction
///
/// An element or attribute with a plain `type="..."` gets an inline
/// `simpleType`/`restriction base="..."` wrapper first; undo removes the
/// wrapper and restores the `type` attribute.
#[derive(Debug)]
pub struct AddFacetCommand {
    target: NodeId,
    facet: FacetData,
    facet_node: Option<NodeId>,
    wrapper: Option<Wrapper>,
    /// `type` value replaced by the wrapper
    wrapped_type: Option<Option<String>>,
    restriction: Option<NodeId>,
    state: CommandState,
}

impl AddFacetCommand {
    pub fn new(target: NodeId, kind: FacetKind, value: impl Into<String>) -> Self {
        Self::with_facet(target, FacetData::new(kind, value))
    }

    pub fn with_facet(target: NodeId, facet: FacetData) -> Self {
        Self {
            target,
            facet,
            facet_node: None,
            wrapper: None,
            wrapped_type: None,
            restriction: None,
            state: CommandState::Unexecuted,
        }
    }

    /// Facet node inserted by the last execution
    pub fn facet_node(&self) -> Option<NodeId> {
        self.facet_node
    }

    /// Check whether the last execution had to synthesize a wrapper
    pub fn created_wrapper(&self) -> bool {
        self.wrapped_type.is_some()
    }

    fn placement(tree: &XsdTree, target: NodeId) -> Option<Placement> {
        let node = tree.get(target)?;
        match node.kind() {
            NodeKind::Restriction(_) => Some(Placement::Existing(target)),
            NodeKind::SimpleType => first_child(tree, target, NodeTag::Restriction).map(Placement::Existing),
            NodeKind::Element(_) | NodeKind::Attribute(_) if !node.is_reference() => {
                if first_child(tree, target, NodeTag::ComplexType).is_some() {
                    return None;
                }
                match first_child(tree, target, NodeTag::SimpleType) {
                    Some(st) => first_child(tree, st, NodeTag::Restriction).map(Placement::Existing),
                    None => Some(Placement::Wrap(tree.property(target, NodeProperty::Type))),
                }
            }
            _ => None,
        }
    }
}

fn first_child(tree: &XsdTree, parent: NodeId, tag: NodeTag) -> Option<NodeId> {
    tree.children(parent).iter().copied().find(|c| tree.tag(*c) == Some(tag))
}

impl Command for AddFacetCommand {
    fn execute(&mut self, tree: &mut XsdTree) -> bool {
        if !self.state.can_execute() {
            return false;
        }
        let Some(placement) = Self::placement(tree, self.target) else {
            return false;
        };

        let facet = match self.facet_node {
            Some(id) if tree.contains(id) => id,
            _ => {
                let id = tree.create_node(NodeKind::Facet(self.facet.clone()), None);
                self.facet_node = Some(id);
                id
            }
        };

        let restriction = match placement {
            Placement::Existing(restriction) => {
                self.wrapped_type = None;
                restriction
            }
            Placement::Wrap(type_name) => {
                let wrapper = match self.wrapper {
                    Some(w) if tree.contains(w.simple_type) && tree.contains(w.restriction) => w,
                    _ => {
                        let simple_type = tree.create_node(NodeKind::SimpleType, None);
                        let restriction = tree.create_node(NodeKind::Restriction(DerivationData::default()), None);
                        tree.add_child(simple_type, restriction);
                        Wrapper {
                            simple_type,
                            restriction,
                        }
                    }
                };
                tree.set_property(wrapper.restriction, NodeProperty::Base, type_name.clone());
                tree.set_property(self.target, NodeProperty::Type, None);
                tree.insert_child(self.target, 0, wrapper.simple_type);
                self.wrapper = Some(wrapper);
                self.wrapped_type = Some(type_name);
                wrapper.restriction
            }
        };

        if !tree.add_child(restriction, facet) {
            return false;
        }
        self.restriction = Some(restriction);
        self.state = CommandState::Executed;
        true
    }

    fn undo(&mut self, tree: &mut XsdTree) -> bool {
        if !self.state.can_undo() {
            return false;
        }
        let (Some(facet), Some(restriction)) = (self.facet_node, self.restriction) else {
            return false;
        };
        if tree.parent(facet) != Some(restriction) {
            return false;
        }
        tree.remove_child(restriction, facet);

        if let (Some(wrapped), Some(wrapper)) = (self.wrapped_type.take(), self.wrapper) {
            tree.remove_child(self.target, wrapper.simple_type);
            tree.set_property(self.target, NodeProperty::Type, wrapped);
        }
        self.state = CommandState::Undone;
        true
    }

    fn description(&self) -> String {
        format!("Add {} facet", self.facet.kind.local_name())
    }

    fn state(&self) -> CommandState {
        self.state
    }

    fn release(&mut self, tree: &mut XsdTree) {
        if self.state != CommandState::Undone {
            return;
        }
        if let Some(facet) = self.facet_node {
            tree.discard(facet);
        }
        if let Some(wrapper) = self.wrapper {
            tree.discard(wrapper.simple_type);
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
