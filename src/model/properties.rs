//! Uniform property access over node payloads
//!
//! Commands and observers address node attributes through [`NodeProperty`]
//! and exchange their lexical values, whatever the node kind.

use std::fmt;

use super::node::{Declaration, NodeKind, XsdNode};

/// Editable node properties
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeProperty {
    Name,
    Documentation,
    Ref,
    Type,
    MinOccurs,
    MaxOccurs,
    Default,
    Fixed,
    Nillable,
    Abstract,
    SubstitutionGroup,
    Form,
    Use,
    Mixed,
    Base,
    Value,
    FacetFixed,
    ItemType,
    MemberTypes,
    Namespace,
    ProcessContents,
    SchemaLocation,
    Refer,
    XPath,
    Test,
    XPathDefaultNamespace,
    Mode,
    TargetNamespace,
    ElementFormDefault,
    AttributeFormDefault,
}

impl NodeProperty {
    /// Property name as reported to observers (the XSD attribute name where one exists)
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeProperty::Name => "name",
            NodeProperty::Documentation => "documentation",
            NodeProperty::Ref => "ref",
            NodeProperty::Type => "type",
            NodeProperty::MinOccurs => "minOccurs",
            NodeProperty::MaxOccurs => "maxOccurs",
            NodeProperty::Default => "default",
            NodeProperty::Fixed => "fixed",
            NodeProperty::Nillable => "nillable",
            NodeProperty::Abstract => "abstract",
            NodeProperty::SubstitutionGroup => "substitutionGroup",
            NodeProperty::Form => "form",
            NodeProperty::Use => "use",
            NodeProperty::Mixed => "mixed",
            NodeProperty::Base => "base",
            NodeProperty::Value => "value",
            NodeProperty::FacetFixed => "facetFixed",
            NodeProperty::ItemType => "itemType",
            NodeProperty::MemberTypes => "memberTypes",
            NodeProperty::Namespace => "namespace",
            NodeProperty::ProcessContents => "processContents",
            NodeProperty::SchemaLocation => "schemaLocation",
            NodeProperty::Refer => "refer",
            NodeProperty::XPath => "xpath",
            NodeProperty::Test => "test",
            NodeProperty::XPathDefaultNamespace => "xpathDefaultNamespace",
            NodeProperty::Mode => "mode",
            NodeProperty::TargetNamespace => "targetNamespace",
            NodeProperty::ElementFormDefault => "elementFormDefault",
            NodeProperty::AttributeFormDefault => "attributeFormDefault",
        }
    }
}

impl fmt::Display for NodeProperty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl XsdNode {
    /// Read a property; `None` when unset or not applicable to this kind
    pub fn property(&self, prop: NodeProperty) -> Option<String> {
        match prop {
            NodeProperty::Name => return self.name.clone(),
            NodeProperty::Documentation => return self.documentation.clone(),
            _ => {}
        }
        match (&self.kind, prop) {
            (NodeKind::Element(d), NodeProperty::Ref) => d.decl.ref_name().map(str::to_string),
            (NodeKind::Attribute(d), NodeProperty::Ref) => d.decl.ref_name().map(str::to_string),
            (NodeKind::Group(d) | NodeKind::AttributeGroup(d), NodeProperty::Ref) => {
                d.decl.ref_name().map(str::to_string)
            }
            (NodeKind::Facet(f), NodeProperty::Value) => Some(f.value.clone()),
            (NodeKind::Facet(f), NodeProperty::FacetFixed) => Some(f.fixed.to_string()),
            (NodeKind::Union(u), NodeProperty::MemberTypes) => {
                if u.member_types.is_empty() {
                    None
                } else {
                    Some(u.member_types.join(" "))
                }
            }
            (NodeKind::KeyRef(k), NodeProperty::Refer) => Some(k.refer.clone()),
            (NodeKind::Selector(x) | NodeKind::Field(x), NodeProperty::XPath) => {
                Some(x.xpath.clone())
            }
            (NodeKind::Assert(a), NodeProperty::Test) => Some(a.test.clone()),
            (
                NodeKind::Include(d) | NodeKind::Redefine(d) | NodeKind::Override(d),
                NodeProperty::SchemaLocation,
            ) => Some(d.schema_location.clone()),
            _ => lexical_slot(&self.kind, prop).and_then(|v| v.clone()),
        }
    }

    /// Write a property, returning the previous value
    ///
    /// Any value is accepted. Returns `Err(())` when the property does not
    /// exist on this node kind, or when setting `ref` would turn a definition
    /// with children into a reference (references own no children).
    pub(crate) fn apply_property(
        &mut self,
        prop: NodeProperty,
        value: Option<String>,
    ) -> Result<Option<String>, ()> {
        let old = self.property(prop);
        match prop {
            NodeProperty::Name => {
                self.name = value;
                return Ok(old);
            }
            NodeProperty::Documentation => {
                self.documentation = value;
                return Ok(old);
            }
            NodeProperty::Ref if value.is_some() && !self.children.is_empty() => return Err(()),
            _ => {}
        }
        match (&mut self.kind, prop) {
            (NodeKind::Element(d), NodeProperty::Ref) => set_declaration(&mut d.decl, value),
            (NodeKind::Attribute(d), NodeProperty::Ref) => set_declaration(&mut d.decl, value),
            (NodeKind::Group(d) | NodeKind::AttributeGroup(d), NodeProperty::Ref) => {
                set_declaration(&mut d.decl, value)
            }
            (NodeKind::Facet(f), NodeProperty::Value) => f.value = value.unwrap_or_default(),
            (NodeKind::Facet(f), NodeProperty::FacetFixed) => {
                f.fixed = matches!(value.as_deref().map(str::trim), Some("true") | Some("1"))
            }
            (NodeKind::Union(u), NodeProperty::MemberTypes) => {
                u.member_types = value
                    .map(|v| v.split_whitespace().map(str::to_string).collect())
                    .unwrap_or_default()
            }
            (NodeKind::KeyRef(k), NodeProperty::Refer) => k.refer = value.unwrap_or_default(),
            (NodeKind::Selector(x) | NodeKind::Field(x), NodeProperty::XPath) => {
                x.xpath = value.unwrap_or_default()
            }
            (NodeKind::Assert(a), NodeProperty::Test) => a.test = value.unwrap_or_default(),
            (
                NodeKind::Include(d) | NodeKind::Redefine(d) | NodeKind::Override(d),
                NodeProperty::SchemaLocation,
            ) => d.schema_location = value.unwrap_or_default(),
            (kind, prop) => match lexical_slot_mut(kind, prop) {
                Some(slot) => *slot = value,
                None => return Err(()),
            },
        }
        Ok(old)
    }
}

fn set_declaration(decl: &mut Declaration, value: Option<String>) {
    *decl = match value {
        Some(name) => Declaration::Reference(name),
        None => Declaration::Definition,
    };
}

fn lexical_slot(kind: &NodeKind, prop: NodeProperty) -> Option<&Option<String>> {
    use NodeProperty as P;
    let slot = match (kind, prop) {
        (NodeKind::Schema(s), P::TargetNamespace) => &s.target_namespace,
        (NodeKind::Schema(s), P::ElementFormDefault) => &s.element_form_default,
        (NodeKind::Schema(s), P::AttributeFormDefault) => &s.attribute_form_default,
        (NodeKind::Element(e), P::Type) => &e.type_name,
        (NodeKind::Element(e), P::MinOccurs) => &e.min_occurs,
        (NodeKind::Element(e), P::MaxOccurs) => &e.max_occurs,
        (NodeKind::Element(e), P::Default) => &e.default,
        (NodeKind::Element(e), P::Fixed) => &e.fixed,
        (NodeKind::Element(e), P::Nillable) => &e.nillable,
        (NodeKind::Element(e), P::Abstract) => &e.is_abstract,
        (NodeKind::Element(e), P::SubstitutionGroup) => &e.substitution_group,
        (NodeKind::Element(e), P::Form) => &e.form,
        (NodeKind::Attribute(a), P::Type) => &a.type_name,
        (NodeKind::Attribute(a), P::Use) => &a.use_,
        (NodeKind::Attribute(a), P::Default) => &a.default,
        (NodeKind::Attribute(a), P::Fixed) => &a.fixed,
        (NodeKind::Attribute(a), P::Form) => &a.form,
        (NodeKind::ComplexType(c), P::Mixed) => &c.mixed,
        (NodeKind::ComplexType(c), P::Abstract) => &c.is_abstract,
        (NodeKind::Sequence(c) | NodeKind::Choice(c) | NodeKind::All(c), P::MinOccurs) => {
            &c.min_occurs
        }
        (NodeKind::Sequence(c) | NodeKind::Choice(c) | NodeKind::All(c), P::MaxOccurs) => {
            &c.max_occurs
        }
        (NodeKind::Group(g), P::MinOccurs) => &g.min_occurs,
        (NodeKind::Group(g), P::MaxOccurs) => &g.max_occurs,
        (NodeKind::ComplexContent(c), P::Mixed) => &c.mixed,
        (NodeKind::Restriction(d) | NodeKind::Extension(d), P::Base) => &d.base,
        (NodeKind::List(l), P::ItemType) => &l.item_type,
        (NodeKind::Any(w) | NodeKind::AnyAttribute(w), P::Namespace) => &w.namespace,
        (NodeKind::Any(w) | NodeKind::AnyAttribute(w), P::ProcessContents) => &w.process_contents,
        (NodeKind::Any(w), P::MinOccurs) => &w.min_occurs,
        (NodeKind::Any(w), P::MaxOccurs) => &w.max_occurs,
        (NodeKind::Import(i), P::Namespace) => &i.namespace,
        (NodeKind::Import(i), P::SchemaLocation) => &i.schema_location,
        (NodeKind::Assert(a), P::XPathDefaultNamespace) => &a.xpath_default_namespace,
        (NodeKind::Alternative(a), P::Test) => &a.test,
        (NodeKind::Alternative(a), P::Type) => &a.type_name,
        (NodeKind::OpenContent(o), P::Mode) => &o.mode,
        _ => return None,
    };
    Some(slot)
}

fn lexical_slot_mut(kind: &mut NodeKind, prop: NodeProperty) -> Option<&mut Option<String>> {
    use NodeProperty as P;
    let slot = match (kind, prop) {
        (NodeKind::Schema(s), P::TargetNamespace) => &mut s.target_namespace,
        (NodeKind::Schema(s), P::ElementFormDefault) => &mut s.element_form_default,
        (NodeKind::Schema(s), P::AttributeFormDefault) => &mut s.attribute_form_default,
        (NodeKind::Element(e), P::Type) => &mut e.type_name,
        (NodeKind::Element(e), P::MinOccurs) => &mut e.min_occurs,
        (NodeKind::Element(e), P::MaxOccurs) => &mut e.max_occurs,
        (NodeKind::Element(e), P::Default) => &mut e.default,
        (NodeKind::Element(e), P::Fixed) => &mut e.fixed,
        (NodeKind::Element(e), P::Nillable) => &mut e.nillable,
        (NodeKind::Element(e), P::Abstract) => &mut e.is_abstract,
        (NodeKind::Element(e), P::SubstitutionGroup) => &mut e.substitution_group,
        (NodeKind::Element(e), P::Form) => &mut e.form,
        (NodeKind::Attribute(a), P::Type) => &mut a.type_name,
        (NodeKind::Attribute(a), P::Use) => &mut a.use_,
        (NodeKind::Attribute(a), P::Default) => &mut a.default,
        (NodeKind::Attribute(a), P::Fixed) => &mut a.fixed,
        (NodeKind::Attribute(a), P::Form) => &mut a.form,
        (NodeKind::ComplexType(c), P::Mixed) => &mut c.mixed,
        (NodeKind::ComplexType(c), P::Abstract) => &mut c.is_abstract,
        (NodeKind::Sequence(c) | NodeKind::Choice(c) | NodeKind::All(c), P::MinOccurs) => {
            &mut c.min_occurs
        }
        (NodeKind::Sequence(c) | NodeKind::Choice(c) | NodeKind::All(c), P::MaxOccurs) => {
            &mut c.max_occurs
        }
        (NodeKind::Group(g), P::MinOccurs) => &mut g.min_occurs,
        (NodeKind::Group(g), P::MaxOccurs) => &mut g.max_occurs,
        (NodeKind::ComplexContent(c), P::Mixed) => &mut c.mixed,
        (NodeKind::Restriction(d) | NodeKind::Extension(d), P::Base) => &mut d.base,
        (NodeKind::List(l), P::ItemType) => &mut l.item_type,
        (NodeKind::Any(w) | NodeKind::AnyAttribute(w), P::Namespace) => &mut w.namespace,
        (NodeKind::Any(w) | NodeKind::AnyAttribute(w), P::ProcessContents) => {
            &mut w.process_contents
        }
        (NodeKind::Any(w), P::MinOccurs) => &mut w.min_occurs,
        (NodeKind::Any(w), P::MaxOccurs) => &mut w.max_occurs,
        (NodeKind::Import(i), P::Namespace) => &mut i.namespace,
        (NodeKind::Import(i), P::SchemaLocation) => &mut i.schema_location,
        (NodeKind::Assert(a), P::XPathDefaultNamespace) => &mut a.xpath_default_namespace,
        (NodeKind::Alternative(a), P::Test) => &mut a.test,
        (NodeKind::Alternative(a), P::Type) => &mut a.type_name,
        (NodeKind::OpenContent(o), P::Mode) => &mut o.mode,
        _ => return None,
    };
    Some(slot)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::node::{ElementData, FacetData, FacetKind, UnionData};

    #[test]
    fn test_element_properties() {
        let mut node = XsdNode::new(NodeKind::Element(ElementData::typed("xs:string")), Some("a".into()));
        assert_eq!(node.property(NodeProperty::Type).as_deref(), Some("xs:string"));
        assert_eq!(node.property(NodeProperty::Name).as_deref(), Some("a"));

        let old = node.apply_property(NodeProperty::MinOccurs, Some("0".into())).unwrap();
        assert_eq!(old, None);
        assert_eq!(node.property(NodeProperty::MinOccurs).as_deref(), Some("0"));
    }

    #[test]
    fn test_invalid_values_are_accepted() {
        let mut node = XsdNode::new(NodeKind::Element(ElementData::default()), Some("a".into()));
        assert!(node.apply_property(NodeProperty::MaxOccurs, Some("lots".into())).is_ok());
        assert!(node.apply_property(NodeProperty::Name, Some(String::new())).is_ok());
        assert_eq!(node.property(NodeProperty::Name).as_deref(), Some(""));
    }

    #[test]
    fn test_ref_flips_declaration() {
        let mut node = XsdNode::new(NodeKind::Element(ElementData::default()), Some("a".into()));
        node.apply_property(NodeProperty::Ref, Some("tns:B".into())).unwrap();
        assert!(node.is_reference());
        node.apply_property(NodeProperty::Ref, None).unwrap();
        assert!(!node.is_reference());
    }

    #[test]
    fn test_not_applicable_property() {
        let mut node = XsdNode::new(NodeKind::SimpleType, None);
        assert!(node.apply_property(NodeProperty::Base, Some("xs:int".into())).is_err());
        assert_eq!(node.property(NodeProperty::Base), None);
    }

    #[test]
    fn test_facet_and_union_properties() {
        let mut facet = XsdNode::new(NodeKind::Facet(FacetData::new(FacetKind::Pattern, "\\d+")), None);
        facet.apply_property(NodeProperty::FacetFixed, Some("true".into())).unwrap();
        assert_eq!(facet.property(NodeProperty::FacetFixed).as_deref(), Some("true"));

        let mut union = XsdNode::new(NodeKind::Union(UnionData::default()), None);
        assert_eq!(union.property(NodeProperty::MemberTypes), None);
        union
            .apply_property(NodeProperty::MemberTypes, Some("xs:int  xs:string".into()))
            .unwrap();
        assert_eq!(union.property(NodeProperty::MemberTypes).as_deref(), Some("xs:int xs:string"));
    }
}
