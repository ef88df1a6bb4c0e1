//! Read-only schema statistics

use serde::Serialize;

use crate::factory::SchemaSet;
use crate::model::{NodeKind, NodeTag, XsdTree};

/// How element particles are constrained
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Cardinality {
    /// minOccurs >= 1
    pub required: usize,
    /// minOccurs = 0
    pub optional: usize,
    /// maxOccurs = unbounded
    pub unbounded: usize,
}

/// Component counts of one logical schema
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaStatistics {
    pub target_namespace: Option<String>,
    pub files: usize,
    pub elements: usize,
    pub global_elements: usize,
    pub element_references: usize,
    pub attributes: usize,
    pub attribute_references: usize,
    pub complex_types: usize,
    pub simple_types: usize,
    pub groups: usize,
    pub attribute_groups: usize,
    pub facets: usize,
    /// Share of named definitions carrying documentation, in percent
    pub documentation_coverage: f64,
    /// Local element particles only; globals have no occurrence bounds
    pub cardinality: Cardinality,
}

impl SchemaStatistics {
    /// Collect statistics over every attached node of a tree
    pub fn collect(tree: &XsdTree) -> Self {
        let root = tree.root();
        let mut stats = SchemaStatistics {
            target_namespace: tree.target_namespace().map(str::to_string),
            files: tree.files().count().max(1),
            ..Default::default()
        };
        let mut named = 0usize;
        let mut documented = 0usize;

        for id in tree.descendants(root) {
            let Some(node) = tree.get(id) else {
                continue;
            };
            let reference = node.is_reference();
            if !reference && node.name().is_some() && node.tag() != NodeTag::Schema {
                named += 1;
                if node.documentation().is_some() {
                    documented += 1;
                }
            }

            match node.kind() {
                NodeKind::Element(data) => {
                    if reference {
                        stats.element_references += 1;
                    } else {
                        stats.elements += 1;
                    }
                    let global = tree.parent(id) == Some(root);
                    if global && !reference {
                        stats.global_elements += 1;
                    }
                    if !global {
                        let occurs = data.occurs();
                        if occurs.is_optional() {
                            stats.cardinality.optional += 1;
                        } else {
                            stats.cardinality.required += 1;
                        }
                        if occurs.is_unbounded() {
                            stats.cardinality.unbounded += 1;
                        }
                    }
                }
                NodeKind::Attribute(_) if reference => stats.attribute_references += 1,
                NodeKind::Attribute(_) => stats.attributes += 1,
                NodeKind::ComplexType(_) => stats.complex_types += 1,
                NodeKind::SimpleType => stats.simple_types += 1,
                NodeKind::Group(_) if !reference => stats.groups += 1,
                NodeKind::AttributeGroup(_) if !reference => stats.attribute_groups += 1,
                NodeKind::Facet(_) => stats.facets += 1,
                _ => {}
            }
        }

        stats.documentation_coverage = if named == 0 {
            0.0
        } else {
            (documented as f64 * 1000.0 / named as f64).round() / 10.0
        };
        stats
    }

    /// Statistics of the main tree of a schema set
    pub fn of_set(set: &SchemaSet) -> Self {
        Self::collect(set.tree())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::factory::NodeFactory;
    use pretty_assertions::assert_eq;

    const SCHEMA: &str = r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
        <xs:element name="order" type="OrderType">
            <xs:annotation><xs:documentation>An order</xs:documentation></xs:annotation>
        </xs:element>
        <xs:element name="note" type="xs:string"/>
        <xs:complexType name="OrderType">
            <xs:sequence>
                <xs:element ref="note" minOccurs="0"/>
                <xs:element name="line" type="Sku" maxOccurs="unbounded"/>
            </xs:sequence>
            <xs:attribute name="id" type="xs:ID" use="required"/>
        </xs:complexType>
        <xs:simpleType name="Sku">
            <xs:restriction base="xs:string"><xs:pattern value="[A-Z]{3}"/></xs:restriction>
        </xs:simpleType>
    </xs:schema>"#;

    #[test]
    fn test_counts() {
        let set = NodeFactory::new().load_str(SCHEMA, None).unwrap();
        let stats = SchemaStatistics::of_set(&set);

        assert_eq!(stats.elements, 3);
        assert_eq!(stats.global_elements, 2);
        assert_eq!(stats.element_references, 1);
        assert_eq!(stats.attributes, 1);
        assert_eq!(stats.complex_types, 1);
        assert_eq!(stats.simple_types, 1);
        assert_eq!(stats.facets, 1);
        assert_eq!(
            stats.cardinality,
            Cardinality {
                required: 1,
                optional: 1,
                unbounded: 1
            }
        );
        // order, note, OrderType, line, id, Sku
        assert_eq!(stats.documentation_coverage, 16.7);
    }

    #[test]
    fn test_json_shape() {
        let set = NodeFactory::new().load_str(SCHEMA, None).unwrap();
        let json = serde_json::to_value(SchemaStatistics::of_set(&set)).unwrap();
        assert_eq!(json["complexTypes"], 1);
        assert_eq!(json["cardinality"]["unbounded"], 1);
    }

    #[test]
    fn test_empty_tree() {
        let tree = XsdTree::new(crate::model::SchemaData::new_document(None));
        let stats = SchemaStatistics::collect(&tree);
        assert_eq!(stats.documentation_coverage, 0.0);
        assert_eq!(stats.files, 1);
    }
}
