//! Load, save and reload multi-file schemas

use std::fs;
use std::path::{Path, PathBuf};

use pretty_assertions::assert_eq;
use tempfile::TempDir;

use xsdedit::index::expand_name;
use xsdedit::model::{NodeProperty, NodeSnapshot, NodeTag, XsdTree};
use xsdedit::serializer::{MultiFileSerializer, SaveOptions, SerializerConfig};
use xsdedit::{ComponentCategory, NodeFactory, QName, XsdSerializer};

const HEAD: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema" xmlns:t="urn:t" targetNamespace="urn:t" elementFormDefault="qualified">"#;

fn write(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(&path, format!("{}\n{}\n</xs:schema>\n", HEAD, body)).unwrap();
    path
}

fn top_level(tree: &XsdTree) -> Vec<NodeSnapshot> {
    tree.children(tree.root())
        .iter()
        .filter_map(|c| tree.snapshot(*c))
        .collect()
}

fn chain(dir: &Path) -> PathBuf {
    write(
        dir,
        "base.xsd",
        r#"<xs:simpleType name="Code">
    <xs:restriction base="xs:string"><xs:maxLength value="8"/></xs:restriction>
</xs:simpleType>"#,
    );
    write(
        dir,
        "middle.xsd",
        r#"<xs:include schemaLocation="base.xsd"/>
<xs:complexType name="Item">
    <xs:sequence>
        <xs:element name="code" type="t:Code"/>
        <xs:element name="note" type="xs:string" minOccurs="0" maxOccurs="unbounded"/>
    </xs:sequence>
    <xs:attribute name="id" type="xs:ID" use="required"/>
</xs:complexType>"#,
    );
    write(
        dir,
        "main.xsd",
        r#"<xs:include schemaLocation="middle.xsd"/>
<xs:element name="order">
    <xs:annotation><xs:documentation>Root element</xs:documentation></xs:annotation>
    <xs:complexType>
        <xs:sequence><xs:element ref="t:item" maxOccurs="unbounded"/></xs:sequence>
    </xs:complexType>
</xs:element>
<xs:element name="item" type="t:Item"/>"#,
    )
}

#[test]
fn test_three_level_chain_saves_three_files() {
    let src = TempDir::new().unwrap();
    let main = chain(src.path());
    let set = NodeFactory::new().load(&main).unwrap();
    assert!(set.diagnostics().is_empty());
    assert_eq!(set.tree().files().count(), 3);

    let out = TempDir::new().unwrap();
    let report = MultiFileSerializer::new()
        .save(set.tree(), &SaveOptions::into_dir(out.path()))
        .unwrap();
    assert!(report.is_success());
    assert_eq!(report.len(), 3);

    let mut written: Vec<String> = fs::read_dir(out.path())
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    written.sort();
    assert_eq!(written, vec!["base.xsd", "main.xsd", "middle.xsd"]);

    let main_text = fs::read_to_string(out.path().join("main.xsd")).unwrap();
    assert!(main_text.contains(r#"<xs:include schemaLocation="middle.xsd"/>"#));
    assert!(!main_text.contains("complexType name=\"Item\""));
    let middle_text = fs::read_to_string(out.path().join("middle.xsd")).unwrap();
    assert!(middle_text.contains(r#"<xs:include schemaLocation="base.xsd"/>"#));
    assert!(middle_text.contains(r#"targetNamespace="urn:t""#));
    assert!(!middle_text.contains("simpleType"));

    let reloaded = NodeFactory::new().load(out.path().join("main.xsd")).unwrap();
    assert_eq!(top_level(reloaded.tree()), top_level(set.tree()));
}

#[test]
fn test_shared_include_is_loaded_once_and_saved_once() {
    let src = TempDir::new().unwrap();
    write(src.path(), "common.xsd", r#"<xs:simpleType name="Id"><xs:restriction base="xs:token"><xs:length value="4"/></xs:restriction></xs:simpleType>"#);
    write(src.path(), "a.xsd", r#"<xs:include schemaLocation="common.xsd"/><xs:element name="a" type="t:Id"/>"#);
    write(src.path(), "b.xsd", r#"<xs:include schemaLocation="./common.xsd"/><xs:element name="b" type="t:Id"/>"#);
    let main = write(
        src.path(),
        "main.xsd",
        r#"<xs:include schemaLocation="a.xsd"/><xs:include schemaLocation="b.xsd"/>"#,
    );

    let set = NodeFactory::new().load(&main).unwrap();
    let tree = set.tree();
    let ids = tree
        .descendants(tree.root())
        .into_iter()
        .filter(|n| tree.get(*n).and_then(|x| x.name()) == Some("Id"))
        .count();
    assert_eq!(ids, 1);
    assert_eq!(tree.files().count(), 4);

    let out = TempDir::new().unwrap();
    let report = MultiFileSerializer::new()
        .save(tree, &SaveOptions::into_dir(out.path()))
        .unwrap();
    assert_eq!(report.len(), 4);
    let b_text = fs::read_to_string(out.path().join("b.xsd")).unwrap();
    assert!(b_text.contains(r#"<xs:include schemaLocation="./common.xsd"/>"#));
    let common_text = fs::read_to_string(out.path().join("common.xsd")).unwrap();
    assert_eq!(common_text.matches("<xs:simpleType").count(), 1);
}

#[test]
fn test_forward_and_cross_file_references_resolve() {
    let src = TempDir::new().unwrap();
    let main = chain(src.path());
    let set = NodeFactory::new().load(&main).unwrap();

    // "item" is referenced before it is declared
    let item = set.resolve_ref(ComponentCategory::Element, "t:item").unwrap();
    assert_eq!(item.tree.get(item.node).and_then(|n| n.name()), Some("item"));

    let code = set.resolve_ref(ComponentCategory::Type, "t:Code").unwrap();
    let origin = code.tree.source(code.node).unwrap();
    assert!(origin.origin_file.ends_with("base.xsd"));

    assert!(set.unresolved_references().is_empty());
}

#[test]
fn test_deeply_nested_restrictions_round_trip() {
    let mut body = String::from(r#"<xs:simpleType name="Deep">"#);
    for _ in 0..9 {
        body.push_str("<xs:restriction><xs:simpleType>");
    }
    body.push_str(r#"<xs:restriction base="xs:string"><xs:minLength value="1"/></xs:restriction>"#);
    for _ in 0..9 {
        body.push_str(r#"</xs:simpleType><xs:maxLength value="64"/></xs:restriction>"#);
    }
    body.push_str("</xs:simpleType>");

    let src = TempDir::new().unwrap();
    let main = write(src.path(), "deep.xsd", &body);
    let set = NodeFactory::new().load(&main).unwrap();

    let text = XsdSerializer::new().serialize(set.tree());
    assert_eq!(text.matches("<xs:restriction").count(), 10);

    let reparsed = NodeFactory::new().load_str(&text, None).unwrap();
    assert_eq!(top_level(reparsed.tree()), top_level(set.tree()));
}

#[test]
fn test_sibling_directory_layout() {
    let src = TempDir::new().unwrap();
    write(
        src.path(),
        "shared/common.xsd",
        r#"<xs:attributeGroup name="audit"><xs:attribute name="by" type="xs:string"/></xs:attributeGroup>"#,
    );
    let main = write(
        src.path(),
        "schemas/main.xsd",
        r#"<xs:include schemaLocation="../shared/common.xsd"/>
<xs:complexType name="Doc"><xs:attributeGroup ref="t:audit"/></xs:complexType>"#,
    );

    let set = NodeFactory::new().load(&main).unwrap();
    let out = TempDir::new().unwrap();
    let options = SaveOptions::into_dir(out.path().join("schemas"));
    let report = MultiFileSerializer::new().save(set.tree(), &options).unwrap();
    assert!(report.is_success());
    assert!(out.path().join("shared/common.xsd").is_file());

    let reloaded = NodeFactory::new().load(out.path().join("schemas/main.xsd")).unwrap();
    assert!(reloaded.diagnostics().is_empty());
    assert!(reloaded.resolve_ref(ComponentCategory::AttributeGroup, "t:audit").is_some());
}

#[test]
fn test_flattened_output_is_self_contained() {
    let src = TempDir::new().unwrap();
    let main = chain(src.path());
    let set = NodeFactory::new().load(&main).unwrap();

    let serializer = XsdSerializer::with_config(SerializerConfig::new().with_indent("\t"));
    let flat = serializer.serialize_flattened(set.tree());
    assert!(!flat.contains("xs:include"));

    let reparsed = NodeFactory::new().load_str(&flat, None).unwrap();
    let tree = reparsed.tree();
    assert!(tree.children(tree.root()).iter().all(|c| tree.tag(*c) != Some(NodeTag::Include)));
    assert!(reparsed.unresolved_references().is_empty());
    assert_eq!(reparsed.index().len(), set.index().len());
}

fn write_doc(dir: &Path, name: &str, text: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, text).unwrap();
    path
}

fn base_with_size(dir: &Path) {
    write(
        dir,
        "base.xsd",
        r#"<xs:simpleType name="Size">
    <xs:restriction base="xs:string"><xs:maxLength value="10"/></xs:restriction>
</xs:simpleType>
<xs:element name="box" type="t:Size"/>"#,
    );
}

#[test]
fn test_redefine_replaces_and_round_trips() {
    let src = TempDir::new().unwrap();
    base_with_size(src.path());
    let main = write(
        src.path(),
        "main.xsd",
        r#"<xs:redefine schemaLocation="base.xsd">
    <xs:simpleType name="Size">
        <xs:restriction base="t:Size"><xs:maxLength value="4"/></xs:restriction>
    </xs:simpleType>
</xs:redefine>"#,
    );

    let set = NodeFactory::new().load(&main).unwrap();
    assert!(set.diagnostics().is_empty());
    let tree = set.tree();
    let size = set.index().lookup(ComponentCategory::Type, "Size").unwrap();
    let redefine = tree.parent(size).unwrap();
    assert_eq!(tree.tag(redefine), Some(NodeTag::Redefine));
    assert_eq!(set.index().duplicates().len(), 0);

    let out = TempDir::new().unwrap();
    let report = MultiFileSerializer::new()
        .save(tree, &SaveOptions::into_dir(out.path()))
        .unwrap();
    assert!(report.is_success());

    let main_text = fs::read_to_string(out.path().join("main.xsd")).unwrap();
    assert!(main_text.contains(r#"<xs:redefine schemaLocation="base.xsd">"#));
    assert!(main_text.contains(r#"<xs:restriction base="t:Size">"#));
    assert!(main_text.contains(r#"<xs:maxLength value="4"/>"#));
    let base_text = fs::read_to_string(out.path().join("base.xsd")).unwrap();
    assert_eq!(base_text.matches("<xs:simpleType").count(), 1);
    assert!(base_text.contains(r#"<xs:maxLength value="10"/>"#));
    assert!(!base_text.contains("redefine"));

    let reloaded = NodeFactory::new().load(out.path().join("main.xsd")).unwrap();
    assert_eq!(top_level(reloaded.tree()), top_level(tree));
    let size = reloaded.index().lookup(ComponentCategory::Type, "Size").unwrap();
    let origin = &reloaded.tree().source(size).unwrap().origin_file;
    assert!(origin.ends_with("main.xsd"));
}

#[test]
fn test_override_replaces_and_round_trips() {
    let src = TempDir::new().unwrap();
    base_with_size(src.path());
    let main = write(
        src.path(),
        "main.xsd",
        r#"<xs:override schemaLocation="base.xsd">
    <xs:simpleType name="Size">
        <xs:restriction base="xs:token"><xs:enumeration value="S"/><xs:enumeration value="L"/></xs:restriction>
    </xs:simpleType>
</xs:override>"#,
    );

    let set = NodeFactory::new().load(&main).unwrap();
    let tree = set.tree();
    let size = set.index().lookup(ComponentCategory::Type, "Size").unwrap();
    assert_eq!(tree.parent(size).and_then(|p| tree.tag(p)), Some(NodeTag::Override));
    assert_eq!(
        set.index().lookup(ComponentCategory::Element, "box").and_then(|b| tree.source(b)).map(|s| s.origin_file.ends_with("base.xsd")),
        Some(true)
    );

    let out = TempDir::new().unwrap();
    let report = MultiFileSerializer::new()
        .save(tree, &SaveOptions::into_dir(out.path()))
        .unwrap();
    assert!(report.is_success());
    let main_text = fs::read_to_string(out.path().join("main.xsd")).unwrap();
    assert!(main_text.contains(r#"<xs:override schemaLocation="base.xsd">"#));
    assert_eq!(main_text.matches("<xs:enumeration").count(), 2);
    let base_text = fs::read_to_string(out.path().join("base.xsd")).unwrap();
    assert!(!base_text.contains("enumeration"));

    let reloaded = NodeFactory::new().load(out.path().join("main.xsd")).unwrap();
    assert_eq!(top_level(reloaded.tree()), top_level(tree));
}

#[test]
fn test_constraints_imports_and_assertions_round_trip() {
    let src = TempDir::new().unwrap();
    write_doc(
        src.path(),
        "other.xsd",
        r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema" xmlns:o="urn:o" targetNamespace="urn:o">
<xs:simpleType name="Code"><xs:restriction base="xs:string"><xs:pattern value="[A-Z]{3}"/></xs:restriction></xs:simpleType>
</xs:schema>"#,
    );
    let main = write_doc(
        src.path(),
        "main.xsd",
        r###"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema" xmlns:t="urn:t" xmlns:o="urn:o" targetNamespace="urn:t" elementFormDefault="qualified">
<xs:import namespace="urn:o" schemaLocation="other.xsd"/>
<xs:element name="catalog">
    <xs:complexType>
        <xs:sequence>
            <xs:element name="product" maxOccurs="unbounded">
                <xs:complexType>
                    <xs:attribute name="sku" type="o:Code"/>
                    <xs:attribute name="line" type="xs:int"/>
                </xs:complexType>
            </xs:element>
            <xs:element name="order" minOccurs="0" maxOccurs="unbounded">
                <xs:complexType>
                    <xs:attribute name="sku" type="o:Code"/>
                    <xs:attribute name="line" type="xs:int"/>
                </xs:complexType>
            </xs:element>
        </xs:sequence>
    </xs:complexType>
    <xs:key name="productKey">
        <xs:selector xpath="t:product"/>
        <xs:field xpath="@sku"/>
        <xs:field xpath="@line"/>
    </xs:key>
    <xs:unique name="orderUnique">
        <xs:selector xpath="t:order"/>
        <xs:field xpath="@sku"/>
    </xs:unique>
    <xs:keyref name="orderRef" refer="t:productKey">
        <xs:selector xpath="t:order"/>
        <xs:field xpath="@sku"/>
        <xs:field xpath="@line"/>
    </xs:keyref>
</xs:element>
<xs:complexType name="Open">
    <xs:openContent mode="suffix"><xs:any namespace="##other" processContents="lax"/></xs:openContent>
    <xs:sequence><xs:element name="v" type="xs:int"/></xs:sequence>
    <xs:assert test="v &gt; 0"/>
</xs:complexType>
<xs:element name="shape" type="t:Open">
    <xs:alternative test="@kind = 'open'" type="t:Open"/>
    <xs:alternative type="xs:anyType"/>
</xs:element>
</xs:schema>"###,
    );

    let set = NodeFactory::new().load(&main).unwrap();
    assert!(set.diagnostics().is_empty());
    let other = set.imported("urn:o").unwrap();
    let code = set.resolve_ref(ComponentCategory::Type, "o:Code").unwrap();
    assert!(std::ptr::eq(code.tree, other));

    let out = TempDir::new().unwrap();
    let serializer = MultiFileSerializer::new();
    assert!(serializer.save(set.tree(), &SaveOptions::into_dir(out.path())).unwrap().is_success());
    assert!(serializer.save(other, &SaveOptions::into_dir(out.path())).unwrap().is_success());

    let main_text = fs::read_to_string(out.path().join("main.xsd")).unwrap();
    assert!(main_text.contains(r#"<xs:import namespace="urn:o" schemaLocation="other.xsd"/>"#));
    assert!(main_text.contains(r#"<xs:keyref name="orderRef" refer="t:productKey">"#));
    assert_eq!(main_text.matches(r#"<xs:field xpath="@line"/>"#).count(), 2);
    assert!(main_text.contains(r#"<xs:openContent mode="suffix">"#));
    assert!(main_text.contains(r#"<xs:assert test="v &gt; 0"/>"#));

    let reloaded = NodeFactory::new().load(out.path().join("main.xsd")).unwrap();
    assert!(reloaded.diagnostics().is_empty());
    assert_eq!(top_level(reloaded.tree()), top_level(set.tree()));
    assert_eq!(top_level(reloaded.imported("urn:o").unwrap()), top_level(other));
    assert!(reloaded.unresolved_references().is_empty());
}

#[test]
fn test_included_file_annotation_survives_save() {
    let src = TempDir::new().unwrap();
    write(
        src.path(),
        "common.xsd",
        r#"<xs:annotation>
    <xs:documentation xml:lang="en">Shared types</xs:documentation>
    <xs:appinfo source="urn:tool"><cfg level="2"/></xs:appinfo>
</xs:annotation>
<xs:simpleType name="Id"><xs:restriction base="xs:token"/></xs:simpleType>"#,
    );
    let main = write(
        src.path(),
        "main.xsd",
        r#"<xs:annotation><xs:documentation>Main</xs:documentation></xs:annotation>
<xs:include schemaLocation="common.xsd"/>
<xs:element name="id" type="t:Id"/>"#,
    );

    let set = NodeFactory::new().load(&main).unwrap();
    let common = set.included_files().next().unwrap();
    assert_eq!(common.documentation.as_deref(), Some("Shared types"));
    assert_eq!(common.annotation.lang.as_deref(), Some("en"));
    assert_eq!(common.annotation.appinfo.len(), 1);

    let out = TempDir::new().unwrap();
    let report = MultiFileSerializer::new()
        .save(set.tree(), &SaveOptions::into_dir(out.path()))
        .unwrap();
    assert!(report.is_success());

    let common_text = fs::read_to_string(out.path().join("common.xsd")).unwrap();
    assert!(common_text.contains(r#"<xs:documentation xml:lang="en">Shared types</xs:documentation>"#));
    assert!(common_text.contains(r#"<xs:appinfo source="urn:tool"><cfg level="2"/></xs:appinfo>"#));
    let main_text = fs::read_to_string(out.path().join("main.xsd")).unwrap();
    assert!(main_text.contains("Main"));
    assert!(!main_text.contains("Shared types"));

    let reloaded = NodeFactory::new().load(out.path().join("main.xsd")).unwrap();
    let again = reloaded.included_files().next().unwrap();
    assert_eq!(again.documentation, common.documentation);
    assert_eq!(again.annotation, common.annotation);
}

#[test]
fn test_flattened_output_declares_included_prefixes() {
    let src = TempDir::new().unwrap();
    write_doc(
        src.path(),
        "part.xsd",
        r#"<xsd:schema xmlns:xsd="http://www.w3.org/2001/XMLSchema" xmlns:o="urn:two" targetNamespace="urn:t">
<xsd:element name="b" type="o:B"/>
</xsd:schema>"#,
    );
    let main = write_doc(
        src.path(),
        "main.xsd",
        r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema" xmlns:o="urn:one" targetNamespace="urn:t">
<xs:include schemaLocation="part.xsd"/>
<xs:element name="a" type="o:A"/>
</xs:schema>"#,
    );

    let set = NodeFactory::new().load(&main).unwrap();
    let flat = XsdSerializer::new().serialize_flattened(set.tree());
    assert!(flat.contains(r#"xmlns:o="urn:one""#));
    assert!(flat.contains(r#"xmlns:o1="urn:two""#));
    assert!(flat.contains(r#"<xs:element name="a" type="o:A"/>"#));
    assert!(flat.contains(r#"<xs:element name="b" type="o1:B"/>"#));

    let reparsed = NodeFactory::new().load_str(&flat, None).unwrap();
    let tree = reparsed.tree();
    let b = tree
        .children(tree.root())
        .iter()
        .copied()
        .find(|c| tree.get(*c).and_then(|n| n.name()) == Some("b"))
        .unwrap();
    let type_name = tree.property(b, NodeProperty::Type).unwrap();
    assert_eq!(expand_name(tree, b, &type_name), Some(QName::namespaced("urn:two", "B")));
}

#[test]
fn test_xml_namespace_attribute_resolves_through_import() {
    let src = TempDir::new().unwrap();
    write_doc(
        src.path(),
        "xml.xsd",
        r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema" targetNamespace="http://www.w3.org/XML/1998/namespace">
<xs:attribute name="lang" type="xs:language"/>
</xs:schema>"#,
    );
    let main = write(
        src.path(),
        "main.xsd",
        r#"<xs:import namespace="http://www.w3.org/XML/1998/namespace" schemaLocation="xml.xsd"/>
<xs:complexType name="Text">
    <xs:simpleContent>
        <xs:extension base="xs:string"><xs:attribute ref="xml:lang"/></xs:extension>
    </xs:simpleContent>
</xs:complexType>"#,
    );

    let set = NodeFactory::new().load(&main).unwrap();
    assert!(set.diagnostics().is_empty());
    let lang = set.resolve_ref(ComponentCategory::Attribute, "xml:lang").unwrap();
    assert_eq!(lang.tree.get(lang.node).and_then(|n| n.name()), Some("lang"));
    assert!(set.unresolved_references().is_empty());
}
