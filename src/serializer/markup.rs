//! Indented XML text builder

use quick_xml::escape::escape;

/// Accumulates indented markup for one document
pub(crate) struct Markup {
    out: String,
    indent: String,
    prefix: String,
}

impl Markup {
    /// `prefix` is the XSD prefix ("" for unprefixed documents)
    pub(crate) fn new(indent: &str, prefix: &str) -> Self {
        Self {
            out: String::new(),
            indent: indent.to_string(),
            prefix: prefix.to_string(),
        }
    }

    pub(crate) fn declaration(&mut self) {
        self.out.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    }

    fn qualified(&self, local: &str) -> String {
        if self.prefix.is_empty() {
            local.to_string()
        } else {
            format!("{}:{}", self.prefix, local)
        }
    }

    fn pad(&mut self, depth: usize) {
        for _ in 0..depth {
            self.out.push_str(&self.indent);
        }
    }

    fn start(&mut self, depth: usize, local: &str, attributes: &[(String, String)]) {
        self.pad(depth);
        self.out.push('<');
        let name = self.qualified(local);
        self.out.push_str(&name);
        for (key, value) in attributes {
            self.out.push(' ');
            self.out.push_str(key);
            self.out.push_str("=\"");
            self.out.push_str(&escape(value.as_str()));
            self.out.push('"');
        }
    }

    /// `<prefix:local attr="..."/>`
    pub(crate) fn empty(&mut self, depth: usize, local: &str, attributes: &[(String, String)]) {
        self.start(depth, local, attributes);
        self.out.push_str("/>\n");
    }

    /// `<prefix:local attr="...">`
    pub(crate) fn open(&mut self, depth: usize, local: &str, attributes: &[(String, String)]) {
        self.start(depth, local, attributes);
        self.out.push_str(">\n");
    }

    /// `</prefix:local>`
    pub(crate) fn close(&mut self, depth: usize, local: &str) {
        self.pad(depth);
        self.out.push_str("</");
        let name = self.qualified(local);
        self.out.push_str(&name);
        self.out.push_str(">\n");
    }

    /// `<prefix:local attr="...">text</prefix:local>` on one line
    pub(crate) fn text(&mut self, depth: usize, local: &str, attributes: &[(String, String)], text: &str) {
        self.start(depth, local, attributes);
        self.out.push('>');
        self.out.push_str(&escape(text));
        self.out.push_str("</");
        let name = self.qualified(local);
        self.out.push_str(&name);
        self.out.push_str(">\n");
    }

    /// Already serialized markup on its own line
    pub(crate) fn raw(&mut self, depth: usize, markup: &str) {
        self.pad(depth);
        self.out.push_str(markup);
        self.out.push('\n');
    }

    pub(crate) fn finish(self) -> String {
        self.out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escapes_attribute_values() {
        let mut m = Markup::new("  ", "xs");
        m.empty(1, "selector", &[("xpath".into(), "a[@b < 3 and @c = \"x\"] & 'y'".into())]);
        assert_eq!(
            m.finish(),
            "  <xs:selector xpath=\"a[@b &lt; 3 and @c = &quot;x&quot;] &amp; &apos;y&apos;\"/>\n"
        );
    }

    #[test]
    fn test_unprefixed() {
        let mut m = Markup::new("\t", "");
        m.open(0, "schema", &[]);
        m.text(1, "documentation", &[], "a > b");
        m.close(0, "schema");
        assert_eq!(m.finish(), "<schema>\n\t<documentation>a &gt; b</documentation>\n</schema>\n");
    }
}
