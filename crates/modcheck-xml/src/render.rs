//! Compact XML serializer.

use crate::document::{Document, NodeId, NodeKind};

fn escape_text(s: &str) -> String {
    s.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

fn escape_attr(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('"', "&quot;")
        .replace('<', "&lt;")
}

impl Document {
    /// Serializes every top-level node without indentation.
    pub fn to_xml(&self) -> String {
        self.node_to_xml(self.root())
    }

    /// Serializes a single node and its subtree.
    pub fn node_to_xml(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.write_node(id, &mut out);
        out
    }

    fn write_node(&self, id: NodeId, out: &mut String) {
        match self.kind(id) {
            Some(NodeKind::Document) => {
                for child in self.children(id) {
                    self.write_node(*child, out);
                }
            }
            Some(NodeKind::Text(text)) => out.push_str(&escape_text(text)),
            Some(NodeKind::Element { tag, attrs }) => {
                out.push('<');
                out.push_str(tag);
                for (k, v) in attrs {
                    out.push(' ');
                    out.push_str(k);
                    out.push_str("=\"");
                    out.push_str(&escape_attr(v));
                    out.push('"');
                }
                let children = self.children(id);
                if children.is_empty() {
                    out.push_str(" />");
                    return;
                }
                out.push('>');
                for child in children {
                    self.write_node(*child, out);
                }
                out.push_str("</");
                out.push_str(tag);
                out.push('>');
            }
            None => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::Document;
    use serde_json::json;

    #[test]
    fn renders_nested_elements() {
        let doc = Document::from_jsonml(&json!(["Defs",
            ["ThingDef", {"Name": "A&B"}, ["label", "<wall>"]],
            ["Empty"]
        ]))
        .unwrap();
        assert_eq!(
            doc.to_xml(),
            r#"<Defs><ThingDef Name="A&amp;B"><label>&lt;wall&gt;</label></ThingDef><Empty /></Defs>"#
        );
    }
}
