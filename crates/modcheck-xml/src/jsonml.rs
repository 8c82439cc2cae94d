//! JsonML conversion.
//!
//! Documents and the node values carried by patch operations are written as
//! JsonML: an element is `[tag, {attrs}?, ...children]` and a text node is a
//! plain JSON string. Numbers and booleans are accepted as text.

use serde_json::{Map, Value};

use crate::document::{Document, DocumentError, NodeId, NodeKind};

fn invalid(msg: impl Into<String>) -> DocumentError {
    DocumentError::InvalidJsonMl(msg.into())
}

/// Splits an element array into its tag, optional attributes and children.
fn split(items: &[Value]) -> Result<(&str, Option<&Map<String, Value>>, &[Value]), DocumentError> {
    let tag = items
        .first()
        .and_then(Value::as_str)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| invalid("element must start with a tag name"))?;
    match items.get(1) {
        Some(Value::Object(attrs)) => Ok((tag, Some(attrs), &items[2..])),
        _ => Ok((tag, None, &items[1..])),
    }
}

/// Checks that `value` is a well-formed JsonML node without building it.
pub fn validate_jsonml(value: &Value) -> Result<(), DocumentError> {
    match value {
        Value::String(_) | Value::Number(_) | Value::Bool(_) => Ok(()),
        Value::Array(items) => {
            let (_, _, children) = split(items)?;
            children.iter().try_for_each(validate_jsonml)
        }
        Value::Null => Err(invalid("null is not a node")),
        Value::Object(_) => Err(invalid("attributes must directly follow the tag")),
    }
}

impl Document {
    /// Builds a document whose root element is the given JsonML element.
    pub fn from_jsonml(value: &Value) -> Result<Self, DocumentError> {
        if !value.is_array() {
            return Err(invalid("root must be an element array"));
        }
        let mut doc = Document::default();
        let root = doc.create_from_jsonml(value)?;
        let document = doc.root();
        doc.append_child(document, root)?;
        Ok(doc)
    }

    /// Builds a detached subtree from a JsonML node. Malformed input is
    /// rejected before any node is allocated.
    pub fn create_from_jsonml(&mut self, value: &Value) -> Result<NodeId, DocumentError> {
        validate_jsonml(value)?;
        self.build_jsonml(value)
    }

    fn build_jsonml(&mut self, value: &Value) -> Result<NodeId, DocumentError> {
        let items = match value {
            Value::Array(items) => items,
            Value::String(s) => return Ok(self.create_text(s)),
            other => return Ok(self.create_text(&other.to_string())),
        };
        let (tag, attrs, children) = split(items)?;
        let element = self.create_element(tag);
        for (key, val) in attrs.into_iter().flatten() {
            let val = match val {
                Value::String(s) => s.clone(),
                Value::Null => continue,
                other => other.to_string(),
            };
            self.set_attr(element, key, &val)?;
        }
        for child in children {
            let child = self.build_jsonml(child)?;
            self.append_child(element, child)?;
        }
        Ok(element)
    }

    /// The root element as JsonML, `Null` for an empty document.
    pub fn to_jsonml(&self) -> Value {
        self.root_element()
            .map(|root| self.node_to_jsonml(root))
            .unwrap_or(Value::Null)
    }

    /// A single node (and its subtree) as JsonML.
    pub fn node_to_jsonml(&self, id: NodeId) -> Value {
        match self.kind(id) {
            Some(NodeKind::Element { tag, attrs }) => {
                let mut items = vec![Value::String(tag.clone())];
                if !attrs.is_empty() {
                    let map: Map<String, Value> = attrs
                        .iter()
                        .map(|(k, v)| (k.clone(), Value::String(v.clone())))
                        .collect();
                    items.push(Value::Object(map));
                }
                items.extend(self.children(id).iter().map(|c| self.node_to_jsonml(*c)));
                Value::Array(items)
            }
            Some(NodeKind::Text(text)) => Value::String(text.clone()),
            Some(NodeKind::Document) => Value::Array(
                self.children(id)
                    .iter()
                    .map(|c| self.node_to_jsonml(*c))
                    .collect(),
            ),
            None => Value::Null,
        }
    }
}
