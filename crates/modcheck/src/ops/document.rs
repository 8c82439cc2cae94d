//! Plain document edits: check, add, remove, replace and set an attribute.

use modcheck_xml::{validate_jsonml, Document, NodeId};
use serde_json::Value;

use super::structural::required_path;
use crate::context::ExecutionContext;
use crate::error::ConfigError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AddOrder {
    #[default]
    Append,
    Prepend,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DocumentAction {
    /// Passes when the path matches anything.
    Exists,
    /// Inserts copies of `value` under every matched element.
    Add { value: Vec<Value>, order: AddOrder },
    Remove,
    /// Swaps every match for copies of `value`.
    Replace { value: Vec<Value> },
    SetAttribute { attribute: Option<String>, value: String },
}

impl DocumentAction {
    pub fn op_name(&self) -> &'static str {
        match self {
            DocumentAction::Exists => "exists",
            DocumentAction::Add { .. } => "add",
            DocumentAction::Remove => "remove",
            DocumentAction::Replace { .. } => "replace",
            DocumentAction::SetAttribute { .. } => "setAttribute",
        }
    }
}

/// A document edit applied to every node `path` selects. Passes when the
/// path matched something the action applies to.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentLeaf {
    pub path: Option<String>,
    pub action: DocumentAction,
}

impl DocumentLeaf {
    pub fn new(path: &str, action: DocumentAction) -> Self {
        Self {
            path: Some(path.to_string()),
            action,
        }
    }

    pub fn exists(path: &str) -> Self {
        Self::new(path, DocumentAction::Exists)
    }

    pub fn add(path: &str, value: Vec<Value>) -> Self {
        Self::new(
            path,
            DocumentAction::Add {
                value,
                order: AddOrder::Append,
            },
        )
    }

    pub fn remove(path: &str) -> Self {
        Self::new(path, DocumentAction::Remove)
    }

    pub fn replace(path: &str, value: Vec<Value>) -> Self {
        Self::new(path, DocumentAction::Replace { value })
    }

    pub fn set_attribute(path: &str, attribute: &str, value: &str) -> Self {
        Self::new(
            path,
            DocumentAction::SetAttribute {
                attribute: Some(attribute.to_string()),
                value: value.to_string(),
            },
        )
    }

    pub(super) fn apply(&mut self, name: &str, doc: &mut Document, ctx: &mut ExecutionContext<'_>) -> bool {
        match self.run(doc) {
            Ok(result) => result,
            Err(err) => {
                ctx.report_config_error(name, &err);
                false
            }
        }
    }

    fn run(&self, doc: &mut Document) -> Result<bool, ConfigError> {
        let op = self.action.op_name();
        let path = required_path(op, self.path.as_deref())?;
        let matches = doc.select(&path);
        let elements: Vec<NodeId> = matches.iter().copied().filter(|n| doc.is_element(*n)).collect();
        let edit = |source| ConfigError::Document { op, source };

        match &self.action {
            DocumentAction::Exists => Ok(!matches.is_empty()),
            DocumentAction::Add { value, order } => {
                require_value(op, value)?;
                for &target in &elements {
                    let nodes = build(doc, op, value)?;
                    match order {
                        AddOrder::Append => {
                            for node in nodes {
                                doc.append_child(target, node).map_err(edit)?;
                            }
                        }
                        AddOrder::Prepend => {
                            for node in nodes.into_iter().rev() {
                                doc.prepend_child(target, node).map_err(edit)?;
                            }
                        }
                    }
                }
                Ok(!elements.is_empty())
            }
            DocumentAction::Remove => {
                for &target in &matches {
                    doc.detach(target).map_err(edit)?;
                }
                Ok(!matches.is_empty())
            }
            DocumentAction::Replace { value } => {
                require_value(op, value)?;
                let mut any = false;
                for &target in &matches {
                    let Some(parent) = doc.parent(target) else {
                        continue;
                    };
                    for node in build(doc, op, value)? {
                        doc.insert_before(parent, node, target).map_err(edit)?;
                    }
                    doc.detach(target).map_err(edit)?;
                    any = true;
                }
                Ok(any)
            }
            DocumentAction::SetAttribute { attribute, value } => {
                let attribute = attribute
                    .as_deref()
                    .filter(|a| !a.is_empty())
                    .ok_or(ConfigError::MissingField { op, field: "attribute" })?;
                for &target in &elements {
                    doc.set_attr(target, attribute, value).map_err(edit)?;
                }
                Ok(!elements.is_empty())
            }
        }
    }
}

/// Rejects an empty or malformed value before any target is touched.
fn require_value(op: &'static str, value: &[Value]) -> Result<(), ConfigError> {
    if value.is_empty() {
        return Err(ConfigError::MissingField { op, field: "value" });
    }
    value
        .iter()
        .try_for_each(validate_jsonml)
        .map_err(|source| ConfigError::InvalidValue { op, source })
}

fn build(doc: &mut Document, op: &'static str, value: &[Value]) -> Result<Vec<NodeId>, ConfigError> {
    value
        .iter()
        .map(|v| {
            doc.create_from_jsonml(v)
                .map_err(|source| ConfigError::InvalidValue { op, source })
        })
        .collect()
}
