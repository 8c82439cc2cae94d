//! Leaves that rearrange the document: `search` and `move`.

use modcheck_xml::{Document, NodeId, XPath, XPathParser};

use super::{reset_children, Operation};
use crate::context::ExecutionContext;
use crate::error::ConfigError;

pub const DEFAULT_SEARCH_TAG: &str = "SearchResult";

/// Parses a required path field.
pub(super) fn required_path(op: &'static str, path: Option<&str>) -> Result<XPath, ConfigError> {
    let path = path
        .filter(|p| !p.trim().is_empty())
        .ok_or(ConfigError::MissingField { op, field: "path" })?;
    XPathParser::parse(path).map_err(|source| ConfigError::InvalidPath {
        op,
        path: path.to_string(),
        source,
    })
}

fn edit(op: &'static str) -> impl Fn(modcheck_xml::DocumentError) -> ConfigError {
    move |source| ConfigError::Document { op, source }
}

/// Runs child operations against each match in isolation.
///
/// Every match is moved under a scratch element appended to the root
/// element, so children address it as `/<root>/<tag>/...`. Whatever the
/// scratch element holds afterwards goes back to the match's original
/// position, and the scratch element is released.
///
/// Every match is processed. With `stop_on_fail`, a failing child skips the
/// remaining children of that match and makes the search fail.
#[derive(Debug, Clone, PartialEq)]
pub struct Search {
    pub path: Option<String>,
    pub operations: Vec<Operation>,
    pub stop_on_fail: bool,
    pub tag: String,
}

impl Search {
    pub fn new(path: &str, operations: Vec<Operation>) -> Self {
        Self {
            path: Some(path.to_string()),
            operations,
            stop_on_fail: true,
            tag: DEFAULT_SEARCH_TAG.to_string(),
        }
    }

    pub fn stop_on_fail(mut self, stop: bool) -> Self {
        self.stop_on_fail = stop;
        self
    }

    pub fn tag(mut self, tag: &str) -> Self {
        self.tag = tag.to_string();
        self
    }

    pub(super) fn apply(&mut self, name: &str, doc: &mut Document, ctx: &mut ExecutionContext<'_>) -> bool {
        match self.run(doc, ctx) {
            Ok(result) => result,
            Err(err) => {
                ctx.report_config_error(name, &err);
                false
            }
        }
    }

    fn run(&mut self, doc: &mut Document, ctx: &mut ExecutionContext<'_>) -> Result<bool, ConfigError> {
        let path = required_path("search", self.path.as_deref())?;
        let matches = doc.select(&path);

        let mut processed = false;
        let mut passed = true;
        for node in matches {
            // An earlier pass may have removed the match.
            if !doc.is_attached(node) {
                continue;
            }
            let Some(parent) = doc.parent(node) else {
                continue;
            };
            processed = true;
            passed &= self.isolate(node, parent, doc, ctx)?;
        }
        Ok(processed && passed)
    }

    /// Runs the children against `node` alone, then puts the scratch
    /// element's contents back where `node` was.
    fn isolate(
        &mut self,
        node: NodeId,
        parent: NodeId,
        doc: &mut Document,
        ctx: &mut ExecutionContext<'_>,
    ) -> Result<bool, ConfigError> {
        let next = doc.next_sibling(node);
        let host = match doc.root_element() {
            Some(root) if !doc.is_ancestor_of(node, root) => root,
            _ => doc.root(),
        };
        let scratch = doc.create_element(&self.tag);
        doc.append_child(host, scratch).map_err(edit("search"))?;
        doc.append_child(scratch, node).map_err(edit("search"))?;

        let mut passed = true;
        for op in &mut self.operations {
            if !op.apply(doc, ctx) && self.stop_on_fail {
                passed = false;
                break;
            }
        }

        let results = doc.children(scratch).to_vec();
        let anchor = next.filter(|n| doc.parent(*n) == Some(parent) && !results.contains(n));
        for result in results {
            match anchor {
                Some(anchor) => doc.insert_before(parent, result, anchor),
                None => doc.append_child(parent, result),
            }
            .map_err(edit("search"))?;
        }
        doc.detach(scratch).map_err(edit("search"))?;
        doc.release(scratch).map_err(edit("search"))?;
        Ok(passed)
    }

    pub(super) fn reset_run(&mut self) {
        reset_children(&mut self.operations);
    }
}

/// Pulls the nodes matched by each follower path in behind an anchor.
#[derive(Debug, Clone, PartialEq)]
pub struct Move {
    pub path: Option<String>,
    pub followers: Vec<String>,
}

impl Move {
    pub fn new(path: &str, followers: &[&str]) -> Self {
        Self {
            path: Some(path.to_string()),
            followers: followers.iter().map(|f| f.to_string()).collect(),
        }
    }

    pub(super) fn apply(&mut self, name: &str, doc: &mut Document, ctx: &mut ExecutionContext<'_>) -> bool {
        match self.run(doc) {
            Ok(moved) => moved,
            Err(err) => {
                ctx.report_config_error(name, &err);
                false
            }
        }
    }

    fn run(&self, doc: &mut Document) -> Result<bool, ConfigError> {
        let anchor_path = required_path("move", self.path.as_deref())?;
        let followers = self
            .followers
            .iter()
            .map(|f| required_path("move", Some(f.as_str())))
            .collect::<Result<Vec<_>, _>>()?;

        let Some(&anchor) = doc.select(&anchor_path).first() else {
            return Ok(false);
        };
        let source = doc.source(anchor);

        // Walking the followers backwards leaves the last one next to the anchor.
        let mut cursor = anchor;
        let mut moved = false;
        for follower in followers.iter().rev() {
            for node in doc.select(follower) {
                if doc.is_ancestor_of(node, anchor) || doc.is_ancestor_of(node, cursor) {
                    continue;
                }
                doc.insert_after(cursor, node).map_err(edit("move"))?;
                if source.is_some() {
                    doc.set_source(node, source).map_err(edit("move"))?;
                }
                cursor = node;
                moved = true;
            }
        }
        Ok(moved)
    }
}
