//! XPath-subset evaluator.

use std::collections::HashSet;

use super::types::*;
use crate::document::{Document, NodeId, NodeKind};

/// XPath-subset evaluator.
pub struct XPathEval;

impl XPathEval {
    /// Evaluate `path` against `doc`, starting at the document node.
    ///
    /// Returns matching nodes in document order without duplicates.
    pub fn eval(path: &XPath, doc: &Document) -> Vec<NodeId> {
        let mut context = vec![doc.root()];
        for step in &path.steps {
            let mut next = Vec::new();
            for node in &context {
                match step.axis {
                    Axis::Child => Self::eval_step(doc, *node, step, &mut next),
                    Axis::Descendant => {
                        Self::eval_step(doc, *node, step, &mut next);
                        for descendant in doc.descendants(*node) {
                            Self::eval_step(doc, descendant, step, &mut next);
                        }
                    }
                }
            }
            context = Self::document_order(doc, next);
            if context.is_empty() {
                break;
            }
        }
        context
    }

    /// Applies one step to the children of a single context node.
    fn eval_step(doc: &Document, node: NodeId, step: &Step, out: &mut Vec<NodeId>) {
        let mut candidates: Vec<NodeId> = doc
            .children(node)
            .iter()
            .copied()
            .filter(|child| Self::node_test(doc, *child, &step.test))
            .collect();

        for predicate in &step.predicates {
            candidates = match predicate {
                Predicate::Position(n) => n
                    .checked_sub(1)
                    .and_then(|i| candidates.get(i).copied())
                    .into_iter()
                    .collect(),
                Predicate::Filter(conditions) => candidates
                    .into_iter()
                    .filter(|c| conditions.iter().all(|cond| Self::condition(doc, *c, cond)))
                    .collect(),
            };
        }
        out.extend(candidates);
    }

    fn node_test(doc: &Document, node: NodeId, test: &NodeTest) -> bool {
        match (test, doc.kind(node)) {
            (NodeTest::Name(name), Some(NodeKind::Element { tag, .. })) => tag == name,
            (NodeTest::AnyElement, Some(NodeKind::Element { .. })) => true,
            (NodeTest::Text, Some(NodeKind::Text(_))) => true,
            _ => false,
        }
    }

    fn condition(doc: &Document, node: NodeId, condition: &Condition) -> bool {
        match condition {
            Condition::Attribute { name, value } => match (doc.attr(node, name), value) {
                (Some(actual), Some(expected)) => actual == expected,
                (Some(_), None) => true,
                (None, _) => false,
            },
            Condition::Child { name, value } => doc
                .element_children(node)
                .filter(|c| doc.tag(*c) == Some(name.as_str()))
                .any(|c| match value {
                    Some(expected) => doc.text_content(c) == *expected,
                    None => true,
                }),
            Condition::Text { value } => {
                let text = doc.text_content(node);
                match value {
                    Some(expected) => text == *expected,
                    None => !text.is_empty(),
                }
            }
        }
    }

    /// Deduplicates and sorts nodes into document order.
    fn document_order(doc: &Document, nodes: Vec<NodeId>) -> Vec<NodeId> {
        if nodes.len() < 2 {
            return nodes;
        }
        let wanted: HashSet<NodeId> = nodes.into_iter().collect();
        doc.descendants(doc.root())
            .into_iter()
            .filter(|n| wanted.contains(n))
            .collect()
    }
}
