//! The operation tree.
//!
//! Every node returns a boolean from [`Operation::apply`]. Combinators hold
//! children; leaves test the mod list, write to the log, or edit the
//! document.

mod document;
mod log_write;
mod logic;
mod mod_check;
mod structural;

pub use document::{AddOrder, DocumentAction, DocumentLeaf};
pub use log_write::LogWrite;
pub use logic::{IfElse, Loop, Once, Sequence};
pub use mod_check::{ModCheck, ModCheckKind};
pub use structural::{Move, Search, DEFAULT_SEARCH_TAG};

use modcheck_xml::Document;

use crate::context::ExecutionContext;

#[derive(Debug, Clone, PartialEq)]
pub enum OpKind {
    And(Vec<Operation>),
    Or(Vec<Operation>),
    IfElse(IfElse),
    Once(Once),
    Sequence(Sequence),
    Loop(Loop),
    Search(Search),
    Move(Move),
    ModCheck(ModCheck),
    LogWrite(LogWrite),
    Document(DocumentLeaf),
}

/// One node of a patch tree with its display name (empty if unset).
#[derive(Debug, Clone, PartialEq)]
pub struct Operation {
    pub name: String,
    pub kind: OpKind,
}

impl Operation {
    pub fn new(kind: impl Into<OpKind>) -> Self {
        Self {
            name: String::new(),
            kind: kind.into(),
        }
    }

    pub fn named(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    pub fn and(tests: Vec<Operation>) -> Self {
        Self::new(OpKind::And(tests))
    }

    pub fn or(tests: Vec<Operation>) -> Self {
        Self::new(OpKind::Or(tests))
    }

    /// Name used in patch files and configuration error messages.
    pub fn op_name(&self) -> &'static str {
        match &self.kind {
            OpKind::And(_) => "and",
            OpKind::Or(_) => "or",
            OpKind::IfElse(_) => "ifElse",
            OpKind::Once(_) => "once",
            OpKind::Sequence(_) => "sequence",
            OpKind::Loop(_) => "loop",
            OpKind::Search(_) => "search",
            OpKind::Move(_) => "move",
            OpKind::ModCheck(check) => check.kind.op_name(),
            OpKind::LogWrite(_) => "logWrite",
            OpKind::Document(leaf) => leaf.action.op_name(),
        }
    }

    pub fn apply(&mut self, doc: &mut Document, ctx: &mut ExecutionContext<'_>) -> bool {
        ctx.enter(&self.name);
        let name = &self.name;
        let result = match &mut self.kind {
            OpKind::And(tests) => tests.iter_mut().all(|t| t.apply(doc, ctx)),
            OpKind::Or(tests) => tests.iter_mut().any(|t| t.apply(doc, ctx)),
            OpKind::IfElse(op) => op.apply(name, doc, ctx),
            OpKind::Once(op) => op.apply(),
            OpKind::Sequence(op) => op.apply(doc, ctx),
            OpKind::Loop(op) => op.apply(name, doc, ctx),
            OpKind::Search(op) => op.apply(name, doc, ctx),
            OpKind::Move(op) => op.apply(name, doc, ctx),
            OpKind::ModCheck(op) => op.apply(name, ctx),
            OpKind::LogWrite(op) => op.apply(name, ctx),
            OpKind::Document(op) => op.apply(name, doc, ctx),
        };
        ctx.leave();
        result
    }

    /// Whether [`Operation::reset_run`] has any effect on this node.
    pub fn supports_reset(&self) -> bool {
        !matches!(self.kind, OpKind::ModCheck(_) | OpKind::Document(_) | OpKind::Move(_))
    }

    /// Clears per-run state so the node behaves as if never applied.
    ///
    /// Reset propagates to every descendant that supports it.
    pub fn reset_run(&mut self) {
        match &mut self.kind {
            OpKind::And(tests) | OpKind::Or(tests) => reset_children(tests),
            OpKind::IfElse(op) => op.reset_run(),
            OpKind::Once(op) => op.reset_run(),
            OpKind::Sequence(op) => op.reset_run(),
            OpKind::Loop(op) => op.reset_run(),
            OpKind::Search(op) => op.reset_run(),
            OpKind::LogWrite(op) => op.reset_run(),
            OpKind::Move(_) | OpKind::ModCheck(_) | OpKind::Document(_) => {}
        }
    }
}

pub(crate) fn reset_children(children: &mut [Operation]) {
    for child in children.iter_mut().filter(|c| c.supports_reset()) {
        child.reset_run();
    }
}

pub(crate) fn reset_child(child: &mut Option<Box<Operation>>) {
    if let Some(child) = child.as_deref_mut().filter(|c| c.supports_reset()) {
        child.reset_run();
    }
}

macro_rules! impl_into_kind {
    ($($ty:ident => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for OpKind {
                fn from(op: $ty) -> Self {
                    OpKind::$variant(op)
                }
            }
        )*
    };
}

impl_into_kind! {
    IfElse => IfElse,
    Once => Once,
    Sequence => Sequence,
    Loop => Loop,
    Search => Search,
    Move => Move,
    ModCheck => ModCheck,
    LogWrite => LogWrite,
    DocumentLeaf => Document,
}
