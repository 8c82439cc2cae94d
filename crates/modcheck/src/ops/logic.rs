//! Control-flow combinators.

use modcheck_xml::Document;

use super::{reset_child, reset_children, Operation};
use crate::context::ExecutionContext;
use crate::error::ConfigError;

/// Runs `test`, then `passed` or `failed`.
#[derive(Debug, Clone, PartialEq)]
pub struct IfElse {
    pub test: Option<Box<Operation>>,
    pub passed: Option<Box<Operation>>,
    pub failed: Option<Box<Operation>>,
    /// Return the branch result instead of the test result.
    pub pass_inner_test: bool,
}

impl IfElse {
    pub fn new(test: Operation) -> Self {
        Self {
            test: Some(Box::new(test)),
            passed: None,
            failed: None,
            pass_inner_test: true,
        }
    }

    pub fn passed(mut self, op: Operation) -> Self {
        self.passed = Some(Box::new(op));
        self
    }

    pub fn failed(mut self, op: Operation) -> Self {
        self.failed = Some(Box::new(op));
        self
    }

    pub fn pass_inner_test(mut self, pass: bool) -> Self {
        self.pass_inner_test = pass;
        self
    }

    pub(super) fn apply(&mut self, name: &str, doc: &mut Document, ctx: &mut ExecutionContext<'_>) -> bool {
        let Some(test) = self.test.as_deref_mut() else {
            ctx.report_config_error(
                name,
                &ConfigError::MissingField {
                    op: "ifElse",
                    field: "test",
                },
            );
            return false;
        };
        let result = test.apply(doc, ctx);
        let branch = if result {
            self.passed.as_deref_mut()
        } else {
            self.failed.as_deref_mut()
        };
        let inner = branch.map_or(true, |op| op.apply(doc, ctx));
        if self.pass_inner_test {
            inner
        } else {
            result
        }
    }

    pub(super) fn reset_run(&mut self) {
        reset_child(&mut self.test);
        reset_child(&mut self.passed);
        reset_child(&mut self.failed);
    }
}

/// Passes on the first application only.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Once {
    pub executed: bool,
}

impl Once {
    pub fn new() -> Self {
        Self::default()
    }

    pub(super) fn apply(&mut self) -> bool {
        !std::mem::replace(&mut self.executed, true)
    }

    pub(super) fn reset_run(&mut self) {
        self.executed = false;
    }
}

/// Runs every child in order.
#[derive(Debug, Clone, PartialEq)]
pub struct Sequence {
    pub operations: Vec<Operation>,
    /// Fail without running anything after the first application.
    pub once: bool,
    pub stop_on_fail: bool,
    pub executed: bool,
}

impl Sequence {
    pub fn new(operations: Vec<Operation>) -> Self {
        Self {
            operations,
            once: false,
            stop_on_fail: true,
            executed: false,
        }
    }

    pub fn once(mut self, once: bool) -> Self {
        self.once = once;
        self
    }

    pub fn stop_on_fail(mut self, stop: bool) -> Self {
        self.stop_on_fail = stop;
        self
    }

    pub(super) fn apply(&mut self, doc: &mut Document, ctx: &mut ExecutionContext<'_>) -> bool {
        if self.once && self.executed {
            return false;
        }
        self.executed = true;

        let mut result = true;
        for op in &mut self.operations {
            if !op.apply(doc, ctx) {
                result = false;
                if self.stop_on_fail {
                    break;
                }
            }
        }
        result
    }

    pub(super) fn reset_run(&mut self) {
        self.executed = false;
        reset_children(&mut self.operations);
    }
}

/// Applies one operation a fixed number of times.
#[derive(Debug, Clone, PartialEq)]
pub struct Loop {
    pub operation: Option<Box<Operation>>,
    pub times: usize,
    /// Reset the operation before every iteration.
    pub reset: bool,
}

impl Loop {
    pub fn new(operation: Operation) -> Self {
        Self {
            operation: Some(Box::new(operation)),
            times: 1,
            reset: true,
        }
    }

    pub fn times(mut self, times: usize) -> Self {
        self.times = times;
        self
    }

    pub fn reset(mut self, reset: bool) -> Self {
        self.reset = reset;
        self
    }

    /// Iteration results are not inspected; the loop passes whenever it has
    /// an operation to run.
    pub(super) fn apply(&mut self, name: &str, doc: &mut Document, ctx: &mut ExecutionContext<'_>) -> bool {
        let Some(op) = self.operation.as_deref_mut() else {
            ctx.report_config_error(name, &ConfigError::LoopWithoutOperation);
            return false;
        };
        for _ in 0..self.times {
            if self.reset && op.supports_reset() {
                op.reset_run();
            }
            op.apply(doc, ctx);
        }
        true
    }

    pub(super) fn reset_run(&mut self) {
        reset_child(&mut self.operation);
    }
}
