use crate::context::ExecutionContext;
use crate::diagnostics::LogMessages;

/// Writes its success messages and passes.
#[derive(Debug, Clone, PartialEq)]
pub struct LogWrite {
    /// Write only on the first application.
    pub once: bool,
    pub messages: LogMessages,
    executed: bool,
    template_error_reported: bool,
}

impl Default for LogWrite {
    fn default() -> Self {
        Self::new(LogMessages::default())
    }
}

impl LogWrite {
    pub fn new(messages: LogMessages) -> Self {
        Self {
            once: true,
            messages,
            executed: false,
            template_error_reported: false,
        }
    }

    /// Shorthand for a writer with a single `messageSuccess` template.
    pub fn message(template: &str) -> Self {
        Self::new(LogMessages {
            message_success: Some(template.to_string()),
            ..LogMessages::default()
        })
    }

    pub fn once(mut self, once: bool) -> Self {
        self.once = once;
        self
    }

    pub(super) fn apply(&mut self, name: &str, ctx: &mut ExecutionContext<'_>) -> bool {
        if self.once && self.executed {
            return true;
        }
        self.messages
            .print(ctx, name, true, false, || None, &mut self.template_error_reported);
        self.executed = true;
        true
    }

    pub(super) fn reset_run(&mut self) {
        self.executed = false;
    }
}
