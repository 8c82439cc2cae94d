//! Diagnostic sinks, message templates and per-node log messages.

use serde::Deserialize;

use crate::context::ExecutionContext;
use crate::error::TemplateError;

/// Number of positional arguments a template may reference.
pub const TEMPLATE_ARGS: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
    Message,
    Warning,
    Error,
}

/// Where rendered diagnostics go.
pub trait DiagnosticSink {
    fn message(&mut self, text: &str);
    fn warning(&mut self, text: &str);
    fn error(&mut self, text: &str);

    fn emit(&mut self, severity: Severity, text: &str) {
        match severity {
            Severity::Message => self.message(text),
            Severity::Warning => self.warning(text),
            Severity::Error => self.error(text),
        }
    }
}

/// Forwards diagnostics to `tracing` under the `modcheck` target.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn message(&mut self, text: &str) {
        tracing::info!(target: "modcheck", "{text}");
    }

    fn warning(&mut self, text: &str) {
        tracing::warn!(target: "modcheck", "{text}");
    }

    fn error(&mut self, text: &str) {
        tracing::error!(target: "modcheck", "{text}");
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub severity: Severity,
    pub text: String,
}

/// Keeps every diagnostic in memory, in emission order.
#[derive(Debug, Default, Clone)]
pub struct RecordingSink {
    pub diagnostics: Vec<Diagnostic>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.diagnostics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    pub fn with_severity(&self, severity: Severity) -> impl Iterator<Item = &str> {
        self.diagnostics
            .iter()
            .filter(move |d| d.severity == severity)
            .map(|d| d.text.as_str())
    }

    pub fn texts(&self) -> Vec<&str> {
        self.diagnostics.iter().map(|d| d.text.as_str()).collect()
    }
}

impl DiagnosticSink for RecordingSink {
    fn message(&mut self, text: &str) {
        self.emit(Severity::Message, text);
    }

    fn warning(&mut self, text: &str) {
        self.emit(Severity::Warning, text);
    }

    fn error(&mut self, text: &str) {
        self.emit(Severity::Error, text);
    }

    fn emit(&mut self, severity: Severity, text: &str) {
        self.diagnostics.push(Diagnostic {
            severity,
            text: text.to_string(),
        });
    }
}

// ── Templates ─────────────────────────────────────────────────────────────

/// Substitutes `{0}`..`{4}` in `template`. `{{` and `}}` are literal braces.
pub fn format_template(template: &str, args: &[&str; TEMPLATE_ARGS]) -> Result<String, TemplateError> {
    let malformed = |offset| TemplateError::Malformed {
        offset,
        template: template.to_string(),
    };
    let mut out = String::with_capacity(template.len());
    let mut chars = template.char_indices().peekable();
    while let Some((offset, c)) = chars.next() {
        match c {
            '{' => {
                if chars.next_if(|&(_, c)| c == '{').is_some() {
                    out.push('{');
                    continue;
                }
                let mut digits = String::new();
                while let Some((_, d)) = chars.next_if(|&(_, c)| c.is_ascii_digit()) {
                    digits.push(d);
                }
                if digits.is_empty() || chars.next_if(|&(_, c)| c == '}').is_none() {
                    return Err(malformed(offset));
                }
                let index = digits.parse::<usize>().unwrap_or(usize::MAX);
                match args.get(index) {
                    Some(arg) => out.push_str(arg),
                    None => {
                        return Err(TemplateError::OutOfRange {
                            index,
                            template: template.to_string(),
                        })
                    }
                }
            }
            '}' => {
                if chars.next_if(|&(_, c)| c == '}').is_none() {
                    return Err(malformed(offset));
                }
                out.push('}');
            }
            _ => out.push(c),
        }
    }
    Ok(out)
}

// ── Log messages ──────────────────────────────────────────────────────────

/// Optional message templates shared by the mod-check leaves and `logWrite`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LogMessages {
    #[serde(alias = "MessageSuccess")]
    pub message_success: Option<String>,
    #[serde(alias = "MessageFail")]
    pub message_fail: Option<String>,
    #[serde(alias = "WarningSuccess")]
    pub warning_success: Option<String>,
    #[serde(alias = "WarningFail")]
    pub warning_fail: Option<String>,
    #[serde(alias = "ErrorSuccess")]
    pub error_success: Option<String>,
    #[serde(alias = "ErrorFail")]
    pub error_fail: Option<String>,

    #[serde(alias = "VerboseMessageSuccess")]
    pub verbose_message_success: Option<String>,
    #[serde(alias = "VerboseMessageFail")]
    pub verbose_message_fail: Option<String>,
    #[serde(alias = "VerboseWarningSuccess")]
    pub verbose_warning_success: Option<String>,
    #[serde(alias = "VerboseWarningFail")]
    pub verbose_warning_fail: Option<String>,
    #[serde(alias = "VerboseErrorSuccess")]
    pub verbose_error_success: Option<String>,
    #[serde(alias = "VerboseErrorFail")]
    pub verbose_error_fail: Option<String>,

    pub custom_message_success: Option<String>,
    pub custom_message_fail: Option<String>,
}

fn non_empty(s: &Option<String>) -> Option<&str> {
    s.as_deref().filter(|s| !s.is_empty())
}

impl LogMessages {
    pub fn is_empty(&self) -> bool {
        *self == LogMessages::default()
    }

    fn for_outcome(&self, success: bool, verbose: bool) -> Vec<(Option<&str>, Severity)> {
        let mut out = if success {
            vec![
                (non_empty(&self.message_success), Severity::Message),
                (non_empty(&self.warning_success), Severity::Warning),
                (non_empty(&self.error_success), Severity::Error),
            ]
        } else {
            vec![
                (non_empty(&self.message_fail), Severity::Message),
                (non_empty(&self.warning_fail), Severity::Warning),
                (non_empty(&self.error_fail), Severity::Error),
            ]
        };
        if verbose {
            if success {
                out.push((non_empty(&self.verbose_message_success), Severity::Message));
                out.push((non_empty(&self.verbose_warning_success), Severity::Warning));
                out.push((non_empty(&self.verbose_error_success), Severity::Error));
            } else {
                out.push((non_empty(&self.verbose_message_fail), Severity::Message));
                out.push((non_empty(&self.verbose_warning_fail), Severity::Warning));
                out.push((non_empty(&self.verbose_error_fail), Severity::Error));
            }
        }
        out
    }

    /// Emits every template configured for `success`, then the legacy custom
    /// message.
    ///
    /// `default` supplies the text used on failure when `error_on_fail` is
    /// set and no custom failure message exists; it is emitted as is. A
    /// template that cannot be rendered is suppressed and reported once per
    /// node through `reported`.
    pub fn print(
        &self,
        ctx: &mut ExecutionContext<'_>,
        name: &str,
        success: bool,
        error_on_fail: bool,
        default: impl FnOnce() -> Option<String>,
        reported: &mut bool,
    ) {
        for (template, severity) in self.for_outcome(success, ctx.settings().verbose) {
            if let Some(template) = template {
                print_template(ctx, name, template, severity, reported);
            }
        }

        let legacy = if success {
            non_empty(&self.custom_message_success)
        } else {
            non_empty(&self.custom_message_fail)
        };
        let severity = if !success && error_on_fail {
            Severity::Error
        } else {
            Severity::Message
        };
        match legacy {
            Some(template) => print_template(ctx, name, template, severity, reported),
            None if !success && error_on_fail => {
                if let Some(text) = default().filter(|t| !t.is_empty()) {
                    ctx.emit(Severity::Error, &text);
                }
            }
            None => {}
        }
    }
}

fn print_template(
    ctx: &mut ExecutionContext<'_>,
    name: &str,
    template: &str,
    severity: Severity,
    reported: &mut bool,
) {
    match ctx.render(template, name) {
        Ok(text) if text.is_empty() => {}
        Ok(text) => ctx.emit(severity, &text),
        Err(err) => {
            if !*reported {
                *reported = true;
                ctx.report_config_error(name, &err.into());
            }
        }
    }
}
