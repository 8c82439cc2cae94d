//! Execution context threaded through every `apply` call of one phase.

use crate::config::EngineSettings;
use crate::diagnostics::{format_template, DiagnosticSink, Severity};
use crate::error::{ConfigError, TemplateError};
use crate::ledger::TimingLedger;
use crate::registry::ModRegistry;

/// Which package owns a root operation, and the operation's display name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwnershipEntry {
    pub package: String,
    pub operation: String,
}

impl OwnershipEntry {
    pub fn new(package: &str, operation: &str) -> Self {
        Self {
            package: package.to_string(),
            operation: operation.to_string(),
        }
    }
}

/// Maps an execution index to the package and operation that own it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OwnershipTable {
    entries: Vec<OwnershipEntry>,
}

impl OwnershipTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, entry: OwnershipEntry) {
        self.entries.push(entry);
    }

    pub fn get(&self, index: usize) -> Option<&OwnershipEntry> {
        self.entries.get(index)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, OwnershipEntry> {
        self.entries.iter()
    }
}

impl FromIterator<OwnershipEntry> for OwnershipTable {
    fn from_iter<T: IntoIterator<Item = OwnershipEntry>>(iter: T) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

/// Phase-scoped state: what is being patched, by whom, and how long it took.
///
/// Created when the loading phase starts and consumed by
/// [`ExecutionContext::on_phase_end`].
pub struct ExecutionContext<'a> {
    registry: &'a dyn ModRegistry,
    sink: &'a mut dyn DiagnosticSink,
    settings: EngineSettings,
    current_package: String,
    current_document: String,
    current_operation: Option<usize>,
    ownership: OwnershipTable,
    ledger: TimingLedger,
    scope: Vec<String>,
}

impl<'a> ExecutionContext<'a> {
    pub fn new(
        registry: &'a dyn ModRegistry,
        sink: &'a mut dyn DiagnosticSink,
        settings: EngineSettings,
    ) -> Self {
        Self {
            registry,
            sink,
            settings,
            current_package: String::new(),
            current_document: String::new(),
            current_operation: None,
            ownership: OwnershipTable::new(),
            ledger: TimingLedger::default(),
            scope: Vec::new(),
        }
    }

    // ── Phase call-ins ────────────────────────────────────────────────────

    pub fn on_phase_start(&mut self, table: OwnershipTable) {
        tracing::debug!(operations = table.len(), "patch phase started");
        self.ledger = TimingLedger::new(&table);
        self.ownership = table;
        self.current_operation = None;
    }

    pub fn on_package_start(&mut self, package: &str) {
        self.current_package = package.to_string();
    }

    /// The host patches its own content; no package or document is current.
    pub fn clear_package_and_document(&mut self) {
        self.current_package.clear();
        self.current_document.clear();
        self.current_operation = None;
    }

    pub fn on_document_start(&mut self, document: &str) {
        tracing::trace!(package = %self.current_package, document, "document started");
        self.current_document = document.to_string();
        self.current_operation = None;
    }

    /// Advances to the next owned operation.
    pub fn on_operation_start(&mut self) {
        self.current_operation = Some(self.current_operation.map_or(0, |i| i + 1));
    }

    pub fn on_operation_start_timed(&mut self) {
        self.on_operation_start();
        if let Some(index) = self.current_operation {
            self.ledger.start(index);
        }
    }

    pub fn on_operation_end_timed(&mut self) {
        self.ledger.stop();
    }

    /// Ends the phase. Returns the profiling report when profiling is
    /// enabled, after emitting it at message severity.
    pub fn on_phase_end(self) -> Option<String> {
        tracing::debug!("patch phase finished");
        if !self.settings.profile {
            return None;
        }
        let report = self.ledger.render();
        self.sink.message(&report);
        Some(report)
    }

    // ── Accessors ─────────────────────────────────────────────────────────

    pub fn registry(&self) -> &'a dyn ModRegistry {
        self.registry
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    pub fn current_package(&self) -> &str {
        &self.current_package
    }

    pub fn current_document(&self) -> &str {
        &self.current_document
    }

    pub fn current_operation(&self) -> Option<usize> {
        self.current_operation
    }

    pub fn ownership(&self) -> &OwnershipTable {
        &self.ownership
    }

    pub fn ledger(&self) -> &TimingLedger {
        &self.ledger
    }

    fn current_entry(&self) -> Option<&OwnershipEntry> {
        self.current_operation.and_then(|i| self.ownership.get(i))
    }

    /// Package owning the executing root operation, empty if none is current.
    pub fn current_owner(&self) -> &str {
        self.current_entry().map_or("", |e| e.package.as_str())
    }

    /// Display name of the closest enclosing operation that has one. The
    /// innermost entered operation is the caller itself and is skipped.
    pub fn nearest_named_ancestor(&self) -> &str {
        self.scope
            .iter()
            .rev()
            .skip(1)
            .find(|name| !name.is_empty())
            .map_or("", String::as_str)
    }

    pub(crate) fn enter(&mut self, name: &str) {
        self.scope.push(name.to_string());
    }

    pub(crate) fn leave(&mut self) {
        self.scope.pop();
    }

    // ── Diagnostics ───────────────────────────────────────────────────────

    /// Renders `template` for the operation called `name`.
    pub fn render(&self, template: &str, name: &str) -> Result<String, TemplateError> {
        format_template(
            template,
            &[
                self.current_package.as_str(),
                self.current_document.as_str(),
                self.current_owner(),
                self.nearest_named_ancestor(),
                name,
            ],
        )
    }

    pub fn emit(&mut self, severity: Severity, text: &str) {
        self.sink.emit(severity, text);
    }

    /// Reports a configuration error of the operation called `name`.
    pub fn report_config_error(&mut self, name: &str, err: &ConfigError) {
        let separator = match err {
            ConfigError::Template(_) => " ",
            _ => ": ",
        };
        let text = format!(
            "[ModCheck] Mod {} {} - {}{}{}",
            self.current_owner(),
            self.nearest_named_ancestor(),
            name,
            separator,
            err
        );
        self.sink.error(&text);
    }
}
