//! Drives one loading phase: every document, every package's root operations.

use modcheck_xml::Document;

use crate::config::EngineSettings;
use crate::context::{ExecutionContext, OwnershipEntry, OwnershipTable};
use crate::diagnostics::DiagnosticSink;
use crate::ops::Operation;
use crate::registry::ModRegistry;

/// A package and its root operations, in declaration order.
#[derive(Debug, Clone, PartialEq)]
pub struct Package {
    pub name: String,
    pub operations: Vec<Operation>,
}

impl Package {
    pub fn new(name: &str, operations: Vec<Operation>) -> Self {
        Self {
            name: name.to_string(),
            operations,
        }
    }
}

/// A document to patch and the package whose content it is.
#[derive(Debug, Clone)]
pub struct SourceDocument {
    pub package: String,
    pub name: String,
    pub document: Document,
}

impl SourceDocument {
    pub fn new(package: &str, name: &str, document: Document) -> Self {
        Self {
            package: package.to_string(),
            name: name.to_string(),
            document,
        }
    }
}

impl OwnershipTable {
    /// One entry per root operation, in package order.
    pub fn from_packages(packages: &[Package]) -> Self {
        packages
            .iter()
            .flat_map(|p| {
                p.operations
                    .iter()
                    .map(move |op| OwnershipEntry::new(&p.name, &op.name))
            })
            .collect()
    }
}

/// What a phase did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PhaseSummary {
    /// Ownership and timing were tracked.
    pub instrumented: bool,
    /// Root operation applications that passed.
    pub applied: usize,
    /// Root operation applications that failed.
    pub failed: usize,
    /// The profiling report, when profiling was on.
    pub profile: Option<String>,
}

pub struct PatchPhase<'a> {
    settings: EngineSettings,
    registry: &'a dyn ModRegistry,
    sink: &'a mut dyn DiagnosticSink,
}

impl<'a> PatchPhase<'a> {
    pub fn new(settings: EngineSettings, registry: &'a dyn ModRegistry, sink: &'a mut dyn DiagnosticSink) -> Self {
        Self {
            settings,
            registry,
            sink,
        }
    }

    /// Runs the phase with an ownership table built from `packages`.
    pub fn run(self, packages: &mut [Package], documents: &mut [SourceDocument]) -> PhaseSummary {
        let table = OwnershipTable::from_packages(packages);
        self.run_with_table(table, packages, documents)
    }

    /// Runs the phase against a caller-supplied ownership table.
    ///
    /// A table that does not line up with the packages' root operations
    /// is reported once, and the phase then runs without ownership or timing
    /// bookkeeping.
    pub fn run_with_table(
        self,
        table: OwnershipTable,
        packages: &mut [Package],
        documents: &mut [SourceDocument],
    ) -> PhaseSummary {
        let mut settings = self.settings;
        if settings.instrument {
            if let Err(reason) = verify(&table, packages) {
                tracing::error!(%reason, "patch loop verification failed");
                self.sink.error(&format!(
                    "[ModCheck] Failed to verify the patch loop ({reason}); running without patch bookkeeping"
                ));
                settings.instrument = false;
            }
        }
        let instrumented = settings.instrument;

        let mut ctx = ExecutionContext::new(self.registry, self.sink, settings);
        ctx.on_phase_start(if instrumented { table } else { OwnershipTable::new() });

        let mut summary = PhaseSummary {
            instrumented,
            ..PhaseSummary::default()
        };
        for source in documents.iter_mut() {
            ctx.on_package_start(&source.package);
            ctx.on_document_start(&source.name);
            for op in packages.iter_mut().flat_map(|p| p.operations.iter_mut()) {
                let passed = if !instrumented {
                    op.apply(&mut source.document, &mut ctx)
                } else if settings.profile {
                    ctx.on_operation_start_timed();
                    let passed = op.apply(&mut source.document, &mut ctx);
                    ctx.on_operation_end_timed();
                    passed
                } else {
                    ctx.on_operation_start();
                    op.apply(&mut source.document, &mut ctx)
                };
                if passed {
                    summary.applied += 1;
                } else {
                    summary.failed += 1;
                }
            }
        }

        summary.profile = ctx.on_phase_end();
        summary
    }
}

/// Checks that entry `i` of `table` describes the `i`-th root operation.
fn verify(table: &OwnershipTable, packages: &[Package]) -> Result<(), String> {
    let expected = OwnershipTable::from_packages(packages);
    if table.len() != expected.len() {
        return Err(format!(
            "expected {} operations, found {}",
            expected.len(),
            table.len()
        ));
    }
    match table.iter().zip(expected.iter()).position(|(a, b)| a != b) {
        Some(index) => Err(format!("entry {index} does not match its operation")),
        None => Ok(()),
    }
}
