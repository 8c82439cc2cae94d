//! ModCheck patch-operation engine.
//!
//! Packages ship trees of boolean patch operations: combinators (`and`,
//! `or`, `ifElse`, `once`, `sequence`, `loop`), structural leaves (`search`,
//! `move`, and plain document edits) and predicates over the active mod list.
//! A [`PatchPhase`] applies every package's root operations to every
//! document while an [`ExecutionContext`] tracks which package and operation
//! is running, renders diagnostics, and times each root operation.
//!
//! # Example
//!
//! ```
//! use modcheck::{codec, EngineSettings, ModInfo, ModList, Package, PatchPhase, RecordingSink, SourceDocument};
//! use modcheck_xml::Document;
//! use serde_json::json;
//!
//! let mods: ModList = vec![ModInfo::new("Core", "1.0.0")].into();
//! let ops = codec::from_json_patch(&json!({
//!     "op": "ifElse",
//!     "test": {"op": "isModLoaded", "modName": "Core", "yourMod": "MyMod"},
//!     "passed": {"op": "setAttribute", "path": "/Defs/ThingDef", "attribute": "Patched", "value": "yes"}
//! })).unwrap();
//! let mut packages = vec![Package::new("MyMod", ops)];
//! let doc = Document::from_jsonml(&json!(["Defs", ["ThingDef"]])).unwrap();
//! let mut documents = vec![SourceDocument::new("Core", "Things.xml", doc)];
//!
//! let mut sink = RecordingSink::new();
//! let summary = PatchPhase::new(EngineSettings::default(), &mods, &mut sink)
//!     .run(&mut packages, &mut documents);
//!
//! assert_eq!(summary.applied, 1);
//! assert_eq!(documents[0].document.to_xml(), r#"<Defs><ThingDef Patched="yes" /></Defs>"#);
//! ```

pub mod codec;
pub mod config;
pub mod context;
pub mod diagnostics;
pub mod error;
pub mod ledger;
pub mod ops;
pub mod phase;
pub mod registry;

pub use config::{EngineSettings, RunConfig, SettingsError};
pub use context::{ExecutionContext, OwnershipEntry, OwnershipTable};
pub use diagnostics::{Diagnostic, DiagnosticSink, LogMessages, RecordingSink, Severity, TracingSink};
pub use error::{ConfigError, DecodeError, TemplateError};
pub use ledger::{LedgerEntry, TimingLedger};
pub use ops::{OpKind, Operation};
pub use phase::{Package, PatchPhase, PhaseSummary, SourceDocument};
pub use registry::{ModInfo, ModList, ModRegistry};
