//! XML document model for ModCheck patching.
//!
//! Provides the mutable tree that patch operations run against, an XPath
//! subset for selecting nodes, JsonML conversion, and a compact XML
//! serializer.
//!
//! # Example
//!
//! ```
//! use modcheck_xml::Document;
//! use serde_json::json;
//!
//! let doc = Document::from_jsonml(&json!(["Defs",
//!     ["ThingDef", ["defName", "Wall"]],
//!     ["ThingDef", ["defName", "Door"]]
//! ])).unwrap();
//!
//! let walls = doc.select_str(r#"/Defs/ThingDef[defName="Wall"]"#).unwrap();
//! assert_eq!(walls.len(), 1);
//! ```

mod document;
pub use document::{Document, DocumentError, NodeId, NodeKind, SourceId};

mod jsonml;
pub use jsonml::validate_jsonml;
mod render;

pub mod path;
pub use path::{PathError, XPath, XPathParser};
