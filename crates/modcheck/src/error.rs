use modcheck_xml::{DocumentError, PathError};
use thiserror::Error;

/// A configuration mistake local to one operation node.
///
/// The node reports `false` and the error is emitted once at error severity;
/// sibling and ancestor operations keep running.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("modCheck.{op} used with an empty/missing {field}")]
    MissingField {
        op: &'static str,
        field: &'static str,
    },

    #[error("modCheck.{op} failed to understand version string {version:?} while testing {mod_name}")]
    MalformedVersion {
        op: &'static str,
        version: String,
        mod_name: String,
    },

    #[error("modCheck.{op} failed to compare version tags {wanted} and {found} for mod {mod_name}")]
    VersionShape {
        op: &'static str,
        wanted: String,
        found: String,
        mod_name: String,
    },

    #[error(transparent)]
    Template(#[from] TemplateError),

    #[error("modCheck.loop used without an operation")]
    LoopWithoutOperation,

    #[error("modCheck.{op} used with an invalid path {path:?}: {source}")]
    InvalidPath {
        op: &'static str,
        path: String,
        source: PathError,
    },

    #[error("modCheck.{op} used with an invalid value: {source}")]
    InvalidValue {
        op: &'static str,
        source: DocumentError,
    },

    #[error("modCheck.{op} could not edit the document: {source}")]
    Document {
        op: &'static str,
        source: DocumentError,
    },
}

/// A message template that cannot be rendered.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TemplateError {
    #[error("is using out of range argument IDs in the following string: (max number is 4)\n{template}")]
    OutOfRange { index: usize, template: String },

    #[error("is using a malformed placeholder at offset {offset} in the following string:\n{template}")]
    Malformed { offset: usize, template: String },
}

/// A patch file that cannot be turned into an operation tree.
#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("operation must be a JSON object")]
    NotAnObject,

    #[error("operation is missing the \"op\" field")]
    MissingOp,

    #[error("unknown operation {0:?}")]
    UnknownOp(String),

    #[error("field {field:?} of {op} must be {expected}")]
    InvalidField {
        op: String,
        field: String,
        expected: &'static str,
    },

    #[error("in {op}.{field}: {source}")]
    Nested {
        op: String,
        field: String,
        source: Box<DecodeError>,
    },

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
