//! JSON codec for patch files.
//!
//! A patch file holds one operation object or an array of root operations.
//! Every object names its kind in `"op"` (case-insensitive, an optional
//! `ModCheck.` prefix is ignored) and may carry a display `"name"`.
//!
//! Only malformed JSON shapes are decode errors. Absent required fields decode
//! to `None` and surface as configuration errors when the node runs.

use serde_json::{Map, Value};

use crate::diagnostics::LogMessages;
use crate::error::DecodeError;
use crate::ops::{
    AddOrder, DocumentAction, DocumentLeaf, IfElse, LogWrite, Loop, ModCheck, ModCheckKind, Move, Once,
    OpKind, Operation, Search, Sequence, DEFAULT_SEARCH_TAG,
};

// ── Field helpers ─────────────────────────────────────────────────────────

struct Fields<'a> {
    op: &'a str,
    obj: &'a Map<String, Value>,
}

impl<'a> Fields<'a> {
    /// Exact key first, then a case-insensitive match.
    fn get(&self, key: &str) -> Option<&'a Value> {
        self.obj.get(key).or_else(|| {
            self.obj
                .iter()
                .find(|(k, _)| k.eq_ignore_ascii_case(key))
                .map(|(_, v)| v)
        })
    }

    fn get_any(&self, keys: &[&str]) -> Option<(&'a Value, String)> {
        keys.iter()
            .find_map(|k| self.get(k).map(|v| (v, k.to_string())))
    }

    fn invalid(&self, field: &str, expected: &'static str) -> DecodeError {
        DecodeError::InvalidField {
            op: self.op.to_string(),
            field: field.to_string(),
            expected,
        }
    }

    fn nested(&self, field: &str, source: DecodeError) -> DecodeError {
        DecodeError::Nested {
            op: self.op.to_string(),
            field: field.to_string(),
            source: Box::new(source),
        }
    }

    fn string(&self, field: &str) -> Result<Option<String>, DecodeError> {
        match self.get(field) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.clone())),
            Some(Value::Number(n)) => Ok(Some(n.to_string())),
            Some(_) => Err(self.invalid(field, "a string")),
        }
    }

    fn bool_or(&self, field: &str, default: bool) -> Result<bool, DecodeError> {
        match self.get(field) {
            None | Some(Value::Null) => Ok(default),
            Some(Value::Bool(b)) => Ok(*b),
            Some(Value::String(s)) if s.eq_ignore_ascii_case("true") => Ok(true),
            Some(Value::String(s)) if s.eq_ignore_ascii_case("false") => Ok(false),
            Some(_) => Err(self.invalid(field, "a boolean")),
        }
    }

    fn count_or(&self, field: &str, default: usize) -> Result<usize, DecodeError> {
        let parsed = match self.get(field) {
            None | Some(Value::Null) => return Ok(default),
            Some(Value::Number(n)) => n.as_u64().and_then(|n| usize::try_from(n).ok()),
            Some(Value::String(s)) => s.trim().parse::<usize>().ok(),
            Some(_) => None,
        };
        parsed.ok_or_else(|| self.invalid(field, "a non-negative integer"))
    }

    fn operation(&self, field: &str) -> Result<Option<Box<Operation>>, DecodeError> {
        match self.get(field) {
            None | Some(Value::Null) => Ok(None),
            Some(v) => from_json(v)
                .map(|op| Some(Box::new(op)))
                .map_err(|e| self.nested(field, e)),
        }
    }

    fn operations(&self, keys: &[&str]) -> Result<Vec<Operation>, DecodeError> {
        let Some((value, field)) = self.get_any(keys) else {
            return Ok(Vec::new());
        };
        match value {
            Value::Null => Ok(Vec::new()),
            Value::Array(items) => items
                .iter()
                .enumerate()
                .map(|(i, v)| from_json(v).map_err(|e| self.nested(&format!("{field}[{i}]"), e)))
                .collect(),
            _ => Err(self.invalid(&field, "an array of operations")),
        }
    }

    fn strings(&self, field: &str) -> Result<Vec<String>, DecodeError> {
        match self.get(field) {
            None | Some(Value::Null) => Ok(Vec::new()),
            Some(Value::String(s)) => Ok(vec![s.clone()]),
            Some(Value::Array(items)) => items
                .iter()
                .map(|v| {
                    v.as_str()
                        .map(str::to_string)
                        .ok_or_else(|| self.invalid(field, "an array of strings"))
                })
                .collect(),
            Some(_) => Err(self.invalid(field, "an array of strings")),
        }
    }

    /// One JsonML node, or an array of them.
    fn nodes(&self, field: &str) -> Result<Vec<Value>, DecodeError> {
        match self.get(field) {
            None | Some(Value::Null) => Ok(Vec::new()),
            Some(v @ Value::String(_)) => Ok(vec![v.clone()]),
            Some(Value::Array(items)) => match items.first() {
                Some(Value::String(_)) => Ok(vec![Value::Array(items.clone())]),
                _ => Ok(items.clone()),
            },
            Some(_) => Err(self.invalid(field, "a JsonML node or an array of nodes")),
        }
    }

    fn messages(&self) -> Result<LogMessages, DecodeError> {
        Ok(serde_json::from_value(Value::Object(self.obj.clone()))?)
    }

    fn mod_check(&self, kind: ModCheckKind) -> Result<ModCheck, DecodeError> {
        Ok(
            ModCheck::with_fields(kind, self.string("modName")?, self.string("yourMod")?)
                .error_on_fail(self.bool_or("errorOnFail", false)?)
                .messages(self.messages()?),
        )
    }
}

/// Canonical lowercase op name.
fn normalize_op(op: &str) -> String {
    let op = op.trim();
    let op = match op.get(..9) {
        Some(prefix) if prefix.eq_ignore_ascii_case("modcheck.") => &op[9..],
        _ => op,
    };
    op.to_ascii_lowercase()
}

// ── Decoding ──────────────────────────────────────────────────────────────

/// Decodes a single operation object.
pub fn from_json(v: &Value) -> Result<Operation, DecodeError> {
    let obj = v.as_object().ok_or(DecodeError::NotAnObject)?;
    let op_str = obj
        .get("op")
        .and_then(Value::as_str)
        .ok_or(DecodeError::MissingOp)?;
    let f = Fields { op: op_str, obj };

    let kind: OpKind = match normalize_op(op_str).as_str() {
        "and" => OpKind::And(f.operations(&["tests", "operations"])?),
        "or" => OpKind::Or(f.operations(&["tests", "operations"])?),
        "ifelse" => IfElse {
            test: f.operation("test")?,
            passed: f.operation("passed")?,
            failed: f.operation("failed")?,
            pass_inner_test: f.bool_or("passInnerTest", true)?,
        }
        .into(),
        "once" => Once::new().into(),
        "sequence" => Sequence::new(f.operations(&["operations"])?)
            .once(f.bool_or("once", false)?)
            .stop_on_fail(f.bool_or("stopOnFail", true)?)
            .into(),
        "loop" => Loop {
            operation: f.operation("operation")?,
            times: f.count_or("times", 1)?,
            reset: f.bool_or("reset", true)?,
        }
        .into(),
        "search" => Search {
            path: f.string("path")?,
            operations: f.operations(&["operations"])?,
            stop_on_fail: f.bool_or("stopOnFail", true)?,
            tag: f
                .string("tag")?
                .filter(|t| !t.is_empty())
                .unwrap_or_else(|| DEFAULT_SEARCH_TAG.to_string()),
        }
        .into(),
        "move" => Move {
            path: f.string("path")?,
            followers: f.strings("followers")?,
        }
        .into(),
        "ismodloaded" => f
            .mod_check(ModCheckKind::IsModLoaded {
                incompatible: f.bool_or("incompatible", false)?,
            })?
            .into(),
        "loadorder" => f
            .mod_check(ModCheckKind::LoadOrder {
                your_mod_first: f.bool_or("yourModFirst", false)?,
            })?
            .into(),
        "isversion" => f
            .mod_check(ModCheckKind::IsVersion {
                version: version_field(&f)?,
            })?
            .into(),
        "ismodsyncversion" => f
            .mod_check(ModCheckKind::IsModSyncVersion {
                version: version_field(&f)?,
            })?
            .into(),
        "logwrite" => LogWrite::new(f.messages()?).once(f.bool_or("once", true)?).into(),
        "exists" => document_leaf(&f, DocumentAction::Exists)?,
        "add" => {
            let order = match f.string("order")? {
                None => AddOrder::Append,
                Some(s) if s.eq_ignore_ascii_case("append") => AddOrder::Append,
                Some(s) if s.eq_ignore_ascii_case("prepend") => AddOrder::Prepend,
                Some(_) => return Err(f.invalid("order", "\"append\" or \"prepend\"")),
            };
            document_leaf(
                &f,
                DocumentAction::Add {
                    value: f.nodes("value")?,
                    order,
                },
            )?
        }
        "remove" => document_leaf(&f, DocumentAction::Remove)?,
        "replace" => document_leaf(
            &f,
            DocumentAction::Replace {
                value: f.nodes("value")?,
            },
        )?,
        "setattribute" => document_leaf(
            &f,
            DocumentAction::SetAttribute {
                attribute: f.string("attribute")?,
                value: f.string("value")?.unwrap_or_default(),
            },
        )?,
        _ => return Err(DecodeError::UnknownOp(op_str.to_string())),
    };

    let mut op = Operation::new(kind);
    if let Some(name) = f.string("name")? {
        op.name = name;
    }
    Ok(op)
}

fn version_field(f: &Fields<'_>) -> Result<Option<String>, DecodeError> {
    Ok(match f.string("version")? {
        Some(v) => Some(v),
        None => f.string("min")?,
    })
}

fn document_leaf(f: &Fields<'_>, action: DocumentAction) -> Result<OpKind, DecodeError> {
    Ok(DocumentLeaf {
        path: f.string("path")?,
        action,
    }
    .into())
}

/// Decodes a patch file: one operation object or an array of them.
pub fn from_json_patch(v: &Value) -> Result<Vec<Operation>, DecodeError> {
    match v {
        Value::Array(items) => items.iter().map(from_json).collect(),
        _ => Ok(vec![from_json(v)?]),
    }
}

/// Parses and decodes patch file text.
pub fn from_json_str(s: &str) -> Result<Vec<Operation>, DecodeError> {
    let value: Value = serde_json::from_str(s)?;
    from_json_patch(&value)
}
