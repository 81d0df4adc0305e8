//! Field shapes: how a field value is broken into translatable strings and
//! put back together.
//!
//! Decomposition yields the flat list of atoms sent to the translator plus a
//! plan that remembers where each atom came from. Reassembly takes one
//! translated string per atom and rebuilds a value of the original shape.

pub mod nested;
pub mod package;
pub mod pipe;

use crate::error::{Result, TranscacheError};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldShape {
    /// A single string.
    Plain,
    /// A JSON array of strings.
    StringList,
    /// A JSON array of small objects (name/price/duration/...).
    PackageTable,
    /// Newline-separated rows of `|`-separated cells.
    PipeTable,
    /// Arbitrary JSON; every string leaf is translated.
    Nested,
}

impl FieldShape {
    /// Break `value` into atoms. Fails when the value does not have this shape.
    pub fn decompose(self, value: &Value) -> Result<Decomposed> {
        match self {
            FieldShape::Plain => {
                let text = expect_str(self, value)?;
                Ok(Decomposed {
                    atoms: vec![text.to_string()],
                    plan: Plan::Plain,
                })
            }
            FieldShape::StringList => {
                let items = value
                    .as_array()
                    .ok_or_else(|| mismatch(self, value))?
                    .iter()
                    .map(|item| item.as_str().map(str::to_string))
                    .collect::<Option<Vec<_>>>()
                    .ok_or_else(|| mismatch(self, value))?;
                Ok(Decomposed {
                    atoms: items,
                    plan: Plan::StringList,
                })
            }
            FieldShape::PackageTable => {
                let (atoms, plan) = package::decompose(value)?;
                Ok(Decomposed {
                    atoms,
                    plan: Plan::Package(plan),
                })
            }
            FieldShape::PipeTable => {
                let table = pipe::PipeTable::parse(expect_str(self, value)?);
                Ok(Decomposed {
                    atoms: table.atoms(),
                    plan: Plan::Pipe(table),
                })
            }
            FieldShape::Nested => {
                let (atoms, plan) = nested::decompose(value);
                Ok(Decomposed {
                    atoms,
                    plan: Plan::Nested(plan),
                })
            }
        }
    }

    /// Whether a cached value has the JSON kind this shape produces.
    pub fn accepts(self, value: &Value) -> bool {
        match self {
            FieldShape::Plain | FieldShape::PipeTable => value.is_string(),
            FieldShape::StringList | FieldShape::PackageTable => value.is_array(),
            FieldShape::Nested => !value.is_null(),
        }
    }
}

/// A decomposed field value ready for translation.
#[derive(Debug, Clone)]
pub struct Decomposed {
    atoms: Vec<String>,
    plan: Plan,
}

#[derive(Debug, Clone)]
enum Plan {
    Plain,
    StringList,
    Package(package::PackagePlan),
    Pipe(pipe::PipeTable),
    Nested(nested::NestedPlan),
}

impl Decomposed {
    pub fn atoms(&self) -> &[String] {
        &self.atoms
    }

    /// Rebuild the value with `translated[i]` in place of atom `i`.
    pub fn reassemble(&self, translated: &[String]) -> Result<Value> {
        if translated.len() != self.atoms.len() {
            return Err(TranscacheError::Shape(format!(
                "expected {} translated atoms, got {}",
                self.atoms.len(),
                translated.len()
            )));
        }

        Ok(match &self.plan {
            Plan::Plain => Value::String(translated.first().cloned().unwrap_or_default()),
            Plan::StringList => {
                Value::Array(translated.iter().cloned().map(Value::String).collect())
            }
            Plan::Package(plan) => plan.reassemble(translated),
            Plan::Pipe(table) => Value::String(table.render(translated)),
            Plan::Nested(plan) => plan.reassemble(translated),
        })
    }
}

/// True for values a reader should treat as "nothing there": null, blank
/// strings, and arrays or objects holding only blank values.
pub fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        Value::Array(items) => items.iter().all(is_blank),
        Value::Object(map) => map.values().all(is_blank),
        Value::Bool(_) | Value::Number(_) => false,
    }
}

/// Prices, counts and similar strings that should not be sent for translation.
pub(crate) fn is_numeric_like(text: &str) -> bool {
    let text = text.trim();
    text.chars().any(|c| c.is_ascii_digit())
        && text.chars().all(|c| {
            c.is_ascii_digit()
                || c.is_whitespace()
                || matches!(c, ',' | '.' | '-' | '+' | '~' | '%' | '$' | '₩' | '원')
        })
}

fn expect_str(shape: FieldShape, value: &Value) -> Result<&str> {
    value.as_str().ok_or_else(|| mismatch(shape, value))
}

fn mismatch(shape: FieldShape, value: &Value) -> TranscacheError {
    let kind = match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    };
    TranscacheError::Shape(format!("{:?} field cannot hold a JSON {}", shape, kind))
}
