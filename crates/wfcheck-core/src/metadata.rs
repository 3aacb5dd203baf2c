//! Action descriptor schema (`action.yaml` / `action.yml`)
//!
//! Only the parts of a descriptor needed to check usages of an action are
//! kept: its display name, the names of its inputs with their required flag,
//! and the names of its outputs. Descriptions, default values and the `runs`
//! section are read past and dropped.

use crate::diagnostics::SchemaError;
use serde::Serialize;
use serde_yaml::{Mapping, Value};
use std::collections::{BTreeMap, BTreeSet};

/// Accepted descriptor filenames, in lookup order
pub const DESCRIPTOR_FILENAMES: [&str; 2] = ["action.yaml", "action.yml"];

/// Parsed metadata of one action.
///
/// Immutable once parsed. Caches hand it out behind an `Arc` so any number
/// of rule evaluations can read it without further locking.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ActionMetadata {
    /// Optional: display name
    pub name: Option<String>,

    /// Input name to "required" flag
    pub inputs: BTreeMap<String, bool>,

    /// Output names
    pub outputs: BTreeSet<String>,
}

impl ActionMetadata {
    /// Parse descriptor content.
    ///
    /// An empty document parses to metadata with no name, no inputs and no
    /// outputs. Merge keys (`<<: *anchor`) are expanded before any field is
    /// read.
    pub fn parse(content: &str) -> Result<Self, SchemaError> {
        let mut root: Value = serde_yaml::from_str(content)?;
        root.apply_merge()?;
        let root = match root {
            Value::Null => return Ok(Self::default()),
            Value::Mapping(m) => m,
            other => return Err(invalid_type("<root>", "a mapping", &other)),
        };

        Ok(Self {
            name: parse_name(&root)?,
            inputs: parse_inputs(&root)?,
            outputs: parse_outputs(&root)?,
        })
    }

    /// Parse raw bytes. Non UTF-8 content is a YAML error.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, SchemaError> {
        let content = std::str::from_utf8(bytes).map_err(|e| {
            SchemaError::Syntax(<serde_yaml::Error as serde::de::Error>::custom(e))
        })?;
        Self::parse(content)
    }

    /// Check whether the action declares an input
    pub fn has_input(&self, name: &str) -> bool {
        self.inputs.contains_key(name)
    }

    /// Names of inputs a caller must always pass
    pub fn required_inputs(&self) -> impl Iterator<Item = &str> {
        self.inputs
            .iter()
            .filter(|(_, required)| **required)
            .map(|(name, _)| name.as_str())
    }
}

fn parse_name(root: &Mapping) -> Result<Option<String>, SchemaError> {
    match root.get("name") {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(Value::Bool(b)) => Ok(Some(b.to_string())),
        Some(other) => Err(invalid_type("name", "a string", other)),
    }
}

fn parse_inputs(root: &Mapping) -> Result<BTreeMap<String, bool>, SchemaError> {
    let inputs = match root.get("inputs") {
        None | Some(Value::Null) => return Ok(BTreeMap::new()),
        Some(Value::Mapping(m)) => m,
        Some(other) => return Err(invalid_type("inputs", "a mapping", other)),
    };

    let mut parsed = BTreeMap::new();
    for (key, entry) in inputs {
        let name = key_to_string("inputs", key)?;
        let required = match entry {
            Value::Null => false,
            Value::Mapping(fields) => is_required(&name, fields)?,
            other => return Err(invalid_type(&format!("inputs.{name}"), "a mapping", other)),
        };
        parsed.insert(name, required);
    }
    Ok(parsed)
}

/// `required: true` is the only way an input becomes required. A `default`
/// has no effect on the flag in either direction.
fn is_required(name: &str, fields: &Mapping) -> Result<bool, SchemaError> {
    match fields.get("required") {
        None | Some(Value::Null) => Ok(false),
        Some(Value::Bool(required)) => Ok(*required),
        Some(other) => Err(invalid_type(
            &format!("inputs.{name}.required"),
            "a boolean",
            other,
        )),
    }
}

fn parse_outputs(root: &Mapping) -> Result<BTreeSet<String>, SchemaError> {
    match root.get("outputs") {
        None | Some(Value::Null) => Ok(BTreeSet::new()),
        Some(Value::Mapping(m)) => m.keys().map(|k| key_to_string("outputs", k)).collect(),
        Some(other) => Err(invalid_type("outputs", "a mapping", other)),
    }
}

fn key_to_string(field: &str, key: &Value) -> Result<String, SchemaError> {
    match key {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        other => Err(invalid_type(&format!("{field} key"), "a string", other)),
    }
}

fn invalid_type(field: &str, expected: &'static str, found: &Value) -> SchemaError {
    SchemaError::InvalidType {
        field: field.to_string(),
        expected,
        found: shape_of(found),
    }
}

fn shape_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Sequence(_) => "a sequence",
        Value::Mapping(_) => "a mapping",
        Value::Tagged(_) => "a tagged value",
    }
}
