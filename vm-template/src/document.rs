//! Structural parsing of substituted template text.

use serde_yaml_ng::{Mapping, Value};
use tracing::debug;

use crate::vars::VARS_KEY;
use vm_core::error::{Result, VmError};

/// Template text after variable substitution and before parsing.
///
/// Only [`crate::vars::substitute`] produces this, so the parser cannot be
/// handed raw, unsubstituted text by accident.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubstitutedText(String);

impl SubstitutedText {
    pub(crate) fn new(text: String) -> Self {
        Self(text)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

/// Parses substituted text into a tree whose root is a mapping.
///
/// The consumed `vars` block is removed from the returned tree. `source` names
/// the template in error messages.
pub fn parse_document(text: &SubstitutedText, source: &str) -> Result<Mapping> {
    let value: Value = serde_yaml_ng::from_str(text.as_str()).map_err(|e| {
        let location = e
            .location()
            .map(|loc| format!(" at line {}, column {}", loc.line(), loc.column()))
            .unwrap_or_default();
        VmError::StructuralParse(format!("{}{}: {}", source, location, e))
    })?;

    let mut root = match value {
        Value::Mapping(map) => map,
        Value::Null => {
            return Err(VmError::StructuralParse(format!(
                "{}: template is empty; expected a mapping at the top level",
                source
            )))
        }
        other => {
            return Err(VmError::StructuralParse(format!(
                "{}: expected a mapping at the top level, found {}",
                source,
                kind_name(&other)
            )))
        }
    };

    if root.shift_remove(VARS_KEY).is_some() {
        debug!("Stripped consumed 'vars' block from {}", source);
    }

    Ok(root)
}

/// Human name of a YAML node kind, used in error messages.
pub(crate) fn kind_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(n) if n.is_i64() || n.is_u64() => "an integer",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Sequence(_) => "a sequence",
        Value::Mapping(_) => "a mapping",
        Value::Tagged(_) => "a tagged value",
    }
}
