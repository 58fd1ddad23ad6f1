//! `--set key.path=value` overrides applied to the parsed template tree.

use serde_yaml_ng::{Mapping, Value};
use tracing::debug;

use vm_core::error::{Result, VmError};

/// A parsed `dot.path=value` assignment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Override {
    path: Vec<String>,
    value: String,
}

impl Override {
    /// Parses one entry. The value is everything after the first `=`.
    pub fn parse(entry: &str) -> Result<Self> {
        let Some((path, value)) = entry.split_once('=') else {
            return Err(VmError::MalformedOverride(entry.to_string()));
        };

        let path: Vec<String> = path.split('.').map(|s| s.trim().to_string()).collect();
        if path.iter().any(String::is_empty) {
            return Err(VmError::MalformedOverride(entry.to_string()));
        }

        Ok(Self {
            path,
            value: value.to_string(),
        })
    }

    pub fn path(&self) -> String {
        self.path.join(".")
    }

    pub fn value(&self) -> &str {
        &self.value
    }
}

/// Parses every entry up front so a malformed entry aborts before anything is applied.
pub fn parse_overrides<S: AsRef<str>>(entries: &[S]) -> Result<Vec<Override>> {
    entries.iter().map(|e| Override::parse(e.as_ref())).collect()
}

/// Applies overrides in order; later assignments to the same path win.
///
/// Values are stored as strings. Missing or non-mapping intermediate segments
/// are replaced by empty mappings.
pub fn apply_overrides(root: &mut Mapping, overrides: &[Override]) {
    for entry in overrides {
        debug!("Applying override {}={}", entry.path(), entry.value);
        set_nested_field(root, &entry.path, Value::String(entry.value.clone()));
    }
}

fn set_nested_field(map: &mut Mapping, parts: &[String], new_value: Value) {
    let Some((first, rest)) = parts.split_first() else {
        return;
    };
    let key = Value::String(first.clone());

    if rest.is_empty() {
        map.insert(key, new_value);
        return;
    }

    if !map.get(&key).is_some_and(Value::is_mapping) {
        map.insert(key.clone(), Value::Mapping(Mapping::new()));
    }
    if let Some(Value::Mapping(nested_map)) = map.get_mut(&key) {
        set_nested_field(nested_map, rest, new_value);
    }
}
