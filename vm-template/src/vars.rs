//! Template variables: the `vars:` pre-pass, the effective variable table and
//! textual `${NAME}` / `${NAME:-default}` substitution.

// Standard library
use std::collections::HashMap;
use std::sync::OnceLock;

// External crates
use indexmap::{IndexMap, IndexSet};
use regex::{Captures, Regex};
use serde_yaml_ng::Value;
use tracing::{debug, warn};

// Internal imports
use crate::document::SubstitutedText;
use vm_core::error::{Result, VmError};

/// Key of the template-local variable block.
pub const VARS_KEY: &str = "vars";

static REFERENCE_RE: OnceLock<Regex> = OnceLock::new();

fn reference_regex() -> &'static Regex {
    REFERENCE_RE.get_or_init(|| {
        Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)(?::-([^}]*))?\}")
            .expect("variable reference pattern is valid")
    })
}

/// A snapshot of process environment variables.
///
/// The resolver only ever sees a snapshot, so loads are reproducible and tests
/// never have to mutate the real environment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Environment {
    vars: HashMap<String, String>,
}

impl Environment {
    /// Captures the current process environment. Non-UTF-8 entries are skipped.
    pub fn capture() -> Self {
        Self {
            vars: std::env::vars_os()
                .filter_map(|(k, v)| Some((k.into_string().ok()?, v.into_string().ok()?)))
                .collect(),
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            vars: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.vars.get(name).map(String::as_str)
    }
}

/// Where a variable's effective value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VarSource {
    Environment,
    Template,
}

/// The effective variable table: template-declared values overlaid by the environment.
#[derive(Debug, Clone, Default)]
pub struct VariableTable {
    declared: IndexMap<String, String>,
    environment: Environment,
}

impl VariableTable {
    pub fn new(declared: IndexMap<String, String>, environment: Environment) -> Self {
        Self {
            declared,
            environment,
        }
    }

    /// Builds the table for raw template text, reading its `vars:` block leniently.
    pub fn for_template(text: &str, environment: Environment) -> Self {
        Self::new(extract_vars_block(text), environment)
    }

    /// Looks a name up; the environment wins over the template declaration.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.environment
            .get(name)
            .or_else(|| self.declared.get(name).map(String::as_str))
    }

    pub fn source(&self, name: &str) -> Option<VarSource> {
        if self.environment.get(name).is_some() {
            Some(VarSource::Environment)
        } else if self.declared.contains_key(name) {
            Some(VarSource::Template)
        } else {
            None
        }
    }

    pub fn declared(&self) -> &IndexMap<String, String> {
        &self.declared
    }
}

/// Reads the `vars:` mapping from unsubstituted template text.
///
/// Never fails: anything that cannot be read yields an empty table. When the
/// whole document does not parse, the top-level `vars:` section is cut out of
/// the text and parsed on its own.
pub fn extract_vars_block(text: &str) -> IndexMap<String, String> {
    match serde_yaml_ng::from_str::<Value>(text) {
        Ok(document) => vars_from_document(&document),
        Err(e) => {
            debug!("Template does not parse before substitution: {}", e);
            let Some(section) = isolate_vars_section(text) else {
                return IndexMap::new();
            };
            match serde_yaml_ng::from_str::<Value>(&section) {
                Ok(document) => vars_from_document(&document),
                Err(e) => {
                    warn!("Ignoring unreadable 'vars' block: {}", e);
                    IndexMap::new()
                }
            }
        }
    }
}

fn vars_from_document(document: &Value) -> IndexMap<String, String> {
    let mut table = IndexMap::new();
    let Some(Value::Mapping(vars)) = document.get(VARS_KEY) else {
        return table;
    };

    for (key, value) in vars {
        let Some(name) = key.as_str() else {
            debug!("Skipping non-string variable name: {:?}", key);
            continue;
        };
        let rendered = match value {
            Value::String(s) => s.clone(),
            Value::Number(n) => n.to_string(),
            Value::Bool(b) => b.to_string(),
            other => {
                debug!("Skipping non-scalar variable '{}': {:?}", name, other);
                continue;
            }
        };
        table.insert(name.to_string(), rendered);
    }
    table
}

/// Cuts the top-level `vars:` key and its indented body out of the text.
fn isolate_vars_section(text: &str) -> Option<String> {
    let mut lines = text.lines().skip_while(|line| !is_vars_header(line));
    let header = lines.next()?;

    let mut section = String::from(header);
    section.push('\n');
    for line in lines {
        let is_body = line.trim().is_empty()
            || line.starts_with(' ')
            || line.starts_with('\t')
            || line.trim_start().starts_with('#');
        if !is_body {
            break;
        }
        section.push_str(line);
        section.push('\n');
    }
    Some(section)
}

fn is_vars_header(line: &str) -> bool {
    line.strip_prefix(VARS_KEY)
        .is_some_and(|rest| rest.trim_start().starts_with(':'))
}

/// A `${...}` reference found in template text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VarReference {
    pub name: String,
    /// The inline default of `${NAME:-default}`; `Some("")` for `${NAME:-}`.
    pub default: Option<String>,
}

impl VarReference {
    pub fn is_required(&self) -> bool {
        self.default.is_none()
    }
}

/// Lists the references in `text` in order of first appearance, one per name.
pub fn references(text: &str) -> Vec<VarReference> {
    let mut seen = IndexSet::new();
    reference_regex()
        .captures_iter(text)
        .filter_map(|caps| {
            let name = caps.get(1)?.as_str();
            if !seen.insert(name.to_string()) {
                return None;
            }
            Some(VarReference {
                name: name.to_string(),
                default: caps.get(2).map(|m| m.as_str().to_string()),
            })
        })
        .collect()
}

/// Replaces every variable reference in `text`.
///
/// A value in the table wins over an inline default. Every required reference
/// without a value is collected and reported together.
pub fn substitute(text: &str, table: &VariableTable) -> Result<SubstitutedText> {
    let mut missing: IndexSet<String> = IndexSet::new();

    let substituted = reference_regex().replace_all(text, |caps: &Captures| {
        let name = &caps[1];
        if let Some(value) = table.get(name) {
            return value.to_string();
        }
        if let Some(default) = caps.get(2) {
            return default.as_str().to_string();
        }
        missing.insert(name.to_string());
        String::new()
    });

    if !missing.is_empty() {
        return Err(VmError::MissingVariable(missing.into_iter().collect()));
    }

    Ok(SubstitutedText::new(substituted.into_owned()))
}
