use std::fmt::{self, Display, Formatter};
use std::path::PathBuf;
use thiserror::Error;

use crate::validation::Violation;

#[derive(Error, Debug)]
pub enum VmError {
    /// The template path does not exist.
    FileNotFound(PathBuf),
    /// Reading the template failed for a reason other than absence.
    Io(#[from] std::io::Error),
    /// Required `${NAME}` references with no resolution, in order of first use.
    MissingVariable(Vec<String>),
    /// An override entry without `=`, kept verbatim.
    MalformedOverride(String),
    StructuralParse(String),
    SchemaValidation(Vec<Violation>),
    UnitParse {
        field: String,
        value: String,
        reason: String,
    },
    Serialization(String),
}

impl Display for VmError {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            VmError::FileNotFound(path) => {
                write!(f, "Template file not found: {}", path.display())
            }
            VmError::Io(e) => write!(f, "I/O error: {}", e),
            VmError::MissingVariable(names) => {
                write!(
                    f,
                    "Missing required template variable(s): {}",
                    names.join(", ")
                )?;
                write!(f, "\n\nFix:\n")?;
                write!(f, "  • Declare them under 'vars:' in the template, or\n")?;
                write!(f, "  • Export them in the environment, or\n")?;
                write!(f, "  • Give the reference an inline default: ${{NAME:-value}}")
            }
            VmError::MalformedOverride(entry) => write!(
                f,
                "Malformed override '{}': expected key.path=value",
                entry
            ),
            VmError::StructuralParse(s) => write!(f, "Template parse error: {}", s),
            VmError::SchemaValidation(violations) => {
                write!(
                    f,
                    "Template failed schema validation ({} problem{}):",
                    violations.len(),
                    if violations.len() == 1 { "" } else { "s" }
                )?;
                for violation in violations {
                    write!(f, "\n  • {}", violation)?;
                }
                Ok(())
            }
            VmError::UnitParse {
                field,
                value,
                reason,
            } => write!(
                f,
                "Could not convert size '{}' for field '{}': {}",
                value, field, reason
            ),
            VmError::Serialization(s) => write!(f, "Serialization error: {}", s),
        }
    }
}

pub type Result<T> = std::result::Result<T, VmError>;
