//! VM template loading library.
//!
//! Turns a declarative VM template into fully resolved, schema-valid and
//! unit-normalized VM specifications.
//!
//! ## Main Features
//! - `${NAME}` / `${NAME:-default}` substitution from a `vars:` block and the environment
//! - `key.path=value` overrides applied to the parsed document
//! - Schema validation that reports every violation at once
//! - Shared defaults for multi-VM (`VirtualMachineSet`) documents
//! - Memory and storage size strings normalized to integers

pub mod cli;
pub mod document;
pub mod loader;
pub mod merge;
pub mod model;
pub mod overrides;
pub mod schema;
pub mod units;
pub mod vars;

pub use loader::TemplateLoader;
pub use model::{ResolvedTemplate, ResourceSpec, TemplateDocument, TemplateKind, VmSpec};
pub use vars::Environment;

use std::path::Path;
use vm_core::error::Result;

/// Loads a template against the current process environment.
pub fn load_template<S: Into<String>>(
    path: &Path,
    overrides: impl IntoIterator<Item = S>,
) -> Result<ResolvedTemplate> {
    TemplateLoader::new().with_overrides(overrides).load(path)
}
