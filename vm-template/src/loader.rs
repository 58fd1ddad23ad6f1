// Standard library imports
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

// External crate imports
use tracing::{debug, info};

// Internal imports
use crate::document::parse_document;
use crate::merge::DefaultsMerger;
use crate::model::{ResolvedTemplate, TemplateDocument};
use crate::overrides::{apply_overrides, parse_overrides};
use crate::schema::validate_document;
use crate::units::convert_units;
use crate::vars::{substitute, Environment, VariableTable};
use vm_core::error::{Result, VmError};

/// Loads a VM template and turns it into resolved, normalized specifications.
///
/// Every load runs the same forward pipeline:
/// 1. **Variables:** the `vars:` block is read, overlaid by the environment,
///    and every `${...}` reference in the raw text is substituted.
/// 2. **Parse:** the substituted text must be a mapping; `vars` is dropped.
/// 3. **Overrides:** `key.path=value` entries are applied in order.
/// 4. **Schema:** the whole tree is validated and every violation reported.
/// 5. **Merge:** set documents overlay each entry onto `resourceDefaults`.
/// 6. **Units:** size strings become megabytes (memory) or gigabytes (storage).
///
/// A failure at any stage aborts the load.
#[derive(Debug, Clone)]
pub struct TemplateLoader {
    environment: Environment,
    overrides: Vec<String>,
}

impl Default for TemplateLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl TemplateLoader {
    /// Creates a loader that resolves variables against the current process environment.
    pub fn new() -> Self {
        Self {
            environment: Environment::capture(),
            overrides: Vec::new(),
        }
    }

    /// Replaces the environment snapshot used for variable resolution.
    pub fn with_environment(mut self, environment: Environment) -> Self {
        self.environment = environment;
        self
    }

    /// Appends `key.path=value` overrides, applied after any added earlier.
    pub fn with_overrides<I, S>(mut self, overrides: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.overrides.extend(overrides.into_iter().map(Into::into));
        self
    }

    /// Runs the full pipeline on a template file.
    pub fn load(&self, path: &Path) -> Result<ResolvedTemplate> {
        let text = read_template(path)?;
        self.load_str(&text, &path.display().to_string())
    }

    /// Runs the full pipeline on template text. `source` names it in errors.
    pub fn load_str(&self, text: &str, source: &str) -> Result<ResolvedTemplate> {
        let document = self.prepare(text, source)?;
        let resolved = resolve(document)?;
        info!(
            "Loaded template {} ({} VM(s), kind {})",
            source,
            resolved.resources.len(),
            resolved.kind
        );
        Ok(resolved)
    }

    /// Runs the pipeline up to and including schema validation.
    pub fn validate(&self, path: &Path) -> Result<TemplateDocument> {
        let text = read_template(path)?;
        self.prepare(&text, &path.display().to_string())
    }

    /// Builds the variable table a template would be resolved against.
    pub fn variables(&self, text: &str) -> VariableTable {
        VariableTable::for_template(text, self.environment.clone())
    }

    fn prepare(&self, text: &str, source: &str) -> Result<TemplateDocument> {
        let table = self.variables(text);
        debug!(
            "Resolving {} with {} declared variable(s)",
            source,
            table.declared().len()
        );
        let substituted = substitute(text, &table)?;

        let mut root = parse_document(&substituted, source)?;

        let overrides = parse_overrides(&self.overrides)?;
        apply_overrides(&mut root, &overrides);

        validate_document(&root)?;
        TemplateDocument::from_validated(root)
    }
}

/// Reads a template file, keeping "not found" distinct from other I/O failures.
pub fn read_template(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => VmError::FileNotFound(path.to_path_buf()),
        _ => VmError::Io(e),
    })
}

/// Merges set documents and normalizes units for every VM.
pub fn resolve(document: TemplateDocument) -> Result<ResolvedTemplate> {
    let kind = document.kind();
    let (api_version, mut resources) = match document {
        TemplateDocument::Single {
            api_version,
            resource,
        } => (api_version, vec![resource]),
        TemplateDocument::Set {
            api_version,
            defaults,
            resources,
        } => (api_version, DefaultsMerger::new(defaults).merge_all(resources)),
    };

    for resource in &mut resources {
        convert_units(resource)?;
    }

    Ok(ResolvedTemplate {
        api_version,
        kind,
        resources,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_yaml_ng::Value;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const SINGLE: &str = r#"
apiVersion: vmtemplate/v1
kind: VirtualMachine
vars:
  env: staging
resource:
  name: "${env}-web"
  os_family: linux
  ram: "4GB"
"#;

    fn loader() -> TemplateLoader {
        TemplateLoader::new().with_environment(Environment::empty())
    }

    #[test]
    fn test_load_str_resolves_vars_and_units() {
        let resolved = loader().load_str(SINGLE, "single.yaml").unwrap();
        let resource = resolved.resources[0].as_mapping();
        assert_eq!(resource["name"], Value::String("staging-web".into()));
        assert_eq!(resource["ram"], Value::Number(4096u64.into()));
        assert!(resolved.to_value().get("vars").is_none());
    }

    #[test]
    fn test_override_replaces_size_before_conversion() {
        let resolved = loader()
            .with_overrides(["resource.ram=8GB"])
            .load_str(SINGLE, "single.yaml")
            .unwrap();
        assert_eq!(
            resolved.resources[0].as_mapping()["ram"],
            Value::Number(8192u64.into())
        );
    }

    #[test]
    fn test_missing_file_is_distinct() {
        let err = loader()
            .load(Path::new("/definitely/not/here/template.yaml"))
            .unwrap_err();
        assert!(matches!(err, VmError::FileNotFound(_)));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(SINGLE.as_bytes()).unwrap();
        file.flush().unwrap();

        let resolved = loader().load(file.path()).unwrap();
        assert_eq!(resolved.resources.len(), 1);
        assert_eq!(resolved.resources[0].name(), Some("staging-web"));
    }

    #[test]
    fn test_malformed_override_aborts_load() {
        let err = loader()
            .with_overrides(["resource.ram=8GB", "badentry"])
            .load_str(SINGLE, "single.yaml")
            .unwrap_err();
        assert!(matches!(err, VmError::MalformedOverride(ref e) if e == "badentry"));
    }

    #[test]
    fn test_zero_size_string_fails_like_zero_integer() {
        for ram in ["0GB", "0"] {
            let err = loader()
                .with_overrides([format!("resource.ram={}", ram)])
                .load_str(SINGLE, "single.yaml")
                .unwrap_err();
            assert!(matches!(err, VmError::SchemaValidation(_)), "ram {}", ram);
        }
    }

    #[test]
    fn test_largest_cpu_count_survives_typed_view() {
        let text = SINGLE.replace("  ram: \"4GB\"", "  ram: \"4GB\"\n  cpus: 4294967295");
        let resolved = loader().load_str(&text, "single.yaml").unwrap();
        assert_eq!(resolved.vm_specs().unwrap()[0].cpus, u32::MAX);

        let text = SINGLE.replace("  ram: \"4GB\"", "  ram: \"4GB\"\n  cpus: 4294967296");
        let err = loader().load_str(&text, "single.yaml").unwrap_err();
        assert!(matches!(err, VmError::SchemaValidation(_)));
    }

    #[test]
    fn test_schema_runs_after_overrides() {
        let err = loader()
            .with_overrides(["resource.os_family=plan9"])
            .load_str(SINGLE, "single.yaml")
            .unwrap_err();
        assert!(matches!(err, VmError::SchemaValidation(_)));
    }
}
