//! Structural schema for VM templates.
//!
//! The schema is fixed and declared in code. Validation walks the whole tree
//! depth-first and records every violation in a [`ViolationReport`], so a
//! single run reports every problem in the document, sorted by path.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_yaml_ng::{Mapping, Value};
use tracing::debug;

use crate::document::kind_name;
use crate::model::{
    TemplateKind, API_VERSION, KEY_API_VERSION, KEY_KIND, KEY_RESOURCE, KEY_RESOURCE_DEFAULTS,
    KEY_RESOURCE_LIST,
};
use crate::units::{is_size_string, Size, SIZE_PATTERN};
use vm_core::error::Result;
use vm_core::validation::{FieldPath, ViolationReport};

/// Expected type of one field.
#[derive(Debug, Clone)]
pub enum FieldType {
    String,
    Pattern(Regex),
    Enum(&'static [&'static str]),
    Integer { min: i64, max: u64 },
    Boolean,
    /// A positive integer or a size string such as `"4GB"`.
    Size,
    /// A mapping of string keys to string values.
    StringMap,
    /// A sequence of objects, each checked against the nested schema.
    ObjectList(ObjectSchema),
}

#[derive(Debug, Clone)]
pub struct FieldRule {
    pub name: &'static str,
    pub field_type: FieldType,
    pub required: bool,
}

impl FieldRule {
    fn required(name: &'static str, field_type: FieldType) -> Self {
        Self {
            name,
            field_type,
            required: true,
        }
    }

    fn optional(name: &'static str, field_type: FieldType) -> Self {
        Self {
            name,
            field_type,
            required: false,
        }
    }
}

/// A closed set of fields; anything not listed is reported as unexpected.
#[derive(Debug, Clone)]
pub struct ObjectSchema {
    pub fields: Vec<FieldRule>,
}

impl ObjectSchema {
    pub fn field(&self, name: &str) -> Option<&FieldRule> {
        self.fields.iter().find(|rule| rule.name == name)
    }

    pub fn required_fields(&self) -> impl Iterator<Item = &FieldRule> {
        self.fields.iter().filter(|rule| rule.required)
    }
}

pub const OS_FAMILIES: &[&str] = &["linux", "windows", "bsd"];
pub const DISK_INTERFACES: &[&str] = &["virtio", "scsi", "ide", "sata"];
pub const NIC_MODELS: &[&str] = &["virtio", "e1000", "rtl8139"];
pub const DEVICE_TYPES: &[&str] = &["gpu", "usb", "serial", "tpm"];

const NAME_PATTERN: &str = r"^[A-Za-z0-9][A-Za-z0-9._-]{0,62}$";
const MAC_PATTERN: &str = r"^([0-9A-Fa-f]{2}:){5}[0-9A-Fa-f]{2}$";

/// Schema of one VM specification.
pub static RESOURCE_SCHEMA: Lazy<ObjectSchema> = Lazy::new(build_resource_schema);

fn build_resource_schema() -> ObjectSchema {
    let name_regex = Regex::new(NAME_PATTERN).expect("name pattern is valid");
    let mac_regex = Regex::new(MAC_PATTERN).expect("mac pattern is valid");

    let volume = ObjectSchema {
        fields: vec![
            FieldRule::required("name", FieldType::String),
            FieldRule::required("size", FieldType::Size),
            FieldRule::optional("interface", FieldType::Enum(DISK_INTERFACES)),
            FieldRule::optional("readonly", FieldType::Boolean),
        ],
    };

    let interface = ObjectSchema {
        fields: vec![
            FieldRule::required("network", FieldType::String),
            FieldRule::optional("model", FieldType::Enum(NIC_MODELS)),
            FieldRule::optional("mac", FieldType::Pattern(mac_regex)),
            FieldRule::optional("ip", FieldType::String),
        ],
    };

    let device = ObjectSchema {
        fields: vec![
            FieldRule::required("type", FieldType::Enum(DEVICE_TYPES)),
            FieldRule::optional("id", FieldType::String),
        ],
    };

    ObjectSchema {
        fields: vec![
            FieldRule::required("name", FieldType::Pattern(name_regex)),
            FieldRule::required("os_family", FieldType::Enum(OS_FAMILIES)),
            FieldRule::optional("os_version", FieldType::String),
            FieldRule::optional("description", FieldType::String),
            FieldRule::optional(
                "cpus",
                FieldType::Integer {
                    min: 1,
                    max: u64::from(u32::MAX),
                },
            ),
            FieldRule::optional("ram", FieldType::Size),
            FieldRule::optional("disk_size", FieldType::Size),
            FieldRule::optional("autostart", FieldType::Boolean),
            FieldRule::optional("labels", FieldType::StringMap),
            FieldRule::optional("volumes", FieldType::ObjectList(volume)),
            FieldRule::optional("interfaces", FieldType::ObjectList(interface)),
            FieldRule::optional("devices", FieldType::ObjectList(device)),
        ],
    }
}

const DOCUMENT_FIELDS: &[&str] = &[
    KEY_API_VERSION,
    KEY_KIND,
    KEY_RESOURCE,
    KEY_RESOURCE_DEFAULTS,
    KEY_RESOURCE_LIST,
];

/// Validates a parsed, overridden template tree.
///
/// Fails with [`vm_core::VmError::SchemaValidation`] carrying every violation.
pub fn validate_document(root: &Mapping) -> Result<()> {
    let mut validator = SchemaValidator::new(&RESOURCE_SCHEMA);
    validator.check_document(root);
    debug!("Schema validation found {} violation(s)", validator.report.len());
    validator.report.into_result()
}

/// Whether missing required fields are reported for an object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Completeness {
    Required,
    ShapeOnly,
}

struct SchemaValidator<'s> {
    resource: &'s ObjectSchema,
    report: ViolationReport,
}

impl<'s> SchemaValidator<'s> {
    fn new(resource: &'s ObjectSchema) -> Self {
        Self {
            resource,
            report: ViolationReport::new(),
        }
    }

    fn check_document(&mut self, root: &Mapping) {
        let path = FieldPath::root();

        for key in root.keys() {
            match key.as_str() {
                Some(k) if DOCUMENT_FIELDS.contains(&k) => {}
                Some(k) => self.report.add(&path, format!("unexpected field '{}'", k)),
                None => self
                    .report
                    .add(&path, format!("field names must be strings, found {}", kind_name(key))),
            }
        }

        self.check_api_version(root, &path);
        let kind = self.check_kind(root, &path);

        let has_resource = root.contains_key(KEY_RESOURCE);
        let has_list = root.contains_key(KEY_RESOURCE_LIST);

        match kind {
            Some(TemplateKind::VirtualMachine) => {
                self.forbid(root, &path, KEY_RESOURCE_LIST, kind);
                self.forbid(root, &path, KEY_RESOURCE_DEFAULTS, kind);
                self.check_single(root, &path, kind);
            }
            Some(TemplateKind::VirtualMachineSet) => {
                self.forbid(root, &path, KEY_RESOURCE, kind);
                self.check_set(root, &path, kind);
            }
            None => {
                // Without a usable kind, fall back to checking that exactly one
                // branch is present and validate whichever one is.
                if has_resource == has_list {
                    self.report.add(
                        &path,
                        format!(
                            "exactly one of '{}' or '{}' must be present",
                            KEY_RESOURCE, KEY_RESOURCE_LIST
                        ),
                    );
                }
                if has_resource {
                    self.check_single(root, &path, None);
                }
                if has_list || root.contains_key(KEY_RESOURCE_DEFAULTS) {
                    self.check_set(root, &path, None);
                }
            }
        }
    }

    fn check_api_version(&mut self, root: &Mapping, path: &FieldPath) {
        match root.get(KEY_API_VERSION) {
            None => self.require_message(path, KEY_API_VERSION),
            Some(Value::String(version)) if version == API_VERSION => {}
            Some(Value::String(version)) => self.report.add(
                &path.key(KEY_API_VERSION),
                format!("'{}' is not the accepted value '{}'", version, API_VERSION),
            ),
            Some(other) => self.type_mismatch(&path.key(KEY_API_VERSION), "a string", other),
        }
    }

    fn check_kind(&mut self, root: &Mapping, path: &FieldPath) -> Option<TemplateKind> {
        match root.get(KEY_KIND) {
            None => {
                self.require_message(path, KEY_KIND);
                None
            }
            Some(Value::String(kind)) => match kind.parse::<TemplateKind>() {
                Ok(kind) => Some(kind),
                Err(_) => {
                    let allowed: Vec<&str> =
                        TemplateKind::ALL.iter().map(TemplateKind::as_str).collect();
                    self.report.add(
                        &path.key(KEY_KIND),
                        format!("'{}' is not one of {}", kind, format_choices(&allowed)),
                    );
                    None
                }
            },
            Some(other) => {
                self.type_mismatch(&path.key(KEY_KIND), "a string", other);
                None
            }
        }
    }

    fn forbid(&mut self, root: &Mapping, path: &FieldPath, key: &str, kind: Option<TemplateKind>) {
        if root.contains_key(key) {
            let kind = kind.map(|k| k.as_str()).unwrap_or("this document");
            self.report
                .add(path, format!("'{}' is not allowed for kind {}", key, kind));
        }
    }

    fn check_single(&mut self, root: &Mapping, path: &FieldPath, kind: Option<TemplateKind>) {
        match root.get(KEY_RESOURCE) {
            Some(resource) => {
                self.check_object(resource, self.resource, &path.key(KEY_RESOURCE), Completeness::Required)
            }
            None => self.require_for_kind(path, KEY_RESOURCE, kind),
        }
    }

    fn check_set(&mut self, root: &Mapping, path: &FieldPath, kind: Option<TemplateKind>) {
        let defaults = root.get(KEY_RESOURCE_DEFAULTS);
        let defaults_map = match defaults {
            Some(value) => {
                self.check_object(
                    value,
                    self.resource,
                    &path.key(KEY_RESOURCE_DEFAULTS),
                    Completeness::ShapeOnly,
                );
                value.as_mapping()
            }
            None => None,
        };

        let list_path = path.key(KEY_RESOURCE_LIST);
        let items = match root.get(KEY_RESOURCE_LIST) {
            None => {
                self.require_for_kind(path, KEY_RESOURCE_LIST, kind);
                return;
            }
            Some(Value::Sequence(items)) => items,
            Some(other) => {
                self.type_mismatch(&list_path, "a sequence", other);
                return;
            }
        };

        if items.is_empty() {
            self.report
                .add(&list_path, "must contain at least one entry");
        }

        for (index, item) in items.iter().enumerate() {
            let item_path = list_path.index(index);
            self.check_object(item, self.resource, &item_path, Completeness::ShapeOnly);

            let Some(item_map) = item.as_mapping() else {
                continue;
            };

            // Required fields only have to be present once defaults are merged in.
            for rule in self.resource.required_fields() {
                let inherited = defaults_map.is_some_and(|d| d.contains_key(rule.name));
                if !item_map.contains_key(rule.name) && !inherited {
                    self.report.add(
                        &item_path,
                        format!(
                            "'{}' is a required property (set it on the entry or in {})",
                            rule.name, KEY_RESOURCE_DEFAULTS
                        ),
                    );
                }
            }
        }
    }

    fn check_object(
        &mut self,
        value: &Value,
        schema: &ObjectSchema,
        path: &FieldPath,
        completeness: Completeness,
    ) {
        let Value::Mapping(map) = value else {
            self.type_mismatch(path, "a mapping", value);
            return;
        };

        for (key, field_value) in map {
            let Some(name) = key.as_str() else {
                self.report
                    .add(path, format!("field names must be strings, found {}", kind_name(key)));
                continue;
            };
            match schema.field(name) {
                Some(rule) => self.check_field(field_value, &rule.field_type, &path.key(name)),
                None => self.report.add(path, format!("unexpected field '{}'", name)),
            }
        }

        if completeness == Completeness::Required {
            for rule in schema.required_fields() {
                if !map.contains_key(rule.name) {
                    self.require_message(path, rule.name);
                }
            }
        }
    }

    fn check_field(&mut self, value: &Value, field_type: &FieldType, path: &FieldPath) {
        match field_type {
            FieldType::String => {
                if !value.is_string() {
                    self.type_mismatch(path, "a string", value);
                }
            }
            FieldType::Pattern(regex) => match value.as_str() {
                Some(s) if regex.is_match(s) => {}
                Some(s) => self
                    .report
                    .add(path, format!("'{}' does not match '{}'", s, regex.as_str())),
                None => self.type_mismatch(path, "a string", value),
            },
            FieldType::Enum(choices) => match value.as_str() {
                Some(s) if choices.contains(&s) => {}
                Some(s) => self
                    .report
                    .add(path, format!("'{}' is not one of {}", s, format_choices(choices))),
                None => self.type_mismatch(path, "a string", value),
            },
            FieldType::Integer { min, max } => self.check_integer(value, *min, *max, path),
            FieldType::Boolean => {
                if !value.is_bool() {
                    self.type_mismatch(path, "a boolean", value);
                }
            }
            FieldType::Size => match value {
                Value::String(s) if is_size_string(s) => {
                    if Size::parse(s).is_ok_and(|size| size.is_zero()) {
                        self.report
                            .add(path, format!("'{}' is not a positive size", s));
                    }
                }
                Value::String(s) => self.report.add(
                    path,
                    format!(
                        "'{}' is not a positive integer or a size string matching '{}'",
                        s, SIZE_PATTERN
                    ),
                ),
                _ => self.check_integer(value, 1, u64::MAX, path),
            },
            FieldType::StringMap => {
                let Value::Mapping(map) = value else {
                    self.type_mismatch(path, "a mapping", value);
                    return;
                };
                for (key, entry) in map {
                    match key.as_str() {
                        Some(k) if !entry.is_string() => {
                            self.type_mismatch(&path.key(k), "a string", entry)
                        }
                        Some(_) => {}
                        None => self.report.add(
                            path,
                            format!("keys must be strings, found {}", kind_name(key)),
                        ),
                    }
                }
            }
            FieldType::ObjectList(item_schema) => {
                let Value::Sequence(items) = value else {
                    self.type_mismatch(path, "a sequence", value);
                    return;
                };
                // Collections are replaced wholesale on merge, so every entry must be complete.
                for (index, item) in items.iter().enumerate() {
                    self.check_object(item, item_schema, &path.index(index), Completeness::Required);
                }
            }
        }
    }

    fn check_integer(&mut self, value: &Value, min: i64, max: u64, path: &FieldPath) {
        let Value::Number(n) = value else {
            self.type_mismatch(path, "an integer", value);
            return;
        };
        match (n.as_i64(), n.as_u64()) {
            (Some(i), _) if i < min => self
                .report
                .add(path, format!("{} is less than the minimum of {}", i, min)),
            (_, Some(u)) if u > max => self
                .report
                .add(path, format!("{} is greater than the maximum of {}", u, max)),
            (None, None) => self.type_mismatch(path, "an integer", value),
            _ => {}
        }
    }

    fn require_message(&mut self, path: &FieldPath, field: &str) {
        self.report
            .add(path, format!("'{}' is a required property", field));
    }

    fn require_for_kind(&mut self, path: &FieldPath, field: &str, kind: Option<TemplateKind>) {
        match kind {
            Some(kind) => self.report.add(
                path,
                format!("'{}' is a required property for kind {}", field, kind),
            ),
            None => self.require_message(path, field),
        }
    }

    fn type_mismatch(&mut self, path: &FieldPath, expected: &str, found: &Value) {
        self.report.add(
            path,
            format!("expected {}, found {}", expected, kind_name(found)),
        );
    }
}

fn format_choices(choices: &[&str]) -> String {
    let quoted: Vec<String> = choices.iter().map(|c| format!("'{}'", c)).collect();
    format!("[{}]", quoted.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use vm_core::error::VmError;
    use vm_core::validation::Violation;

    fn violations(yaml: &str) -> Vec<String> {
        let root: Mapping = serde_yaml_ng::from_str(yaml).unwrap();
        match validate_document(&root) {
            Ok(()) => Vec::new(),
            Err(VmError::SchemaValidation(found)) => {
                found.iter().map(Violation::to_string).collect()
            }
            Err(other) => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_valid_single_document() {
        let found = violations(
            r#"
apiVersion: vmtemplate/v1
kind: VirtualMachine
resource:
  name: web-01
  os_family: linux
  cpus: 2
  ram: 4GB
  disk_size: 40
  autostart: true
  labels:
    team: infra
  volumes:
    - name: data
      size: 1.5TB
      interface: scsi
  interfaces:
    - network: default
      mac: "52:54:00:12:34:56"
  devices:
    - type: tpm
"#,
        );
        assert!(found.is_empty(), "{:?}", found);
    }

    #[test]
    fn test_missing_api_version_is_reported_at_root() {
        let found = violations("kind: VirtualMachine\nresource:\n  name: a\n  os_family: linux\n");
        assert_eq!(found, vec!["(root): 'apiVersion' is a required property"]);
    }

    #[test]
    fn test_wrong_api_version_and_kind() {
        let found = violations("apiVersion: v2\nkind: Container\nresource:\n  name: a\n  os_family: linux\n");
        assert_eq!(
            found,
            vec![
                "apiVersion: 'v2' is not the accepted value 'vmtemplate/v1'",
                "kind: 'Container' is not one of ['VirtualMachine', 'VirtualMachineSet']",
            ]
        );
    }

    #[test]
    fn test_all_violations_are_collected_and_sorted() {
        let found = violations(
            r#"
apiVersion: vmtemplate/v1
kind: VirtualMachine
resource:
  name: web
  os_family: plan9
  cpus: 0
  ram: 4gb
  volumes:
    - name: data
      interface: floppy
  colour: blue
"#,
        );
        assert_eq!(
            found,
            vec![
                "resource: unexpected field 'colour'",
                "resource.cpus: 0 is less than the minimum of 1",
                "resource.os_family: 'plan9' is not one of ['linux', 'windows', 'bsd']",
                "resource.ram: '4gb' is not a positive integer or a size string matching '^\\d+(\\.\\d+)?\\s*(MB|GB|TB)$'",
                "resource.volumes[0]: 'size' is a required property",
                "resource.volumes[0].interface: 'floppy' is not one of ['virtio', 'scsi', 'ide', 'sata']",
            ]
        );
    }

    #[test]
    fn test_size_fields_accept_both_forms() {
        for ram in ["4096", "\"4GB\"", "\"512 MB\"", "\"1.5TB\""] {
            let doc = format!(
                "apiVersion: vmtemplate/v1\nkind: VirtualMachine\nresource:\n  name: a\n  os_family: linux\n  ram: {}\n",
                ram
            );
            assert!(violations(&doc).is_empty(), "ram {} should be valid", ram);
        }
        let found = violations(
            "apiVersion: vmtemplate/v1\nkind: VirtualMachine\nresource:\n  name: a\n  os_family: linux\n  ram: 0\n  disk_size: 2.5\n",
        );
        assert_eq!(
            found,
            vec![
                "resource.disk_size: expected an integer, found a number",
                "resource.ram: 0 is less than the minimum of 1",
            ]
        );
    }

    #[test]
    fn test_cpus_must_fit_in_u32() {
        let doc = |cpus: u64| {
            format!(
                "apiVersion: vmtemplate/v1\nkind: VirtualMachine\nresource:\n  name: a\n  os_family: linux\n  cpus: {}\n",
                cpus
            )
        };
        assert!(violations(&doc(u64::from(u32::MAX))).is_empty());
        assert_eq!(
            violations(&doc(u64::from(u32::MAX) + 1)),
            vec!["resource.cpus: 4294967296 is greater than the maximum of 4294967295"]
        );
    }

    #[test]
    fn test_zero_size_strings_are_rejected_like_zero_integers() {
        let found = violations(
            r#"
apiVersion: vmtemplate/v1
kind: VirtualMachine
resource:
  name: a
  os_family: linux
  ram: 0GB
  disk_size: "0 TB"
  volumes:
    - name: data
      size: 0.0MB
    - name: tiny
      size: 0.1MB
"#,
        );
        assert_eq!(
            found,
            vec![
                "resource.disk_size: '0 TB' is not a positive size",
                "resource.ram: '0GB' is not a positive size",
                "resource.volumes[0].size: '0.0MB' is not a positive size",
            ]
        );
    }

    #[test]
    fn test_override_strings_are_not_coerced() {
        let found = violations(
            "apiVersion: vmtemplate/v1\nkind: VirtualMachine\nresource:\n  name: a\n  os_family: linux\n  cpus: \"4\"\n",
        );
        assert_eq!(found, vec!["resource.cpus: expected an integer, found a string"]);
    }

    #[test]
    fn test_single_kind_requires_resource_and_forbids_list() {
        let found = violations(
            "apiVersion: vmtemplate/v1\nkind: VirtualMachine\nresourceList:\n  - name: a\n",
        );
        assert_eq!(
            found,
            vec![
                "(root): 'resource' is a required property for kind VirtualMachine",
                "(root): 'resourceList' is not allowed for kind VirtualMachine",
            ]
        );
    }

    #[test]
    fn test_set_required_fields_are_checked_after_merge() {
        let found = violations(
            r#"
apiVersion: vmtemplate/v1
kind: VirtualMachineSet
resourceDefaults:
  os_family: linux
  ram: 4GB
resourceList:
  - name: vm-01
  - name: vm-02
    ram: 8GB
"#,
        );
        assert!(found.is_empty(), "{:?}", found);

        let found = violations(
            r#"
apiVersion: vmtemplate/v1
kind: VirtualMachineSet
resourceDefaults:
  ram: 4GB
resourceList:
  - name: vm-01
    os_family: linux
  - name: vm-02
"#,
        );
        assert_eq!(
            found,
            vec!["resourceList[1]: 'os_family' is a required property (set it on the entry or in resourceDefaults)"]
        );
    }

    #[test]
    fn test_set_defaults_are_checked_for_shape() {
        let found = violations(
            r#"
apiVersion: vmtemplate/v1
kind: VirtualMachineSet
resourceDefaults:
  os_family: linux
  cpus: many
resourceList:
  - name: a
"#,
        );
        assert_eq!(found, vec!["resourceDefaults.cpus: expected an integer, found a string"]);
    }

    #[test]
    fn test_set_rejects_empty_list_and_resource() {
        let found = violations(
            "apiVersion: vmtemplate/v1\nkind: VirtualMachineSet\nresource:\n  name: x\nresourceList: []\n",
        );
        assert_eq!(
            found,
            vec![
                "(root): 'resource' is not allowed for kind VirtualMachineSet",
                "resourceList: must contain at least one entry",
            ]
        );
    }

    #[test]
    fn test_set_entries_may_share_a_name() {
        let found = violations(
            "apiVersion: vmtemplate/v1\nkind: VirtualMachineSet\nresourceDefaults:\n  os_family: linux\nresourceList:\n  - name: a\n  - name: a\n",
        );
        assert!(found.is_empty(), "{:?}", found);
    }

    #[test]
    fn test_alternation_without_kind() {
        let found = violations("apiVersion: vmtemplate/v1\n");
        assert_eq!(
            found,
            vec![
                "(root): 'kind' is a required property",
                "(root): exactly one of 'resource' or 'resourceList' must be present",
            ]
        );

        let found = violations(
            "apiVersion: vmtemplate/v1\nresource:\n  name: a\n  os_family: linux\nresourceList:\n  - name: b\n    os_family: bsd\n",
        );
        assert_eq!(
            found,
            vec![
                "(root): 'kind' is a required property",
                "(root): exactly one of 'resource' or 'resourceList' must be present",
            ]
        );
    }

    #[test]
    fn test_unknown_top_level_field() {
        let found = violations(
            "apiVersion: vmtemplate/v1\nkind: VirtualMachine\nmetadata: {}\nresource:\n  name: a\n  os_family: linux\n",
        );
        assert_eq!(found, vec!["(root): unexpected field 'metadata'"]);
    }

    #[test]
    fn test_labels_must_be_strings() {
        let found = violations(
            "apiVersion: vmtemplate/v1\nkind: VirtualMachine\nresource:\n  name: a\n  os_family: linux\n  labels:\n    tier: 1\n",
        );
        assert_eq!(found, vec!["resource.labels.tier: expected a string, found an integer"]);
    }

    #[test]
    fn test_name_and_mac_patterns() {
        let found = violations(
            "apiVersion: vmtemplate/v1\nkind: VirtualMachine\nresource:\n  name: -bad\n  os_family: linux\n  interfaces:\n    - network: lan\n      mac: zz\n",
        );
        assert_eq!(found.len(), 2);
        assert!(found[0].starts_with("resource.interfaces[0].mac: 'zz' does not match"));
        assert!(found[1].starts_with("resource.name: '-bad' does not match"));
    }

    #[test]
    fn test_pattern_fields_carry_their_regex() {
        let name = RESOURCE_SCHEMA.field("name").unwrap();
        assert!(matches!(&name.field_type, FieldType::Pattern(r) if r.as_str() == NAME_PATTERN));

        let Some(FieldType::ObjectList(interface)) =
            RESOURCE_SCHEMA.field("interfaces").map(|rule| &rule.field_type)
        else {
            panic!("interfaces should be an object list");
        };
        let mac = interface.field("mac").unwrap();
        assert!(matches!(&mac.field_type, FieldType::Pattern(r) if r.as_str() == MAC_PATTERN));
    }
}
