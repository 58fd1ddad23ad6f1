//! Template document model.
//!
//! The pipeline works on untyped YAML trees until the schema has been checked.
//! From then on a document is a [`TemplateDocument`], and each VM is a
//! [`ResourceSpec`] (an ordered mapping) with a strongly typed view in [`VmSpec`].

use std::fmt;
use std::str::FromStr;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_yaml_ng::{Mapping, Value};

use vm_core::error::{Result, VmError};
use vm_core::validation::{FieldPath, ViolationReport};

/// The only accepted `apiVersion`.
pub const API_VERSION: &str = "vmtemplate/v1";

pub const KEY_API_VERSION: &str = "apiVersion";
pub const KEY_KIND: &str = "kind";
pub const KEY_RESOURCE: &str = "resource";
pub const KEY_RESOURCE_DEFAULTS: &str = "resourceDefaults";
pub const KEY_RESOURCE_LIST: &str = "resourceList";

pub const DEFAULT_CPUS: u32 = 1;
pub const DEFAULT_RAM_MB: u64 = 1024;
pub const DEFAULT_DISK_GB: u64 = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TemplateKind {
    /// A document with a single `resource`.
    VirtualMachine,
    /// A document with `resourceDefaults` and a `resourceList`.
    VirtualMachineSet,
}

impl TemplateKind {
    pub const ALL: [TemplateKind; 2] = [TemplateKind::VirtualMachine, TemplateKind::VirtualMachineSet];

    pub fn as_str(&self) -> &'static str {
        match self {
            TemplateKind::VirtualMachine => "VirtualMachine",
            TemplateKind::VirtualMachineSet => "VirtualMachineSet",
        }
    }
}

impl fmt::Display for TemplateKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TemplateKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        TemplateKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| format!("unknown kind '{}'", s))
    }
}

/// One VM specification as an ordered mapping of fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ResourceSpec(Mapping);

impl ResourceSpec {
    pub fn from_mapping(mapping: Mapping) -> Self {
        Self(mapping)
    }

    pub fn as_mapping(&self) -> &Mapping {
        &self.0
    }

    pub fn as_mapping_mut(&mut self) -> &mut Mapping {
        &mut self.0
    }

    pub fn into_mapping(self) -> Mapping {
        self.0
    }

    pub fn name(&self) -> Option<&str> {
        self.0.get("name").and_then(Value::as_str)
    }

    /// Typed view of a converted specification, with defaults filled in.
    pub fn to_vm_spec(&self) -> Result<VmSpec> {
        serde_yaml_ng::from_value(Value::Mapping(self.0.clone())).map_err(|e| {
            VmError::Serialization(format!(
                "VM '{}' cannot be read as a typed specification: {}",
                self.name().unwrap_or("<unnamed>"),
                e
            ))
        })
    }
}

/// A schema-valid template, split by kind.
#[derive(Debug, Clone, PartialEq)]
pub enum TemplateDocument {
    Single {
        api_version: String,
        resource: ResourceSpec,
    },
    Set {
        api_version: String,
        defaults: ResourceSpec,
        resources: Vec<ResourceSpec>,
    },
}

impl TemplateDocument {
    /// Splits a tree that has already passed schema validation.
    pub fn from_validated(mut root: Mapping) -> Result<Self> {
        let mut report = ViolationReport::new();
        let path = FieldPath::root();

        let api_version = root
            .get(KEY_API_VERSION)
            .and_then(Value::as_str)
            .unwrap_or(API_VERSION)
            .to_string();
        let kind = root
            .get(KEY_KIND)
            .and_then(Value::as_str)
            .and_then(|k| k.parse::<TemplateKind>().ok());

        match kind {
            Some(TemplateKind::VirtualMachine) => match root.shift_remove(KEY_RESOURCE) {
                Some(Value::Mapping(resource)) => {
                    return Ok(TemplateDocument::Single {
                        api_version,
                        resource: ResourceSpec(resource),
                    })
                }
                _ => report.add(&path.key(KEY_RESOURCE), "expected a mapping"),
            },
            Some(TemplateKind::VirtualMachineSet) => {
                let defaults = match root.shift_remove(KEY_RESOURCE_DEFAULTS) {
                    Some(Value::Mapping(defaults)) => defaults,
                    _ => Mapping::new(),
                };
                match root.shift_remove(KEY_RESOURCE_LIST) {
                    Some(Value::Sequence(items)) => {
                        let resources = items
                            .into_iter()
                            .filter_map(|item| match item {
                                Value::Mapping(m) => Some(ResourceSpec(m)),
                                _ => None,
                            })
                            .collect();
                        return Ok(TemplateDocument::Set {
                            api_version,
                            defaults: ResourceSpec(defaults),
                            resources,
                        });
                    }
                    _ => report.add(&path.key(KEY_RESOURCE_LIST), "expected a sequence"),
                }
            }
            None => report.add(&path.key(KEY_KIND), "unknown template kind"),
        }

        report.into_result()?;
        Err(VmError::StructuralParse(
            "template could not be split by kind".to_string(),
        ))
    }

    pub fn kind(&self) -> TemplateKind {
        match self {
            TemplateDocument::Single { .. } => TemplateKind::VirtualMachine,
            TemplateDocument::Set { .. } => TemplateKind::VirtualMachineSet,
        }
    }
}

/// The fully resolved, merged and unit-normalized result of a load.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedTemplate {
    pub api_version: String,
    pub kind: TemplateKind,
    /// One entry for a single-VM document, one per list entry for a set.
    pub resources: Vec<ResourceSpec>,
}

impl ResolvedTemplate {
    /// Renders the result as a document mapping for downstream consumers.
    ///
    /// Sets are emitted with their merged `resourceList` and no `resourceDefaults`.
    pub fn to_value(&self) -> Value {
        let mut root = Mapping::new();
        root.insert(
            Value::String(KEY_API_VERSION.into()),
            Value::String(self.api_version.clone()),
        );
        root.insert(
            Value::String(KEY_KIND.into()),
            Value::String(self.kind.as_str().into()),
        );
        match self.kind {
            TemplateKind::VirtualMachine => {
                let resource = self
                    .resources
                    .first()
                    .map(|r| Value::Mapping(r.as_mapping().clone()))
                    .unwrap_or(Value::Mapping(Mapping::new()));
                root.insert(Value::String(KEY_RESOURCE.into()), resource);
            }
            TemplateKind::VirtualMachineSet => {
                let list = self
                    .resources
                    .iter()
                    .map(|r| Value::Mapping(r.as_mapping().clone()))
                    .collect();
                root.insert(
                    Value::String(KEY_RESOURCE_LIST.into()),
                    Value::Sequence(list),
                );
            }
        }
        Value::Mapping(root)
    }

    pub fn vm_specs(&self) -> Result<Vec<VmSpec>> {
        self.resources.iter().map(ResourceSpec::to_vm_spec).collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OsFamily {
    Linux,
    Windows,
    Bsd,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiskInterface {
    #[default]
    Virtio,
    Scsi,
    Ide,
    Sata,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NicModel {
    #[default]
    Virtio,
    E1000,
    Rtl8139,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceKind {
    Gpu,
    Usb,
    Serial,
    Tpm,
}

/// Typed VM specification. Sizes are canonical: `ram` in megabytes,
/// `disk_size` and volume sizes in gigabytes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VmSpec {
    pub name: String,
    pub os_family: OsFamily,
    pub os_version: Option<String>,
    pub description: Option<String>,
    #[serde(default = "default_cpus")]
    pub cpus: u32,
    #[serde(default = "default_ram")]
    pub ram: u64,
    #[serde(default = "default_disk_size")]
    pub disk_size: u64,
    #[serde(default)]
    pub autostart: bool,
    #[serde(default)]
    pub labels: IndexMap<String, String>,
    #[serde(default)]
    pub volumes: Vec<Volume>,
    #[serde(default)]
    pub interfaces: Vec<NetworkInterface>,
    #[serde(default)]
    pub devices: Vec<Device>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Volume {
    pub name: String,
    pub size: u64,
    #[serde(default)]
    pub interface: DiskInterface,
    #[serde(default)]
    pub readonly: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkInterface {
    pub network: String,
    #[serde(default)]
    pub model: NicModel,
    pub mac: Option<String>,
    pub ip: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Device {
    #[serde(rename = "type")]
    pub kind: DeviceKind,
    pub id: Option<String>,
}

fn default_cpus() -> u32 {
    DEFAULT_CPUS
}

fn default_ram() -> u64 {
    DEFAULT_RAM_MB
}

fn default_disk_size() -> u64 {
    DEFAULT_DISK_GB
}
