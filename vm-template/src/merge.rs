use serde_yaml_ng::Mapping;
use tracing::debug;

use crate::model::ResourceSpec;

/// Overlays per-VM specifications onto the shared defaults of a set document.
///
/// The merge is shallow: each top-level field an instance declares replaces
/// the default wholesale, including collections such as `volumes`. Fields the
/// instance omits are inherited unchanged.
pub struct DefaultsMerger {
    defaults: ResourceSpec,
}

impl DefaultsMerger {
    pub fn new(defaults: ResourceSpec) -> Self {
        Self { defaults }
    }

    /// Merge one instance over a copy of the defaults.
    pub fn merge(&self, instance: ResourceSpec) -> ResourceSpec {
        let mut merged = self.defaults.as_mapping().clone();
        shallow_merge(&mut merged, instance.into_mapping());
        ResourceSpec::from_mapping(merged)
    }

    /// Merge every instance, preserving list order.
    pub fn merge_all(&self, instances: Vec<ResourceSpec>) -> Vec<ResourceSpec> {
        instances
            .into_iter()
            .map(|instance| {
                let merged = self.merge(instance);
                debug!(
                    "Merged defaults into VM '{}'",
                    merged.name().unwrap_or("<unnamed>")
                );
                merged
            })
            .collect()
    }
}

/// Top-level overlay: overlay values replace base values, nothing recurses.
pub(crate) fn shallow_merge(base: &mut Mapping, overlay: Mapping) {
    for (key, value) in overlay {
        base.insert(key, value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_yaml_ng::Value;

    fn spec(yaml: &str) -> ResourceSpec {
        ResourceSpec::from_mapping(serde_yaml_ng::from_str(yaml).unwrap())
    }

    #[test]
    fn test_instance_fields_win_and_defaults_are_inherited() {
        let merger = DefaultsMerger::new(spec("os_family: linux\nram: 4GB\ncpus: 2\n"));
        let merged = merger.merge_all(vec![spec("name: vm-01\n"), spec("name: vm-02\nram: 8GB\n")]);

        let vm1 = merged[0].as_mapping();
        assert_eq!(vm1["name"], Value::String("vm-01".into()));
        assert_eq!(vm1["ram"], Value::String("4GB".into()));
        assert_eq!(vm1["os_family"], Value::String("linux".into()));

        let vm2 = merged[1].as_mapping();
        assert_eq!(vm2["ram"], Value::String("8GB".into()));
        assert_eq!(vm2["cpus"], Value::Number(2.into()));
    }

    #[test]
    fn test_collections_are_replaced_not_concatenated() {
        let merger = DefaultsMerger::new(spec(
            r#"
volumes:
  - name: shared-data
    size: 10GB
labels:
  team: infra
  tier: web
"#,
        ));
        let merged = merger.merge(spec(
            r#"
name: db
volumes:
  - name: db-data
    size: 100GB
labels:
  tier: db
"#,
        ));

        let volumes = merged.as_mapping()["volumes"].as_sequence().unwrap();
        assert_eq!(volumes.len(), 1);
        assert_eq!(volumes[0]["name"], Value::String("db-data".into()));

        // Nested mappings are replaced too; the merge never recurses.
        let labels = merged.as_mapping()["labels"].as_mapping().unwrap();
        assert_eq!(labels.len(), 1);
        assert!(labels.get("team").is_none());
    }

    #[test]
    fn test_empty_collection_in_instance_clears_default() {
        let merger = DefaultsMerger::new(spec("devices:\n  - type: gpu\n"));
        let merged = merger.merge(spec("name: a\ndevices: []\n"));
        assert_eq!(merged.as_mapping()["devices"], Value::Sequence(vec![]));
    }

    #[test]
    fn test_empty_defaults_leave_instance_unchanged() {
        let instance = spec("name: a\nos_family: windows\n");
        let merged = DefaultsMerger::new(ResourceSpec::default()).merge(instance.clone());
        assert_eq!(merged, instance);
    }

    #[test]
    fn test_defaults_are_not_mutated_between_instances() {
        let merger = DefaultsMerger::new(spec("ram: 4GB\n"));
        let _ = merger.merge(spec("name: a\nram: 16GB\n"));
        let second = merger.merge(spec("name: b\n"));
        assert_eq!(second.as_mapping()["ram"], Value::String("4GB".into()));
    }
}
