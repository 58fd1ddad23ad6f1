//! Path-qualified validation problems.
//!
//! Validation in the template pipeline gathers every problem it finds before
//! reporting, so these types are built to be collected, sorted and rendered as
//! a single error rather than returned one at a time.

use std::fmt;

use crate::error::{Result, VmError};

/// One step from the document root: a mapping key or a sequence index.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PathSegment {
    Key(String),
    Index(usize),
}

/// A location inside a document, rendered as `resource.volumes[0].size`.
/// The empty path renders as `(root)`.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FieldPath(Vec<PathSegment>);

impl FieldPath {
    pub fn root() -> Self {
        Self(Vec::new())
    }

    /// Returns a new path extended by a mapping key.
    pub fn key(&self, key: impl Into<String>) -> Self {
        let mut segments = self.0.clone();
        segments.push(PathSegment::Key(key.into()));
        Self(segments)
    }

    /// Returns a new path extended by a sequence index.
    pub fn index(&self, index: usize) -> Self {
        let mut segments = self.0.clone();
        segments.push(PathSegment::Index(index));
        Self(segments)
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.0.is_empty() {
            return write!(f, "(root)");
        }
        for (i, segment) in self.0.iter().enumerate() {
            match segment {
                PathSegment::Key(key) if i == 0 => write!(f, "{}", key)?,
                PathSegment::Key(key) => write!(f, ".{}", key)?,
                PathSegment::Index(index) => write!(f, "[{}]", index)?,
            }
        }
        Ok(())
    }
}

/// A single schema violation.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct Violation {
    pub path: FieldPath,
    pub message: String,
}

impl Violation {
    pub fn new(path: FieldPath, message: impl Into<String>) -> Self {
        Self {
            path,
            message: message.into(),
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

/// Accumulates violations during one validation pass.
#[derive(Debug, Default)]
pub struct ViolationReport {
    violations: Vec<Violation>,
}

impl ViolationReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, path: &FieldPath, message: impl Into<String>) {
        self.violations.push(Violation::new(path.clone(), message));
    }

    pub fn len(&self) -> usize {
        self.violations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.violations.is_empty()
    }

    /// Consumes the report, failing with every violation sorted by path.
    pub fn into_result(mut self) -> Result<()> {
        if self.violations.is_empty() {
            return Ok(());
        }
        self.violations.sort();
        self.violations.dedup();
        Err(VmError::SchemaValidation(self.violations))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_rendering() {
        assert_eq!(FieldPath::root().to_string(), "(root)");
        let path = FieldPath::root()
            .key("resourceList")
            .index(2)
            .key("volumes")
            .index(0)
            .key("size");
        assert_eq!(path.to_string(), "resourceList[2].volumes[0].size");
    }

    #[test]
    fn test_report_sorts_by_path() {
        let mut report = ViolationReport::new();
        let resource = FieldPath::root().key("resource");
        report.add(&resource.key("ram"), "bad ram");
        report.add(&FieldPath::root(), "'kind' is a required property");
        report.add(&resource.key("cpus"), "bad cpus");

        match report.into_result() {
            Err(VmError::SchemaValidation(violations)) => {
                let rendered: Vec<String> = violations.iter().map(|v| v.to_string()).collect();
                assert_eq!(
                    rendered,
                    vec![
                        "(root): 'kind' is a required property",
                        "resource.cpus: bad cpus",
                        "resource.ram: bad ram",
                    ]
                );
            }
            other => panic!("expected schema validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_indices_sort_numerically() {
        let mut report = ViolationReport::new();
        let list = FieldPath::root().key("resourceList");
        report.add(&list.index(10), "ten");
        report.add(&list.index(2), "two");

        let Err(VmError::SchemaValidation(violations)) = report.into_result() else {
            panic!("expected violations");
        };
        assert_eq!(violations[0].message, "two");
        assert_eq!(violations[1].message, "ten");
    }

    #[test]
    fn test_empty_report_is_ok() {
        let report = ViolationReport::new();
        assert!(report.is_empty());
        assert_eq!(report.len(), 0);
        assert!(report.into_result().is_ok());
    }

    #[test]
    fn test_identical_violations_are_reported_once() {
        let mut report = ViolationReport::new();
        let path = FieldPath::root().key("resource");
        report.add(&path, "'name' is a required property");
        report.add(&path, "'name' is a required property");
        assert_eq!(report.len(), 2);

        let Err(VmError::SchemaValidation(violations)) = report.into_result() else {
            panic!("expected violations");
        };
        assert_eq!(violations.len(), 1);
    }
}
