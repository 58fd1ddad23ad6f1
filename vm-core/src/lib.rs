pub mod error;
pub mod output_macros;
pub mod validation;

pub use error::{Result, VmError};
pub use validation::{FieldPath, PathSegment, Violation, ViolationReport};
