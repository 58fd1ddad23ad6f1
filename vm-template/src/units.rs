// Size string parsing and unit normalization for VM specifications.
//
// Size-bearing fields accept either a plain integer (already in the field's
// canonical unit) or a size string such as "4GB", "512 MB" or "1.5TB".
// Memory is normalized to megabytes and storage to gigabytes. Units are binary
// multiples (1 GB = 1024 MB) and fractional results round up.

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use serde_yaml_ng::Value;

use crate::model::ResourceSpec;
use vm_core::error::{Result, VmError};

/// Pattern every size string must match. The unit suffix is case-sensitive.
pub const SIZE_PATTERN: &str = r"^\d+(\.\d+)?\s*(MB|GB|TB)$";

// Keeps the fixed-point arithmetic inside u128.
const MAX_FRACTION_DIGITS: usize = 18;

static SIZE_RE: OnceLock<Regex> = OnceLock::new();

fn size_regex() -> &'static Regex {
    SIZE_RE.get_or_init(|| {
        Regex::new(r"^(\d+)(?:\.(\d+))?\s*(MB|GB|TB)$").expect("size pattern is valid")
    })
}

/// Returns `true` when `s` is a well-formed size string.
pub fn is_size_string(s: &str) -> bool {
    size_regex().is_match(s)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizeUnit {
    Megabytes,
    Gigabytes,
    Terabytes,
}

impl SizeUnit {
    fn in_megabytes(self) -> u128 {
        match self {
            SizeUnit::Megabytes => 1,
            SizeUnit::Gigabytes => 1024,
            SizeUnit::Terabytes => 1024 * 1024,
        }
    }
}

impl fmt::Display for SizeUnit {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let suffix = match self {
            SizeUnit::Megabytes => "MB",
            SizeUnit::Gigabytes => "GB",
            SizeUnit::Terabytes => "TB",
        };
        write!(f, "{}", suffix)
    }
}

/// A parsed size string, stored as an exact decimal `mantissa / 10^scale` of `unit`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Size {
    mantissa: u128,
    scale: u32,
    unit: SizeUnit,
}

impl Size {
    pub fn parse(s: &str) -> std::result::Result<Self, String> {
        let caps = size_regex()
            .captures(s)
            .ok_or_else(|| format!("'{}' does not match {}", s, SIZE_PATTERN))?;

        let whole = &caps[1];
        let fraction = caps.get(2).map(|m| m.as_str()).unwrap_or("");
        if fraction.len() > MAX_FRACTION_DIGITS {
            return Err(format!(
                "'{}' has more than {} decimal places",
                s, MAX_FRACTION_DIGITS
            ));
        }

        let unit = match &caps[3] {
            "MB" => SizeUnit::Megabytes,
            "GB" => SizeUnit::Gigabytes,
            _ => SizeUnit::Terabytes,
        };

        let digits = format!("{}{}", whole, fraction);
        let mantissa = digits
            .parse::<u128>()
            .map_err(|_| format!("'{}' is too large", s))?;

        Ok(Self {
            mantissa,
            scale: fraction.len() as u32,
            unit,
        })
    }

    pub fn unit(&self) -> SizeUnit {
        self.unit
    }

    /// `true` for sizes such as `0GB` or `0.0MB` that convert to nothing in any unit.
    pub fn is_zero(&self) -> bool {
        self.mantissa == 0
    }

    pub fn to_megabytes(&self) -> std::result::Result<u64, String> {
        self.convert(SizeUnit::Megabytes)
    }

    pub fn to_gigabytes(&self) -> std::result::Result<u64, String> {
        self.convert(SizeUnit::Gigabytes)
    }

    fn convert(&self, target: SizeUnit) -> std::result::Result<u64, String> {
        let overflow = || format!("size is too large to express in {}", target);

        let numerator = self
            .mantissa
            .checked_mul(self.unit.in_megabytes())
            .ok_or_else(overflow)?;
        let denominator = 10u128
            .checked_pow(self.scale)
            .and_then(|p| p.checked_mul(target.in_megabytes()))
            .ok_or_else(overflow)?;

        let value = numerator.div_ceil(denominator);
        u64::try_from(value).map_err(|_| overflow())
    }
}

/// Canonical unit a size-bearing field is normalized to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Canonical {
    Megabytes,
    Gigabytes,
}

/// Top-level size fields of a VM specification.
pub const SIZE_FIELDS: &[(&str, Canonical)] = &[
    ("ram", Canonical::Megabytes),
    ("disk_size", Canonical::Gigabytes),
];

/// Size fields inside each entry of the `volumes` collection.
pub const VOLUME_SIZE_FIELDS: &[(&str, Canonical)] = &[("size", Canonical::Gigabytes)];

/// Rewrites every size string in `spec` into its canonical integer.
///
/// Integers and absent fields are left alone.
pub fn convert_units(spec: &mut ResourceSpec) -> Result<()> {
    let mapping = spec.as_mapping_mut();

    for (field, canonical) in SIZE_FIELDS {
        if let Some(value) = mapping.get_mut(*field) {
            convert_value(value, field, *canonical)?;
        }
    }

    if let Some(Value::Sequence(volumes)) = mapping.get_mut("volumes") {
        for (index, volume) in volumes.iter_mut().enumerate() {
            let Value::Mapping(volume) = volume else {
                continue;
            };
            for (field, canonical) in VOLUME_SIZE_FIELDS {
                if let Some(value) = volume.get_mut(*field) {
                    let path = format!("volumes[{}].{}", index, field);
                    convert_value(value, &path, *canonical)?;
                }
            }
        }
    }

    Ok(())
}

fn convert_value(value: &mut Value, field: &str, canonical: Canonical) -> Result<()> {
    let Value::String(raw) = value else {
        return Ok(());
    };
    let raw = raw.clone();

    let unit_error = |reason: String| VmError::UnitParse {
        field: field.to_string(),
        value: raw.clone(),
        reason,
    };

    let size = Size::parse(&raw).map_err(unit_error)?;
    let converted = match canonical {
        Canonical::Megabytes => size.to_megabytes(),
        Canonical::Gigabytes => size.to_gigabytes(),
    }
    .map_err(unit_error)?;

    *value = Value::Number(converted.into());
    Ok(())
}
