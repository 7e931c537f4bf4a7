//! Type descriptors for leaf and leaf-list entries.

use std::fmt;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::SchemaError;

/// Built-in YANG base types understood by the engine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TypeKind {
    Int8,
    Int16,
    Int32,
    Int64,
    Uint8,
    Uint16,
    Uint32,
    Uint64,
    Decimal64,
    #[default]
    String,
    Boolean,
    Enumeration,
    Identityref,
    Leafref,
    Union,
}

impl TypeKind {
    pub fn name(self) -> &'static str {
        match self {
            TypeKind::Int8 => "int8",
            TypeKind::Int16 => "int16",
            TypeKind::Int32 => "int32",
            TypeKind::Int64 => "int64",
            TypeKind::Uint8 => "uint8",
            TypeKind::Uint16 => "uint16",
            TypeKind::Uint32 => "uint32",
            TypeKind::Uint64 => "uint64",
            TypeKind::Decimal64 => "decimal64",
            TypeKind::String => "string",
            TypeKind::Boolean => "boolean",
            TypeKind::Enumeration => "enumeration",
            TypeKind::Identityref => "identityref",
            TypeKind::Leafref => "leafref",
            TypeKind::Union => "union",
        }
    }

    /// True for the fixed-width integer kinds.
    pub fn is_integer(self) -> bool {
        self.integer_bounds().is_some()
    }

    /// True for every kind subject to range restrictions.
    pub fn is_numeric(self) -> bool {
        self.is_integer() || self == TypeKind::Decimal64
    }

    /// Inclusive value bounds for integer kinds.
    pub fn integer_bounds(self) -> Option<(i128, i128)> {
        let bounds = match self {
            TypeKind::Int8 => (i8::MIN as i128, i8::MAX as i128),
            TypeKind::Int16 => (i16::MIN as i128, i16::MAX as i128),
            TypeKind::Int32 => (i32::MIN as i128, i32::MAX as i128),
            TypeKind::Int64 => (i64::MIN as i128, i64::MAX as i128),
            TypeKind::Uint8 => (0, u8::MAX as i128),
            TypeKind::Uint16 => (0, u16::MAX as i128),
            TypeKind::Uint32 => (0, u32::MAX as i128),
            TypeKind::Uint64 => (0, u64::MAX as i128),
            _ => return None,
        };
        Some(bounds)
    }

    /// Bounds of the scaled representation; decimal64 is stored in an i64.
    pub fn numeric_bounds(self) -> Option<(i128, i128)> {
        match self {
            TypeKind::Decimal64 => Some((i64::MIN as i128, i64::MAX as i128)),
            _ => self.integer_bounds(),
        }
    }
}

impl fmt::Display for TypeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A member of an identity set, always qualified by its defining module.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Identity {
    pub module: String,
    pub name: String,
}

impl Identity {
    /// Accepts either the bare name or the `module:name` form.
    pub fn matches(&self, literal: &str) -> bool {
        match literal.split_once(':') {
            Some((module, name)) => module == self.module && name == self.name,
            None => literal == self.name,
        }
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.module, self.name)
    }
}

/// An inclusive numeric interval over the scaled representation of a kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NumericRange {
    pub min: i128,
    pub max: i128,
}

impl NumericRange {
    pub fn contains(&self, value: i128) -> bool {
        self.min <= value && value <= self.max
    }
}

/// Type of a leaf or leaf-list, as declared and after finalization.
///
/// The serialized fields mirror the compiled module format. The skipped
/// fields are filled in by [`TypeDescriptor::finalize`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct TypeDescriptor {
    #[serde(default)]
    pub base: TypeKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub typedef: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub enums: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identity_base: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub identities: Vec<Identity>,
    #[serde(default, rename = "union", skip_serializing_if = "Vec::is_empty")]
    pub members: Vec<TypeDescriptor>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub range: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub pattern: Vec<String>,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub fraction_digits: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    #[serde(skip)]
    pub ranges: Vec<NumericRange>,
    #[serde(skip)]
    pub patterns: Vec<Regex>,
}

fn is_zero(n: &u8) -> bool {
    *n == 0
}

impl TypeDescriptor {
    pub fn new(base: TypeKind) -> Self {
        Self {
            base,
            ..Self::default()
        }
    }

    pub fn with_enums(mut self, names: &[&str]) -> Self {
        self.enums = names.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn with_range(mut self, range: &str) -> Self {
        self.range.push(range.to_string());
        self
    }

    pub fn with_pattern(mut self, pattern: &str) -> Self {
        self.pattern.push(pattern.to_string());
        self
    }

    pub fn with_identities(mut self, identities: Vec<Identity>) -> Self {
        self.identities = identities;
        self
    }

    pub fn with_members(mut self, members: Vec<TypeDescriptor>) -> Self {
        self.members = members;
        self
    }

    pub fn with_fraction_digits(mut self, digits: u8) -> Self {
        self.fraction_digits = digits;
        self
    }

    /// Parse declared ranges and compile patterns, recursively for union
    /// members. Idempotent.
    pub fn finalize(&mut self) -> Result<(), SchemaError> {
        if self.base == TypeKind::Decimal64 && !(1..=18).contains(&self.fraction_digits) {
            return Err(SchemaError::FractionDigits(self.fraction_digits));
        }
        self.ranges.clear();
        for spec in &self.range {
            for part in spec.split('|') {
                self.ranges.push(parse_range(part.trim(), self)?);
            }
        }
        self.patterns.clear();
        for pattern in &self.pattern {
            let anchored = format!("^(?:{})$", pattern);
            let regex = Regex::new(&anchored).map_err(|e| SchemaError::Pattern {
                pattern: pattern.clone(),
                message: e.to_string(),
            })?;
            self.patterns.push(regex);
        }
        for member in &mut self.members {
            member.finalize()?;
        }
        Ok(())
    }

    /// Flatten nested unions into their leaf member types, in declaration order.
    pub fn flattened_union(&self) -> Vec<&TypeDescriptor> {
        let mut out = Vec::new();
        let mut stack = vec![self];
        while let Some(ty) = stack.pop() {
            if ty.base == TypeKind::Union {
                stack.extend(ty.members.iter().rev());
            } else {
                out.push(ty);
            }
        }
        out
    }
}

impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.typedef {
            Some(name) => write!(f, "{} ({})", name, self.base),
            None => write!(f, "{}", self.base),
        }
    }
}

fn parse_range(part: &str, ty: &TypeDescriptor) -> Result<NumericRange, SchemaError> {
    let invalid = || SchemaError::Range {
        range: part.to_string(),
        kind: ty.base,
    };
    let (lo, hi) = ty.base.numeric_bounds().ok_or_else(invalid)?;
    let bound = |text: &str| -> Result<i128, SchemaError> {
        match text.trim() {
            "min" => Ok(lo),
            "max" => Ok(hi),
            literal => parse_scaled(literal, ty.fraction_digits).ok_or_else(invalid),
        }
    };
    let (min, max) = match part.split_once("..") {
        Some((min, max)) => (bound(min)?, bound(max)?),
        None => {
            let value = bound(part)?;
            (value, value)
        }
    };
    if min > max {
        return Err(invalid());
    }
    Ok(NumericRange { min, max })
}

/// Parse a decimal literal into an integer scaled by `10^fraction_digits`.
///
/// Returns `None` for malformed input, for more fractional digits than
/// allowed, or on overflow.
pub fn parse_scaled(literal: &str, fraction_digits: u8) -> Option<i128> {
    let (negative, digits) = match literal.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, literal.strip_prefix('+').unwrap_or(literal)),
    };
    let (int_part, frac_part) = match digits.split_once('.') {
        Some((int_part, frac_part)) if !frac_part.is_empty() => (int_part, frac_part),
        Some(_) => return None,
        None => (digits, ""),
    };
    if int_part.is_empty()
        || !int_part.bytes().all(|b| b.is_ascii_digit())
        || !frac_part.bytes().all(|b| b.is_ascii_digit())
        || frac_part.len() > fraction_digits as usize
    {
        return None;
    }

    let mut scaled: i128 = int_part.parse().ok()?;
    for _ in 0..fraction_digits {
        scaled = scaled.checked_mul(10)?;
    }
    if !frac_part.is_empty() {
        let mut frac: i128 = frac_part.parse().ok()?;
        for _ in frac_part.len()..fraction_digits as usize {
            frac = frac.checked_mul(10)?;
        }
        scaled = scaled.checked_add(frac)?;
    }
    Some(if negative { -scaled } else { scaled })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn type_kind_serde_names() {
        let kind: TypeKind = serde_json::from_str("\"uint64\"").unwrap();
        assert_eq!(kind, TypeKind::Uint64);
        let kind: TypeKind = serde_json::from_str("\"decimal64\"").unwrap();
        assert_eq!(kind, TypeKind::Decimal64);
        assert_eq!(TypeKind::Identityref.to_string(), "identityref");
    }

    #[test]
    fn parse_scaled_values() {
        assert_eq!(parse_scaled("12", 0), Some(12));
        assert_eq!(parse_scaled("-12", 0), Some(-12));
        assert_eq!(parse_scaled("1.5", 2), Some(150));
        assert_eq!(parse_scaled("-0.05", 2), Some(-5));
        assert_eq!(parse_scaled("3", 2), Some(300));
        assert_eq!(parse_scaled("1.234", 2), None);
        assert_eq!(parse_scaled("1.", 2), None);
        assert_eq!(parse_scaled("abc", 0), None);
        assert_eq!(parse_scaled("", 0), None);
        assert_eq!(parse_scaled("1.5", 0), None);
    }

    #[test]
    fn finalize_parses_ranges() {
        let mut ty = TypeDescriptor::new(TypeKind::Uint8).with_range("1..10 | 20..max");
        ty.finalize().unwrap();
        assert_eq!(
            ty.ranges,
            vec![
                NumericRange { min: 1, max: 10 },
                NumericRange { min: 20, max: 255 }
            ]
        );
    }

    #[test]
    fn finalize_scales_decimal_ranges() {
        let mut ty = TypeDescriptor::new(TypeKind::Decimal64)
            .with_fraction_digits(2)
            .with_range("0..100.5");
        ty.finalize().unwrap();
        assert_eq!(ty.ranges, vec![NumericRange { min: 0, max: 10050 }]);
    }

    #[test]
    fn finalize_rejects_bad_range() {
        let mut ty = TypeDescriptor::new(TypeKind::Int8).with_range("10..1");
        assert!(matches!(ty.finalize(), Err(SchemaError::Range { .. })));

        let mut ty = TypeDescriptor::new(TypeKind::String).with_range("1..2");
        assert!(ty.finalize().is_err());
    }

    #[test]
    fn finalize_rejects_fraction_digits_out_of_range() {
        for digits in [0, 19, 20] {
            let mut ty = TypeDescriptor::new(TypeKind::Decimal64).with_fraction_digits(digits);
            assert!(matches!(
                ty.finalize(),
                Err(SchemaError::FractionDigits(d)) if d == digits
            ));
        }
        let mut ty = TypeDescriptor::new(TypeKind::Decimal64).with_fraction_digits(18);
        ty.finalize().unwrap();
    }

    #[test]
    fn finalize_anchors_patterns() {
        let mut ty = TypeDescriptor::new(TypeKind::String).with_pattern("[a-z]+");
        ty.finalize().unwrap();
        assert!(ty.patterns[0].is_match("abc"));
        assert!(!ty.patterns[0].is_match("abc1"));
    }

    #[test]
    fn flattened_union_keeps_declaration_order() {
        let ty = TypeDescriptor::new(TypeKind::Union).with_members(vec![
            TypeDescriptor::new(TypeKind::Uint8),
            TypeDescriptor::new(TypeKind::Union).with_members(vec![
                TypeDescriptor::new(TypeKind::Boolean),
                TypeDescriptor::new(TypeKind::Enumeration).with_enums(&["auto"]),
            ]),
            TypeDescriptor::new(TypeKind::String),
        ]);
        let kinds: Vec<TypeKind> = ty.flattened_union().iter().map(|t| t.base).collect();
        assert_eq!(
            kinds,
            vec![
                TypeKind::Uint8,
                TypeKind::Boolean,
                TypeKind::Enumeration,
                TypeKind::String
            ]
        );
    }

    #[test]
    fn identity_matching() {
        let id = Identity {
            module: "main".into(),
            name: "aes".into(),
        };
        assert!(id.matches("aes"));
        assert!(id.matches("main:aes"));
        assert!(!id.matches("other:aes"));
        assert_eq!(id.to_string(), "main:aes");
    }
}
