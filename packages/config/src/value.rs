//! Typed leaf values.

use std::fmt;

use serde_json::Value as Json;
use vtyang_schema::{parse_scaled, resolve_member, TypeDescriptor, TypeKind, ValidationError};

/// A leaf value, discriminated by its declared YANG kind.
///
/// Union leaves wrap the value of the member type the literal resolved to,
/// so the declared kind (`Union`) and the resolved kind are both known.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigValue {
    Int8(i8),
    Int16(i16),
    Int32(i32),
    Int64(i64),
    Uint8(u8),
    Uint16(u16),
    Uint32(u32),
    Uint64(u64),
    /// Scaled integer: `value / 10^fraction_digits`.
    Decimal64 { value: i64, fraction_digits: u8 },
    String(String),
    Boolean(bool),
    Enumeration(String),
    Identityref(String),
    Leafref(String),
    Union(Box<ConfigValue>),
}

impl ConfigValue {
    /// Validate `literal` against `ty` and convert it.
    pub fn parse(ty: &TypeDescriptor, literal: &str) -> Result<Self, ValidationError> {
        let member = resolve_member(ty, literal)?;
        Self::parse_resolved(ty, member, literal)
    }

    /// Convert a literal whose union member was already chosen.
    pub fn parse_resolved(
        declared: &TypeDescriptor,
        member: &TypeDescriptor,
        literal: &str,
    ) -> Result<Self, ValidationError> {
        let value = Self::convert(member, literal)?;
        if declared.base == TypeKind::Union {
            Ok(ConfigValue::Union(Box::new(value)))
        } else {
            Ok(value)
        }
    }

    fn convert(ty: &TypeDescriptor, literal: &str) -> Result<Self, ValidationError> {
        let invalid = || ValidationError::Parse {
            value: literal.to_string(),
            kind: ty.base,
        };
        let value = match ty.base {
            TypeKind::Int8 => ConfigValue::Int8(literal.parse().map_err(|_| invalid())?),
            TypeKind::Int16 => ConfigValue::Int16(literal.parse().map_err(|_| invalid())?),
            TypeKind::Int32 => ConfigValue::Int32(literal.parse().map_err(|_| invalid())?),
            TypeKind::Int64 => ConfigValue::Int64(literal.parse().map_err(|_| invalid())?),
            TypeKind::Uint8 => ConfigValue::Uint8(literal.parse().map_err(|_| invalid())?),
            TypeKind::Uint16 => ConfigValue::Uint16(literal.parse().map_err(|_| invalid())?),
            TypeKind::Uint32 => ConfigValue::Uint32(literal.parse().map_err(|_| invalid())?),
            TypeKind::Uint64 => ConfigValue::Uint64(literal.parse().map_err(|_| invalid())?),
            TypeKind::Decimal64 => {
                let scaled = parse_scaled(literal, ty.fraction_digits).ok_or_else(invalid)?;
                ConfigValue::Decimal64 {
                    value: i64::try_from(scaled).map_err(|_| invalid())?,
                    fraction_digits: ty.fraction_digits,
                }
            }
            TypeKind::Boolean => ConfigValue::Boolean(literal.parse().map_err(|_| invalid())?),
            TypeKind::String => ConfigValue::String(literal.to_string()),
            TypeKind::Enumeration => ConfigValue::Enumeration(literal.to_string()),
            TypeKind::Identityref => ConfigValue::Identityref(literal.to_string()),
            TypeKind::Leafref => ConfigValue::Leafref(literal.to_string()),
            TypeKind::Union => return Self::parse(ty, literal),
        };
        Ok(value)
    }

    /// Declared kind; `Union` for union leaves.
    pub fn kind(&self) -> TypeKind {
        match self {
            ConfigValue::Int8(_) => TypeKind::Int8,
            ConfigValue::Int16(_) => TypeKind::Int16,
            ConfigValue::Int32(_) => TypeKind::Int32,
            ConfigValue::Int64(_) => TypeKind::Int64,
            ConfigValue::Uint8(_) => TypeKind::Uint8,
            ConfigValue::Uint16(_) => TypeKind::Uint16,
            ConfigValue::Uint32(_) => TypeKind::Uint32,
            ConfigValue::Uint64(_) => TypeKind::Uint64,
            ConfigValue::Decimal64 { .. } => TypeKind::Decimal64,
            ConfigValue::String(_) => TypeKind::String,
            ConfigValue::Boolean(_) => TypeKind::Boolean,
            ConfigValue::Enumeration(_) => TypeKind::Enumeration,
            ConfigValue::Identityref(_) => TypeKind::Identityref,
            ConfigValue::Leafref(_) => TypeKind::Leafref,
            ConfigValue::Union(_) => TypeKind::Union,
        }
    }

    /// Kind the value is actually stored as.
    pub fn resolved(&self) -> &ConfigValue {
        match self {
            ConfigValue::Union(inner) => inner.resolved(),
            other => other,
        }
    }

    pub fn resolved_kind(&self) -> TypeKind {
        self.resolved().kind()
    }

    /// JSON encoding: integers and booleans stay native, everything else is
    /// a string. Decimal64 is written as its exact scaled text, since a JSON
    /// number would pass through an f64.
    pub fn to_json(&self) -> Json {
        match self.resolved() {
            ConfigValue::Int8(v) => Json::from(*v),
            ConfigValue::Int16(v) => Json::from(*v),
            ConfigValue::Int32(v) => Json::from(*v),
            ConfigValue::Int64(v) => Json::from(*v),
            ConfigValue::Uint8(v) => Json::from(*v),
            ConfigValue::Uint16(v) => Json::from(*v),
            ConfigValue::Uint32(v) => Json::from(*v),
            ConfigValue::Uint64(v) => Json::from(*v),
            ConfigValue::Boolean(v) => Json::Bool(*v),
            other => Json::String(other.to_string()),
        }
    }

    /// Best-effort conversion of a JSON scalar when no schema is at hand.
    pub fn infer(json: &Json) -> Option<Self> {
        match json {
            Json::Bool(b) => Some(ConfigValue::Boolean(*b)),
            Json::String(s) => Some(ConfigValue::String(s.clone())),
            Json::Number(n) => {
                if let Some(v) = n.as_i64() {
                    Some(ConfigValue::Int64(v))
                } else if let Some(v) = n.as_u64() {
                    Some(ConfigValue::Uint64(v))
                } else {
                    let text = n.to_string();
                    let digits = text
                        .split_once('.')
                        .map(|(_, frac)| frac.len())
                        .unwrap_or(0);
                    let fraction_digits = u8::try_from(digits).ok()?;
                    let scaled = parse_scaled(&text, fraction_digits)?;
                    Some(ConfigValue::Decimal64 {
                        value: i64::try_from(scaled).ok()?,
                        fraction_digits,
                    })
                }
            }
            Json::Null | Json::Array(_) | Json::Object(_) => None,
        }
    }

    /// Literal form of a JSON scalar, suitable for [`ConfigValue::parse`].
    pub fn json_literal(json: &Json) -> Option<String> {
        match json {
            Json::Bool(b) => Some(b.to_string()),
            Json::Number(n) => Some(n.to_string()),
            Json::String(s) => Some(s.clone()),
            Json::Null | Json::Array(_) | Json::Object(_) => None,
        }
    }
}

impl fmt::Display for ConfigValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigValue::Int8(v) => write!(f, "{}", v),
            ConfigValue::Int16(v) => write!(f, "{}", v),
            ConfigValue::Int32(v) => write!(f, "{}", v),
            ConfigValue::Int64(v) => write!(f, "{}", v),
            ConfigValue::Uint8(v) => write!(f, "{}", v),
            ConfigValue::Uint16(v) => write!(f, "{}", v),
            ConfigValue::Uint32(v) => write!(f, "{}", v),
            ConfigValue::Uint64(v) => write!(f, "{}", v),
            ConfigValue::Boolean(v) => write!(f, "{}", v),
            ConfigValue::Decimal64 {
                value,
                fraction_digits,
            } => {
                let sign = if *value < 0 { "-" } else { "" };
                let magnitude = value.unsigned_abs();
                if *fraction_digits == 0 {
                    return write!(f, "{}{}", sign, magnitude);
                }
                let width = usize::from(*fraction_digits);
                match 10u64.checked_pow(u32::from(*fraction_digits)) {
                    Some(scale) => write!(
                        f,
                        "{}{}.{:0width$}",
                        sign,
                        magnitude / scale,
                        magnitude % scale,
                        width = width
                    ),
                    // Every u64 is below 10^20.
                    None => write!(f, "{}0.{:0width$}", sign, magnitude, width = width),
                }
            }
            ConfigValue::String(s)
            | ConfigValue::Enumeration(s)
            | ConfigValue::Identityref(s)
            | ConfigValue::Leafref(s) => f.write_str(s),
            ConfigValue::Union(inner) => inner.fmt(f),
        }
    }
}
