//! Literal validation against a [`TypeDescriptor`].

use thiserror::Error;

use crate::types::{parse_scaled, TypeDescriptor, TypeKind};

/// A literal failed one of the declared type restrictions.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("'{value}' is not a valid {kind}")]
    Parse { value: String, kind: TypeKind },

    #[error("'{value}' is out of range {ranges}")]
    Range { value: String, ranges: String },

    #[error("'{value}' does not match pattern '{pattern}'")]
    Pattern { value: String, pattern: String },

    #[error("'{value}' is not one of [{}]", .allowed.join(", "))]
    Enum { value: String, allowed: Vec<String> },

    #[error("'{value}' is not a known identity")]
    Identity { value: String },

    #[error("'{value}' does not match any union member")]
    Union { value: String },
}

/// Check `literal` against every restriction of `ty`.
pub fn validate(ty: &TypeDescriptor, literal: &str) -> Result<(), ValidationError> {
    resolve_member(ty, literal).map(|_| ())
}

/// Pick the type a literal is stored as.
///
/// Non-union types return themselves once the literal validates. Unions try
/// their flattened members in declaration order and the first success wins.
pub fn resolve_member<'a>(
    ty: &'a TypeDescriptor,
    literal: &str,
) -> Result<&'a TypeDescriptor, ValidationError> {
    if ty.base != TypeKind::Union {
        validate_scalar(ty, literal)?;
        return Ok(ty);
    }

    let members = ty.flattened_union();
    let mut matching = members
        .iter()
        .filter(|member| validate_scalar(member, literal).is_ok());
    let first = matching.next().ok_or_else(|| ValidationError::Union {
        value: literal.to_string(),
    })?;
    let others: Vec<String> = matching.map(|m| m.to_string()).collect();
    if !others.is_empty() {
        tracing::warn!(
            literal,
            chosen = %first,
            also_valid = ?others,
            "ambiguous union literal, using the first declared member"
        );
    }
    Ok(*first)
}

fn validate_scalar(ty: &TypeDescriptor, literal: &str) -> Result<(), ValidationError> {
    match ty.base {
        TypeKind::String | TypeKind::Leafref => {
            for (source, regex) in ty.pattern.iter().zip(&ty.patterns) {
                if !regex.is_match(literal) {
                    return Err(ValidationError::Pattern {
                        value: literal.to_string(),
                        pattern: source.clone(),
                    });
                }
            }
            Ok(())
        }
        TypeKind::Boolean => match literal {
            "true" | "false" => Ok(()),
            _ => Err(parse_error(ty, literal)),
        },
        TypeKind::Enumeration => {
            if ty.enums.iter().any(|name| name == literal) {
                Ok(())
            } else {
                Err(ValidationError::Enum {
                    value: literal.to_string(),
                    allowed: ty.enums.clone(),
                })
            }
        }
        TypeKind::Identityref => {
            if ty.identities.iter().any(|id| id.matches(literal)) {
                Ok(())
            } else {
                Err(ValidationError::Identity {
                    value: literal.to_string(),
                })
            }
        }
        kind if kind.is_numeric() => validate_numeric(ty, literal),
        _ => Err(parse_error(ty, literal)),
    }
}

fn validate_numeric(ty: &TypeDescriptor, literal: &str) -> Result<(), ValidationError> {
    let digits = if ty.base == TypeKind::Decimal64 {
        ty.fraction_digits
    } else {
        0
    };
    let value = parse_scaled(literal, digits).ok_or_else(|| parse_error(ty, literal))?;
    let (lo, hi) = ty
        .base
        .numeric_bounds()
        .ok_or_else(|| parse_error(ty, literal))?;
    if value < lo || value > hi {
        return Err(parse_error(ty, literal));
    }
    if !ty.ranges.is_empty() && !ty.ranges.iter().any(|r| r.contains(value)) {
        return Err(ValidationError::Range {
            value: literal.to_string(),
            ranges: ty.range.join(" | "),
        });
    }
    Ok(())
}

fn parse_error(ty: &TypeDescriptor, literal: &str) -> ValidationError {
    ValidationError::Parse {
        value: literal.to_string(),
        kind: ty.base,
    }
}
