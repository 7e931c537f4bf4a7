//! Errors raised while loading and finalizing schema modules.

use std::path::PathBuf;

use crate::types::TypeKind;

/// A schema could not be loaded. Always fatal at startup.
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    #[error("failed to read schema {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse schema module {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("no schema modules found in {0}")]
    Empty(String),

    #[error("duplicate module '{0}'")]
    DuplicateModule(String),

    #[error("unknown typedef '{name}' in module '{module}'")]
    UnknownTypedef { name: String, module: String },

    #[error("unknown identity '{name}' in module '{module}'")]
    UnknownIdentity { name: String, module: String },

    #[error("invalid range '{range}' for type {kind}")]
    Range { range: String, kind: TypeKind },

    #[error("fraction-digits {0} outside 1..=18")]
    FractionDigits(u8),

    #[error("invalid pattern '{pattern}': {message}")]
    Pattern { pattern: String, message: String },

    #[error("list '{list}' declares key '{key}' without a matching leaf")]
    MissingKeyLeaf { list: String, key: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_empty() {
        let err = SchemaError::Empty("./yang".into());
        assert_eq!(err.to_string(), "no schema modules found in ./yang");
    }

    #[test]
    fn error_display_range() {
        let err = SchemaError::Range {
            range: "1..x".into(),
            kind: TypeKind::Uint8,
        };
        assert_eq!(err.to_string(), "invalid range '1..x' for type uint8");
    }

    #[test]
    fn error_display_missing_key_leaf() {
        let err = SchemaError::MissingKeyLeaf {
            list: "user".into(),
            key: "name".into(),
        };
        assert_eq!(
            err.to_string(),
            "list 'user' declares key 'name' without a matching leaf"
        );
    }
}
