//! Settings error types.

use std::path::PathBuf;

use thiserror::Error;

/// Why the service configuration could not be assembled.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// The config file exists but could not be read.
    #[error("cannot read config file {}: {source}", path.display())]
    Read {
        /// File named by `--config` or `TUBESCRIBE_CONFIG`.
        path: PathBuf,
        /// Underlying I/O failure.
        source: std::io::Error,
    },
    /// The config file is not valid JSON.
    #[error("config file {} is not valid JSON: {source}", path.display())]
    Parse {
        /// File named by `--config` or `TUBESCRIBE_CONFIG`.
        path: PathBuf,
        /// Parser error with line and column.
        source: serde_json::Error,
    },
    /// The merged layers have a value of the wrong shape for some key.
    #[error("config does not fit the settings schema: {0}")]
    Schema(#[from] serde_json::Error),
    /// A value failed validation after every layer was applied.
    #[error("invalid {field}: {reason}")]
    Invalid {
        /// Dotted camelCase key, as written in the config file.
        field: &'static str,
        /// What the value must satisfy.
        reason: &'static str,
    },
}

/// Result type for settings operations.
pub type Result<T> = std::result::Result<T, SettingsError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_error_names_the_file() {
        let err = SettingsError::Read {
            path: PathBuf::from("/etc/tubescribe.json"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        assert_eq!(
            err.to_string(),
            "cannot read config file /etc/tubescribe.json: denied"
        );
    }

    #[test]
    fn parse_error_names_the_file() {
        let source = serde_json::from_str::<serde_json::Value>("{bad").unwrap_err();
        let err = SettingsError::Parse {
            path: PathBuf::from("tubescribe.json"),
            source,
        };
        assert!(err.to_string().starts_with("config file tubescribe.json is not valid JSON"));
    }

    #[test]
    fn invalid_names_the_field() {
        let err = SettingsError::Invalid {
            field: "server.apiToken",
            reason: "must not be empty",
        };
        assert_eq!(err.to_string(), "invalid server.apiToken: must not be empty");
    }

    #[test]
    fn schema_error_from_conversion() {
        let json_err = serde_json::from_str::<u16>("\"x\"").unwrap_err();
        let err: SettingsError = json_err.into();
        assert!(matches!(err, SettingsError::Schema(_)));
    }
}
