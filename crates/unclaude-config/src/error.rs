//! Error type for config loading.

/// Errors raised while loading or validating `config.yaml`/`proactive.yaml`.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("failed to read {path}: {source}")]
    Io {
        /// Path that could not be read.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// The file content is not valid YAML for the target schema.
    #[error("failed to parse {path}: {source}")]
    Parse {
        /// Path that failed to parse.
        path: String,
        /// Underlying YAML error.
        #[source]
        source: serde_yaml::Error,
    },
    /// A recognized field held an invalid value (e.g. an unknown profile name).
    #[error("invalid config value: {0}")]
    Invalid(String),
}

/// Result alias for this crate.
pub type ConfigResult<T> = Result<T, ConfigError>;
