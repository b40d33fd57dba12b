//! Error types for Ember

use thiserror::Error;

/// The main error type for Ember operations
#[derive(Debug, Error)]
pub enum EmberError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Value out of range: {field} must be between {min} and {max}, got {value}")]
    ValueOutOfRange {
        field: String,
        min: f64,
        max: f64,
        value: f64,
    },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParseError(String),

    #[error("TOML serialization error: {0}")]
    TomlSerError(String),

    #[error("Shader compile error ({stage}): {message}")]
    ShaderCompile { stage: String, message: String },

    #[error("Program link error: {0}")]
    ProgramLink(String),

    #[error("Unknown program handle: {0}")]
    UnknownProgram(u32),
}

/// Result type alias for Ember operations
pub type Result<T> = std::result::Result<T, EmberError>;

impl From<toml::de::Error> for EmberError {
    fn from(err: toml::de::Error) -> Self {
        EmberError::TomlParseError(err.to_string())
    }
}

impl From<toml::ser::Error> for EmberError {
    fn from(err: toml::ser::Error) -> Self {
        EmberError::TomlSerError(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn out_of_range_message_names_the_field() {
        let err = EmberError::ValueOutOfRange {
            field: "simulation.particle_count".into(),
            min: 1.0,
            max: 1_000_000.0,
            value: 0.0,
        };
        let msg = err.to_string();
        assert!(msg.contains("simulation.particle_count"));
        assert!(msg.contains("got 0"));
    }

    #[test]
    fn toml_errors_convert() {
        let parse: std::result::Result<toml::Value, _> = toml::from_str("= broken");
        let err: EmberError = parse.unwrap_err().into();
        assert!(matches!(err, EmberError::TomlParseError(_)));
    }
}
