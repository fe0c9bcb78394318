//! Structured CLI errors with meaningful exit codes.
//!
//! Exit code scheme:
//! - 0:  success
//! - 2:  clap arg parse error (automatic, before our code runs)
//! - 10: field error (grid dimensions, cell sizes, array lengths, mask, advector params)
//! - 11: I/O error (reading a grid, writing output)
//! - 12: input error (malformed JSON, wrong grid kind)
//! - 13: serialization error

use geofield_core::FieldError;
use std::fmt;

/// Errors produced by CLI operations, each mapped to a distinct exit code.
pub enum CliError {
    /// A field-level error raised while building a field, mask or advector.
    Field(FieldError),
    /// An I/O error (file read or write).
    Io(String),
    /// A user input error (malformed JSON, scalar grid where a vector grid is needed).
    Input(String),
    /// A serialization error (JSON output failure).
    Serialization(String),
}

impl CliError {
    /// Returns the process exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Field(_) => 10,
            CliError::Io(_) => 11,
            CliError::Input(_) => 12,
            CliError::Serialization(_) => 13,
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Field(e) => write!(f, "{e}"),
            CliError::Io(msg) => write!(f, "{msg}"),
            CliError::Input(msg) => write!(f, "{msg}"),
            CliError::Serialization(msg) => write!(f, "{msg}"),
        }
    }
}

impl From<FieldError> for CliError {
    fn from(e: FieldError) -> Self {
        CliError::Field(e)
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        CliError::Serialization(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_error_exit_code_is_10() {
        let err = CliError::Field(FieldError::InvalidParams("paths must be at least 1".into()));
        assert_eq!(err.exit_code(), 10);
    }

    #[test]
    fn io_error_exit_code_is_11() {
        let err = CliError::Io("read failed".into());
        assert_eq!(err.exit_code(), 11);
    }

    #[test]
    fn input_error_exit_code_is_12() {
        let err = CliError::Input("not a vector grid".into());
        assert_eq!(err.exit_code(), 12);
    }

    #[test]
    fn serialization_error_exit_code_is_13() {
        let err = CliError::Serialization("json fail".into());
        assert_eq!(err.exit_code(), 13);
    }

    #[test]
    fn from_field_error_keeps_message() {
        let cli_err = CliError::from(FieldError::ComponentMismatch { us: 4, vs: 3 });
        assert_eq!(cli_err.exit_code(), 10);
        assert!(cli_err.to_string().contains('4'));
    }

    #[test]
    fn every_field_error_routes_to_exit_code_10() {
        let errors = [
            FieldError::InvalidDimensions { n_cols: 0, n_rows: 3 },
            FieldError::LengthMismatch { name: "zs", expected: 4, got: 3 },
            FieldError::InvalidMask("ring has 2 positions".into()),
        ];
        for e in errors {
            assert_eq!(CliError::from(e).exit_code(), 10);
        }
    }

    #[test]
    fn from_serde_json_error_routes_to_serialization() {
        let bad_json = serde_json::from_str::<serde_json::Value>("{invalid");
        let cli_err = CliError::from(bad_json.unwrap_err());
        assert_eq!(cli_err.exit_code(), 13);
    }
}
