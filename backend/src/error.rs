//! Error types for the question bank conversion pipeline.
//!
//! Three classes of failure exist:
//!
//! - [`RowError`] - one question could not be converted; it is logged and the
//!   run continues without it
//! - [`ConvertError`] - structural or I/O failure; the run halts and no output
//!   file is produced
//! - [`ServerError`] - HTTP API failures wrapping the above
//!
//! Error conversion is automatic via `From` implementations,
//! allowing `?` to work across error boundaries.

use serde::Serialize;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

// =============================================================================
// Row Errors (recoverable)
// =============================================================================

/// A recoverable, single-row conversion failure.
///
/// `line` is the physical line of the source file (the header is line 1).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RowError {
    pub line: u64,
    pub column: Option<String>,
    pub value: Option<String>,
    pub message: String,
}

impl fmt::Display for RowError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.column, &self.value) {
            (Some(col), Some(val)) => {
                write!(f, "Row {}, column '{}' (value '{}'): {}", self.line, col, val, self.message)
            }
            (Some(col), None) => {
                write!(f, "Row {}, column '{}': {}", self.line, col, self.message)
            }
            (None, Some(val)) => {
                write!(f, "Row {} (value '{}'): {}", self.line, val, self.message)
            }
            (None, None) => write!(f, "Row {}: {}", self.line, self.message),
        }
    }
}

impl std::error::Error for RowError {}

impl RowError {
    pub fn new(line: u64, message: impl Into<String>) -> Self {
        Self {
            line,
            column: None,
            value: None,
            message: message.into(),
        }
    }

    pub fn with_column(mut self, column: impl Into<String>) -> Self {
        self.column = Some(column.into());
        self
    }

    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }
}

// =============================================================================
// Conversion Errors (fatal)
// =============================================================================

/// Fatal errors that halt a conversion run.
#[derive(Debug, Error)]
pub enum ConvertError {
    /// One or more required columns are absent from the header.
    #[error("Missing required column(s): {} (found: {})", .missing.join(", "), .found.join(", "))]
    MissingColumns {
        missing: Vec<String>,
        found: Vec<String>,
    },

    /// The file has no header row at all.
    #[error("CSV file is empty (no header row)")]
    EmptyFile,

    /// The CSV reader could not tokenize the file.
    #[error("Malformed CSV at line {line}: {message}")]
    Malformed { line: u64, message: String },

    /// Input file could not be read.
    #[error("Cannot read '{}': {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Output file could not be written.
    #[error("Cannot write '{}': {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Refused to replace an existing output file.
    #[error("Output file already exists: {}", .0.display())]
    OutputExists(PathBuf),

    /// CSV serialization error while rendering the output.
    #[error("CSV write error: {0}")]
    Csv(#[from] csv::Error),
}

impl ConvertError {
    /// Structural errors come from the shape of the input, not the environment.
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            ConvertError::MissingColumns { .. } | ConvertError::EmptyFile | ConvertError::Malformed { .. }
        )
    }

    /// I/O errors come from the filesystem.
    pub fn is_io(&self) -> bool {
        matches!(
            self,
            ConvertError::Read { .. } | ConvertError::Write { .. } | ConvertError::OutputExists(_) | ConvertError::Csv(_)
        )
    }
}

// =============================================================================
// Server Errors
// =============================================================================

/// HTTP server errors.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Conversion error.
    #[error("{0}")]
    Convert(#[from] ConvertError),

    /// Invalid request.
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Server internal error.
    #[error("Internal server error: {0}")]
    Internal(String),
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for conversion operations.
pub type ConvertResult<T> = Result<T, ConvertError>;

/// Result type for server operations.
pub type ServerResult<T> = Result<T, ServerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_error_message_format() {
        let err = RowError::new(5, "unknown difficulty label")
            .with_column("LEVEL")
            .with_value("Extreme");

        let msg = err.to_string();
        assert!(msg.contains("Row 5"));
        assert!(msg.contains("column 'LEVEL'"));
        assert!(msg.contains("value 'Extreme'"));
    }

    #[test]
    fn test_row_error_without_column() {
        let err = RowError::new(3, "question text is empty");
        assert_eq!(err.to_string(), "Row 3: question text is empty");
    }

    #[test]
    fn test_missing_columns_message() {
        let err = ConvertError::MissingColumns {
            missing: vec!["row type".into(), "correct flag".into()],
            found: vec!["Description".into()],
        };
        let msg = err.to_string();
        assert!(msg.contains("row type, correct flag"));
        assert!(msg.contains("Description"));
        assert!(err.is_structural());
    }

    #[test]
    fn test_error_conversion_chain() {
        let convert_err = ConvertError::EmptyFile;
        let server_err: ServerError = convert_err.into();
        assert!(server_err.to_string().contains("empty"));

        let io_err = ConvertError::Read {
            path: PathBuf::from("missing.csv"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "not found"),
        };
        assert!(io_err.is_io());
        assert!(io_err.to_string().contains("missing.csv"));
    }
}
