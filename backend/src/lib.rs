//! # qbank - Question bank to quiz template conversion
//!
//! qbank converts "question bank" spreadsheets, where rows tagged `Q` hold a
//! question and the following rows tagged `A` hold its answer options, into
//! the flat quiz template CSV (one row per question, four option columns and
//! a correct-answer column).
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │ Bank CSV    │────▶│   Parser    │────▶│   Grouper   │────▶│   Mapper    │────▶│  Quiz CSV   │
//! │ (any enc.)  │     │ (auto-enc)  │     │ (Q + A rows)│     │ (+validate) │     │  (atomic)   │
//! └─────────────┘     └─────────────┘     └─────────────┘     └─────────────┘     └─────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use qbank::{convert_file, render_csv, ConvertOptions};
//! use std::path::Path;
//!
//! let report = convert_file(Path::new("bank.csv"), &ConvertOptions::default())?;
//! println!("Converted {} questions", report.records.len());
//! for err in &report.row_errors {
//!     eprintln!("{}", err);
//! }
//! let csv = render_csv(&report.records)?;
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Row, conversion and server errors
//! - [`models`] - Domain models (SourceRow, QuestionGroup, OutputRecord)
//! - [`parser`] - CSV parsing with auto-detection and column aliases
//! - [`transform`] - Grouping, field mapping and the pipeline
//! - [`validation`] - Quiz template schema validation
//! - [`config`] - Conversion options and server settings
//! - [`api`] - Activity log and HTTP API server

// Core modules
pub mod config;
pub mod error;
pub mod models;

// Parsing
pub mod parser;

// Conversion
pub mod transform;

// Validation
pub mod validation;

// HTTP API
pub mod api;

// =============================================================================
// Re-exports - Errors & config
// =============================================================================

pub use config::{ConvertOptions, ServerConfig, DEFAULT_MARKS};
pub use error::{ConvertError, ConvertResult, RowError, ServerError};

// =============================================================================
// Re-exports - Models
// =============================================================================

pub use models::{
    CorrectAnswer,
    Difficulty,
    OutputRecord,
    QuestionGroup,
    QuestionType,
    QuizRow,
    RowType,
    SourceRow,
    Warning,
    MAX_OPTIONS,
    OUTPUT_FIELDS,
};

// =============================================================================
// Re-exports - Parsing
// =============================================================================

pub use parser::{
    decode_content,
    detect_delimiter,
    detect_encoding,
    parse_bytes,
    parse_file,
    Column,
    ColumnMap,
    ParseResult,
};

// =============================================================================
// Re-exports - Conversion
// =============================================================================

pub use transform::{
    convert_and_save,
    convert_bytes,
    convert_file,
    default_output_path,
    group_rows,
    map_group,
    render_csv,
    write_output,
    ConversionReport,
    ConversionStats,
    CsvInfo,
    FieldMapper,
    Grouping,
    MappedQuestion,
    RunStatus,
};

// =============================================================================
// Re-exports - Validation
// =============================================================================

pub use validation::{is_valid_quiz_row, validate_quiz_row};

// =============================================================================
// Re-exports - Logs & API
// =============================================================================

pub use api::logs::{ActivityLog, LogEntry, LogLevel, LOG_BROADCASTER};
pub use api::types::{error_response, PreviewResponse};

// Server
pub mod server {
    pub use crate::api::server::start_server;
}
