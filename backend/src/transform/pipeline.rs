//! High-level conversion API: question bank CSV in, quiz template CSV out.
//!
//! This module combines all steps: parsing, grouping, field mapping and
//! writing. Row-level problems are collected into the report's activity log;
//! only structural and I/O problems abort a run.
//!
//! # Example
//!
//! ```rust,ignore
//! use qbank::{convert_and_save, default_output_path, ConvertOptions};
//! use std::path::Path;
//!
//! let input = Path::new("bank.csv");
//! let report = convert_and_save(input, &default_output_path(input), &ConvertOptions::default())?;
//! println!("Converted {} questions", report.records.len());
//! for line in report.log.lines() {
//!     println!("{}", line);
//! }
//! ```

use serde::Serialize;
use std::io::Write;
use std::path::{Path, PathBuf};

use super::grouper::group_rows;
use super::mapper::FieldMapper;
use crate::api::logs::ActivityLog;
use crate::config::ConvertOptions;
use crate::error::{ConvertError, ConvertResult, RowError};
use crate::models::{OutputRecord, Warning, OUTPUT_FIELDS};
use crate::parser::{parse_bytes, parse_file, ParseResult};

/// Where a run ended up
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    /// Converted in memory, nothing written
    Previewed,
    /// Output file finalized
    Written,
    /// Every question failed; no file was written
    NothingWritten,
}

/// Source file information
#[derive(Debug, Clone, Serialize)]
pub struct CsvInfo {
    pub encoding: String,
    pub delimiter: char,
    pub headers: Vec<String>,
    pub row_count: usize,
}

/// Counters of one run.
///
/// `converted + failed == questions` always holds.
#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq)]
pub struct ConversionStats {
    pub questions: usize,
    pub converted: usize,
    pub failed: usize,
    pub orphan_answers: usize,
    pub skipped_rows: usize,
}

/// Result of a conversion run
#[derive(Debug, Clone, Serialize)]
pub struct ConversionReport {
    /// Converted questions, in source order
    pub records: Vec<OutputRecord>,

    /// Questions left out of the output
    pub row_errors: Vec<RowError>,

    /// Source rows skipped or trimmed
    pub warnings: Vec<Warning>,

    /// Human-readable account of the run
    pub log: ActivityLog,

    pub csv_info: CsvInfo,

    pub stats: ConversionStats,

    pub status: RunStatus,

    /// Set once the output file is written
    pub output_path: Option<PathBuf>,
}

impl ConversionReport {
    /// True when every question converted and nothing was skipped.
    pub fn is_clean(&self) -> bool {
        self.row_errors.is_empty() && self.warnings.is_empty()
    }

    /// Questions were found but none survived mapping.
    pub fn nothing_converted(&self) -> bool {
        self.records.is_empty() && self.stats.failed > 0
    }
}

/// Convert a question bank file.
///
/// Nothing is written; see [`convert_and_save`].
pub fn convert_file(path: &Path, options: &ConvertOptions) -> ConvertResult<ConversionReport> {
    let parse_result = parse_file(path, options.delimiter)?;
    Ok(convert_parsed(parse_result, options, Some(path)))
}

/// Convert question bank bytes.
///
/// Same as [`convert_file`] but accepts raw bytes instead of a file path.
pub fn convert_bytes(bytes: &[u8], options: &ConvertOptions) -> ConvertResult<ConversionReport> {
    let parse_result = parse_bytes(bytes, options.delimiter)?;
    Ok(convert_parsed(parse_result, options, None))
}

/// Convert a file and write the quiz template to `output`.
///
/// The output is written to a temporary file next to `output` and renamed
/// into place, so a failed run never leaves a partial file behind. A run in
/// which questions exist but none converted writes nothing and comes back
/// with [`RunStatus::NothingWritten`], its row errors intact.
pub fn convert_and_save(
    input: &Path,
    output: &Path,
    options: &ConvertOptions,
) -> ConvertResult<ConversionReport> {
    let mut report = convert_file(input, options)?;

    if report.nothing_converted() {
        report.log.error(format!(
            "No question could be converted ({} failed); {} not written",
            report.stats.failed,
            output.display()
        ));
        report.status = RunStatus::NothingWritten;
        return Ok(report);
    }

    write_output(output, &report.records, options.overwrite)?;

    report.log.success(format!(
        "💾 Saved {} question(s) to {}",
        report.records.len(),
        output.display()
    ));
    report.status = RunStatus::Written;
    report.output_path = Some(output.to_path_buf());

    Ok(report)
}

/// `<stem>_converted.csv` next to the input.
pub fn default_output_path(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("questions");
    input.with_file_name(format!("{}_converted.csv", stem))
}

/// Internal: convert parsed rows
fn convert_parsed(
    parse_result: ParseResult,
    options: &ConvertOptions,
    source_path: Option<&Path>,
) -> ConversionReport {
    let mut log = if options.echo_log {
        ActivityLog::echoing()
    } else {
        ActivityLog::new()
    };

    // Step 1: CSV Info
    match source_path {
        Some(path) => log.info(format!("📖 Reading {}", path.display())),
        None => log.info("📖 Reading uploaded file"),
    }
    log.success(format!("Detected encoding: {}", parse_result.encoding));
    log.success(format!("Detected separator: '{}'", format_delimiter(parse_result.delimiter)));
    log.success(format!("Read {} rows", parse_result.record_count));

    log.info(format!("📋 CSV has {} columns:", parse_result.headers.len()));
    for (i, col) in parse_result.headers.iter().enumerate() {
        log.info_indent(format!("[{:2}] {}", i + 1, col), 1);
    }

    let csv_info = CsvInfo {
        encoding: parse_result.encoding.clone(),
        delimiter: parse_result.delimiter,
        headers: parse_result.headers.clone(),
        row_count: parse_result.record_count,
    };

    let mut warnings = parse_result.warnings;
    let skipped_rows = warnings.len();

    // Step 2: Group by question
    log.info("📦 Grouping answers under their questions...");
    let grouping = group_rows(parse_result.rows);
    let orphan_answers = grouping.orphan_count();
    warnings.extend(grouping.warnings);
    log.success(format!("{} question(s) found", grouping.groups.len()));

    // Step 3: Map fields
    log.info("⚙️  Mapping fields...");
    let mapper = FieldMapper::new(options.default_marks.clone()).with_columns(parse_result.columns);
    let mut records = Vec::with_capacity(grouping.groups.len());
    let mut row_errors = Vec::new();

    for group in &grouping.groups {
        match mapper.map(group) {
            Ok(mapped) => {
                warnings.extend(mapped.warnings);
                records.push(mapped.record);
            }
            Err(err) => row_errors.push(err),
        }
    }

    for warning in &warnings {
        log.warning(warning.to_string());
    }
    for err in &row_errors {
        log.error(err.to_string());
    }

    let stats = ConversionStats {
        questions: grouping.groups.len(),
        converted: records.len(),
        failed: row_errors.len(),
        orphan_answers,
        skipped_rows,
    };

    if row_errors.is_empty() {
        log.success(format!("All {} question(s) converted", stats.converted));
    } else {
        log.warning(format!(
            "{} question(s) converted, {} excluded",
            stats.converted, stats.failed
        ));
    }

    ConversionReport {
        records,
        row_errors,
        warnings,
        log,
        csv_info,
        stats,
        status: RunStatus::Previewed,
        output_path: None,
    }
}

/// Format delimiter for display
fn format_delimiter(d: char) -> String {
    match d {
        '\t' => "TAB".to_string(),
        c => c.to_string(),
    }
}

/// Render records as quiz template CSV.
///
/// The header is always present, so an empty input still yields a valid
/// template. Output depends only on `records`.
pub fn render_csv(records: &[OutputRecord]) -> ConvertResult<Vec<u8>> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());

    writer.write_record(OUTPUT_FIELDS)?;
    for record in records {
        writer.write_record(record.to_row().fields())?;
    }

    writer.into_inner().map_err(|e| {
        let io = std::io::Error::new(e.error().kind(), e.error().to_string());
        ConvertError::Csv(csv::Error::from(io))
    })
}

/// Write records to `path` atomically.
///
/// With `overwrite` false an existing file is left untouched and
/// [`ConvertError::OutputExists`] is returned.
pub fn write_output(path: &Path, records: &[OutputRecord], overwrite: bool) -> ConvertResult<()> {
    if !overwrite && path.exists() {
        return Err(ConvertError::OutputExists(path.to_path_buf()));
    }

    let bytes = render_csv(records)?;
    let write_err = |source: std::io::Error| ConvertError::Write {
        path: path.to_path_buf(),
        source,
    };

    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));

    let mut tmp = tempfile::Builder::new()
        .prefix(".qbank-")
        .suffix(".csv.tmp")
        .tempfile_in(dir)
        .map_err(write_err)?;
    tmp.write_all(&bytes).map_err(write_err)?;
    tmp.as_file().sync_all().map_err(write_err)?;

    let persisted = if overwrite {
        tmp.persist(path)
    } else {
        tmp.persist_noclobber(path)
    };

    match persisted {
        Ok(_) => Ok(()),
        Err(e) if e.error.kind() == std::io::ErrorKind::AlreadyExists => {
            Err(ConvertError::OutputExists(path.to_path_buf()))
        }
        Err(e) => Err(write_err(e.error)),
    }
}
