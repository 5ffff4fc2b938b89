//! REST API types for front-end integration.
//!
//! Preview responses carry the converted rows in quiz template form, so a
//! front end can render them as a table without knowing the domain types.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

use super::logs::LogEntry;
use crate::models::QuizRow;
use crate::transform::pipeline::{ConversionReport, ConversionStats};

/// Response sent after a preview upload.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewResponse {
    /// Unique job identifier
    pub job_id: String,

    /// Status: "ready", "warning", "error"
    pub status: String,

    /// Set when no question could be converted
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Uploaded file name, if the client sent one
    pub file_name: Option<String>,

    /// Converted questions in template form
    pub questions: Vec<PreviewQuestion>,

    /// Activity log of the run
    pub log: Vec<LogEntry>,

    /// Metadata about the conversion
    pub metadata: ResponseMetadata,
}

/// One converted question
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewQuestion {
    /// Line of the `Q` row in the uploaded file
    pub source_line: u64,
    pub row: QuizRow,
}

/// Metadata about the conversion
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseMetadata {
    pub csv_info: CsvMetadata,
    pub stats: ConversionStats,
    pub errors: Vec<RowErrorInfo>,
}

/// CSV file metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CsvMetadata {
    pub encoding: String,
    pub delimiter: String,
    pub row_count: usize,
    pub columns: Vec<String>,
}

/// A question left out of the output
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RowErrorInfo {
    pub line: u64,
    pub column: Option<String>,
    pub value: Option<String>,
    pub message: String,
}

impl PreviewResponse {
    pub fn from_report(report: ConversionReport, file_name: Option<String>) -> Self {
        let questions = report
            .records
            .iter()
            .map(|r| PreviewQuestion {
                source_line: r.source_line,
                row: r.to_row(),
            })
            .collect();

        let (status, error) = if report.nothing_converted() {
            let message = format!("No question could be converted ({} failed)", report.stats.failed);
            ("error", Some(message))
        } else if report.row_errors.is_empty() {
            ("ready", None)
        } else {
            ("warning", None)
        };

        PreviewResponse {
            job_id: Uuid::new_v4().to_string(),
            status: status.to_string(),
            error,
            file_name,
            questions,
            metadata: ResponseMetadata {
                csv_info: CsvMetadata {
                    encoding: report.csv_info.encoding,
                    delimiter: report.csv_info.delimiter.to_string(),
                    row_count: report.csv_info.row_count,
                    columns: report.csv_info.headers,
                },
                stats: report.stats,
                errors: report
                    .row_errors
                    .into_iter()
                    .map(|e| RowErrorInfo {
                        line: e.line,
                        column: e.column,
                        value: e.value,
                        message: e.message,
                    })
                    .collect(),
            },
            log: report.log.into_entries(),
        }
    }
}

/// Create an error response
pub fn error_response(error: &str) -> Value {
    json!({
        "jobId": Uuid::new_v4().to_string(),
        "status": "error",
        "error": error,
        "questions": [],
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConvertOptions;
    use crate::transform::pipeline::convert_bytes;

    #[test]
    fn test_preview_from_report() {
        let csv = "TNpe,Description,IsRightAnswer\nQ,What is 2+2?,\nA,3,\nA,4,Y\nQ,Orphaned,\n";
        let report = convert_bytes(csv.as_bytes(), &ConvertOptions::default()).unwrap();
        let response = PreviewResponse::from_report(report, Some("bank.csv".into()));

        assert_eq!(response.status, "warning");
        assert_eq!(response.questions.len(), 1);
        assert_eq!(response.questions[0].source_line, 2);
        assert_eq!(response.questions[0].row.correct_answer, "b");
        assert_eq!(response.metadata.errors.len(), 1);
        assert_eq!(response.metadata.errors[0].line, 5);
        assert!(!response.log.is_empty());

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["fileName"], "bank.csv");
        assert_eq!(json["metadata"]["csvInfo"]["delimiter"], ",");
    }

    #[test]
    fn test_preview_when_nothing_converts() {
        let csv = "TNpe,Description,IsRightAnswer,LEVEL\nQ,Bad,,Extreme\nA,x,Y,\n";
        let report = convert_bytes(csv.as_bytes(), &ConvertOptions::default()).unwrap();
        let response = PreviewResponse::from_report(report, None);

        assert_eq!(response.status, "error");
        assert!(response.error.as_deref().unwrap().contains("1 failed"));
        assert_eq!(response.metadata.errors.len(), 1);
        assert_eq!(response.metadata.errors[0].line, 2);
        assert_eq!(response.metadata.errors[0].value.as_deref(), Some("Extreme"));
    }

    #[test]
    fn test_error_response_shape() {
        let body = error_response("Missing required column(s)");
        assert_eq!(body["status"], "error");
        assert!(body["questions"].as_array().unwrap().is_empty());
    }
}
