//! JSON Schema validation for quiz template rows.
//!
//! The schema is embedded at compile time from
//! `schemas/quiz-record.json` and checks what the CSV format cannot:
//! non-empty question text, allowed `question_type` and `difficulty_level`
//! labels, numeric `marks`, and letter-shaped `correct_answer` values for
//! choice questions.
//!
//! # Example
//!
//! ```rust,ignore
//! use qbank::{validate_quiz_row, QuizRow};
//!
//! let row = QuizRow {
//!     question_text: "What is 2+2?".into(),
//!     question_type: "multiple_choice".into(),
//!     option_a: "3".into(),
//!     option_b: "4".into(),
//!     correct_answer: "b".into(),
//!     marks: "1".into(),
//!     difficulty_level: "easy".into(),
//!     ..Default::default()
//! };
//! assert!(validate_quiz_row(&row).is_ok());
//! ```

use once_cell::sync::Lazy;
use serde_json::Value;

use crate::models::QuizRow;

static QUIZ_RECORD_SCHEMA: Lazy<Value> = Lazy::new(|| {
    serde_json::from_str(include_str!("../../schemas/quiz-record.json"))
        .expect("Invalid embedded schema")
});

/// Validate a JSON value against a JSON schema.
///
/// # Returns
/// * `Ok(())` if valid
/// * `Err(Vec<String>)` with one message per violation
pub fn validate(schema: &Value, data: &Value) -> Result<(), Vec<String>> {
    let validator = jsonschema::draft7::new(schema)
        .map_err(|e| vec![format!("Invalid schema: {}", e)])?;

    let errors: Vec<String> = validator
        .iter_errors(data)
        .map(|e| e.to_string())
        .collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Quick true/false check.
pub fn is_valid(schema: &Value, data: &Value) -> bool {
    jsonschema::draft7::is_valid(schema, data)
}

/// Validate a row against the embedded quiz template schema.
pub fn validate_quiz_row(row: &QuizRow) -> Result<(), Vec<String>> {
    let data = serde_json::to_value(row).map_err(|e| vec![e.to_string()])?;
    validate(&QUIZ_RECORD_SCHEMA, &data)
}

/// Quick check against the quiz template schema.
pub fn is_valid_quiz_row(row: &QuizRow) -> bool {
    serde_json::to_value(row)
        .map(|data| is_valid(&QUIZ_RECORD_SCHEMA, &data))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn choice_row() -> QuizRow {
        QuizRow {
            question_text: "What is 2+2?".into(),
            question_type: "multiple_choice".into(),
            option_a: "3".into(),
            option_b: "4".into(),
            option_c: "5".into(),
            correct_answer: "b".into(),
            marks: "1".into(),
            difficulty_level: "easy".into(),
            ..Default::default()
        }
    }

    #[test]
    fn test_valid_choice_row() {
        assert!(is_valid_quiz_row(&choice_row()));
    }

    #[test]
    fn test_valid_short_answer_row() {
        let row = QuizRow {
            question_text: "Capital of France?".into(),
            question_type: "short_answer".into(),
            option_a: "Paris".into(),
            correct_answer: "Paris".into(),
            marks: "2.5".into(),
            difficulty_level: "medium".into(),
            ..Default::default()
        };
        assert!(validate_quiz_row(&row).is_ok());
    }

    #[test]
    fn test_empty_question_text_rejected() {
        let row = QuizRow {
            question_text: String::new(),
            ..choice_row()
        };
        assert!(!is_valid_quiz_row(&row));
    }

    #[test]
    fn test_bad_marks_rejected() {
        let row = QuizRow {
            marks: "ten".into(),
            ..choice_row()
        };
        let errors = validate_quiz_row(&row).unwrap_err();
        assert!(!errors.is_empty());
    }

    #[test]
    fn test_choice_answer_must_be_letters() {
        let row = QuizRow {
            correct_answer: "4".into(),
            ..choice_row()
        };
        assert!(!is_valid_quiz_row(&row));
    }

    #[test]
    fn test_generic_validate() {
        let schema = json!({
            "type": "object",
            "required": ["name"],
            "properties": { "name": { "type": "string" } }
        });
        assert!(validate(&schema, &json!({ "name": "test" })).is_ok());
        assert!(validate(&schema, &json!({ "age": 42 })).is_err());
    }
}
