//! Domain models for the question bank conversion pipeline.
//!
//! This module contains the core data structures used throughout the pipeline:
//!
//! - [`SourceRow`] - One tagged row of the question bank
//! - [`QuestionGroup`] - A question row with its answer rows
//! - [`OutputRecord`] - A normalized quiz question
//! - [`QuizRow`] - The flat, string-only form written to the quiz template
//! - [`Difficulty`], [`QuestionType`], [`CorrectAnswer`] - Normalized values
//! - [`Warning`] - A skipped source row worth telling the user about

use serde::{Deserialize, Serialize};
use std::fmt;

/// Columns of the quiz template, in output order.
pub const OUTPUT_FIELDS: [&str; 10] = [
    "question_text",
    "question_type",
    "option_a",
    "option_b",
    "option_c",
    "option_d",
    "correct_answer",
    "marks",
    "difficulty_level",
    "explanation",
];

/// The quiz template has a fixed number of option columns.
pub const MAX_OPTIONS: usize = 4;

const OPTION_LETTERS: [char; MAX_OPTIONS] = ['a', 'b', 'c', 'd'];

/// Normalize a label for lookups: lowercase alphanumerics only.
///
/// `"Very Hard"`, `"very_hard"` and `"VERYHARD"` all become `"veryhard"`.
pub fn normalize_key(key: &str) -> String {
    key.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(|c| c.to_lowercase())
        .collect()
}

// =============================================================================
// Source side
// =============================================================================

/// Row tag of the question bank template.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum RowType {
    /// `Q` - a question stem.
    Question,
    /// `A` - an answer option of the preceding question.
    Answer,
}

impl RowType {
    /// Parse a row tag, ignoring case and surrounding whitespace.
    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim().to_uppercase().as_str() {
            "Q" => Some(Self::Question),
            "A" => Some(Self::Answer),
            _ => None,
        }
    }
}

/// One input record of the question bank.
///
/// Optional fields are `None` when the column is absent or the cell is blank.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SourceRow {
    /// Physical line in the source file (header is line 1).
    pub line: u64,
    pub row_type: RowType,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub question_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correct_flag: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub marks: Option<String>,
}

impl SourceRow {
    /// Minimal row with only a tag and text.
    pub fn new(line: u64, row_type: RowType, text: impl Into<String>) -> Self {
        Self {
            line,
            row_type,
            text: text.into(),
            difficulty: None,
            question_type: None,
            correct_flag: None,
            marks: None,
        }
    }

    pub fn with_difficulty(mut self, value: impl Into<String>) -> Self {
        self.difficulty = Some(value.into());
        self
    }

    pub fn with_question_type(mut self, value: impl Into<String>) -> Self {
        self.question_type = Some(value.into());
        self
    }

    pub fn with_correct_flag(mut self, value: impl Into<String>) -> Self {
        self.correct_flag = Some(value.into());
        self
    }

    pub fn with_marks(mut self, value: impl Into<String>) -> Self {
        self.marks = Some(value.into());
        self
    }
}

/// A question row with its answer rows, in source order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QuestionGroup {
    pub question: SourceRow,
    pub answers: Vec<SourceRow>,
}

impl QuestionGroup {
    pub fn new(question: SourceRow) -> Self {
        Self {
            question,
            answers: Vec::new(),
        }
    }

    /// Line of the `Q` row; used to cite errors that concern the whole group.
    pub fn line(&self) -> u64 {
        self.question.line
    }
}

/// A non-fatal note about the source: the row it concerns was skipped.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Warning {
    pub line: Option<u64>,
    pub message: String,
}

impl Warning {
    pub fn at(line: u64, message: impl Into<String>) -> Self {
        Self {
            line: Some(line),
            message: message.into(),
        }
    }
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.line {
            Some(line) => write!(f, "Row {}: {}", line, self.message),
            None => f.write_str(&self.message),
        }
    }
}

// =============================================================================
// Difficulty
// =============================================================================

/// Normalized difficulty level.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    #[default]
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    /// Map a raw level label.
    ///
    /// Numeric levels win over text: every digit in the value is joined, so
    /// `"Level 2"` is medium while `"1-2"` reads as `12`. Returns `None` for
    /// labels outside the table (including `"4"`, `"1-2"` and `"Extreme"`).
    pub fn from_label(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        let digits: String = raw.chars().filter(char::is_ascii_digit).collect();

        if !digits.is_empty() {
            return match digits.trim_start_matches('0') {
                "1" => Some(Self::Easy),
                "2" => Some(Self::Medium),
                "3" => Some(Self::Hard),
                _ => None,
            };
        }

        match normalize_key(raw).as_str() {
            "easy" | "simple" | "basic" => Some(Self::Easy),
            // "modreate" shows up in real question banks
            "medium" | "moderate" | "modreate" | "intermediate" => Some(Self::Medium),
            "hard" | "difficult" | "challenging" => Some(Self::Hard),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Easy => "easy",
            Self::Medium => "medium",
            Self::Hard => "hard",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Question Type
// =============================================================================

/// Question type code of the question bank.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum QuestionType {
    /// `R` - single choice (radio buttons).
    #[default]
    Radio,
    /// `C` - multiple choice (checkboxes).
    Checkbox,
    /// `L` - one-line free text answer.
    OneLiner,
}

impl QuestionType {
    /// Parse a question type code.
    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim().to_uppercase().as_str() {
            "R" | "RADIO" => Some(Self::Radio),
            "C" | "CHECKBOX" => Some(Self::Checkbox),
            "L" | "ONELINER" | "ONELINNER" => Some(Self::OneLiner),
            _ => None,
        }
    }

    pub fn to_code(&self) -> &'static str {
        match self {
            Self::Radio => "R",
            Self::Checkbox => "C",
            Self::OneLiner => "L",
        }
    }

    /// Label used in the `question_type` column of the quiz template.
    pub fn output_label(&self) -> &'static str {
        match self {
            Self::Radio | Self::Checkbox => "multiple_choice",
            Self::OneLiner => "short_answer",
        }
    }

    pub fn is_choice(&self) -> bool {
        !matches!(self, Self::OneLiner)
    }
}

// =============================================================================
// Correct Answer
// =============================================================================

/// The correct answer of a converted question.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "value", rename_all = "camelCase")]
pub enum CorrectAnswer {
    /// Zero-based option indices, ascending.
    Options(Vec<usize>),
    /// Expected free-text answer.
    Text(String),
}

impl CorrectAnswer {
    /// Render for the `correct_answer` column: `"b"`, `"a,c"` or the text.
    pub fn render(&self) -> String {
        match self {
            Self::Options(indices) => indices
                .iter()
                .filter_map(|&i| option_letter(i))
                .map(String::from)
                .collect::<Vec<_>>()
                .join(","),
            Self::Text(text) => text.clone(),
        }
    }

    /// First correct option index, if this is a choice answer.
    pub fn index(&self) -> Option<usize> {
        match self {
            Self::Options(indices) => indices.first().copied(),
            Self::Text(_) => None,
        }
    }
}

/// Letter of the option at `index` (`0 -> 'a'`).
pub fn option_letter(index: usize) -> Option<char> {
    OPTION_LETTERS.get(index).copied()
}

// =============================================================================
// Output Record
// =============================================================================

/// One normalized quiz question.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OutputRecord {
    /// Line of the source `Q` row.
    pub source_line: u64,
    pub question_text: String,
    pub question_type: QuestionType,
    /// Up to [`MAX_OPTIONS`] option texts, in source order.
    pub options: Vec<String>,
    pub correct: CorrectAnswer,
    pub marks: String,
    pub difficulty: Difficulty,
}

impl OutputRecord {
    /// Flatten into the quiz template row.
    pub fn to_row(&self) -> QuizRow {
        let option = |i: usize| self.options.get(i).cloned().unwrap_or_default();

        QuizRow {
            question_text: self.question_text.clone(),
            question_type: self.question_type.output_label().to_string(),
            option_a: option(0),
            option_b: option(1),
            option_c: option(2),
            option_d: option(3),
            correct_answer: self.correct.render(),
            marks: self.marks.clone(),
            difficulty_level: self.difficulty.as_str().to_string(),
            explanation: String::new(),
        }
    }
}

/// A row of the quiz template, field order matching [`OUTPUT_FIELDS`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct QuizRow {
    pub question_text: String,
    pub question_type: String,
    pub option_a: String,
    pub option_b: String,
    pub option_c: String,
    pub option_d: String,
    pub correct_answer: String,
    pub marks: String,
    pub difficulty_level: String,
    pub explanation: String,
}

impl QuizRow {
    /// Cells in template order.
    pub fn fields(&self) -> [&str; 10] {
        [
            &self.question_text,
            &self.question_type,
            &self.option_a,
            &self.option_b,
            &self.option_c,
            &self.option_d,
            &self.correct_answer,
            &self.marks,
            &self.difficulty_level,
            &self.explanation,
        ]
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_type_from_code() {
        assert_eq!(RowType::from_code("Q"), Some(RowType::Question));
        assert_eq!(RowType::from_code(" a "), Some(RowType::Answer));
        assert_eq!(RowType::from_code("X"), None);
        assert_eq!(RowType::from_code(""), None);
    }

    #[test]
    fn test_difficulty_numeric_levels() {
        assert_eq!(Difficulty::from_label("1"), Some(Difficulty::Easy));
        assert_eq!(Difficulty::from_label("Level 2"), Some(Difficulty::Medium));
        assert_eq!(Difficulty::from_label("03"), Some(Difficulty::Hard));
        assert_eq!(Difficulty::from_label("4"), None);
        assert_eq!(Difficulty::from_label("1-2"), None);
        assert_eq!(Difficulty::from_label("Level-0-3"), Some(Difficulty::Hard));
    }

    #[test]
    fn test_difficulty_text_labels() {
        assert_eq!(Difficulty::from_label("Simple"), Some(Difficulty::Easy));
        assert_eq!(Difficulty::from_label("MODREATE"), Some(Difficulty::Medium));
        assert_eq!(Difficulty::from_label(" challenging "), Some(Difficulty::Hard));
        assert_eq!(Difficulty::from_label("Extreme"), None);
    }

    #[test]
    fn test_question_type_codes() {
        assert_eq!(QuestionType::from_code("r"), Some(QuestionType::Radio));
        assert_eq!(QuestionType::from_code("C"), Some(QuestionType::Checkbox));
        assert_eq!(QuestionType::from_code("L"), Some(QuestionType::OneLiner));
        assert_eq!(QuestionType::from_code("Z"), None);
        assert_eq!(QuestionType::Checkbox.output_label(), "multiple_choice");
        assert_eq!(QuestionType::OneLiner.output_label(), "short_answer");
    }

    #[test]
    fn test_correct_answer_render() {
        assert_eq!(CorrectAnswer::Options(vec![1]).render(), "b");
        assert_eq!(CorrectAnswer::Options(vec![0, 2]).render(), "a,c");
        assert_eq!(CorrectAnswer::Text("Paris".into()).render(), "Paris");
        assert_eq!(CorrectAnswer::Options(vec![3]).index(), Some(3));
    }

    #[test]
    fn test_output_record_to_row() {
        let record = OutputRecord {
            source_line: 2,
            question_text: "What is 2+2?".into(),
            question_type: QuestionType::Radio,
            options: vec!["3".into(), "4".into(), "5".into()],
            correct: CorrectAnswer::Options(vec![1]),
            marks: "1".into(),
            difficulty: Difficulty::Easy,
        };

        let row = record.to_row();
        assert_eq!(row.option_a, "3");
        assert_eq!(row.option_b, "4");
        assert_eq!(row.option_c, "5");
        assert_eq!(row.option_d, "");
        assert_eq!(row.correct_answer, "b");
        assert_eq!(row.fields().len(), OUTPUT_FIELDS.len());
    }

    #[test]
    fn test_quiz_row_serializes_in_template_order() {
        let json = serde_json::to_value(QuizRow::default()).unwrap();
        let keys: Vec<&str> = json.as_object().unwrap().keys().map(|k| k.as_str()).collect();
        assert_eq!(keys.len(), OUTPUT_FIELDS.len());
        for field in OUTPUT_FIELDS {
            assert!(keys.contains(&field));
        }
    }

    #[test]
    fn test_normalize_key() {
        assert_eq!(normalize_key("Is Right_Answer"), "isrightanswer");
        assert_eq!(normalize_key("QuestionTNpe(R=Radio,C=Checkbox,L=Onelinner)"), "questiontnperradioccheckboxlonelinner");
    }
}
