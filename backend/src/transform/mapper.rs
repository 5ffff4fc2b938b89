//! Fold a question group into a quiz template record.
//!
//! Value translation goes through the static tables on the model types
//! ([`Difficulty::from_label`], [`QuestionType::from_code`]) plus the correct
//! flag table below. Anything outside a table is a [`RowError`] naming the
//! row, the column and the raw value; nothing is silently defaulted except
//! blank optional cells.
//!
//! | Source                | Output             | Rule                               |
//! |-----------------------|--------------------|------------------------------------|
//! | `Q` Description       | `question_text`    | must not be empty                  |
//! | QuestionTNpe R/C/L    | `question_type`    | R, C → multiple_choice; L → short_answer; blank → R |
//! | `A` Description       | `option_a..d`      | first four answers, in order       |
//! | IsRightAnswer         | `correct_answer`   | letters a–d; several only for C; unmarked L → first answer text |
//! | Marks                 | `marks`            | blank → default                    |
//! | LEVEL                 | `difficulty_level` | 1/2/3 or labels; blank → easy      |

use once_cell::sync::Lazy;
use regex::Regex;

use crate::config::DEFAULT_MARKS;
use crate::error::RowError;
use crate::models::{
    CorrectAnswer, Difficulty, OutputRecord, QuestionGroup, QuestionType, SourceRow, Warning,
    MAX_OPTIONS,
};
use crate::parser::{Column, ColumnMap};
use crate::validation::validate_quiz_row;

static MARKS: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d+(\.\d+)?$").expect("valid marks regex"));

/// Parse an `IsRightAnswer` cell.
///
/// Blank means "not correct". Returns `None` for values outside the table.
pub fn parse_correct_flag(raw: Option<&str>) -> Option<bool> {
    let Some(raw) = raw.map(str::trim).filter(|v| !v.is_empty()) else {
        return Some(false);
    };

    match raw.to_uppercase().as_str() {
        "Y" | "YES" | "TRUE" | "1" | "CORRECT" | "X" => Some(true),
        "N" | "NO" | "FALSE" | "0" => Some(false),
        _ => None,
    }
}

/// A converted question plus the notes raised while converting it.
#[derive(Debug, Clone)]
pub struct MappedQuestion {
    pub record: OutputRecord,
    pub warnings: Vec<Warning>,
}

/// Maps question groups to output records.
///
/// Holds only read-only configuration, so one mapper can be shared by any
/// number of runs.
#[derive(Debug, Clone)]
pub struct FieldMapper {
    columns: Option<ColumnMap>,
    default_marks: String,
}

impl Default for FieldMapper {
    fn default() -> Self {
        Self::new(DEFAULT_MARKS)
    }
}

impl FieldMapper {
    pub fn new(default_marks: impl Into<String>) -> Self {
        Self {
            columns: None,
            default_marks: default_marks.into(),
        }
    }

    /// Cite the source file's own header names in errors.
    pub fn with_columns(mut self, columns: ColumnMap) -> Self {
        self.columns = Some(columns);
        self
    }

    fn column_name(&self, column: Column) -> String {
        match &self.columns {
            Some(map) => map.header(column).to_string(),
            None => column.aliases()[0].to_string(),
        }
    }

    fn row_error(&self, row: &SourceRow, column: Column, value: &str, message: impl Into<String>) -> RowError {
        RowError::new(row.line, message)
            .with_column(self.column_name(column))
            .with_value(value)
    }

    /// Convert one group.
    pub fn map(&self, group: &QuestionGroup) -> Result<MappedQuestion, RowError> {
        let question = &group.question;
        let mut warnings = Vec::new();

        if question.text.is_empty() {
            return Err(RowError::new(question.line, "question text is empty")
                .with_column(self.column_name(Column::QuestionText)));
        }

        let difficulty = match question.difficulty.as_deref() {
            None => Difficulty::default(),
            Some(raw) => Difficulty::from_label(raw).ok_or_else(|| {
                self.row_error(question, Column::Difficulty, raw, "unknown difficulty label")
            })?,
        };

        let question_type = match question.question_type.as_deref() {
            None => QuestionType::default(),
            Some(raw) => QuestionType::from_code(raw).ok_or_else(|| {
                self.row_error(question, Column::QuestionType, raw, "unknown question type (expected R, C or L)")
            })?,
        };

        let marks = match question.marks.as_deref() {
            None => self.default_marks.clone(),
            Some(raw) if MARKS.is_match(raw) => raw.to_string(),
            Some(raw) => {
                return Err(self.row_error(question, Column::Marks, raw, "marks must be a non-negative number"))
            }
        };

        let mut correct = Vec::new();
        for (index, answer) in group.answers.iter().enumerate() {
            let flag = answer.correct_flag.as_deref();
            match parse_correct_flag(flag) {
                Some(true) => correct.push(index),
                Some(false) => {}
                None => {
                    return Err(self.row_error(
                        answer,
                        Column::CorrectFlag,
                        flag.unwrap_or_default(),
                        "unknown correct-answer marker (expected Y or N)",
                    ))
                }
            }

            if answer.text.is_empty() && question_type.is_choice() {
                return Err(RowError::new(answer.line, "answer text is empty")
                    .with_column(self.column_name(Column::AnswerText)));
            }
        }

        if group.answers.len() > MAX_OPTIONS {
            if let Some(&dropped) = correct.iter().find(|&&i| i >= MAX_OPTIONS) {
                return Err(RowError::new(
                    group.answers[dropped].line,
                    format!(
                        "answer option {} is marked correct but only {} options fit the quiz template",
                        dropped + 1,
                        MAX_OPTIONS
                    ),
                ));
            }
            warnings.push(Warning::at(
                question.line,
                format!(
                    "question has {} answer options; only the first {} were kept",
                    group.answers.len(),
                    MAX_OPTIONS
                ),
            ));
        }

        let options: Vec<String> = group
            .answers
            .iter()
            .take(MAX_OPTIONS)
            .map(|a| a.text.clone())
            .collect();

        let correct = self.resolve_correct(group, question_type, correct, &options)?;

        let record = OutputRecord {
            source_line: question.line,
            question_text: question.text.clone(),
            question_type,
            options,
            correct,
            marks,
            difficulty,
        };

        validate_quiz_row(&record.to_row()).map_err(|errors| {
            RowError::new(
                question.line,
                format!("record does not fit the quiz template: {}", errors.join("; ")),
            )
        })?;

        Ok(MappedQuestion { record, warnings })
    }

    fn resolve_correct(
        &self,
        group: &QuestionGroup,
        question_type: QuestionType,
        correct: Vec<usize>,
        options: &[String],
    ) -> Result<CorrectAnswer, RowError> {
        let line = group.line();

        if group.answers.is_empty() {
            return Err(RowError::new(line, "question has no answer rows"));
        }

        if correct.len() > 1 && question_type != QuestionType::Checkbox {
            let rows: Vec<String> = correct.iter().map(|&i| group.answers[i].line.to_string()).collect();
            return Err(RowError::new(
                line,
                format!(
                    "{} answers are marked correct (rows {}) but question type {} allows only one",
                    correct.len(),
                    rows.join(", "),
                    question_type.to_code()
                ),
            )
            .with_column(self.column_name(Column::CorrectFlag)));
        }

        match question_type {
            QuestionType::Radio | QuestionType::Checkbox => {
                if correct.is_empty() {
                    return Err(RowError::new(line, "no answer option is marked correct")
                        .with_column(self.column_name(Column::CorrectFlag)));
                }
                Ok(CorrectAnswer::Options(correct))
            }
            // A marked one-liner answer is cited by letter; otherwise the
            // first answer's text is the expected reply.
            QuestionType::OneLiner if correct.is_empty() => Ok(CorrectAnswer::Text(options[0].clone())),
            QuestionType::OneLiner => Ok(CorrectAnswer::Options(correct)),
        }
    }
}

/// Convert one group with default settings.
pub fn map_group(group: &QuestionGroup) -> Result<MappedQuestion, RowError> {
    FieldMapper::default().map(group)
}
