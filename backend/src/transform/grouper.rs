//! Group tagged question bank rows into questions.
//!
//! # Architecture
//!
//! ```text
//! Source rows (flat, ordered)        →  Question groups
//! ┌──────────────────────────┐         ┌──────────────────────────┐
//! │ Q  What is 2+2?          │         │ What is 2+2?             │
//! │ A  3                     │    →    │   [3, 4 (correct), 5]    │
//! │ A  4          correct    │         ├──────────────────────────┤
//! │ A  5                     │         │ Capital of France?       │
//! │ Q  Capital of France?    │         │   [Paris (correct)]      │
//! │ A  Paris      correct    │         └──────────────────────────┘
//! └──────────────────────────┘
//! ```
//!
//! An `A` row always belongs to the nearest preceding `Q` row. Answers seen
//! before any question cannot be attached and are dropped with a warning.

use crate::models::{QuestionGroup, RowType, SourceRow, Warning};

/// Result of grouping: the groups plus any orphan answer warnings.
#[derive(Debug, Clone, Default)]
pub struct Grouping {
    pub groups: Vec<QuestionGroup>,
    pub warnings: Vec<Warning>,
}

impl Grouping {
    /// Number of answer rows that were dropped for lack of a question.
    pub fn orphan_count(&self) -> usize {
        self.warnings.len()
    }
}

/// Group source rows, preserving source order of questions and answers.
pub fn group_rows(rows: impl IntoIterator<Item = SourceRow>) -> Grouping {
    let mut grouping = Grouping::default();
    let mut current: Option<QuestionGroup> = None;

    for row in rows {
        match row.row_type {
            RowType::Question => {
                if let Some(group) = current.replace(QuestionGroup::new(row)) {
                    grouping.groups.push(group);
                }
            }
            RowType::Answer => match current.as_mut() {
                Some(group) => group.answers.push(row),
                None => grouping.warnings.push(Warning::at(
                    row.line,
                    format!("answer '{}' appears before any question; row skipped", row.text),
                )),
            },
        }
    }

    if let Some(group) = current {
        grouping.groups.push(group);
    }

    grouping
}

#[cfg(test)]
mod tests {
    use super::*;

    fn q(line: u64, text: &str) -> SourceRow {
        SourceRow::new(line, RowType::Question, text)
    }

    fn a(line: u64, text: &str) -> SourceRow {
        SourceRow::new(line, RowType::Answer, text)
    }

    #[test]
    fn test_answers_attach_to_preceding_question() {
        let rows = vec![q(2, "Q1"), a(3, "a"), a(4, "b"), q(5, "Q2"), a(6, "c")];
        let grouping = group_rows(rows);

        assert_eq!(grouping.groups.len(), 2);
        assert_eq!(grouping.groups[0].question.text, "Q1");
        let texts: Vec<&str> = grouping.groups[0].answers.iter().map(|r| r.text.as_str()).collect();
        assert_eq!(texts, vec!["a", "b"]);
        assert_eq!(grouping.groups[1].answers.len(), 1);
        assert!(grouping.warnings.is_empty());
    }

    #[test]
    fn test_question_without_answers() {
        let grouping = group_rows(vec![q(2, "Q1"), q(3, "Q2")]);

        assert_eq!(grouping.groups.len(), 2);
        assert!(grouping.groups.iter().all(|g| g.answers.is_empty()));
    }

    #[test]
    fn test_orphan_answers_dropped_with_warning() {
        let grouping = group_rows(vec![a(2, "stray"), a(3, "stray too"), q(4, "Q1"), a(5, "ok")]);

        assert_eq!(grouping.groups.len(), 1);
        assert_eq!(grouping.groups[0].answers.len(), 1);
        assert_eq!(grouping.orphan_count(), 2);
        assert_eq!(grouping.warnings[0].line, Some(2));
    }

    #[test]
    fn test_empty_input() {
        let grouping = group_rows(Vec::new());
        assert!(grouping.groups.is_empty());
        assert!(grouping.warnings.is_empty());
    }

    #[test]
    fn test_group_line_is_question_line() {
        let grouping = group_rows(vec![q(7, "Q"), a(8, "x")]);
        assert_eq!(grouping.groups[0].line(), 7);
    }
}
