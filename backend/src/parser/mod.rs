//! Question bank CSV parser with encoding and delimiter auto-detection.
//!
//! Turns raw bytes into ordered [`SourceRow`]s. Columns are located by alias
//! so that the spellings found in real question banks (`TNpe`, `Type`,
//! `QuestionTNpe(R=Radio,C=Checkbox,L=Onelinner)`, ...) all resolve.
//! No grouping or value mapping happens here.

use std::path::Path;

use crate::error::{ConvertError, ConvertResult};
use crate::models::{normalize_key, RowType, SourceRow, Warning};

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

// =============================================================================
// Column contract
// =============================================================================

/// Logical columns of the question bank template.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Column {
    RowType,
    QuestionText,
    AnswerText,
    CorrectFlag,
    Difficulty,
    QuestionType,
    Marks,
}

impl Column {
    pub const ALL: [Column; 7] = [
        Column::RowType,
        Column::QuestionText,
        Column::AnswerText,
        Column::CorrectFlag,
        Column::Difficulty,
        Column::QuestionType,
        Column::Marks,
    ];

    /// Accepted header spellings, in priority order.
    pub fn aliases(&self) -> &'static [&'static str] {
        match self {
            Column::RowType => &["TNpe", "Type", "RowType"],
            Column::QuestionText => &["Description", "Question", "Text"],
            Column::AnswerText => &["Description", "Answer", "Text"],
            Column::CorrectFlag => &["IsRightAnswer", "Correct", "IsCorrect"],
            Column::Difficulty => &["LEVEL", "Difficulty", "EASY"],
            Column::QuestionType => &[
                "QuestionTNpe",
                "QuestionType",
                "QuestionTNpe(R=Radio,C=Checkbox,L=Onelinner)",
            ],
            Column::Marks => &["Marks"],
        }
    }

    pub fn is_required(&self) -> bool {
        matches!(
            self,
            Column::RowType | Column::QuestionText | Column::AnswerText | Column::CorrectFlag
        )
    }

    /// Human-readable name used in structural errors.
    pub fn label(&self) -> &'static str {
        match self {
            Column::RowType => "row type (TNpe)",
            Column::QuestionText => "question text (Description)",
            Column::AnswerText => "answer text (Description)",
            Column::CorrectFlag => "correct flag (IsRightAnswer)",
            Column::Difficulty => "difficulty (LEVEL)",
            Column::QuestionType => "question type (QuestionTNpe)",
            Column::Marks => "marks (Marks)",
        }
    }
}

/// Header positions of the logical columns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMap {
    headers: Vec<String>,
    row_type: usize,
    question_text: usize,
    answer_text: usize,
    correct_flag: usize,
    difficulty: Option<usize>,
    question_type: Option<usize>,
    marks: Option<usize>,
}

impl ColumnMap {
    /// Locate every logical column in `headers`.
    ///
    /// Fails with [`ConvertError::MissingColumns`] naming every required
    /// column that could not be found.
    pub fn resolve(headers: &[String]) -> ConvertResult<Self> {
        let normalized: Vec<String> = headers.iter().map(|h| normalize_key(h)).collect();

        let find = |column: Column| -> Option<usize> {
            column.aliases().iter().find_map(|alias| {
                let key = normalize_key(alias);
                normalized.iter().position(|h| *h == key)
            })
        };

        let missing: Vec<String> = Column::ALL
            .iter()
            .filter(|c| c.is_required() && find(**c).is_none())
            .map(|c| c.label().to_string())
            .collect();

        match (
            find(Column::RowType),
            find(Column::QuestionText),
            find(Column::AnswerText),
            find(Column::CorrectFlag),
        ) {
            (Some(row_type), Some(question_text), Some(answer_text), Some(correct_flag))
                if missing.is_empty() =>
            {
                Ok(Self {
                    headers: headers.to_vec(),
                    row_type,
                    question_text,
                    answer_text,
                    correct_flag,
                    difficulty: find(Column::Difficulty),
                    question_type: find(Column::QuestionType),
                    marks: find(Column::Marks),
                })
            }
            _ => Err(ConvertError::MissingColumns {
                missing,
                found: headers.to_vec(),
            }),
        }
    }

    /// Position of a logical column, if present.
    pub fn index(&self, column: Column) -> Option<usize> {
        match column {
            Column::RowType => Some(self.row_type),
            Column::QuestionText => Some(self.question_text),
            Column::AnswerText => Some(self.answer_text),
            Column::CorrectFlag => Some(self.correct_flag),
            Column::Difficulty => self.difficulty,
            Column::QuestionType => self.question_type,
            Column::Marks => self.marks,
        }
    }

    /// Text column read for a row of the given kind.
    pub fn text_column(row_type: RowType) -> Column {
        match row_type {
            RowType::Question => Column::QuestionText,
            RowType::Answer => Column::AnswerText,
        }
    }

    /// Header as written in the source, falling back to the first alias.
    pub fn header(&self, column: Column) -> &str {
        self.index(column)
            .and_then(|i| self.headers.get(i))
            .map(String::as_str)
            .unwrap_or(column.aliases()[0])
    }
}

// =============================================================================
// Parse result
// =============================================================================

/// Result of parsing with metadata
#[derive(Debug, Clone)]
pub struct ParseResult {
    /// Tagged rows in source order (blank and unknown rows removed)
    pub rows: Vec<SourceRow>,
    /// Rows skipped with a reason
    pub warnings: Vec<Warning>,
    /// Detected or used encoding
    pub encoding: String,
    /// Detected or used delimiter
    pub delimiter: char,
    /// Column headers
    pub headers: Vec<String>,
    /// Resolved logical columns
    pub columns: ColumnMap,
    /// Data records read, including skipped ones
    pub record_count: usize,
}

// =============================================================================
// Encoding & delimiter detection
// =============================================================================

/// Detect the encoding of raw bytes.
///
/// Valid UTF-8 (with or without BOM) is reported as `utf-8`; anything else
/// goes through chardet.
pub fn detect_encoding(bytes: &[u8]) -> String {
    if std::str::from_utf8(strip_bom(bytes)).is_ok() {
        return "utf-8".to_string();
    }

    let result = chardet::detect(bytes);
    let charset = result.0;

    // Normalize charset names
    match charset.to_lowercase().as_str() {
        "ascii" | "utf-8" | "utf8" => "utf-8".to_string(),
        "iso-8859-1" | "iso-8859-15" | "latin-1" | "latin1" => "iso-8859-1".to_string(),
        "windows-1252" | "cp1252" => "windows-1252".to_string(),
        "" => "windows-1252".to_string(),
        other => other.to_string(),
    }
}

/// Decode bytes to string using the specified encoding.
///
/// Unknown labels decode as windows-1252, which never fails and matches how
/// spreadsheet tools export "ANSI" CSV files.
pub fn decode_content(bytes: &[u8], encoding: &str) -> String {
    let bytes = strip_bom(bytes);
    match encoding.to_lowercase().as_str() {
        "utf-8" | "utf8" | "ascii" => String::from_utf8_lossy(bytes).into_owned(),
        "iso-8859-1" | "latin-1" | "latin1" | "windows-1252" | "cp1252" => {
            encoding_rs::WINDOWS_1252.decode(bytes).0.into_owned()
        }
        other => {
            let encoding = encoding_rs::Encoding::for_label(other.as_bytes())
                .unwrap_or(encoding_rs::WINDOWS_1252);
            encoding.decode(bytes).0.into_owned()
        }
    }
}

fn strip_bom(bytes: &[u8]) -> &[u8] {
    bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes)
}

/// Detect the delimiter by counting occurrences in the first line.
///
/// Defaults to `,` when no candidate appears.
pub fn detect_delimiter(content: &str) -> char {
    let first_line = content.lines().next().unwrap_or("");

    let separators = [',', ';', '\t', '|'];
    let mut best_sep = ',';
    let mut best_count = 0;

    for &sep in &separators {
        let count = first_line.matches(sep).count();
        if count > best_count {
            best_count = count;
            best_sep = sep;
        }
    }

    best_sep
}

// =============================================================================
// Parsing
// =============================================================================

/// Parse a question bank file with auto-detection of encoding and delimiter.
pub fn parse_file<P: AsRef<Path>>(path: P, delimiter: Option<char>) -> ConvertResult<ParseResult> {
    let path = path.as_ref();
    let bytes = std::fs::read(path).map_err(|source| ConvertError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    parse_bytes(&bytes, delimiter)
}

/// Parse question bank bytes with auto-detection of encoding and delimiter.
pub fn parse_bytes(bytes: &[u8], delimiter: Option<char>) -> ConvertResult<ParseResult> {
    let encoding = detect_encoding(bytes);
    let content = decode_content(bytes, &encoding);
    let delimiter = delimiter.unwrap_or_else(|| detect_delimiter(&content));

    parse_str(&content, delimiter, encoding)
}

/// Parse decoded CSV text with an explicit delimiter.
pub fn parse_str(content: &str, delimiter: char, encoding: String) -> ConvertResult<ParseResult> {
    let delimiter_byte = u8::try_from(delimiter)
        .ok()
        .filter(u8::is_ascii)
        .ok_or_else(|| ConvertError::Malformed {
            line: 1,
            message: format!("delimiter '{}' is not an ASCII character", delimiter),
        })?;

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter_byte)
        .has_headers(true)
        .flexible(true)
        .from_reader(content.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .map_err(malformed)?
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').trim().to_string())
        .collect();

    if headers.iter().all(|h| h.is_empty()) {
        return Err(ConvertError::EmptyFile);
    }

    let columns = ColumnMap::resolve(&headers)?;

    let mut rows = Vec::new();
    let mut warnings = Vec::new();
    let mut record_count = 0;

    for result in reader.records() {
        let record = result.map_err(malformed)?;
        record_count += 1;

        let line = record.position().map(|p| p.line()).unwrap_or(record_count as u64 + 1);
        let cell = |column: Column| -> Option<String> {
            columns
                .index(column)
                .and_then(|i| record.get(i))
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(String::from)
        };

        let Some(tag) = cell(Column::RowType) else {
            continue;
        };

        let Some(row_type) = RowType::from_code(&tag) else {
            warnings.push(Warning::at(
                line,
                format!("unrecognized {} value '{}'; row skipped", columns.header(Column::RowType), tag),
            ));
            continue;
        };

        rows.push(SourceRow {
            line,
            row_type,
            text: cell(ColumnMap::text_column(row_type)).unwrap_or_default(),
            difficulty: cell(Column::Difficulty),
            question_type: cell(Column::QuestionType),
            correct_flag: cell(Column::CorrectFlag),
            marks: cell(Column::Marks),
        });
    }

    Ok(ParseResult {
        rows,
        warnings,
        encoding,
        delimiter,
        headers,
        columns,
        record_count,
    })
}

fn malformed(err: csv::Error) -> ConvertError {
    ConvertError::Malformed {
        line: err.position().map(|p| p.line()).unwrap_or(0),
        message: err.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "TNpe,Description,IsRightAnswer,LEVEL,QuestionTNpe,Marks";

    fn parse(csv: &str) -> ConvertResult<ParseResult> {
        parse_bytes(csv.as_bytes(), None)
    }

    #[test]
    fn test_simple_question_bank() {
        let csv = format!("{HEADER}\nQ,What is 2+2?,,1,R,2\nA,3,N,,,\nA,4,Y,,,\n");
        let result = parse(&csv).unwrap();

        assert_eq!(result.rows.len(), 3);
        assert_eq!(result.rows[0].row_type, RowType::Question);
        assert_eq!(result.rows[0].text, "What is 2+2?");
        assert_eq!(result.rows[0].difficulty.as_deref(), Some("1"));
        assert_eq!(result.rows[0].marks.as_deref(), Some("2"));
        assert_eq!(result.rows[2].correct_flag.as_deref(), Some("Y"));
        assert_eq!(result.record_count, 3);
    }

    #[test]
    fn test_line_numbers_count_header_and_blank_lines() {
        let csv = format!("{HEADER}\nQ,First,,,,\n\nA,Yes,Y,,,\n");
        let result = parse(&csv).unwrap();

        assert_eq!(result.rows[0].line, 2);
        assert_eq!(result.rows[1].line, 4);
    }

    #[test]
    fn test_quoted_values_with_commas() {
        let csv = "Type,Description,IsRightAnswer\nQ,\"Pick one, please\",\nA,\"1,000\",Y\n";
        let result = parse(csv).unwrap();

        assert_eq!(result.rows[0].text, "Pick one, please");
        assert_eq!(result.rows[1].text, "1,000");
    }

    #[test]
    fn test_trailing_whitespace_trimmed() {
        let csv = "Type,Description,IsRightAnswer\n q ,  Capital of France?  ,\nA, Paris ,y \n";
        let result = parse(csv).unwrap();

        assert_eq!(result.rows[0].row_type, RowType::Question);
        assert_eq!(result.rows[0].text, "Capital of France?");
        assert_eq!(result.rows[1].correct_flag.as_deref(), Some("y"));
    }

    #[test]
    fn test_unknown_row_type_warns() {
        let csv = "Type,Description,IsRightAnswer\nQ,Question,\nX,Stray,\n,blank tag,\n";
        let result = parse(csv).unwrap();

        assert_eq!(result.rows.len(), 1);
        assert_eq!(result.warnings.len(), 1);
        assert_eq!(result.warnings[0].line, Some(3));
        assert!(result.warnings[0].message.contains("'X'"));
    }

    #[test]
    fn test_optional_columns_may_be_absent() {
        let csv = "Type,Description,IsRightAnswer\nQ,Question,\n";
        let result = parse(csv).unwrap();

        assert!(result.columns.index(Column::Difficulty).is_none());
        assert!(result.rows[0].difficulty.is_none());
        assert!(result.rows[0].marks.is_none());
    }

    #[test]
    fn test_missing_required_columns() {
        let csv = "Description,LEVEL\nWhat?,1\n";
        let err = parse(csv).unwrap_err();

        match err {
            ConvertError::MissingColumns { missing, found } => {
                assert_eq!(missing.len(), 2);
                assert!(!missing.iter().any(|m| m.contains("text")));
                assert!(missing[0].contains("row type"));
                assert!(missing[1].contains("correct flag"));
                assert_eq!(found, vec!["Description", "LEVEL"]);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_empty_file_is_structural() {
        let err = parse("").unwrap_err();
        assert!(matches!(err, ConvertError::EmptyFile));
        assert!(err.is_structural());
    }

    #[test]
    fn test_header_aliases_are_normalized() {
        let headers: Vec<String> = ["tnpe", "Is Right Answer", "description", "QuestionTNpe(R=Radio,C=Checkbox,L=Onelinner)"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let map = ColumnMap::resolve(&headers).unwrap();

        assert_eq!(map.index(Column::RowType), Some(0));
        assert_eq!(map.index(Column::CorrectFlag), Some(1));
        assert_eq!(map.index(Column::QuestionText), Some(2));
        assert_eq!(map.index(Column::AnswerText), Some(2));
        assert_eq!(map.index(Column::QuestionType), Some(3));
        assert_eq!(map.header(Column::CorrectFlag), "Is Right Answer");
    }

    #[test]
    fn test_separate_question_and_answer_columns() {
        let csv = "TNpe,Question,Answer,IsRightAnswer\n\
                   Q,Capital of France?,,\n\
                   A,,Paris,Y\n\
                   A,,Lyon,\n";
        let result = parse(csv).unwrap();

        assert_eq!(result.columns.header(Column::QuestionText), "Question");
        assert_eq!(result.columns.header(Column::AnswerText), "Answer");
        assert_eq!(result.rows[0].text, "Capital of France?");
        assert_eq!(result.rows[1].text, "Paris");
        assert_eq!(result.rows[2].text, "Lyon");
    }

    #[test]
    fn test_easy_header_is_difficulty() {
        let csv = "TNpe,Description,IsRightAnswer,EASY\nQ,Question,,2\n";
        let result = parse(csv).unwrap();

        assert_eq!(result.columns.header(Column::Difficulty), "EASY");
        assert_eq!(result.rows[0].difficulty.as_deref(), Some("2"));
    }

    #[test]
    fn test_detect_delimiter_semicolon() {
        assert_eq!(detect_delimiter("a;b;c\n1;2;3"), ';');
    }

    #[test]
    fn test_detect_delimiter_tab() {
        assert_eq!(detect_delimiter("a\tb\tc\n1\t2\t3"), '\t');
    }

    #[test]
    fn test_detect_delimiter_defaults_to_comma() {
        assert_eq!(detect_delimiter("single"), ',');
    }

    #[test]
    fn test_semicolon_file() {
        let csv = "TNpe;Description;IsRightAnswer\nQ;Question;\nA;Answer;Y\n";
        let result = parse(csv).unwrap();
        assert_eq!(result.delimiter, ';');
        assert_eq!(result.rows.len(), 2);
    }

    #[test]
    fn test_utf8_bom_stripped() {
        let mut bytes = UTF8_BOM.to_vec();
        bytes.extend_from_slice(b"TNpe,Description,IsRightAnswer\nQ,Caf\xC3\xA9?,\n");
        let result = parse_bytes(&bytes, None).unwrap();

        assert_eq!(result.encoding, "utf-8");
        assert_eq!(result.headers[0], "TNpe");
        assert_eq!(result.rows[0].text, "Café?");
    }

    #[test]
    fn test_latin1_decoding() {
        // "Société" in ISO-8859-1
        let bytes: &[u8] = &[0x53, 0x6F, 0x63, 0x69, 0xE9, 0x74, 0xE9];
        let decoded = decode_content(bytes, "iso-8859-1");
        assert_eq!(decoded, "Société");
    }

    #[test]
    fn test_non_ascii_delimiter_rejected() {
        let err = parse_str("a§b", '§', "utf-8".into()).unwrap_err();
        assert!(err.is_structural());
    }
}
