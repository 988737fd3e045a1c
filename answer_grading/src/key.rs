//! The answer key index: for every subject code, the correct answers and
//! their points in question order.

use std::collections::HashMap;

use log::info;

use crate::builder::KeyBuilder;
use crate::config::*;

/// Columns of an answer key table: subject code, question number, correct answer, points.
pub const KEY_COLUMNS: usize = 4;

/// The answers and points of one subject, as parallel arrays.
///
/// Position `i` holds question `i + 1` after sorting.
#[derive(PartialEq, Debug, Clone)]
pub struct SubjectKey {
    pub answers: Vec<String>,
    pub points: Vec<f64>,
}

impl SubjectKey {
    pub fn num_questions(&self) -> usize {
        self.answers.len()
    }

    /// The sum of all points, before truncation.
    pub fn max_points(&self) -> f64 {
        self.points.iter().sum()
    }
}

/// Read-only index of all subjects of an exam.
#[derive(PartialEq, Debug, Clone)]
pub struct AnswerKey {
    subjects: Vec<(String, SubjectKey)>,
    by_code: HashMap<String, usize>,
}

impl AnswerKey {
    pub(crate) fn new(subjects: Vec<(String, SubjectKey)>) -> AnswerKey {
        let by_code = subjects
            .iter()
            .enumerate()
            .map(|(idx, (code, _))| (code.clone(), idx))
            .collect();
        AnswerKey { subjects, by_code }
    }

    /// Builds the index from the rows of an answer key table.
    ///
    /// `columns` is the width of the table (usually the width of its header).
    /// Rows whose cells are all blank are ignored.
    pub fn from_table(
        rows: &[Vec<String>],
        columns: usize,
    ) -> Result<(AnswerKey, Vec<Diagnostic>), GradingErrors> {
        if columns < KEY_COLUMNS {
            return Err(GradingErrors::MalformedKeyFile {
                reason: format!("{} columns missing", KEY_COLUMNS - columns),
                columns,
                example: rows.first().cloned(),
            });
        }
        let mut builder = KeyBuilder::new();
        let mut num_rows = 0;
        for row in rows.iter() {
            if row.iter().all(|c| c.trim().is_empty()) {
                continue;
            }
            // Only the subject code and the question number are required: missing answer
            // and points cells read as blank, like padded spreadsheet rows.
            if row.len() < 2 {
                return Err(GradingErrors::MalformedKeyFile {
                    reason: format!("row with only {} cells", row.len()),
                    columns,
                    example: Some(row.clone()),
                });
            }
            let cell = |i: usize| row.get(i).map(|s| s.as_str()).unwrap_or("");
            let question =
                parse_question_number(cell(1)).ok_or_else(|| GradingErrors::MalformedKeyFile {
                    reason: format!("question number '{}' is not a positive integer", cell(1)),
                    columns,
                    example: Some(row.clone()),
                })?;
            builder
                .add_entry(cell(0), question, cell(2), cell(3))
                .map_err(|e| match e {
                    GradingErrors::MalformedKeyFile { reason, .. } => {
                        GradingErrors::MalformedKeyFile {
                            reason,
                            columns,
                            example: Some(row.clone()),
                        }
                    }
                    e => e,
                })?;
            num_rows += 1;
        }
        if num_rows == 0 {
            return Err(GradingErrors::MalformedKeyFile {
                reason: "no answer rows".to_string(),
                columns,
                example: None,
            });
        }
        let (key, diagnostics) = builder.build()?;
        info!(
            "Answer key: {} rows, {} subjects: {:?}",
            num_rows,
            key.subjects.len(),
            key.subject_codes()
        );
        Ok((key, diagnostics))
    }

    pub fn subject(&self, code: &str) -> Option<&SubjectKey> {
        self.by_code.get(code).map(|idx| &self.subjects[*idx].1)
    }

    /// Subject codes in the order they first appear in the key table.
    pub fn subject_codes(&self) -> Vec<String> {
        self.subjects.iter().map(|(code, _)| code.clone()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.subjects.is_empty()
    }
}

/// Accepts "3" as well as "3.0", which is what spreadsheets tend to produce.
fn parse_question_number(raw: &str) -> Option<u32> {
    let s = raw.trim();
    if let Ok(q) = s.parse::<u32>() {
        return if q > 0 { Some(q) } else { None };
    }
    match s.parse::<f64>() {
        Ok(f) if f.fract() == 0.0 && (1.0..=u32::MAX as f64).contains(&f) => Some(f as u32),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn builds_from_table() {
        let rows = vec![
            row(&["MATH01", "2", "3", "5"]),
            row(&["MATH01", "1", "1", "5"]),
            row(&["ENG01", "1.0", "4", "10"]),
        ];
        let (key, diags) = AnswerKey::from_table(&rows, 4).unwrap();
        assert!(diags.is_empty());
        let math = key.subject("MATH01").unwrap();
        assert_eq!(math.answers, vec!["1", "3"]);
        assert_eq!(math.max_points(), 10.0);
        assert_eq!(key.subject("ENG01").unwrap().num_questions(), 1);
        assert_eq!(key.subject("SCI01"), None);
    }

    #[test]
    fn too_few_columns() {
        let rows = vec![row(&["MATH01", "1", "1"])];
        match AnswerKey::from_table(&rows, 3) {
            Err(GradingErrors::MalformedKeyFile {
                columns, example, ..
            }) => {
                assert_eq!(columns, 3);
                assert_eq!(example, Some(row(&["MATH01", "1", "1"])));
            }
            x => panic!("unexpected {:?}", x),
        }
    }

    #[test]
    fn no_rows() {
        assert!(matches!(
            AnswerKey::from_table(&[], 4),
            Err(GradingErrors::MalformedKeyFile { .. })
        ));
        let blank = vec![row(&["", " ", "", ""])];
        assert!(matches!(
            AnswerKey::from_table(&blank, 4),
            Err(GradingErrors::MalformedKeyFile { .. })
        ));
    }

    #[test]
    fn bad_question_number() {
        let rows = vec![row(&["MATH01", "first", "1", "5"])];
        assert!(matches!(
            AnswerKey::from_table(&rows, 4),
            Err(GradingErrors::MalformedKeyFile { .. })
        ));
        assert_eq!(parse_question_number("0"), None);
        assert_eq!(parse_question_number("2.5"), None);
        assert_eq!(parse_question_number(" 7 "), Some(7));
    }

    #[test]
    fn non_numeric_points_are_recoverable() {
        let rows = vec![
            row(&["MATH01", "1", "1", "five"]),
            row(&["MATH01", "2", "2", "5"]),
        ];
        let (key, diags) = AnswerKey::from_table(&rows, 4).unwrap();
        assert_eq!(key.subject("MATH01").unwrap().points, vec![0.0, 5.0]);
        assert_eq!(diags.len(), 1);
    }

    #[test]
    fn ragged_row_has_blank_points() {
        // A CSV line without its points cell reads like the padded row of a spreadsheet.
        let ragged = AnswerKey::from_table(&[row(&["M", "1", "3"])], 4).unwrap();
        let padded = AnswerKey::from_table(&[row(&["M", "1", "3", ""])], 4).unwrap();
        assert_eq!(ragged, padded);
        let (key, diags) = ragged;
        assert_eq!(key.subject("M").unwrap().answers, vec!["3"]);
        assert_eq!(key.subject("M").unwrap().points, vec![0.0]);
        assert_eq!(
            diags,
            vec![Diagnostic::NonNumericPoints {
                subject_code: "M".to_string(),
                question: 1,
                raw: "".to_string()
            }]
        );
        // Without its answer, the question is still in the key and nobody gets it right.
        let (key, _) = AnswerKey::from_table(&[row(&["M", "1"])], 4).unwrap();
        assert_eq!(key.subject("M").unwrap().num_questions(), 1);
    }

    #[test]
    fn row_without_question_number() {
        assert!(matches!(
            AnswerKey::from_table(&[row(&["M"])], 4),
            Err(GradingErrors::MalformedKeyFile { .. })
        ));
    }
}
