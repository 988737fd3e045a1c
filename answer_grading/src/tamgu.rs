//! Splitting of tamgu rows.
//!
//! A tamgu sheet records two subjects per line:
//!
//! ```text
//! id,code 1,code 2,a1,...,a20,a21,...,a40
//! ```
//!
//! Each line becomes two ordinary rows, the second block renumbered from question 1.

use log::{debug, warn};

use crate::config::*;

impl TamguRow {
    /// Reads a raw table line. Missing leading cells become empty strings.
    pub fn from_cells(cells: &[String]) -> TamguRow {
        let cell = |idx: usize| cells.get(idx).map(|s| s.trim().to_string()).unwrap_or_default();
        TamguRow {
            student_id: cell(0),
            first_subject: cell(1),
            second_subject: cell(2),
            answers: cells.iter().skip(TAMGU_LEADING_COLUMNS).cloned().collect(),
        }
    }

    /// How many answers are lacking to fill both blocks.
    pub fn missing_answers(&self) -> usize {
        (2 * TAMGU_BLOCK_SIZE).saturating_sub(self.answers.len())
    }
}

/// Splits one tamgu row into its two subject rows.
///
/// Answers past the second block are ignored.
pub fn expand_tamgu_row(row: &TamguRow) -> Result<[StudentAnswerRow; 2], GradingErrors> {
    let missing = row.missing_answers();
    if missing > 0 {
        return Err(GradingErrors::IncompleteAnswerBlock {
            student_id: row.student_id.clone(),
            missing,
        });
    }
    let first = StudentAnswerRow {
        student_id: row.student_id.clone(),
        subject_code: row.first_subject.clone(),
        answers: row.answers[..TAMGU_BLOCK_SIZE].to_vec(),
    };
    let second = StudentAnswerRow {
        student_id: row.student_id.clone(),
        subject_code: row.second_subject.clone(),
        answers: row.answers[TAMGU_BLOCK_SIZE..2 * TAMGU_BLOCK_SIZE].to_vec(),
    };
    Ok([first, second])
}

/// Expands every line of a tamgu table, in order.
///
/// `columns` is the width of the table. Lines with all cells blank are ignored.
pub fn expand_tamgu_table(
    rows: &[Vec<String>],
    columns: usize,
    policy: TamguPolicy,
) -> Result<(Vec<StudentAnswerRow>, Vec<Diagnostic>), GradingErrors> {
    check_table_width(StudentLayout::Tamgu, columns)?;
    let mut res: Vec<StudentAnswerRow> = Vec::with_capacity(2 * rows.len());
    let mut diagnostics: Vec<Diagnostic> = Vec::new();
    for cells in rows.iter() {
        if cells.iter().all(|c| c.trim().is_empty()) {
            continue;
        }
        let row = TamguRow::from_cells(cells);
        match (expand_tamgu_row(&row), policy) {
            (Ok(pair), _) => {
                debug!(
                    "expand_tamgu_table: {} -> subjects {} and {}",
                    row.student_id, row.first_subject, row.second_subject
                );
                res.extend(pair);
            }
            (
                Err(GradingErrors::IncompleteAnswerBlock {
                    student_id,
                    missing,
                }),
                TamguPolicy::Skip,
            ) => {
                warn!(
                    "expand_tamgu_table: skipping student {}: {} answers missing",
                    student_id, missing
                );
                diagnostics.push(Diagnostic::SkippedTamguRow { student_id, missing });
            }
            (Err(e), _) => return Err(e),
        }
    }
    Ok((res, diagnostics))
}

/// Fails when a student table is narrower than its layout requires.
pub fn check_table_width(layout: StudentLayout, columns: usize) -> Result<(), GradingErrors> {
    let required = layout.min_columns();
    if columns < required {
        return Err(GradingErrors::MalformedStudentFile {
            layout,
            columns,
            missing: required - columns,
        });
    }
    Ok(())
}
