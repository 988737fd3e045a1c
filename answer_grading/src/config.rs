// ********* Input data structures ***********

use std::collections::HashMap;
use std::error::Error;
use std::fmt::Display;

use serde::Serialize;

/// Number of answers in each subject block of a tamgu row.
pub const TAMGU_BLOCK_SIZE: usize = 20;

/// Columns that precede the answers in a tamgu row: student id and the two subject codes.
pub const TAMGU_LEADING_COLUMNS: usize = 3;

/// Columns that precede the answers in a standard row: student id and subject code.
pub const STANDARD_LEADING_COLUMNS: usize = 2;

/// The answers of one student for one subject.
///
/// Answers are positional: index 0 is question 1. A blank cell is kept as an
/// empty string and graded as a missing answer.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct StudentAnswerRow {
    pub student_id: String,
    pub subject_code: String,
    pub answers: Vec<String>,
}

/// A wide row that carries two subjects side by side.
///
/// It must go through [crate::tamgu::expand_tamgu_row] before grading.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct TamguRow {
    pub student_id: String,
    pub first_subject: String,
    pub second_subject: String,
    pub answers: Vec<String>,
}

/// One line of the optional roster file.
#[derive(Eq, PartialEq, Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RosterEntry {
    pub student_number: String,
    pub phone: Option<String>,
    pub name: String,
}

// ******** Output data structures *********

/// Which lookup of the roster produced a match.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum MatchStage {
    /// Student number and phone concatenated, compared exactly.
    Full,
    /// The identifier starts with the student number.
    StudentNumber,
    /// The identifier ends with the phone number.
    Phone,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedIdentity {
    pub name: String,
    pub student_number: String,
    pub phone: Option<String>,
    pub matched_by: MatchStage,
}

/// The score of one student for one subject.
#[derive(Eq, PartialEq, Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GradingResult {
    pub student_id: String,
    pub identity: Option<ResolvedIdentity>,
    pub subject_code: String,
    pub subject_name: String,
    pub score: u64,
    pub max_score: u64,
    pub correct_count: u32,
    pub total_questions: u32,
    /// 1-based question numbers, in increasing order.
    pub wrong_questions: Vec<u32>,
}

impl GradingResult {
    /// The display name if the roster knows this student, the raw identifier otherwise.
    pub fn display_name(&self) -> &str {
        self.identity
            .as_ref()
            .map(|i| i.name.as_str())
            .unwrap_or(self.student_id.as_str())
    }
}

/// Recoverable problems found while building indexes or grading.
///
/// None of them stops a run. They are reported in the order the input was read.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum Diagnostic {
    /// No answer key exists for this subject code. The row produced no result.
    UnmatchedSubject {
        student_id: String,
        subject_code: String,
        available: Vec<String>,
    },
    /// The points of a question could not be read as a non-negative number and count as 0.
    NonNumericPoints {
        subject_code: String,
        question: u32,
        raw: String,
    },
    /// The student row is shorter than the answer key. Missing answers are wrong.
    ShortAnswerRow {
        student_id: String,
        subject_code: String,
        expected: usize,
        found: usize,
    },
    /// A roster line with either the student number or the name missing.
    MalformedRosterRow {
        lineno: usize,
        student_number: String,
        name: String,
    },
    /// A tamgu row dropped because one of its answer blocks was incomplete.
    SkippedTamguRow { student_id: String, missing: usize },
}

impl Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Diagnostic::UnmatchedSubject {
                student_id,
                subject_code,
                available,
            } => write!(
                f,
                "no answer key for subject code '{}' (student {}), available codes: [{}]",
                subject_code,
                student_id,
                available.join(", ")
            ),
            Diagnostic::NonNumericPoints {
                subject_code,
                question,
                raw,
            } => write!(
                f,
                "subject '{}' question {}: points '{}' are not a non-negative number, using 0",
                subject_code, question, raw
            ),
            Diagnostic::ShortAnswerRow {
                student_id,
                subject_code,
                expected,
                found,
            } => write!(
                f,
                "student {} subject '{}': {} answers for {} questions, missing answers are graded wrong",
                student_id, subject_code, found, expected
            ),
            Diagnostic::MalformedRosterRow {
                lineno,
                student_number,
                name,
            } => write!(
                f,
                "roster line {}: skipped (student number '{}', name '{}')",
                lineno, student_number, name
            ),
            Diagnostic::SkippedTamguRow {
                student_id,
                missing,
            } => write!(
                f,
                "student {}: tamgu row skipped, {} answers missing",
                student_id, missing
            ),
        }
    }
}

/// Errors that stop the processing of a whole input table.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum GradingErrors {
    /// The answer key table does not have the expected shape.
    MalformedKeyFile {
        reason: String,
        columns: usize,
        example: Option<Vec<String>>,
    },
    /// The student table is narrower than its layout requires.
    MalformedStudentFile {
        layout: StudentLayout,
        columns: usize,
        missing: usize,
    },
    /// A tamgu row does not carry two full answer blocks.
    IncompleteAnswerBlock { student_id: String, missing: usize },
    /// The roster table is narrower than [student number, phone, name].
    MalformedRosterFile { columns: usize },
}

impl Error for GradingErrors {}

impl Display for GradingErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GradingErrors::MalformedKeyFile {
                reason,
                columns,
                example,
            } => {
                write!(
                    f,
                    "malformed answer key ({} columns, expected subject, question, answer, points): {}",
                    columns, reason
                )?;
                if let Some(row) = example {
                    write!(f, " offending row: {:?}", row)?;
                }
                Ok(())
            }
            GradingErrors::MalformedStudentFile {
                layout,
                columns,
                missing,
            } => write!(
                f,
                "malformed {:?} student file: {} columns, {} more required",
                layout, columns, missing
            ),
            GradingErrors::IncompleteAnswerBlock {
                student_id,
                missing,
            } => write!(
                f,
                "student {}: incomplete tamgu answer block, {} answers missing",
                student_id, missing
            ),
            GradingErrors::MalformedRosterFile { columns } => write!(
                f,
                "malformed roster: {} columns, expected student number, phone, name",
                columns
            ),
        }
    }
}

// ********* Configuration **********

/// The shape of a student answer table.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum StudentLayout {
    /// [student id, subject code, answer 1 .. answer N]
    Standard,
    /// [student id, subject code 1, subject code 2, 20 answers, 20 answers]
    Tamgu,
}

impl StudentLayout {
    /// The smallest table width accepted for this layout.
    pub fn min_columns(&self) -> usize {
        match self {
            StudentLayout::Standard => STANDARD_LEADING_COLUMNS + 1,
            StudentLayout::Tamgu => TAMGU_LEADING_COLUMNS + 2 * TAMGU_BLOCK_SIZE,
        }
    }
}

/// What to do with a tamgu row whose answer blocks are incomplete.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum TamguPolicy {
    /// Fail the whole file with [GradingErrors::IncompleteAnswerBlock].
    Abort,
    /// Drop the row and report [Diagnostic::SkippedTamguRow].
    Skip,
}

/// Mapping from subject code to a display name.
pub type SubjectNames = HashMap<String, String>;
