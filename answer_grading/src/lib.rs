mod config;
pub mod builder;
pub mod key;
pub mod manual;
pub mod roster;
pub mod stats;
pub mod tamgu;

use log::{debug, info};

pub use crate::config::*;
pub use crate::key::{AnswerKey, SubjectKey};
pub use crate::roster::Roster;
pub use crate::tamgu::{check_table_width, expand_tamgu_row, expand_tamgu_table};

/// Everything the grading of a row may consult. Built once per run, read-only afterwards.
#[derive(Debug, Clone)]
pub struct GradingContext {
    pub key: AnswerKey,
    pub roster: Option<Roster>,
    pub subject_names: SubjectNames,
}

impl GradingContext {
    pub fn new(key: AnswerKey) -> GradingContext {
        GradingContext {
            key,
            roster: None,
            subject_names: SubjectNames::new(),
        }
    }

    pub fn with_roster(self, roster: Roster) -> GradingContext {
        GradingContext {
            roster: Some(roster),
            ..self
        }
    }

    pub fn with_subject_names(self, subject_names: SubjectNames) -> GradingContext {
        GradingContext {
            subject_names,
            ..self
        }
    }

    /// The display name of a subject, or the code itself when it has none.
    pub fn subject_name(&self, code: &str) -> String {
        self.subject_names
            .get(code)
            .cloned()
            .unwrap_or_else(|| code.to_string())
    }
}

/// The outcome of grading a sequence of rows.
///
/// Both sequences follow the order of the input rows.
#[derive(PartialEq, Debug, Clone, Default)]
pub struct GradingRun {
    pub results: Vec<GradingResult>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Compares a student answer to the correct one.
///
/// Both sides are trimmed and a blank side never matches. `NaN` counts as blank:
/// spreadsheet exports use it for empty cells. When both sides parse as numbers
/// they are compared numerically ("1", "1.0" and "01" are the same answer, so are
/// "inf" and "Infinity"), otherwise as exact, case-sensitive strings.
pub fn answers_match(student: &str, correct: &str) -> bool {
    let s = student.trim();
    let c = correct.trim();
    if is_blank(s) || is_blank(c) {
        return false;
    }
    match (s.parse::<f64>(), c.parse::<f64>()) {
        (Ok(x), Ok(y)) => x == y,
        _ => s == c,
    }
}

fn is_blank(s: &str) -> bool {
    s.is_empty() || s.parse::<f64>().map_or(false, |x| x.is_nan())
}

/// Grades one row against the key of its subject.
///
/// Returns the result with the advisory diagnostics of this row, or the
/// diagnostic explaining why the row produced no result.
pub fn grade_row(
    row: &StudentAnswerRow,
    ctx: &GradingContext,
) -> Result<(GradingResult, Vec<Diagnostic>), Diagnostic> {
    let subject = ctx
        .key
        .subject(&row.subject_code)
        .ok_or_else(|| Diagnostic::UnmatchedSubject {
            student_id: row.student_id.clone(),
            subject_code: row.subject_code.clone(),
            available: ctx.key.subject_codes(),
        })?;

    let mut warnings: Vec<Diagnostic> = Vec::new();
    let total_questions = subject.num_questions();
    if row.answers.len() < total_questions {
        warnings.push(Diagnostic::ShortAnswerRow {
            student_id: row.student_id.clone(),
            subject_code: row.subject_code.clone(),
            expected: total_questions,
            found: row.answers.len(),
        });
    }

    let mut total_points: f64 = 0.0;
    let mut correct_count: u32 = 0;
    let mut wrong_questions: Vec<u32> = Vec::new();
    let key_entries = subject.answers.iter().zip(subject.points.iter());
    for (idx, (correct, points)) in key_entries.enumerate() {
        let question = (idx + 1) as u32;
        match row.answers.get(idx) {
            Some(given) if answers_match(given, correct) => {
                total_points += points;
                correct_count += 1;
            }
            _ => wrong_questions.push(question),
        }
    }

    // Sums are truncated, not rounded: 9.5 points is a score of 9.
    let result = GradingResult {
        student_id: row.student_id.clone(),
        identity: ctx
            .roster
            .as_ref()
            .and_then(|r| r.resolve(&row.student_id)),
        subject_code: row.subject_code.clone(),
        subject_name: ctx.subject_name(&row.subject_code),
        score: total_points as u64,
        max_score: subject.max_points() as u64,
        correct_count,
        total_questions: total_questions as u32,
        wrong_questions,
    };
    debug!(
        "grade_row: {} {}: {}/{} correct, score {}/{}, wrong {:?}",
        result.student_id,
        result.subject_code,
        result.correct_count,
        result.total_questions,
        result.score,
        result.max_score,
        result.wrong_questions
    );
    Ok((result, warnings))
}

/// Grades all the rows, in order.
///
/// Rows without a matching subject are left out of the results and reported.
pub fn grade_rows(rows: &[StudentAnswerRow], ctx: &GradingContext) -> GradingRun {
    info!(
        "Grading {} rows against {} subjects",
        rows.len(),
        ctx.key.subject_codes().len()
    );
    let run = rows.iter().fold(GradingRun::default(), |mut run, row| {
        match grade_row(row, ctx) {
            Ok((result, warnings)) => {
                run.results.push(result);
                run.diagnostics.extend(warnings);
            }
            Err(diag) => run.diagnostics.push(diag),
        }
        run
    });
    info!(
        "Graded {} results, {} diagnostics",
        run.results.len(),
        run.diagnostics.len()
    );
    run
}

/// Reads the rows of a standard student table.
///
/// `columns` is the width of the table. Lines with all cells blank are ignored.
pub fn standard_rows_from_table(
    rows: &[Vec<String>],
    columns: usize,
) -> Result<Vec<StudentAnswerRow>, GradingErrors> {
    check_table_width(StudentLayout::Standard, columns)?;
    let res = rows
        .iter()
        .filter(|cells| !cells.iter().all(|c| c.trim().is_empty()))
        .map(|cells| {
            let cell = |i: usize| cells.get(i).map(|s| s.trim().to_string()).unwrap_or_default();
            StudentAnswerRow {
                student_id: cell(0),
                subject_code: cell(1),
                answers: cells
                    .iter()
                    .skip(STANDARD_LEADING_COLUMNS)
                    .cloned()
                    .collect(),
            }
        })
        .collect();
    Ok(res)
}

/// Reads a student table of either layout into uniform rows.
pub fn student_rows_from_table(
    layout: StudentLayout,
    rows: &[Vec<String>],
    columns: usize,
    policy: TamguPolicy,
) -> Result<(Vec<StudentAnswerRow>, Vec<Diagnostic>), GradingErrors> {
    match layout {
        StudentLayout::Standard => Ok((standard_rows_from_table(rows, columns)?, Vec::new())),
        StudentLayout::Tamgu => expand_tamgu_table(rows, columns, policy),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|s| s.to_string()).collect()
    }

    fn student(id: &str, subject: &str, answers: &[&str]) -> StudentAnswerRow {
        StudentAnswerRow {
            student_id: id.to_string(),
            subject_code: subject.to_string(),
            answers: row(answers),
        }
    }

    fn context() -> GradingContext {
        let _ = env_logger::builder().is_test(true).try_init();
        let rows = vec![
            row(&["MATH01", "1", "1", "5"]),
            row(&["MATH01", "2", "2", "5"]),
            row(&["MATH01", "3", "3", "10"]),
        ];
        let (key, _) = AnswerKey::from_table(&rows, 4).unwrap();
        GradingContext::new(key)
    }

    #[test]
    fn numeric_answers_ignore_formatting() {
        assert!(answers_match("1", "1"));
        assert!(answers_match("1.0", "1"));
        assert!(answers_match("01", "1"));
        assert!(answers_match(" 1 ", "1.00"));
        assert!(!answers_match("2", "1"));
    }

    #[test]
    fn string_answers_are_case_sensitive() {
        assert!(answers_match("A", "A"));
        assert!(!answers_match("A", "a"));
        assert!(answers_match(" B", "B "));
    }

    #[test]
    fn blank_never_matches() {
        assert!(!answers_match("", ""));
        assert!(!answers_match("  ", "1"));
        assert!(!answers_match("1", ""));
    }

    #[test]
    fn infinities_compare_as_numbers() {
        assert!(answers_match("inf", "Infinity"));
        assert!(answers_match("-inf", "-Infinity"));
        assert!(!answers_match("inf", "-inf"));
    }

    #[test]
    fn nan_is_a_blank_answer() {
        assert!(!answers_match("NaN", "NaN"));
        assert!(!answers_match("nan", "1"));
        assert!(!answers_match("1", "NaN"));
    }

    #[test]
    fn full_marks() {
        let row = student("s1", "MATH01", &["1", "2", "3"]);
        let (res, warnings) = grade_row(&row, &context()).unwrap();
        assert_eq!(res.score, 20);
        assert_eq!(res.max_score, 20);
        assert_eq!(res.correct_count, 3);
        assert_eq!(res.total_questions, 3);
        assert!(res.wrong_questions.is_empty());
        assert!(warnings.is_empty());
        assert_eq!(res.subject_name, "MATH01");
        assert_eq!(res.identity, None);
    }

    #[test]
    fn blank_and_wrong_answers() {
        let (res, _) = grade_row(&student("s1", "MATH01", &["1", "", "9"]), &context()).unwrap();
        assert_eq!(res.score, 5);
        assert_eq!(res.correct_count, 1);
        assert_eq!(res.wrong_questions, vec![2, 3]);
    }

    #[test]
    fn short_row_is_graded_with_a_warning() {
        let (res, warnings) = grade_row(&student("s1", "MATH01", &["1"]), &context()).unwrap();
        assert_eq!(res.score, 5);
        assert_eq!(res.wrong_questions, vec![2, 3]);
        assert_eq!(
            warnings,
            vec![Diagnostic::ShortAnswerRow {
                student_id: "s1".to_string(),
                subject_code: "MATH01".to_string(),
                expected: 3,
                found: 1
            }]
        );
    }

    #[test]
    fn fractional_points_are_truncated() {
        let rows = vec![
            row(&["S", "1", "A", "2.5"]),
            row(&["S", "2", "B", "2.5"]),
            row(&["S", "3", "C", "2.9"]),
        ];
        let (key, _) = AnswerKey::from_table(&rows, 4).unwrap();
        let ctx = GradingContext::new(key);
        let (res, _) = grade_row(&student("s1", "S", &["A", "x", "C"]), &ctx).unwrap();
        // 5.4 of 7.9
        assert_eq!(res.score, 5);
        assert_eq!(res.max_score, 7);
    }

    #[test]
    fn unmatched_subject_does_not_stop_the_run() {
        let rows = vec![
            student("s1", "MATH01", &["1", "2", "3"]),
            student("s2", "ART01", &["1", "2", "3"]),
            student("s3", "MATH01", &["1", "1", "1"]),
        ];
        let run = grade_rows(&rows, &context());
        let ids: Vec<&str> = run.results.iter().map(|r| r.student_id.as_str()).collect();
        assert_eq!(ids, vec!["s1", "s3"]);
        assert_eq!(
            run.diagnostics,
            vec![Diagnostic::UnmatchedSubject {
                student_id: "s2".to_string(),
                subject_code: "ART01".to_string(),
                available: vec!["MATH01".to_string()]
            }]
        );
    }

    #[test]
    fn grading_is_repeatable() {
        let rows = vec![
            student("s1", "MATH01", &["1", "2", "3"]),
            student("s2", "MATH01", &["3", "2"]),
        ];
        let ctx = context();
        assert_eq!(grade_rows(&rows, &ctx), grade_rows(&rows, &ctx));
    }

    #[test]
    fn identity_and_subject_name() {
        let (roster, _) =
            Roster::from_table(&[row(&["2024001", "5551234", "Kim"])], 3, 2).unwrap();
        let mut names = SubjectNames::new();
        names.insert("MATH01".to_string(), "Mathematics".to_string());
        let ctx = context().with_roster(roster).with_subject_names(names);
        let (res, _) = grade_row(&student("2024001", "MATH01", &["1", "2", "3"]), &ctx).unwrap();
        assert_eq!(res.subject_name, "Mathematics");
        assert_eq!(res.display_name(), "Kim");
        let (res, _) = grade_row(&student("777", "MATH01", &["1", "2", "3"]), &ctx).unwrap();
        assert_eq!(res.identity, None);
        assert_eq!(res.display_name(), "777");
    }

    #[test]
    fn standard_table() {
        let rows = vec![
            row(&[" 2024001 ", "MATH01", "1", "2"]),
            row(&["", "", "", ""]),
            row(&["2024002", "MATH01"]),
        ];
        let parsed = standard_rows_from_table(&rows, 4).unwrap();
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[0].student_id, "2024001");
        assert_eq!(parsed[0].answers, vec!["1", "2"]);
        assert!(parsed[1].answers.is_empty());
        assert!(matches!(
            standard_rows_from_table(&rows, 2),
            Err(GradingErrors::MalformedStudentFile { missing: 1, .. })
        ));
    }

    #[test]
    fn tamgu_rows_are_graded_like_standard_ones() {
        let mut key_rows = Vec::new();
        for code in ["11", "20"] {
            for q in 1..=20 {
                key_rows.push(vec![
                    code.to_string(),
                    q.to_string(),
                    "3".to_string(),
                    "5".to_string(),
                ]);
            }
        }
        let (key, _) = AnswerKey::from_table(&key_rows, 4).unwrap();
        let ctx = GradingContext::new(key);
        let mut cells = row(&["2024001", "11", "20"]);
        cells.extend((0..40).map(|i| (if i < 20 { "3" } else { "1" }).to_string()));
        let (rows, _) =
            student_rows_from_table(StudentLayout::Tamgu, &[cells], 43, TamguPolicy::Abort)
                .unwrap();
        let run = grade_rows(&rows, &ctx);
        assert_eq!(run.results.len(), 2);
        assert_eq!(run.results[0].score, 100);
        assert_eq!(run.results[1].score, 0);
        assert_eq!(run.results[1].wrong_questions, (1..=20).collect::<Vec<u32>>());
    }
}
