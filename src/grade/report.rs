// Output of the graded results: JSON summary and CSV table.

use crate::grade::*;

use answer_grading::stats::{Report, SummaryStats};
use serde_json::json;
use serde_json::Value as JSValue;

pub const CSV_HEADER: [&str; 8] = [
    "student_id",
    "name",
    "subject_code",
    "subject_name",
    "score",
    "max_score",
    "correct",
    "wrong_questions",
];

pub fn build_summary_js(
    config: &GradingConfig,
    subject: Option<&str>,
    results: &[GradingResult],
    report: &Report,
    diagnostics: &[Diagnostic],
) -> GradeResult<JSValue> {
    let c = OutputConfig {
        exam: config.output_settings.exam_name.clone(),
        subject: subject.map(|s| s.to_string()),
    };
    let statistics = serde_json::to_value(rounded(report)).context(SerializingJsonSnafu {})?;
    let results_js = serde_json::to_value(results).context(SerializingJsonSnafu {})?;
    let diagnostics_js: Vec<String> = diagnostics.iter().map(|d| d.to_string()).collect();
    Ok(json!({
        "config": c,
        "results": results_js,
        "statistics": statistics,
        "diagnostics": diagnostics_js,
    }))
}

/// Means and standard deviations with two decimals.
fn rounded(report: &Report) -> Report {
    let mut r = report.clone();
    round_summary(&mut r.summary);
    for s in r.subjects.iter_mut() {
        round_summary(&mut s.stats);
    }
    r
}

fn round_summary(s: &mut SummaryStats) {
    s.mean = s.mean.map(round2);
    s.std_dev = s.std_dev.map(round2);
}

fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

pub fn result_to_csv_record(r: &GradingResult) -> Vec<String> {
    let wrong: Vec<String> = r.wrong_questions.iter().map(|q| q.to_string()).collect();
    vec![
        r.student_id.clone(),
        r.display_name().to_string(),
        r.subject_code.clone(),
        r.subject_name.clone(),
        r.score.to_string(),
        r.max_score.to_string(),
        format!("{}/{}", r.correct_count, r.total_questions),
        wrong.join(", "),
    ]
}

/// Writes the results as CSV, UTF-8 with a byte order mark so that spreadsheets
/// pick the right encoding.
pub fn write_results_csv<W: std::io::Write>(
    mut out: W,
    results: &[GradingResult],
) -> Result<(), csv::Error> {
    out.write_all(b"\xEF\xBB\xBF")?;
    let mut wtr = csv::Writer::from_writer(out);
    wtr.write_record(CSV_HEADER)?;
    for r in results.iter() {
        wtr.write_record(result_to_csv_record(r))?;
    }
    wtr.flush()?;
    Ok(())
}
