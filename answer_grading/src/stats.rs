//! Summary statistics over graded results.
//!
//! These are plain reductions: they never look at the input tables, only at
//! [GradingResult] records.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::config::GradingResult;

/// Width of a histogram bucket, in points.
pub const BUCKET_WIDTH: u64 = 10;
/// Number of histogram buckets. The last one is closed at 100.
pub const NUM_BUCKETS: usize = 10;

/// A score and the first student who obtained it.
#[derive(Eq, PartialEq, Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreHolder {
    pub score: u64,
    pub student_id: String,
}

#[derive(PartialEq, Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryStats {
    pub count: usize,
    pub mean: Option<f64>,
    /// Sample standard deviation. Needs at least two results.
    pub std_dev: Option<f64>,
    pub min: Option<ScoreHolder>,
    pub max: Option<ScoreHolder>,
}

#[derive(PartialEq, Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistogramBucket {
    pub label: String,
    pub count: usize,
    /// Share of the population, in percent with one decimal.
    pub percent: f64,
}

#[derive(PartialEq, Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreHistogram {
    pub buckets: Vec<HistogramBucket>,
    /// Scores above 100, which fall outside of the buckets.
    pub above_range: usize,
}

#[derive(PartialEq, Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WrongAnswerCount {
    pub question: u32,
    pub count: usize,
    /// Share of the population that got it wrong, in percent with one decimal.
    pub percent: f64,
}

#[derive(PartialEq, Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectStats {
    pub subject_code: String,
    pub stats: SummaryStats,
}

/// Everything the reporting layer shows for a selection of results.
#[derive(PartialEq, Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    /// The subject the statistics are restricted to, if any.
    pub subject: Option<String>,
    pub summary: SummaryStats,
    pub histogram: ScoreHistogram,
    /// The most frequently missed questions.
    pub top_wrong_questions: Vec<WrongAnswerCount>,
    pub wrong_questions: Vec<WrongAnswerCount>,
    /// Statistics of every subject, over all results.
    pub subjects: Vec<SubjectStats>,
}

impl Report {
    pub fn build(results: &[GradingResult], subject: Option<&str>, top_n: usize) -> Report {
        let selected = filter_subject(results, subject);
        let wrong_questions = wrong_answer_frequency(&selected);
        Report {
            subject: subject.map(|s| s.to_string()),
            summary: summarize(&selected),
            histogram: histogram(&selected),
            top_wrong_questions: wrong_questions.iter().take(top_n).cloned().collect(),
            wrong_questions,
            subjects: subject_stats(results),
        }
    }
}

/// The results of one subject, or all of them when no subject is given.
pub fn filter_subject<'a>(
    results: &'a [GradingResult],
    subject: Option<&str>,
) -> Vec<&'a GradingResult> {
    results
        .iter()
        .filter(|r| subject.map_or(true, |s| r.subject_code == s))
        .collect()
}

pub fn summarize(results: &[&GradingResult]) -> SummaryStats {
    let count = results.len();
    let scores: Vec<f64> = results.iter().map(|r| r.score as f64).collect();
    let mean = if count > 0 {
        Some(scores.iter().sum::<f64>() / count as f64)
    } else {
        None
    };
    let std_dev = match mean {
        Some(m) if count > 1 => {
            let ss: f64 = scores.iter().map(|x| (x - m) * (x - m)).sum();
            Some((ss / (count - 1) as f64).sqrt())
        }
        _ => None,
    };
    // Ties go to the first student in input order.
    let mut min: Option<&GradingResult> = None;
    let mut max: Option<&GradingResult> = None;
    for r in results.iter() {
        if min.map_or(true, |m| r.score < m.score) {
            min = Some(r);
        }
        if max.map_or(true, |m| r.score > m.score) {
            max = Some(r);
        }
    }
    let holder = |r: &GradingResult| ScoreHolder {
        score: r.score,
        student_id: r.student_id.clone(),
    };
    SummaryStats {
        count,
        mean,
        std_dev,
        min: min.map(holder),
        max: max.map(holder),
    }
}

/// Counts scores in buckets of ten points: 0-9, 10-19, ..., 90-100.
pub fn histogram(results: &[&GradingResult]) -> ScoreHistogram {
    let mut counts = [0usize; NUM_BUCKETS];
    let mut above_range = 0;
    for r in results.iter() {
        if r.score > 100 {
            above_range += 1;
        } else {
            let idx = ((r.score / BUCKET_WIDTH) as usize).min(NUM_BUCKETS - 1);
            counts[idx] += 1;
        }
    }
    let buckets = counts
        .iter()
        .enumerate()
        .map(|(idx, count)| {
            let low = idx as u64 * BUCKET_WIDTH;
            let high = if idx == NUM_BUCKETS - 1 {
                100
            } else {
                low + BUCKET_WIDTH - 1
            };
            HistogramBucket {
                label: format!("{}-{}", low, high),
                count: *count,
                percent: percent(*count, results.len()),
            }
        })
        .collect();
    ScoreHistogram {
        buckets,
        above_range,
    }
}

/// How many results list each question as wrong.
///
/// Sorted by count, most missed first, then by question number.
pub fn wrong_answer_frequency(results: &[&GradingResult]) -> Vec<WrongAnswerCount> {
    let mut counts: BTreeMap<u32, usize> = BTreeMap::new();
    for r in results.iter() {
        for q in r.wrong_questions.iter() {
            *counts.entry(*q).or_insert(0) += 1;
        }
    }
    let mut res: Vec<WrongAnswerCount> = counts
        .into_iter()
        .map(|(question, count)| WrongAnswerCount {
            question,
            count,
            percent: percent(count, results.len()),
        })
        .collect();
    // Stable sort, the map already ordered the questions.
    res.sort_by(|a, b| b.count.cmp(&a.count));
    res
}

/// Summary of every subject code, sorted by code.
pub fn subject_stats(results: &[GradingResult]) -> Vec<SubjectStats> {
    let codes: BTreeSet<&str> = results.iter().map(|r| r.subject_code.as_str()).collect();
    codes
        .into_iter()
        .map(|code| SubjectStats {
            subject_code: code.to_string(),
            stats: summarize(&filter_subject(results, Some(code))),
        })
        .collect()
}

fn percent(count: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    (count as f64 * 1000.0 / total as f64).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(id: &str, subject: &str, score: u64, wrong: &[u32]) -> GradingResult {
        GradingResult {
            student_id: id.to_string(),
            identity: None,
            subject_code: subject.to_string(),
            subject_name: subject.to_string(),
            score,
            max_score: 100,
            correct_count: 0,
            total_questions: 0,
            wrong_questions: wrong.to_vec(),
        }
    }

    fn sample() -> Vec<GradingResult> {
        vec![
            result("a", "MATH01", 20, &[2, 3]),
            result("b", "MATH01", 10, &[3]),
            result("c", "ENG01", 100, &[]),
            result("d", "MATH01", 10, &[1, 3]),
        ]
    }

    #[test]
    fn summary_of_a_subject() {
        let all = sample();
        let s = summarize(&filter_subject(&all, Some("MATH01")));
        assert_eq!(s.count, 3);
        assert_eq!(s.mean, Some(40.0 / 3.0));
        // Deviations 20/3, -10/3, -10/3: variance (400 + 100 + 100) / 9 / 2
        let expected = (600.0f64 / 9.0 / 2.0).sqrt();
        assert!((s.std_dev.unwrap() - expected).abs() < 1e-9);
        assert_eq!(s.min.unwrap().student_id, "b");
        assert_eq!(s.max.unwrap().student_id, "a");
    }

    #[test]
    fn summary_of_nothing() {
        let s = summarize(&[]);
        assert_eq!(s.count, 0);
        assert_eq!(s.mean, None);
        assert_eq!(s.std_dev, None);
        assert_eq!(s.max, None);
        let all = sample();
        let one = summarize(&filter_subject(&all, Some("ENG01")));
        assert_eq!(one.std_dev, None);
    }

    #[test]
    fn buckets() {
        let all = sample();
        let h = histogram(&filter_subject(&all, None));
        assert_eq!(h.buckets.len(), 10);
        assert_eq!(h.buckets[0].label, "0-9");
        assert_eq!(h.buckets[1].count, 2);
        assert_eq!(h.buckets[1].percent, 50.0);
        assert_eq!(h.buckets[2].count, 1);
        assert_eq!(h.buckets[9].label, "90-100");
        assert_eq!(h.buckets[9].count, 1);
        assert_eq!(h.above_range, 0);
    }

    #[test]
    fn most_missed_first() {
        let all = sample();
        let w = wrong_answer_frequency(&filter_subject(&all, None));
        let order: Vec<(u32, usize)> = w.iter().map(|x| (x.question, x.count)).collect();
        assert_eq!(order, vec![(3, 3), (1, 1), (2, 1)]);
        assert_eq!(w[0].percent, 75.0);
    }

    #[test]
    fn report_with_filter() {
        let all = sample();
        let r = Report::build(&all, Some("MATH01"), 1);
        assert_eq!(r.summary.count, 3);
        assert_eq!(r.top_wrong_questions.len(), 1);
        assert_eq!(r.top_wrong_questions[0].question, 3);
        assert_eq!(r.top_wrong_questions[0].percent, 100.0);
        let codes: Vec<&str> = r.subjects.iter().map(|s| s.subject_code.as_str()).collect();
        assert_eq!(codes, vec!["ENG01", "MATH01"]);
    }

    #[test]
    fn percent_has_one_decimal() {
        assert_eq!(percent(1, 3), 33.3);
        assert_eq!(percent(2, 3), 66.7);
        assert_eq!(percent(0, 0), 0.0);
    }
}
