pub use crate::config::*;
use crate::key::{AnswerKey, SubjectKey};

use log::debug;
use std::collections::HashMap;

/// A builder for answer keys.
///
/// Entries can be added in any order, they are grouped by subject code and
/// sorted by question number when the key is built.
///
/// ```
/// pub use answer_grading::builder::KeyBuilder;
/// # use answer_grading::GradingErrors;
///
/// let mut builder = KeyBuilder::new();
/// builder.add_entry("MATH01", 2, "3", "5")?;
/// builder.add_entry("MATH01", 1, "1", "5")?;
///
/// let (key, diagnostics) = builder.build()?;
/// assert_eq!(key.subject("MATH01").unwrap().answers, vec!["1", "3"]);
/// assert!(diagnostics.is_empty());
///
/// # Ok::<(), GradingErrors>(())
/// ```
#[derive(Debug, Default)]
pub struct KeyBuilder {
    // Subject codes in order of first appearance.
    _order: Vec<String>,
    _entries: HashMap<String, Vec<RawEntry>>,
    _count: usize,
}

#[derive(Debug, Clone)]
struct RawEntry {
    // Position in the input, for the order of diagnostics.
    seq: usize,
    question: u32,
    answer: String,
    points: String,
}

impl KeyBuilder {
    pub fn new() -> KeyBuilder {
        KeyBuilder::default()
    }

    /// Adds one (question, answer, points) line for a subject.
    ///
    /// The points are kept as text here: they are validated by [KeyBuilder::build],
    /// which turns unreadable values into 0 with a diagnostic.
    pub fn add_entry(
        &mut self,
        subject_code: &str,
        question: u32,
        answer: &str,
        points: &str,
    ) -> Result<(), GradingErrors> {
        let subject = subject_code.trim();
        if subject.is_empty() {
            return Err(GradingErrors::MalformedKeyFile {
                reason: "empty subject code".to_string(),
                columns: 4,
                example: Some(vec![
                    subject_code.to_string(),
                    question.to_string(),
                    answer.to_string(),
                    points.to_string(),
                ]),
            });
        }
        if question == 0 {
            return Err(GradingErrors::MalformedKeyFile {
                reason: format!("question numbers start at 1 (subject '{}')", subject),
                columns: 4,
                example: None,
            });
        }
        if !self._entries.contains_key(subject) {
            self._order.push(subject.to_string());
        }
        self._entries
            .entry(subject.to_string())
            .or_default()
            .push(RawEntry {
                seq: self._count,
                question,
                answer: answer.to_string(),
                points: points.to_string(),
            });
        self._count += 1;
        Ok(())
    }

    /// Groups, sorts and validates the entries.
    pub fn build(self) -> Result<(AnswerKey, Vec<Diagnostic>), GradingErrors> {
        let mut diagnostics: Vec<(usize, Diagnostic)> = Vec::new();
        let mut subjects: Vec<(String, SubjectKey)> = Vec::new();
        let mut entries = self._entries;
        for code in self._order {
            let mut raw = entries.remove(&code).unwrap_or_default();
            // Stable: equal question numbers keep their input order for the error below.
            raw.sort_by_key(|e| e.question);
            if let Some(w) = raw.windows(2).find(|w| w[0].question == w[1].question) {
                return Err(GradingErrors::MalformedKeyFile {
                    reason: format!(
                        "question {} appears twice for subject '{}'",
                        w[0].question, code
                    ),
                    columns: 4,
                    example: Some(vec![
                        code.clone(),
                        w[1].question.to_string(),
                        w[1].answer.clone(),
                        w[1].points.clone(),
                    ]),
                });
            }

            let mut answers: Vec<String> = Vec::with_capacity(raw.len());
            let mut points: Vec<f64> = Vec::with_capacity(raw.len());
            for e in raw {
                let p = match parse_points(&e.points) {
                    Some(p) => p,
                    None => {
                        diagnostics.push((
                            e.seq,
                            Diagnostic::NonNumericPoints {
                                subject_code: code.clone(),
                                question: e.question,
                                raw: e.points.clone(),
                            },
                        ));
                        0.0
                    }
                };
                answers.push(e.answer);
                points.push(p);
            }
            debug!(
                "build: subject {}: {} questions, answers {:?}, points {:?}",
                code,
                answers.len(),
                answers,
                points
            );
            subjects.push((code, SubjectKey { answers, points }));
        }
        diagnostics.sort_by_key(|(seq, _)| *seq);
        let diagnostics = diagnostics.into_iter().map(|(_, d)| d).collect();
        Ok((AnswerKey::new(subjects), diagnostics))
    }
}

/// Points must be finite and non-negative.
fn parse_points(raw: &str) -> Option<f64> {
    match raw.trim().parse::<f64>() {
        Ok(p) if p.is_finite() && p >= 0.0 => Some(p),
        _ => None,
    }
}
