//! Matching of student identifiers against the roster.

use std::collections::HashMap;

use log::{debug, info, warn};

use crate::config::*;

/// Columns of a roster table: student number, phone number, name.
pub const ROSTER_COLUMNS: usize = 3;

/// Lookup indexes over the roster entries.
///
/// The prefix and suffix indexes keep the roster order: when several entries
/// could match an identifier, the one that appears first in the roster wins.
#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct Roster {
    entries: Vec<RosterEntry>,
    // student number + phone -> entry
    full: HashMap<String, usize>,
    by_student_number: Vec<(String, usize)>,
    by_phone: Vec<(String, usize)>,
    skipped: usize,
}

impl Roster {
    /// Builds the indexes from the rows of a roster table.
    ///
    /// `row_offset` is the line number of the first row, used in diagnostics.
    pub fn from_table(
        rows: &[Vec<String>],
        columns: usize,
        row_offset: usize,
    ) -> Result<(Roster, Vec<Diagnostic>), GradingErrors> {
        if columns < ROSTER_COLUMNS {
            return Err(GradingErrors::MalformedRosterFile { columns });
        }
        let mut roster = Roster::default();
        let mut diagnostics: Vec<Diagnostic> = Vec::new();
        for (idx, cells) in rows.iter().enumerate() {
            let cell = |i: usize| cells.get(i).map(|s| s.trim().to_string()).unwrap_or_default();
            let (student_number, phone, name) = (cell(0), cell(1), cell(2));
            match (student_number.is_empty(), name.is_empty()) {
                (true, true) => {
                    // Blank line.
                    continue;
                }
                (true, false) | (false, true) => {
                    let lineno = idx + row_offset;
                    warn!(
                        "Roster line {}: skipped, student number {:?} name {:?}",
                        lineno, student_number, name
                    );
                    roster.skipped += 1;
                    diagnostics.push(Diagnostic::MalformedRosterRow {
                        lineno,
                        student_number,
                        name,
                    });
                    continue;
                }
                (false, false) => {}
            }
            roster.insert(RosterEntry {
                student_number,
                phone: if phone.is_empty() { None } else { Some(phone) },
                name,
            });
        }
        info!(
            "Roster: {} entries, {} phone numbers, {} malformed rows skipped",
            roster.entries.len(),
            roster.by_phone.len(),
            roster.skipped
        );
        Ok((roster, diagnostics))
    }

    /// Adds an entry to all the indexes it belongs to.
    pub fn insert(&mut self, entry: RosterEntry) {
        let idx = self.entries.len();
        let full_key = format!(
            "{}{}",
            entry.student_number,
            entry.phone.as_deref().unwrap_or("")
        );
        self.full.entry(full_key).or_insert(idx);
        self.by_student_number
            .push((entry.student_number.clone(), idx));
        if let Some(phone) = entry.phone.as_ref() {
            self.by_phone.push((phone.clone(), idx));
        }
        self.entries.push(entry);
    }

    /// Finds the roster entry of a student identifier.
    ///
    /// Tried in order, first match wins:
    /// 1. the identifier equals student number + phone
    /// 2. the identifier starts with a student number
    /// 3. the identifier ends with a phone number
    pub fn resolve(&self, student_id: &str) -> Option<ResolvedIdentity> {
        let id = student_id.trim();
        if id.is_empty() {
            return None;
        }
        let found = self
            .full
            .get(id)
            .map(|idx| (*idx, MatchStage::Full))
            .or_else(|| {
                self.by_student_number
                    .iter()
                    .find(|(sn, _)| id.starts_with(sn.as_str()))
                    .map(|(_, idx)| (*idx, MatchStage::StudentNumber))
            })
            .or_else(|| {
                self.by_phone
                    .iter()
                    .find(|(phone, _)| id.ends_with(phone.as_str()))
                    .map(|(_, idx)| (*idx, MatchStage::Phone))
            });
        debug!("resolve: {:?} -> {:?}", id, found);
        found.map(|(idx, matched_by)| {
            let e = &self.entries[idx];
            ResolvedIdentity {
                name: e.name.clone(),
                student_number: e.student_number.clone(),
                phone: e.phone.clone(),
                matched_by,
            }
        })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of rows dropped because the student number or the name was missing.
    pub fn skipped(&self) -> usize {
        self.skipped
    }
}
