//! Raw candidates to validated, deduplicated draw results.

use std::collections::HashSet;

use crate::classify::classify;
use crate::date::{at_hour, normalize};
use crate::numbers::extract_numbers;
use crate::types::{DrawResult, RawCandidate};

/// Outcome of one assembler pass.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Assembly {
    /// Valid records in parser order.
    pub records: Vec<DrawResult>,
    /// Candidates rejected for a bad date, unknown label, or no numbers.
    pub dropped: usize,
    /// Candidates whose natural key was already emitted in this pass.
    pub duplicates: usize,
}

/// Validate candidates and keep the first record per `(draw_date_time, game_type)`.
pub fn assemble(candidates: Vec<RawCandidate>) -> Assembly {
    let mut out = Assembly::default();
    let mut seen = HashSet::new();

    for candidate in candidates {
        let Some(record) = to_record(candidate) else {
            out.dropped += 1;
            continue;
        };
        if !seen.insert(record.key()) {
            tracing::debug!(
                game_type = %record.game_type,
                draw_date_time = %record.draw_date_time,
                "duplicate draw, keeping first"
            );
            out.duplicates += 1;
            continue;
        }
        out.records.push(record);
    }

    tracing::debug!(
        records = out.records.len(),
        dropped = out.dropped,
        duplicates = out.duplicates,
        "assembled draw results"
    );
    out
}

fn to_record(candidate: RawCandidate) -> Option<DrawResult> {
    let RawCandidate {
        date,
        name,
        number_fragments,
    } = candidate;

    let day = match normalize(date.day, &date.month, date.year) {
        Ok(d) => d,
        Err(e) => {
            tracing::debug!(name = %name, error = %e, "dropping candidate with bad date");
            return None;
        }
    };
    let draw_date_time = match at_hour(day, date.hour) {
        Ok(dt) => dt,
        Err(e) => {
            tracing::debug!(name = %name, error = %e, "dropping candidate with bad hour");
            return None;
        }
    };
    let Some(game_type) = classify(&name) else {
        tracing::debug!(name = %name, "dropping candidate with unknown draw name");
        return None;
    };
    let numbers = extract_numbers(&number_fragments);
    if numbers.is_empty() {
        tracing::debug!(name = %name, %day, "dropping candidate without numbers");
        return None;
    }

    Some(DrawResult {
        draw_date_time,
        numbers,
        bonus: None,
        game_type,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{DateFragment, GameType};
    use chrono::NaiveDate;

    fn candidate(day: u32, month: &str, name: &str, numbers: &[&str]) -> RawCandidate {
        RawCandidate {
            date: DateFragment {
                day,
                month: month.to_string(),
                year: 2025,
                hour: None,
            },
            name: name.to_string(),
            number_fragments: numbers.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn builds_record_from_valid_candidate() {
        let mut c = candidate(30, "mars", "DIGITAL 1 Tirage 00H", &["10 - 60 - 13 - 31 - 87"]);
        c.date.hour = Some(0);
        let out = assemble(vec![c]);
        assert_eq!(out.records.len(), 1);
        let r = &out.records[0];
        assert_eq!(
            r.draw_date_time,
            NaiveDate::from_ymd_opt(2025, 3, 30)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap()
        );
        assert_eq!(r.game_type, GameType::Digital1);
        assert_eq!(r.numbers, vec![10, 60, 13, 31, 87]);
        assert_eq!(r.bonus, None);
    }

    #[test]
    fn drops_invalid_candidates() {
        let out = assemble(vec![
            candidate(30, "mars", "DIGITAL 1", &[". - . - . - . - ."]),
            candidate(31, "avril", "DIGITAL 1", &["1-2"]),
            candidate(1, "avril", "LOTTO KADOO", &["1-2"]),
            candidate(1, "brumaire", "DIGITAL 1", &["1-2"]),
            candidate(1, "avril", "DIGITAL 1", &[]),
        ]);
        assert!(out.records.is_empty());
        assert_eq!(out.dropped, 5);
    }

    #[test]
    fn invalid_hour_drops_candidate() {
        let mut c = candidate(1, "avril", "STAR 11H", &["1-2"]);
        c.date.hour = Some(25);
        assert_eq!(assemble(vec![c]).dropped, 1);
    }

    #[test]
    fn first_occurrence_wins() {
        let out = assemble(vec![
            candidate(1, "avril", "Star 14H", &["1-2-3"]),
            candidate(2, "avril", "Star 14H", &["4-5-6"]),
            candidate(1, "04", "STAR_14H", &["7-8-9"]),
        ]);
        assert_eq!(out.records.len(), 2);
        assert_eq!(out.duplicates, 1);
        assert_eq!(out.records[0].numbers, vec![1, 2, 3]);
    }

    #[test]
    fn same_day_different_types_both_kept() {
        let out = assemble(vec![
            candidate(1, "avril", "Star 14H", &["1"]),
            candidate(1, "avril", "Fortune 14H", &["1"]),
        ]);
        assert_eq!(out.records.len(), 2);
        assert_eq!(out.duplicates, 0);
    }

    #[test]
    fn idempotent_and_order_preserving() {
        let input = vec![
            candidate(3, "avril", "Digital 21H", &["9-8"]),
            candidate(1, "avril", "Star 11H", &["1-2"]),
            candidate(2, "avril", "Fortune 18H", &["3-4"]),
            candidate(1, "avril", "Star 11H", &["5-6"]),
        ];
        let first = assemble(input.clone());
        let second = assemble(input);
        assert_eq!(first, second);
        let types: Vec<_> = first.records.iter().map(|r| r.game_type).collect();
        assert_eq!(
            types,
            vec![GameType::Digital21H, GameType::Star11H, GameType::Fortune18H]
        );
    }
}
