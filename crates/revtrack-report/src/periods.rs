//! Completion-by-period tally
//!
//! Release-period labels are free text ("First Release", "2nd batch",
//! "Pilot"). Labels carrying an ordinal word from the configured table, or a
//! numeric ordinal such as `3rd`, sort by that ordinal; everything else
//! follows in lexical order, and the unspecified bucket always comes last.

use revtrack_core::{aggregate_status, EngineConfig, Protocol};
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::HashMap;

/// Completed vs. not-completed protocols for one release period
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PeriodTally {
    /// Release-period label
    pub period: String,
    /// Protocols whose aggregate status is `Completed`
    pub completed: usize,
    /// All other protocols
    pub not_completed: usize,
}

impl PeriodTally {
    /// All protocols in the period
    #[inline]
    #[must_use]
    pub fn total(&self) -> usize {
        self.completed + self.not_completed
    }
}

/// Zero-based position of a numeric ordinal like `1st` or `10th`
fn numeric_ordinal(word: &str) -> Option<usize> {
    let digits_end = word.find(|c: char| !c.is_ascii_digit())?;
    let (digits, suffix) = word.split_at(digits_end);
    if !matches!(suffix, "st" | "nd" | "rd" | "th") {
        return None;
    }
    digits.parse::<usize>().ok()?.checked_sub(1)
}

/// Ordinal rank of a period label, if it carries one
#[must_use]
pub fn period_rank(label: &str, ordinals: &[String]) -> Option<usize> {
    let lowered = label.to_lowercase();
    lowered
        .split(|c: char| !c.is_alphanumeric())
        .filter(|word| !word.is_empty())
        .find_map(|word| {
            ordinals
                .iter()
                .position(|ordinal| ordinal.eq_ignore_ascii_case(word))
                .or_else(|| numeric_ordinal(word))
        })
}

/// Ordering of period labels: ranked first, then lexical
#[must_use]
pub fn compare_periods(a: &str, b: &str, ordinals: &[String]) -> Ordering {
    match (period_rank(a, ordinals), period_rank(b, ordinals)) {
        (Some(x), Some(y)) => x.cmp(&y).then_with(|| a.cmp(b)),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.cmp(b),
    }
}

/// Tally protocols per release period
#[must_use]
pub fn completion_by_period(protocols: &[Protocol], config: &EngineConfig) -> Vec<PeriodTally> {
    let mut tallies: HashMap<String, PeriodTally> = HashMap::new();
    for protocol in protocols {
        let period = protocol
            .release_period
            .as_deref()
            .map(str::trim)
            .filter(|label| !label.is_empty())
            .unwrap_or(&config.unspecified_period);
        let tally = tallies
            .entry(period.to_string())
            .or_insert_with(|| PeriodTally {
                period: period.to_string(),
                completed: 0,
                not_completed: 0,
            });
        if aggregate_status(protocol).is_completed() {
            tally.completed += 1;
        } else {
            tally.not_completed += 1;
        }
    }

    let unspecified = config.unspecified_period.as_str();
    let mut out: Vec<PeriodTally> = tallies.into_values().collect();
    out.sort_by(|a, b| {
        (a.period == unspecified)
            .cmp(&(b.period == unspecified))
            .then_with(|| compare_periods(&a.period, &b.period, &config.period_ordinals))
    });
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use revtrack_core::{ProtocolStatus, ReviewerAssignment};

    fn ordinals() -> Vec<String> {
        EngineConfig::default().period_ordinals
    }

    #[test]
    fn ordinal_words_and_numbers_rank() {
        assert_eq!(period_rank("First Release", &ordinals()), Some(0));
        assert_eq!(period_rank("third-batch", &ordinals()), Some(2));
        assert_eq!(period_rank("2nd release", &ordinals()), Some(1));
        assert_eq!(period_rank("Release 10th", &ordinals()), Some(9));
        assert_eq!(period_rank("Pilot", &ordinals()), None);
        assert_eq!(period_rank("0th", &ordinals()), None);
        assert_eq!(period_rank("Firstly", &ordinals()), None);
    }

    #[test]
    fn labels_sort_ordinals_then_lexical() {
        let mut labels = vec!["Pilot", "Third Release", "Alpha", "First Release", "2nd Release"];
        labels.sort_by(|a, b| compare_periods(a, b, &ordinals()));
        assert_eq!(
            labels,
            vec!["First Release", "2nd Release", "Third Release", "Alpha", "Pilot"]
        );
    }

    #[test]
    fn tallies_completed_against_the_rest() {
        let done = || ReviewerAssignment::new("R1", "Dr. Yu").completed_on(chrono::NaiveDate::MIN);
        let protocols = vec![
            Protocol::new("P-1", "A").with_release_period("Second Release").with_assignment(done()),
            Protocol::new("P-2", "B").with_release_period("Second Release"),
            Protocol::new("P-3", "C").with_release_period("First Release").with_assignment(done()),
            Protocol::new("P-4", "D").with_status(ProtocolStatus::Completed),
            Protocol::new("P-5", "E").with_release_period("  "),
        ];
        let tallies = completion_by_period(&protocols, &EngineConfig::default());

        assert_eq!(
            tallies,
            vec![
                PeriodTally { period: "First Release".into(), completed: 1, not_completed: 0 },
                PeriodTally { period: "Second Release".into(), completed: 1, not_completed: 1 },
                PeriodTally { period: "Unspecified".into(), completed: 1, not_completed: 1 },
            ]
        );
        assert_eq!(tallies[2].total(), 2);
    }
}
