//! Loose reviewer identity matching
//!
//! Historical records store reviewer identity inconsistently: sometimes a
//! code, sometimes a full name, sometimes a partial name. Matching therefore
//! tries four rules in order and stops at the first that holds:
//!
//! 1. exact id equality
//! 2. exact name equality
//! 3. candidate name contained in assignment name (case-insensitive)
//! 4. assignment name contained in candidate name (case-insensitive)
//!
//! Every caller (aggregation, classification, reassignment) goes through
//! this module so results agree across views. The substring rules are a
//! data-quality workaround; short names can collide, which is why
//! [`MatchKind::is_fuzzy`] and [`short_name_risk`] exist for callers that
//! need to flag such matches.
//!
//! The substring rules compare names only. A name slot that merely repeats
//! a single-token id (an id-only identity, or a record stored without a
//! name) holds a code, so `R1` never reaches `R12` through them.

use crate::model::{ReviewerAssignment, ReviewerIdentity};
use serde::Serialize;

/// Which rule produced a match, strongest first
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum MatchKind {
    /// Rule 1
    ExactId,
    /// Rule 2
    ExactName,
    /// Rule 3
    CandidateInAssignment,
    /// Rule 4
    AssignmentInCandidate,
}

impl MatchKind {
    /// True for the substring rules
    #[inline]
    #[must_use]
    pub fn is_fuzzy(&self) -> bool {
        matches!(self, Self::CandidateInAssignment | Self::AssignmentInCandidate)
    }
}

/// Name eligible for the substring rules, if the slot holds a real name
fn substring_name<'a>(id: &str, name: &'a str) -> Option<&'a str> {
    let name = name.trim();
    if name.is_empty() {
        return None;
    }
    // Code copied into the name slot
    if name == id.trim() && !name.contains(char::is_whitespace) {
        return None;
    }
    Some(name)
}

fn contains_ci(haystack: Option<&str>, needle: Option<&str>) -> bool {
    match (haystack, needle) {
        (Some(haystack), Some(needle)) => haystack.to_lowercase().contains(&needle.to_lowercase()),
        _ => false,
    }
}

/// Determine which rule, if any, ties an assignment's reviewer to a candidate
#[must_use]
pub fn match_kind(
    assignment_id: &str,
    assignment_name: &str,
    candidate_id: &str,
    candidate_name: &str,
) -> Option<MatchKind> {
    if !assignment_id.is_empty() && assignment_id == candidate_id {
        return Some(MatchKind::ExactId);
    }
    if !assignment_name.is_empty() && assignment_name == candidate_name {
        return Some(MatchKind::ExactName);
    }
    let assignment_name = substring_name(assignment_id, assignment_name);
    let candidate_name = substring_name(candidate_id, candidate_name);
    if contains_ci(assignment_name, candidate_name) {
        return Some(MatchKind::CandidateInAssignment);
    }
    if contains_ci(candidate_name, assignment_name) {
        return Some(MatchKind::AssignmentInCandidate);
    }
    None
}

/// Whether an assignment's reviewer refers to the same person as the candidate
#[inline]
#[must_use]
pub fn matches(
    assignment_id: &str,
    assignment_name: &str,
    candidate_id: &str,
    candidate_name: &str,
) -> bool {
    match_kind(assignment_id, assignment_name, candidate_id, candidate_name).is_some()
}

/// [`match_kind`] for an assignment against an identity
#[inline]
#[must_use]
pub fn assignment_match(
    assignment: &ReviewerAssignment,
    candidate: &ReviewerIdentity,
) -> Option<MatchKind> {
    match_kind(
        &assignment.reviewer_id,
        &assignment.reviewer_name,
        &candidate.id,
        &candidate.name,
    )
}

/// Index of the best-matching assignment: strongest rule wins, list order breaks ties
#[must_use]
pub fn best_match(
    assignments: &[ReviewerAssignment],
    candidate: &ReviewerIdentity,
) -> Option<(usize, MatchKind)> {
    assignments
        .iter()
        .enumerate()
        .filter_map(|(idx, a)| assignment_match(a, candidate).map(|kind| (idx, kind)))
        .min_by_key(|&(idx, kind)| (kind, idx))
}

/// True when a substring match hinged on a name shorter than `min_len` characters
#[must_use]
pub fn short_name_risk(
    kind: MatchKind,
    assignment_name: &str,
    candidate_name: &str,
    min_len: usize,
) -> bool {
    let needle = match kind {
        MatchKind::CandidateInAssignment => candidate_name,
        MatchKind::AssignmentInCandidate => assignment_name,
        MatchKind::ExactId | MatchKind::ExactName => return false,
    };
    needle.trim().chars().count() < min_len
}
