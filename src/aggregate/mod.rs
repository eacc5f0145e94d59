//! Deduplication, merging, and ranking of per-source results.
//!
//! The dispatcher hands over every candidate record the sources
//! produced; this module collapses duplicates across sources, merges
//! each duplicate group into the most complete single record, and ranks
//! the result deterministically.

mod merge;
mod rank;
mod title;

use crate::types::{CandidateRecord, CanonicalRecord};

/// Deduplicate, merge, rank, and truncate candidate records.
pub fn aggregate(
    candidates: Vec<CandidateRecord>,
    max_results: usize,
) -> Vec<CanonicalRecord> {
    let merged = merge::dedup_merge(candidates);
    rank::rank(merged, max_results)
}
