//! Deterministic ranking of canonical records.
//!
//! Records with retrievable full text rank first, then corroboration
//! (how many sources returned the paper), then recency, then citation
//! count. The sort is stable over the deduplicator's canonical output
//! order, so equal-key records keep a fixed relative order and the final
//! list is identical across runs regardless of which source answered
//! first. Truncation to the result cap happens only after ranking.

use std::cmp::Reverse;

use crate::types::CanonicalRecord;

/// Sort records by the ranking criteria and truncate to `max_results`.
pub(crate) fn rank(mut records: Vec<CanonicalRecord>, max_results: usize) -> Vec<CanonicalRecord> {
    records.sort_by_key(|r| {
        Reverse((
            r.full_text_available,
            r.sources.len(),
            r.published,
            r.citation_count.unwrap_or(0),
        ))
    });
    records.truncate(max_results);
    records
}
