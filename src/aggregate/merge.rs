//! Candidate grouping and field-level merging.
//!
//! Candidates referring to the same paper are grouped by, in priority
//! order: any shared external identifier, then fuzzy title-plus-author
//! matching. Each group merges into one [`CanonicalRecord`] by keeping
//! the most complete value per field, so the merged record is at least
//! as complete as any single contributor. Merge output depends only on
//! the set of inputs, never on arrival order.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::types::{CandidateRecord, CanonicalRecord, PubDate, SourceId};

use super::title::{normalize_title, same_paper};

/// A group of candidates believed to be the same paper.
struct Group {
    members: Vec<CandidateRecord>,
    /// (id key, id value) pairs claimed by any member.
    ids: BTreeSet<(String, String)>,
    normalized_title: String,
}

/// Group candidates and merge each group into a canonical record.
///
/// Input order must not affect output, so candidates are pre-sorted into
/// a canonical order (source, then native id) before grouping. Group
/// slots form a union-find forest: a candidate whose identifiers touch
/// several existing groups unifies them all, so a record sharing any
/// identifier with another always ends up in the same canonical record —
/// even when a late "bridge" record is the first link between them.
pub(crate) fn dedup_merge(mut candidates: Vec<CandidateRecord>) -> Vec<CanonicalRecord> {
    candidates.sort_by(|a, b| {
        (a.source, &a.native_id).cmp(&(b.source, &b.native_id))
    });

    let mut groups: Vec<Option<Group>> = Vec::new();
    let mut parent: Vec<usize> = Vec::new();
    // (key, value) -> group slot, for O(1) identifier joins. Entries may
    // point at absorbed slots; `find_root` resolves them.
    let mut id_index: HashMap<(String, String), usize> = HashMap::new();

    for candidate in candidates {
        let ids: BTreeSet<(String, String)> = candidate
            .external_ids
            .iter()
            .filter(|(_, v)| !v.is_empty())
            .map(|(k, v)| (k.clone(), v.to_lowercase()))
            .collect();
        let normalized_title = normalize_title(&candidate.title);

        // All live groups this candidate's identifiers touch, in slot
        // order for determinism.
        let id_targets: BTreeSet<usize> = ids
            .iter()
            .filter_map(|id| id_index.get(id).copied())
            .map(|slot| find_root(&mut parent, slot))
            .collect();

        let target = if id_targets.is_empty() {
            groups
                .iter()
                .position(|slot| {
                    slot.as_ref().is_some_and(|g| {
                        same_paper(
                            &g.normalized_title,
                            &g.members[0].authors,
                            &normalized_title,
                            &candidate.authors,
                        )
                    })
                })
                .map(|slot| find_root(&mut parent, slot))
        } else {
            let mut targets = id_targets.into_iter();
            let root = targets.next();
            // The candidate bridges several groups: absorb the rest into
            // the first.
            if let Some(root) = root {
                for other in targets {
                    let absorbed = groups[other].take();
                    parent[other] = root;
                    let Some(absorbed) = absorbed else { continue };
                    if let Some(group) = groups[root].as_mut() {
                        group.members.extend(absorbed.members);
                        group.ids.extend(absorbed.ids);
                    }
                }
            }
            root
        };

        let index = match target {
            Some(index) => index,
            None => {
                groups.push(Some(Group {
                    members: Vec::new(),
                    ids: BTreeSet::new(),
                    normalized_title,
                }));
                parent.push(groups.len() - 1);
                groups.len() - 1
            }
        };
        if let Some(group) = groups[index].as_mut() {
            group.members.push(candidate);
            group.ids.extend(ids.iter().cloned());
        }
        for id in ids {
            id_index.insert(id, index);
        }
    }

    groups
        .into_iter()
        .flatten()
        .map(|g| merge_group(g.members))
        .collect()
}

/// Resolve a group slot to its live root, halving paths as it walks.
fn find_root(parent: &mut [usize], mut slot: usize) -> usize {
    while parent[slot] != slot {
        parent[slot] = parent[parent[slot]];
        slot = parent[slot];
    }
    slot
}

/// Merge one group into a canonical record, field by field:
/// longest non-empty text wins, the most precise date wins, identifier
/// union with first value per key, full-text availability is the OR over
/// members, and citation count is the maximum reported.
fn merge_group(members: Vec<CandidateRecord>) -> CanonicalRecord {
    debug_assert!(!members.is_empty());

    let mut title = String::new();
    let mut abstract_text = String::new();
    let mut authors: Vec<String> = Vec::new();
    let mut published: Option<PubDate> = None;
    let mut external_ids: BTreeMap<String, String> = BTreeMap::new();
    let mut full_text_available = false;
    let mut venue: Option<String> = None;
    let mut pdf_url: Option<String> = None;
    let mut citation_count: Option<u32> = None;
    let mut sources: BTreeSet<SourceId> = BTreeSet::new();

    for member in members {
        if member.title.len() > title.len() {
            title = member.title;
        }
        if member.abstract_text.len() > abstract_text.len() {
            abstract_text = member.abstract_text;
        }
        if member.authors.len() > authors.len() {
            authors = member.authors;
        }
        published = match (published, member.published) {
            (None, d) => d,
            (d, None) => d,
            (Some(a), Some(b)) => Some(more_precise(a, b)),
        };
        for (key, value) in member.external_ids {
            if !value.is_empty() {
                external_ids.entry(key).or_insert(value);
            }
        }
        full_text_available |= member.full_text_available;
        if member
            .venue
            .as_ref()
            .is_some_and(|v| v.len() > venue.as_deref().map_or(0, str::len))
        {
            venue = member.venue;
        }
        if pdf_url.is_none() {
            pdf_url = member.pdf_url;
        }
        citation_count = match (citation_count, member.citation_count) {
            (Some(a), Some(b)) => Some(a.max(b)),
            (a, b) => a.or(b),
        };
        sources.insert(member.source);
    }

    let completeness = completeness_of(
        &title,
        &authors,
        published.as_ref(),
        &abstract_text,
        venue.as_deref(),
        pdf_url.as_deref(),
        citation_count,
    );

    CanonicalRecord {
        title,
        authors,
        published,
        abstract_text,
        external_ids,
        full_text_available,
        venue,
        pdf_url,
        citation_count,
        sources,
        completeness,
    }
}

/// The more precise of two dates; on equal precision the earlier one.
fn more_precise(a: PubDate, b: PubDate) -> PubDate {
    match b.precision().cmp(&a.precision()) {
        std::cmp::Ordering::Greater => b,
        std::cmp::Ordering::Less => a,
        std::cmp::Ordering::Equal => a.min(b),
    }
}

#[allow(clippy::too_many_arguments)]
fn completeness_of(
    title: &str,
    authors: &[String],
    published: Option<&PubDate>,
    abstract_text: &str,
    venue: Option<&str>,
    pdf_url: Option<&str>,
    citation_count: Option<u32>,
) -> f64 {
    let populated = [
        !title.is_empty(),
        !authors.is_empty(),
        published.is_some(),
        !abstract_text.is_empty(),
        venue.is_some_and(|v| !v.is_empty()),
        pdf_url.is_some_and(|u| !u.is_empty()),
        citation_count.is_some(),
    ];
    let count = populated.iter().filter(|&&p| p).count();
    count as f64 / populated.len() as f64
}
