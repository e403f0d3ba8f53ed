//! Corpus analytics
//!
//! Read-only analyses over a corpus snapshot (`CorpusStore::list` or
//! `load_corpus`). Results can lag writes that land after the snapshot.
//! An empty finding list is a normal outcome, never an error.

pub mod conflicts;
pub mod dedup;
pub mod promotion;
pub mod staleness;

pub use conflicts::{ConflictCandidate, candidate_pairs};
pub use dedup::{DedupReport, DeduplicationEngine, DuplicatePair, find_duplicates};
pub use promotion::{PromotionCandidate, Proposal, apply_promotion, find_candidates};
pub use staleness::{StaleFinding, apply_stale, find_stale};

use std::collections::{BTreeMap, BTreeSet};

use crate::core::SkillRecord;

/// Index pairs `(i, j)`, `i < j`, of records sharing a domain tag, in
/// ascending order, stopping at `max_pairs`.
///
/// Returns whether more pairs existed past the ceiling. Work is bounded by
/// the ceiling rather than by the number of same-tag pairs.
pub(crate) fn same_tag_pairs(records: &[&SkillRecord], max_pairs: usize) -> (Vec<(usize, usize)>, bool) {
    let mut by_tag: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
    let mut record_tags: Vec<BTreeSet<&str>> = Vec::with_capacity(records.len());
    for (idx, record) in records.iter().enumerate() {
        let tags: BTreeSet<&str> = record.domain_tags.iter().map(String::as_str).collect();
        for &tag in &tags {
            by_tag.entry(tag).or_default().push(idx);
        }
        record_tags.push(tags);
    }

    let mut pairs = Vec::new();
    for (i, tags) in record_tags.iter().enumerate() {
        let remaining = max_pairs - pairs.len();
        if remaining == 0 {
            let more = (i..records.len()).any(|k| {
                record_tags[k].iter().any(|tag| !later_members(&by_tag, k, tag).is_empty())
            });
            return (pairs, more);
        }

        // The smallest `remaining + 1` partners of each tag cover the
        // smallest `remaining + 1` distinct partners overall.
        let mut partners: Vec<usize> = tags
            .iter()
            .flat_map(|tag| later_members(&by_tag, i, tag).iter().take(remaining.saturating_add(1)).copied())
            .collect();
        partners.sort_unstable();
        partners.dedup();

        let truncated = partners.len() > remaining;
        pairs.extend(partners.into_iter().take(remaining).map(|j| (i, j)));
        if truncated {
            return (pairs, true);
        }
    }
    (pairs, false)
}

/// Members of `tag` with an index above `i`. Member lists are ascending, so
/// this is a suffix.
fn later_members<'a>(by_tag: &'a BTreeMap<&str, Vec<usize>>, i: usize, tag: &str) -> &'a [usize] {
    let members = by_tag.get(tag).map_or(&[][..], Vec::as_slice);
    &members[members.partition_point(|&j| j <= i)..]
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, Instant};

    use chrono::NaiveDate;

    use super::*;
    use crate::core::SkillKind;

    fn tagged(id: &str, tags: &[&str]) -> SkillRecord {
        SkillRecord::new(
            id,
            SkillKind::Skill,
            tags.iter().map(|t| (*t).to_string()).collect(),
            "p",
            NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
            "# T",
        )
    }

    fn refs(records: &[SkillRecord]) -> Vec<&SkillRecord> {
        records.iter().collect()
    }

    #[test]
    fn test_pairs_in_order_across_tags() {
        let records = vec![
            tagged("a", &["x", "y"]),
            tagged("b", &["y"]),
            tagged("c", &["x"]),
            tagged("d", &["z"]),
        ];
        let (pairs, truncated) = same_tag_pairs(&refs(&records), 10);
        assert_eq!(pairs, vec![(0, 1), (0, 2)]);
        assert!(!truncated);
    }

    #[test]
    fn test_pair_shared_by_two_tags_counted_once() {
        let records = vec![tagged("a", &["x", "y"]), tagged("b", &["x", "y"])];
        let (pairs, truncated) = same_tag_pairs(&refs(&records), 1);
        assert_eq!(pairs, vec![(0, 1)]);
        assert!(!truncated);
    }

    #[test]
    fn test_ceiling_reports_truncation() {
        let records: Vec<SkillRecord> = (0..4).map(|i| tagged(&format!("s-{i}"), &["t"])).collect();
        let all = same_tag_pairs(&refs(&records), 100).0;
        assert_eq!(all.len(), 6);

        for ceiling in 0..6 {
            let (pairs, truncated) = same_tag_pairs(&refs(&records), ceiling);
            assert_eq!(pairs, all[..ceiling].to_vec());
            assert!(truncated);
        }
        assert!(!same_tag_pairs(&refs(&records), 6).1);
    }

    #[test]
    fn test_exact_fill_then_no_more_pairs() {
        let records = vec![tagged("a", &["x"]), tagged("b", &["x"]), tagged("c", &["y"])];
        let (pairs, truncated) = same_tag_pairs(&refs(&records), 1);
        assert_eq!(pairs, vec![(0, 1)]);
        assert!(!truncated);
    }

    #[test]
    fn test_small_ceiling_on_large_single_tag_corpus() {
        let records: Vec<SkillRecord> = (0..20_000)
            .map(|i| tagged(&format!("s-{i:05}"), &["shared"]))
            .collect();
        let started = Instant::now();
        let (pairs, truncated) = same_tag_pairs(&refs(&records), 1);
        assert_eq!(pairs, vec![(0, 1)]);
        assert!(truncated);
        assert!(started.elapsed() < Duration::from_secs(2));
    }
}
