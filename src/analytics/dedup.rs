//! Skill deduplication engine
//!
//! Detects near-duplicate skills with TF-IDF cosine similarity over
//! `title + content`. Only skills sharing a domain tag are compared, and the
//! number of compared pairs is capped, which keeps the pairwise scan bounded
//! as the corpus grows. No external service is involved; two identical
//! corpora always produce identical reports.

use std::collections::{BTreeMap, BTreeSet};

use rayon::prelude::*;
use serde::Serialize;

use super::same_tag_pairs;
use crate::core::{SkillRecord, SkillStatus};
use crate::utils::terms;

/// Default similarity threshold for duplicate detection
pub const DEFAULT_SIMILARITY_THRESHOLD: f32 = 0.8;

/// Default ceiling on compared pairs per scan
pub const DEFAULT_MAX_PAIRS: usize = 20_000;

type TermVector = BTreeMap<String, f64>;

/// A pair of skills whose text similarity met the threshold
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DuplicatePair {
    /// Lexicographically smaller id of the pair
    pub skill_a: String,
    pub skill_b: String,
    pub similarity: f32,
    pub same_kind: bool,
    pub common_tags: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DedupReport {
    pub pairs: Vec<DuplicatePair>,
    /// Pairs actually scored
    pub compared: usize,
    /// The pair ceiling stopped the scan early
    pub truncated: bool,
}

impl DedupReport {
    /// Pairs involving `skill_id`.
    pub fn pairs_for<'a>(&'a self, skill_id: &'a str) -> impl Iterator<Item = &'a DuplicatePair> {
        self.pairs
            .iter()
            .filter(move |pair| pair.skill_a == skill_id || pair.skill_b == skill_id)
    }
}

/// Engine for detecting duplicate skills
#[derive(Debug, Clone)]
pub struct DeduplicationEngine {
    similarity_threshold: f32,
    max_pairs: usize,
}

impl Default for DeduplicationEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl DeduplicationEngine {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            similarity_threshold: DEFAULT_SIMILARITY_THRESHOLD,
            max_pairs: DEFAULT_MAX_PAIRS,
        }
    }

    /// Set the similarity threshold
    #[must_use]
    pub fn with_threshold(mut self, threshold: f32) -> Self {
        self.similarity_threshold = if threshold.is_nan() {
            DEFAULT_SIMILARITY_THRESHOLD
        } else {
            threshold.clamp(0.0, 1.0)
        };
        self
    }

    #[must_use]
    pub const fn with_max_pairs(mut self, max_pairs: usize) -> Self {
        self.max_pairs = max_pairs;
        self
    }

    #[must_use]
    pub const fn threshold(&self) -> f32 {
        self.similarity_threshold
    }

    /// Scan a corpus snapshot for duplicate pairs.
    pub fn scan(&self, records: &[SkillRecord]) -> DedupReport {
        let mut live: Vec<&SkillRecord> = records
            .iter()
            .filter(|record| record.status != SkillStatus::Deprecated)
            .collect();
        live.sort_by(|a, b| a.skill_id.cmp(&b.skill_id));
        if live.len() < 2 {
            return DedupReport::default();
        }

        let documents: Vec<Vec<String>> = live
            .par_iter()
            .map(|record| terms(&format!("{}\n{}", record.title, record.content)))
            .collect();
        let idf = inverse_document_frequency(&documents);
        let vectors: Vec<TermVector> = documents
            .par_iter()
            .map(|tokens| tf_idf(tokens, &idf))
            .collect();

        let (candidates, truncated) = same_tag_pairs(&live, self.max_pairs);
        if truncated {
            tracing::warn!(
                max_pairs = self.max_pairs,
                "dedup pair ceiling reached, scan truncated"
            );
        }

        let threshold = f64::from(self.similarity_threshold);
        let mut pairs: Vec<DuplicatePair> = candidates
            .par_iter()
            .filter_map(|&(i, j)| {
                let similarity = cosine(&vectors[i], &vectors[j]);
                if similarity < threshold {
                    return None;
                }
                let (a, b) = (live[i], live[j]);
                #[allow(clippy::cast_possible_truncation)]
                Some(DuplicatePair {
                    skill_a: a.skill_id.clone(),
                    skill_b: b.skill_id.clone(),
                    similarity: similarity as f32,
                    same_kind: a.kind == b.kind,
                    common_tags: common_tags(a, b),
                })
            })
            .collect();

        pairs.sort_by(|x, y| {
            y.similarity
                .total_cmp(&x.similarity)
                .then_with(|| x.skill_a.cmp(&y.skill_a))
                .then_with(|| x.skill_b.cmp(&y.skill_b))
        });
        tracing::debug!(compared = candidates.len(), found = pairs.len(), "dedup scan complete");

        DedupReport {
            pairs,
            compared: candidates.len(),
            truncated,
        }
    }
}

/// Duplicate pairs at or above `threshold`, most similar first.
pub fn find_duplicates(records: &[SkillRecord], threshold: f32) -> Vec<DuplicatePair> {
    DeduplicationEngine::new()
        .with_threshold(threshold)
        .scan(records)
        .pairs
}

/// `ln(1 + N / df)`: the `+ 1` keeps terms present in every document
/// (including a corpus of one) from collapsing to zero weight.
fn inverse_document_frequency(documents: &[Vec<String>]) -> BTreeMap<String, f64> {
    let mut document_frequency: BTreeMap<String, usize> = BTreeMap::new();
    for tokens in documents {
        let unique: BTreeSet<&String> = tokens.iter().collect();
        for term in unique {
            *document_frequency.entry(term.clone()).or_insert(0) += 1;
        }
    }

    #[allow(clippy::cast_precision_loss)]
    let n = documents.len() as f64;
    document_frequency
        .into_iter()
        .map(|(term, df)| {
            #[allow(clippy::cast_precision_loss)]
            let idf = (1.0 + n / df as f64).ln();
            (term, idf)
        })
        .collect()
}

fn tf_idf(tokens: &[String], idf: &BTreeMap<String, f64>) -> TermVector {
    if tokens.is_empty() {
        return TermVector::new();
    }
    let mut counts: BTreeMap<&String, usize> = BTreeMap::new();
    for token in tokens {
        *counts.entry(token).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)]
    let total = tokens.len() as f64;
    counts
        .into_iter()
        .map(|(term, count)| {
            #[allow(clippy::cast_precision_loss)]
            let tf = count as f64 / total;
            (term.clone(), tf * idf.get(term).copied().unwrap_or(0.0))
        })
        .collect()
}

fn cosine(a: &TermVector, b: &TermVector) -> f64 {
    let (small, large) = if a.len() <= b.len() { (a, b) } else { (b, a) };
    let dot: f64 = small
        .iter()
        .filter_map(|(term, x)| large.get(term).map(|y| x * y))
        .sum();
    let norm_a = a.values().map(|x| x * x).sum::<f64>().sqrt();
    let norm_b = b.values().map(|x| x * x).sum::<f64>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        (dot / (norm_a * norm_b)).clamp(-1.0, 1.0)
    }
}

fn common_tags(a: &SkillRecord, b: &SkillRecord) -> Vec<String> {
    let tags_b: BTreeSet<&String> = b.domain_tags.iter().collect();
    let shared: BTreeSet<&String> = a
        .domain_tags
        .iter()
        .filter(|tag| tags_b.contains(tag))
        .collect();
    shared.into_iter().cloned().collect()
}

/// Human-readable dedup report
#[must_use]
pub fn format_report(report: &DedupReport) -> String {
    if report.pairs.is_empty() {
        return format!("No duplicate skills detected ({} pairs compared).", report.compared);
    }

    let mut lines = vec![
        format!("{} potential duplicate pair(s):", report.pairs.len()),
        String::new(),
    ];
    for (i, pair) in report.pairs.iter().enumerate() {
        lines.push(format!("{}. {} <-> {}", i + 1, pair.skill_a, pair.skill_b));
        lines.push(format!("   Similarity: {:.1}%", pair.similarity * 100.0));
        lines.push(format!("   Shared tags: {}", pair.common_tags.join(", ")));
        lines.push(format!(
            "   Same type: {}",
            if pair.same_kind { "yes" } else { "no" }
        ));
        lines.push(String::new());
    }
    if report.truncated {
        lines.push(format!(
            "Scan stopped after {} pairs; raise analytics.max_pairs to compare more.",
            report.compared
        ));
    }
    lines.join("\n")
}
