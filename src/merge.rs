// src/merge.rs
use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::model::NormalizedProduct;
use crate::slug::fold;

/// When two product names count as the same product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchPolicy {
    /// Overlap must be strictly greater than this.
    pub overlap_threshold: f64,
    /// Both names need more tokens than this for the overlap test.
    pub min_tokens: usize,
}

impl Default for MatchPolicy {
    fn default() -> Self {
        Self {
            overlap_threshold: 0.70,
            min_tokens: 2,
        }
    }
}

fn tokens(name: &str) -> HashSet<String> {
    fold(name).split_whitespace().map(str::to_string).collect()
}

/// `|A ∩ B| / max(|A|, |B|)`, or `None` when either side is too short.
pub fn overlap_ratio(a: &str, b: &str, min_tokens: usize) -> Option<f64> {
    let ta = tokens(a);
    let tb = tokens(b);
    if ta.len() <= min_tokens || tb.len() <= min_tokens {
        return None;
    }
    let common = ta.intersection(&tb).count();
    Some(common as f64 / ta.len().max(tb.len()) as f64)
}

impl MatchPolicy {
    pub fn same_product(&self, a: &str, b: &str) -> bool {
        if a.trim().to_lowercase() == b.trim().to_lowercase() {
            return true;
        }
        overlap_ratio(a, b, self.min_tokens).is_some_and(|r| r > self.overlap_threshold)
    }

    /// Index of the record `name` refers to. An exact name anywhere in the
    /// catalog beats an earlier overlap hit.
    pub fn find_match(&self, name: &str, catalog: &[NormalizedProduct]) -> Option<usize> {
        let wanted = name.trim().to_lowercase();
        if let Some(i) = catalog.iter().position(|p| p.name.trim().to_lowercase() == wanted) {
            return Some(i);
        }
        catalog.iter().position(|p| {
            overlap_ratio(name, &p.name, self.min_tokens).is_some_and(|r| r > self.overlap_threshold)
        })
    }
}

/// Folds a fresh candidate into a curated record. Text, flags and SEO copy of
/// `existing` win; images are only taken when `existing` has none.
pub fn merge_into(existing: &mut NormalizedProduct, candidate: &NormalizedProduct) {
    if !existing.has_images() && candidate.has_images() {
        existing.images = candidate.images.clone();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Merged(usize),
    Inserted(usize),
}

pub struct Merger<'a> {
    policy: &'a MatchPolicy,
}

impl<'a> Merger<'a> {
    pub fn new(policy: &'a MatchPolicy) -> Self {
        Self { policy }
    }

    /// Merges into a matching record or appends. `prepare` runs only for a
    /// candidate that ends up appended (used to fill generated copy).
    pub fn absorb<F>(
        &self,
        catalog: &mut Vec<NormalizedProduct>,
        mut candidate: NormalizedProduct,
        prepare: F,
    ) -> Outcome
    where
        F: FnOnce(&mut NormalizedProduct),
    {
        match self.policy.find_match(&candidate.name, catalog) {
            Some(idx) => {
                let existing = &mut catalog[idx];
                info!("[MATCH] {} -> {}", candidate.name, existing.name);
                merge_into(existing, &candidate);
                Outcome::Merged(idx)
            }
            None => {
                prepare(&mut candidate);
                catalog.push(candidate);
                Outcome::Inserted(catalog.len() - 1)
            }
        }
    }
}
