//! Tag taxonomy loading and tag-cloud derivation.
//!
//! The taxonomy is a static category → ranked-tag-list mapping loaded once
//! at startup. A missing or unreadable taxonomy degrades to an empty map:
//! the cloud is simply never shown and tag filtering contributes nothing.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use tracing::info;

use crate::catalog::fetch_text;

/// One ranked tag within a category.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct TagEntry {
  pub tag: String,
  pub count: u64,
}

/// Immutable category → ranked tag list mapping.
#[derive(Debug, Clone, Default)]
pub struct Taxonomy {
  by_category: HashMap<String, Vec<TagEntry>>,
}

impl Taxonomy {
  pub fn empty() -> Self {
    Self::default()
  }

  pub fn from_map(by_category: HashMap<String, Vec<TagEntry>>) -> Self {
    Self { by_category }
  }

  pub fn get(&self, category: &str) -> Option<&[TagEntry]> {
    self.by_category.get(category).map(Vec::as_slice)
  }
}

/// Load the taxonomy JSON (`{ "Category": [{"tag": ..., "count": ...}] }`).
/// Callers treat failure as a degraded feature, not a fatal error.
pub async fn load_taxonomy(location: &str) -> Result<Taxonomy> {
  let text = fetch_text(location).await?;
  let by_category: HashMap<String, Vec<TagEntry>> =
    serde_json::from_str(&text).with_context(|| format!("failed to parse taxonomy {}", location))?;
  info!(categories = by_category.len(), "taxonomy loaded");
  Ok(Taxonomy::from_map(by_category))
}

// --- Cloud derivation ---

/// Discrete display sizes, from least to most frequent within a category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagSize {
  Xs,
  Sm,
  Md,
  Lg,
  Xl,
}

/// One tag as presented in the cloud.
#[derive(Debug, Clone, PartialEq)]
pub struct CloudTag {
  pub tag: String,
  pub count: u64,
  pub size: TagSize,
  pub active: bool,
}

/// Map a 0..=1 frequency ratio to a size bucket via fixed thresholds.
fn bucket(ratio: f64) -> TagSize {
  if ratio > 0.8 {
    TagSize::Xl
  } else if ratio > 0.6 {
    TagSize::Lg
  } else if ratio > 0.4 {
    TagSize::Md
  } else if ratio > 0.2 {
    TagSize::Sm
  } else {
    TagSize::Xs
  }
}

/// Derive the sized, activity-flagged tag cloud for the selected category.
/// An empty result means "hidden": no category selected, no taxonomy entry,
/// or an empty tag list. When every tag shares one count the ratio is 0 for
/// all of them (no division by zero).
pub fn derive_tag_cloud(taxonomy: &Taxonomy, category: &str, active_tags: &HashSet<String>) -> Vec<CloudTag> {
  if category.is_empty() {
    return Vec::new();
  }
  let Some(entries) = taxonomy.get(category) else { return Vec::new() };
  if entries.is_empty() {
    return Vec::new();
  }

  let max = entries.iter().map(|e| e.count).max().unwrap_or(0);
  let min = entries.iter().map(|e| e.count).min().unwrap_or(0);
  let span = max.saturating_sub(min);

  entries
    .iter()
    .map(|e| {
      let ratio = if span == 0 { 0.0 } else { (e.count - min) as f64 / span as f64 };
      CloudTag { tag: e.tag.clone(), count: e.count, size: bucket(ratio), active: active_tags.contains(&e.tag) }
    })
    .collect()
}

/// Flip a tag's membership in the active set: add if absent, remove if present.
pub fn toggle_tag(active_tags: &mut HashSet<String>, tag: &str) {
  if !active_tags.remove(tag) {
    active_tags.insert(tag.to_string());
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn taxonomy(category: &str, counts: &[(&str, u64)]) -> Taxonomy {
    let entries = counts.iter().map(|(tag, count)| TagEntry { tag: tag.to_string(), count: *count }).collect();
    Taxonomy::from_map(HashMap::from([(category.to_string(), entries)]))
  }

  fn sizes(cloud: &[CloudTag]) -> Vec<TagSize> {
    cloud.iter().map(|t| t.size).collect()
  }

  // --- derive_tag_cloud ---

  #[test]
  fn hidden_when_no_category_selected() {
    let tax = taxonomy("Tech", &[("rust", 3)]);
    assert!(derive_tag_cloud(&tax, "", &HashSet::new()).is_empty());
  }

  #[test]
  fn hidden_when_category_unknown_or_empty() {
    let tax = taxonomy("Tech", &[("rust", 3)]);
    assert!(derive_tag_cloud(&tax, "Health", &HashSet::new()).is_empty());
    let empty = taxonomy("Tech", &[]);
    assert!(derive_tag_cloud(&empty, "Tech", &HashSet::new()).is_empty());
    assert!(derive_tag_cloud(&Taxonomy::empty(), "Tech", &HashSet::new()).is_empty());
  }

  #[test]
  fn bucket_boundaries() {
    // counts [1, 5, 10]: min=1, max=10; ratios 0, 4/9≈0.44, 1.0
    let tax = taxonomy("Tech", &[("low", 1), ("mid", 5), ("high", 10)]);
    let cloud = derive_tag_cloud(&tax, "Tech", &HashSet::new());
    assert_eq!(sizes(&cloud), vec![TagSize::Xs, TagSize::Md, TagSize::Xl]);
  }

  #[test]
  fn all_five_buckets_reachable() {
    let tax = taxonomy("Tech", &[("a", 0), ("b", 3), ("c", 5), ("d", 7), ("e", 10)]);
    let cloud = derive_tag_cloud(&tax, "Tech", &HashSet::new());
    assert_eq!(sizes(&cloud), vec![TagSize::Xs, TagSize::Sm, TagSize::Md, TagSize::Lg, TagSize::Xl]);
  }

  #[test]
  fn uniform_counts_all_bucket_xs() {
    let tax = taxonomy("Tech", &[("a", 4), ("b", 4), ("c", 4)]);
    let cloud = derive_tag_cloud(&tax, "Tech", &HashSet::new());
    assert_eq!(sizes(&cloud), vec![TagSize::Xs, TagSize::Xs, TagSize::Xs]);
  }

  #[test]
  fn active_flags_follow_the_active_set() {
    let tax = taxonomy("Tech", &[("rust", 3), ("go", 1)]);
    let active = HashSet::from(["rust".to_string()]);
    let cloud = derive_tag_cloud(&tax, "Tech", &active);
    assert!(cloud[0].active);
    assert!(!cloud[1].active);
  }

  #[test]
  fn taxonomy_order_is_preserved() {
    let tax = taxonomy("Tech", &[("z", 1), ("a", 2), ("m", 3)]);
    let cloud = derive_tag_cloud(&tax, "Tech", &HashSet::new());
    let names: Vec<&str> = cloud.iter().map(|t| t.tag.as_str()).collect();
    assert_eq!(names, vec!["z", "a", "m"]);
  }

  // --- toggle_tag ---

  #[test]
  fn toggle_twice_round_trips() {
    let mut active = HashSet::new();
    toggle_tag(&mut active, "rust");
    assert!(active.contains("rust"));
    toggle_tag(&mut active, "rust");
    assert!(active.is_empty());
  }
}
