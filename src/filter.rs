//! The filter engine: turns the full catalog plus one set of user criteria
//! into an order-preserving subset, as indices into the catalog.
//!
//! Pure functions only — the session object owns the state and hands in
//! explicit slices, so everything here is testable without UI scaffolding.

use chrono::{Datelike, Days, Months, NaiveDate};
use std::collections::HashSet;

use crate::catalog::Record;
use crate::sort::SortKey;

// --- Criteria ---

/// One filter invocation's worth of constraints, rebuilt per invocation.
/// Empty strings mean "no constraint" for that dimension.
#[derive(Debug, Clone, Default)]
pub struct FilterCriteria {
  pub search_query: String,
  pub category: String,
  pub presenter: String,
  pub date_window: Option<DateWindow>,
  pub sort_key: SortKey,
}

/// Named relative (or, for `LastYear`, fixed calendar) publish-date ranges.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateWindow {
  Week,
  Month,
  ThreeMonths,
  SixMonths,
  Year,
  /// The previous full calendar year, inclusive both ends.
  LastYear,
}

impl DateWindow {
  pub const ALL: [DateWindow; 6] = [
    DateWindow::Week,
    DateWindow::Month,
    DateWindow::ThreeMonths,
    DateWindow::SixMonths,
    DateWindow::Year,
    DateWindow::LastYear,
  ];

  pub fn label(self) -> &'static str {
    match self {
      DateWindow::Week => "past week",
      DateWindow::Month => "past month",
      DateWindow::ThreeMonths => "past 3 months",
      DateWindow::SixMonths => "past 6 months",
      DateWindow::Year => "past year",
      DateWindow::LastYear => "last calendar year",
    }
  }
}

// --- Date window resolution ---

/// The "published on or after" cutoff for the open-ended windows.
/// `LastYear` is two-sided and handled separately.
fn cutoff(window: DateWindow, now: NaiveDate) -> Option<NaiveDate> {
  match window {
    DateWindow::Week => now.checked_sub_days(Days::new(7)),
    DateWindow::Month => now.checked_sub_months(Months::new(1)),
    DateWindow::ThreeMonths => now.checked_sub_months(Months::new(3)),
    DateWindow::SixMonths => now.checked_sub_months(Months::new(6)),
    DateWindow::Year => now.checked_sub_months(Months::new(12)),
    DateWindow::LastYear => None,
  }
}

/// Whether a publish date falls inside the window, resolved against an
/// explicit `now` so tests never depend on the wall clock. Records without
/// a parseable publish date never match a date constraint.
pub fn window_matches(window: DateWindow, published: Option<NaiveDate>, now: NaiveDate) -> bool {
  let Some(date) = published else { return false };
  match window {
    DateWindow::LastYear => {
      let year = now.year() - 1;
      match (NaiveDate::from_ymd_opt(year, 1, 1), NaiveDate::from_ymd_opt(year, 12, 31)) {
        (Some(start), Some(end)) => date >= start && date <= end,
        _ => false,
      }
    }
    _ => cutoff(window, now).is_some_and(|c| date >= c),
  }
}

// --- Tag matching ---

/// Lowercased word tokens of a tag phrase, split on anything that isn't
/// alphanumeric.
fn tokenize(phrase: &str) -> Vec<String> {
  phrase.split(|c: char| !c.is_alphanumeric()).filter(|t| !t.is_empty()).map(str::to_lowercase).collect()
}

/// Whole-word match between one record tag phrase and one active tag:
/// the active tag's tokens must appear as a contiguous run of the record
/// tag's tokens. "rock" matches "hard rock" but not "hardrock" — the
/// mid-word false negative is intended (whole words, never substrings).
pub fn tag_phrase_matches(record_tag: &str, active_tag: &str) -> bool {
  let record_tokens = tokenize(record_tag);
  let active_tokens = tokenize(active_tag);
  if active_tokens.is_empty() || record_tokens.len() < active_tokens.len() {
    return false;
  }
  record_tokens.windows(active_tokens.len()).any(|w| w == active_tokens.as_slice())
}

/// ANY-of semantics: at least one active tag matches at least one of the
/// record's comma-separated tag phrases.
fn matches_active_tags(record: &Record, active_tags: &HashSet<String>) -> bool {
  active_tags.iter().any(|active| Record::split_list(&record.tags).any(|phrase| tag_phrase_matches(phrase, active)))
}

// --- Search ---

/// Case-insensitive substring search across the fixed field set.
fn matches_search(record: &Record, needle: &str) -> bool {
  [&record.title, &record.description, &record.tags, &record.categories, &record.presenters]
    .iter()
    .any(|field| field.to_lowercase().contains(needle))
}

// --- The engine ---

/// Apply all constraints as a conjunction and return the indices of the
/// matching records, in catalog order. Never mutates the records; an empty
/// result is a normal outcome.
///
/// Category and presenter use substring containment against the raw
/// comma-joined fields, matching how those fields are populated.
pub fn filter_records(
  records: &[Record],
  criteria: &FilterCriteria,
  active_tags: &HashSet<String>,
  now: NaiveDate,
) -> Vec<usize> {
  let needle = criteria.search_query.trim().to_lowercase();

  records
    .iter()
    .enumerate()
    .filter(|(_, r)| needle.is_empty() || matches_search(r, &needle))
    .filter(|(_, r)| criteria.category.is_empty() || r.categories.contains(&criteria.category))
    .filter(|(_, r)| criteria.presenter.is_empty() || r.presenters.contains(&criteria.presenter))
    .filter(|(_, r)| active_tags.is_empty() || matches_active_tags(r, active_tags))
    .filter(|(_, r)| criteria.date_window.is_none_or(|w| window_matches(w, r.published, now)))
    .map(|(i, _)| i)
    .collect()
}

#[cfg(test)]
mod tests {
  use super::*;

  fn record(id: &str, title: &str) -> Record {
    Record { id: id.to_string(), title: title.to_string(), ..Record::default() }
  }

  fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
  }

  fn sample() -> Vec<Record> {
    vec![
      Record {
        categories: "Tech,General".to_string(),
        presenters: "Ada Lovelace".to_string(),
        tags: "rust, hard rock".to_string(),
        published: Some(date(2024, 2, 1)),
        ..record("a", "Intro to Rust")
      },
      Record {
        categories: "Health".to_string(),
        presenters: "Grace Hopper".to_string(),
        tags: "hardrock, sleep".to_string(),
        published: Some(date(2023, 7, 1)),
        ..record("b", "Sleep Science")
      },
      Record {
        description: "A rusty deep dive".to_string(),
        categories: "Tech".to_string(),
        ..record("c", "Compilers")
      },
    ]
  }

  fn no_tags() -> HashSet<String> {
    HashSet::new()
  }

  fn tags(list: &[&str]) -> HashSet<String> {
    list.iter().map(|s| s.to_string()).collect()
  }

  fn now() -> NaiveDate {
    date(2024, 6, 15)
  }

  // --- identity & conjunction ---

  #[test]
  fn empty_criteria_returns_all_in_order() {
    let records = sample();
    let got = filter_records(&records, &FilterCriteria::default(), &no_tags(), now());
    assert_eq!(got, vec![0, 1, 2]);
  }

  #[test]
  fn conjunction_narrows_to_subset_of_each_dimension() {
    let records = sample();
    let by_category =
      filter_records(&records, &FilterCriteria { category: "Tech".into(), ..Default::default() }, &no_tags(), now());
    let by_search = filter_records(
      &records,
      &FilterCriteria { search_query: "rust".into(), ..Default::default() },
      &no_tags(),
      now(),
    );
    let both = filter_records(
      &records,
      &FilterCriteria { category: "Tech".into(), search_query: "rust".into(), ..Default::default() },
      &no_tags(),
      now(),
    );
    assert!(both.iter().all(|i| by_category.contains(i)));
    assert!(both.iter().all(|i| by_search.contains(i)));
    assert_eq!(both, vec![0, 2]);
  }

  // --- search ---

  #[test]
  fn search_is_case_insensitive_across_fields() {
    let records = sample();
    let criteria = FilterCriteria { search_query: "GRACE".into(), ..Default::default() };
    assert_eq!(filter_records(&records, &criteria, &no_tags(), now()), vec![1]);
    // matches in description too
    let criteria = FilterCriteria { search_query: "deep dive".into(), ..Default::default() };
    assert_eq!(filter_records(&records, &criteria, &no_tags(), now()), vec![2]);
  }

  #[test]
  fn search_no_match_is_empty_not_error() {
    let records = sample();
    let criteria = FilterCriteria { search_query: "nothing here".into(), ..Default::default() };
    assert!(filter_records(&records, &criteria, &no_tags(), now()).is_empty());
  }

  // --- category & presenter ---

  #[test]
  fn category_is_substring_containment_on_raw_field() {
    let records = sample();
    let criteria = FilterCriteria { category: "Tech".into(), ..Default::default() };
    assert_eq!(filter_records(&records, &criteria, &no_tags(), now()), vec![0, 2]);
    // sentinel category still participates in membership tests
    let criteria = FilterCriteria { category: "General".into(), ..Default::default() };
    assert_eq!(filter_records(&records, &criteria, &no_tags(), now()), vec![0]);
  }

  #[test]
  fn presenter_filters_by_raw_field() {
    let records = sample();
    let criteria = FilterCriteria { presenter: "Ada Lovelace".into(), ..Default::default() };
    assert_eq!(filter_records(&records, &criteria, &no_tags(), now()), vec![0]);
  }

  // --- tags ---

  #[test]
  fn tag_phrase_whole_word_semantics() {
    assert!(tag_phrase_matches("rock", "rock")); // exact
    assert!(tag_phrase_matches("hard rock", "rock")); // trailing word
    assert!(tag_phrase_matches("rock music", "rock")); // leading word
    assert!(tag_phrase_matches("best rock hits", "rock")); // interior word
    assert!(tag_phrase_matches("best rock hits", "rock hits")); // multi-word active tag
    assert!(!tag_phrase_matches("hardrock", "rock")); // mid-word: intentional false negative
    assert!(!tag_phrase_matches("rock", "rock hits"));
    assert!(!tag_phrase_matches("anything", ""));
  }

  #[test]
  fn active_tags_match_any_of() {
    let records = sample();
    assert_eq!(filter_records(&records, &FilterCriteria::default(), &tags(&["rock"]), now()), vec![0]);
    // one matching tag out of several is enough
    assert_eq!(filter_records(&records, &FilterCriteria::default(), &tags(&["rock", "sleep"]), now()), vec![0, 1]);
  }

  #[test]
  fn active_tags_are_case_insensitive() {
    let records = sample();
    assert_eq!(filter_records(&records, &FilterCriteria::default(), &tags(&["RUST"]), now()), vec![0]);
  }

  // --- date windows ---

  #[test]
  fn week_window_uses_seven_day_cutoff() {
    let published = Some(date(2024, 6, 10));
    assert!(window_matches(DateWindow::Week, published, now()));
    assert!(!window_matches(DateWindow::Week, Some(date(2024, 6, 7)), now()));
  }

  #[test]
  fn month_windows_use_calendar_arithmetic() {
    assert!(window_matches(DateWindow::Month, Some(date(2024, 5, 15)), now()));
    assert!(!window_matches(DateWindow::Month, Some(date(2024, 5, 14)), now()));
    assert!(window_matches(DateWindow::SixMonths, Some(date(2023, 12, 15)), now()));
    assert!(!window_matches(DateWindow::SixMonths, Some(date(2023, 12, 14)), now()));
    assert!(window_matches(DateWindow::Year, Some(date(2023, 6, 15)), now()));
  }

  #[test]
  fn last_year_is_the_previous_full_calendar_year() {
    assert!(window_matches(DateWindow::LastYear, Some(date(2023, 7, 1)), now()));
    assert!(window_matches(DateWindow::LastYear, Some(date(2023, 1, 1)), now()));
    assert!(window_matches(DateWindow::LastYear, Some(date(2023, 12, 31)), now()));
    assert!(!window_matches(DateWindow::LastYear, Some(date(2022, 12, 31)), now()));
    assert!(!window_matches(DateWindow::LastYear, Some(date(2024, 1, 1)), now()));
  }

  #[test]
  fn undated_records_never_match_a_date_constraint() {
    for window in DateWindow::ALL {
      assert!(!window_matches(window, None, now()));
    }
    let records = sample();
    let criteria = FilterCriteria { date_window: Some(DateWindow::Year), ..Default::default() };
    // record "c" has no date and is excluded
    assert_eq!(filter_records(&records, &criteria, &no_tags(), now()), vec![0, 1]);
  }
}
