//! The sort engine: a deterministic, stable total order per sort key over
//! an already-filtered index list.

use chrono::NaiveDate;
use std::cmp::Ordering;

use crate::catalog::Record;

/// Available result orderings. `Unsorted` preserves the input order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortKey {
  #[default]
  DateDesc,
  DateAsc,
  ViewsDesc,
  ViewsAsc,
  TitleAsc,
  TitleDesc,
  DurationDesc,
  DurationAsc,
  Unsorted,
}

impl SortKey {
  /// Cycle order for the sort control. `Unsorted` is reachable last.
  pub const ALL: [SortKey; 9] = [
    SortKey::DateDesc,
    SortKey::DateAsc,
    SortKey::ViewsDesc,
    SortKey::ViewsAsc,
    SortKey::TitleAsc,
    SortKey::TitleDesc,
    SortKey::DurationDesc,
    SortKey::DurationAsc,
    SortKey::Unsorted,
  ];

  pub fn label(self) -> &'static str {
    match self {
      SortKey::DateDesc => "date ↓",
      SortKey::DateAsc => "date ↑",
      SortKey::ViewsDesc => "views ↓",
      SortKey::ViewsAsc => "views ↑",
      SortKey::TitleAsc => "title a-z",
      SortKey::TitleDesc => "title z-a",
      SortKey::DurationDesc => "duration ↓",
      SortKey::DurationAsc => "duration ↑",
      SortKey::Unsorted => "unsorted",
    }
  }
}

// --- Duration parsing ---

/// Total seconds of an `H:MM:SS` or `M:SS` duration string. Missing or
/// malformed input is 0; a non-numeric component contributes 0.
pub fn parse_duration_secs(raw: &str) -> u64 {
  let raw = raw.trim();
  if raw.is_empty() {
    return 0;
  }
  let parts: Vec<u64> = raw.split(':').map(|p| p.trim().parse().unwrap_or(0)).collect();
  match parts.as_slice() {
    [h, m, s] => h * 3600 + m * 60 + s,
    [m, s] => m * 60 + s,
    _ => 0,
  }
}

// --- Comparison ---

/// Undated records rank after all dated records regardless of direction —
/// they are pushed to the bottom of the list either way.
fn cmp_dates(a: Option<NaiveDate>, b: Option<NaiveDate>, descending: bool) -> Ordering {
  match (a, b) {
    (None, None) => Ordering::Equal,
    (None, Some(_)) => Ordering::Greater,
    (Some(_), None) => Ordering::Less,
    (Some(a), Some(b)) => {
      if descending {
        b.cmp(&a)
      } else {
        a.cmp(&b)
      }
    }
  }
}

fn cmp_titles(a: &Record, b: &Record) -> Ordering {
  a.title.to_lowercase().cmp(&b.title.to_lowercase())
}

// --- The engine ---

/// Stable-sort `indices` (positions into `records`) by the given key.
/// Ties keep their prior relative order; `Unsorted` leaves the input as is.
pub fn sort_records(records: &[Record], indices: &mut [usize], key: SortKey) {
  match key {
    SortKey::DateDesc => indices.sort_by(|&a, &b| cmp_dates(records[a].published, records[b].published, true)),
    SortKey::DateAsc => indices.sort_by(|&a, &b| cmp_dates(records[a].published, records[b].published, false)),
    SortKey::ViewsDesc => indices.sort_by(|&a, &b| records[b].views.cmp(&records[a].views)),
    SortKey::ViewsAsc => indices.sort_by(|&a, &b| records[a].views.cmp(&records[b].views)),
    SortKey::TitleAsc => indices.sort_by(|&a, &b| cmp_titles(&records[a], &records[b])),
    SortKey::TitleDesc => indices.sort_by(|&a, &b| cmp_titles(&records[b], &records[a])),
    SortKey::DurationDesc => {
      indices.sort_by(|&a, &b| parse_duration_secs(&records[b].duration).cmp(&parse_duration_secs(&records[a].duration)))
    }
    SortKey::DurationAsc => {
      indices.sort_by(|&a, &b| parse_duration_secs(&records[a].duration).cmp(&parse_duration_secs(&records[b].duration)))
    }
    SortKey::Unsorted => {}
  }
}
