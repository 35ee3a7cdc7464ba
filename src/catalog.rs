use anyhow::{Context, Result, anyhow};
use chrono::NaiveDate;
use tracing::{info, warn};

use crate::constants::constants;

/// One catalog entry. The comma-joined text fields (`categories`,
/// `presenters`, `tags`) are kept raw, exactly as loaded — the engines match
/// against them directly and split on demand.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
  pub id: String,
  pub title: String,
  pub description: String,
  pub categories: String,
  pub presenters: String,
  pub tags: String,
  pub views: u64,
  pub likes: u64,
  pub comments: u64,
  /// The publish date as it appeared in the dataset (`dd/mm/yyyy`), for display.
  pub published_raw: String,
  /// Parsed publish date. Absent or malformed input yields `None`, never an error.
  pub published: Option<NaiveDate>,
  /// Raw duration string (`H:MM:SS` or `M:SS`). Empty means unknown.
  pub duration: String,
  pub url: String,
  pub thumbnail: String,
}

impl Record {
  /// Split a raw comma-joined field into trimmed, non-empty parts.
  pub fn split_list(raw: &str) -> impl Iterator<Item = &str> {
    raw.split(',').map(str::trim).filter(|s| !s.is_empty())
  }
}

// --- Field parsing ---

/// Split one dataset line on `;`, honoring `"` as a naive quote toggle:
/// separators inside quotes are literal text. Quote characters themselves
/// are dropped; there is no escaped-quote doubling.
pub fn split_fields(line: &str) -> Vec<String> {
  let mut fields = Vec::new();
  let mut current = String::new();
  let mut in_quotes = false;

  for c in line.chars() {
    match c {
      '"' => in_quotes = !in_quotes,
      ';' if !in_quotes => fields.push(std::mem::take(&mut current)),
      _ => current.push(c),
    }
  }
  fields.push(current);
  fields
}

/// Parse a `dd/mm/yyyy` literal into a date. Anything malformed is `None`.
pub fn parse_publish_date(raw: &str) -> Option<NaiveDate> {
  let mut parts = raw.trim().splitn(3, '/');
  let day: u32 = parts.next()?.trim().parse().ok()?;
  let month: u32 = parts.next()?.trim().parse().ok()?;
  let year: i32 = parts.next()?.trim().parse().ok()?;
  NaiveDate::from_ymd_opt(year, month, day)
}

// --- Header mapping ---

/// Column positions resolved from the header row. Dynamic by-name lookup
/// happens once here; every `Record` after that is built positionally.
#[derive(Debug, Default)]
struct Columns {
  id: Option<usize>,
  title: Option<usize>,
  description: Option<usize>,
  categories: Option<usize>,
  presenters: Option<usize>,
  tags: Option<usize>,
  merged_tags: Option<usize>,
  views: Option<usize>,
  likes: Option<usize>,
  comments: Option<usize>,
  published: Option<usize>,
  duration: Option<usize>,
  url: Option<usize>,
  thumbnail: Option<usize>,
}

impl Columns {
  fn from_header(header: &[String]) -> Self {
    let mut cols = Self::default();
    for (i, name) in header.iter().enumerate() {
      match name.trim().to_lowercase().as_str() {
        "id" => cols.id = Some(i),
        "title" => cols.title = Some(i),
        "description" => cols.description = Some(i),
        "categories" => cols.categories = Some(i),
        "presenters" => cols.presenters = Some(i),
        "tags" => cols.tags = Some(i),
        "merged_tags" => cols.merged_tags = Some(i),
        "views" => cols.views = Some(i),
        "likes" => cols.likes = Some(i),
        "comments" => cols.comments = Some(i),
        "published" => cols.published = Some(i),
        "duration" => cols.duration = Some(i),
        "url" => cols.url = Some(i),
        "thumbnail" => cols.thumbnail = Some(i),
        _ => {}
      }
    }
    cols
  }

  fn record(&self, fields: &[String]) -> Record {
    let text = |col: Option<usize>| col.and_then(|i| fields.get(i)).map(|s| s.trim().to_string()).unwrap_or_default();
    let count = |col: Option<usize>| -> u64 { text(col).parse().unwrap_or(0) };

    // Merged tags take precedence over the plain tags column when present.
    let merged = text(self.merged_tags);
    let tags = if merged.is_empty() { text(self.tags) } else { merged };

    let published_raw = text(self.published);

    Record {
      id: text(self.id),
      title: text(self.title),
      description: text(self.description),
      categories: text(self.categories),
      presenters: text(self.presenters),
      tags,
      views: count(self.views),
      likes: count(self.likes),
      comments: count(self.comments),
      published: parse_publish_date(&published_raw),
      published_raw,
      duration: text(self.duration),
      url: text(self.url),
      thumbnail: text(self.thumbnail),
    }
  }
}

// --- Catalog parsing ---

/// Parse the full semicolon-delimited dataset text into records.
/// The first non-blank line is the header; rows without an id or a title
/// are dropped silently (counted in the log, never surfaced per-row).
pub fn parse_catalog(text: &str) -> Result<Vec<Record>> {
  let mut lines = text.lines().map(str::trim_end).filter(|l| !l.trim().is_empty());
  let header_line = lines.next().ok_or_else(|| anyhow!("dataset is empty"))?;
  let header = split_fields(header_line);
  let cols = Columns::from_header(&header);

  if cols.id.is_none() || cols.title.is_none() {
    return Err(anyhow!("dataset header is missing the id or title column"));
  }

  let mut dropped = 0usize;
  let records: Vec<Record> = lines
    .map(|line| cols.record(&split_fields(line)))
    .filter(|r| {
      let keep = !r.id.is_empty() && !r.title.is_empty();
      if !keep {
        dropped += 1;
      }
      keep
    })
    .collect();

  if dropped > 0 {
    warn!(dropped, "dropped rows without id or title");
  }
  info!(records = records.len(), "catalog parsed");
  Ok(records)
}

// --- Filter population ---

/// Unique, sorted category names across the catalog, excluding the sentinel
/// category. Drives the category selection control.
pub fn unique_categories(records: &[Record]) -> Vec<String> {
  let sentinel = constants().sentinel_category.as_str();
  let mut out: Vec<String> = records
    .iter()
    .flat_map(|r| Record::split_list(&r.categories))
    .filter(|c| *c != sentinel)
    .map(str::to_string)
    .collect();
  out.sort();
  out.dedup();
  out
}

/// Unique, sorted presenter names across the catalog.
pub fn unique_presenters(records: &[Record]) -> Vec<String> {
  let mut out: Vec<String> =
    records.iter().flat_map(|r| Record::split_list(&r.presenters)).map(str::to_string).collect();
  out.sort();
  out.dedup();
  out
}

// --- Loading ---

/// Fetch the raw text behind a dataset/taxonomy location: an HTTP GET for
/// `http(s)://` locations, a plain file read otherwise.
pub async fn fetch_text(location: &str) -> Result<String> {
  if location.starts_with("http://") || location.starts_with("https://") {
    let response = reqwest::get(location).await.with_context(|| format!("GET {} failed", location))?;
    let response = response.error_for_status().with_context(|| format!("GET {} returned an error status", location))?;
    response.text().await.with_context(|| format!("failed to read response body from {}", location))
  } else {
    tokio::fs::read_to_string(location).await.with_context(|| format!("failed to read {}", location))
  }
}

/// Load and parse the catalog dataset. Failure here is fatal for the app.
pub async fn load_catalog(location: &str) -> Result<Vec<Record>> {
  let text = fetch_text(location).await?;
  parse_catalog(&text).with_context(|| format!("failed to parse dataset {}", location))
}

#[cfg(test)]
mod tests {
  use super::*;

  // --- split_fields ---

  #[test]
  fn split_fields_plain() {
    assert_eq!(split_fields("a;b;c"), vec!["a", "b", "c"]);
  }

  #[test]
  fn split_fields_keeps_empty_fields() {
    assert_eq!(split_fields("a;;c;"), vec!["a", "", "c", ""]);
  }

  #[test]
  fn split_fields_quotes_suppress_separator() {
    assert_eq!(split_fields(r#"a;"b;still b";c"#), vec!["a", "b;still b", "c"]);
  }

  #[test]
  fn split_fields_unterminated_quote_swallows_rest() {
    // Naive quote toggling: an unmatched quote keeps the rest as one field.
    assert_eq!(split_fields(r#"a;"b;c"#), vec!["a", "b;c"]);
  }

  // --- parse_publish_date ---

  #[test]
  fn publish_date_valid() {
    assert_eq!(parse_publish_date("15/06/2024"), NaiveDate::from_ymd_opt(2024, 6, 15));
  }

  #[test]
  fn publish_date_malformed_is_none() {
    assert_eq!(parse_publish_date(""), None);
    assert_eq!(parse_publish_date("2024-06-15"), None);
    assert_eq!(parse_publish_date("15/06"), None);
    assert_eq!(parse_publish_date("31/02/2024"), None); // not a real date
  }

  // --- parse_catalog ---

  const HEADER: &str = "id;title;description;categories;presenters;tags;merged_tags;views;likes;comments;published;duration;url;thumbnail";

  fn catalog(rows: &[&str]) -> Vec<Record> {
    let text = format!("{}\n{}", HEADER, rows.join("\n"));
    parse_catalog(&text).unwrap()
  }

  #[test]
  fn parse_catalog_maps_columns() {
    let records = catalog(&["v1;Intro;desc;Tech,General;Ada;rust;rust lang;1200;30;4;01/02/2024;1:02:03;http://x;http://t"]);
    assert_eq!(records.len(), 1);
    let r = &records[0];
    assert_eq!(r.id, "v1");
    assert_eq!(r.title, "Intro");
    assert_eq!(r.categories, "Tech,General");
    assert_eq!(r.presenters, "Ada");
    assert_eq!(r.views, 1200);
    assert_eq!(r.likes, 30);
    assert_eq!(r.comments, 4);
    assert_eq!(r.published, NaiveDate::from_ymd_opt(2024, 2, 1));
    assert_eq!(r.duration, "1:02:03");
    assert_eq!(r.url, "http://x");
    assert_eq!(r.thumbnail, "http://t");
  }

  #[test]
  fn parse_catalog_prefers_merged_tags() {
    let records = catalog(&["v1;T;;;;plain;merged, extra;;;;;;;"]);
    assert_eq!(records[0].tags, "merged, extra");
  }

  #[test]
  fn parse_catalog_falls_back_to_plain_tags() {
    let records = catalog(&["v1;T;;;;plain;;;;;;;;"]);
    assert_eq!(records[0].tags, "plain");
  }

  #[test]
  fn parse_catalog_drops_rows_missing_id_or_title() {
    let records = catalog(&[
      ";No Id;;;;;;;;;;;;",
      "v2;;;;;;;;;;;;;",
      "v3;Kept;;;;;;;;;;;;",
    ]);
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].id, "v3");
  }

  #[test]
  fn parse_catalog_defaults_unparseable_counts_to_zero() {
    let records = catalog(&["v1;T;;;;;;not-a-number;;;bogus;;;"]);
    assert_eq!(records[0].views, 0);
    assert_eq!(records[0].published, None);
    assert_eq!(records[0].published_raw, "bogus");
  }

  #[test]
  fn parse_catalog_rejects_missing_required_columns() {
    assert!(parse_catalog("title;views\nIntro;3").is_err());
    assert!(parse_catalog("").is_err());
  }

  // --- unique lists ---

  #[test]
  fn unique_categories_sorted_and_deduped_without_sentinel() {
    let records = catalog(&[
      "v1;A;;Tech,General;Ada;;;;;;;;;",
      "v2;B;; Health ,Tech;Grace, Ada;;;;;;;;;",
    ]);
    assert_eq!(unique_categories(&records), vec!["Health", "Tech"]);
    assert_eq!(unique_presenters(&records), vec!["Ada", "Grace"]);
  }
}
