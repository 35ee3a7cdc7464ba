use anyhow::Result;
use chrono::Local;
use ratatui::widgets::ListState;
use std::collections::HashSet;
use std::time::{Duration, Instant};
use tokio::sync::oneshot;
use tracing::{info, warn};

use crate::catalog::{self, Record};
use crate::config::Config;
use crate::constants::constants;
use crate::filter::{DateWindow, FilterCriteria, filter_records};
use crate::sort::{SortKey, sort_records};
use crate::tags::{self, CloudTag, Taxonomy};
use crate::theme::THEMES;

// --- Types ---

/// Everything the startup task delivers: the parsed catalog plus the
/// taxonomy (already degraded to empty if its load failed).
pub type LoadResult = (Vec<Record>, Taxonomy);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppMode {
  /// Typing in the search box.
  Search,
  /// Navigating the filtered results and cycling filter controls.
  Results,
  /// Navigating the tag cloud.
  Tags,
}

/// Startup lifecycle. `Failed` is the fatal dataset error state: the app
/// stays up to show the message but no filtering is possible.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadState {
  Loading,
  Ready,
  Failed(String),
}

// --- App State ---

pub struct App {
  // Loaded once, read-only afterwards
  pub catalog: Vec<Record>,
  pub taxonomy: Taxonomy,
  pub categories: Vec<String>,
  pub presenters: Vec<String>,

  // Filter state (criteria are rebuilt from these per invocation)
  pub search_input: String,
  pub cursor_position: usize,
  pub input_scroll: usize,
  pub category_idx: Option<usize>,
  pub presenter_idx: Option<usize>,
  pub date_window: Option<DateWindow>,
  pub sort_key: SortKey,
  /// Tags toggled on. Lives across filter invocations; reset on category
  /// change or a full filter reset.
  pub active_tags: HashSet<String>,

  /// Indices into `catalog` for the current result set. `None` means no
  /// filter invocation has happened yet — distinct from an empty result.
  pub filtered: Option<Vec<usize>>,
  pub list_state: ListState,

  // Tag cloud presentation state
  pub cloud: Vec<CloudTag>,
  pub cloud_cursor: usize,

  pub mode: AppMode,
  pub load_state: LoadState,
  pub theme_index: usize,
  pub last_error: Option<String>,
  pub status_message: Option<String>,
  pub should_quit: bool,
  load_rx: Option<oneshot::Receiver<Result<LoadResult>>>,
  /// When the last error was set, for auto-dismiss.
  error_time: Option<Instant>,
}

impl App {
  pub fn new() -> Self {
    let config = Config::load();
    let theme_index =
      if let Some(ref name) = config.theme_name { THEMES.iter().position(|t| t.name == name).unwrap_or(0) } else { 0 };

    Self {
      catalog: Vec::new(),
      taxonomy: Taxonomy::empty(),
      categories: Vec::new(),
      presenters: Vec::new(),
      search_input: String::new(),
      cursor_position: 0,
      input_scroll: 0,
      category_idx: None,
      presenter_idx: None,
      date_window: None,
      sort_key: SortKey::default(),
      active_tags: HashSet::new(),
      filtered: None,
      list_state: ListState::default(),
      cloud: Vec::new(),
      cloud_cursor: 0,
      mode: AppMode::Search,
      load_state: LoadState::Loading,
      theme_index,
      last_error: None,
      status_message: None,
      should_quit: false,
      load_rx: None,
      error_time: None,
    }
  }

  pub fn theme(&self) -> &'static crate::theme::Theme {
    &THEMES[self.theme_index]
  }

  pub fn next_theme(&mut self) {
    self.theme_index = (self.theme_index + 1) % THEMES.len();
    Config { theme_name: Some(self.theme().name.to_string()) }.save();
  }

  // --- Errors ---

  pub fn set_error(&mut self, msg: String) {
    self.last_error = Some(msg);
    self.error_time = Some(Instant::now());
  }

  pub fn clear_error(&mut self) {
    self.last_error = None;
    self.error_time = None;
  }

  /// Clear stale error messages after the configured TTL.
  pub fn expire_error(&mut self) {
    if let Some(t) = self.error_time
      && t.elapsed() >= Duration::from_secs(constants().error_ttl_secs)
    {
      self.last_error = None;
      self.error_time = None;
    }
  }

  // --- Startup loads ---

  /// Kick off the dataset and taxonomy loads on a background task. The
  /// dataset is required; the taxonomy degrades to empty on failure.
  pub fn start_load(&mut self, dataset: String, taxonomy: String) {
    self.status_message = Some(format!("Loading {}…", dataset));
    let (tx, rx) = oneshot::channel();
    tokio::spawn(async move {
      let result: Result<LoadResult> = async {
        let records = catalog::load_catalog(&dataset).await?;
        let taxonomy = match tags::load_taxonomy(&taxonomy).await {
          Ok(t) => t,
          Err(e) => {
            warn!(err = %e, "taxonomy unavailable, tag cloud disabled");
            Taxonomy::empty()
          }
        };
        Ok((records, taxonomy))
      }
      .await;
      let _ = tx.send(result);
    });
    self.load_rx = Some(rx);
  }

  /// Poll the startup task from the draw loop.
  pub fn check_pending(&mut self) {
    if let Some(mut rx) = self.load_rx.take() {
      match rx.try_recv() {
        Ok(result) => {
          self.status_message = None;
          match result {
            Ok((records, taxonomy)) => {
              info!(records = records.len(), "catalog ready");
              self.categories = catalog::unique_categories(&records);
              self.presenters = catalog::unique_presenters(&records);
              self.catalog = records;
              self.taxonomy = taxonomy;
              self.load_state = LoadState::Ready;
            }
            Err(e) => {
              self.load_state = LoadState::Failed(format!("{:#}", e));
            }
          }
        }
        Err(oneshot::error::TryRecvError::Empty) => {
          self.load_rx = Some(rx);
        }
        Err(oneshot::error::TryRecvError::Closed) => {
          self.status_message = None;
          self.load_state = LoadState::Failed("Load task failed.".to_string());
        }
      }
    }
  }

  // --- Criteria & filtering ---

  pub fn selected_category(&self) -> &str {
    self.category_idx.and_then(|i| self.categories.get(i)).map(String::as_str).unwrap_or("")
  }

  pub fn selected_presenter(&self) -> &str {
    self.presenter_idx.and_then(|i| self.presenters.get(i)).map(String::as_str).unwrap_or("")
  }

  /// Build this invocation's criteria from the current control state.
  pub fn criteria(&self) -> FilterCriteria {
    FilterCriteria {
      search_query: self.search_input.trim().to_string(),
      category: self.selected_category().to_string(),
      presenter: self.selected_presenter().to_string(),
      date_window: self.date_window,
      sort_key: self.sort_key,
    }
  }

  /// Run the filter and sort engines against the catalog and replace the
  /// result set. A no-op until the catalog is ready.
  pub fn apply_filters(&mut self) {
    if self.load_state != LoadState::Ready {
      return;
    }
    let criteria = self.criteria();
    let now = Local::now().date_naive();
    let mut indices = filter_records(&self.catalog, &criteria, &self.active_tags, now);
    sort_records(&self.catalog, &mut indices, criteria.sort_key);
    info!(results = indices.len(), "filters applied");

    self.list_state.select(if indices.is_empty() { None } else { Some(0) });
    self.filtered = Some(indices);
  }

  pub fn result_count(&self) -> usize {
    self.filtered.as_ref().map_or(0, Vec::len)
  }

  pub fn selected_record(&self) -> Option<&Record> {
    let indices = self.filtered.as_ref()?;
    let selected = self.list_state.selected()?;
    indices.get(selected).and_then(|&i| self.catalog.get(i))
  }

  // --- Filter controls ---

  /// Cycle the category selection (None → first → … → last → None).
  /// Changing category resets the active tags and rebuilds the cloud.
  pub fn cycle_category(&mut self, forward: bool) {
    if self.categories.is_empty() {
      return;
    }
    self.category_idx = cycle_option(self.category_idx, self.categories.len(), forward);
    self.active_tags.clear();
    self.refresh_cloud();
    self.apply_filters();
  }

  pub fn cycle_presenter(&mut self, forward: bool) {
    if self.presenters.is_empty() {
      return;
    }
    self.presenter_idx = cycle_option(self.presenter_idx, self.presenters.len(), forward);
    self.apply_filters();
  }

  pub fn cycle_date_window(&mut self, forward: bool) {
    let idx = self.date_window.and_then(|w| DateWindow::ALL.iter().position(|x| *x == w));
    self.date_window = cycle_option(idx, DateWindow::ALL.len(), forward).map(|i| DateWindow::ALL[i]);
    self.apply_filters();
  }

  pub fn cycle_sort(&mut self, forward: bool) {
    let len = SortKey::ALL.len();
    let idx = SortKey::ALL.iter().position(|k| *k == self.sort_key).unwrap_or(0);
    let idx = if forward { (idx + 1) % len } else { (idx + len - 1) % len };
    self.sort_key = SortKey::ALL[idx];
    self.apply_filters();
  }

  /// Clear every constraint: search, category, presenter, date window,
  /// active tags; restore the default sort.
  pub fn reset_filters(&mut self) {
    self.search_input.clear();
    self.cursor_position = 0;
    self.input_scroll = 0;
    self.category_idx = None;
    self.presenter_idx = None;
    self.date_window = None;
    self.sort_key = SortKey::default();
    self.active_tags.clear();
    self.refresh_cloud();
    self.apply_filters();
  }

  // --- Tag cloud ---

  /// Rebuild the cloud for the current category and active set. An empty
  /// cloud means the section is hidden.
  pub fn refresh_cloud(&mut self) {
    self.cloud = tags::derive_tag_cloud(&self.taxonomy, self.selected_category(), &self.active_tags);
    if self.cloud_cursor >= self.cloud.len() {
      self.cloud_cursor = self.cloud.len().saturating_sub(1);
    }
  }

  pub fn cloud_next(&mut self) {
    if !self.cloud.is_empty() {
      self.cloud_cursor = (self.cloud_cursor + 1) % self.cloud.len();
    }
  }

  pub fn cloud_prev(&mut self) {
    if !self.cloud.is_empty() {
      self.cloud_cursor = if self.cloud_cursor == 0 { self.cloud.len() - 1 } else { self.cloud_cursor - 1 };
    }
  }

  /// Toggle the tag under the cloud cursor and recompute both the cloud
  /// (active flags) and the result set.
  pub fn toggle_tag_under_cursor(&mut self) {
    let Some(tag) = self.cloud.get(self.cloud_cursor).map(|t| t.tag.clone()) else { return };
    tags::toggle_tag(&mut self.active_tags, &tag);
    self.refresh_cloud();
    self.apply_filters();
  }

  // --- Result navigation ---

  pub fn select_next(&mut self) {
    let count = self.result_count();
    if count > 0 {
      let i = self.list_state.selected().map_or(0, |i| (i + 1) % count);
      self.list_state.select(Some(i));
    }
  }

  pub fn select_prev(&mut self) {
    let count = self.result_count();
    if count > 0 {
      let i = self.list_state.selected().map_or(0, |i| if i == 0 { count - 1 } else { i - 1 });
      self.list_state.select(Some(i));
    }
  }
}

/// Cycle an optional index through None → 0 → … → len-1 → None.
fn cycle_option(current: Option<usize>, len: usize, forward: bool) -> Option<usize> {
  if forward {
    match current {
      None => Some(0),
      Some(i) if i + 1 < len => Some(i + 1),
      Some(_) => None,
    }
  } else {
    match current {
      None => Some(len - 1),
      Some(0) => None,
      Some(i) => Some(i - 1),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::tags::TagEntry;
  use chrono::NaiveDate;
  use std::collections::HashMap;

  fn record(id: &str, title: &str, categories: &str, views: u64, published: &str) -> Record {
    Record {
      id: id.to_string(),
      title: title.to_string(),
      categories: categories.to_string(),
      views,
      published: crate::catalog::parse_publish_date(published),
      published_raw: published.to_string(),
      ..Record::default()
    }
  }

  fn ready_app() -> App {
    let mut app = App::new();
    app.catalog = vec![
      Record { tags: "rust, systems".to_string(), ..record("a", "Intro to X", "Tech", 100, "01/01/2024") },
      Record { tags: "sleep".to_string(), ..record("b", "Intro to Y", "General", 500, "01/06/2024") },
    ];
    app.categories = catalog::unique_categories(&app.catalog);
    app.presenters = catalog::unique_presenters(&app.catalog);
    app.taxonomy = Taxonomy::from_map(HashMap::from([(
      "Tech".to_string(),
      vec![TagEntry { tag: "rust".to_string(), count: 5 }, TagEntry { tag: "go".to_string(), count: 1 }],
    )]));
    app.load_state = LoadState::Ready;
    app
  }

  // --- cycle_option ---

  #[test]
  fn cycle_option_wraps_through_none() {
    assert_eq!(cycle_option(None, 2, true), Some(0));
    assert_eq!(cycle_option(Some(0), 2, true), Some(1));
    assert_eq!(cycle_option(Some(1), 2, true), None);
    assert_eq!(cycle_option(None, 2, false), Some(1));
    assert_eq!(cycle_option(Some(0), 2, false), None);
  }

  // --- filtering lifecycle ---

  #[test]
  fn category_plus_sort_end_to_end() {
    let mut app = ready_app();
    // categories exclude the sentinel, so "Tech" is the only entry
    assert_eq!(app.categories, vec!["Tech"]);
    app.category_idx = Some(0);
    app.sort_key = SortKey::ViewsDesc;
    app.apply_filters();
    assert_eq!(app.filtered, Some(vec![0]));
    assert_eq!(app.selected_record().unwrap().id, "a");
  }

  #[test]
  fn no_filter_yet_is_distinct_from_empty_result() {
    let mut app = ready_app();
    assert_eq!(app.filtered, None);
    app.search_input = "no such thing".to_string();
    app.apply_filters();
    assert_eq!(app.filtered, Some(vec![]));
    assert_eq!(app.list_state.selected(), None);
  }

  #[test]
  fn tag_toggle_round_trips_results_and_active_set() {
    let mut app = ready_app();
    app.category_idx = Some(0);
    app.refresh_cloud();
    app.apply_filters();
    let before_filtered = app.filtered.clone();
    assert!(!app.cloud.is_empty());

    app.toggle_tag_under_cursor(); // "rust" on
    assert!(app.active_tags.contains("rust"));
    assert!(app.cloud[0].active);
    assert_eq!(app.filtered, Some(vec![0]));

    app.toggle_tag_under_cursor(); // "rust" off
    assert!(app.active_tags.is_empty());
    assert!(!app.cloud[0].active);
    assert_eq!(app.filtered, before_filtered);
  }

  #[test]
  fn category_change_resets_active_tags() {
    let mut app = ready_app();
    app.category_idx = Some(0);
    app.refresh_cloud();
    app.toggle_tag_under_cursor();
    assert!(!app.active_tags.is_empty());

    app.cycle_category(true); // Tech -> None
    assert!(app.active_tags.is_empty());
    assert!(app.cloud.is_empty()); // no category selected: cloud hidden
  }

  #[test]
  fn reset_filters_clears_everything() {
    let mut app = ready_app();
    app.search_input = "intro".to_string();
    app.category_idx = Some(0);
    app.date_window = Some(DateWindow::Year);
    app.sort_key = SortKey::TitleAsc;
    app.refresh_cloud();
    app.toggle_tag_under_cursor();

    app.reset_filters();
    assert!(app.search_input.is_empty());
    assert_eq!(app.category_idx, None);
    assert_eq!(app.date_window, None);
    assert_eq!(app.sort_key, SortKey::DateDesc);
    assert!(app.active_tags.is_empty());
    // empty criteria: every record, newest first
    assert_eq!(app.filtered, Some(vec![1, 0]));
  }

  #[test]
  fn apply_filters_is_a_noop_before_load() {
    let mut app = App::new();
    app.apply_filters();
    assert_eq!(app.filtered, None);
  }

  #[test]
  fn date_parse_helper_sanity() {
    // the fixture dates must actually parse, or the reset test above
    // would pass vacuously
    assert_eq!(crate::catalog::parse_publish_date("01/06/2024"), NaiveDate::from_ymd_opt(2024, 6, 1));
  }
}
