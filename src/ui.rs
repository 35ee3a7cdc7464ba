use ratatui::{
  Frame,
  layout::{Alignment, Constraint, Layout, Rect},
  style::{Modifier, Style, Stylize},
  text::{Line, Span},
  widgets::{Block, List, ListItem, Padding, Paragraph, Wrap},
};

use crate::app::{App, AppMode, LoadState};
use crate::catalog::Record;
use crate::constants::constants;
use crate::tags::TagSize;
use crate::theme::Theme;

// --- Helpers ---

/// Compute the display width of the first `n` chars (accounting for double-width CJK).
pub fn display_width(s: &str, n: usize) -> usize {
  use unicode_width::UnicodeWidthChar;
  s.chars().take(n).map(|c| c.width().unwrap_or(0)).sum()
}

/// Truncate a string to `max_width` characters, appending "…" if truncated.
fn truncate_str(s: &str, max_width: usize) -> String {
  if s.chars().count() <= max_width {
    s.to_string()
  } else {
    let truncated: String = s.chars().take(max_width.saturating_sub(1)).collect();
    format!("{}…", truncated)
  }
}

/// Unescape the HTML entities the dataset carries in descriptions.
fn unescape_entities(s: &str) -> String {
  s.replace("&quot;", "\"").replace("&#39;", "'").replace("&lt;", "<").replace("&gt;", ">").replace("&amp;", "&")
}

/// Drop `<...>` markup spans. Runs after entity unescaping, so escaped
/// markup is stripped too.
fn strip_markup(s: &str) -> String {
  let mut out = String::with_capacity(s.len());
  let mut in_tag = false;
  for c in s.chars() {
    match c {
      '<' => in_tag = true,
      '>' if in_tag => in_tag = false,
      _ if !in_tag => out.push(c),
      _ => {}
    }
  }
  out
}

/// Clean a raw description for card display: unescape entities, strip
/// markup, trim, and cut to the preview length at a word boundary.
pub fn clean_description(raw: &str) -> String {
  let cleaned = strip_markup(&unescape_entities(raw));
  let cleaned = cleaned.trim();
  let max = constants().description_preview_len;
  if cleaned.chars().count() <= max {
    return cleaned.to_string();
  }
  let mut cut: String = cleaned.chars().take(max).collect();
  if let Some(last_space) = cut.rfind(' ') {
    cut.truncate(last_space);
  }
  format!("{}…", cut)
}

/// Group digits with thin spaces: 1234567 → "1 234 567".
pub fn format_count(n: u64) -> String {
  let digits = n.to_string();
  let mut out = String::with_capacity(digits.len() + digits.len() / 3);
  for (i, c) in digits.chars().enumerate() {
    if i > 0 && (digits.len() - i) % 3 == 0 {
      out.push(' ');
    }
    out.push(c);
  }
  out
}

/// Human duration label: "1:02:03" → "1h2min", "5:30" → "5min".
/// Input that isn't `H:MM:SS` or `M:SS` is shown as-is.
pub fn format_duration_label(raw: &str) -> String {
  let parts: Vec<&str> = raw.split(':').collect();
  let num = |s: &str| s.trim().parse::<u64>().unwrap_or(0);
  match parts.as_slice() {
    [h, m, _] => {
      let (h, m) = (num(h), num(m));
      if h > 0 { format!("{}h{}min", h, m) } else { format!("{}min", m) }
    }
    [m, _] => format!("{}min", num(m)),
    _ => raw.to_string(),
  }
}

// --- UI Rendering ---

pub fn ui(frame: &mut Frame, app: &mut App) {
  let theme = app.theme();

  frame.render_widget(Block::default().style(Style::default().bg(theme.bg)), frame.area());

  let [header_area, main_area, status_area, input_area, footer_area] = Layout::vertical([
    Constraint::Length(1),
    Constraint::Min(3),
    Constraint::Length(1),
    Constraint::Length(3),
    Constraint::Length(1),
  ])
  .areas(frame.area());

  render_header(frame, theme, header_area);
  render_main(frame, app, main_area);
  render_status(frame, app, status_area);
  render_input(frame, app, input_area);
  render_footer(frame, app, footer_area);
}

fn render_header(frame: &mut Frame, theme: &Theme, area: Rect) {
  let left = Line::from(Span::styled(" ▤ vcat ", Style::default().fg(theme.accent).add_modifier(Modifier::BOLD)));
  frame.render_widget(left, area);

  let version = format!("v{} ", env!("CARGO_PKG_VERSION"));
  let right = Line::from(Span::styled(&version, Style::default().fg(theme.muted)));
  let right_area =
    Rect { x: area.x + area.width.saturating_sub(version.len() as u16), width: version.len() as u16, ..area };
  frame.render_widget(right, right_area);
}

fn render_main(frame: &mut Frame, app: &mut App, area: Rect) {
  match app.load_state.clone() {
    LoadState::Loading => render_notice(frame, app.theme(), area, "Loading catalog…", false),
    LoadState::Failed(msg) => {
      render_notice(frame, app.theme(), area, &format!("Could not load the catalog.\n\n{}", msg), true)
    }
    LoadState::Ready => {
      if app.filtered.is_none() {
        render_welcome(frame, app, area);
      } else {
        render_browser(frame, app, area);
      }
    }
  }
}

fn render_notice(frame: &mut Frame, theme: &Theme, area: Rect, text: &str, is_error: bool) {
  let fg = if is_error { theme.error } else { theme.muted };
  let paragraph = Paragraph::new(text)
    .style(Style::default().fg(fg))
    .alignment(Alignment::Center)
    .wrap(Wrap { trim: true })
    .block(
      Block::bordered()
        .border_type(ratatui::widgets::BorderType::Rounded)
        .border_style(Style::default().fg(theme.border))
        .padding(Padding::vertical(1)),
    );
  frame.render_widget(paragraph, area);
}

fn render_welcome(frame: &mut Frame, app: &App, area: Rect) {
  let theme = app.theme();
  let text = vec![
    Line::from(""),
    Line::from(Span::styled("▤  Welcome to vcat", Style::default().fg(theme.accent).add_modifier(Modifier::BOLD))),
    Line::from(""),
    Line::from(Span::styled(
      format!("{} videos in the catalog.", app.catalog.len()),
      Style::default().fg(theme.fg),
    )),
    Line::from(""),
    Line::from(Span::styled("Type a search below and press Enter to browse.", Style::default().fg(theme.muted))),
    Line::from(Span::styled("c/p/d/s cycle category, presenter, date and sort.", Style::default().fg(theme.muted))),
  ];
  let paragraph = Paragraph::new(text).alignment(Alignment::Center).block(
    Block::bordered()
      .border_type(ratatui::widgets::BorderType::Rounded)
      .border_style(Style::default().fg(theme.border)),
  );
  frame.render_widget(paragraph, area);
}

fn render_browser(frame: &mut Frame, app: &mut App, area: Rect) {
  let cloud_height = if app.cloud.is_empty() { 0 } else { 3 };
  let [cloud_area, results_area] =
    Layout::vertical([Constraint::Length(cloud_height), Constraint::Min(3)]).areas(area);

  if cloud_height > 0 {
    render_cloud(frame, app, cloud_area);
  }

  if app.result_count() == 0 {
    render_notice(frame, app.theme(), results_area, "No results match the current filters.", false);
    return;
  }

  let [list_area, card_area] =
    Layout::horizontal([Constraint::Percentage(55), Constraint::Percentage(45)]).areas(results_area);
  render_results(frame, app, list_area);
  render_card(frame, app, card_area);
}

/// The tag cloud: one span per tag, weighted by bucket, highlighted when
/// active, with a cursor in Tags mode.
fn render_cloud(frame: &mut Frame, app: &App, area: Rect) {
  let theme = app.theme();
  let in_tags_mode = app.mode == AppMode::Tags;

  let mut spans: Vec<Span> = Vec::with_capacity(app.cloud.len() * 2);
  for (i, tag) in app.cloud.iter().enumerate() {
    let mut style = match tag.size {
      TagSize::Xs => Style::default().fg(theme.muted),
      TagSize::Sm => Style::default().fg(theme.fg),
      TagSize::Md => Style::default().fg(theme.fg).add_modifier(Modifier::BOLD),
      TagSize::Lg => Style::default().fg(theme.accent),
      TagSize::Xl => Style::default().fg(theme.accent).add_modifier(Modifier::BOLD),
    };
    if tag.active {
      style = style.fg(theme.chip_fg).bg(theme.chip_bg);
    }
    if in_tags_mode && i == app.cloud_cursor {
      style = style.add_modifier(Modifier::UNDERLINED | Modifier::BOLD);
    }
    spans.push(Span::styled(format!(" {} ", tag.tag), style));
    spans.push(Span::raw(" "));
  }

  let title = format!(" Tags — {} ", app.selected_category());
  let border_color = if in_tags_mode { theme.accent } else { theme.border };
  let paragraph = Paragraph::new(Line::from(spans)).wrap(Wrap { trim: false }).block(
    Block::bordered()
      .title(title)
      .title_style(Style::default().fg(border_color))
      .border_type(ratatui::widgets::BorderType::Rounded)
      .border_style(Style::default().fg(border_color)),
  );
  frame.render_widget(paragraph, area);
}

fn render_results(frame: &mut Frame, app: &mut App, area: Rect) {
  let theme = app.theme();
  // Inner width: area minus 2 borders minus 2 chars for highlight symbol ("▶ ")
  let inner_w = area.width.saturating_sub(4) as usize;

  let indices = app.filtered.clone().unwrap_or_default();
  let items: Vec<ListItem> = indices
    .iter()
    .enumerate()
    .filter_map(|(row, &idx)| app.catalog.get(idx).map(|r| (row, r)))
    .map(|(row, record)| {
      let is_selected = Some(row) == app.list_state.selected();
      let fg = if is_selected { theme.highlight_fg } else { theme.fg };
      let bg = if is_selected {
        theme.highlight_bg
      } else if row % 2 == 1 {
        theme.stripe_bg
      } else {
        theme.bg
      };

      // Right side: "views · date" with whichever parts exist
      let views = if record.views > 0 { format!("{} views", format_count(record.views)) } else { String::new() };
      let date = record.published_raw.clone();
      let right = match (!views.is_empty(), !date.is_empty()) {
        (true, true) => format!("{} · {}", views, date),
        (true, false) => views,
        (false, true) => date,
        (false, false) => String::new(),
      };

      let line = if right.is_empty() {
        Line::from(Span::styled(truncate_str(&record.title, inner_w), Style::default().fg(fg)))
      } else {
        let right_w = right.chars().count();
        let title_max = inner_w.saturating_sub(right_w + 2);
        let title = truncate_str(&record.title, title_max);
        let gap = inner_w.saturating_sub(title.chars().count() + right_w);
        Line::from(vec![
          Span::styled(title, Style::default().fg(fg)),
          Span::raw(" ".repeat(gap)),
          Span::styled(right, Style::default().fg(theme.muted)),
        ])
      };

      ListItem::new(line).bg(bg)
    })
    .collect();

  let title = format!(" Results — {} ", app.result_count());
  let list = List::new(items)
    .block(
      Block::bordered()
        .title(title)
        .title_style(Style::default().fg(theme.accent).add_modifier(Modifier::BOLD))
        .border_type(ratatui::widgets::BorderType::Rounded)
        .border_style(Style::default().fg(theme.border)),
    )
    .highlight_symbol("▶ ")
    .highlight_style(Style::default().fg(theme.highlight_fg).bg(theme.highlight_bg).add_modifier(Modifier::BOLD));

  frame.render_stateful_widget(list, area, &mut app.list_state);
}

/// The detail card for the selected record.
fn render_card(frame: &mut Frame, app: &App, area: Rect) {
  let theme = app.theme();
  let block = Block::bordered()
    .title(" Details ")
    .title_style(Style::default().fg(theme.accent).add_modifier(Modifier::BOLD))
    .border_type(ratatui::widgets::BorderType::Rounded)
    .border_style(Style::default().fg(theme.border))
    .padding(Padding::horizontal(1));

  let Some(record) = app.selected_record() else {
    frame.render_widget(block, area);
    return;
  };

  let inner_w = area.width.saturating_sub(4) as usize;
  let mut lines = vec![
    Line::from(""),
    Line::from(Span::styled(
      truncate_str(&record.title, inner_w),
      Style::default().fg(theme.fg).add_modifier(Modifier::BOLD),
    )),
    Line::from(""),
  ];

  lines.push(meta_line(theme, "Id        ", &record.id, inner_w));
  // Primary presenter only, as on the cards
  if let Some(presenter) = Record::split_list(&record.presenters).next() {
    lines.push(meta_line(theme, "Presenter ", presenter, inner_w));
  }
  if !record.published_raw.is_empty() {
    lines.push(meta_line(theme, "Published ", &record.published_raw, inner_w));
  }
  if !record.duration.is_empty() {
    lines.push(meta_line(theme, "Duration  ", &format_duration_label(&record.duration), inner_w));
  }
  if record.views > 0 {
    lines.push(meta_line(theme, "Views     ", &format_count(record.views), inner_w));
  }
  if record.likes > 0 {
    lines.push(meta_line(theme, "Likes     ", &format_count(record.likes), inner_w));
  }
  if record.comments > 0 {
    lines.push(meta_line(theme, "Comments  ", &format_count(record.comments), inner_w));
  }

  // Category chips, capped, sentinel excluded
  let sentinel = constants().sentinel_category.as_str();
  let chips: Vec<&str> =
    Record::split_list(&record.categories).filter(|c| *c != sentinel).take(constants().card_category_chips).collect();
  if !chips.is_empty() {
    lines.push(Line::from(""));
    let mut spans = Vec::with_capacity(chips.len() * 2);
    for chip in chips {
      spans.push(Span::styled(format!(" {} ", chip), Style::default().fg(theme.chip_fg).bg(theme.chip_bg)));
      spans.push(Span::raw(" "));
    }
    lines.push(Line::from(spans));
  }

  let description = clean_description(&record.description);
  if !description.is_empty() {
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(description, Style::default().fg(theme.fg))));
  }

  if !record.url.is_empty() {
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
      truncate_str(&record.url, inner_w),
      Style::default().fg(theme.accent).add_modifier(Modifier::UNDERLINED),
    )));
  }
  // No image support in the terminal; the thumbnail location is still useful
  if !record.thumbnail.is_empty() {
    lines.push(Line::from(Span::styled(truncate_str(&record.thumbnail, inner_w), Style::default().fg(theme.muted))));
  }

  let paragraph = Paragraph::new(lines).wrap(Wrap { trim: false }).block(block);
  frame.render_widget(paragraph, area);
}

fn meta_line<'a>(theme: &Theme, label: &'a str, value: &str, inner_w: usize) -> Line<'a> {
  let value_w = inner_w.saturating_sub(label.len());
  Line::from(vec![
    Span::styled(label, Style::default().fg(theme.muted)),
    Span::styled(truncate_str(value, value_w), Style::default().fg(theme.fg)),
  ])
}

/// Status line: transient status/error first, otherwise the active-filter
/// summary for the current result set.
fn render_status(frame: &mut Frame, app: &App, area: Rect) {
  let theme = app.theme();
  let (text, style) = if let Some(msg) = &app.status_message {
    (format!(" ⏳ {}", msg), Style::default().fg(theme.status))
  } else if let Some(err) = &app.last_error {
    (format!(" ⚠  {}", err), Style::default().fg(theme.error))
  } else if app.filtered.is_some() {
    (format!(" {}", active_filter_summary(app)), Style::default().fg(theme.muted))
  } else if app.load_state == LoadState::Ready {
    (format!(" {} videos loaded", app.catalog.len()), Style::default().fg(theme.status))
  } else {
    (" Ready".to_string(), Style::default().fg(theme.muted))
  };
  frame.render_widget(Paragraph::new(text).style(style), area);
}

/// One-line summary of every active constraint plus the result count.
pub fn active_filter_summary(app: &App) -> String {
  let mut parts: Vec<String> = Vec::new();
  let query = app.search_input.trim();
  if !query.is_empty() {
    parts.push(format!("search \"{}\"", query));
  }
  if !app.selected_category().is_empty() {
    parts.push(format!("category {}", app.selected_category()));
  }
  if !app.selected_presenter().is_empty() {
    parts.push(format!("presenter {}", app.selected_presenter()));
  }
  if let Some(window) = app.date_window {
    parts.push(window.label().to_string());
  }
  if !app.active_tags.is_empty() {
    let mut tags: Vec<&str> = app.active_tags.iter().map(String::as_str).collect();
    tags.sort();
    parts.push(format!("tags {}", tags.join("+")));
  }

  let count = app.result_count();
  let noun = if count == 1 { "result" } else { "results" };
  if parts.is_empty() {
    format!("{} {} · sort: {}", count, noun, app.sort_key.label())
  } else {
    format!("{} {} · {} · sort: {}", count, noun, parts.join(" · "), app.sort_key.label())
  }
}

fn render_input(frame: &mut Frame, app: &mut App, area: Rect) {
  let theme = app.theme();
  let border_color = if app.mode == AppMode::Search { theme.accent } else { theme.border };
  let input_block = Block::bordered()
    .title(" Search the catalog ")
    .title_style(Style::default().fg(border_color))
    .border_type(ratatui::widgets::BorderType::Rounded)
    .border_style(Style::default().fg(border_color))
    .padding(Padding::horizontal(1));

  let inner_w = area.width.saturating_sub(4) as usize;
  let cursor_col = display_width(&app.search_input, app.cursor_position);

  if cursor_col < app.input_scroll {
    app.input_scroll = cursor_col;
  } else if cursor_col >= app.input_scroll + inner_w {
    app.input_scroll = cursor_col.saturating_sub(inner_w) + 1;
  }

  let visible: String = app
    .search_input
    .chars()
    .scan(0usize, |col, c| {
      let w = unicode_width::UnicodeWidthChar::width(c).unwrap_or(0);
      let start = *col;
      *col += w;
      Some((start, *col, c))
    })
    .skip_while(|(_, end, _)| *end <= app.input_scroll)
    .take_while(|(start, _, _)| *start < app.input_scroll + inner_w)
    .map(|(_, _, c)| c)
    .collect();

  let paragraph = Paragraph::new(visible).style(Style::default().fg(theme.fg)).block(input_block);
  frame.render_widget(paragraph, area);

  if app.mode == AppMode::Search {
    let cursor_x = area.x + 2 + (cursor_col - app.input_scroll) as u16;
    frame.set_cursor_position((cursor_x, area.y + 1));
  }
}

fn render_footer(frame: &mut Frame, app: &App, area: Rect) {
  let theme = app.theme();
  let keys: Vec<(&str, &str)> = match app.mode {
    AppMode::Search => {
      let mut k = vec![("Enter", "Filter"), ("^t", "Theme")];
      if app.filtered.is_some() {
        k.push(("↓", "Results"));
        k.push(("Esc", "Results"));
      } else {
        k.push(("Esc", "Quit"));
      }
      k
    }
    AppMode::Results => {
      let mut k = vec![
        ("j/k", "Navigate"),
        ("Enter", "Open"),
        ("c", "Category"),
        ("p", "Presenter"),
        ("d", "Date"),
        ("s", "Sort"),
        ("r", "Reset"),
      ];
      if !app.cloud.is_empty() {
        k.push(("t", "Tags"));
      }
      k.push(("/", "Search"));
      k
    }
    AppMode::Tags => vec![("h/l", "Move"), ("Enter", "Toggle"), ("Esc", "Back")],
  };

  let spans: Vec<Span> = keys
    .iter()
    .enumerate()
    .flat_map(|(i, (key, action))| {
      let mut s = vec![
        Span::styled(format!(" {} ", key), Style::default().fg(theme.key_fg).bg(theme.key_bg)),
        Span::styled(format!(" {} ", action), Style::default().fg(theme.muted)),
      ];
      if i < keys.len() - 1 {
        s.push(Span::raw(" "));
      }
      s
    })
    .collect();

  frame.render_widget(Line::from(spans), area);

  let theme_label = format!("{} ", theme.name);
  let right = Line::from(Span::styled(&theme_label, Style::default().fg(theme.muted)));
  let right_area =
    Rect { x: area.x + area.width.saturating_sub(theme_label.len() as u16), width: theme_label.len() as u16, ..area };
  frame.render_widget(right, right_area);
}
