use ratatui::crossterm::event::{self, KeyCode, KeyModifiers};

use crate::app::{App, AppMode};

// --- Helpers ---

/// Convert a char index to a byte offset within the string.
pub fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
  s.char_indices().nth(char_idx).map_or(s.len(), |(i, _)| i)
}

/// Open the selected record's URL in the default browser.
fn open_selected_url(app: &mut App) {
  let Some(url) = app.selected_record().map(|r| r.url.clone()) else { return };
  if url.is_empty() {
    app.set_error("No URL for this entry.".to_string());
    return;
  }
  #[cfg(target_os = "macos")]
  let cmd = "open";
  #[cfg(not(target_os = "macos"))]
  let cmd = "xdg-open";
  match std::process::Command::new(cmd)
    .arg(&url)
    .stdin(std::process::Stdio::null())
    .stdout(std::process::Stdio::null())
    .stderr(std::process::Stdio::null())
    .spawn()
  {
    Ok(mut child) => {
      // Reap the child in a background thread to avoid zombie processes.
      std::thread::spawn(move || {
        let _ = child.wait();
      });
    }
    Err(e) => {
      app.set_error(format!("Failed to open browser: {}", e));
    }
  }
}

// --- Event Handling ---

pub fn handle_key_event(app: &mut App, key: event::KeyEvent) {
  if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
    app.should_quit = true;
    return;
  }

  if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('t') {
    app.next_theme();
    return;
  }

  if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('r') {
    app.reset_filters();
    return;
  }

  match app.mode {
    AppMode::Search => handle_search_key(app, key),
    AppMode::Results => handle_results_key(app, key),
    AppMode::Tags => handle_tags_key(app, key),
  }
}

fn handle_search_key(app: &mut App, key: event::KeyEvent) {
  app.clear_error();
  match key.code {
    KeyCode::Enter => {
      app.apply_filters();
      if app.filtered.is_some() {
        app.mode = AppMode::Results;
      }
    }
    KeyCode::Char(c) => {
      let byte_idx = char_to_byte_index(&app.search_input, app.cursor_position);
      app.search_input.insert(byte_idx, c);
      app.cursor_position += 1;
    }
    KeyCode::Backspace => {
      if app.cursor_position > 0 {
        app.cursor_position -= 1;
        let byte_idx = char_to_byte_index(&app.search_input, app.cursor_position);
        app.search_input.remove(byte_idx);
      }
    }
    KeyCode::Delete => {
      if app.cursor_position < app.search_input.chars().count() {
        let byte_idx = char_to_byte_index(&app.search_input, app.cursor_position);
        app.search_input.remove(byte_idx);
      }
    }
    KeyCode::Left => {
      app.cursor_position = app.cursor_position.saturating_sub(1);
    }
    KeyCode::Right => {
      if app.cursor_position < app.search_input.chars().count() {
        app.cursor_position += 1;
      }
    }
    KeyCode::Home => {
      app.cursor_position = 0;
    }
    KeyCode::End => {
      app.cursor_position = app.search_input.chars().count();
    }
    KeyCode::Esc => {
      if !app.search_input.is_empty() {
        app.search_input.clear();
        app.cursor_position = 0;
        app.input_scroll = 0;
      } else if app.filtered.is_some() {
        app.mode = AppMode::Results;
      } else {
        app.should_quit = true;
      }
    }
    KeyCode::Down => {
      if app.filtered.is_some() {
        app.mode = AppMode::Results;
      }
    }
    _ => {}
  }
}

fn handle_results_key(app: &mut App, key: event::KeyEvent) {
  match key.code {
    KeyCode::Enter => {
      open_selected_url(app);
    }
    KeyCode::Char('/') => {
      app.mode = AppMode::Search;
    }
    KeyCode::Down | KeyCode::Char('j') => app.select_next(),
    KeyCode::Up | KeyCode::Char('k') => app.select_prev(),
    // Filter controls: lowercase cycles forward, uppercase backward
    KeyCode::Char('c') => app.cycle_category(true),
    KeyCode::Char('C') => app.cycle_category(false),
    KeyCode::Char('p') => app.cycle_presenter(true),
    KeyCode::Char('P') => app.cycle_presenter(false),
    KeyCode::Char('d') => app.cycle_date_window(true),
    KeyCode::Char('D') => app.cycle_date_window(false),
    KeyCode::Char('s') => app.cycle_sort(true),
    KeyCode::Char('S') => app.cycle_sort(false),
    KeyCode::Char('r') => app.reset_filters(),
    KeyCode::Char('t') => {
      if !app.cloud.is_empty() {
        app.mode = AppMode::Tags;
      }
    }
    KeyCode::Esc => {
      app.mode = AppMode::Search;
    }
    _ => {}
  }
}

fn handle_tags_key(app: &mut App, key: event::KeyEvent) {
  match key.code {
    KeyCode::Right | KeyCode::Char('l') => app.cloud_next(),
    KeyCode::Left | KeyCode::Char('h') => app.cloud_prev(),
    KeyCode::Enter | KeyCode::Char(' ') => app.toggle_tag_under_cursor(),
    KeyCode::Esc | KeyCode::Char('t') => {
      app.mode = AppMode::Results;
    }
    _ => {}
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  // --- char_to_byte_index ---

  #[test]
  fn char_to_byte_ascii() {
    assert_eq!(char_to_byte_index("hello", 0), 0);
    assert_eq!(char_to_byte_index("hello", 3), 3);
    assert_eq!(char_to_byte_index("hello", 5), 5); // past end
  }

  #[test]
  fn char_to_byte_multibyte() {
    let s = "aé日"; // a=1 byte, é=2 bytes, 日=3 bytes
    assert_eq!(char_to_byte_index(s, 0), 0);
    assert_eq!(char_to_byte_index(s, 1), 1);
    assert_eq!(char_to_byte_index(s, 2), 3);
    assert_eq!(char_to_byte_index(s, 3), 6); // past end
  }

  #[test]
  fn char_to_byte_empty() {
    assert_eq!(char_to_byte_index("", 0), 0);
    assert_eq!(char_to_byte_index("", 5), 0);
  }
}
