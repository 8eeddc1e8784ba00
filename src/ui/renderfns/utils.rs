use ratatui::prelude::Color;

use crate::readflow::types::ArticleStatus;

/// Rule priorities, lowest first
pub const PRIORITIES: &[(i32, &str)] = &[(-1, "Low"), (0, "Normal"), (1, "High")];

/// Truncate a string to a maximum number of characters, adding "..." if truncated
pub fn truncate(s: &str, max_len: usize) -> String {
  if s.chars().count() <= max_len {
    s.to_string()
  } else {
    let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
    format!("{}...", kept)
  }
}

/// Get the display color for an article status
pub fn status_color(status: ArticleStatus) -> Color {
  match status {
    ArticleStatus::Unread => Color::Yellow,
    ArticleStatus::Read => Color::DarkGray,
  }
}

/// Label of a rule priority, values outside the known set are shown as numbers
pub fn priority_label(priority: i32) -> String {
  PRIORITIES
    .iter()
    .find(|(value, _)| *value == priority)
    .map(|(_, label)| label.to_string())
    .unwrap_or_else(|| priority.to_string())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_truncate_short_string() {
    assert_eq!(truncate("hello", 10), "hello");
  }

  #[test]
  fn test_truncate_exact_length() {
    assert_eq!(truncate("hello", 5), "hello");
  }

  #[test]
  fn test_truncate_long_string() {
    assert_eq!(truncate("hello world", 8), "hello...");
  }

  #[test]
  fn test_truncate_multibyte() {
    assert_eq!(truncate("éééééé", 5), "éé...");
  }

  #[test]
  fn test_status_color() {
    assert_eq!(status_color(ArticleStatus::Unread), Color::Yellow);
    assert_eq!(status_color(ArticleStatus::Read), Color::DarkGray);
  }

  #[test]
  fn test_priority_label() {
    assert_eq!(priority_label(-1), "Low");
    assert_eq!(priority_label(0), "Normal");
    assert_eq!(priority_label(1), "High");
    assert_eq!(priority_label(7), "7");
  }
}
