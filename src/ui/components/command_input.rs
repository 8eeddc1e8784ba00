use super::input::{InputResult, TextInput};
use super::KeyResult;
use crate::commands::{self, Command};
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph};

/// Events emitted by command input that parent needs to handle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandEvent {
  /// Command submitted, as `name` or `name argument`
  Submitted(String),
  /// Command cancelled
  Cancelled,
}

/// Command input component with autocomplete
#[derive(Debug, Clone, Default)]
pub struct CommandInput {
  input: TextInput,
  active: bool,
  selected_suggestion: usize,
}

impl CommandInput {
  pub fn new() -> Self {
    Self::default()
  }

  /// Check if command mode is currently active
  pub fn is_active(&self) -> bool {
    self.active
  }

  /// Activate command mode
  pub fn activate(&mut self) {
    self.active = true;
    self.input.clear();
    self.selected_suggestion = 0;
  }

  fn deactivate(&mut self) {
    self.active = false;
    self.input.clear();
    self.selected_suggestion = 0;
  }

  /// Get autocomplete suggestions for current input
  pub fn suggestions(&self) -> Vec<&'static Command> {
    commands::get_suggestions(self.input.value())
  }

  /// Handle a key event.
  ///
  /// Call this regardless of active state, it handles activation too.
  /// `allow_activation` is false while the current view captures text.
  pub fn handle_key(&mut self, key: KeyEvent, allow_activation: bool) -> KeyResult<CommandEvent> {
    if !self.active {
      if allow_activation && key.code == KeyCode::Char(':') {
        self.activate();
        return KeyResult::Handled;
      }
      return KeyResult::NotHandled;
    }

    match key.code {
      KeyCode::Esc => {
        self.deactivate();
        return KeyResult::Event(CommandEvent::Cancelled);
      }
      KeyCode::Enter => {
        let cmd = self.resolve_command();
        self.deactivate();
        return KeyResult::Event(CommandEvent::Submitted(cmd));
      }
      KeyCode::Tab | KeyCode::Down => {
        let suggestions = self.suggestions();
        if !suggestions.is_empty() {
          self.selected_suggestion = (self.selected_suggestion + 1) % suggestions.len();
        }
        return KeyResult::Handled;
      }
      KeyCode::BackTab | KeyCode::Up => {
        let suggestions = self.suggestions();
        if !suggestions.is_empty() {
          self.selected_suggestion = if self.selected_suggestion == 0 {
            suggestions.len() - 1
          } else {
            self.selected_suggestion - 1
          };
        }
        return KeyResult::Handled;
      }
      _ => {}
    }

    // Delegate to TextInput for text editing
    match self.input.handle_key(key) {
      InputResult::Consumed => {
        self.selected_suggestion = 0;
        KeyResult::Handled
      }
      InputResult::Submitted(_) | InputResult::Cancelled => KeyResult::Handled,
      InputResult::NotHandled => KeyResult::Handled,
    }
  }

  /// Resolve the final command (from suggestion or direct input), keeping any argument
  fn resolve_command(&self) -> String {
    let (word, arg) = commands::split_input(self.input.value());
    let name = self
      .suggestions()
      .get(self.selected_suggestion)
      .map(|cmd| cmd.name.to_string())
      .unwrap_or_else(|| word.to_lowercase());
    if arg.is_empty() {
      name
    } else {
      format!("{} {}", name, arg)
    }
  }

  /// Render the command overlay if active
  pub fn render_overlay(&self, frame: &mut Frame, area: Rect) {
    if !self.active {
      return;
    }

    let suggestions = self.suggestions();

    let width = (area.width * 60 / 100).clamp(30, 60).min(area.width);
    let suggestion_count = suggestions.len().min(8);
    let height = (3 + suggestion_count as u16).min(area.height);

    // Top-left of content area with small margin
    let overlay_area = Rect::new(area.x + 1, area.y + 1, width.saturating_sub(1), height.saturating_sub(1));

    frame.render_widget(Clear, overlay_area);

    let block = Block::default()
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Yellow))
      .title(" Command ");

    let inner = block.inner(overlay_area);
    frame.render_widget(block, overlay_area);

    if inner.height == 0 {
      return;
    }

    let chunks = Layout::default()
      .direction(Direction::Vertical)
      .constraints([Constraint::Length(1), Constraint::Min(0)])
      .split(inner);

    let (before, after) = self.input.split_at_cursor();
    let input_line = Line::from(vec![
      Span::styled(":", Style::default().fg(Color::Yellow)),
      Span::raw(before),
      Span::styled("_", Style::default().fg(Color::Yellow)),
      Span::raw(after),
    ]);
    frame.render_widget(Paragraph::new(input_line), chunks[0]);

    if !suggestions.is_empty() && chunks[1].height > 0 {
      let items: Vec<ListItem> = suggestions
        .iter()
        .take(8)
        .map(|cmd| {
          ListItem::new(Line::from(vec![
            Span::styled(format!("{:<12}", cmd.name), Style::default().fg(Color::Cyan)),
            Span::styled(cmd.description, Style::default().fg(Color::DarkGray)),
          ]))
        })
        .collect();

      let list =
        List::new(items).highlight_style(Style::default().bg(Color::DarkGray).fg(Color::White));

      let mut state = ListState::default();
      state.select(Some(self.selected_suggestion));

      frame.render_stateful_widget(list, chunks[1], &mut state);
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crossterm::event::KeyModifiers;

  fn key(code: KeyCode) -> KeyEvent {
    KeyEvent::new(code, KeyModifiers::NONE)
  }

  fn submit(text: &str) -> KeyResult<CommandEvent> {
    let mut cmd = CommandInput::new();
    cmd.handle_key(key(KeyCode::Char(':')), true);
    for c in text.chars() {
      cmd.handle_key(key(KeyCode::Char(c)), true);
    }
    cmd.handle_key(key(KeyCode::Enter), true)
  }

  #[test]
  fn test_activation_respects_capture() {
    let mut cmd = CommandInput::new();
    assert_eq!(
      cmd.handle_key(key(KeyCode::Char(':')), false),
      KeyResult::NotHandled
    );
    assert!(!cmd.is_active());
    assert_eq!(cmd.handle_key(key(KeyCode::Char(':')), true), KeyResult::Handled);
    assert!(cmd.is_active());
  }

  #[test]
  fn test_submit_resolves_alias() {
    assert_eq!(
      submit("settings"),
      KeyResult::Event(CommandEvent::Submitted("rules".into()))
    );
  }

  #[test]
  fn test_submit_keeps_argument() {
    assert_eq!(
      submit("open 42"),
      KeyResult::Event(CommandEvent::Submitted("article 42".into()))
    );
  }

  #[test]
  fn test_unknown_command_is_passed_through() {
    assert_eq!(
      submit("zzz"),
      KeyResult::Event(CommandEvent::Submitted("zzz".into()))
    );
  }

  #[test]
  fn test_escape_cancels() {
    let mut cmd = CommandInput::new();
    cmd.activate();
    assert_eq!(
      cmd.handle_key(key(KeyCode::Esc), true),
      KeyResult::Event(CommandEvent::Cancelled)
    );
    assert!(!cmd.is_active());
  }
}
