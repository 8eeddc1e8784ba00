//! Keyboard-driven editor over a [`FormState`].
//!
//! Each field is described by a [`FieldSpec`] with a getter and a setter on
//! the form record, so the panel edits typed values without knowing them.

use std::collections::BTreeSet;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};

use super::input::{InputResult, TextInput};
use super::KeyResult;
use crate::form::{FormState, INVALID_FORM_MESSAGE};

/// A choice of a select field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectOption {
  pub value: String,
  pub label: String,
}

impl SelectOption {
  pub fn new(value: impl Into<String>, label: impl Into<String>) -> Self {
    Self {
      value: value.into(),
      label: label.into(),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldKind {
  Text,
  /// Multi-line text, Enter inserts a newline
  Textarea,
  Select(Vec<SelectOption>),
}

pub struct FieldSpec<F> {
  pub name: &'static str,
  pub label: &'static str,
  pub kind: FieldKind,
  pub get: fn(&F) -> String,
  pub set: fn(&mut F, &str),
}

/// Events emitted by the form that the owning view handles
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormEvent {
  /// Submit requested and every field validates
  Submit,
  Cancel,
}

pub struct FormPanel<F> {
  title: String,
  state: FormState<F>,
  fields: Vec<FieldSpec<F>>,
  focus: usize,
  editor: TextInput,
  touched: BTreeSet<&'static str>,
  error: Option<String>,
  busy: bool,
}

impl<F> FormPanel<F> {
  pub fn new(title: impl Into<String>, state: FormState<F>, fields: Vec<FieldSpec<F>>) -> Self {
    let mut panel = Self {
      title: title.into(),
      state,
      fields,
      focus: 0,
      editor: TextInput::new(),
      touched: BTreeSet::new(),
      error: None,
      busy: false,
    };
    panel.load_editor();
    panel
  }

  pub fn values(&self) -> &F {
    self.state.values()
  }

  pub fn state(&self) -> &FormState<F> {
    &self.state
  }

  /// Shown above the fields until the next edit
  pub fn set_error(&mut self, error: impl Into<String>) {
    self.error = Some(error.into());
  }

  pub fn error(&self) -> Option<&str> {
    self.error.as_deref()
  }

  /// While busy the form ignores input
  pub fn set_busy(&mut self, busy: bool) {
    self.busy = busy;
  }

  /// Replace the options of a select field
  pub fn set_options(&mut self, name: &str, options: Vec<SelectOption>) {
    if let Some(field) = self.fields.iter_mut().find(|f| f.name == name) {
      field.kind = FieldKind::Select(options);
    }
  }

  fn focused(&self) -> Option<&FieldSpec<F>> {
    self.fields.get(self.focus)
  }

  fn load_editor(&mut self) {
    let value = self.focused().map(|f| (f.get)(self.state.values()));
    self.editor = TextInput::with_value(value.as_deref().unwrap_or(""));
  }

  fn move_focus(&mut self, forward: bool) {
    if self.fields.is_empty() {
      return;
    }
    if let Some(name) = self.focused().map(|f| f.name) {
      self.touched.insert(name);
    }
    let len = self.fields.len();
    self.focus = if forward {
      (self.focus + 1) % len
    } else {
      (self.focus + len - 1) % len
    };
    self.load_editor();
  }

  fn store_editor(&mut self) {
    if let Some(field) = self.fields.get(self.focus) {
      (field.set)(self.state.values_mut(), self.editor.value());
    }
    self.error = None;
  }

  fn cycle_option(&mut self, forward: bool) {
    let Some(field) = self.fields.get(self.focus) else {
      return;
    };
    let FieldKind::Select(options) = &field.kind else {
      return;
    };
    if options.is_empty() {
      return;
    }
    let current = (field.get)(self.state.values());
    let len = options.len();
    let next = match options.iter().position(|o| o.value == current) {
      Some(i) if forward => (i + 1) % len,
      Some(i) => (i + len - 1) % len,
      None => 0,
    };
    (field.set)(self.state.values_mut(), &options[next].value);
    self.touched.insert(field.name);
    self.error = None;
  }

  fn submit(&mut self) -> KeyResult<FormEvent> {
    self.touched.extend(self.fields.iter().map(|f| f.name));
    if self.state.is_valid() {
      self.error = None;
      KeyResult::Event(FormEvent::Submit)
    } else {
      self.error = Some(INVALID_FORM_MESSAGE.to_string());
      KeyResult::Handled
    }
  }

  pub fn handle_key(&mut self, key: KeyEvent) -> KeyResult<FormEvent> {
    if self.busy {
      return KeyResult::Handled;
    }
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    let kind = match self.focused() {
      Some(field) => field.kind.clone(),
      None => return KeyResult::NotHandled,
    };

    match key.code {
      KeyCode::Esc => return KeyResult::Event(FormEvent::Cancel),
      KeyCode::Char('s') if ctrl => return self.submit(),
      KeyCode::Tab | KeyCode::Down => {
        self.move_focus(true);
        return KeyResult::Handled;
      }
      KeyCode::BackTab | KeyCode::Up => {
        self.move_focus(false);
        return KeyResult::Handled;
      }
      _ => {}
    }

    match kind {
      FieldKind::Select(_) => match key.code {
        KeyCode::Left => {
          self.cycle_option(false);
          KeyResult::Handled
        }
        KeyCode::Right | KeyCode::Char(' ') => {
          self.cycle_option(true);
          KeyResult::Handled
        }
        KeyCode::Enter => self.enter_pressed(),
        _ => KeyResult::Handled,
      },
      FieldKind::Textarea if key.code == KeyCode::Enter => {
        self.editor.insert('\n');
        self.store_editor();
        KeyResult::Handled
      }
      FieldKind::Text | FieldKind::Textarea => match self.editor.handle_key(key) {
        InputResult::Consumed => {
          self.store_editor();
          KeyResult::Handled
        }
        InputResult::Submitted(_) => self.enter_pressed(),
        InputResult::Cancelled => KeyResult::Event(FormEvent::Cancel),
        InputResult::NotHandled => KeyResult::Handled,
      },
    }
  }

  /// Enter moves to the next field, and submits from the last one
  fn enter_pressed(&mut self) -> KeyResult<FormEvent> {
    if self.focus + 1 >= self.fields.len() {
      self.submit()
    } else {
      self.move_focus(true);
      KeyResult::Handled
    }
  }

  fn is_flagged(&self, field: &FieldSpec<F>) -> bool {
    self.touched.contains(field.name) && !self.state.validity(field.name)
  }

  pub fn render(&self, frame: &mut Frame, area: Rect) {
    let block = Block::default()
      .title(format!(" {} ", self.title))
      .title_alignment(Alignment::Center)
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Blue));

    let mut lines: Vec<Line> = Vec::new();
    if let Some(error) = &self.error {
      lines.push(Line::styled(
        error.clone(),
        Style::default().fg(Color::Red).bold(),
      ));
      lines.push(Line::raw(""));
    }

    for (idx, field) in self.fields.iter().enumerate() {
      let focused = idx == self.focus;
      let label_style = if self.is_flagged(field) {
        Style::default().fg(Color::Red)
      } else if focused {
        Style::default().fg(Color::Cyan).bold()
      } else {
        Style::default().fg(Color::DarkGray)
      };
      lines.push(Line::styled(format!("{}:", field.label), label_style));
      lines.extend(self.field_lines(field, focused));
      lines.push(Line::raw(""));
    }

    let hint = if self.busy {
      "Saving..."
    } else {
      "Tab/Shift-Tab: move   Enter: next   Ctrl-S: save   Esc: cancel"
    };
    lines.push(Line::styled(hint, Style::default().fg(Color::DarkGray)));

    let paragraph = Paragraph::new(lines).block(block).wrap(Wrap { trim: false });
    frame.render_widget(paragraph, area);
  }

  fn field_lines(&self, field: &FieldSpec<F>, focused: bool) -> Vec<Line<'static>> {
    let value = (field.get)(self.state.values());
    match &field.kind {
      FieldKind::Select(options) => {
        let label = options
          .iter()
          .find(|o| o.value == value)
          .map(|o| o.label.clone())
          .unwrap_or_else(|| "(choose)".to_string());
        let text = if focused {
          format!("  < {} >", label)
        } else {
          format!("  {}", label)
        };
        vec![Line::raw(text)]
      }
      FieldKind::Text | FieldKind::Textarea if focused => {
        let (before, after) = self.editor.split_at_cursor();
        let text = format!("{}_{}", before, after);
        text
          .split('\n')
          .map(|l| Line::styled(format!("  {}", l), Style::default().fg(Color::White)))
          .collect()
      }
      FieldKind::Text | FieldKind::Textarea => value
        .split('\n')
        .map(|l| Line::raw(format!("  {}", l)))
        .collect(),
    }
  }
}
