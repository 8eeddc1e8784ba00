//! Request-state rendering.
//!
//! `match_response` picks exactly one of four branches from the
//! `(data, error, loading)` triple of a request, with fixed precedence:
//! loading, then error, then data, then "other" (nothing to show yet, or
//! nothing to show at all).

use ratatui::prelude::*;
use ratatui::widgets::{Paragraph, Wrap};

use super::view::Route;

/// One producer per render branch
pub struct Branches<L, E, D, O> {
  pub loading: L,
  pub error: E,
  pub data: D,
  pub other: O,
}

/// Build a renderer over the `(data, error, loading)` triple.
///
/// A payload is only rendered once loading is over and no error is present.
/// Deciding that a payload means "not found" is left to the data branch.
pub fn match_response<T, V, L, E, D, O>(
  branches: Branches<L, E, D, O>,
) -> impl Fn(Option<&T>, Option<&str>, bool) -> V
where
  T: ?Sized,
  L: Fn() -> V,
  E: Fn(&str) -> V,
  D: Fn(&T) -> V,
  O: Fn() -> V,
{
  move |data, error, loading| {
    if loading {
      return (branches.loading)();
    }
    if let Some(err) = error {
      return (branches.error)(err);
    }
    match data {
      Some(payload) => (branches.data)(payload),
      None => (branches.other)(),
    }
  }
}

/// What a page shows in its body
#[derive(Debug, Clone, PartialEq)]
pub enum Panel {
  Loader(String),
  Error { title: String, message: String },
  NotFound(String),
  Empty(String),
  Content(Text<'static>),
  /// Data is ready, the view draws it itself
  Ready,
  Redirect(Route),
}

impl Panel {
  pub fn loader(what: &str) -> Self {
    Panel::Loader(format!("Loading {}...", what))
  }

  pub fn error(title: &str, message: &str) -> Self {
    Panel::Error {
      title: title.to_string(),
      message: message.to_string(),
    }
  }
}

/// Draw the non-`Ready` panels
pub fn draw_panel(frame: &mut Frame, area: Rect, panel: &Panel) {
  let paragraph = match panel {
    Panel::Loader(text) => Paragraph::new(text.as_str()).style(Style::default().fg(Color::DarkGray)),
    Panel::Error { title, message } => Paragraph::new(vec![
      Line::styled(title.as_str(), Style::default().fg(Color::Red).bold()),
      Line::raw(""),
      Line::styled(message.as_str(), Style::default().fg(Color::Red)),
      Line::raw(""),
      Line::styled("Press 'r' to retry.", Style::default().fg(Color::DarkGray)),
    ])
    .wrap(Wrap { trim: true }),
    Panel::NotFound(text) => Paragraph::new(vec![
      Line::styled("Not found", Style::default().fg(Color::Red).bold()),
      Line::raw(""),
      Line::raw(text.as_str()),
    ]),
    Panel::Empty(text) => Paragraph::new(text.as_str()).style(Style::default().fg(Color::DarkGray)),
    Panel::Content(text) => Paragraph::new(text.clone()).wrap(Wrap { trim: false }),
    Panel::Redirect(route) => Paragraph::new(format!("Redirecting to {}...", route.title()))
      .style(Style::default().fg(Color::DarkGray)),
    Panel::Ready => return,
  };
  frame.render_widget(paragraph, area);
}

#[cfg(test)]
mod tests {
  use super::*;

  #[derive(Debug, PartialEq)]
  enum Branch {
    Loading,
    Error(String),
    Data(i32),
    Other,
  }

  fn renderer() -> impl Fn(Option<&i32>, Option<&str>, bool) -> Branch {
    match_response(Branches {
      loading: || Branch::Loading,
      error: |e: &str| Branch::Error(e.to_string()),
      data: |d: &i32| Branch::Data(*d),
      other: || Branch::Other,
    })
  }

  #[test]
  fn test_loading_wins_over_everything() {
    let render = renderer();
    assert_eq!(render(None, None, true), Branch::Loading);
    assert_eq!(render(Some(&1), None, true), Branch::Loading);
    assert_eq!(render(Some(&1), Some("boom"), true), Branch::Loading);
  }

  #[test]
  fn test_error_wins_over_data() {
    let render = renderer();
    assert_eq!(render(None, Some("boom"), false), Branch::Error("boom".into()));
    assert_eq!(render(Some(&1), Some("boom"), false), Branch::Error("boom".into()));
  }

  #[test]
  fn test_data_when_settled() {
    assert_eq!(renderer()(Some(&3), None, false), Branch::Data(3));
  }

  #[test]
  fn test_other_when_nothing() {
    assert_eq!(renderer()(None, None, false), Branch::Other);
  }

  #[test]
  fn test_panel_constructors() {
    assert_eq!(Panel::loader("rules"), Panel::Loader("Loading rules...".into()));
    assert_eq!(
      Panel::error("Unable to load", "timeout"),
      Panel::Error {
        title: "Unable to load".into(),
        message: "timeout".into()
      }
    );
  }
}
