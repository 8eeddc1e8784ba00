use crossterm::event::KeyEvent;
use ratatui::prelude::*;

use crate::cache::QueryCache;
use crate::notify::Messages;
use crate::readflow::client::ReadflowClient;
use crate::readflow::types::{ArticleStatus, CategoryRef};

/// A keyboard shortcut hint for display in the header
#[derive(Debug, Clone)]
pub struct Shortcut {
  pub key: &'static str,
  pub label: &'static str,
}

impl Shortcut {
  pub const fn new(key: &'static str, label: &'static str) -> Self {
    Self { key, label }
  }
}

/// Root destinations, reachable from the command line or by redirect
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
  Articles {
    category: Option<CategoryRef>,
    status: ArticleStatus,
  },
  Categories,
  Rules,
}

impl Route {
  pub fn unread() -> Self {
    Route::Articles {
      category: None,
      status: ArticleStatus::Unread,
    }
  }

  pub fn history() -> Self {
    Route::Articles {
      category: None,
      status: ArticleStatus::Read,
    }
  }

  /// Page title of the route
  pub fn title(&self) -> String {
    match self {
      Route::Articles {
        status: ArticleStatus::Read,
        ..
      } => "History".to_string(),
      Route::Articles {
        category: Some(category),
        ..
      } => category.title.clone(),
      Route::Articles { .. } => "Articles to read".to_string(),
      Route::Categories => "Categories".to_string(),
      Route::Rules => "Rules".to_string(),
    }
  }
}

/// Capabilities shared by every view: the API client and message dispatch.
#[derive(Clone)]
pub struct Context {
  pub client: ReadflowClient,
  pub messages: Messages,
}

/// Actions that a view can request in response to user input
pub enum ViewAction {
  /// No action needed
  None,
  /// Push a new view onto the stack
  Push(Box<dyn View>),
  /// Pop current view from stack (go back)
  Pop,
  /// Replace the whole stack with a root view
  Navigate(Route),
}

/// Trait for view behavior
///
/// Views handle their own input and return actions for the App to execute.
/// Views that load data hold queries and drive them from `tick()`, which is
/// also the only place they touch the cache.
pub trait View {
  /// Handle a key event, returning an action for App to execute
  fn handle_key(&mut self, key: KeyEvent) -> ViewAction;

  /// Render the view to the frame
  fn render(&mut self, frame: &mut Frame, area: Rect);

  /// Get the breadcrumb label for this view
  fn breadcrumb_label(&self) -> String;

  /// Page title shown in the header
  fn title(&self) -> String {
    self.breadcrumb_label()
  }

  /// Called on each tick to poll queries and mutations and apply cache patches
  fn tick(&mut self, _cache: &mut QueryCache) -> ViewAction {
    ViewAction::None
  }

  /// True while the view wants raw text input (the `:` key is not a command)
  fn captures_input(&self) -> bool {
    false
  }

  /// True while a write is in flight. The view stays on the stack until it
  /// lands, since its tick applies the cache patch.
  fn is_busy(&self) -> bool {
    false
  }

  /// Get keyboard shortcuts to display in the header
  fn shortcuts(&self) -> Vec<Shortcut> {
    vec![Shortcut::new(":", "command"), Shortcut::new("q", "back")]
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_route_titles() {
    assert_eq!(Route::unread().title(), "Articles to read");
    assert_eq!(Route::history().title(), "History");
    let in_category = Route::Articles {
      category: Some(CategoryRef {
        id: 2,
        title: "Tech".into(),
      }),
      status: ArticleStatus::Unread,
    };
    assert_eq!(in_category.title(), "Tech");
  }
}
