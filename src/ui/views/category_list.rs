use std::collections::BTreeSet;

use crate::cache::QueryCache;
use crate::query::{CachedQuery, Mutation};
use crate::readflow::cache::categories;
use crate::readflow::queries::ReadflowQuery;
use crate::readflow::types::{
  ArticleStatus, Category, CategoryRef, DeleteCategoriesResponse, GetCategoriesResponse,
};
use crate::ui::ensure_valid_selection;
use crate::ui::response::{draw_panel, match_response, Branches, Panel};
use crate::ui::view::{Context, Shortcut, View, ViewAction};
use crate::ui::views::{ArticleListView, CategoryFormView};
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph};

/// Category management: list, multi-select and delete
pub struct CategoryListView {
  ctx: Context,
  query: CachedQuery<ReadflowQuery, GetCategoriesResponse>,
  list_state: ListState,
  marked: BTreeSet<i64>,
  /// Ids awaiting a `y` to be deleted
  confirm: Option<BTreeSet<i64>>,
  delete: Mutation<DeleteCategoriesResponse>,
  deleting: BTreeSet<i64>,
  error: Option<String>,
}

impl CategoryListView {
  pub fn new(ctx: Context) -> Self {
    let client = ctx.client.clone();
    let query = CachedQuery::new(ReadflowQuery::Categories, move || {
      let client = client.clone();
      async move { client.get_categories().await.map_err(|e| e.user_message()) }
    });

    Self {
      ctx,
      query,
      list_state: ListState::default(),
      marked: BTreeSet::new(),
      confirm: None,
      delete: Mutation::new(),
      deleting: BTreeSet::new(),
      error: None,
    }
  }

  fn categories(&self) -> &[Category] {
    self
      .query
      .data()
      .map(|r| r.categories.as_slice())
      .unwrap_or(&[])
  }

  fn selected(&self) -> Option<&Category> {
    self
      .list_state
      .selected()
      .and_then(|idx| self.categories().get(idx))
  }

  /// Marked categories, or the one under the cursor when none is marked
  fn delete_targets(&self) -> BTreeSet<i64> {
    if self.marked.is_empty() {
      self.selected().map(|c| c.id).into_iter().collect()
    } else {
      self.marked.clone()
    }
  }

  fn start_delete(&mut self, ids: BTreeSet<i64>) {
    let client = self.ctx.client.clone();
    let list: Vec<i64> = ids.iter().copied().collect();
    let started = self.delete.mutate(async move {
      client
        .delete_categories(list)
        .await
        .map_err(|e| e.user_message())
    });
    if started {
      tracing::debug!(?ids, "deleting categories");
      self.deleting = ids;
      self.error = None;
    }
  }

  fn panel(&self) -> Panel {
    let (data, error, loading) = self.query.state().triple();
    match_response(Branches {
      loading: || Panel::loader("categories"),
      error: |e: &str| Panel::error("Unable to load categories", e),
      data: |resp: &GetCategoriesResponse| {
        if resp.categories.is_empty() {
          Panel::Empty("No category yet. Press 'n' to create one.".to_string())
        } else {
          Panel::Ready
        }
      },
      other: || Panel::loader("categories"),
    })(data, error, loading)
  }

  fn render_list(&mut self, frame: &mut Frame, area: Rect) {
    let block = Block::default()
      .title(format!(
        " Categories ({}) {}",
        self.categories().len(),
        if self.marked.is_empty() {
          String::new()
        } else {
          format!("[{} selected] ", self.marked.len())
        }
      ))
      .title_alignment(Alignment::Center)
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Blue));

    let panel = self.panel();
    if panel != Panel::Ready {
      let inner = block.inner(area);
      frame.render_widget(block, area);
      draw_panel(frame, inner, &panel);
      return;
    }

    let len = self.categories().len();
    ensure_valid_selection(&mut self.list_state, len);

    let items: Vec<ListItem> = self
      .categories()
      .iter()
      .map(|category| {
        let mark = if self.marked.contains(&category.id) {
          "[x]"
        } else {
          "[ ]"
        };
        let style = if self.deleting.contains(&category.id) {
          Style::default().fg(Color::DarkGray).add_modifier(Modifier::CROSSED_OUT)
        } else {
          Style::default()
        };
        ListItem::new(Line::from(vec![
          Span::styled(mark, Style::default().fg(Color::Yellow)),
          Span::raw(" "),
          Span::styled(format!("{:<7}", category.id), Style::default().fg(Color::Cyan)),
          Span::styled(category.title.clone(), style),
        ]))
      })
      .collect();

    let list = List::new(items)
      .block(block)
      .highlight_style(
        Style::default()
          .bg(Color::DarkGray)
          .add_modifier(Modifier::BOLD),
      )
      .highlight_symbol("> ");

    frame.render_stateful_widget(list, area, &mut self.list_state);
  }

  fn render_status(&self, frame: &mut Frame, area: Rect) {
    let line = if let Some(ids) = &self.confirm {
      Line::styled(
        format!(" Delete {} category(ies)? (y/n)", ids.len()),
        Style::default().fg(Color::Yellow).bold(),
      )
    } else if let Some(error) = &self.error {
      Line::styled(
        format!(" Unable to delete categories: {}", error),
        Style::default().fg(Color::Red),
      )
    } else if self.delete.is_pending() {
      Line::styled(" Deleting...", Style::default().fg(Color::DarkGray))
    } else {
      return;
    };
    frame.render_widget(Paragraph::new(line), area);
  }
}

impl View for CategoryListView {
  fn handle_key(&mut self, key: KeyEvent) -> ViewAction {
    if let Some(ids) = self.confirm.take() {
      if key.code == KeyCode::Char('y') {
        self.start_delete(ids);
      }
      return ViewAction::None;
    }

    match key.code {
      KeyCode::Char('j') | KeyCode::Down => {
        self.list_state.select_next();
        ViewAction::None
      }
      KeyCode::Char('k') | KeyCode::Up => {
        self.list_state.select_previous();
        ViewAction::None
      }
      KeyCode::Char(' ') => {
        if let Some(id) = self.selected().map(|c| c.id) {
          if !self.marked.remove(&id) {
            self.marked.insert(id);
          }
        }
        ViewAction::None
      }
      KeyCode::Char('d') => {
        let targets = self.delete_targets();
        if !targets.is_empty() && !self.delete.is_pending() {
          self.confirm = Some(targets);
        }
        ViewAction::None
      }
      KeyCode::Char('n') => ViewAction::Push(Box::new(CategoryFormView::create(self.ctx.clone()))),
      KeyCode::Char('e') => match self.selected() {
        Some(category) => ViewAction::Push(Box::new(CategoryFormView::edit(
          self.ctx.clone(),
          category.id,
        ))),
        None => ViewAction::None,
      },
      KeyCode::Enter => match self.selected() {
        Some(category) => ViewAction::Push(Box::new(ArticleListView::new(
          self.ctx.clone(),
          Some(CategoryRef {
            id: category.id,
            title: category.title.clone(),
          }),
          ArticleStatus::Unread,
        ))),
        None => ViewAction::None,
      },
      KeyCode::Char('r') => {
        self.query.refetch();
        ViewAction::None
      }
      KeyCode::Char('q') | KeyCode::Esc => ViewAction::Pop,
      _ => ViewAction::None,
    }
  }

  fn render(&mut self, frame: &mut Frame, area: Rect) {
    let chunks = Layout::default()
      .direction(Direction::Vertical)
      .constraints([Constraint::Min(1), Constraint::Length(1)])
      .split(area);
    self.render_list(frame, chunks[0]);
    self.render_status(frame, chunks[1]);
  }

  fn breadcrumb_label(&self) -> String {
    "Categories".to_string()
  }

  fn tick(&mut self, cache: &mut QueryCache) -> ViewAction {
    self.query.sync(cache);

    match self.delete.poll() {
      Some(Ok(result)) => {
        let ids = std::mem::take(&mut self.deleting);
        self.marked.retain(|id| !ids.contains(id));
        categories::update_cache_after_delete(ids)(cache);
        self
          .ctx
          .messages
          .show(format!("{} category(ies) deleted", result.deleted));
      }
      Some(Err(e)) => {
        self.deleting.clear();
        self.error = Some(e);
      }
      None => {}
    }
    ViewAction::None
  }

  fn is_busy(&self) -> bool {
    self.delete.is_pending()
  }

  fn shortcuts(&self) -> Vec<Shortcut> {
    vec![
      Shortcut::new("n", "new"),
      Shortcut::new("e", "edit"),
      Shortcut::new("space", "select"),
      Shortcut::new("d", "delete"),
      Shortcut::new("enter", "articles"),
      Shortcut::new("q", "back"),
    ]
  }
}
