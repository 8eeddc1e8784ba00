use std::collections::BTreeSet;

use crate::cache::QueryCache;
use crate::query::{CachedQuery, Mutation};
use crate::readflow::cache::rules;
use crate::readflow::queries::ReadflowQuery;
use crate::readflow::types::{DeleteRulesResponse, GetCategoriesResponse, GetRulesResponse, Rule};
use crate::ui::ensure_valid_selection;
use crate::ui::renderfns::{priority_label, truncate};
use crate::ui::response::{draw_panel, match_response, Branches, Panel};
use crate::ui::view::{Context, Shortcut, View, ViewAction};
use crate::ui::views::RuleFormView;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph};

/// Classification rules: list, multi-select and delete
pub struct RuleListView {
  ctx: Context,
  query: CachedQuery<ReadflowQuery, GetRulesResponse>,
  /// Category titles for display
  categories: CachedQuery<ReadflowQuery, GetCategoriesResponse>,
  list_state: ListState,
  marked: BTreeSet<i64>,
  confirm: Option<BTreeSet<i64>>,
  delete: Mutation<DeleteRulesResponse>,
  deleting: BTreeSet<i64>,
  error: Option<String>,
}

impl RuleListView {
  pub fn new(ctx: Context) -> Self {
    let client = ctx.client.clone();
    let query = CachedQuery::new(ReadflowQuery::Rules, move || {
      let client = client.clone();
      async move { client.get_rules().await.map_err(|e| e.user_message()) }
    });
    let client = ctx.client.clone();
    let categories = CachedQuery::new(ReadflowQuery::Categories, move || {
      let client = client.clone();
      async move { client.get_categories().await.map_err(|e| e.user_message()) }
    });

    Self {
      ctx,
      query,
      categories,
      list_state: ListState::default(),
      marked: BTreeSet::new(),
      confirm: None,
      delete: Mutation::new(),
      deleting: BTreeSet::new(),
      error: None,
    }
  }

  fn rules(&self) -> &[Rule] {
    self.query.data().map(|r| r.rules.as_slice()).unwrap_or(&[])
  }

  fn selected(&self) -> Option<&Rule> {
    self
      .list_state
      .selected()
      .and_then(|idx| self.rules().get(idx))
  }

  fn category_title(&self, id: Option<i64>) -> String {
    let Some(id) = id else {
      return "-".to_string();
    };
    self
      .categories
      .data()
      .and_then(|r| r.categories.iter().find(|c| c.id == id))
      .map(|c| c.title.clone())
      .unwrap_or_else(|| format!("#{}", id))
  }

  fn start_delete(&mut self, ids: BTreeSet<i64>) {
    let client = self.ctx.client.clone();
    let list: Vec<i64> = ids.iter().copied().collect();
    if self.delete.mutate(async move {
      client.delete_rules(list).await.map_err(|e| e.user_message())
    }) {
      tracing::debug!(?ids, "deleting rules");
      self.deleting = ids;
      self.error = None;
    }
  }

  fn panel(&self) -> Panel {
    let (data, error, loading) = self.query.state().triple();
    match_response(Branches {
      loading: || Panel::loader("rules"),
      error: |e: &str| Panel::error("Unable to load rules", e),
      data: |resp: &GetRulesResponse| {
        if resp.rules.is_empty() {
          Panel::Empty("No rule yet. Press 'n' to create one.".to_string())
        } else {
          Panel::Ready
        }
      },
      other: || Panel::loader("rules"),
    })(data, error, loading)
  }

  fn render_list(&mut self, frame: &mut Frame, area: Rect) {
    let block = Block::default()
      .title(format!(" Rules ({}) ", self.rules().len()))
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

    let len = self.rules().len();
    ensure_valid_selection(&mut self.list_state, len);

    let rule_width = (area.width as usize).saturating_sub(50).max(10);
    let items: Vec<ListItem> = self
      .rules()
      .iter()
      .map(|rule| {
        let mark = if self.marked.contains(&rule.id) { "[x]" } else { "[ ]" };
        let alias_style = if self.deleting.contains(&rule.id) {
          Style::default().fg(Color::DarkGray).add_modifier(Modifier::CROSSED_OUT)
        } else {
          Style::default().bold()
        };
        ListItem::new(Line::from(vec![
          Span::styled(mark, Style::default().fg(Color::Yellow)),
          Span::raw(" "),
          Span::styled(format!("{:<6}", rule.id), Style::default().fg(Color::Cyan)),
          Span::styled(format!("{:<16}", truncate(&rule.alias, 15)), alias_style),
          Span::styled(
            format!("{:<8}", priority_label(rule.priority)),
            Style::default().fg(Color::Yellow),
          ),
          Span::styled(
            format!("{:<14}", truncate(&self.category_title(rule.category_id), 13)),
            Style::default().fg(Color::Magenta),
          ),
          Span::styled(
            truncate(&rule.rule.replace('\n', " "), rule_width),
            Style::default().fg(Color::DarkGray),
          ),
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
        format!(" Delete {} rule(s)? (y/n)", ids.len()),
        Style::default().fg(Color::Yellow).bold(),
      )
    } else if let Some(error) = &self.error {
      Line::styled(
        format!(" Unable to delete rules: {}", error),
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

impl View for RuleListView {
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
        if let Some(id) = self.selected().map(|r| r.id) {
          if !self.marked.remove(&id) {
            self.marked.insert(id);
          }
        }
        ViewAction::None
      }
      KeyCode::Char('d') => {
        let targets: BTreeSet<i64> = if self.marked.is_empty() {
          self.selected().map(|r| r.id).into_iter().collect()
        } else {
          self.marked.clone()
        };
        if !targets.is_empty() && !self.delete.is_pending() {
          self.confirm = Some(targets);
        }
        ViewAction::None
      }
      KeyCode::Char('n') => ViewAction::Push(Box::new(RuleFormView::create(self.ctx.clone()))),
      KeyCode::Char('e') | KeyCode::Enter => match self.selected() {
        Some(rule) => ViewAction::Push(Box::new(RuleFormView::edit(self.ctx.clone(), rule.id))),
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
    "Rules".to_string()
  }

  fn tick(&mut self, cache: &mut QueryCache) -> ViewAction {
    self.query.sync(cache);
    self.categories.sync(cache);

    match self.delete.poll() {
      Some(Ok(result)) => {
        let ids = std::mem::take(&mut self.deleting);
        self.marked.retain(|id| !ids.contains(id));
        rules::update_cache_after_delete(ids)(cache);
        self
          .ctx
          .messages
          .show(format!("{} rule(s) deleted", result.deleted));
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
      Shortcut::new("q", "back"),
    ]
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::readflow::types::Category;
  use crate::ui::views::testing::{self, key};

  fn rule(id: i64, category_id: Option<i64>) -> Rule {
    Rule {
      id,
      alias: format!("rule-{}", id),
      rule: "true".into(),
      priority: 0,
      category_id,
      created_at: None,
      updated_at: None,
    }
  }

  fn seeded_cache() -> QueryCache {
    let mut cache = QueryCache::in_memory();
    cache.write(
      &ReadflowQuery::Rules,
      &GetRulesResponse {
        rules: vec![rule(1, Some(2)), rule(2, Some(9)), rule(3, None)],
      },
    );
    cache.write(
      &ReadflowQuery::Categories,
      &GetCategoriesResponse {
        categories: vec![Category::new(2, "Tech")],
      },
    );
    cache
  }

  #[tokio::test]
  async fn test_category_titles_resolve_from_cache() {
    let mut cache = seeded_cache();
    let mut view = RuleListView::new(testing::context().0);
    view.tick(&mut cache);
    assert_eq!(view.category_title(Some(2)), "Tech");
    assert_eq!(view.category_title(Some(9)), "#9");
    assert_eq!(view.category_title(None), "-");
  }

  #[tokio::test]
  async fn test_delete_defaults_to_cursor() {
    let mut cache = seeded_cache();
    let mut view = RuleListView::new(testing::context().0);
    view.tick(&mut cache);
    view.list_state.select(Some(2));
    view.handle_key(key(KeyCode::Char('d')));
    assert_eq!(view.confirm, Some(BTreeSet::from([3])));
  }

  #[tokio::test]
  async fn test_deleted_rules_disappear_after_patch() {
    let mut cache = seeded_cache();
    let mut view = RuleListView::new(testing::context().0);
    view.tick(&mut cache);

    rules::update_cache_after_delete(BTreeSet::from([1, 3]))(&mut cache);
    view.tick(&mut cache);
    let ids: Vec<i64> = view.rules().iter().map(|r| r.id).collect();
    assert_eq!(ids, vec![2]);
  }

  #[tokio::test]
  async fn test_busy_until_delete_lands() {
    let mut cache = seeded_cache();
    let mut view = RuleListView::new(testing::context().0);
    view.tick(&mut cache);

    view.deleting = BTreeSet::from([2]);
    view.delete.mutate(async { Ok(DeleteRulesResponse { deleted: 1 }) });
    assert!(view.is_busy());
    while view.is_busy() {
      tokio::task::yield_now().await;
      view.tick(&mut cache);
    }

    let ids: Vec<i64> = cache
      .read::<GetRulesResponse>(&ReadflowQuery::Rules)
      .unwrap()
      .rules
      .iter()
      .map(|r| r.id)
      .collect();
    assert_eq!(ids, vec![1, 3]);
  }
}
