use crate::cache::QueryCache;
use crate::query::CachedQuery;
use crate::readflow::queries::ReadflowQuery;
use crate::readflow::types::{Article, ArticleStatus, CategoryRef, GetArticlesResponse};
use crate::ui::ensure_valid_selection;
use crate::ui::renderfns::{status_color, truncate};
use crate::ui::response::{draw_panel, match_response, Branches, Panel};
use crate::ui::view::{Context, Route, Shortcut, View, ViewAction};
use crate::ui::views::ArticleDetailView;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, List, ListItem, ListState};

/// Articles to read, history, or the articles of one category
pub struct ArticleListView {
  ctx: Context,
  route: Route,
  query: CachedQuery<ReadflowQuery, GetArticlesResponse>,
  list_state: ListState,
}

impl ArticleListView {
  pub fn new(ctx: Context, category: Option<CategoryRef>, status: ArticleStatus) -> Self {
    let category_id = category.as_ref().map(|c| c.id);
    let client = ctx.client.clone();
    let query = CachedQuery::new(
      ReadflowQuery::Articles {
        category: category_id,
        status,
      },
      move || {
        let client = client.clone();
        async move {
          client
            .get_articles(category_id, status)
            .await
            .map_err(|e| e.user_message())
        }
      },
    );

    Self {
      ctx,
      route: Route::Articles { category, status },
      query,
      list_state: ListState::default(),
    }
  }

  fn articles(&self) -> &[Article] {
    self
      .query
      .data()
      .map(|r| r.articles.entries.as_slice())
      .unwrap_or(&[])
  }

  fn empty_text(&self) -> &'static str {
    match &self.route {
      Route::Articles {
        status: ArticleStatus::Read,
        ..
      } => "History is empty.",
      _ => "No more articles to read.",
    }
  }

  fn panel(&self) -> Panel {
    let empty = self.empty_text();
    let (data, error, loading) = self.query.state().triple();
    match_response(Branches {
      loading: || Panel::loader("articles"),
      error: |e: &str| Panel::error("Unable to load articles", e),
      data: |resp: &GetArticlesResponse| {
        if resp.articles.entries.is_empty() {
          Panel::Empty(empty.to_string())
        } else {
          Panel::Ready
        }
      },
      other: || Panel::loader("articles"),
    })(data, error, loading)
  }

  fn render_list(&mut self, frame: &mut Frame, area: Rect) {
    let total = self
      .query
      .data()
      .map(|r| r.articles.total_count)
      .unwrap_or(0);

    let block = Block::default()
      .title(format!(" {} ({}) ", self.route.title(), total))
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

    let len = self.articles().len();
    ensure_valid_selection(&mut self.list_state, len);

    let title_width = (area.width as usize).saturating_sub(30).max(10);
    let items: Vec<ListItem> = self
      .articles()
      .iter()
      .map(|article| {
        let category = article
          .category
          .as_ref()
          .map(|c| format!("[{}]", c.title))
          .unwrap_or_default();
        ListItem::new(Line::from(vec![
          Span::styled(format!("{:<7}", article.id), Style::default().fg(Color::Cyan)),
          Span::raw(" "),
          Span::styled(
            truncate(&article.title, title_width),
            Style::default().fg(status_color(article.status)),
          ),
          Span::raw(" "),
          Span::styled(category, Style::default().fg(Color::Magenta)),
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

  fn selected(&self) -> Option<&Article> {
    self
      .list_state
      .selected()
      .and_then(|idx| self.articles().get(idx))
  }
}

impl View for ArticleListView {
  fn handle_key(&mut self, key: KeyEvent) -> ViewAction {
    match key.code {
      KeyCode::Char('j') | KeyCode::Down => {
        self.list_state.select_next();
        ViewAction::None
      }
      KeyCode::Char('k') | KeyCode::Up => {
        self.list_state.select_previous();
        ViewAction::None
      }
      KeyCode::Char('r') => {
        self.query.refetch();
        ViewAction::None
      }
      KeyCode::Enter => match self.selected() {
        Some(article) => ViewAction::Push(Box::new(ArticleDetailView::new(
          self.ctx.clone(),
          article.id.to_string(),
          self.route.clone(),
        ))),
        None => ViewAction::None,
      },
      KeyCode::Char('q') | KeyCode::Esc => ViewAction::Pop,
      _ => ViewAction::None,
    }
  }

  fn render(&mut self, frame: &mut Frame, area: Rect) {
    self.render_list(frame, area);
  }

  fn breadcrumb_label(&self) -> String {
    self.route.title()
  }

  fn tick(&mut self, cache: &mut QueryCache) -> ViewAction {
    self.query.sync(cache);
    ViewAction::None
  }

  fn shortcuts(&self) -> Vec<Shortcut> {
    vec![
      Shortcut::new("enter", "read"),
      Shortcut::new("r", "refresh"),
      Shortcut::new(":", "command"),
      Shortcut::new("q", "back"),
    ]
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::readflow::types::ArticlePage;
  use crate::ui::views::testing::{self, key};

  fn article(id: i64) -> Article {
    Article {
      id,
      title: format!("Article {}", id),
      text: None,
      html: None,
      url: None,
      image: None,
      category: None,
      status: ArticleStatus::Unread,
      published_at: None,
      created_at: None,
      updated_at: None,
    }
  }

  fn cached(category: Option<i64>, status: ArticleStatus, entries: Vec<Article>) -> QueryCache {
    let mut cache = QueryCache::in_memory();
    cache.write(
      &ReadflowQuery::Articles { category, status },
      &GetArticlesResponse {
        articles: ArticlePage {
          total_count: entries.len() as u64,
          end_cursor: None,
          has_next: false,
          entries,
        },
      },
    );
    cache
  }

  #[tokio::test]
  async fn test_serves_articles_from_cache() {
    let mut cache = cached(None, ArticleStatus::Unread, vec![article(1), article(2)]);
    let mut view = ArticleListView::new(testing::context().0, None, ArticleStatus::Unread);
    view.tick(&mut cache);

    assert!(view.query.state().is_success());
    assert_eq!(view.articles().len(), 2);
    assert_eq!(view.panel(), Panel::Ready);
  }

  #[tokio::test]
  async fn test_category_listing_uses_its_own_entry() {
    let mut cache = cached(Some(3), ArticleStatus::Unread, vec![article(9)]);
    let category = CategoryRef {
      id: 3,
      title: "Tech".into(),
    };
    let mut view = ArticleListView::new(testing::context().0, Some(category), ArticleStatus::Unread);
    view.tick(&mut cache);

    assert_eq!(view.breadcrumb_label(), "Tech");
    assert_eq!(view.articles()[0].id, 9);
  }

  #[tokio::test]
  async fn test_empty_text_per_status() {
    let mut cache = cached(None, ArticleStatus::Read, vec![]);
    let mut history = ArticleListView::new(testing::context().0, None, ArticleStatus::Read);
    history.tick(&mut cache);
    assert_eq!(history.panel(), Panel::Empty("History is empty.".into()));

    let mut cache = cached(None, ArticleStatus::Unread, vec![]);
    let mut unread = ArticleListView::new(testing::context().0, None, ArticleStatus::Unread);
    unread.tick(&mut cache);
    assert_eq!(unread.panel(), Panel::Empty("No more articles to read.".into()));
  }

  #[tokio::test]
  async fn test_enter_opens_selected_article() {
    let mut cache = cached(None, ArticleStatus::Unread, vec![article(4)]);
    let mut view = ArticleListView::new(testing::context().0, None, ArticleStatus::Unread);
    view.tick(&mut cache);

    assert!(matches!(view.handle_key(key(KeyCode::Enter)), ViewAction::None));
    view.handle_key(key(KeyCode::Char('j')));
    assert!(matches!(view.handle_key(key(KeyCode::Enter)), ViewAction::Push(_)));
  }
}
