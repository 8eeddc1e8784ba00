use crate::cache::QueryCache;
use crate::query::CachedQuery;
use crate::readflow::queries::ReadflowQuery;
use crate::readflow::types::{Article, GetArticleResponse};
use crate::ui::response::{draw_panel, match_response, Branches, Panel};
use crate::ui::view::{Context, Route, Shortcut, View, ViewAction};
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};

/// A single article, opened from a list or with `:article <id>`
pub struct ArticleDetailView {
  id: String,
  /// Where to go back to when there is nothing to show
  origin: Route,
  /// None when the id is not a number
  query: Option<CachedQuery<ReadflowQuery, GetArticleResponse>>,
  scroll: u16,
}

impl ArticleDetailView {
  pub fn new(ctx: Context, id: String, origin: Route) -> Self {
    let query = id.trim().parse::<i64>().ok().map(|article_id| {
      let client = ctx.client.clone();
      CachedQuery::new(ReadflowQuery::Article { id: article_id }, move || {
        let client = client.clone();
        async move {
          client
            .get_article(article_id)
            .await
            .map_err(|e| e.user_message())
        }
      })
    });
    if query.is_none() {
      tracing::debug!(%id, "article id is not numeric");
    }

    Self {
      id,
      origin,
      query,
      scroll: 0,
    }
  }

  fn article(&self) -> Option<&Article> {
    self.query.as_ref()?.data()?.article.as_ref()
  }

  fn panel(&self) -> Panel {
    let (data, error, loading) = match &self.query {
      Some(query) => query.state().triple(),
      None => (None, None, false),
    };
    match_response(Branches {
      loading: || Panel::loader("article"),
      error: |e: &str| Panel::error("Unable to load the article", e),
      data: |resp: &GetArticleResponse| match &resp.article {
        Some(article) => Panel::Content(article_text(article)),
        None => Panel::NotFound(format!("Article #{} not found.", self.id)),
      },
      other: || Panel::Redirect(self.origin.clone()),
    })(data, error, loading)
  }
}

fn article_text(article: &Article) -> Text<'static> {
  let mut lines = vec![
    Line::styled(article.title.clone(), Style::default().bold()),
    Line::raw(""),
  ];

  let mut meta = vec![Span::styled(
    article.status.as_str().to_string(),
    Style::default().fg(Color::Yellow),
  )];
  if let Some(category) = &article.category {
    meta.push(Span::raw("  "));
    meta.push(Span::styled(
      category.title.clone(),
      Style::default().fg(Color::Magenta),
    ));
  }
  if let Some(published) = &article.published_at {
    meta.push(Span::raw("  "));
    meta.push(Span::styled(
      published.clone(),
      Style::default().fg(Color::DarkGray),
    ));
  }
  lines.push(Line::from(meta));

  if let Some(url) = &article.url {
    lines.push(Line::styled(url.clone(), Style::default().fg(Color::Blue)));
  }
  lines.push(Line::raw(""));

  match article.text.as_deref().filter(|t| !t.trim().is_empty()) {
    Some(text) => lines.extend(text.lines().map(|l| Line::raw(l.to_string()))),
    None => lines.push(Line::styled(
      "No content",
      Style::default().fg(Color::DarkGray),
    )),
  }

  Text::from(lines)
}

impl View for ArticleDetailView {
  fn handle_key(&mut self, key: KeyEvent) -> ViewAction {
    match key.code {
      KeyCode::Char('j') | KeyCode::Down => {
        self.scroll = self.scroll.saturating_add(1);
        ViewAction::None
      }
      KeyCode::Char('k') | KeyCode::Up => {
        self.scroll = self.scroll.saturating_sub(1);
        ViewAction::None
      }
      KeyCode::Char('r') => {
        if let Some(query) = &mut self.query {
          query.refetch();
        }
        ViewAction::None
      }
      KeyCode::Char('q') | KeyCode::Esc => ViewAction::Pop,
      _ => ViewAction::None,
    }
  }

  fn render(&mut self, frame: &mut Frame, area: Rect) {
    let subtitle = self
      .article()
      .map(|a| format!(" {} ", a.title))
      .unwrap_or_else(|| format!(" #{} ", self.id));
    let block = Block::default()
      .title(subtitle)
      .title_alignment(Alignment::Center)
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Blue));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    match self.panel() {
      Panel::Content(text) => {
        let paragraph = Paragraph::new(text)
          .wrap(Wrap { trim: false })
          .scroll((self.scroll, 0));
        frame.render_widget(paragraph, inner);
      }
      panel => draw_panel(frame, inner, &panel),
    }
  }

  fn breadcrumb_label(&self) -> String {
    format!("#{}", self.id)
  }

  fn title(&self) -> String {
    self.origin.title()
  }

  fn tick(&mut self, cache: &mut QueryCache) -> ViewAction {
    if let Some(query) = &mut self.query {
      query.sync(cache);
    }
    match self.panel() {
      Panel::Redirect(route) => {
        tracing::debug!(id = %self.id, "nothing to show, redirecting");
        ViewAction::Navigate(route)
      }
      _ => ViewAction::None,
    }
  }

  fn shortcuts(&self) -> Vec<Shortcut> {
    vec![
      Shortcut::new("j/k", "scroll"),
      Shortcut::new("r", "refresh"),
      Shortcut::new("q", "back"),
    ]
  }
}
