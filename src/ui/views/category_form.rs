use crate::cache::QueryCache;
use crate::form::{required, FormState};
use crate::query::{CachedQuery, Mutation};
use crate::readflow::cache::categories;
use crate::readflow::queries::ReadflowQuery;
use crate::readflow::types::{CategoryInput, CreateOrUpdateCategoryResponse, GetCategoryResponse};
use crate::ui::components::{FieldKind, FieldSpec, FormEvent, FormPanel, KeyResult};
use crate::ui::response::{draw_panel, match_response, Branches, Panel};
use crate::ui::view::{Context, Shortcut, View, ViewAction};
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct CategoryFields {
  title: String,
}

fn category_form(title: String, values: CategoryFields) -> FormPanel<CategoryFields> {
  let state = FormState::new(values).validate("title", |f: &CategoryFields| required(&f.title));
  FormPanel::new(
    title,
    state,
    vec![FieldSpec {
      name: "title",
      label: "Title",
      kind: FieldKind::Text,
      get: |f: &CategoryFields| f.title.clone(),
      set: |f: &mut CategoryFields, v: &str| f.title = v.to_string(),
    }],
  )
}

/// Create a category, or edit the one with the given id
pub struct CategoryFormView {
  ctx: Context,
  id: Option<i64>,
  /// Loads the category being edited
  query: Option<CachedQuery<ReadflowQuery, GetCategoryResponse>>,
  form: Option<FormPanel<CategoryFields>>,
  save: Mutation<CreateOrUpdateCategoryResponse>,
}

impl CategoryFormView {
  pub fn create(ctx: Context) -> Self {
    Self {
      ctx,
      id: None,
      query: None,
      form: Some(category_form(
        "New category".to_string(),
        CategoryFields::default(),
      )),
      save: Mutation::new(),
    }
  }

  pub fn edit(ctx: Context, id: i64) -> Self {
    let client = ctx.client.clone();
    let query = CachedQuery::new(ReadflowQuery::Category { id }, move || {
      let client = client.clone();
      async move { client.get_category(id).await.map_err(|e| e.user_message()) }
    });

    Self {
      ctx,
      id: Some(id),
      query: Some(query),
      form: None,
      save: Mutation::new(),
    }
  }

  fn verb(&self) -> &'static str {
    if self.id.is_some() {
      "edit"
    } else {
      "create"
    }
  }

  /// Body while the edited category is not in the form yet
  fn panel(&self) -> Panel {
    let (data, error, loading) = match &self.query {
      Some(query) => query.state().triple(),
      None => (None, None, false),
    };
    let id = self.id.unwrap_or_default();
    let render = match_response(Branches {
      loading: || Panel::loader("category"),
      error: |e: &str| Panel::error("Unable to load the category", e),
      data: |resp: &GetCategoryResponse| match resp.category {
        Some(_) => Panel::Ready,
        None => Panel::NotFound(format!("Category #{} not found.", id)),
      },
      other: || Panel::loader("category"),
    });
    render(data, error, loading)
  }

  fn submit(&mut self) {
    let Some(form) = &mut self.form else {
      return;
    };
    let input = CategoryInput {
      id: self.id,
      title: form.values().title.trim().to_string(),
    };
    let client = self.ctx.client.clone();
    let started = self.save.mutate(async move {
      client
        .create_or_update_category(&input)
        .await
        .map_err(|e| e.user_message())
    });
    if started {
      form.set_busy(true);
    }
  }

  fn apply(&mut self, cache: &mut QueryCache, result: CreateOrUpdateCategoryResponse) {
    let title = &result.create_or_update_category.title;
    if self.id.is_some() {
      categories::update_cache_after_update(cache, &result);
      self.ctx.messages.show(format!("Category edited: {}", title));
    } else {
      categories::update_cache_after_create(cache, &result);
      self.ctx.messages.show(format!("Category created: {}", title));
    }
  }
}

impl View for CategoryFormView {
  fn handle_key(&mut self, key: KeyEvent) -> ViewAction {
    if let Some(form) = &mut self.form {
      return match form.handle_key(key) {
        KeyResult::Event(FormEvent::Submit) => {
          self.submit();
          ViewAction::None
        }
        KeyResult::Event(FormEvent::Cancel) => ViewAction::Pop,
        KeyResult::Handled | KeyResult::NotHandled => ViewAction::None,
      };
    }

    match key.code {
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
    if let Some(form) = &self.form {
      form.render(frame, area);
      return;
    }
    let block = Block::default()
      .title(format!(" Edit category #{} ", self.id.unwrap_or_default()))
      .title_alignment(Alignment::Center)
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Blue));
    let inner = block.inner(area);
    frame.render_widget(block, area);
    draw_panel(frame, inner, &self.panel());
  }

  fn breadcrumb_label(&self) -> String {
    match self.id {
      Some(id) => format!("Edit #{}", id),
      None => "New".to_string(),
    }
  }

  fn title(&self) -> String {
    "Categories".to_string()
  }

  fn tick(&mut self, cache: &mut QueryCache) -> ViewAction {
    if let Some(query) = &mut self.query {
      query.sync(cache);
      if self.form.is_none() {
        if let Some(category) = query.data().and_then(|r| r.category.as_ref()) {
          self.form = Some(category_form(
            format!("Edit category #{}", category.id),
            CategoryFields {
              title: category.title.clone(),
            },
          ));
        }
      }
    }

    match self.save.poll() {
      Some(Ok(result)) => {
        self.apply(cache, result);
        ViewAction::Pop
      }
      Some(Err(e)) => {
        let verb = self.verb();
        if let Some(form) = &mut self.form {
          form.set_busy(false);
          form.set_error(format!("Unable to {} category: {}", verb, e));
        }
        ViewAction::None
      }
      None => ViewAction::None,
    }
  }

  fn is_busy(&self) -> bool {
    self.save.is_pending()
  }

  fn captures_input(&self) -> bool {
    self.form.is_some()
  }

  fn shortcuts(&self) -> Vec<Shortcut> {
    vec![Shortcut::new("ctrl-s", "save"), Shortcut::new("esc", "cancel")]
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::form::INVALID_FORM_MESSAGE;
  use crate::readflow::types::Category;
  use crate::ui::views::testing::{self, key};
  use crossterm::event::KeyModifiers;

  fn save_key() -> KeyEvent {
    KeyEvent::new(KeyCode::Char('s'), KeyModifiers::CONTROL)
  }

  #[tokio::test]
  async fn test_empty_title_blocks_submit() {
    let mut view = CategoryFormView::create(testing::context().0);
    view.handle_key(save_key());
    assert!(!view.save.is_pending());
    assert_eq!(
      view.form.as_ref().and_then(|f| f.error()),
      Some(INVALID_FORM_MESSAGE)
    );
  }

  #[tokio::test]
  async fn test_valid_submit_starts_mutation() {
    let mut view = CategoryFormView::create(testing::context().0);
    for c in "News".chars() {
      view.handle_key(key(KeyCode::Char(c)));
    }
    view.handle_key(save_key());
    assert!(view.save.is_pending());
    assert!(view.is_busy());
    assert!(matches!(view.handle_key(key(KeyCode::Esc)), ViewAction::None));
  }

  #[tokio::test]
  async fn test_edit_fills_form_from_cache() {
    let mut cache = QueryCache::in_memory();
    cache.write(
      &ReadflowQuery::Category { id: 3 },
      &GetCategoryResponse {
        category: Some(Category::new(3, "Tech")),
      },
    );
    let mut view = CategoryFormView::edit(testing::context().0, 3);
    assert!(!view.captures_input());
    view.tick(&mut cache);
    assert_eq!(
      view.form.as_ref().map(|f| f.values().clone()),
      Some(CategoryFields {
        title: "Tech".into()
      })
    );
    assert!(view.captures_input());
  }

  #[tokio::test]
  async fn test_edit_unknown_category_is_not_found() {
    let mut cache = QueryCache::in_memory();
    cache.write(
      &ReadflowQuery::Category { id: 9 },
      &GetCategoryResponse { category: None },
    );
    let mut view = CategoryFormView::edit(testing::context().0, 9);
    view.tick(&mut cache);
    assert!(view.form.is_none());
    assert_eq!(view.panel(), Panel::NotFound("Category #9 not found.".into()));
  }

  #[test]
  fn test_apply_patches_list_and_posts_message() {
    let (ctx, mut rx) = testing::context();
    let mut view = CategoryFormView::create(ctx);
    let mut cache = QueryCache::in_memory();
    cache.write(
      &ReadflowQuery::Categories,
      &crate::readflow::types::GetCategoriesResponse {
        categories: vec![Category::new(1, "News")],
      },
    );
    view.apply(
      &mut cache,
      CreateOrUpdateCategoryResponse {
        create_or_update_category: Category::new(5, "X"),
      },
    );
    let list: crate::readflow::types::GetCategoriesResponse =
      cache.read(&ReadflowQuery::Categories).unwrap();
    assert_eq!(list.categories[0], Category::new(5, "X"));
    match rx.try_recv() {
      Ok(crate::event::Event::Message(m)) => assert_eq!(m, "Category created: X"),
      other => panic!("unexpected {:?}", other),
    }
  }
}
