use crate::cache::QueryCache;
use crate::form::{required, FormState};
use crate::query::{CachedQuery, Mutation};
use crate::readflow::cache::rules;
use crate::readflow::queries::ReadflowQuery;
use crate::readflow::types::{
  CreateOrUpdateRuleResponse, GetCategoriesResponse, GetRuleResponse, Rule, RuleInput,
};
use crate::ui::components::{FieldKind, FieldSpec, FormEvent, FormPanel, KeyResult, SelectOption};
use crate::ui::renderfns::PRIORITIES;
use crate::ui::response::{draw_panel, match_response, Branches, Panel};
use crate::ui::view::{Context, Shortcut, View, ViewAction};
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders};

/// Select fields hold the option value as text
#[derive(Debug, Clone, PartialEq, Eq)]
struct RuleFields {
  alias: String,
  rule: String,
  priority: String,
  category_id: String,
}

impl Default for RuleFields {
  fn default() -> Self {
    Self {
      alias: String::new(),
      rule: String::new(),
      priority: "0".to_string(),
      category_id: String::new(),
    }
  }
}

impl From<&Rule> for RuleFields {
  fn from(rule: &Rule) -> Self {
    Self {
      alias: rule.alias.clone(),
      rule: rule.rule.clone(),
      priority: rule.priority.to_string(),
      category_id: rule.category_id.map(|id| id.to_string()).unwrap_or_default(),
    }
  }
}

impl RuleFields {
  /// Only called on a valid form
  fn to_input(&self, id: Option<i64>) -> Option<RuleInput> {
    Some(RuleInput {
      id,
      alias: self.alias.trim().to_string(),
      rule: self.rule.trim().to_string(),
      priority: self.priority.parse().ok()?,
      category_id: self.category_id.parse().ok()?,
    })
  }
}

fn priority_options() -> Vec<SelectOption> {
  PRIORITIES
    .iter()
    .map(|(value, label)| SelectOption::new(value.to_string(), *label))
    .collect()
}

fn category_options(resp: &GetCategoriesResponse) -> Vec<SelectOption> {
  resp
    .categories
    .iter()
    .map(|c| SelectOption::new(c.id.to_string(), c.title.clone()))
    .collect()
}

fn rule_form(title: String, values: RuleFields) -> FormPanel<RuleFields> {
  let state = FormState::new(values)
    .validate("alias", |f: &RuleFields| required(&f.alias))
    .validate("rule", |f: &RuleFields| required(&f.rule))
    .validate("priority", |f: &RuleFields| f.priority.parse::<i32>().is_ok())
    .validate("category_id", |f: &RuleFields| {
      f.category_id.parse::<i64>().is_ok()
    });
  FormPanel::new(
    title,
    state,
    vec![
      FieldSpec {
        name: "alias",
        label: "Alias",
        kind: FieldKind::Text,
        get: |f: &RuleFields| f.alias.clone(),
        set: |f: &mut RuleFields, v: &str| f.alias = v.to_string(),
      },
      FieldSpec {
        name: "rule",
        label: "Rule",
        kind: FieldKind::Textarea,
        get: |f: &RuleFields| f.rule.clone(),
        set: |f: &mut RuleFields, v: &str| f.rule = v.to_string(),
      },
      FieldSpec {
        name: "priority",
        label: "Priority",
        kind: FieldKind::Select(priority_options()),
        get: |f: &RuleFields| f.priority.clone(),
        set: |f: &mut RuleFields, v: &str| f.priority = v.to_string(),
      },
      FieldSpec {
        name: "category_id",
        label: "Category",
        kind: FieldKind::Select(Vec::new()),
        get: |f: &RuleFields| f.category_id.clone(),
        set: |f: &mut RuleFields, v: &str| f.category_id = v.to_string(),
      },
    ],
  )
}

/// Create a rule, or edit the one with the given id
pub struct RuleFormView {
  ctx: Context,
  id: Option<i64>,
  /// Loads the rule being edited
  query: Option<CachedQuery<ReadflowQuery, GetRuleResponse>>,
  /// Options of the category select
  categories: CachedQuery<ReadflowQuery, GetCategoriesResponse>,
  form: Option<FormPanel<RuleFields>>,
  options_stale: bool,
  save: Mutation<CreateOrUpdateRuleResponse>,
}

impl RuleFormView {
  fn with(ctx: Context, id: Option<i64>) -> Self {
    let client = ctx.client.clone();
    let categories = CachedQuery::new(ReadflowQuery::Categories, move || {
      let client = client.clone();
      async move { client.get_categories().await.map_err(|e| e.user_message()) }
    });

    let query = id.map(|rule_id| {
      let client = ctx.client.clone();
      CachedQuery::new(ReadflowQuery::Rule { id: rule_id }, move || {
        let client = client.clone();
        async move { client.get_rule(rule_id).await.map_err(|e| e.user_message()) }
      })
    });

    let form = match id {
      Some(_) => None,
      None => Some(rule_form("New rule".to_string(), RuleFields::default())),
    };

    Self {
      ctx,
      id,
      query,
      categories,
      form,
      options_stale: true,
      save: Mutation::new(),
    }
  }

  pub fn create(ctx: Context) -> Self {
    Self::with(ctx, None)
  }

  pub fn edit(ctx: Context, id: i64) -> Self {
    Self::with(ctx, Some(id))
  }

  fn verb(&self) -> &'static str {
    if self.id.is_some() {
      "edit"
    } else {
      "create"
    }
  }

  /// Body while the edited rule is not in the form yet
  fn panel(&self) -> Panel {
    let (data, error, loading) = match &self.query {
      Some(query) => query.state().triple(),
      None => (None, None, false),
    };
    let id = self.id.unwrap_or_default();
    let render = match_response(Branches {
      loading: || Panel::loader("rule"),
      error: |e: &str| Panel::error("Unable to load the rule", e),
      data: |resp: &GetRuleResponse| match resp.rule {
        Some(_) => Panel::Ready,
        None => Panel::NotFound(format!("Rule #{} not found.", id)),
      },
      other: || Panel::loader("rule"),
    });
    render(data, error, loading)
  }

  fn submit(&mut self) {
    let Some(form) = &mut self.form else {
      return;
    };
    let Some(input) = form.values().to_input(self.id) else {
      return;
    };
    let client = self.ctx.client.clone();
    let started = self.save.mutate(async move {
      client
        .create_or_update_rule(&input)
        .await
        .map_err(|e| e.user_message())
    });
    if started {
      form.set_busy(true);
    }
  }

  fn apply(&mut self, cache: &mut QueryCache, result: CreateOrUpdateRuleResponse) {
    let alias = &result.create_or_update_rule.alias;
    if self.id.is_some() {
      rules::update_cache_after_update(cache, &result);
      self.ctx.messages.show(format!("Rule edited: {}", alias));
    } else {
      rules::update_cache_after_create(cache, &result);
      self.ctx.messages.show(format!("Rule created: {}", alias));
    }
  }

  fn refresh_options(&mut self) {
    let (Some(form), Some(categories)) = (&mut self.form, self.categories.data()) else {
      return;
    };
    form.set_options("category_id", category_options(categories));
    self.options_stale = false;
  }
}

impl View for RuleFormView {
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
      .title(format!(" Edit rule #{} ", self.id.unwrap_or_default()))
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
    "Rules".to_string()
  }

  fn tick(&mut self, cache: &mut QueryCache) -> ViewAction {
    if self.categories.sync(cache) {
      self.options_stale = true;
    }

    if let Some(query) = &mut self.query {
      query.sync(cache);
      if self.form.is_none() {
        if let Some(rule) = query.data().and_then(|r| r.rule.as_ref()) {
          self.form = Some(rule_form(
            format!("Edit rule #{}", rule.id),
            RuleFields::from(rule),
          ));
          self.options_stale = true;
        }
      }
    }

    if self.options_stale {
      self.refresh_options();
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
          form.set_error(format!("Unable to {} rule: {}", verb, e));
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
