use crate::cache::{MemoryStore, NoopStore, QueryCache};
use crate::commands;
use crate::config::{CacheConfig, Config};
use crate::event::{Event, EventHandler};
use crate::notify::Messages;
use crate::readflow::client::ReadflowClient;
use crate::ui;
use crate::ui::components::{CommandEvent, CommandInput, KeyResult};
use crate::ui::view::{Context, Route, View, ViewAction};
use crate::ui::views::{ArticleDetailView, ArticleListView, CategoryListView, RuleListView};
use color_eyre::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use crossterm::terminal::{
  disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::ExecutableCommand;
use ratatui::prelude::*;
use std::io::{stdout, Stdout};
use std::time::{Duration, Instant};

const TICK_RATE: Duration = Duration::from_millis(100);

/// How long a message stays in the footer
const MESSAGE_TTL: Duration = Duration::from_secs(5);

const BUSY_MESSAGE: &str = "Saving changes, please wait...";

/// A submitted `:command`, resolved
#[derive(Debug, Clone, PartialEq, Eq)]
enum AppCommand {
  Go(Route),
  OpenArticle(String),
  Reset,
  Quit,
  Usage(&'static str),
  Unknown(String),
}

fn parse_command(input: &str) -> AppCommand {
  let (name, arg) = commands::split_input(input);
  match name {
    "articles" => AppCommand::Go(Route::unread()),
    "history" => AppCommand::Go(Route::history()),
    "categories" => AppCommand::Go(Route::Categories),
    "rules" => AppCommand::Go(Route::Rules),
    "article" if arg.is_empty() => AppCommand::Usage("Usage: article <id>"),
    "article" => AppCommand::OpenArticle(arg.to_string()),
    "reset" => AppCommand::Reset,
    "quit" => AppCommand::Quit,
    other => AppCommand::Unknown(other.to_string()),
  }
}

fn build_cache(config: &CacheConfig) -> QueryCache {
  let cache = if config.enabled {
    QueryCache::new(MemoryStore::new())
  } else {
    tracing::info!("query cache disabled");
    QueryCache::new(NoopStore)
  };
  match config.stale_time() {
    Some(stale_time) => cache.with_stale_time(stale_time),
    None => {
      tracing::warn!(stale_secs = config.stale_secs, "invalid stale time, keeping default");
      cache
    }
  }
}

/// Main application state
pub struct App {
  /// Navigation stack - root is always at index 0
  view_stack: Vec<Box<dyn View>>,

  /// Route of the root view, reopened by `:reset`
  root: Route,

  /// Command input with autocomplete (after pressing :)
  command: CommandInput,

  /// Query results shared by all views
  cache: QueryCache,

  /// Client and message dispatch handed to views
  ctx: Context,

  config: Config,

  events: EventHandler,

  /// Latest message and when it was posted
  message: Option<(String, Instant)>,

  should_quit: bool,
}

impl App {
  pub fn new(config: Config) -> Result<Self> {
    let client = ReadflowClient::new(&config)?;
    let events = EventHandler::new(TICK_RATE);
    let ctx = Context {
      client,
      messages: Messages::new(events.sender()),
    };
    let root = config.default_view.route();

    let mut app = Self {
      view_stack: Vec::new(),
      root: root.clone(),
      command: CommandInput::new(),
      cache: build_cache(&config.cache),
      ctx,
      config,
      events,
      message: None,
      should_quit: false,
    };
    app.navigate(root);
    Ok(app)
  }

  pub async fn run(&mut self) -> Result<()> {
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;
    self.events.start();

    let result = self.event_loop(&mut terminal).await;

    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;
    result
  }

  async fn event_loop(&mut self, terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
    while !self.should_quit {
      terminal.draw(|frame| ui::draw(frame, self))?;

      match self.events.next().await {
        Some(event) => self.handle_event(event),
        None => break,
      }
    }
    tracing::info!("exiting");
    Ok(())
  }

  fn handle_event(&mut self, event: Event) {
    match event {
      Event::Key(key) => self.handle_key(key),
      Event::Tick => self.tick(),
      Event::Message(message) => self.message = Some((message, Instant::now())),
    }
  }

  fn open(&self, route: Route) -> Box<dyn View> {
    let ctx = self.ctx.clone();
    match route {
      Route::Articles { category, status } => Box::new(ArticleListView::new(ctx, category, status)),
      Route::Categories => Box::new(CategoryListView::new(ctx)),
      Route::Rules => Box::new(RuleListView::new(ctx)),
    }
  }

  /// Whether a view on the stack still has a write in flight
  fn is_busy(&self) -> bool {
    self.view_stack.iter().any(|v| v.is_busy())
  }

  /// Replace the stack with a root view, unless that would drop a pending write
  fn navigate(&mut self, route: Route) {
    if self.is_busy() {
      tracing::debug!(?route, "navigation held, write pending");
      self.set_message(BUSY_MESSAGE);
      return;
    }
    tracing::debug!(?route, "navigate");
    let view = self.open(route.clone());
    self.root = route;
    self.view_stack.clear();
    self.push(view);
  }

  /// Push a view and give it a first tick, so it can load or redirect before drawing
  fn push(&mut self, mut view: Box<dyn View>) {
    let action = view.tick(&mut self.cache);
    self.view_stack.push(view);
    self.apply(action);
  }

  fn apply(&mut self, action: ViewAction) {
    match action {
      ViewAction::None => {}
      ViewAction::Push(view) => self.push(view),
      ViewAction::Pop => {
        if self.view_stack.last().is_some_and(|v| v.is_busy()) {
          self.set_message(BUSY_MESSAGE);
        } else if self.view_stack.len() > 1 {
          self.view_stack.pop();
        } else {
          self.should_quit = true;
        }
      }
      ViewAction::Navigate(route) => self.navigate(route),
    }
  }

  /// Drive every view's queries; only the top view may navigate
  fn tick(&mut self) {
    if let Some((_, posted)) = &self.message {
      if posted.elapsed() > MESSAGE_TTL {
        self.message = None;
      }
    }

    let top = self.view_stack.len().saturating_sub(1);
    let mut action = ViewAction::None;
    for (idx, view) in self.view_stack.iter_mut().enumerate() {
      let result = view.tick(&mut self.cache);
      if idx == top {
        action = result;
      }
    }
    self.apply(action);
  }

  fn handle_key(&mut self, key: KeyEvent) {
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
      self.should_quit = true;
      return;
    }

    let allow_command = self
      .view_stack
      .last()
      .map(|v| !v.captures_input())
      .unwrap_or(true);
    match self.command.handle_key(key, allow_command) {
      KeyResult::Event(CommandEvent::Submitted(cmd)) => {
        self.execute_command(&cmd);
        return;
      }
      KeyResult::Event(CommandEvent::Cancelled) | KeyResult::Handled => return,
      KeyResult::NotHandled => {}
    }

    if let Some(view) = self.view_stack.last_mut() {
      let action = view.handle_key(key);
      self.apply(action);
    }
  }

  fn execute_command(&mut self, input: &str) {
    tracing::debug!(command = input, "execute command");
    match parse_command(input) {
      AppCommand::Go(route) => self.navigate(route),
      AppCommand::OpenArticle(id) => {
        let view = ArticleDetailView::new(self.ctx.clone(), id, Route::unread());
        self.push(Box::new(view));
      }
      AppCommand::Reset => {
        if self.is_busy() {
          self.set_message(BUSY_MESSAGE);
          return;
        }
        self.cache.reset();
        tracing::info!("cache reset");
        self.navigate(self.root.clone());
        self.set_message("Cache cleared");
      }
      AppCommand::Quit => self.should_quit = true,
      AppCommand::Usage(usage) => self.set_message(usage),
      AppCommand::Unknown(name) => self.set_message(format!("Unknown command: {}", name)),
    }
  }

  fn set_message(&mut self, message: impl Into<String>) {
    self.message = Some((message.into(), Instant::now()));
  }

  // Accessors for UI rendering
  pub fn current_view(&self) -> Option<&dyn View> {
    self.view_stack.last().map(|v| v.as_ref())
  }

  pub fn current_view_mut(&mut self) -> Option<&mut Box<dyn View>> {
    self.view_stack.last_mut()
  }

  pub fn command_input(&self) -> &CommandInput {
    &self.command
  }

  pub fn display_title(&self) -> String {
    self.config.display_title()
  }

  pub fn api_url(&self) -> &str {
    &self.config.api.url
  }

  pub fn message(&self) -> Option<&str> {
    self.message.as_ref().map(|(m, _)| m.as_str())
  }

  pub fn view_breadcrumb(&self) -> Vec<String> {
    self
      .view_stack
      .iter()
      .map(|v| v.breadcrumb_label())
      .collect()
  }
}
