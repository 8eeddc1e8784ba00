//! Message dispatch handed to views that report outcomes to the user.

use tokio::sync::mpsc;

use crate::event::Event;

/// Posts user-facing messages to the app loop, which shows them in the footer.
#[derive(Debug, Clone)]
pub struct Messages {
  tx: mpsc::UnboundedSender<Event>,
}

impl Messages {
  pub fn new(tx: mpsc::UnboundedSender<Event>) -> Self {
    Self { tx }
  }

  pub fn show(&self, message: impl Into<String>) {
    let message = message.into();
    tracing::info!(%message, "user message");
    // Ignore send errors - the loop is shutting down
    let _ = self.tx.send(Event::Message(message));
  }
}
