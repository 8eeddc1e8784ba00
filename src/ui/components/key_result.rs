/// Generic result type for component key handling.
///
/// Components report to their parent view whether a key was consumed and,
/// if so, whether it produced an event for the parent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyResult<T> {
  /// Key was consumed, no event for parent to handle
  Handled,
  /// Key was consumed, here's an event for parent to process
  Event(T),
  /// Key was not consumed, parent should try next handler
  NotHandled,
}
