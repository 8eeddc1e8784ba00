//! Errors of the API boundary.

use super::api_types::GraphQLError;

/// Failure of a query or mutation.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
  /// Network or transport failure (connect, timeout, TLS).
  #[error("request failed: {0}")]
  Transport(#[from] reqwest::Error),

  /// Non-success HTTP status without a GraphQL error body.
  #[error("server returned {status}: {body}")]
  Status {
    status: reqwest::StatusCode,
    body: String,
  },

  /// Errors reported by the GraphQL server.
  #[error("{}", first_message(.0))]
  GraphQL(Vec<GraphQLError>),

  /// Response body did not match the expected shape.
  #[error("invalid response: {0}")]
  Decode(#[from] serde_json::Error),

  /// Success without data or errors.
  #[error("response contained no data")]
  NoData,
}

fn first_message(errors: &[GraphQLError]) -> &str {
  errors
    .first()
    .map(|e| e.message.as_str())
    .unwrap_or("unknown server error")
}

impl ApiError {
  /// Message shown to the user: the first server error if there is one,
  /// the error's description otherwise.
  pub fn user_message(&self) -> String {
    match self {
      ApiError::GraphQL(errors) => first_message(errors).to_string(),
      other => other.to_string(),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_graphql_message_is_first_error() {
    let err = ApiError::GraphQL(vec![
      GraphQLError {
        message: "title is required".into(),
        path: vec![],
      },
      GraphQLError {
        message: "other".into(),
        path: vec![],
      },
    ]);
    assert_eq!(err.user_message(), "title is required");
    assert_eq!(err.to_string(), "title is required");
  }

  #[test]
  fn test_empty_graphql_errors() {
    assert_eq!(ApiError::GraphQL(vec![]).user_message(), "unknown server error");
  }

  #[test]
  fn test_status_message() {
    let err = ApiError::Status {
      status: reqwest::StatusCode::UNAUTHORIZED,
      body: "bad token".into(),
    };
    assert_eq!(err.user_message(), "server returned 401 Unauthorized: bad token");
  }
}
