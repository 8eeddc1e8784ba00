//! Wire types of the GraphQL transport.
//!
//! These are separate from domain types to keep the envelope and the
//! id normalization out of the views.

use serde::{Deserialize, Deserializer, Serialize};

/// Request body posted to the GraphQL endpoint
#[derive(Debug, Serialize)]
pub struct GraphQLRequest<'a, V: Serialize> {
  pub query: &'a str,
  #[serde(rename = "operationName")]
  pub operation_name: &'a str,
  pub variables: &'a V,
}

/// Response envelope: data and/or errors
#[derive(Debug, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct GraphQLResponse<T> {
  pub data: Option<T>,
  #[serde(default)]
  pub errors: Vec<GraphQLError>,
}

/// A server-reported error
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GraphQLError {
  pub message: String,
  #[serde(default)]
  pub path: Vec<serde_json::Value>,
}

/// Variables with no fields
#[derive(Debug, Default, Serialize)]
pub struct NoVariables {}

/// Variables `{ id }`
#[derive(Debug, Serialize)]
pub struct IdVariables {
  pub id: i64,
}

/// Variables `{ ids: [...] }`
#[derive(Debug, Serialize)]
pub struct IdsVariables {
  pub ids: Vec<i64>,
}

/// Variables of the articles listing
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticlesVariables {
  pub limit: u32,
  pub sort_order: &'static str,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub category: Option<i64>,
  pub status: &'static str,
}

// ============================================================================
// Id normalization
// ============================================================================

/// GraphQL `ID` arrives as a string; older endpoints send numbers.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
  Number(i64),
  Text(String),
}

impl RawId {
  fn into_id<E: serde::de::Error>(self) -> Result<i64, E> {
    match self {
      RawId::Number(n) => Ok(n),
      RawId::Text(s) => s
        .trim()
        .parse()
        .map_err(|_| E::custom(format!("invalid id '{}'", s))),
    }
  }
}

pub fn deserialize_id<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
  D: Deserializer<'de>,
{
  RawId::deserialize(deserializer)?.into_id()
}

pub fn deserialize_opt_id<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
  D: Deserializer<'de>,
{
  Option::<RawId>::deserialize(deserializer)?
    .map(RawId::into_id)
    .transpose()
}
