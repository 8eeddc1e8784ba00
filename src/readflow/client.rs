use crate::config::Config;
use crate::readflow::api_types::{
  ArticlesVariables, GraphQLRequest, GraphQLResponse, IdVariables, IdsVariables, NoVariables,
};
use crate::readflow::error::ApiError;
use crate::readflow::queries::{self, Operation};
use crate::readflow::types::{
  ArticleStatus, CategoryInput, CreateOrUpdateCategoryResponse, CreateOrUpdateRuleResponse,
  DeleteCategoriesResponse, DeleteRulesResponse, GetArticleResponse, GetArticlesResponse,
  GetCategoriesResponse, GetCategoryResponse, GetRuleResponse, GetRulesResponse, RuleInput,
};
use color_eyre::{eyre::eyre, Result};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::StatusCode;
use serde::{de::DeserializeOwned, Serialize};
use std::time::Duration;
use url::Url;

/// readflow GraphQL API client
#[derive(Clone)]
pub struct ReadflowClient {
  http: reqwest::Client,
  endpoint: Url,
  article_limit: u32,
}

impl ReadflowClient {
  pub fn new(config: &Config) -> Result<Self> {
    let token = Config::get_api_token()?;

    let mut headers = HeaderMap::new();
    let mut auth = HeaderValue::from_str(&format!("Bearer {}", token))
      .map_err(|e| eyre!("Invalid API token: {}", e))?;
    auth.set_sensitive(true);
    headers.insert(AUTHORIZATION, auth);

    let http = reqwest::Client::builder()
      .default_headers(headers)
      .timeout(Duration::from_secs(config.api.timeout_secs))
      .user_agent(concat!("readflow-tui/", env!("CARGO_PKG_VERSION")))
      .build()
      .map_err(|e| eyre!("Failed to create HTTP client: {}", e))?;

    Ok(Self {
      http,
      endpoint: config.endpoint()?,
      article_limit: config.articles.limit,
    })
  }

  /// Run an operation and decode its `data`.
  pub async fn execute<V, T>(&self, op: Operation, variables: &V) -> Result<T, ApiError>
  where
    V: Serialize,
    T: DeserializeOwned,
  {
    let body = GraphQLRequest {
      query: op.document,
      operation_name: op.name,
      variables,
    };

    tracing::debug!(operation = op.name, "graphql request");
    let response = self
      .http
      .post(self.endpoint.clone())
      .json(&body)
      .send()
      .await?;

    let status = response.status();
    let text = response.text().await?;
    let result = decode_response(status, &text);
    if let Err(e) = &result {
      tracing::warn!(operation = op.name, %status, error = %e, "graphql request failed");
    }
    result
  }

  /// Get a page of articles
  pub async fn get_articles(
    &self,
    category: Option<i64>,
    status: ArticleStatus,
  ) -> Result<GetArticlesResponse, ApiError> {
    let variables = ArticlesVariables {
      limit: self.article_limit,
      sort_order: "asc",
      category,
      status: status.as_str(),
    };
    self.execute(queries::GET_ARTICLES, &variables).await
  }

  /// Get a single article by id
  pub async fn get_article(&self, id: i64) -> Result<GetArticleResponse, ApiError> {
    self.execute(queries::GET_ARTICLE, &IdVariables { id }).await
  }

  pub async fn get_categories(&self) -> Result<GetCategoriesResponse, ApiError> {
    self.execute(queries::GET_CATEGORIES, &NoVariables::default()).await
  }

  pub async fn get_category(&self, id: i64) -> Result<GetCategoryResponse, ApiError> {
    self.execute(queries::GET_CATEGORY, &IdVariables { id }).await
  }

  /// Create a category (no id) or rename an existing one
  pub async fn create_or_update_category(
    &self,
    input: &CategoryInput,
  ) -> Result<CreateOrUpdateCategoryResponse, ApiError> {
    self.execute(queries::CREATE_OR_UPDATE_CATEGORY, input).await
  }

  pub async fn delete_categories(&self, ids: Vec<i64>) -> Result<DeleteCategoriesResponse, ApiError> {
    self.execute(queries::DELETE_CATEGORIES, &IdsVariables { ids }).await
  }

  pub async fn get_rules(&self) -> Result<GetRulesResponse, ApiError> {
    self.execute(queries::GET_RULES, &NoVariables::default()).await
  }

  pub async fn get_rule(&self, id: i64) -> Result<GetRuleResponse, ApiError> {
    self.execute(queries::GET_RULE, &IdVariables { id }).await
  }

  /// Create a rule (no id) or update an existing one
  pub async fn create_or_update_rule(
    &self,
    input: &RuleInput,
  ) -> Result<CreateOrUpdateRuleResponse, ApiError> {
    self.execute(queries::CREATE_OR_UPDATE_RULE, input).await
  }

  pub async fn delete_rules(&self, ids: Vec<i64>) -> Result<DeleteRulesResponse, ApiError> {
    self.execute(queries::DELETE_RULES, &IdsVariables { ids }).await
  }
}

/// Turn an HTTP status and body into data or an error.
///
/// GraphQL errors take precedence over the status code, since servers often
/// report them with 4xx/5xx alongside a well-formed body.
fn decode_response<T: DeserializeOwned>(status: StatusCode, body: &str) -> Result<T, ApiError> {
  let envelope: GraphQLResponse<T> = match serde_json::from_str(body) {
    Ok(envelope) => envelope,
    Err(e) if status.is_success() => return Err(ApiError::Decode(e)),
    Err(_) => {
      return Err(ApiError::Status {
        status,
        body: body.trim().to_string(),
      })
    }
  };

  if !envelope.errors.is_empty() {
    return Err(ApiError::GraphQL(envelope.errors));
  }
  if !status.is_success() {
    return Err(ApiError::Status {
      status,
      body: body.trim().to_string(),
    });
  }
  envelope.data.ok_or(ApiError::NoData)
}
