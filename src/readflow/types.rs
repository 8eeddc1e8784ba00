//! Domain types, shaped like the readflow GraphQL payloads.
//!
//! These are both the decoded API responses and the cached query payloads,
//! so they round-trip through serde.

use serde::{Deserialize, Serialize};

use super::api_types::{deserialize_id, deserialize_opt_id};

/// Article reading status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArticleStatus {
  #[default]
  Unread,
  Read,
}

impl ArticleStatus {
  pub fn as_str(self) -> &'static str {
    match self {
      ArticleStatus::Unread => "unread",
      ArticleStatus::Read => "read",
    }
  }
}

/// Category as embedded in an article
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryRef {
  #[serde(deserialize_with = "deserialize_id")]
  pub id: i64,
  pub title: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Article {
  #[serde(deserialize_with = "deserialize_id")]
  pub id: i64,
  pub title: String,
  pub text: Option<String>,
  pub html: Option<String>,
  pub url: Option<String>,
  pub image: Option<String>,
  pub category: Option<CategoryRef>,
  #[serde(default)]
  pub status: ArticleStatus,
  pub published_at: Option<String>,
  pub created_at: Option<String>,
  pub updated_at: Option<String>,
}

/// One page of an article listing
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticlePage {
  #[serde(default)]
  pub total_count: u64,
  pub end_cursor: Option<String>,
  #[serde(default)]
  pub has_next: bool,
  #[serde(default)]
  pub entries: Vec<Article>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
  #[serde(deserialize_with = "deserialize_id")]
  pub id: i64,
  pub title: String,
  pub created_at: Option<String>,
  pub updated_at: Option<String>,
}

impl Category {
  pub fn new(id: i64, title: impl Into<String>) -> Self {
    Self {
      id,
      title: title.into(),
      created_at: None,
      updated_at: None,
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rule {
  #[serde(deserialize_with = "deserialize_id")]
  pub id: i64,
  pub alias: String,
  pub rule: String,
  #[serde(default)]
  pub priority: i32,
  #[serde(default, deserialize_with = "deserialize_opt_id")]
  pub category_id: Option<i64>,
  pub created_at: Option<String>,
  pub updated_at: Option<String>,
}

// ============================================================================
// Query responses
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetArticleResponse {
  pub article: Option<Article>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetArticlesResponse {
  pub articles: ArticlePage,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetCategoriesResponse {
  pub categories: Vec<Category>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetCategoryResponse {
  pub category: Option<Category>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetRulesResponse {
  pub rules: Vec<Rule>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetRuleResponse {
  pub rule: Option<Rule>,
}

// ============================================================================
// Mutation responses
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateOrUpdateCategoryResponse {
  #[serde(rename = "createOrUpdateCategory")]
  pub create_or_update_category: Category,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateOrUpdateRuleResponse {
  #[serde(rename = "createOrUpdateRule")]
  pub create_or_update_rule: Rule,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteCategoriesResponse {
  #[serde(rename = "deleteCategories")]
  pub deleted: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteRulesResponse {
  #[serde(rename = "deleteRules")]
  pub deleted: i64,
}

// ============================================================================
// Mutation inputs
// ============================================================================

/// Variables of `createOrUpdateCategory`. `id: None` creates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryInput {
  #[serde(skip_serializing_if = "Option::is_none")]
  pub id: Option<i64>,
  pub title: String,
}

/// Variables of `createOrUpdateRule`. `id: None` creates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RuleInput {
  #[serde(skip_serializing_if = "Option::is_none")]
  pub id: Option<i64>,
  pub alias: String,
  pub rule: String,
  pub priority: i32,
  pub category_id: i64,
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[test]
  fn test_article_with_string_id() {
    let article: Article = serde_json::from_value(json!({
      "id": "42",
      "title": "Hello",
      "url": "https://example.com",
      "status": "read",
      "category": { "id": 3, "title": "Tech" }
    }))
    .unwrap();
    assert_eq!(article.id, 42);
    assert_eq!(article.status, ArticleStatus::Read);
    assert_eq!(article.category.unwrap().id, 3);
    assert_eq!(article.text, None);
  }

  #[test]
  fn test_article_page_camel_case() {
    let page: ArticlePage = serde_json::from_value(json!({
      "totalCount": 1,
      "endCursor": "10",
      "hasNext": false,
      "entries": [{ "id": 1, "title": "A" }]
    }))
    .unwrap();
    assert_eq!(page.total_count, 1);
    assert_eq!(page.entries[0].status, ArticleStatus::Unread);
  }

  #[test]
  fn test_rule_category_id_optional() {
    let rule: Rule = serde_json::from_value(json!({
      "id": "7", "alias": "hn", "rule": "website == \"news.ycombinator.com\"",
      "priority": 1, "category_id": null
    }))
    .unwrap();
    assert_eq!(rule.category_id, None);

    let rule: Rule = serde_json::from_value(json!({
      "id": 7, "alias": "hn", "rule": "true", "category_id": "2"
    }))
    .unwrap();
    assert_eq!(rule.category_id, Some(2));
    assert_eq!(rule.priority, 0);
  }

  #[test]
  fn test_category_input_omits_missing_id() {
    let create = CategoryInput {
      id: None,
      title: "News".into(),
    };
    assert_eq!(serde_json::to_value(&create).unwrap(), json!({"title": "News"}));
  }
}
