//! GraphQL operations and the cache keys of the queries among them.

use crate::cache::{hash_key, QueryKey};

use super::types::ArticleStatus;

/// A named GraphQL document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Operation {
  pub name: &'static str,
  pub document: &'static str,
}

pub const GET_ARTICLES: Operation = Operation {
  name: "getArticles",
  document: r#"query getArticles($limit: Int, $sortOrder: String, $category: ID, $status: String) {
  articles(limit: $limit, sortOrder: $sortOrder, category: $category, status: $status) {
    totalCount
    endCursor
    hasNext
    entries { id title text url image category { id title } status published_at created_at updated_at }
  }
}"#,
};

pub const GET_ARTICLE: Operation = Operation {
  name: "getArticle",
  document: r#"query getArticle($id: ID!) {
  article(id: $id) { id title text html url image category { id title } status published_at created_at updated_at }
}"#,
};

pub const GET_CATEGORIES: Operation = Operation {
  name: "getCategories",
  document: r#"query getCategories {
  categories { id title created_at updated_at }
}"#,
};

pub const GET_CATEGORY: Operation = Operation {
  name: "getCategory",
  document: r#"query getCategory($id: ID!) {
  category(id: $id) { id title created_at updated_at }
}"#,
};

pub const CREATE_OR_UPDATE_CATEGORY: Operation = Operation {
  name: "createOrUpdateCategory",
  document: r#"mutation createOrUpdateCategory($id: ID, $title: String!) {
  createOrUpdateCategory(id: $id, title: $title) { id title created_at updated_at }
}"#,
};

pub const DELETE_CATEGORIES: Operation = Operation {
  name: "deleteCategories",
  document: r#"mutation deleteCategories($ids: [ID]!) {
  deleteCategories(ids: $ids)
}"#,
};

pub const GET_RULES: Operation = Operation {
  name: "getRules",
  document: r#"query getRules {
  rules { id alias rule priority category_id created_at updated_at }
}"#,
};

pub const GET_RULE: Operation = Operation {
  name: "getRule",
  document: r#"query getRule($id: ID!) {
  rule(id: $id) { id alias rule priority category_id created_at updated_at }
}"#,
};

pub const CREATE_OR_UPDATE_RULE: Operation = Operation {
  name: "createOrUpdateRule",
  document: r#"mutation createOrUpdateRule($id: ID, $alias: String!, $rule: String!, $priority: Int!, $category_id: Int!) {
  createOrUpdateRule(id: $id, alias: $alias, rule: $rule, priority: $priority, category_id: $category_id) {
    id alias rule priority category_id created_at updated_at
  }
}"#,
};

pub const DELETE_RULES: Operation = Operation {
  name: "deleteRules",
  document: r#"mutation deleteRules($ids: [ID]!) {
  deleteRules(ids: $ids)
}"#,
};

// ============================================================================
// Query key types
// ============================================================================

/// Cache keys of the readflow queries.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum ReadflowQuery {
  /// Article listing, optionally restricted to a category
  Articles {
    category: Option<i64>,
    status: ArticleStatus,
  },
  /// A single article
  Article { id: i64 },
  /// All categories
  Categories,
  /// A single category
  Category { id: i64 },
  /// All rules
  Rules,
  /// A single rule
  Rule { id: i64 },
}

impl ReadflowQuery {
  pub fn operation(&self) -> Operation {
    match self {
      Self::Articles { .. } => GET_ARTICLES,
      Self::Article { .. } => GET_ARTICLE,
      Self::Categories => GET_CATEGORIES,
      Self::Category { .. } => GET_CATEGORY,
      Self::Rules => GET_RULES,
      Self::Rule { .. } => GET_RULE,
    }
  }
}

impl QueryKey for ReadflowQuery {
  fn cache_hash(&self) -> String {
    let name = self.operation().name;
    let input = match self {
      Self::Articles { category, status } => format!(
        "{}:{}:{}",
        name,
        category.map(|c| c.to_string()).unwrap_or_default(),
        status.as_str()
      ),
      Self::Article { id } | Self::Category { id } | Self::Rule { id } => {
        format!("{}:{}", name, id)
      }
      Self::Categories | Self::Rules => name.to_string(),
    };
    hash_key(&input)
  }

  fn description(&self) -> String {
    match self {
      Self::Articles { category, status } => match category {
        Some(c) => format!("{} articles of category {}", status.as_str(), c),
        None => format!("{} articles", status.as_str()),
      },
      Self::Article { id } => format!("article {}", id),
      Self::Categories => "categories".to_string(),
      Self::Category { id } => format!("category {}", id),
      Self::Rules => "rules".to_string(),
      Self::Rule { id } => format!("rule {}", id),
    }
  }

  fn query_name(&self) -> &'static str {
    self.operation().name
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_keys_are_distinct_per_variables() {
    let a = ReadflowQuery::Category { id: 1 }.cache_hash();
    let b = ReadflowQuery::Category { id: 2 }.cache_hash();
    let c = ReadflowQuery::Rule { id: 1 }.cache_hash();
    assert_ne!(a, b);
    assert_ne!(a, c);
    assert_eq!(a, ReadflowQuery::Category { id: 1 }.cache_hash());
  }

  #[test]
  fn test_article_listing_keys() {
    let unread = ReadflowQuery::Articles {
      category: None,
      status: ArticleStatus::Unread,
    };
    let read = ReadflowQuery::Articles {
      category: None,
      status: ArticleStatus::Read,
    };
    let in_category = ReadflowQuery::Articles {
      category: Some(4),
      status: ArticleStatus::Unread,
    };
    assert_ne!(unread.cache_hash(), read.cache_hash());
    assert_ne!(unread.cache_hash(), in_category.cache_hash());
    assert_eq!(in_category.description(), "unread articles of category 4");
  }

  #[test]
  fn test_operation_names_match_documents() {
    for op in [
      GET_ARTICLES,
      GET_ARTICLE,
      GET_CATEGORIES,
      GET_CATEGORY,
      CREATE_OR_UPDATE_CATEGORY,
      DELETE_CATEGORIES,
      GET_RULES,
      GET_RULE,
      CREATE_OR_UPDATE_RULE,
      DELETE_RULES,
    ] {
      assert!(
        op.document.contains(&format!(" {}", op.name)),
        "{} not declared in its document",
        op.name
      );
    }
  }
}
