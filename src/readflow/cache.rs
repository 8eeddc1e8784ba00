//! Cache patches for readflow entities.

use crate::cache::Patchable;

use super::queries::ReadflowQuery;
use super::types::{
  Category, GetCategoriesResponse, GetCategoryResponse, GetRuleResponse, GetRulesResponse, Rule,
};

// ============================================================================
// Patchable implementations
// ============================================================================

impl Patchable for Category {
  type Key = ReadflowQuery;
  type List = GetCategoriesResponse;
  type Detail = GetCategoryResponse;

  fn id(&self) -> i64 {
    self.id
  }

  fn list_key() -> ReadflowQuery {
    ReadflowQuery::Categories
  }

  fn detail_key(id: i64) -> ReadflowQuery {
    ReadflowQuery::Category { id }
  }

  fn entries(list: &mut GetCategoriesResponse) -> &mut Vec<Self> {
    &mut list.categories
  }

  fn to_detail(&self) -> GetCategoryResponse {
    GetCategoryResponse {
      category: Some(self.clone()),
    }
  }
}

impl Patchable for Rule {
  type Key = ReadflowQuery;
  type List = GetRulesResponse;
  type Detail = GetRuleResponse;

  fn id(&self) -> i64 {
    self.id
  }

  fn list_key() -> ReadflowQuery {
    ReadflowQuery::Rules
  }

  fn detail_key(id: i64) -> ReadflowQuery {
    ReadflowQuery::Rule { id }
  }

  fn entries(list: &mut GetRulesResponse) -> &mut Vec<Self> {
    &mut list.rules
  }

  fn to_detail(&self) -> GetRuleResponse {
    GetRuleResponse {
      rule: Some(self.clone()),
    }
  }
}

// ============================================================================
// Per-entity patches, taking mutation results
// ============================================================================

pub mod categories {
  use std::collections::BTreeSet;

  use crate::cache::{self, QueryCache};
  use crate::readflow::queries::{ReadflowQuery, GET_ARTICLE, GET_ARTICLES, GET_RULE, GET_RULES};
  use crate::readflow::types::{
    Article, ArticleStatus, Category, CreateOrUpdateCategoryResponse, GetArticleResponse,
    GetArticlesResponse, GetRuleResponse, GetRulesResponse,
  };

  pub fn update_cache_after_create(cache: &mut QueryCache, result: &CreateOrUpdateCategoryResponse) {
    cache::after_create(cache, &result.create_or_update_category);
  }

  /// Also retitles the category embedded in cached articles.
  pub fn update_cache_after_update(cache: &mut QueryCache, result: &CreateOrUpdateCategoryResponse) {
    let category = &result.create_or_update_category;
    cache::after_update(cache, category);

    let lists = cache.update_where(GET_ARTICLES.name, |r: &mut GetArticlesResponse| {
      r.articles
        .entries
        .iter_mut()
        .fold(false, |changed, article| retitle(article, category) || changed)
    });
    let details = cache.update_where(GET_ARTICLE.name, |r: &mut GetArticleResponse| {
      r.article
        .as_mut()
        .is_some_and(|article| retitle(article, category))
    });
    if lists + details > 0 {
      tracing::debug!(id = category.id, lists, details, "retitled category in cached articles");
    }
  }

  fn retitle(article: &mut Article, category: &Category) -> bool {
    match &mut article.category {
      Some(embedded) if embedded.id == category.id && embedded.title != category.title => {
        embedded.title = category.title.clone();
        true
      }
      _ => false,
    }
  }

  /// Also evicts every cached article and rule result that refers to a
  /// deleted category.
  pub fn update_cache_after_delete(ids: BTreeSet<i64>) -> impl FnOnce(&mut QueryCache) {
    move |cache: &mut QueryCache| {
      for id in &ids {
        for status in [ArticleStatus::Unread, ArticleStatus::Read] {
          cache.evict(&ReadflowQuery::Articles {
            category: Some(*id),
            status,
          });
        }
      }

      let refers = |article: &Article| {
        article
          .category
          .as_ref()
          .is_some_and(|c| ids.contains(&c.id))
      };
      let in_deleted = |category_id: Option<i64>| category_id.is_some_and(|c| ids.contains(&c));
      let evicted = cache.evict_where(GET_ARTICLES.name, |r: &GetArticlesResponse| {
        r.articles.entries.iter().any(refers)
      }) + cache.evict_where(GET_ARTICLE.name, |r: &GetArticleResponse| {
        r.article.as_ref().is_some_and(refers)
      }) + cache.evict_where(GET_RULES.name, |r: &GetRulesResponse| {
        r.rules.iter().any(|rule| in_deleted(rule.category_id))
      }) + cache.evict_where(GET_RULE.name, |r: &GetRuleResponse| {
        r.rule.as_ref().is_some_and(|rule| in_deleted(rule.category_id))
      });
      if evicted > 0 {
        tracing::debug!(?ids, evicted, "evicted results referring to deleted categories");
      }

      cache::after_delete::<Category>(ids)(cache);
    }
  }
}

pub mod rules {
  use std::collections::BTreeSet;

  use crate::cache::{self, QueryCache};
  use crate::readflow::types::{CreateOrUpdateRuleResponse, Rule};

  pub fn update_cache_after_create(cache: &mut QueryCache, result: &CreateOrUpdateRuleResponse) {
    cache::after_create(cache, &result.create_or_update_rule);
  }

  pub fn update_cache_after_update(cache: &mut QueryCache, result: &CreateOrUpdateRuleResponse) {
    cache::after_update(cache, &result.create_or_update_rule);
  }

  pub fn update_cache_after_delete(ids: BTreeSet<i64>) -> impl FnOnce(&mut QueryCache) {
    cache::after_delete::<Rule>(ids)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::cache::QueryCache;
  use crate::readflow::types::{
    Article, ArticlePage, ArticleStatus, CategoryRef, CreateOrUpdateCategoryResponse,
    CreateOrUpdateRuleResponse, GetArticleResponse, GetArticlesResponse,
  };
  use std::collections::BTreeSet;

  fn cached_categories(cache: &QueryCache) -> Option<Vec<Category>> {
    cache
      .read::<GetCategoriesResponse>(&ReadflowQuery::Categories)
      .map(|r| r.categories)
  }

  fn seed(cache: &mut QueryCache, categories: Vec<Category>) {
    cache.write(
      &ReadflowQuery::Categories,
      &GetCategoriesResponse { categories },
    );
  }

  fn created(id: i64, title: &str) -> CreateOrUpdateCategoryResponse {
    CreateOrUpdateCategoryResponse {
      create_or_update_category: Category::new(id, title),
    }
  }

  #[test]
  fn test_create_into_empty_list() {
    let mut cache = QueryCache::in_memory();
    seed(&mut cache, vec![]);

    categories::update_cache_after_create(&mut cache, &created(5, "X"));

    assert_eq!(cached_categories(&cache), Some(vec![Category::new(5, "X")]));
  }

  #[test]
  fn test_create_inserts_at_head_once() {
    let mut cache = QueryCache::in_memory();
    seed(&mut cache, vec![Category::new(1, "A"), Category::new(5, "old")]);

    categories::update_cache_after_create(&mut cache, &created(5, "X"));

    assert_eq!(
      cached_categories(&cache),
      Some(vec![Category::new(5, "X"), Category::new(1, "A")])
    );
  }

  #[test]
  fn test_create_without_cached_list_is_noop() {
    let mut cache = QueryCache::in_memory();

    categories::update_cache_after_create(&mut cache, &created(5, "X"));

    assert_eq!(cached_categories(&cache), None);
    assert_eq!(cache.len(), 0);
  }

  #[test]
  fn test_update_replaces_list_entry_and_detail() {
    let mut cache = QueryCache::in_memory();
    seed(&mut cache, vec![Category::new(1, "A"), Category::new(2, "B")]);

    categories::update_cache_after_update(&mut cache, &created(2, "B2"));

    assert_eq!(
      cached_categories(&cache),
      Some(vec![Category::new(1, "A"), Category::new(2, "B2")])
    );
    let detail = cache
      .read::<GetCategoryResponse>(&ReadflowQuery::Category { id: 2 })
      .unwrap();
    assert_eq!(detail.category, Some(Category::new(2, "B2")));
  }

  #[test]
  fn test_update_is_idempotent() {
    let mut once = QueryCache::in_memory();
    let mut twice = QueryCache::in_memory();
    for cache in [&mut once, &mut twice] {
      seed(cache, vec![Category::new(1, "A"), Category::new(2, "B")]);
    }

    let result = created(2, "B2");
    categories::update_cache_after_update(&mut once, &result);
    categories::update_cache_after_update(&mut twice, &result);
    categories::update_cache_after_update(&mut twice, &result);

    assert_eq!(cached_categories(&once), cached_categories(&twice));
    assert_eq!(
      once.read::<GetCategoryResponse>(&ReadflowQuery::Category { id: 2 }),
      twice.read::<GetCategoryResponse>(&ReadflowQuery::Category { id: 2 })
    );
  }

  #[test]
  fn test_update_without_cached_list_still_writes_detail() {
    let mut cache = QueryCache::in_memory();

    categories::update_cache_after_update(&mut cache, &created(2, "B2"));

    assert_eq!(cached_categories(&cache), None);
    assert!(cache.contains(&ReadflowQuery::Category { id: 2 }));
  }

  #[test]
  fn test_delete_filters_ids() {
    let mut cache = QueryCache::in_memory();
    seed(
      &mut cache,
      (1..=4).map(|id| Category::new(id, format!("C{}", id))).collect(),
    );
    cache.write(
      &ReadflowQuery::Category { id: 2 },
      &Category::new(2, "C2").to_detail(),
    );

    let patch = categories::update_cache_after_delete(BTreeSet::from([2, 3]));
    patch(&mut cache);

    let ids: Vec<i64> = cached_categories(&cache)
      .unwrap()
      .iter()
      .map(|c| c.id)
      .collect();
    assert_eq!(ids, vec![1, 4]);
    assert!(!cache.contains(&ReadflowQuery::Category { id: 2 }));
  }

  #[test]
  fn test_delete_without_cached_list_is_noop() {
    let mut cache = QueryCache::in_memory();
    categories::update_cache_after_delete(BTreeSet::from([1]))(&mut cache);
    assert_eq!(cache.len(), 0);
  }

  fn rule(id: i64, alias: &str) -> Rule {
    Rule {
      id,
      alias: alias.to_string(),
      rule: "true".to_string(),
      priority: 0,
      category_id: Some(1),
      created_at: None,
      updated_at: None,
    }
  }

  #[test]
  fn test_rule_patches() {
    let mut cache = QueryCache::in_memory();
    cache.write(
      &ReadflowQuery::Rules,
      &GetRulesResponse {
        rules: vec![rule(1, "a"), rule(2, "b")],
      },
    );

    rules::update_cache_after_create(
      &mut cache,
      &CreateOrUpdateRuleResponse {
        create_or_update_rule: rule(3, "c"),
      },
    );
    rules::update_cache_after_update(
      &mut cache,
      &CreateOrUpdateRuleResponse {
        create_or_update_rule: rule(1, "a2"),
      },
    );
    rules::update_cache_after_delete(BTreeSet::from([2]))(&mut cache);

    let aliases: Vec<String> = cache
      .read::<GetRulesResponse>(&ReadflowQuery::Rules)
      .unwrap()
      .rules
      .into_iter()
      .map(|r| r.alias)
      .collect();
    assert_eq!(aliases, vec!["c", "a2"]);
    assert_eq!(
      cache
        .read::<GetRuleResponse>(&ReadflowQuery::Rule { id: 1 })
        .unwrap()
        .rule
        .unwrap()
        .alias,
      "a2"
    );
  }

  fn article(id: i64, category: Option<(i64, &str)>) -> Article {
    Article {
      id,
      title: format!("article {}", id),
      text: None,
      html: None,
      url: None,
      image: None,
      category: category.map(|(id, title)| CategoryRef {
        id,
        title: title.to_string(),
      }),
      status: ArticleStatus::Unread,
      published_at: None,
      created_at: None,
      updated_at: None,
    }
  }

  fn page(entries: Vec<Article>) -> GetArticlesResponse {
    GetArticlesResponse {
      articles: ArticlePage {
        total_count: entries.len() as u64,
        end_cursor: None,
        has_next: false,
        entries,
      },
    }
  }

  fn articles_key(category: Option<i64>, status: ArticleStatus) -> ReadflowQuery {
    ReadflowQuery::Articles { category, status }
  }

  #[test]
  fn test_update_retitles_category_in_cached_articles() {
    let mut cache = QueryCache::in_memory();
    cache.write(
      &articles_key(None, ArticleStatus::Unread),
      &page(vec![article(1, Some((2, "B"))), article(2, Some((3, "C")))]),
    );
    cache.write(
      &articles_key(Some(2), ArticleStatus::Read),
      &page(vec![article(3, Some((2, "B")))]),
    );
    cache.write(
      &ReadflowQuery::Article { id: 1 },
      &GetArticleResponse {
        article: Some(article(1, Some((2, "B")))),
      },
    );

    categories::update_cache_after_update(&mut cache, &created(2, "B2"));

    let titles = |key: &ReadflowQuery| -> Vec<Option<String>> {
      cache
        .read::<GetArticlesResponse>(key)
        .unwrap()
        .articles
        .entries
        .into_iter()
        .map(|a| a.category.map(|c| c.title))
        .collect()
    };
    assert_eq!(
      titles(&articles_key(None, ArticleStatus::Unread)),
      vec![Some("B2".to_string()), Some("C".to_string())]
    );
    assert_eq!(
      titles(&articles_key(Some(2), ArticleStatus::Read)),
      vec![Some("B2".to_string())]
    );
    let detail = cache
      .read::<GetArticleResponse>(&ReadflowQuery::Article { id: 1 })
      .unwrap();
    assert_eq!(detail.article.unwrap().category.unwrap().title, "B2");
  }

  #[test]
  fn test_delete_drops_results_referring_to_category() {
    let mut cache = QueryCache::in_memory();
    seed(&mut cache, vec![Category::new(2, "B"), Category::new(3, "C")]);
    cache.write(
      &articles_key(Some(2), ArticleStatus::Unread),
      &page(vec![]),
    );
    cache.write(
      &articles_key(None, ArticleStatus::Unread),
      &page(vec![article(1, Some((2, "B")))]),
    );
    cache.write(
      &articles_key(None, ArticleStatus::Read),
      &page(vec![article(5, Some((3, "C")))]),
    );
    cache.write(
      &ReadflowQuery::Article { id: 1 },
      &GetArticleResponse {
        article: Some(article(1, Some((2, "B")))),
      },
    );
    let mut in_two = rule(7, "r");
    in_two.category_id = Some(2);
    cache.write(
      &ReadflowQuery::Rules,
      &GetRulesResponse {
        rules: vec![in_two.clone()],
      },
    );
    cache.write(
      &ReadflowQuery::Rule { id: 7 },
      &GetRuleResponse { rule: Some(in_two) },
    );

    categories::update_cache_after_delete(BTreeSet::from([2]))(&mut cache);

    assert!(!cache.contains(&articles_key(Some(2), ArticleStatus::Unread)));
    assert!(!cache.contains(&articles_key(None, ArticleStatus::Unread)));
    assert!(!cache.contains(&ReadflowQuery::Article { id: 1 }));
    assert!(!cache.contains(&ReadflowQuery::Rules));
    assert!(!cache.contains(&ReadflowQuery::Rule { id: 7 }));
    assert!(cache.contains(&articles_key(None, ArticleStatus::Read)));
    assert_eq!(cached_categories(&cache), Some(vec![Category::new(3, "C")]));
  }
}
