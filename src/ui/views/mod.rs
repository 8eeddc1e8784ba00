mod article_detail;
mod article_list;
mod category_form;
mod category_list;
mod rule_form;
mod rule_list;

pub use article_detail::ArticleDetailView;
pub use article_list::ArticleListView;
pub use category_form::CategoryFormView;
pub use category_list::CategoryListView;
pub use rule_form::RuleFormView;
pub use rule_list::RuleListView;
