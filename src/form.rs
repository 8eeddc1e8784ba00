//! Typed form state.
//!
//! A form is a plain record of field values plus a map from field name to a
//! validator over that record.

use std::collections::BTreeMap;

/// Shown when a submit is attempted with invalid fields
pub const INVALID_FORM_MESSAGE: &str = "Please fill out correctly the mandatory fields.";

/// Checks one field of the record
pub type Validator<F> = fn(&F) -> bool;

#[derive(Debug, Clone)]
pub struct FormState<F> {
  values: F,
  validators: BTreeMap<&'static str, Validator<F>>,
}

impl<F> FormState<F> {
  pub fn new(values: F) -> Self {
    Self {
      values,
      validators: BTreeMap::new(),
    }
  }

  /// Register the validator of a field
  pub fn validate(mut self, field: &'static str, validator: Validator<F>) -> Self {
    self.validators.insert(field, validator);
    self
  }

  pub fn values(&self) -> &F {
    &self.values
  }

  pub fn values_mut(&mut self) -> &mut F {
    &mut self.values
  }

  /// Whether a field currently validates. Fields without a validator always do.
  pub fn validity(&self, field: &str) -> bool {
    self
      .validators
      .get(field)
      .map(|v| v(&self.values))
      .unwrap_or(true)
  }

  pub fn is_valid(&self) -> bool {
    self.validators.values().all(|v| v(&self.values))
  }

  pub fn invalid_fields(&self) -> Vec<&'static str> {
    self
      .validators
      .iter()
      .filter(|(_, v)| !v(&self.values))
      .map(|(name, _)| *name)
      .collect()
  }
}

/// A required text value
pub fn required(value: &str) -> bool {
  !value.trim().is_empty()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[derive(Debug, Clone, Default)]
  struct Fields {
    alias: String,
    category_id: Option<i64>,
  }

  fn form(fields: Fields) -> FormState<Fields> {
    FormState::new(fields)
      .validate("alias", |f| required(&f.alias))
      .validate("category_id", |f| f.category_id.is_some())
  }

  #[test]
  fn test_empty_form_is_invalid() {
    let state = form(Fields::default());
    assert!(!state.is_valid());
    assert_eq!(state.invalid_fields(), vec!["alias", "category_id"]);
    assert!(!state.validity("alias"));
  }

  #[test]
  fn test_whitespace_is_not_a_value() {
    let state = form(Fields {
      alias: "   ".into(),
      category_id: Some(1),
    });
    assert_eq!(state.invalid_fields(), vec!["alias"]);
  }

  #[test]
  fn test_valid_after_edit() {
    let mut state = form(Fields::default());
    state.values_mut().alias = "news".into();
    state.values_mut().category_id = Some(2);
    assert!(state.is_valid());
    assert!(state.validity("unknown_field"));
  }
}
