//! A dynamic, attribute-bag record.
//!
//! Used by the in-memory store and the mock store. Applications with their own model types
//! implement [`Model`] for those instead.

use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};

use crate::framework::model::{Attributes, Model, ValidationErrors};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    model: String,
    id: Option<String>,
    #[serde(default)]
    attributes: Attributes,
    #[serde(default, skip_serializing_if = "ValidationErrors::is_empty")]
    errors: ValidationErrors,
}

impl Record {
    /// A persisted record.
    pub fn new(model: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            id: Some(id.into()),
            attributes: Attributes::new(),
            errors: ValidationErrors::new(),
        }
    }

    /// A record that has not been saved yet.
    pub fn unsaved(model: impl Into<String>, attributes: Attributes) -> Self {
        Self {
            model: model.into(),
            id: None,
            attributes,
            errors: ValidationErrors::new(),
        }
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    pub fn with_errors(mut self, errors: ValidationErrors) -> Self {
        self.errors = errors;
        self
    }

    pub fn attribute(&self, key: &str) -> Option<&serde_json::Value> {
        self.attributes.get(key)
    }

    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    /// Merges `attrs` over the current attributes.
    pub fn assign(&mut self, attrs: Attributes) {
        self.attributes.extend(attrs);
    }

    pub fn set_id(&mut self, id: impl Into<String>) {
        self.id = Some(id.into());
    }

    pub fn set_errors(&mut self, errors: ValidationErrors) {
        self.errors = errors;
    }

    pub fn is_persisted(&self) -> bool {
        self.id.is_some()
    }
}

impl Model for Record {
    fn model_name(&self) -> &str {
        &self.model
    }

    fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    fn errors(&self) -> &ValidationErrors {
        &self.errors
    }
}

impl Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.id {
            Some(id) => write!(f, "{}#{}", self.model, id),
            None => write!(f, "{}#new", self.model),
        }
    }
}
