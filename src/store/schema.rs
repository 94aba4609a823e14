//! Relations and validations known to the memory store.

use std::collections::HashMap;

use crate::framework::error::StoreError;
use crate::framework::model::Attributes;

/// The other end of a relation and the attribute linking the two.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relation {
    pub model: String,
    pub foreign_key: String,
}

impl Relation {
    fn new(model: &str, foreign_key: &str) -> Self {
        Self {
            model: model.to_string(),
            foreign_key: foreign_key.to_string(),
        }
    }
}

/// Declares which accessors exist on which models.
///
/// ```rust
/// use resource_recipe::store::Schema;
///
/// let schema = Schema::new()
///     .has_many("factory", "employees", "employee", "factory_id")
///     .has_many("company", "employees", "employee", "company_id")
///     .belongs_to("employee", "parent", "factory", "factory_id")
///     .belongs_to("employee", "parent", "company", "company_id")
///     .validates_presence("employee", "name");
///
/// assert_eq!(schema.has_many_relation("factory", "employees").unwrap().foreign_key, "factory_id");
/// ```
#[derive(Debug, Clone, Default)]
pub struct Schema {
    has_many: HashMap<(String, String), Relation>,
    has_one: HashMap<(String, String), Relation>,
    belongs_to: HashMap<(String, String), Vec<Relation>>,
    required: HashMap<String, Vec<String>>,
}

fn key(model: &str, name: &str) -> (String, String) {
    (model.to_string(), name.to_string())
}

fn unknown(model: &str, accessor: &str) -> StoreError {
    StoreError::UnknownAssociation {
        model: model.to_string(),
        accessor: accessor.to_string(),
    }
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    /// `owner.<accessor>` lists `child` records whose `foreign_key` is the owner id.
    pub fn has_many(mut self, owner: &str, accessor: &str, child: &str, foreign_key: &str) -> Self {
        self.has_many.insert(key(owner, accessor), Relation::new(child, foreign_key));
        self
    }

    /// `owner.<accessor>` is the single `child` whose `foreign_key` is the owner id.
    pub fn has_one(mut self, owner: &str, accessor: &str, child: &str, foreign_key: &str) -> Self {
        self.has_one.insert(key(owner, accessor), Relation::new(child, foreign_key));
        self
    }

    /// `child.<association>` is the `owner` named by `foreign_key`. Declaring the same
    /// association for several owners makes it polymorphic; the first set key wins.
    pub fn belongs_to(mut self, child: &str, association: &str, owner: &str, foreign_key: &str) -> Self {
        self.belongs_to
            .entry(key(child, association))
            .or_default()
            .push(Relation::new(owner, foreign_key));
        self
    }

    pub fn validates_presence(mut self, model: &str, attribute: &str) -> Self {
        self.required
            .entry(model.to_string())
            .or_default()
            .push(attribute.to_string());
        self
    }

    pub fn has_many_relation(&self, owner: &str, accessor: &str) -> Result<&Relation, StoreError> {
        self.has_many
            .get(&key(owner, accessor))
            .ok_or_else(|| unknown(owner, accessor))
    }

    pub fn has_one_relation(&self, owner: &str, accessor: &str) -> Result<&Relation, StoreError> {
        self.has_one
            .get(&key(owner, accessor))
            .ok_or_else(|| unknown(owner, accessor))
    }

    pub fn owner_relations(&self, child: &str, association: &str) -> Result<&[Relation], StoreError> {
        self.belongs_to
            .get(&key(child, association))
            .map(Vec::as_slice)
            .ok_or_else(|| unknown(child, association))
    }

    /// Attributes of `model` that must be present and non-blank.
    pub fn required(&self, model: &str) -> &[String] {
        self.required.get(model).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Names of the required attributes missing from `attrs`.
    pub fn blank_attributes<'a>(&'a self, model: &str, attrs: &Attributes) -> Vec<&'a str> {
        self.required(model)
            .iter()
            .filter(|attribute| match attrs.get(attribute.as_str()) {
                None | Some(serde_json::Value::Null) => true,
                Some(serde_json::Value::String(s)) => s.trim().is_empty(),
                Some(_) => false,
            })
            .map(String::as_str)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_polymorphic_owner_relations_keep_declaration_order() {
        let schema = Schema::new()
            .belongs_to("photo", "parent", "user", "user_id")
            .belongs_to("photo", "parent", "task", "task_id");

        let owners = schema.owner_relations("photo", "parent").unwrap();

        let models: Vec<&str> = owners.iter().map(|r| r.model.as_str()).collect();
        assert_eq!(models, vec!["user", "task"]);
    }

    #[test]
    fn test_unknown_accessor() {
        let schema = Schema::new();
        assert_eq!(
            schema.has_one_relation("store", "manager"),
            Err(StoreError::UnknownAssociation {
                model: "store".into(),
                accessor: "manager".into()
            })
        );
    }

    #[test]
    fn test_blank_attributes() {
        let schema = Schema::new()
            .validates_presence("manager", "name")
            .validates_presence("manager", "email");

        let mut attrs = Attributes::new();
        attrs.insert("name".into(), json!("  "));
        attrs.insert("email".into(), json!("ann@example.com"));

        assert_eq!(schema.blank_attributes("manager", &attrs), vec!["name"]);
        assert!(schema.blank_attributes("store", &attrs).is_empty());
    }
}
