//! Inbound request snapshot and the standard action names.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::{self, Display};
use std::str::FromStr;

use crate::framework::model::Attributes;

/// The seven standard controller actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Index,
    Show,
    New,
    Edit,
    Create,
    Update,
    Destroy,
}

impl Action {
    pub const ALL: [Action; 7] = [
        Action::Index,
        Action::Show,
        Action::New,
        Action::Edit,
        Action::Create,
        Action::Update,
        Action::Destroy,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Index => "index",
            Action::Show => "show",
            Action::New => "new",
            Action::Edit => "edit",
            Action::Create => "create",
            Action::Update => "update",
            Action::Destroy => "destroy",
        }
    }

    /// Actions that operate on an existing member and need its id.
    pub fn is_member(&self) -> bool {
        matches!(
            self,
            Action::Show | Action::Edit | Action::Update | Action::Destroy
        )
    }
}

impl Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Action {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Action::ALL
            .into_iter()
            .find(|action| action.as_str() == s)
            .ok_or_else(|| format!("unknown action `{s}`"))
    }
}

/// Immutable snapshot of what the dispatch layer received.
///
/// `params` are the flat routing/query parameters (`store_id`, `id`, ...). `payload` holds
/// the nested attribute hashes keyed by the resource payload key (`employee => {...}`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RequestContext {
    #[serde(default)]
    params: BTreeMap<String, String>,
    #[serde(default)]
    payload: BTreeMap<String, Attributes>,
}

impl RequestContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    pub fn payload(mut self, key: impl Into<String>, attrs: Attributes) -> Self {
        self.payload.insert(key.into(), attrs);
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.params.contains_key(key)
    }

    /// Attributes sent under `key`; an empty set when nothing was sent.
    pub fn attributes(&self, key: &str) -> Attributes {
        self.payload.get(key).cloned().unwrap_or_default()
    }

    pub fn params(&self) -> &BTreeMap<String, String> {
        &self.params
    }
}

impl<K, V> FromIterator<(K, V)> for RequestContext
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        iter.into_iter()
            .fold(RequestContext::new(), |req, (k, v)| req.param(k, v))
    }
}
