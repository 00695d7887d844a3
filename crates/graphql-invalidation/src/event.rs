//! The change-event wire contract.
//!
//! Events are produced by an external change-data source (a mutation
//! layer, a subscription feed); this crate only consumes them. The JSON
//! field names `typeName`, `id`, `changedType` and `changedKeys` are part
//! of that contract and must not change.

use serde_json::Value;

pub type Variables = serde_json::Map<String, Value>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ChangeType {
    Insert,
    Update,
    Delete,
}

/// A reference to one changed field: either a bare name or, for
/// parameterized fields, the name plus the variable values the field was
/// evaluated with.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(untagged)]
pub enum ChangedKey {
    Name(String),
    Parameterized { name: String, variables: Variables },
}

impl ChangedKey {
    pub fn name(&self) -> &str {
        match self {
            ChangedKey::Name(name) => name,
            ChangedKey::Parameterized { name, .. } => name,
        }
    }

    pub fn variables(&self) -> Option<&Variables> {
        match self {
            ChangedKey::Name(_) => None,
            ChangedKey::Parameterized { variables, .. } => Some(variables),
        }
    }
}

/// One committed change to an entity. `id` and `changedType` are absent
/// for events on the synthetic root query type.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ChangeEvent {
    #[serde(rename = "typeName")]
    pub type_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    #[serde(
        rename = "changedType",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub changed_type: Option<ChangeType>,
    #[serde(rename = "changedKeys", default)]
    pub changed_keys: Vec<ChangedKey>,
}

impl ChangeEvent {
    /// An insert/update/delete of one entity row.
    pub fn row(type_name: &str, id: Value, changed_type: ChangeType) -> Self {
        Self {
            type_name: type_name.to_string(),
            id: Some(id),
            changed_type: Some(changed_type),
            changed_keys: Vec::new(),
        }
    }

    /// An event on the root query type itself.
    pub fn query_root(type_name: &str) -> Self {
        Self {
            type_name: type_name.to_string(),
            id: None,
            changed_type: None,
            changed_keys: Vec::new(),
        }
    }

    pub fn with_changed_key(mut self, name: &str) -> Self {
        self.changed_keys.push(ChangedKey::Name(name.to_string()));
        self
    }

    pub fn with_parameterized_key(mut self, name: &str, variables: Variables) -> Self {
        self.changed_keys.push(ChangedKey::Parameterized {
            name: name.to_string(),
            variables,
        });
        self
    }
}
