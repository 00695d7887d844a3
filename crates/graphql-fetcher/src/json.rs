//! JSON snapshots of a fetcher's resolved shape.
//!
//! The snapshot carries the owning type name plus the resolved field map
//! (argument bindings and nested children), which is exactly the content a
//! fetcher's identity is defined over. Reconstruction re-validates every
//! name against a registry, so a snapshot from a different schema fails
//! loudly instead of producing invalid query text.

use indexmap::IndexMap;

use crate::error::FetcherError;
use crate::fetcher::{Arguments, Fetcher};
use crate::meta::TypeRegistry;

#[derive(Debug, serde::Serialize, serde::Deserialize)]
struct FetcherSnapshot {
    #[serde(rename = "fetchableType")]
    fetchable_type: String,
    #[serde(rename = "fieldMap")]
    field_map: IndexMap<String, FieldSnapshot>,
}

#[derive(Debug, serde::Serialize, serde::Deserialize)]
struct FieldSnapshot {
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    args: Arguments,
    #[serde(
        rename = "childFetchers",
        default,
        skip_serializing_if = "Vec::is_empty"
    )]
    child_fetchers: Vec<FetcherSnapshot>,
}

impl Fetcher {
    /// A transmissible snapshot of the resolved shape. Round-trips through
    /// [`Fetcher::from_json`] back to an equal field map.
    pub fn to_json(&self) -> Result<String, FetcherError> {
        Ok(serde_json::to_string(&snapshot(self))?)
    }

    /// Reconstructs a fetcher from a [`to_json`](Self::to_json) snapshot,
    /// validating every type and field name against `registry`.
    pub fn from_json(registry: &TypeRegistry, text: &str) -> Result<Fetcher, FetcherError> {
        let parsed: FetcherSnapshot = serde_json::from_str(text)?;
        rebuild(registry, &parsed)
    }
}

fn snapshot(fetcher: &Fetcher) -> FetcherSnapshot {
    FetcherSnapshot {
        fetchable_type: fetcher.fetchable_type().name().to_string(),
        field_map: fetcher
            .field_map()
            .iter()
            .map(|(name, field)| {
                (
                    name.clone(),
                    FieldSnapshot {
                        args: field.args().clone(),
                        child_fetchers: field.child_fetchers().iter().map(snapshot).collect(),
                    },
                )
            })
            .collect(),
    }
}

fn rebuild(registry: &TypeRegistry, parsed: &FetcherSnapshot) -> Result<Fetcher, FetcherError> {
    let mut fetcher = registry.fetcher(&parsed.fetchable_type)?;
    for (name, field) in &parsed.field_map {
        if field.child_fetchers.is_empty() {
            fetcher = fetcher.add_field(name, field.args.clone(), None)?;
        } else {
            // Re-adding the same field once per child reproduces merged
            // per-concrete-type children in their original order.
            for child in &field.child_fetchers {
                let child = rebuild(registry, child)?;
                fetcher = fetcher.add_field(name, field.args.clone(), Some(&child))?;
            }
        }
    }
    Ok(fetcher)
}
