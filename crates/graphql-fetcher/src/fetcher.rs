//! The persistent fetcher chain.
//!
//! A fetcher is a handle onto an immutable, singly linked chain of nodes:
//! each node references the previous fetcher plus one delta (a field added,
//! a field removed, or an embedded fragment). Composition never mutates an
//! existing node, so any fetcher can be shared freely and used as a template
//! for many variants. Every composing operation is O(1); the effective field
//! map is resolved lazily and memoized per node.

use std::hash::{Hash, Hasher};
use std::sync::{Arc, OnceLock};

use indexmap::{IndexMap, IndexSet};

use crate::error::FetcherError;
use crate::meta::FetchableType;
use crate::render;
use crate::resolve::{resolved_of, FetcherField, Resolved};

/// How an argument value is bound. Values are never embedded as literals in
/// serialized text; both forms render as a GraphQL variable reference, and
/// the variable declarations belong to whoever interpolates the text into a
/// full operation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum VariableRef {
    /// `$<argument name>`, with its type inferred from the field
    /// declaration and reported through `implicit_variable_map`.
    Implicit,
    /// An explicit `$name` the caller passes through unresolved at this
    /// level, reported through `explicit_variable_names`.
    Named(String),
}

pub type Arguments = IndexMap<String, VariableRef>;

#[derive(Debug)]
pub(crate) enum Delta {
    Field {
        name: String,
        args: Arguments,
        child: Option<Fetcher>,
    },
    Remove {
        name: String,
    },
    Fragment {
        child: Fetcher,
        name: Option<String>,
    },
}

#[derive(Debug)]
pub(crate) struct Node {
    pub(crate) fetchable: Arc<FetchableType>,
    pub(crate) prev: Option<Arc<Node>>,
    /// `None` only on a root node, which denotes the empty selection.
    pub(crate) delta: Option<Delta>,
    pub(crate) resolved: OnceLock<Arc<Resolved>>,
}

/// An immutable GraphQL selection set under construction.
///
/// Cloning is cheap: the chain is shared, never copied. Equality and
/// hashing are defined over the resolved field-map content, not the chain
/// shape, so two differently built fetchers that select the same fields are
/// interchangeable as cache keys.
#[derive(Debug, Clone)]
pub struct Fetcher {
    pub(crate) node: Arc<Node>,
}

impl Fetcher {
    pub(crate) fn new(fetchable: Arc<FetchableType>) -> Self {
        Self {
            node: Arc::new(Node {
                fetchable,
                prev: None,
                delta: None,
                resolved: OnceLock::new(),
            }),
        }
    }

    pub fn fetchable_type(&self) -> &Arc<FetchableType> {
        &self.node.fetchable
    }

    pub(crate) fn push(&self, delta: Delta) -> Fetcher {
        Fetcher {
            node: Arc::new(Node {
                fetchable: Arc::clone(&self.node.fetchable),
                prev: Some(Arc::clone(&self.node)),
                delta: Some(delta),
                resolved: OnceLock::new(),
            }),
        }
    }

    /// Selects a field without arguments or a sub-selection.
    pub fn field(&self, name: &str) -> Result<Fetcher, FetcherError> {
        self.add_field(name, Arguments::new(), None)
    }

    /// Selects a field, optionally with arguments and a child fetcher for
    /// its sub-selection. Adding a field that is already selected replaces
    /// its arguments and merges the child; the field keeps its position.
    pub fn add_field(
        &self,
        name: &str,
        args: Arguments,
        child: Option<&Fetcher>,
    ) -> Result<Fetcher, FetcherError> {
        let fetchable = &self.node.fetchable;
        let meta = fetchable
            .field(name)
            .ok_or_else(|| FetcherError::UnknownField {
                type_name: fetchable.name().to_string(),
                field: name.to_string(),
            })?;
        for argument in args.keys() {
            if meta.arg_type(argument).is_none() {
                return Err(FetcherError::UnknownArgument {
                    type_name: fetchable.name().to_string(),
                    field: name.to_string(),
                    argument: argument.clone(),
                });
            }
        }
        Ok(self.push(Delta::Field {
            name: name.to_string(),
            args,
            child: child.cloned(),
        }))
    }

    /// Removes a field from the effective selection. The name must be
    /// declared on the owning type; removing a declared field that is not
    /// currently selected is a tolerated no-op, so removal is idempotent.
    pub fn remove_field(&self, name: &str) -> Result<Fetcher, FetcherError> {
        let fetchable = &self.node.fetchable;
        if fetchable.field(name).is_none() {
            return Err(FetcherError::UnknownField {
                type_name: fetchable.name().to_string(),
                field: name.to_string(),
            });
        }
        Ok(self.push(Delta::Remove {
            name: name.to_string(),
        }))
    }

    /// Merges another fetcher's selection into this one, field by field, as
    /// if each field had been added individually. The embedded fetcher's
    /// owning type must equal this fetcher's or be related to it through
    /// the supertype relation; in the subtype-into-supertype direction only
    /// the shared fields merge.
    ///
    /// With a `fragment_name`, `to_fragment_string` extracts the embedded
    /// selection as a named fragment even if it occurs only once.
    pub fn add_embeddable(
        &self,
        child: &Fetcher,
        fragment_name: Option<&str>,
    ) -> Result<Fetcher, FetcherError> {
        let target = &self.node.fetchable;
        let fragment_type = child.fetchable_type();
        if !target.is_assignable_from(fragment_type) && !fragment_type.is_assignable_from(target) {
            return Err(FetcherError::TypeMismatch {
                fragment_type: fragment_type.name().to_string(),
                target_type: target.name().to_string(),
            });
        }
        Ok(self.push(Delta::Fragment {
            child: child.clone(),
            name: fragment_name.map(str::to_string),
        }))
    }

    /// The effective selection: field name to arguments and child
    /// fetchers, in oldest-first declaration order. Resolved once per node
    /// and cached.
    pub fn field_map(&self) -> &IndexMap<String, FetcherField> {
        &self.resolved().fields
    }

    /// Variable names the caller declared as pass-through, in first-use
    /// order, accumulated through child fetchers.
    pub fn explicit_variable_names(&self) -> &IndexSet<String> {
        &self.resolved().explicit_variables
    }

    /// Variable name to GraphQL type string, inferred from the argument
    /// positions actually used, accumulated through child fetchers.
    pub fn implicit_variable_map(&self) -> &IndexMap<String, String> {
        &self.resolved().implicit_variables
    }

    /// Number of nodes in the chain, root included. Composition appends
    /// exactly one node per call, which this exposes for diagnostics.
    pub fn chain_length(&self) -> usize {
        let mut len = 1;
        let mut node = &self.node;
        while let Some(prev) = &node.prev {
            len += 1;
            node = prev;
        }
        len
    }

    pub(crate) fn resolved(&self) -> &Resolved {
        resolved_of(&self.node)
    }
}

impl PartialEq for Fetcher {
    fn eq(&self, other: &Self) -> bool {
        if Arc::ptr_eq(&self.node, &other.node) {
            return true;
        }
        if self.fetchable_type().name() != other.fetchable_type().name() {
            return false;
        }
        // Order-sensitive: the field map's order is part of the query text.
        let left = &self.resolved().fields;
        let right = &other.resolved().fields;
        left.len() == right.len()
            && left
                .iter()
                .zip(right)
                .all(|((left_name, left_field), (right_name, right_field))| {
                    left_name == right_name && left_field == right_field
                })
    }
}

impl Eq for Fetcher {}

impl Hash for Fetcher {
    fn hash<H: Hasher>(&self, state: &mut H) {
        // The canonical text is a pure function of the resolved content, so
        // equal fetchers hash equally regardless of chain shape.
        self.fetchable_type().name().hash(state);
        render::inline(self).hash(state);
    }
}
