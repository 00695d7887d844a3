//! Lazy resolution of a fetcher chain into its effective field map.
//!
//! A chain is resolved bottom-up: each node's view is its predecessor's
//! memoized view plus one delta. The first resolution of a chain therefore
//! costs one pass over it; afterwards every node answers from its own
//! cache. Caches are fill-once (`OnceLock`): concurrent first readers may
//! compute the same value redundantly, but exactly one result is ever
//! stored per node and no lock outlives the node.

use std::sync::Arc;

use indexmap::{IndexMap, IndexSet};

use crate::fetcher::{Arguments, Delta, Fetcher, Node};
use crate::meta::FetchableType;

/// One entry of the resolved field map: the field's argument bindings plus
/// its child fetchers. More than one child occurs when per-concrete-type
/// sub-selections were merged onto the same field.
#[derive(Debug, Clone)]
pub struct FetcherField {
    pub(crate) args: Arguments,
    pub(crate) children: Vec<Fetcher>,
    /// Set when the field was introduced solely by the embedded fragment at
    /// this index of [`Resolved::spreads`]; serialization bookkeeping only.
    pub(crate) spread: Option<usize>,
}

impl FetcherField {
    pub fn args(&self) -> &Arguments {
        &self.args
    }

    pub fn child_fetchers(&self) -> &[Fetcher] {
        &self.children
    }
}

impl PartialEq for FetcherField {
    fn eq(&self, other: &Self) -> bool {
        // The spread tag tracks where a field came from, not what it
        // selects; content equality ignores it.
        self.args == other.args && self.children == other.children
    }
}

impl Eq for FetcherField {}

/// A fragment embedded at this nesting level, remembered so serialization
/// can re-extract it even though its fields were flattened into the map.
#[derive(Debug, Clone)]
pub(crate) struct SpreadRecord {
    pub(crate) name: Option<String>,
    pub(crate) child: Fetcher,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct Resolved {
    pub(crate) fields: IndexMap<String, FetcherField>,
    pub(crate) explicit_variables: IndexSet<String>,
    pub(crate) implicit_variables: IndexMap<String, String>,
    pub(crate) spreads: Vec<SpreadRecord>,
}

/// Memoized resolution of a node: computed at most once, then shared.
pub(crate) fn resolved_of(node: &Arc<Node>) -> &Resolved {
    let resolved = node.resolved.get_or_init(|| {
        tracing::trace!(
            type_name = node.fetchable.name(),
            "resolving fetcher field map"
        );
        Arc::new(Resolved::compute(node))
    });
    resolved.as_ref()
}

impl Resolved {
    fn compute(node: &Arc<Node>) -> Resolved {
        let mut resolved = match &node.prev {
            Some(prev) => resolved_of(prev).clone(),
            None => Resolved::default(),
        };
        match &node.delta {
            None => {}
            Some(Delta::Field { name, args, child }) => {
                resolved.upsert(name, args, child.as_slice(), None);
            }
            Some(Delta::Remove { name }) => {
                // Position is forgotten: re-adding later appends at the end.
                resolved.fields.shift_remove(name);
            }
            Some(Delta::Fragment { child, name }) => {
                let spread = resolved.spreads.len();
                resolved.spreads.push(SpreadRecord {
                    name: name.clone(),
                    child: child.clone(),
                });
                for (field_name, field) in &child.resolved().fields {
                    // Only fields the owning type can resolve merge in; a
                    // subtype fragment contributes its shared fields only.
                    if node.fetchable.field(field_name).is_none() {
                        continue;
                    }
                    resolved.upsert(field_name, &field.args, &field.children, Some(spread));
                }
            }
        }
        resolved.collect_variables(&node.fetchable);
        resolved
    }

    fn upsert(&mut self, name: &str, args: &Arguments, children: &[Fetcher], spread: Option<usize>) {
        match self.fields.get_mut(name) {
            Some(existing) => {
                existing.args = args.clone();
                for child in children {
                    merge_child(&mut existing.children, child);
                }
                // Re-adding a field directly, or from a second fragment,
                // unties it from the fragment that first introduced it.
                existing.spread = None;
            }
            None => {
                self.fields.insert(
                    name.to_string(),
                    FetcherField {
                        args: args.clone(),
                        children: children.to_vec(),
                        spread,
                    },
                );
            }
        }
    }

    /// Variable sets are recomputed from the final field map rather than
    /// carried incrementally, so removed fields do not leak variables.
    fn collect_variables(&mut self, fetchable: &FetchableType) {
        self.explicit_variables = IndexSet::new();
        self.implicit_variables = IndexMap::new();
        let fields = std::mem::take(&mut self.fields);
        for (name, field) in &fields {
            let meta = fetchable.field(name);
            for (argument, value) in &field.args {
                match value {
                    crate::fetcher::VariableRef::Implicit => {
                        if let Some(ty) = meta.and_then(|m| m.arg_type(argument)) {
                            self.implicit_variables
                                .entry(argument.clone())
                                .or_insert_with(|| ty.to_string());
                        }
                    }
                    crate::fetcher::VariableRef::Named(variable) => {
                        self.explicit_variables.insert(variable.clone());
                    }
                }
            }
            for child in &field.children {
                let child_resolved = child.resolved();
                for variable in &child_resolved.explicit_variables {
                    self.explicit_variables.insert(variable.clone());
                }
                for (variable, ty) in &child_resolved.implicit_variables {
                    self.implicit_variables
                        .entry(variable.clone())
                        .or_insert_with(|| ty.clone());
                }
            }
        }
        self.fields = fields;
    }

    /// Whether every field of the embedded fragment at `spread` is still
    /// present and still attributed to it, i.e. the fragment could be
    /// rendered as a spread without changing the selection.
    pub(crate) fn spread_is_intact(&self, spread: usize) -> bool {
        let child = &self.spreads[spread].child;
        child.resolved().fields.keys().all(|name| {
            self.fields
                .get(name)
                .is_some_and(|field| field.spread == Some(spread))
        })
    }
}

fn merge_child(children: &mut Vec<Fetcher>, child: &Fetcher) {
    let type_name = child.fetchable_type().name();
    match children
        .iter_mut()
        .find(|existing| existing.fetchable_type().name() == type_name)
    {
        Some(existing) => {
            let merged = existing.push(Delta::Fragment {
                child: child.clone(),
                name: None,
            });
            *existing = merged;
        }
        None => children.push(child.clone()),
    }
}
