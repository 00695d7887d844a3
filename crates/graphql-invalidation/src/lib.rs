//! Maps entity change events onto the fetcher shapes they invalidate.
//!
//! A caller registers fetcher shapes as *watchers* (a live query, a cached
//! result, a subscription). The manager walks each shape's resolved field
//! map once, to full depth, and records which `(type, field)` pairs it
//! reads and which entity types it reaches through association fields.
//! When an external change source delivers a [`ChangeEvent`], the manager
//! reports which watchers must be considered stale. It never re-fetches and
//! never mutates cached data; notification is its whole job.
//!
//! Watcher state is shared mutable state behind one `RwLock`: registration
//! and unregistration serialize against each other and against dispatch,
//! and once `unregister` returns the watcher is never reported again.

mod event;

use std::collections::HashSet;
use std::sync::RwLock;

use graphql_fetcher::Fetcher;

pub use event::{ChangeEvent, ChangeType, ChangedKey, Variables};

/// Handle to a registered watcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WatcherId(u64);

#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("change event is missing a type name")]
    MissingTypeName,
}

/// One field read by a watcher, at any nesting depth of its shape.
#[derive(Debug)]
struct FieldEntry {
    type_name: String,
    field_name: String,
    /// Argument names the field was selected with; used to project variable
    /// values when matching parameterized changed keys.
    arg_names: Vec<String>,
}

#[derive(Debug)]
struct Watcher {
    root_type: String,
    variables: Option<Variables>,
    entries: Vec<FieldEntry>,
    /// Every entity type the shape touches: the root plus the owning type
    /// of each embedded sub-selection. Association edges resolve here, so
    /// changes to a child entity reach watchers embedding it.
    reachable_types: HashSet<String>,
}

#[derive(Debug, Default)]
struct ManagerState {
    watchers: Vec<(u64, Watcher)>,
    next_id: u64,
}

/// The dependency/invalidation manager. See the crate docs.
#[derive(Debug, Default)]
pub struct DependencyManager {
    state: RwLock<ManagerState>,
}

impl DependencyManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a fetcher shape, with the variable values it was executed
    /// with when known. Shapes registered without variables match
    /// parameterized changed keys regardless of values.
    pub fn register(&self, fetcher: &Fetcher, variables: Option<Variables>) -> WatcherId {
        let mut entries = Vec::new();
        let mut reachable_types = HashSet::new();
        walk(fetcher, &mut entries, &mut reachable_types);
        let watcher = Watcher {
            root_type: fetcher.fetchable_type().name().to_string(),
            variables,
            entries,
            reachable_types,
        };

        let mut state = self.state.write().unwrap_or_else(|e| e.into_inner());
        let id = state.next_id;
        state.next_id += 1;
        tracing::debug!(
            watcher = id,
            root_type = %watcher.root_type,
            fields = watcher.entries.len(),
            "registered watcher"
        );
        state.watchers.push((id, watcher));
        WatcherId(id)
    }

    /// Removes a watcher. Returns whether it was still registered. After
    /// this returns, no later `notify` call reports the id; a notification
    /// already in progress is not interrupted.
    pub fn unregister(&self, id: WatcherId) -> bool {
        let mut state = self.state.write().unwrap_or_else(|e| e.into_inner());
        let before = state.watchers.len();
        state.watchers.retain(|(watcher_id, _)| *watcher_id != id.0);
        let removed = state.watchers.len() < before;
        tracing::debug!(watcher = id.0, removed, "unregistered watcher");
        removed
    }

    /// Reports which watchers a change event affects, in registration
    /// order. Events for types no watcher reaches are a no-op.
    pub fn notify(&self, event: &ChangeEvent) -> Result<Vec<WatcherId>, NotifyError> {
        if event.type_name.is_empty() {
            return Err(NotifyError::MissingTypeName);
        }
        let state = self.state.read().unwrap_or_else(|e| e.into_inner());
        let affected = state
            .watchers
            .iter()
            .filter(|(_, watcher)| is_affected(watcher, event))
            .map(|(id, _)| WatcherId(*id))
            .collect::<Vec<_>>();
        tracing::trace!(
            type_name = %event.type_name,
            affected = affected.len(),
            "dispatched change event"
        );
        Ok(affected)
    }
}

fn walk(fetcher: &Fetcher, entries: &mut Vec<FieldEntry>, reachable_types: &mut HashSet<String>) {
    let type_name = fetcher.fetchable_type().name();
    reachable_types.insert(type_name.to_string());
    for (field_name, field) in fetcher.field_map() {
        entries.push(FieldEntry {
            type_name: type_name.to_string(),
            field_name: field_name.clone(),
            arg_names: field.args().keys().cloned().collect(),
        });
        for child in field.child_fetchers() {
            walk(child, entries, reachable_types);
        }
    }
}

fn is_affected(watcher: &Watcher, event: &ChangeEvent) -> bool {
    let Some(changed_type) = event.changed_type else {
        // Root query events carry no change kind; they hit everything
        // rooted at the query type.
        return watcher.root_type == event.type_name;
    };
    if !watcher.reachable_types.contains(&event.type_name) {
        return false;
    }
    match changed_type {
        // A row appearing or disappearing can change any field-based
        // result, ordering and pagination included.
        ChangeType::Insert | ChangeType::Delete => true,
        ChangeType::Update => event.changed_keys.iter().any(|key| {
            watcher.entries.iter().any(|entry| {
                entry.type_name == event.type_name
                    && entry.field_name == key.name()
                    && variables_match(key, watcher, entry)
            })
        }),
    }
}

/// Parameterized keys match by name and by variable values, projected onto
/// the argument names the watcher selected the field with. A watcher
/// registered without variable bindings matches any values.
fn variables_match(key: &ChangedKey, watcher: &Watcher, entry: &FieldEntry) -> bool {
    let Some(key_variables) = key.variables() else {
        return true;
    };
    let Some(bindings) = &watcher.variables else {
        return true;
    };
    entry
        .arg_names
        .iter()
        .all(|arg| key_variables.get(arg) == bindings.get(arg))
}
