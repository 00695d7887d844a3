//! Content-hash fragment naming.
//!
//! A sub-selection's canonical text (`on <Type> <inline rendering>`,
//! whitespace-normal by construction) is hashed with blake3; the first
//! eight hex characters name the fragment, `<Type>_<hash>`, unless the
//! caller supplied an explicit name. Structurally identical sub-selections
//! therefore collapse onto one definition no matter where they occur.
//!
//! Two different canonical texts ending up under one name means the naming
//! scheme itself is broken; that is surfaced as a fatal
//! [`FetcherError::HashCollision`], never silently merged.

use std::collections::HashMap;

use indexmap::IndexMap;

use crate::error::FetcherError;
use crate::fetcher::Fetcher;
use crate::render;

#[derive(Debug)]
pub(crate) struct FragmentEntry {
    pub(crate) name: String,
    pub(crate) child: Fetcher,
    pub(crate) count: usize,
    pub(crate) explicit: bool,
}

/// Occurrence table for one `to_fragment_string` call, keyed by canonical
/// text in first-occurrence order.
#[derive(Debug, Default)]
pub(crate) struct FragmentTable {
    entries: IndexMap<String, FragmentEntry>,
    names: HashMap<String, String>,
}

impl FragmentTable {
    pub(crate) fn canonical(child: &Fetcher) -> String {
        format!("on {} {}", child.fetchable_type().name(), render::inline(child))
    }

    /// Records one occurrence of a sub-selection. The first recording fixes
    /// the fragment's name; an explicit name marks it for extraction
    /// regardless of how often it occurs.
    pub(crate) fn record(
        &mut self,
        child: &Fetcher,
        explicit_name: Option<&str>,
    ) -> Result<(), FetcherError> {
        let canonical = Self::canonical(child);
        if let Some(entry) = self.entries.get_mut(&canonical) {
            entry.count += 1;
            entry.explicit |= explicit_name.is_some();
            return Ok(());
        }

        let name = match explicit_name {
            Some(name) => name.to_string(),
            None => auto_name(child.fetchable_type().name(), &canonical),
        };
        if let Some(existing) = self.names.get(&name) {
            if existing != &canonical {
                return if explicit_name.is_some() {
                    Err(FetcherError::DuplicateFragmentName { name })
                } else {
                    Err(FetcherError::HashCollision {
                        left: existing.clone(),
                        right: canonical,
                    })
                };
            }
        }
        self.names.insert(name.clone(), canonical.clone());
        self.entries.insert(
            canonical,
            FragmentEntry {
                name,
                child: child.clone(),
                count: 1,
                explicit: explicit_name.is_some(),
            },
        );
        Ok(())
    }

    pub(crate) fn is_extracted(&self, child: &Fetcher) -> bool {
        self.entries
            .get(&Self::canonical(child))
            .is_some_and(|entry| entry.explicit || entry.count >= 2)
    }

    pub(crate) fn name_of(&self, child: &Fetcher) -> Option<&str> {
        self.entries
            .get(&Self::canonical(child))
            .map(|entry| entry.name.as_str())
    }

    /// Extracted fragments in first-occurrence order.
    pub(crate) fn extracted(&self) -> impl Iterator<Item = &FragmentEntry> {
        self.entries
            .values()
            .filter(|entry| entry.explicit || entry.count >= 2)
    }
}

fn auto_name(type_name: &str, canonical: &str) -> String {
    let hash = blake3::hash(canonical.as_bytes());
    format!("{type_name}_{}", &hash.to_hex().as_str()[..8])
}
