//! Rendering of resolved field maps into GraphQL selection-set text.
//!
//! Two forms exist: the plain form (`Display`) renders every sub-selection
//! inline, and [`Fetcher::to_fragment_string`] extracts marked
//! sub-selections into named fragment definitions, replacing their inline
//! occurrences with `...Name` spreads.
//!
//! Output is deterministic: field order is the resolved field-map order,
//! whitespace is fixed, and fragment names derive from content hashes, so
//! serializing the same fetcher twice yields byte-identical text.

use std::fmt;

use itertools::Itertools;

use crate::error::FetcherError;
use crate::fetcher::{Fetcher, VariableRef};
use crate::fragments::FragmentTable;
use crate::resolve::{FetcherField, Resolved};

impl fmt::Display for Fetcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&inline(self))
    }
}

impl Fetcher {
    /// The selection-set text with every embedded sub-selection inlined.
    /// Same as `to_string()`; exists for symmetry with
    /// [`to_fragment_string`](Self::to_fragment_string).
    pub fn to_inline_string(&self) -> String {
        inline(self)
    }

    /// The selection-set text with marked sub-selections replaced by
    /// `...Name` spreads, followed by one `fragment Name on Type {...}`
    /// definition per distinct extracted sub-selection. A sub-selection is
    /// marked when it was embedded with an explicit fragment name, or when
    /// its canonical text occurs more than once anywhere in the tree.
    pub fn to_fragment_string(&self) -> Result<String, FetcherError> {
        let mut table = FragmentTable::default();
        collect(self, &mut table)?;

        let mut out = String::new();
        write_selection(&mut out, self.resolved(), Some(&table));
        for entry in table.extracted() {
            out.push_str("\nfragment ");
            out.push_str(&entry.name);
            out.push_str(" on ");
            out.push_str(entry.child.fetchable_type().name());
            out.push(' ');
            write_selection(&mut out, entry.child.resolved(), Some(&table));
        }
        Ok(out)
    }
}

/// Canonical inline rendering; also the fragment deduplicator's hash input.
pub(crate) fn inline(fetcher: &Fetcher) -> String {
    let mut out = String::new();
    write_selection(&mut out, fetcher.resolved(), None);
    out
}

/// Renders one selection set. With a fragment table, an intact extracted
/// spread renders as `...Name` where its first field sits and the rest of
/// its fields are skipped, so output order stays the field-map order;
/// without a table, everything renders inline.
fn write_selection(out: &mut String, resolved: &Resolved, table: Option<&FragmentTable>) {
    out.push('{');
    let mut first = true;
    let mut emitted_spreads = Vec::new();
    for (name, field) in &resolved.fields {
        if let Some(spread) = field.spread {
            if emitted_spreads.contains(&spread) {
                continue;
            }
            if let Some(spread_name) = extracted_name(resolved, spread, table) {
                separate(out, &mut first);
                out.push_str("...");
                out.push_str(spread_name);
                emitted_spreads.push(spread);
                continue;
            }
        }
        separate(out, &mut first);
        write_field(out, name, field, table);
    }
    // An embedded fragment with an empty selection contributes no fields and
    // so has no position; it still renders when extracted.
    for index in 0..resolved.spreads.len() {
        if emitted_spreads.contains(&index) {
            continue;
        }
        if let Some(name) = extracted_name(resolved, index, table) {
            separate(out, &mut first);
            out.push_str("...");
            out.push_str(name);
        }
    }
    out.push('}');
}

/// The fragment name to spread for the embed at `spread`, when it is both
/// intact and marked for extraction.
fn extracted_name<'t>(
    resolved: &Resolved,
    spread: usize,
    table: Option<&'t FragmentTable>,
) -> Option<&'t str> {
    let table = table?;
    if !resolved.spread_is_intact(spread) {
        return None;
    }
    let child = &resolved.spreads[spread].child;
    if table.is_extracted(child) {
        table.name_of(child)
    } else {
        None
    }
}

fn write_field(out: &mut String, name: &str, field: &FetcherField, table: Option<&FragmentTable>) {
    out.push_str(name);
    if !field.args().is_empty() {
        out.push('(');
        let rendered = field
            .args()
            .iter()
            .map(|(argument, value)| {
                let variable = match value {
                    VariableRef::Implicit => argument.as_str(),
                    VariableRef::Named(name) => name.as_str(),
                };
                format!("{argument}: ${variable}")
            })
            .join(", ");
        out.push_str(&rendered);
        out.push(')');
    }
    match field.child_fetchers() {
        [] => {}
        [child] => {
            out.push(' ');
            write_child(out, child, table);
        }
        children => {
            // A union/interface field merged with per-concrete-type
            // children: one inline type-condition fragment per variant.
            out.push_str(" {");
            for (i, child) in children.iter().enumerate() {
                if i > 0 {
                    out.push(' ');
                }
                out.push_str("... on ");
                out.push_str(child.fetchable_type().name());
                out.push(' ');
                write_child(out, child, table);
            }
            out.push('}');
        }
    }
}

fn write_child(out: &mut String, child: &Fetcher, table: Option<&FragmentTable>) {
    if let Some(name) = table.filter(|t| t.is_extracted(child)).and_then(|t| t.name_of(child)) {
        out.push_str("{...");
        out.push_str(name);
        out.push('}');
    } else {
        write_selection(out, child.resolved(), table);
    }
}

fn separate(out: &mut String, first: &mut bool) {
    if *first {
        *first = false;
    } else {
        out.push(' ');
    }
}

/// One pass over the tree in render order, counting every position a spread
/// could substitute: intact embedded fragments at each level and every
/// child sub-selection of every field, recursively.
fn collect(fetcher: &Fetcher, table: &mut FragmentTable) -> Result<(), FetcherError> {
    let resolved = fetcher.resolved();
    for (index, spread) in resolved.spreads.iter().enumerate() {
        if resolved.spread_is_intact(index) {
            table.record(&spread.child, spread.name.as_deref())?;
        }
    }
    for field in resolved.fields.values() {
        for child in field.child_fetchers() {
            table.record(child, None)?;
            collect(child, table)?;
        }
    }
    Ok(())
}
