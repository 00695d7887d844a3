//! Immutable, composable GraphQL selection sets.
//!
//! A [`Fetcher`] represents a selection set as a persistent chain of
//! diffs over an empty selection: adding a field, removing one, or
//! embedding another fetcher each produce a new value in O(1) and never
//! touch the old one, so fetchers are safe to share and reuse as templates.
//! Reading the [field map](Fetcher::field_map) or serializing resolves the
//! chain once per node and memoizes the result.
//!
//! Serialization is deterministic. [`Fetcher::to_fragment_string`]
//! deduplicates repeated sub-selections into named fragments keyed by a
//! content hash of their canonical text.
//!
//! Schema knowledge lives in an explicitly constructed [`TypeRegistry`];
//! composition validates field and argument names against it eagerly, so
//! invalid query text is caught at the call site, not by a server.
//!
//! ```
//! use graphql_fetcher::{TypeDef, TypeRegistry};
//!
//! let registry = TypeRegistry::builder()
//!     .register(TypeDef::new("Department").field("id").field("name"))
//!     .register(
//!         TypeDef::new("Employee")
//!             .field("id")
//!             .field("name")
//!             .field("department"),
//!     )
//!     .build()?;
//!
//! let department = registry.fetcher("Department")?.field("id")?.field("name")?;
//! let employee = registry
//!     .fetcher("Employee")?
//!     .field("name")?
//!     .add_field("department", Default::default(), Some(&department))?;
//!
//! assert_eq!(employee.to_string(), "{name department {id name}}");
//! # Ok::<(), graphql_fetcher::FetcherError>(())
//! ```

mod error;
mod fetcher;
mod fragments;
mod json;
mod meta;
mod render;
mod resolve;

pub use error::FetcherError;
pub use fetcher::{Arguments, Fetcher, VariableRef};
pub use meta::{FetchableType, FieldMeta, TypeDef, TypeRegistry, TypeRegistryBuilder};
pub use resolve::FetcherField;
