//! Static entity metadata: which fields a fetchable type declares, with
//! which arguments, and which types it extends.
//!
//! The registry is built once from schema metadata and never mutated
//! afterwards. It is an explicit value passed to whoever needs it, never
//! ambient global state, so tests can supply minimal synthetic schemas.

use std::sync::Arc;

use indexmap::IndexMap;

use crate::error::FetcherError;
use crate::fetcher::Fetcher;

/// One declared field of a fetchable type.
///
/// The GraphQL type of each argument is kept as its source-text string
/// (`"Int"`, `"[ID!]!"`, ...); this crate never interprets it beyond
/// emitting it into variable declarations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldMeta {
    name: String,
    arg_types: IndexMap<String, String>,
}

impl FieldMeta {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether the field takes arguments.
    pub fn is_function(&self) -> bool {
        !self.arg_types.is_empty()
    }

    pub fn arg_types(&self) -> &IndexMap<String, String> {
        &self.arg_types
    }

    pub(crate) fn arg_type(&self, name: &str) -> Option<&str> {
        self.arg_types.get(name).map(String::as_str)
    }
}

/// A fetchable entity type: its declared fields plus back-references to the
/// types it extends. Shared by reference among every fetcher of the type.
#[derive(Debug)]
pub struct FetchableType {
    name: String,
    super_types: Vec<Arc<FetchableType>>,
    declared_fields: IndexMap<String, FieldMeta>,
}

impl FetchableType {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn super_types(&self) -> &[Arc<FetchableType>] {
        &self.super_types
    }

    pub fn declared_fields(&self) -> impl Iterator<Item = &FieldMeta> {
        self.declared_fields.values()
    }

    /// All fields of the type, inherited ones first, in declaration order.
    pub fn fields(&self) -> Vec<&FieldMeta> {
        let mut out = IndexMap::new();
        self.collect_fields(&mut out);
        out.into_values().collect()
    }

    fn collect_fields<'a>(&'a self, out: &mut IndexMap<&'a str, &'a FieldMeta>) {
        for super_type in &self.super_types {
            super_type.collect_fields(out);
        }
        for (name, meta) in &self.declared_fields {
            out.entry(name.as_str()).or_insert(meta);
        }
    }

    /// Resolves a field by name, walking supertypes in declaration order.
    pub fn field(&self, name: &str) -> Option<&FieldMeta> {
        self.declared_fields
            .get(name)
            .or_else(|| self.super_types.iter().find_map(|s| s.field(name)))
    }

    /// Reflexive, transitive supertype check: `true` when a value of
    /// `other` can stand in where `self` is expected.
    pub fn is_assignable_from(&self, other: &FetchableType) -> bool {
        self.name == other.name || other.super_types.iter().any(|s| self.is_assignable_from(s))
    }
}

/// Immutable set of [`FetchableType`]s keyed by entity name.
#[derive(Debug, Default)]
pub struct TypeRegistry {
    types: IndexMap<String, Arc<FetchableType>>,
}

impl TypeRegistry {
    pub fn builder() -> TypeRegistryBuilder {
        TypeRegistryBuilder::default()
    }

    pub fn get(&self, name: &str) -> Option<&Arc<FetchableType>> {
        self.types.get(name)
    }

    /// An empty root fetcher for the named type.
    pub fn fetcher(&self, name: &str) -> Result<Fetcher, FetcherError> {
        let fetchable = self.get(name).ok_or_else(|| FetcherError::UnknownType {
            name: name.to_string(),
        })?;
        Ok(Fetcher::new(Arc::clone(fetchable)))
    }
}

/// Declaration of one type, fed to [`TypeRegistryBuilder::register`].
#[derive(Debug)]
pub struct TypeDef {
    name: String,
    super_types: Vec<String>,
    fields: IndexMap<String, FieldMeta>,
}

impl TypeDef {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            super_types: Vec::new(),
            fields: IndexMap::new(),
        }
    }

    /// Declares a supertype by name. The supertype must be registered
    /// before any type extending it.
    pub fn implements(mut self, super_type: &str) -> Self {
        self.super_types.push(super_type.to_string());
        self
    }

    pub fn field(self, name: &str) -> Self {
        self.field_with_args(name, [])
    }

    pub fn field_with_args<'a>(
        mut self,
        name: &str,
        args: impl IntoIterator<Item = (&'a str, &'a str)>,
    ) -> Self {
        let arg_types = args
            .into_iter()
            .map(|(arg, ty)| (arg.to_string(), ty.to_string()))
            .collect();
        self.fields.insert(
            name.to_string(),
            FieldMeta {
                name: name.to_string(),
                arg_types,
            },
        );
        self
    }
}

#[derive(Debug, Default)]
pub struct TypeRegistryBuilder {
    defs: Vec<TypeDef>,
}

impl TypeRegistryBuilder {
    pub fn register(mut self, def: TypeDef) -> Self {
        self.defs.push(def);
        self
    }

    /// Resolves supertype references and freezes the registry. Fails with
    /// [`FetcherError::UnknownType`] when a supertype name has not been
    /// registered earlier in the declaration order.
    pub fn build(self) -> Result<TypeRegistry, FetcherError> {
        let mut types: IndexMap<String, Arc<FetchableType>> = IndexMap::new();
        for def in self.defs {
            let super_types = def
                .super_types
                .iter()
                .map(|name| {
                    types
                        .get(name)
                        .cloned()
                        .ok_or_else(|| FetcherError::UnknownType { name: name.clone() })
                })
                .collect::<Result<Vec<_>, _>>()?;
            let fetchable = FetchableType {
                name: def.name.clone(),
                super_types,
                declared_fields: def.fields,
            };
            types.insert(def.name, Arc::new(fetchable));
        }
        Ok(TypeRegistry { types })
    }
}
