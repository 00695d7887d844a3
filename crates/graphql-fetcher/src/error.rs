/// Errors surfaced by fetcher composition and serialization.
///
/// All of these are synchronous and deterministic. None of them is a
/// transient condition, so there is nothing to retry: a composition error
/// means the caller used a field or type the schema does not declare, and a
/// collision error means the fragment naming itself is broken.
#[derive(Debug, thiserror::Error)]
pub enum FetcherError {
    #[error("type `{type_name}` has no field `{field}`")]
    UnknownField { type_name: String, field: String },

    #[error("field `{type_name}.{field}` does not accept argument `{argument}`")]
    UnknownArgument {
        type_name: String,
        field: String,
        argument: String,
    },

    #[error("cannot embed a fragment on `{fragment_type}` into a fetcher for `{target_type}`")]
    TypeMismatch {
        fragment_type: String,
        target_type: String,
    },

    #[error("fragment name collision between two different sub-selections: `{left}` vs `{right}`")]
    HashCollision { left: String, right: String },

    #[error("fragment name `{name}` is used for two different sub-selections")]
    DuplicateFragmentName { name: String },

    #[error("unknown fetchable type `{name}`")]
    UnknownType { name: String },

    #[error("invalid fetcher snapshot: {0}")]
    Json(#[from] serde_json::Error),
}
