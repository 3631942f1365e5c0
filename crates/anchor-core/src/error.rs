//! Error taxonomy for graph construction.

/// Errors from node construction and the graph-building pipeline.
///
/// Every variant aborts the call that produced it; nothing is retried or
/// recovered internally.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GraphError {
    #[error("type mismatch for `{field}`: expected {expected}, got {found}")]
    TypeMismatch {
        field: String,
        expected: &'static str,
        found: &'static str,
    },
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("node `{0}` is already independent and cannot be split")]
    NotABundle(String),
}

impl GraphError {
    pub(crate) fn type_mismatch(
        field: impl Into<String>,
        expected: &'static str,
        found: &'static str,
    ) -> Self {
        Self::TypeMismatch {
            field: field.into(),
            expected,
            found,
        }
    }
}
