use super::Error;

/// Error when a query names an index the schema does not define.
#[derive(Debug)]
pub(super) struct IndexNotFound {
    entity: Box<str>,
    index: Box<str>,
}

impl std::error::Error for IndexNotFound {}

impl core::fmt::Display for IndexNotFound {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(
            f,
            "index not found: `{}` is not defined on `{}`",
            self.index, self.entity
        )
    }
}

impl Error {
    /// Creates an index-not-found error.
    pub fn index_not_found(entity: impl Into<String>, index: impl Into<String>) -> Error {
        Error::from(super::ErrorKind::IndexNotFound(IndexNotFound {
            entity: entity.into().into(),
            index: index.into().into(),
        }))
    }

    /// Returns `true` if this error is an index-not-found error.
    pub fn is_index_not_found(&self) -> bool {
        self.any_kind(|kind| matches!(kind, super::ErrorKind::IndexNotFound(_)))
    }
}
