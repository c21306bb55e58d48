use super::Error;

/// Error when the entity registry has no collection registered under a name.
#[derive(Debug)]
pub(super) struct CollectionNotFound {
    name: Box<str>,
}

impl std::error::Error for CollectionNotFound {}

impl core::fmt::Display for CollectionNotFound {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(f, "collection not found: {}", self.name)
    }
}

impl Error {
    /// Creates a collection-not-found error.
    pub fn collection_not_found(name: impl Into<String>) -> Error {
        Error::from(super::ErrorKind::CollectionNotFound(CollectionNotFound {
            name: name.into().into(),
        }))
    }

    /// Returns `true` if this error is a collection-not-found error.
    pub fn is_collection_not_found(&self) -> bool {
        self.any_kind(|kind| matches!(kind, super::ErrorKind::CollectionNotFound(_)))
    }
}
