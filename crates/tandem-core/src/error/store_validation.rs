use super::Error;

/// Validation failure reported by an indexed store in its own shape, e.g. a
/// write missing an attribute that composes one of the entity's keys.
///
/// Collections convert this into the unified validation error.
#[derive(Debug)]
pub(super) struct StoreValidationError {
    pub(super) field: Box<str>,
    pub(super) reason: Box<str>,
}

impl std::error::Error for StoreValidationError {}

impl core::fmt::Display for StoreValidationError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(f, "invalid attribute \"{}\": {}", self.field, self.reason)
    }
}

impl Error {
    /// Creates a store validation error.
    pub fn store_validation(field: impl Into<String>, reason: impl Into<String>) -> Error {
        Error::from(super::ErrorKind::StoreValidation(StoreValidationError {
            field: field.into().into(),
            reason: reason.into().into(),
        }))
    }

    /// If this error is a store validation error, returns the offending field
    /// and the reason.
    pub fn as_store_validation(&self) -> Option<(&str, &str)> {
        self.chain().find_map(|err| match err.kind() {
            super::ErrorKind::StoreValidation(err) => Some((&*err.field, &*err.reason)),
            _ => None,
        })
    }
}
