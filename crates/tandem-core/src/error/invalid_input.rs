use super::Error;

/// Error when the backend rejects a value as structurally invalid for its
/// column type (PostgreSQL SQLSTATE `22P02`, "invalid input syntax").
///
/// Batch fallback reads treat this as "no such key" rather than a failure.
#[derive(Debug)]
pub(super) struct InvalidInput {
    message: Box<str>,
}

impl std::error::Error for InvalidInput {}

impl core::fmt::Display for InvalidInput {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(f, "invalid input: {}", self.message)
    }
}

impl Error {
    /// Creates an invalid-input error.
    pub fn invalid_input(message: impl Into<String>) -> Error {
        Error::from(super::ErrorKind::InvalidInput(InvalidInput {
            message: message.into().into(),
        }))
    }

    /// Returns `true` if this error is an invalid-input error.
    pub fn is_invalid_input(&self) -> bool {
        self.any_kind(|kind| matches!(kind, super::ErrorKind::InvalidInput(_)))
    }
}
