use super::Error;

/// Error when a write fails attribute validation.
///
/// Carries one message per failing attribute; validation does not stop at
/// the first failure.
#[derive(Debug)]
pub(super) struct ValidationError {
    pub(super) messages: Vec<String>,
}

impl std::error::Error for ValidationError {}

impl core::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        f.write_str("validation failed")?;

        let mut sep = ": ";
        for message in &self.messages {
            write!(f, "{sep}{message}")?;
            sep = "; ";
        }

        Ok(())
    }
}

impl Error {
    /// Creates a validation error from every failing attribute's message.
    pub fn validation(messages: Vec<String>) -> Error {
        Error::from(super::ErrorKind::Validation(ValidationError { messages }))
    }

    /// Returns `true` if this error is a validation error.
    pub fn is_validation(&self) -> bool {
        self.any_kind(|kind| matches!(kind, super::ErrorKind::Validation(_)))
    }

    /// Returns the messages of a validation error, or an empty slice for any
    /// other kind of error.
    pub fn validation_messages(&self) -> &[String] {
        self.chain()
            .find_map(|err| match err.kind() {
                super::ErrorKind::Validation(err) => Some(&err.messages[..]),
                _ => None,
            })
            .unwrap_or(&[])
    }
}
