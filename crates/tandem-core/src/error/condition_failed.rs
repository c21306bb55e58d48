use super::Error;

/// Error when a conditional write is rejected by the backend.
///
/// Raised for a create (as opposed to an upsert) of an item that already
/// exists.
#[derive(Debug)]
pub(super) struct ConditionFailedError {
    context: Option<Box<str>>,
}

impl std::error::Error for ConditionFailedError {}

impl core::fmt::Display for ConditionFailedError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        f.write_str("condition failed")?;
        if let Some(ref ctx) = self.context {
            write!(f, ": {}", ctx)?;
        }
        Ok(())
    }
}

impl Error {
    /// Creates a condition-failed error.
    pub fn condition_failed(context: impl Into<String>) -> Error {
        Error::from(super::ErrorKind::ConditionFailed(ConditionFailedError {
            context: Some(context.into().into()),
        }))
    }

    /// Returns `true` if this error is a condition-failed error.
    pub fn is_condition_failed(&self) -> bool {
        self.any_kind(|kind| matches!(kind, super::ErrorKind::ConditionFailed(_)))
    }
}
