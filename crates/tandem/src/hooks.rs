use crate::{async_trait, Model, Result};

/// Callbacks run after successful writes.
///
/// Hooks are best effort: a failing hook is logged and never fails the write
/// that triggered it.
#[async_trait]
pub trait Hooks: Send + Sync + 'static {
    async fn after_create(&self, _model: &Model) -> Result<()> {
        Ok(())
    }

    async fn after_create_many(&self, _models: &[Model]) -> Result<()> {
        Ok(())
    }
}
