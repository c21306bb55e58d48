mod binding;
pub use binding::{EntityBinding, IndexBinding};

mod response;
pub use response::{Response, Rows};

pub mod operation;
pub use operation::Operation;

use crate::{async_trait, stmt::Statement};

use std::fmt::Debug;

/// A key-value backend queried through partition/sort composite indexes.
///
/// Records crossing this boundary are keyed by backend field names.
#[async_trait]
pub trait IndexedStore: Debug + Send + Sync + 'static {
    /// Execute an operation against the entity described by `binding`.
    async fn exec(&self, binding: &EntityBinding, op: Operation) -> crate::Result<Response>;
}

/// A relational backend reached through statement execution.
#[async_trait]
pub trait Relational: Debug + Send + Sync + 'static {
    /// Execute a statement. Statements that return records respond with
    /// [`Rows::Records`], others with [`Rows::Count`].
    async fn exec(&self, stmt: Statement) -> crate::Result<Response>;
}
