use crate::{Call, MemoryDb, MemoryStore};

use tandem_core::{
    async_trait,
    driver::{EntityBinding, IndexedStore, Operation, Relational, Response},
    err,
    stmt::Statement,
    Result,
};

use std::sync::{Arc, Mutex, PoisonError};

/// Calls the logging wrappers reject instead of forwarding, matched by call
/// name and target.
#[derive(Debug, Clone, Default)]
pub struct Faults {
    rules: Arc<Mutex<Vec<(String, String)>>>,
}

impl Faults {
    /// Fails every call named `name` (`delete_many`, `insert`, ...) against
    /// `target` (an entity in indexed mode, a table in relational mode).
    pub fn fail(&self, name: &str, target: &str) {
        self.rules().push((name.to_string(), target.to_string()));
    }

    pub fn clear(&self) {
        self.rules().clear();
    }

    fn check(&self, call: &Call) -> Result<()> {
        let failing = self
            .rules()
            .iter()
            .any(|(name, target)| call.name() == name && call.target() == target);

        if failing {
            return Err(err!("`{}` on `{}` failed", call.name(), call.target()));
        }

        Ok(())
    }

    fn rules(&self) -> std::sync::MutexGuard<'_, Vec<(String, String)>> {
        self.rules.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// An indexed store that records every operation before forwarding it.
#[derive(Debug)]
pub(crate) struct LoggingStore {
    inner: Arc<MemoryStore>,
    calls: Arc<Mutex<Vec<Call>>>,
    faults: Faults,
}

/// A relational client that records every statement before forwarding it.
#[derive(Debug)]
pub(crate) struct LoggingRelational {
    inner: Arc<MemoryDb>,
    calls: Arc<Mutex<Vec<Call>>>,
    faults: Faults,
}

impl LoggingStore {
    pub(crate) fn new(
        inner: Arc<MemoryStore>,
        calls: Arc<Mutex<Vec<Call>>>,
        faults: Faults,
    ) -> Self {
        Self {
            inner,
            calls,
            faults,
        }
    }
}

impl LoggingRelational {
    pub(crate) fn new(
        inner: Arc<MemoryDb>,
        calls: Arc<Mutex<Vec<Call>>>,
        faults: Faults,
    ) -> Self {
        Self {
            inner,
            calls,
            faults,
        }
    }
}

#[async_trait]
impl IndexedStore for LoggingStore {
    async fn exec(&self, binding: &EntityBinding, op: Operation) -> Result<Response> {
        let call = Call::Indexed {
            entity: binding.entity.clone(),
            op: op.name(),
        };
        self.faults.check(&call)?;
        self.calls.lock().unwrap().push(call);

        self.inner.exec(binding, op).await
    }
}

#[async_trait]
impl Relational for LoggingRelational {
    async fn exec(&self, stmt: Statement) -> Result<Response> {
        let call = Call::Relational(stmt.clone());
        self.faults.check(&call)?;
        self.calls.lock().unwrap().push(call);

        self.inner.exec(stmt).await
    }
}
