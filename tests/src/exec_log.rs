use tandem_core::stmt::{Expr, Statement};

use std::sync::{Arc, Mutex};

/// One call a collection made to its backend.
#[derive(Debug, Clone)]
pub enum Call {
    Indexed { entity: String, op: &'static str },
    Relational(Statement),
}

impl Call {
    /// The operation name (`query`, `put_many`, ...) or the statement kind
    /// (`select`, `insert`, ...).
    pub fn name(&self) -> &'static str {
        match self {
            Call::Indexed { op, .. } => op,
            Call::Relational(Statement::Select(_)) => "select",
            Call::Relational(Statement::Insert(_)) => "insert",
            Call::Relational(Statement::Update(_)) => "update",
            Call::Relational(Statement::Delete(_)) => "delete",
        }
    }

    /// The entity (indexed) or table (relational) the call targets.
    pub fn target(&self) -> &str {
        match self {
            Call::Indexed { entity, .. } => entity,
            Call::Relational(stmt) => stmt.table(),
        }
    }

    /// Returns `true` for a select or delete filtered by a single `IN` list.
    pub fn is_in_list(&self) -> bool {
        let filter = match self {
            Call::Relational(Statement::Select(select)) => select.filter.as_ref(),
            Call::Relational(Statement::Delete(delete)) => Some(&delete.filter),
            _ => None,
        };

        matches!(filter, Some(Expr::InList { .. }))
    }

    pub fn is_write(&self) -> bool {
        matches!(
            self.name(),
            "put" | "put_many" | "patch" | "delete_many" | "insert" | "update" | "delete"
        )
    }
}

/// A wrapper around the call log that provides a clean API for tests
#[derive(Debug, Clone)]
pub struct ExecLog {
    calls: Arc<Mutex<Vec<Call>>>,
}

impl ExecLog {
    pub(crate) fn new(calls: Arc<Mutex<Vec<Call>>>) -> Self {
        Self { calls }
    }

    pub fn len(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.calls.lock().unwrap().is_empty()
    }

    /// A snapshot of every logged call
    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn any(&self, predicate: impl Fn(&Call) -> bool) -> bool {
        self.calls.lock().unwrap().iter().any(predicate)
    }

    /// Count calls with the given name
    pub fn count(&self, name: &str) -> usize {
        self.count_where(|call| call.name() == name)
    }

    pub fn count_where(&self, predicate: impl Fn(&Call) -> bool) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|call| predicate(call))
            .count()
    }

    /// Count write calls
    pub fn writes(&self) -> usize {
        self.count_where(Call::is_write)
    }

    pub fn clear(&self) {
        self.calls.lock().unwrap().clear();
    }
}
