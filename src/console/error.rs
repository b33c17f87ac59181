use crate::console::scope::EditScope;
use crate::model::{Id, RecurrenceType};
use crate::store::{StoreError, Table};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleError {
    /// "Delete selected" with nothing selected.
    EmptySelection,
    UnresolvedSide(String),
    ScopeUnavailable {
        recurrence: RecurrenceType,
        scope: EditScope,
    },
    NotFound {
        table: Table,
        id: Id,
    },
    /// A scoped edit with no column to change.
    EmptyPatch,
    InvalidTimeRange,
    LimitExceeded(&'static str),
    Store(StoreError),
}

impl ConsoleError {
    /// Validation errors are raised before the first store mutation.
    pub fn is_validation(&self) -> bool {
        !matches!(self, ConsoleError::Store(_) | ConsoleError::NotFound { .. })
    }
}

impl std::fmt::Display for ConsoleError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConsoleError::EmptySelection => write!(f, "select at least one instance to delete"),
            ConsoleError::UnresolvedSide(key) => write!(f, "unknown side: {key}"),
            ConsoleError::ScopeUnavailable { recurrence, scope } => {
                write!(f, "scope {scope:?} is not available for {recurrence:?} bookings")
            }
            ConsoleError::NotFound { table, id } => write!(f, "not found: {table} {id}"),
            ConsoleError::EmptyPatch => write!(f, "nothing to change"),
            ConsoleError::InvalidTimeRange => write!(f, "start time must be before end time"),
            ConsoleError::LimitExceeded(msg) => write!(f, "limit exceeded: {msg}"),
            ConsoleError::Store(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for ConsoleError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConsoleError::Store(e) => Some(e),
            _ => None,
        }
    }
}

impl From<StoreError> for ConsoleError {
    fn from(e: StoreError) -> Self {
        ConsoleError::Store(e)
    }
}
