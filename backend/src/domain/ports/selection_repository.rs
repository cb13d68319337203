//! Port for pending class selections.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{PendingSelection, SubjectId};

/// Errors raised by selection repository adapters.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SelectionRepositoryError {
    /// Repository connection could not be established.
    #[error("selection repository connection failed: {message}")]
    Connection { message: String },
    /// Query or mutation failed during execution.
    #[error("selection repository query failed: {message}")]
    Query { message: String },
}

impl SelectionRepositoryError {
    /// Create a connection error with the given message.
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Create a query error with the given message.
    pub fn query(message: impl Into<String>) -> Self {
        Self::Query {
            message: message.into(),
        }
    }
}

/// Result of inserting a selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionInsertOutcome {
    /// The selection was stored.
    Inserted,
    /// The student already holds an active selection for this class.
    Duplicate,
}

/// Port for reading, creating, and consuming pending selections.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SelectionRepository: Send + Sync {
    /// Store a selection; duplicates per (student, class) are reported, not
    /// silently accepted.
    async fn insert(
        &self,
        selection: &PendingSelection,
    ) -> Result<SelectionInsertOutcome, SelectionRepositoryError>;

    /// A student's active selections.
    async fn list_for_student(
        &self,
        student: &SubjectId,
    ) -> Result<Vec<PendingSelection>, SelectionRepositoryError>;

    /// Delete a selection owned by the student; `false` when nothing matched.
    async fn delete(
        &self,
        id: &Uuid,
        student: &SubjectId,
    ) -> Result<bool, SelectionRepositoryError>;
}

/// Fixture implementation for wiring without a backing store.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureSelectionRepository;

#[async_trait]
impl SelectionRepository for FixtureSelectionRepository {
    async fn insert(
        &self,
        _selection: &PendingSelection,
    ) -> Result<SelectionInsertOutcome, SelectionRepositoryError> {
        Ok(SelectionInsertOutcome::Inserted)
    }

    async fn list_for_student(
        &self,
        _student: &SubjectId,
    ) -> Result<Vec<PendingSelection>, SelectionRepositoryError> {
        Ok(Vec::new())
    }

    async fn delete(
        &self,
        _id: &Uuid,
        _student: &SubjectId,
    ) -> Result<bool, SelectionRepositoryError> {
        Ok(false)
    }
}
