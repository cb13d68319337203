//! Port for the subject directory backing authorization decisions.

use async_trait::async_trait;

use crate::domain::{Identity, Role, SubjectId};

/// Errors raised by user directory adapters.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UserDirectoryError {
    /// Directory connection could not be established.
    #[error("user directory connection failed: {message}")]
    Connection { message: String },
    /// Query or mutation failed during execution.
    #[error("user directory query failed: {message}")]
    Query { message: String },
}

impl UserDirectoryError {
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

/// Port for reading and mutating directory records.
///
/// `set_role` must be idempotent: re-applying a subject's current role is an
/// ordinary successful update.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Look up the record for a subject.
    async fn find(&self, subject: &SubjectId) -> Result<Option<Identity>, UserDirectoryError>;

    /// Create the record on first sign-in, or return the existing one.
    async fn upsert_subject(&self, subject: &SubjectId)
    -> Result<Identity, UserDirectoryError>;

    /// Replace a subject's role; `None` when the subject has no record.
    async fn set_role(
        &self,
        subject: &SubjectId,
        role: Role,
    ) -> Result<Option<Identity>, UserDirectoryError>;

    /// All directory records.
    async fn list(&self) -> Result<Vec<Identity>, UserDirectoryError>;

    /// Records holding the given role.
    async fn list_by_role(&self, role: Role) -> Result<Vec<Identity>, UserDirectoryError>;
}

/// Fixture implementation for wiring without a backing store.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureUserDirectory;

#[async_trait]
impl UserDirectory for FixtureUserDirectory {
    async fn find(&self, _subject: &SubjectId) -> Result<Option<Identity>, UserDirectoryError> {
        Ok(None)
    }

    async fn upsert_subject(
        &self,
        subject: &SubjectId,
    ) -> Result<Identity, UserDirectoryError> {
        Ok(Identity::unassigned(subject.clone()))
    }

    async fn set_role(
        &self,
        _subject: &SubjectId,
        _role: Role,
    ) -> Result<Option<Identity>, UserDirectoryError> {
        Ok(None)
    }

    async fn list(&self) -> Result<Vec<Identity>, UserDirectoryError> {
        Ok(Vec::new())
    }

    async fn list_by_role(&self, _role: Role) -> Result<Vec<Identity>, UserDirectoryError> {
        Ok(Vec::new())
    }
}
