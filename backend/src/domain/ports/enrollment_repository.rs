//! Port for the append-only enrollment log.

use async_trait::async_trait;

use crate::domain::{EnrollmentRecord, SubjectId};

/// Errors raised by enrollment repository adapters.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EnrollmentRepositoryError {
    /// Repository connection could not be established.
    #[error("enrollment repository connection failed: {message}")]
    Connection { message: String },
    /// Query or mutation failed during execution.
    #[error("enrollment repository query failed: {message}")]
    Query { message: String },
}

impl EnrollmentRepositoryError {
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

/// Port for appending and reading enrollment records.
///
/// Records are never mutated or deleted; the payment reference is unique and
/// serves as the purchase idempotency key.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EnrollmentRepository: Send + Sync {
    /// Append one record.
    async fn append(&self, record: &EnrollmentRecord) -> Result<(), EnrollmentRepositoryError>;

    /// Find the record created for a payment reference, if any.
    async fn find_by_payment_reference(
        &self,
        reference: &str,
    ) -> Result<Option<EnrollmentRecord>, EnrollmentRepositoryError>;

    /// A student's enrollment history, newest first.
    async fn list_for_student(
        &self,
        student: &SubjectId,
    ) -> Result<Vec<EnrollmentRecord>, EnrollmentRepositoryError>;
}

/// Fixture implementation for wiring without a backing store.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureEnrollmentRepository;

#[async_trait]
impl EnrollmentRepository for FixtureEnrollmentRepository {
    async fn append(&self, _record: &EnrollmentRecord) -> Result<(), EnrollmentRepositoryError> {
        Ok(())
    }

    async fn find_by_payment_reference(
        &self,
        _reference: &str,
    ) -> Result<Option<EnrollmentRecord>, EnrollmentRepositoryError> {
        Ok(None)
    }

    async fn list_for_student(
        &self,
        _student: &SubjectId,
    ) -> Result<Vec<EnrollmentRecord>, EnrollmentRepositoryError> {
        Ok(Vec::new())
    }
}
