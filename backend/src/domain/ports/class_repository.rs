//! Port for class offerings and their seat-capacity counters.

use async_trait::async_trait;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::domain::{ApprovalStatus, ClassOffering, SubjectId};

/// Errors raised by class repository adapters.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClassRepositoryError {
    /// Repository connection could not be established.
    #[error("class repository connection failed: {message}")]
    Connection { message: String },
    /// Query or mutation failed during execution.
    #[error("class repository query failed: {message}")]
    Query { message: String },
}

impl ClassRepositoryError {
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

/// Result of an atomic seat reservation attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReserveSeatOutcome {
    /// The enrolled count was incremented by exactly one.
    Reserved,
    /// The class exists but has no free seats.
    SoldOut,
    /// No class with the given id.
    NotFound,
}

/// Result of a conditional capacity update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CapacityUpdateOutcome {
    /// Capacity was replaced.
    Updated,
    /// The requested capacity is below the current enrolled count.
    BelowEnrollment,
    /// No class with the given id.
    NotFound,
}

/// Optional detail changes applied by the owning instructor or an admin.
///
/// `None` fields are left untouched. Capacity changes go through
/// [`ClassRepository::set_capacity`] so the enrolment guard applies.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassDetailsUpdate {
    pub name: Option<String>,
    pub image_url: Option<String>,
    pub price: Option<Decimal>,
}

impl ClassDetailsUpdate {
    /// True when no field would change.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.image_url.is_none() && self.price.is_none()
    }
}

/// Port for class persistence and the capacity ledger's store operations.
///
/// `reserve_seat` and `set_capacity` must evaluate their guard and write as
/// one atomic unit against the store; callers never read-then-write the
/// counters.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ClassRepository: Send + Sync {
    /// Persist a new offering.
    async fn insert(&self, class: &ClassOffering) -> Result<(), ClassRepositoryError>;

    /// Find an offering by id.
    async fn find_by_id(&self, id: &Uuid) -> Result<Option<ClassOffering>, ClassRepositoryError>;

    /// Offerings in the given review state.
    async fn list_by_status(
        &self,
        status: ApprovalStatus,
    ) -> Result<Vec<ClassOffering>, ClassRepositoryError>;

    /// Every offering, any state.
    async fn list_all(&self) -> Result<Vec<ClassOffering>, ClassRepositoryError>;

    /// Offerings owned by an instructor, any state.
    async fn list_by_instructor(
        &self,
        instructor: &SubjectId,
    ) -> Result<Vec<ClassOffering>, ClassRepositoryError>;

    /// Approved offerings ranked by enrolment, capped at `limit`.
    async fn list_popular(&self, limit: i64) -> Result<Vec<ClassOffering>, ClassRepositoryError>;

    /// Apply detail changes; `None` when the class does not exist.
    async fn update_details(
        &self,
        id: &Uuid,
        changes: &ClassDetailsUpdate,
    ) -> Result<Option<ClassOffering>, ClassRepositoryError>;

    /// Replace the review state; `None` when the class does not exist.
    async fn set_status(
        &self,
        id: &Uuid,
        status: ApprovalStatus,
    ) -> Result<Option<ClassOffering>, ClassRepositoryError>;

    /// Replace reviewer feedback; `None` when the class does not exist.
    async fn set_feedback(
        &self,
        id: &Uuid,
        feedback: &str,
    ) -> Result<Option<ClassOffering>, ClassRepositoryError>;

    /// Atomically increment the enrolled count while seats remain.
    async fn reserve_seat(&self, id: &Uuid) -> Result<ReserveSeatOutcome, ClassRepositoryError>;

    /// Compensating decrement, floored at zero. A missing class is a no-op.
    async fn release_seat(&self, id: &Uuid) -> Result<(), ClassRepositoryError>;

    /// Atomically replace capacity unless it would fall below enrolment.
    async fn set_capacity(
        &self,
        id: &Uuid,
        capacity: i32,
    ) -> Result<CapacityUpdateOutcome, ClassRepositoryError>;
}

/// Fixture implementation for wiring without a backing store.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureClassRepository;

#[async_trait]
impl ClassRepository for FixtureClassRepository {
    async fn insert(&self, _class: &ClassOffering) -> Result<(), ClassRepositoryError> {
        Ok(())
    }

    async fn find_by_id(&self, _id: &Uuid) -> Result<Option<ClassOffering>, ClassRepositoryError> {
        Ok(None)
    }

    async fn list_by_status(
        &self,
        _status: ApprovalStatus,
    ) -> Result<Vec<ClassOffering>, ClassRepositoryError> {
        Ok(Vec::new())
    }

    async fn list_all(&self) -> Result<Vec<ClassOffering>, ClassRepositoryError> {
        Ok(Vec::new())
    }

    async fn list_by_instructor(
        &self,
        _instructor: &SubjectId,
    ) -> Result<Vec<ClassOffering>, ClassRepositoryError> {
        Ok(Vec::new())
    }

    async fn list_popular(&self, _limit: i64) -> Result<Vec<ClassOffering>, ClassRepositoryError> {
        Ok(Vec::new())
    }

    async fn update_details(
        &self,
        _id: &Uuid,
        _changes: &ClassDetailsUpdate,
    ) -> Result<Option<ClassOffering>, ClassRepositoryError> {
        Ok(None)
    }

    async fn set_status(
        &self,
        _id: &Uuid,
        _status: ApprovalStatus,
    ) -> Result<Option<ClassOffering>, ClassRepositoryError> {
        Ok(None)
    }

    async fn set_feedback(
        &self,
        _id: &Uuid,
        _feedback: &str,
    ) -> Result<Option<ClassOffering>, ClassRepositoryError> {
        Ok(None)
    }

    async fn reserve_seat(&self, _id: &Uuid) -> Result<ReserveSeatOutcome, ClassRepositoryError> {
        Ok(ReserveSeatOutcome::NotFound)
    }

    async fn release_seat(&self, _id: &Uuid) -> Result<(), ClassRepositoryError> {
        Ok(())
    }

    async fn set_capacity(
        &self,
        _id: &Uuid,
        _capacity: i32,
    ) -> Result<CapacityUpdateOutcome, ClassRepositoryError> {
        Ok(CapacityUpdateOutcome::NotFound)
    }
}
