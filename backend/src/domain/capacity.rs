//! Capacity ledger: seat reservation, release, and capacity edits.
//!
//! The ledger never reads counters and writes them back; every mutation is a
//! single conditional update executed by the store adapter, so concurrent
//! purchases racing for the last seat resolve to exactly one success.

use std::sync::Arc;

use serde_json::json;
use tracing::warn;
use uuid::Uuid;

use crate::domain::Error;
use crate::domain::ports::{
    CapacityUpdateOutcome, ClassRepository, ClassRepositoryError, ReserveSeatOutcome,
};

pub(crate) fn map_class_repository_error(error: ClassRepositoryError) -> Error {
    match error {
        ClassRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("class repository unavailable: {message}"))
        }
        ClassRepositoryError::Query { message } => {
            Error::internal(format!("class repository error: {message}"))
        }
    }
}

/// Seat accounting over the class repository's conditional updates.
#[derive(Clone)]
pub struct CapacityLedger {
    classes: Arc<dyn ClassRepository>,
}

impl CapacityLedger {
    /// Create a ledger over the given repository.
    pub fn new(classes: Arc<dyn ClassRepository>) -> Self {
        Self { classes }
    }

    /// Take one seat, failing with `sold_out` when none remain.
    pub async fn reserve_seat(&self, class_id: Uuid) -> Result<(), Error> {
        match self
            .classes
            .reserve_seat(&class_id)
            .await
            .map_err(map_class_repository_error)?
        {
            ReserveSeatOutcome::Reserved => Ok(()),
            ReserveSeatOutcome::SoldOut => Err(Error::conflict("class is sold out")
                .with_details(json!({ "code": "sold_out", "classId": class_id }))),
            ReserveSeatOutcome::NotFound => {
                Err(Error::not_found(format!("class {class_id} not found")))
            }
        }
    }

    /// Give back one seat after a failed purchase step.
    ///
    /// Floored at zero by the store; a missing class is logged and treated
    /// as done so the compensation path cannot mask the original failure.
    pub async fn release_seat(&self, class_id: Uuid) -> Result<(), Error> {
        self.classes
            .release_seat(&class_id)
            .await
            .map_err(map_class_repository_error)
    }

    /// Replace a class's capacity.
    ///
    /// Rejected when the new value would fall below the current enrolled
    /// count; a reduction must never retroactively break the counter
    /// invariant.
    pub async fn set_capacity(&self, class_id: Uuid, capacity: i32) -> Result<(), Error> {
        if capacity < 0 {
            return Err(Error::invalid_request("capacity must not be negative")
                .with_details(json!({ "field": "capacity", "code": "negative_capacity" })));
        }

        match self
            .classes
            .set_capacity(&class_id, capacity)
            .await
            .map_err(map_class_repository_error)?
        {
            CapacityUpdateOutcome::Updated => Ok(()),
            CapacityUpdateOutcome::BelowEnrollment => {
                warn!(%class_id, capacity, "capacity reduction below current enrolment rejected");
                Err(
                    Error::conflict("capacity cannot fall below the current enrolled count")
                        .with_details(json!({
                            "code": "capacity_below_enrollment",
                            "classId": class_id,
                        })),
                )
            }
            CapacityUpdateOutcome::NotFound => {
                Err(Error::not_found(format!("class {class_id} not found")))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use rstest::rstest;

    use super::*;
    use crate::domain::ErrorCode;
    use crate::domain::ports::class_repository::MockClassRepository;

    fn ledger_with(repo: MockClassRepository) -> CapacityLedger {
        CapacityLedger::new(Arc::new(repo))
    }

    #[rstest]
    #[tokio::test]
    async fn sold_out_maps_to_conflict() {
        let mut repo = MockClassRepository::new();
        repo.expect_reserve_seat()
            .return_once(|_| Ok(ReserveSeatOutcome::SoldOut));

        let error = ledger_with(repo)
            .reserve_seat(Uuid::new_v4())
            .await
            .expect_err("no seats left");
        assert_eq!(error.code, ErrorCode::Conflict);
        assert_eq!(error.detail_code(), Some("sold_out"));
    }

    #[rstest]
    #[tokio::test]
    async fn missing_class_maps_to_not_found() {
        let mut repo = MockClassRepository::new();
        repo.expect_reserve_seat()
            .return_once(|_| Ok(ReserveSeatOutcome::NotFound));

        let error = ledger_with(repo)
            .reserve_seat(Uuid::new_v4())
            .await
            .expect_err("unknown class");
        assert_eq!(error.code, ErrorCode::NotFound);
    }

    #[rstest]
    #[tokio::test]
    async fn capacity_below_enrolment_maps_to_conflict() {
        let mut repo = MockClassRepository::new();
        repo.expect_set_capacity()
            .return_once(|_, _| Ok(CapacityUpdateOutcome::BelowEnrollment));

        let error = ledger_with(repo)
            .set_capacity(Uuid::new_v4(), 3)
            .await
            .expect_err("reduction below enrolment");
        assert_eq!(error.code, ErrorCode::Conflict);
        assert_eq!(error.detail_code(), Some("capacity_below_enrollment"));
    }

    #[rstest]
    #[tokio::test]
    async fn negative_capacity_is_rejected_before_the_store() {
        let repo = MockClassRepository::new();

        let error = ledger_with(repo)
            .set_capacity(Uuid::new_v4(), -1)
            .await
            .expect_err("negative capacity");
        assert_eq!(error.code, ErrorCode::InvalidRequest);
    }

    #[rstest]
    #[tokio::test]
    async fn connection_failure_maps_to_service_unavailable() {
        let mut repo = MockClassRepository::new();
        repo.expect_reserve_seat()
            .return_once(|_| Err(ClassRepositoryError::connection("refused")));

        let error = ledger_with(repo)
            .reserve_seat(Uuid::new_v4())
            .await
            .expect_err("store unreachable");
        assert_eq!(error.code, ErrorCode::ServiceUnavailable);
    }
}
