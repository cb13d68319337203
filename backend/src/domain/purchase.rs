//! Enrollment transaction coordinator.
//!
//! Converts a paid-for pending selection into a confirmed enrollment while
//! keeping the seat counters consistent. The sequence is an explicit state
//! machine rather than a best-effort chain of writes:
//!
//! ```text
//! Initiated -> SeatReserved -> EnrollmentRecorded -> SelectionCleared
//!      \              \
//!       \              -> SeatReleased -> Aborted
//!        -> Aborted
//! ```
//!
//! A seat is never left reserved without an enrollment record; a recorded
//! enrollment is never rolled back because selection cleanup failed.

use std::fmt;
use std::sync::Arc;

use rust_decimal::Decimal;
use serde_json::json;
use tracing::{debug, error, warn};
use uuid::Uuid;

use crate::domain::capacity::CapacityLedger;
use crate::domain::enrollment::{EnrollmentRecord, EnrollmentValidationError};
use crate::domain::ports::{
    EnrollmentRepository, EnrollmentRepositoryError, SelectionRepository,
};
use crate::domain::{Error, SubjectId};

/// Coordinator states, logged at every transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PurchaseStep {
    Initiated,
    SeatReserved,
    EnrollmentRecorded,
    SelectionCleared,
    SeatReleased,
    Aborted,
}

impl fmt::Display for PurchaseStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Initiated => "initiated",
            Self::SeatReserved => "seat_reserved",
            Self::EnrollmentRecorded => "enrollment_recorded",
            Self::SelectionCleared => "selection_cleared",
            Self::SeatReleased => "seat_released",
            Self::Aborted => "aborted",
        };
        f.write_str(name)
    }
}

/// Input to [`PurchaseService::complete_purchase`].
///
/// The student comes from the verified credential, never from client input;
/// the payment reference is the processor's intent id and doubles as the
/// idempotency key.
#[derive(Debug, Clone)]
pub struct PurchaseRequest {
    pub student: SubjectId,
    pub selection_id: Uuid,
    pub class_id: Uuid,
    pub payment_reference: String,
    pub amount: Decimal,
}

/// Successful purchase outcome.
///
/// `selection_cleared` is `false` when the paid enrollment stands but the
/// originating selection could not be removed; the stale row is flagged for
/// cleanup rather than failing the purchase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletedPurchase {
    pub record: EnrollmentRecord,
    pub selection_cleared: bool,
}

pub(crate) fn map_enrollment_repository_error(error: EnrollmentRepositoryError) -> Error {
    match error {
        EnrollmentRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("enrollment repository unavailable: {message}"))
        }
        EnrollmentRepositoryError::Query { message } => {
            Error::internal(format!("enrollment repository error: {message}"))
        }
    }
}

fn map_record_validation_error(error: EnrollmentValidationError) -> Error {
    let field = match error {
        EnrollmentValidationError::NegativeAmount => "amount",
        EnrollmentValidationError::EmptyPaymentReference => "paymentReference",
    };
    Error::invalid_request(error.to_string())
        .with_details(json!({ "field": field, "code": "invalid_purchase" }))
}

/// Coordinates the multi-record enrollment transaction.
#[derive(Clone)]
pub struct PurchaseService {
    ledger: CapacityLedger,
    selections: Arc<dyn SelectionRepository>,
    enrollments: Arc<dyn EnrollmentRepository>,
}

impl PurchaseService {
    /// Create a coordinator over the ledger and the two record stores.
    pub fn new(
        ledger: CapacityLedger,
        selections: Arc<dyn SelectionRepository>,
        enrollments: Arc<dyn EnrollmentRepository>,
    ) -> Self {
        Self {
            ledger,
            selections,
            enrollments,
        }
    }

    fn transition(request: &PurchaseRequest, from: PurchaseStep, to: PurchaseStep) {
        debug!(
            student = %request.student,
            class_id = %request.class_id,
            payment_reference = %request.payment_reference,
            %from,
            %to,
            "purchase transition",
        );
    }

    /// Convert a paid selection into a confirmed enrollment.
    ///
    /// Replaying a payment reference returns the original record without
    /// touching the ledger, so caller-side retries cannot double-enrol or
    /// double-count a seat.
    pub async fn complete_purchase(
        &self,
        request: PurchaseRequest,
    ) -> Result<CompletedPurchase, Error> {
        if let Some(existing) = self
            .enrollments
            .find_by_payment_reference(&request.payment_reference)
            .await
            .map_err(map_enrollment_repository_error)?
        {
            debug!(
                payment_reference = %request.payment_reference,
                "purchase replayed; returning recorded enrollment",
            );
            return Ok(CompletedPurchase {
                record: existing,
                selection_cleared: true,
            });
        }

        // Validate the record before reserving so an abort here needs no
        // compensation.
        let record = EnrollmentRecord::new(
            request.student.clone(),
            request.class_id,
            request.amount,
            request.payment_reference.clone(),
        )
        .map_err(map_record_validation_error)?;

        if let Err(err) = self.ledger.reserve_seat(request.class_id).await {
            Self::transition(&request, PurchaseStep::Initiated, PurchaseStep::Aborted);
            return Err(err);
        }
        Self::transition(&request, PurchaseStep::Initiated, PurchaseStep::SeatReserved);

        if let Err(append_err) = self.enrollments.append(&record).await {
            Self::transition(&request, PurchaseStep::SeatReserved, PurchaseStep::SeatReleased);
            if let Err(release_err) = self.ledger.release_seat(request.class_id).await {
                // Both the write and its compensation failed: the counter is
                // now ahead of the log and needs operator attention.
                error!(
                    class_id = %request.class_id,
                    payment_reference = %request.payment_reference,
                    error = %release_err,
                    "seat release failed after enrollment write failure",
                );
            }
            Self::transition(&request, PurchaseStep::SeatReleased, PurchaseStep::Aborted);
            return Err(map_enrollment_repository_error(append_err));
        }
        Self::transition(
            &request,
            PurchaseStep::SeatReserved,
            PurchaseStep::EnrollmentRecorded,
        );

        let selection_cleared = match self
            .selections
            .delete(&request.selection_id, &request.student)
            .await
        {
            Ok(true) => {
                Self::transition(
                    &request,
                    PurchaseStep::EnrollmentRecorded,
                    PurchaseStep::SelectionCleared,
                );
                true
            }
            Ok(false) => {
                warn!(
                    selection_id = %request.selection_id,
                    student = %request.student,
                    "pending selection already gone after purchase",
                );
                false
            }
            Err(err) => {
                // Non-fatal: the student is enrolled and charged. The stale
                // selection is flagged for cleanup, never a rollback reason.
                warn!(
                    selection_id = %request.selection_id,
                    student = %request.student,
                    error = %err,
                    "pending selection cleanup failed after purchase",
                );
                false
            }
        };

        Ok(CompletedPurchase {
            record,
            selection_cleared,
        })
    }
}
