//! Pending selections and the append-only enrollment log.

use std::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::SubjectId;

/// A student's unconfirmed intent to purchase a class.
///
/// Created when a student selects a class; deleted either by explicit
/// removal or as part of a successful enrollment transaction. At most one
/// active selection exists per (student, class) pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingSelection {
    pub id: Uuid,
    pub student: SubjectId,
    pub class_id: Uuid,
}

impl PendingSelection {
    /// New selection with a fresh identifier.
    #[must_use]
    pub fn new(student: SubjectId, class_id: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            student,
            class_id,
        }
    }
}

/// Validation errors returned by [`EnrollmentRecord::new`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnrollmentValidationError {
    NegativeAmount,
    EmptyPaymentReference,
}

impl fmt::Display for EnrollmentValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NegativeAmount => write!(f, "amount paid must not be negative"),
            Self::EmptyPaymentReference => {
                write!(f, "payment reference must not be empty")
            }
        }
    }
}

impl std::error::Error for EnrollmentValidationError {}

/// One confirmed, paid enrollment.
///
/// Append-only: created exactly once per successful purchase, never mutated
/// or deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrollmentRecord {
    id: Uuid,
    student: SubjectId,
    class_id: Uuid,
    amount: Decimal,
    payment_reference: String,
    enrolled_at: DateTime<Utc>,
}

impl EnrollmentRecord {
    /// Validate and construct a fresh record stamped with the current time.
    pub fn new(
        student: SubjectId,
        class_id: Uuid,
        amount: Decimal,
        payment_reference: String,
    ) -> Result<Self, EnrollmentValidationError> {
        Self::from_parts(
            Uuid::new_v4(),
            student,
            class_id,
            amount,
            payment_reference,
            Utc::now(),
        )
    }

    /// Rebuild a stored record; used by persistence adapters.
    pub fn from_parts(
        id: Uuid,
        student: SubjectId,
        class_id: Uuid,
        amount: Decimal,
        payment_reference: String,
        enrolled_at: DateTime<Utc>,
    ) -> Result<Self, EnrollmentValidationError> {
        if amount < Decimal::ZERO {
            return Err(EnrollmentValidationError::NegativeAmount);
        }
        if payment_reference.trim().is_empty() {
            return Err(EnrollmentValidationError::EmptyPaymentReference);
        }
        Ok(Self {
            id,
            student,
            class_id,
            amount,
            payment_reference,
            enrolled_at,
        })
    }

    /// Record identifier.
    #[must_use]
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Enrolled student.
    #[must_use]
    pub fn student(&self) -> &SubjectId {
        &self.student
    }

    /// Purchased class.
    #[must_use]
    pub fn class_id(&self) -> Uuid {
        self.class_id
    }

    /// Amount paid.
    #[must_use]
    pub fn amount(&self) -> Decimal {
        self.amount
    }

    /// Payment processor reference; the purchase idempotency key.
    #[must_use]
    pub fn payment_reference(&self) -> &str {
        &self.payment_reference
    }

    /// When the enrollment was recorded.
    #[must_use]
    pub fn enrolled_at(&self) -> DateTime<Utc> {
        self.enrolled_at
    }
}
