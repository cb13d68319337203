//! Class offerings and their capacity/approval invariants.

use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::SubjectId;

/// Maximum accepted class name length.
pub const CLASS_NAME_MAX: usize = 120;

/// Review state of a published class.
///
/// Only an admin drives transitions; new offerings start as `Pending`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalStatus {
    Pending,
    Approved,
    Denied,
}

impl ApprovalStatus {
    /// Stable lowercase name used in storage and request payloads.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Denied => "denied",
        }
    }
}

impl fmt::Display for ApprovalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown approval status.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown approval status: {0}")]
pub struct ParseApprovalStatusError(pub String);

impl std::str::FromStr for ApprovalStatus {
    type Err = ParseApprovalStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "approved" => Ok(Self::Approved),
            "denied" => Ok(Self::Denied),
            other => Err(ParseApprovalStatusError(other.to_owned())),
        }
    }
}

/// Validation errors returned by [`ClassOffering::new`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClassValidationError {
    EmptyName,
    NameTooLong { max: usize },
    NegativeCapacity,
    NegativeEnrolledCount,
    EnrolledExceedsCapacity,
    NegativePrice,
}

impl fmt::Display for ClassValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyName => write!(f, "class name must not be empty"),
            Self::NameTooLong { max } => write!(f, "class name must be at most {max} characters"),
            Self::NegativeCapacity => write!(f, "capacity must not be negative"),
            Self::NegativeEnrolledCount => write!(f, "enrolled count must not be negative"),
            Self::EnrolledExceedsCapacity => {
                write!(f, "enrolled count must not exceed capacity")
            }
            Self::NegativePrice => write!(f, "price must not be negative"),
        }
    }
}

impl std::error::Error for ClassValidationError {}

/// Unvalidated field bundle used to build a [`ClassOffering`].
#[derive(Debug, Clone)]
pub struct ClassOfferingDraft {
    pub id: Uuid,
    pub instructor: SubjectId,
    pub name: String,
    pub image_url: Option<String>,
    pub capacity: i32,
    pub enrolled_count: i32,
    pub status: ApprovalStatus,
    pub feedback: Option<String>,
    pub price: Decimal,
}

/// A published class with its seat-capacity counters.
///
/// ## Invariants
/// - `0 <= enrolled_count <= capacity`
/// - `price >= 0`
/// - `available_seats` is derived, never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassOffering {
    id: Uuid,
    instructor: SubjectId,
    name: String,
    image_url: Option<String>,
    capacity: i32,
    enrolled_count: i32,
    status: ApprovalStatus,
    feedback: Option<String>,
    price: Decimal,
}

impl ClassOffering {
    /// Validate a draft into a class offering.
    pub fn new(draft: ClassOfferingDraft) -> Result<Self, ClassValidationError> {
        let ClassOfferingDraft {
            id,
            instructor,
            name,
            image_url,
            capacity,
            enrolled_count,
            status,
            feedback,
            price,
        } = draft;

        let name = name.trim().to_owned();
        if name.is_empty() {
            return Err(ClassValidationError::EmptyName);
        }
        if name.chars().count() > CLASS_NAME_MAX {
            return Err(ClassValidationError::NameTooLong {
                max: CLASS_NAME_MAX,
            });
        }
        if capacity < 0 {
            return Err(ClassValidationError::NegativeCapacity);
        }
        if enrolled_count < 0 {
            return Err(ClassValidationError::NegativeEnrolledCount);
        }
        if enrolled_count > capacity {
            return Err(ClassValidationError::EnrolledExceedsCapacity);
        }
        if price < Decimal::ZERO {
            return Err(ClassValidationError::NegativePrice);
        }

        Ok(Self {
            id,
            instructor,
            name,
            image_url,
            capacity,
            enrolled_count,
            status,
            feedback,
            price,
        })
    }

    /// Fresh offering submitted by an instructor, awaiting review.
    pub fn draft_submission(
        instructor: SubjectId,
        name: String,
        image_url: Option<String>,
        capacity: i32,
        price: Decimal,
    ) -> Result<Self, ClassValidationError> {
        Self::new(ClassOfferingDraft {
            id: Uuid::new_v4(),
            instructor,
            name,
            image_url,
            capacity,
            enrolled_count: 0,
            status: ApprovalStatus::Pending,
            feedback: None,
            price,
        })
    }

    /// Class identifier.
    #[must_use]
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Owning instructor.
    #[must_use]
    pub fn instructor(&self) -> &SubjectId {
        &self.instructor
    }

    /// Display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Optional cover image reference.
    #[must_use]
    pub fn image_url(&self) -> Option<&str> {
        self.image_url.as_deref()
    }

    /// Total seat capacity.
    #[must_use]
    pub fn capacity(&self) -> i32 {
        self.capacity
    }

    /// Seats currently taken.
    #[must_use]
    pub fn enrolled_count(&self) -> i32 {
        self.enrolled_count
    }

    /// Seats still available; derived from the stored counters.
    #[must_use]
    pub fn available_seats(&self) -> i32 {
        self.capacity - self.enrolled_count
    }

    /// Review state.
    #[must_use]
    pub fn status(&self) -> ApprovalStatus {
        self.status
    }

    /// Reviewer feedback, when any was left.
    #[must_use]
    pub fn feedback(&self) -> Option<&str> {
        self.feedback.as_deref()
    }

    /// Price charged on purchase.
    #[must_use]
    pub fn price(&self) -> Decimal {
        self.price
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use rstest::rstest;
    use rust_decimal::Decimal;

    use super::*;

    fn draft() -> ClassOfferingDraft {
        ClassOfferingDraft {
            id: Uuid::new_v4(),
            instructor: SubjectId::new("ida@example.com").expect("valid subject"),
            name: "Beginner violin".to_owned(),
            image_url: None,
            capacity: 10,
            enrolled_count: 4,
            status: ApprovalStatus::Approved,
            feedback: None,
            price: Decimal::new(4999, 2),
        }
    }

    #[test]
    fn derives_available_seats() {
        let class = ClassOffering::new(draft()).expect("valid class");
        assert_eq!(class.available_seats(), 6);
    }

    #[rstest]
    #[case::enrolled_over_capacity(11, ClassValidationError::EnrolledExceedsCapacity)]
    #[case::negative_enrolled(-1, ClassValidationError::NegativeEnrolledCount)]
    fn rejects_counter_violations(
        #[case] enrolled_count: i32,
        #[case] expected: ClassValidationError,
    ) {
        let mut bad = draft();
        bad.enrolled_count = enrolled_count;
        assert_eq!(ClassOffering::new(bad).expect_err("should fail"), expected);
    }

    #[test]
    fn rejects_negative_price() {
        let mut bad = draft();
        bad.price = Decimal::new(-1, 0);
        assert_eq!(
            ClassOffering::new(bad).expect_err("should fail"),
            ClassValidationError::NegativePrice
        );
    }

    #[test]
    fn rejects_blank_name() {
        let mut bad = draft();
        bad.name = "   ".to_owned();
        assert_eq!(
            ClassOffering::new(bad).expect_err("should fail"),
            ClassValidationError::EmptyName
        );
    }

    #[test]
    fn draft_submission_starts_pending_and_empty() {
        let class = ClassOffering::draft_submission(
            SubjectId::new("ida@example.com").expect("valid subject"),
            "Jazz piano".to_owned(),
            None,
            12,
            Decimal::new(8000, 2),
        )
        .expect("valid class");
        assert_eq!(class.status(), ApprovalStatus::Pending);
        assert_eq!(class.enrolled_count(), 0);
        assert_eq!(class.available_seats(), 12);
    }

    #[rstest]
    #[case(ApprovalStatus::Pending, "pending")]
    #[case(ApprovalStatus::Approved, "approved")]
    #[case(ApprovalStatus::Denied, "denied")]
    fn status_names_round_trip(#[case] status: ApprovalStatus, #[case] name: &str) {
        assert_eq!(status.as_str(), name);
        assert_eq!(
            name.parse::<ApprovalStatus>().expect("parse status"),
            status
        );
    }
}
