//! Domain entities, ports, and services.
//!
//! Purpose: keep the enrollment-transaction and authorization semantics free
//! of transport and storage concerns. Inbound adapters map [`Error`] onto
//! HTTP; outbound adapters implement the [`ports`] against PostgreSQL and
//! the payment processor.

pub mod auth;
pub mod capacity;
pub mod classes;
pub mod enrollment;
pub mod error;
pub mod identity;
pub mod ports;
pub mod purchase;
pub mod trace_id;

pub use self::auth::{RoleAuthorizer, TokenVerifier};
pub use self::capacity::CapacityLedger;
pub use self::classes::{
    ApprovalStatus, ClassOffering, ClassOfferingDraft, ClassValidationError,
    ParseApprovalStatusError,
};
pub use self::enrollment::{EnrollmentRecord, EnrollmentValidationError, PendingSelection};
pub use self::error::{Error, ErrorCode};
pub use self::identity::{Identity, ParseRoleError, Role, SubjectId, SubjectValidationError};
pub use self::purchase::{CompletedPurchase, PurchaseRequest, PurchaseService};
pub use self::trace_id::{TRACE_ID_HEADER, TraceId};

/// Convenient API result alias.
///
/// # Examples
/// ```
/// use actix_web::HttpResponse;
/// use melody_backend::domain::{ApiResult, Error};
///
/// fn handler() -> ApiResult<HttpResponse> {
///     Err(Error::forbidden("nope"))
/// }
/// ```
pub type ApiResult<T> = Result<T, Error>;
