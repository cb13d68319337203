//! Driven ports: the store and payment-processor seams the domain depends on.
//!
//! Each port pairs an async trait with a small `thiserror` enum
//! (`Connection` for unreachable adapters, `Query` for failed operations)
//! and a fixture implementation for wiring without backing services.

pub mod class_repository;
pub mod enrollment_repository;
pub mod payment_gateway;
pub mod selection_repository;
pub mod user_directory;

pub use class_repository::{
    CapacityUpdateOutcome, ClassDetailsUpdate, ClassRepository, ClassRepositoryError,
    FixtureClassRepository, ReserveSeatOutcome,
};
pub use enrollment_repository::{
    EnrollmentRepository, EnrollmentRepositoryError, FixtureEnrollmentRepository,
};
pub use payment_gateway::{
    FixturePaymentGateway, PaymentGateway, PaymentGatewayError, PaymentIntent,
};
pub use selection_repository::{
    FixtureSelectionRepository, SelectionInsertOutcome, SelectionRepository,
    SelectionRepositoryError,
};
pub use user_directory::{FixtureUserDirectory, UserDirectory, UserDirectoryError};
