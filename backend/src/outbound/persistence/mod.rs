//! PostgreSQL persistence adapters built on Diesel.

pub mod diesel_class_repository;
pub mod diesel_enrollment_repository;
pub mod diesel_selection_repository;
pub mod diesel_user_directory;
pub mod error_mapping;
pub mod models;
pub mod pool;
pub mod schema;

pub use diesel_class_repository::DieselClassRepository;
pub use diesel_enrollment_repository::DieselEnrollmentRepository;
pub use diesel_selection_repository::DieselSelectionRepository;
pub use diesel_user_directory::DieselUserDirectory;
pub use pool::{DbPool, PoolConfig, PoolError};
