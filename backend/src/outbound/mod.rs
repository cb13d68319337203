//! Outbound adapters implementing domain ports against real services.

pub mod payments;
pub mod persistence;
