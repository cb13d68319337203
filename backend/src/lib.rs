//! Melody backend library modules.
//!
//! The crate is organised hexagonally: `domain` holds entities, ports, and
//! services; `inbound` adapts HTTP requests onto the domain; `outbound`
//! adapts the domain onto PostgreSQL and the payment processor.

pub mod doc;
pub mod domain;
pub mod inbound;
pub mod middleware;
pub mod outbound;

pub use domain::TraceId;
/// Request tracing middleware re-exported for application wiring.
pub use middleware::trace::Trace;
