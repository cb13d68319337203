//! Shared HTTP adapter state.
//!
//! HTTP handlers accept this state via `actix_web::web::Data` so they only
//! depend on domain ports and services and remain testable without I/O.

use std::sync::Arc;

use crate::domain::ports::{
    ClassRepository, EnrollmentRepository, FixtureClassRepository, FixtureEnrollmentRepository,
    FixturePaymentGateway, FixtureSelectionRepository, FixtureUserDirectory, PaymentGateway,
    SelectionRepository, UserDirectory,
};
use crate::domain::{CapacityLedger, PurchaseService, RoleAuthorizer};

/// Parameter object bundling the port implementations behind the handlers.
#[derive(Clone)]
pub struct HttpStatePorts {
    pub directory: Arc<dyn UserDirectory>,
    pub classes: Arc<dyn ClassRepository>,
    pub selections: Arc<dyn SelectionRepository>,
    pub enrollments: Arc<dyn EnrollmentRepository>,
    pub gateway: Arc<dyn PaymentGateway>,
    /// ISO currency the marketplace charges in.
    pub currency: String,
}

impl Default for HttpStatePorts {
    fn default() -> Self {
        Self {
            directory: Arc::new(FixtureUserDirectory),
            classes: Arc::new(FixtureClassRepository),
            selections: Arc::new(FixtureSelectionRepository),
            enrollments: Arc::new(FixtureEnrollmentRepository),
            gateway: Arc::new(FixturePaymentGateway),
            currency: "usd".to_owned(),
        }
    }
}

/// Dependency bundle for HTTP handlers.
///
/// Domain services are constructed here, once, from the raw ports so every
/// handler shares the same authorizer, ledger, and coordinator wiring.
#[derive(Clone)]
pub struct HttpState {
    pub authorizer: RoleAuthorizer,
    pub ledger: CapacityLedger,
    pub purchases: PurchaseService,
    pub directory: Arc<dyn UserDirectory>,
    pub classes: Arc<dyn ClassRepository>,
    pub selections: Arc<dyn SelectionRepository>,
    pub enrollments: Arc<dyn EnrollmentRepository>,
    pub gateway: Arc<dyn PaymentGateway>,
    pub currency: String,
}

impl HttpState {
    /// Construct state from a ports bundle.
    ///
    /// # Examples
    /// ```
    /// use melody_backend::inbound::http::state::{HttpState, HttpStatePorts};
    ///
    /// let state = HttpState::new(HttpStatePorts::default());
    /// let _authorizer = state.authorizer.clone();
    /// ```
    #[must_use]
    pub fn new(ports: HttpStatePorts) -> Self {
        let HttpStatePorts {
            directory,
            classes,
            selections,
            enrollments,
            gateway,
            currency,
        } = ports;

        let authorizer = RoleAuthorizer::new(directory.clone());
        let ledger = CapacityLedger::new(classes.clone());
        let purchases =
            PurchaseService::new(ledger.clone(), selections.clone(), enrollments.clone());

        Self {
            authorizer,
            ledger,
            purchases,
            directory,
            classes,
            selections,
            enrollments,
            gateway,
            currency,
        }
    }
}

impl From<HttpStatePorts> for HttpState {
    fn from(ports: HttpStatePorts) -> Self {
        Self::new(ports)
    }
}
