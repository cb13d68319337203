//! OpenAPI documentation configuration.
//!
//! [`ApiDoc`] aggregates every HTTP endpoint and schema exposed by the
//! inbound layer. The generated specification backs Swagger UI in debug
//! builds.

use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::domain::{Error, ErrorCode, Role};
use crate::domain::classes::ApprovalStatus;
use crate::inbound::http::classes::{
    ClassResponse, CreateClassRequest, FeedbackRequest, StatusUpdateRequest, UpdateClassRequest,
};
use crate::inbound::http::payments::{
    CompletePurchaseRequest, CreateIntentRequest, CreateIntentResponse, EnrollmentResponse,
    PurchaseResponse,
};
use crate::inbound::http::selections::{CreateSelectionRequest, SelectionResponse};
use crate::inbound::http::users::{
    IdentityResponse, PromoteRequest, SignInRequest, SignInResponse,
};

/// Enrich the generated document with the bearer security scheme.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi
            .components
            .get_or_insert_with(utoipa::openapi::Components::default);

        components.add_security_scheme(
            "BearerToken",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .description(Some("Credential issued by POST /api/v1/sign-in."))
                    .build(),
            ),
        );
    }
}

/// OpenAPI document for the REST API.
#[derive(OpenApi)]
#[openapi(
    modifiers(&SecurityAddon),
    info(
        title = "Melody backend API",
        description = "HTTP interface for the course marketplace: sign-in, class review, selections, and enrollment purchases."
    ),
    servers(
        (url = "/", description = "Relative to the deployment base URL")
    ),
    security(("BearerToken" = [])),
    paths(
        crate::inbound::http::users::sign_in,
        crate::inbound::http::users::list_users,
        crate::inbound::http::users::promote_user,
        crate::inbound::http::users::list_instructors,
        crate::inbound::http::classes::create_class,
        crate::inbound::http::classes::list_approved_classes,
        crate::inbound::http::classes::list_popular_classes,
        crate::inbound::http::classes::list_all_classes,
        crate::inbound::http::classes::list_own_classes,
        crate::inbound::http::classes::update_class,
        crate::inbound::http::classes::review_class,
        crate::inbound::http::classes::leave_feedback,
        crate::inbound::http::selections::create_selection,
        crate::inbound::http::selections::list_selections,
        crate::inbound::http::selections::delete_selection,
        crate::inbound::http::payments::create_payment_intent,
        crate::inbound::http::payments::complete_purchase,
        crate::inbound::http::payments::list_enrollments,
        crate::inbound::http::health::ready,
        crate::inbound::http::health::live,
    ),
    components(schemas(
        Error,
        ErrorCode,
        Role,
        ApprovalStatus,
        SignInRequest,
        SignInResponse,
        IdentityResponse,
        PromoteRequest,
        ClassResponse,
        CreateClassRequest,
        UpdateClassRequest,
        StatusUpdateRequest,
        FeedbackRequest,
        CreateSelectionRequest,
        SelectionResponse,
        CreateIntentRequest,
        CreateIntentResponse,
        CompletePurchaseRequest,
        EnrollmentResponse,
        PurchaseResponse,
    )),
    tags(
        (name = "users", description = "Sign-in, directory, and role promotion"),
        (name = "classes", description = "Class publication, listings, and review"),
        (name = "selections", description = "Pending purchase intents"),
        (name = "payments", description = "Payment intents and enrollment purchases"),
        (name = "health", description = "Endpoints for health checks")
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    //! Tests verifying OpenAPI schema registration.
    use utoipa::OpenApi;

    use super::*;

    #[test]
    fn document_registers_purchase_path() {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key("/api/v1/purchases"));
        assert!(doc.paths.paths.contains_key("/api/v1/sign-in"));
    }

    #[test]
    fn error_schema_has_envelope_fields() {
        let doc = ApiDoc::openapi();
        let schemas = &doc.components.as_ref().expect("components").schemas;
        assert!(schemas.contains_key("Error"));
        assert!(schemas.contains_key("ErrorCode"));
    }
}
