//! Payment and purchase API handlers.
//!
//! ```text
//! POST /api/v1/payments/intent {"amount":"49.99"}
//! POST /api/v1/purchases {"selectionId":"...","classId":"...","paymentReference":"pi_...","amount":"49.99"}
//! GET  /api/v1/enrollments
//! ```
//!
//! Intent creation happens strictly before the purchase: a gateway failure
//! never touches the capacity ledger or the coordinator.

use actix_web::{get, post, web};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::warn;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::ports::PaymentGatewayError;
use crate::domain::purchase::map_enrollment_repository_error;
use crate::domain::{EnrollmentRecord, Error, PurchaseRequest};
use crate::inbound::http::ApiResult;
use crate::inbound::http::bearer::BearerIdentity;
use crate::inbound::http::state::HttpState;

fn map_gateway_error(error: &PaymentGatewayError) -> Error {
    warn!(error = %error, "payment gateway call failed");
    Error::service_unavailable("payment gateway is unavailable")
        .with_details(json!({ "code": "payment_gateway_error" }))
}

/// Request body for creating a payment intent.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateIntentRequest {
    #[schema(value_type = String, example = "49.99")]
    pub amount: Decimal,
}

/// Payment intent handle returned to the client.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateIntentResponse {
    /// Secret the client uses to confirm the payment.
    pub client_secret: String,
    /// Processor intent id; passed back as the purchase payment reference.
    pub payment_reference: String,
}

/// Create a payment intent for the given amount.
#[utoipa::path(
    post,
    path = "/api/v1/payments/intent",
    request_body = CreateIntentRequest,
    responses(
        (status = 200, description = "Intent created", body = CreateIntentResponse),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 503, description = "Payment gateway unavailable", body = Error)
    ),
    tags = ["payments"],
    operation_id = "createPaymentIntent"
)]
#[post("/payments/intent")]
pub async fn create_payment_intent(
    state: web::Data<HttpState>,
    _identity: BearerIdentity,
    payload: web::Json<CreateIntentRequest>,
) -> ApiResult<web::Json<CreateIntentResponse>> {
    let amount = payload.amount;
    if amount <= Decimal::ZERO {
        return Err(Error::invalid_request("amount must be positive")
            .with_details(json!({ "field": "amount", "code": "invalid_amount" })));
    }
    let intent = state
        .gateway
        .create_payment_intent(amount, &state.currency)
        .await
        .map_err(|err| map_gateway_error(&err))?;
    Ok(web::Json(CreateIntentResponse {
        client_secret: intent.client_secret,
        payment_reference: intent.id,
    }))
}

/// Request body for completing a purchase.
///
/// The student identity comes from the verified credential; the body only
/// names the selection, class, and payment.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CompletePurchaseRequest {
    pub selection_id: Uuid,
    pub class_id: Uuid,
    pub payment_reference: String,
    #[schema(value_type = String, example = "49.99")]
    pub amount: Decimal,
}

/// Enrollment record payload.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EnrollmentResponse {
    pub id: Uuid,
    pub class_id: Uuid,
    #[schema(value_type = String, example = "49.99")]
    pub amount: Decimal,
    pub payment_reference: String,
    pub enrolled_at: DateTime<Utc>,
}

impl From<EnrollmentRecord> for EnrollmentResponse {
    fn from(record: EnrollmentRecord) -> Self {
        Self {
            id: record.id(),
            class_id: record.class_id(),
            amount: record.amount(),
            payment_reference: record.payment_reference().to_owned(),
            enrolled_at: record.enrolled_at(),
        }
    }
}

/// Purchase outcome payload.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseResponse {
    pub enrollment: EnrollmentResponse,
    /// `false` when the paid enrollment stands but the originating selection
    /// is still awaiting cleanup.
    pub selection_cleared: bool,
}

/// Convert a paid selection into a confirmed enrollment.
#[utoipa::path(
    post,
    path = "/api/v1/purchases",
    request_body = CompletePurchaseRequest,
    responses(
        (status = 200, description = "Enrollment recorded", body = PurchaseResponse),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 404, description = "Unknown class", body = Error),
        (status = 409, description = "Class is sold out", body = Error),
        (status = 503, description = "Store unavailable", body = Error)
    ),
    tags = ["payments"],
    operation_id = "completePurchase"
)]
#[post("/purchases")]
pub async fn complete_purchase(
    state: web::Data<HttpState>,
    identity: BearerIdentity,
    payload: web::Json<CompletePurchaseRequest>,
) -> ApiResult<web::Json<PurchaseResponse>> {
    let body = payload.into_inner();
    let completed = state
        .purchases
        .complete_purchase(PurchaseRequest {
            student: identity.into_subject(),
            selection_id: body.selection_id,
            class_id: body.class_id,
            payment_reference: body.payment_reference,
            amount: body.amount,
        })
        .await?;
    Ok(web::Json(PurchaseResponse {
        enrollment: EnrollmentResponse::from(completed.record),
        selection_cleared: completed.selection_cleared,
    }))
}

/// List the caller's enrollment records.
#[utoipa::path(
    get,
    path = "/api/v1/enrollments",
    responses(
        (status = 200, description = "Enrollment records", body = [EnrollmentResponse]),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["payments"],
    operation_id = "listEnrollments"
)]
#[get("/enrollments")]
pub async fn list_enrollments(
    state: web::Data<HttpState>,
    identity: BearerIdentity,
) -> ApiResult<web::Json<Vec<EnrollmentResponse>>> {
    let records = state
        .enrollments
        .list_for_student(identity.subject())
        .await
        .map_err(map_enrollment_repository_error)?;
    Ok(web::Json(
        records.into_iter().map(EnrollmentResponse::from).collect(),
    ))
}
