//! Class offering API handlers: publication, listings, and review.
//!
//! ```text
//! POST  /api/v1/classes
//! GET   /api/v1/classes            (approved, public)
//! GET   /api/v1/classes/popular    (public)
//! GET   /api/v1/classes/all        (admin)
//! GET   /api/v1/classes/mine       (instructor)
//! PATCH /api/v1/classes/{id}        (owner instructor or admin)
//! PATCH /api/v1/classes/{id}/status (admin)
//! PATCH /api/v1/classes/{id}/feedback (admin)
//! ```

use actix_web::{HttpResponse, get, patch, post, web};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::capacity::map_class_repository_error;
use crate::domain::ports::ClassDetailsUpdate;
use crate::domain::{
    ApprovalStatus, ClassOffering, ClassValidationError, Error, Role,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::bearer::BearerIdentity;
use crate::inbound::http::state::HttpState;

/// Cap applied to the popular-classes listing.
const POPULAR_LIMIT: i64 = 6;

/// Class offering payload.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClassResponse {
    pub id: Uuid,
    pub instructor: String,
    pub name: String,
    pub image_url: Option<String>,
    pub capacity: i32,
    pub enrolled_count: i32,
    /// Derived from the stored counters, never stored itself.
    pub available_seats: i32,
    pub status: ApprovalStatus,
    pub feedback: Option<String>,
    #[schema(value_type = String, example = "49.99")]
    pub price: Decimal,
}

impl From<ClassOffering> for ClassResponse {
    fn from(class: ClassOffering) -> Self {
        Self {
            id: class.id(),
            instructor: class.instructor().to_string(),
            name: class.name().to_owned(),
            image_url: class.image_url().map(str::to_owned),
            capacity: class.capacity(),
            enrolled_count: class.enrolled_count(),
            available_seats: class.available_seats(),
            status: class.status(),
            feedback: class.feedback().map(str::to_owned),
            price: class.price(),
        }
    }
}

fn class_list_response(classes: Vec<ClassOffering>) -> web::Json<Vec<ClassResponse>> {
    web::Json(classes.into_iter().map(ClassResponse::from).collect())
}

fn map_class_validation_error(err: &ClassValidationError) -> Error {
    Error::invalid_request(err.to_string())
        .with_details(json!({ "code": "invalid_class" }))
}

/// Request body for publishing a class.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateClassRequest {
    pub name: String,
    pub image_url: Option<String>,
    pub capacity: i32,
    #[schema(value_type = String, example = "49.99")]
    pub price: Decimal,
}

/// Publish a class. Instructor only; the offering starts `pending`.
#[utoipa::path(
    post,
    path = "/api/v1/classes",
    request_body = CreateClassRequest,
    responses(
        (status = 201, description = "Class created", body = ClassResponse),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 403, description = "Forbidden", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["classes"],
    operation_id = "createClass"
)]
#[post("/classes")]
pub async fn create_class(
    state: web::Data<HttpState>,
    identity: BearerIdentity,
    payload: web::Json<CreateClassRequest>,
) -> ApiResult<HttpResponse> {
    let caller = state
        .authorizer
        .require_role(identity.subject(), Role::Instructor)
        .await?;
    let body = payload.into_inner();
    let class = ClassOffering::draft_submission(
        caller.subject,
        body.name,
        body.image_url,
        body.capacity,
        body.price,
    )
    .map_err(|err| map_class_validation_error(&err))?;
    state
        .classes
        .insert(&class)
        .await
        .map_err(map_class_repository_error)?;
    Ok(HttpResponse::Created().json(ClassResponse::from(class)))
}

/// List approved classes.
#[utoipa::path(
    get,
    path = "/api/v1/classes",
    responses(
        (status = 200, description = "Approved classes", body = [ClassResponse]),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["classes"],
    operation_id = "listApprovedClasses",
    security([])
)]
#[get("/classes")]
pub async fn list_approved_classes(
    state: web::Data<HttpState>,
) -> ApiResult<web::Json<Vec<ClassResponse>>> {
    let classes = state
        .classes
        .list_by_status(ApprovalStatus::Approved)
        .await
        .map_err(map_class_repository_error)?;
    Ok(class_list_response(classes))
}

/// List approved classes ranked by enrolment.
#[utoipa::path(
    get,
    path = "/api/v1/classes/popular",
    responses(
        (status = 200, description = "Popular classes", body = [ClassResponse]),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["classes"],
    operation_id = "listPopularClasses",
    security([])
)]
#[get("/classes/popular")]
pub async fn list_popular_classes(
    state: web::Data<HttpState>,
) -> ApiResult<web::Json<Vec<ClassResponse>>> {
    let classes = state
        .classes
        .list_popular(POPULAR_LIMIT)
        .await
        .map_err(map_class_repository_error)?;
    Ok(class_list_response(classes))
}

/// List every class, any review state. Admin only.
#[utoipa::path(
    get,
    path = "/api/v1/classes/all",
    responses(
        (status = 200, description = "All classes", body = [ClassResponse]),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 403, description = "Forbidden", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["classes"],
    operation_id = "listAllClasses"
)]
#[get("/classes/all")]
pub async fn list_all_classes(
    state: web::Data<HttpState>,
    identity: BearerIdentity,
) -> ApiResult<web::Json<Vec<ClassResponse>>> {
    state
        .authorizer
        .require_role(identity.subject(), Role::Admin)
        .await?;
    let classes = state
        .classes
        .list_all()
        .await
        .map_err(map_class_repository_error)?;
    Ok(class_list_response(classes))
}

/// List the caller's own classes. Instructor only.
#[utoipa::path(
    get,
    path = "/api/v1/classes/mine",
    responses(
        (status = 200, description = "Own classes", body = [ClassResponse]),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 403, description = "Forbidden", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["classes"],
    operation_id = "listOwnClasses"
)]
#[get("/classes/mine")]
pub async fn list_own_classes(
    state: web::Data<HttpState>,
    identity: BearerIdentity,
) -> ApiResult<web::Json<Vec<ClassResponse>>> {
    let caller = state
        .authorizer
        .require_role(identity.subject(), Role::Instructor)
        .await?;
    let classes = state
        .classes
        .list_by_instructor(&caller.subject)
        .await
        .map_err(map_class_repository_error)?;
    Ok(class_list_response(classes))
}

/// Request body for editing a class.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateClassRequest {
    pub name: Option<String>,
    pub image_url: Option<String>,
    #[schema(value_type = Option<String>, example = "59.99")]
    pub price: Option<Decimal>,
    pub capacity: Option<i32>,
}

/// Edit a class's details or capacity.
///
/// Owner instructors and admins may edit; a capacity value below the
/// current enrolled count is rejected with `capacity_below_enrollment`.
#[utoipa::path(
    patch,
    path = "/api/v1/classes/{id}",
    params(("id" = Uuid, Path, description = "Class identifier")),
    request_body = UpdateClassRequest,
    responses(
        (status = 200, description = "Class updated", body = ClassResponse),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 403, description = "Forbidden", body = Error),
        (status = 404, description = "Unknown class", body = Error),
        (status = 409, description = "Capacity below enrolment", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["classes"],
    operation_id = "updateClass"
)]
#[patch("/classes/{id}")]
pub async fn update_class(
    state: web::Data<HttpState>,
    identity: BearerIdentity,
    path: web::Path<Uuid>,
    payload: web::Json<UpdateClassRequest>,
) -> ApiResult<web::Json<ClassResponse>> {
    let caller = state
        .authorizer
        .require_any_role(identity.subject(), &[Role::Instructor, Role::Admin])
        .await?;
    let class_id = path.into_inner();
    let body = payload.into_inner();

    let changes = ClassDetailsUpdate {
        name: body.name,
        image_url: body.image_url,
        price: body.price,
    };
    if changes.is_empty() && body.capacity.is_none() {
        return Err(Error::invalid_request("no fields to update"));
    }

    let current = state
        .classes
        .find_by_id(&class_id)
        .await
        .map_err(map_class_repository_error)?
        .ok_or_else(|| Error::not_found(format!("class {class_id} not found")))?;
    if caller.role == Role::Instructor && current.instructor() != &caller.subject {
        return Err(Error::forbidden("only the owning instructor may edit this class"));
    }

    // Capacity first: its enrolment guard must reject the whole edit before
    // details change.
    if let Some(capacity) = body.capacity {
        state.ledger.set_capacity(class_id, capacity).await?;
    }

    let updated = if changes.is_empty() {
        state
            .classes
            .find_by_id(&class_id)
            .await
            .map_err(map_class_repository_error)?
    } else {
        state
            .classes
            .update_details(&class_id, &changes)
            .await
            .map_err(map_class_repository_error)?
    }
    .ok_or_else(|| Error::not_found(format!("class {class_id} not found")))?;

    Ok(web::Json(ClassResponse::from(updated)))
}

/// Request body for an admin review decision.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StatusUpdateRequest {
    /// `approved` or `denied`.
    pub status: String,
}

/// Approve or deny a class. Admin only.
#[utoipa::path(
    patch,
    path = "/api/v1/classes/{id}/status",
    params(("id" = Uuid, Path, description = "Class identifier")),
    request_body = StatusUpdateRequest,
    responses(
        (status = 200, description = "Status updated", body = ClassResponse),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 403, description = "Forbidden", body = Error),
        (status = 404, description = "Unknown class", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["classes"],
    operation_id = "reviewClass"
)]
#[patch("/classes/{id}/status")]
pub async fn review_class(
    state: web::Data<HttpState>,
    identity: BearerIdentity,
    path: web::Path<Uuid>,
    payload: web::Json<StatusUpdateRequest>,
) -> ApiResult<web::Json<ClassResponse>> {
    state
        .authorizer
        .require_role(identity.subject(), Role::Admin)
        .await?;
    let status: ApprovalStatus = payload.status.parse().map_err(|_| {
        Error::invalid_request("status must be approved or denied")
            .with_details(json!({ "field": "status", "code": "invalid_status" }))
    })?;
    if status == ApprovalStatus::Pending {
        return Err(Error::invalid_request("a review cannot reset a class to pending")
            .with_details(json!({ "field": "status", "code": "invalid_status" })));
    }
    let class_id = path.into_inner();
    let updated = state
        .classes
        .set_status(&class_id, status)
        .await
        .map_err(map_class_repository_error)?
        .ok_or_else(|| Error::not_found(format!("class {class_id} not found")))?;
    Ok(web::Json(ClassResponse::from(updated)))
}

/// Request body for reviewer feedback.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackRequest {
    pub feedback: String,
}

/// Leave reviewer feedback on a class. Admin only.
#[utoipa::path(
    patch,
    path = "/api/v1/classes/{id}/feedback",
    params(("id" = Uuid, Path, description = "Class identifier")),
    request_body = FeedbackRequest,
    responses(
        (status = 200, description = "Feedback stored", body = ClassResponse),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 403, description = "Forbidden", body = Error),
        (status = 404, description = "Unknown class", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["classes"],
    operation_id = "leaveFeedback"
)]
#[patch("/classes/{id}/feedback")]
pub async fn leave_feedback(
    state: web::Data<HttpState>,
    identity: BearerIdentity,
    path: web::Path<Uuid>,
    payload: web::Json<FeedbackRequest>,
) -> ApiResult<web::Json<ClassResponse>> {
    state
        .authorizer
        .require_role(identity.subject(), Role::Admin)
        .await?;
    let feedback = payload.feedback.trim();
    if feedback.is_empty() {
        return Err(Error::invalid_request("feedback must not be empty")
            .with_details(json!({ "field": "feedback", "code": "empty_feedback" })));
    }
    let class_id = path.into_inner();
    let updated = state
        .classes
        .set_feedback(&class_id, feedback)
        .await
        .map_err(map_class_repository_error)?
        .ok_or_else(|| Error::not_found(format!("class {class_id} not found")))?;
    Ok(web::Json(ClassResponse::from(updated)))
}
