//! Directory API handlers: sign-in, listings, and role promotion.
//!
//! ```text
//! POST  /api/v1/sign-in {"subject":"ada@example.com"}
//! GET   /api/v1/users
//! PATCH /api/v1/users/{subject}/role {"role":"instructor"}
//! GET   /api/v1/instructors
//! ```

use actix_web::{get, patch, post, web};
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::ToSchema;

use crate::domain::ports::UserDirectoryError;
use crate::domain::{
    Error, Identity, Role, SubjectId, SubjectValidationError, TokenVerifier,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::bearer::BearerIdentity;
use crate::inbound::http::state::HttpState;

pub(crate) fn map_directory_error(error: UserDirectoryError) -> Error {
    match error {
        UserDirectoryError::Connection { message } => {
            Error::service_unavailable(format!("user directory unavailable: {message}"))
        }
        UserDirectoryError::Query { message } => {
            Error::internal(format!("user directory error: {message}"))
        }
    }
}

fn map_subject_validation_error(err: &SubjectValidationError) -> Error {
    Error::invalid_request(err.to_string())
        .with_details(json!({ "field": "subject", "code": "invalid_subject" }))
}

/// Sign-in request body.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SignInRequest {
    /// Subject identifier (email address).
    pub subject: String,
}

/// Sign-in response carrying the issued credential.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SignInResponse {
    /// Signed bearer token, valid for one hour.
    pub token: String,
    /// The subject's current marketplace role.
    pub role: Role,
}

/// Directory record payload.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct IdentityResponse {
    pub subject: String,
    pub role: Role,
}

impl From<Identity> for IdentityResponse {
    fn from(identity: Identity) -> Self {
        Self {
            subject: identity.subject.to_string(),
            role: identity.role,
        }
    }
}

/// Upsert the subject's directory record and issue a credential.
///
/// First sign-in creates the record with the `unassigned` role; later
/// sign-ins leave the stored role untouched.
#[utoipa::path(
    post,
    path = "/api/v1/sign-in",
    request_body = SignInRequest,
    responses(
        (status = 200, description = "Credential issued", body = SignInResponse),
        (status = 400, description = "Invalid request", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["users"],
    operation_id = "signIn",
    security([])
)]
#[post("/sign-in")]
pub async fn sign_in(
    state: web::Data<HttpState>,
    verifier: web::Data<TokenVerifier>,
    payload: web::Json<SignInRequest>,
) -> ApiResult<web::Json<SignInResponse>> {
    let subject = SubjectId::new(&payload.subject)
        .map_err(|err| map_subject_validation_error(&err))?;
    let identity = state
        .directory
        .upsert_subject(&subject)
        .await
        .map_err(map_directory_error)?;
    let token = verifier.issue(&identity.subject)?;
    Ok(web::Json(SignInResponse {
        token,
        role: identity.role,
    }))
}

/// List every directory record. Admin only.
#[utoipa::path(
    get,
    path = "/api/v1/users",
    responses(
        (status = 200, description = "Directory records", body = [IdentityResponse]),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 403, description = "Forbidden", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["users"],
    operation_id = "listUsers"
)]
#[get("/users")]
pub async fn list_users(
    state: web::Data<HttpState>,
    identity: BearerIdentity,
) -> ApiResult<web::Json<Vec<IdentityResponse>>> {
    state
        .authorizer
        .require_role(identity.subject(), Role::Admin)
        .await?;
    let records = state.directory.list().await.map_err(map_directory_error)?;
    Ok(web::Json(
        records.into_iter().map(IdentityResponse::from).collect(),
    ))
}

/// Role promotion request body.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PromoteRequest {
    /// Target role: `instructor` or `admin`.
    pub role: String,
}

/// Promote a subject to instructor or admin. Admin only, idempotent.
#[utoipa::path(
    patch,
    path = "/api/v1/users/{subject}/role",
    params(("subject" = String, Path, description = "Target subject identifier")),
    request_body = PromoteRequest,
    responses(
        (status = 200, description = "Role applied", body = IdentityResponse),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 403, description = "Forbidden", body = Error),
        (status = 404, description = "Unknown subject", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["users"],
    operation_id = "promoteUser"
)]
#[patch("/users/{subject}/role")]
pub async fn promote_user(
    state: web::Data<HttpState>,
    identity: BearerIdentity,
    path: web::Path<String>,
    payload: web::Json<PromoteRequest>,
) -> ApiResult<web::Json<IdentityResponse>> {
    state
        .authorizer
        .require_role(identity.subject(), Role::Admin)
        .await?;
    let target = SubjectId::new(path.into_inner())
        .map_err(|err| map_subject_validation_error(&err))?;
    let role: Role = payload.role.parse().map_err(|_| {
        Error::invalid_request("role must be instructor or admin")
            .with_details(json!({ "field": "role", "code": "invalid_role" }))
    })?;
    let updated = state.authorizer.promote(&target, role).await?;
    Ok(web::Json(IdentityResponse::from(updated)))
}

/// List subjects holding the instructor role.
#[utoipa::path(
    get,
    path = "/api/v1/instructors",
    responses(
        (status = 200, description = "Instructors", body = [IdentityResponse]),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["users"],
    operation_id = "listInstructors",
    security([])
)]
#[get("/instructors")]
pub async fn list_instructors(
    state: web::Data<HttpState>,
) -> ApiResult<web::Json<Vec<IdentityResponse>>> {
    let records = state
        .directory
        .list_by_role(Role::Instructor)
        .await
        .map_err(map_directory_error)?;
    Ok(web::Json(
        records.into_iter().map(IdentityResponse::from).collect(),
    ))
}
