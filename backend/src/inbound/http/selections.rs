//! Pending selection API handlers.
//!
//! ```text
//! POST   /api/v1/selections {"classId":"..."}
//! GET    /api/v1/selections
//! DELETE /api/v1/selections/{id}
//! ```

use actix_web::{HttpResponse, delete, get, post, web};
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::capacity::map_class_repository_error;
use crate::domain::ports::{SelectionInsertOutcome, SelectionRepositoryError};
use crate::domain::{ApprovalStatus, Error, PendingSelection};
use crate::inbound::http::ApiResult;
use crate::inbound::http::bearer::BearerIdentity;
use crate::inbound::http::state::HttpState;

pub(crate) fn map_selection_repository_error(error: SelectionRepositoryError) -> Error {
    match error {
        SelectionRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("selection repository unavailable: {message}"))
        }
        SelectionRepositoryError::Query { message } => {
            Error::internal(format!("selection repository error: {message}"))
        }
    }
}

/// Request body for selecting a class.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateSelectionRequest {
    pub class_id: Uuid,
}

/// Pending selection payload.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SelectionResponse {
    pub id: Uuid,
    pub class_id: Uuid,
}

impl From<PendingSelection> for SelectionResponse {
    fn from(selection: PendingSelection) -> Self {
        Self {
            id: selection.id,
            class_id: selection.class_id,
        }
    }
}

/// Record the caller's intent to purchase a class.
///
/// The class must exist and be approved; a second active selection for the
/// same class is a conflict, not a silent success.
#[utoipa::path(
    post,
    path = "/api/v1/selections",
    request_body = CreateSelectionRequest,
    responses(
        (status = 201, description = "Selection created", body = SelectionResponse),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 404, description = "Unknown or unapproved class", body = Error),
        (status = 409, description = "Already selected", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["selections"],
    operation_id = "createSelection"
)]
#[post("/selections")]
pub async fn create_selection(
    state: web::Data<HttpState>,
    identity: BearerIdentity,
    payload: web::Json<CreateSelectionRequest>,
) -> ApiResult<HttpResponse> {
    let class_id = payload.class_id;
    let class = state
        .classes
        .find_by_id(&class_id)
        .await
        .map_err(map_class_repository_error)?
        .filter(|class| class.status() == ApprovalStatus::Approved)
        .ok_or_else(|| Error::not_found(format!("no approved class {class_id}")))?;

    let selection = PendingSelection::new(identity.into_subject(), class.id());
    match state
        .selections
        .insert(&selection)
        .await
        .map_err(map_selection_repository_error)?
    {
        SelectionInsertOutcome::Inserted => {
            Ok(HttpResponse::Created().json(SelectionResponse::from(selection)))
        }
        SelectionInsertOutcome::Duplicate => Err(Error::conflict(
            "class is already selected",
        )
        .with_details(json!({ "code": "duplicate_selection", "classId": class_id }))),
    }
}

/// List the caller's pending selections.
#[utoipa::path(
    get,
    path = "/api/v1/selections",
    responses(
        (status = 200, description = "Pending selections", body = [SelectionResponse]),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["selections"],
    operation_id = "listSelections"
)]
#[get("/selections")]
pub async fn list_selections(
    state: web::Data<HttpState>,
    identity: BearerIdentity,
) -> ApiResult<web::Json<Vec<SelectionResponse>>> {
    let selections = state
        .selections
        .list_for_student(identity.subject())
        .await
        .map_err(map_selection_repository_error)?;
    Ok(web::Json(
        selections.into_iter().map(SelectionResponse::from).collect(),
    ))
}

/// Remove one of the caller's pending selections.
#[utoipa::path(
    delete,
    path = "/api/v1/selections/{id}",
    params(("id" = Uuid, Path, description = "Selection identifier")),
    responses(
        (status = 204, description = "Selection removed"),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 404, description = "No such selection for this caller", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["selections"],
    operation_id = "deleteSelection"
)]
#[delete("/selections/{id}")]
pub async fn delete_selection(
    state: web::Data<HttpState>,
    identity: BearerIdentity,
    path: web::Path<Uuid>,
) -> ApiResult<HttpResponse> {
    let selection_id = path.into_inner();
    let deleted = state
        .selections
        .delete(&selection_id, identity.subject())
        .await
        .map_err(map_selection_repository_error)?;
    if deleted {
        Ok(HttpResponse::NoContent().finish())
    } else {
        Err(Error::not_found(format!(
            "selection {selection_id} not found"
        )))
    }
}
