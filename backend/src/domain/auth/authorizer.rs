//! Role-based authorization over the subject directory.
//!
//! A validly signed credential is not enough for a privileged route: the
//! subject's directory record must hold the required role at request time.
//! Role checks are exact matches; there is no hierarchy.

use std::sync::Arc;

use serde_json::json;
use tracing::info;

use crate::domain::ports::{UserDirectory, UserDirectoryError};
use crate::domain::{Error, Identity, Role, SubjectId};

fn map_directory_error(error: UserDirectoryError) -> Error {
    match error {
        UserDirectoryError::Connection { message } => {
            Error::service_unavailable(format!("user directory unavailable: {message}"))
        }
        UserDirectoryError::Query { message } => {
            Error::internal(format!("user directory error: {message}"))
        }
    }
}

fn role_mismatch(required: &[Role]) -> Error {
    let names: Vec<&str> = required.iter().map(Role::as_str).collect();
    Error::forbidden("subject does not hold the required role").with_details(json!({
        "code": "role_mismatch",
        "required": names,
    }))
}

/// Single authorization predicate consulted by every privileged route.
#[derive(Clone)]
pub struct RoleAuthorizer {
    directory: Arc<dyn UserDirectory>,
}

impl RoleAuthorizer {
    /// Create an authorizer over the given directory.
    pub fn new(directory: Arc<dyn UserDirectory>) -> Self {
        Self { directory }
    }

    /// Require the subject's record to hold exactly `role`.
    ///
    /// An absent record and a mismatched role both fail with `Forbidden`;
    /// the verifier has already vouched for the credential itself.
    pub async fn require_role(&self, subject: &SubjectId, role: Role) -> Result<Identity, Error> {
        self.require_any_role(subject, &[role]).await
    }

    /// Require the subject's record to hold one of `roles` (each an exact
    /// match).
    pub async fn require_any_role(
        &self,
        subject: &SubjectId,
        roles: &[Role],
    ) -> Result<Identity, Error> {
        let identity = self
            .directory
            .find(subject)
            .await
            .map_err(map_directory_error)?
            .ok_or_else(|| role_mismatch(roles))?;

        if roles.contains(&identity.role) {
            Ok(identity)
        } else {
            Err(role_mismatch(roles))
        }
    }

    /// Replace the target subject's role.
    ///
    /// Restricted to promotion targets (`instructor`, `admin`); the caller's
    /// own admin check happens at the route layer. Idempotent: re-applying
    /// the current role is a no-op success.
    pub async fn promote(&self, target: &SubjectId, role: Role) -> Result<Identity, Error> {
        if !matches!(role, Role::Instructor | Role::Admin) {
            return Err(
                Error::invalid_request(format!("role {role} is not a promotion target"))
                    .with_details(json!({ "field": "role", "code": "invalid_promotion_target" })),
            );
        }

        let identity = self
            .directory
            .set_role(target, role)
            .await
            .map_err(map_directory_error)?
            .ok_or_else(|| Error::not_found(format!("no directory record for {target}")))?;

        info!(subject = %identity.subject, role = %identity.role, "role updated");
        Ok(identity)
    }
}
