//! PostgreSQL-backed `UserDirectory` implementation using Diesel ORM.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use uuid::Uuid;

use crate::domain::ports::{UserDirectory, UserDirectoryError};
use crate::domain::{Identity, Role, SubjectId};

use super::error_mapping::{map_diesel_error, map_pool_error};
use super::models::{NewUserRow, UserRow};
use super::pool::{DbPool, PoolError};
use super::schema::users;

/// Diesel-backed implementation of the user directory port.
#[derive(Clone)]
pub struct DieselUserDirectory {
    pool: DbPool,
}

impl DieselUserDirectory {
    /// Create a new directory adapter with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool(error: PoolError) -> UserDirectoryError {
    map_pool_error(error, UserDirectoryError::connection)
}

fn map_diesel(error: diesel::result::Error) -> UserDirectoryError {
    map_diesel_error(
        error,
        UserDirectoryError::query,
        UserDirectoryError::connection,
    )
}

/// Convert a database row into a validated directory record.
fn row_to_identity(row: UserRow) -> Result<Identity, UserDirectoryError> {
    let UserRow { subject, role, .. } = row;
    let subject = SubjectId::new(subject)
        .map_err(|err| UserDirectoryError::query(format!("decode subject: {err}")))?;
    let role: Role = role
        .parse()
        .map_err(|err| UserDirectoryError::query(format!("decode role: {err}")))?;
    Ok(Identity { subject, role })
}

#[async_trait]
impl UserDirectory for DieselUserDirectory {
    async fn find(&self, subject: &SubjectId) -> Result<Option<Identity>, UserDirectoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool)?;

        let row = users::table
            .filter(users::subject.eq(subject.as_ref()))
            .select(UserRow::as_select())
            .first::<UserRow>(&mut conn)
            .await
            .optional()
            .map_err(map_diesel)?;

        row.map(row_to_identity).transpose()
    }

    async fn upsert_subject(
        &self,
        subject: &SubjectId,
    ) -> Result<Identity, UserDirectoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool)?;

        let new_row = NewUserRow {
            id: Uuid::new_v4(),
            subject: subject.as_ref(),
            role: Role::Unassigned.as_str(),
        };

        // First sign-in wins; a concurrent insert for the same subject is
        // absorbed by the conflict target and the stored record read back.
        diesel::insert_into(users::table)
            .values(&new_row)
            .on_conflict(users::subject)
            .do_nothing()
            .execute(&mut conn)
            .await
            .map_err(map_diesel)?;

        let row = users::table
            .filter(users::subject.eq(subject.as_ref()))
            .select(UserRow::as_select())
            .first::<UserRow>(&mut conn)
            .await
            .map_err(map_diesel)?;

        row_to_identity(row)
    }

    async fn set_role(
        &self,
        subject: &SubjectId,
        role: Role,
    ) -> Result<Option<Identity>, UserDirectoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool)?;

        let row = diesel::update(users::table.filter(users::subject.eq(subject.as_ref())))
            .set(users::role.eq(role.as_str()))
            .returning(UserRow::as_returning())
            .get_result::<UserRow>(&mut conn)
            .await
            .optional()
            .map_err(map_diesel)?;

        row.map(row_to_identity).transpose()
    }

    async fn list(&self) -> Result<Vec<Identity>, UserDirectoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool)?;

        let rows: Vec<UserRow> = users::table
            .order(users::created_at.asc())
            .select(UserRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel)?;

        rows.into_iter().map(row_to_identity).collect()
    }

    async fn list_by_role(&self, role: Role) -> Result<Vec<Identity>, UserDirectoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool)?;

        let rows: Vec<UserRow> = users::table
            .filter(users::role.eq(role.as_str()))
            .order(users::created_at.asc())
            .select(UserRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel)?;

        rows.into_iter().map(row_to_identity).collect()
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for error mapping and row conversion edge cases.
    use chrono::Utc;
    use rstest::{fixture, rstest};

    use super::*;

    #[fixture]
    fn valid_row() -> UserRow {
        let now = Utc::now();
        UserRow {
            id: Uuid::new_v4(),
            subject: "ada@example.com".to_owned(),
            role: "instructor".to_owned(),
            created_at: now,
            updated_at: now,
        }
    }

    #[rstest]
    fn row_conversion_builds_identity(valid_row: UserRow) {
        let identity = row_to_identity(valid_row).expect("valid row");
        assert_eq!(identity.role, Role::Instructor);
        assert_eq!(identity.subject.as_ref(), "ada@example.com");
    }

    #[rstest]
    fn row_conversion_rejects_unknown_role(mut valid_row: UserRow) {
        valid_row.role = "superuser".to_owned();
        let error = row_to_identity(valid_row).expect_err("unknown role should fail");
        assert!(matches!(error, UserDirectoryError::Query { .. }));
        assert!(error.to_string().contains("decode role"));
    }

    #[rstest]
    fn pool_error_maps_to_connection_error() {
        let repo_err = map_pool(PoolError::checkout("connection refused"));
        assert!(matches!(repo_err, UserDirectoryError::Connection { .. }));
        assert!(repo_err.to_string().contains("connection refused"));
    }
}
