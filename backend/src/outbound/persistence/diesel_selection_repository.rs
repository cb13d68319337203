//! PostgreSQL-backed `SelectionRepository` implementation using Diesel ORM.
//!
//! A unique index over `(student, class_id)` backs the duplicate-selection
//! outcome; the adapter turns the constraint violation into an explicit
//! result instead of surfacing a storage error.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use uuid::Uuid;

use crate::domain::ports::{
    SelectionInsertOutcome, SelectionRepository, SelectionRepositoryError,
};
use crate::domain::{PendingSelection, SubjectId};

use super::error_mapping::{is_unique_violation, map_diesel_error, map_pool_error};
use super::models::{NewSelectionRow, SelectionRow};
use super::pool::{DbPool, PoolError};
use super::schema::pending_selections;

/// Diesel-backed implementation of the selection repository port.
#[derive(Clone)]
pub struct DieselSelectionRepository {
    pool: DbPool,
}

impl DieselSelectionRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool(error: PoolError) -> SelectionRepositoryError {
    map_pool_error(error, SelectionRepositoryError::connection)
}

fn map_diesel(error: diesel::result::Error) -> SelectionRepositoryError {
    map_diesel_error(
        error,
        SelectionRepositoryError::query,
        SelectionRepositoryError::connection,
    )
}

/// Convert a database row into a validated pending selection.
fn row_to_selection(row: SelectionRow) -> Result<PendingSelection, SelectionRepositoryError> {
    let SelectionRow {
        id,
        student,
        class_id,
        created_at: _,
    } = row;
    let student = SubjectId::new(student)
        .map_err(|err| SelectionRepositoryError::query(format!("decode student: {err}")))?;
    Ok(PendingSelection {
        id,
        student,
        class_id,
    })
}

#[async_trait]
impl SelectionRepository for DieselSelectionRepository {
    async fn insert(
        &self,
        selection: &PendingSelection,
    ) -> Result<SelectionInsertOutcome, SelectionRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool)?;

        let new_row = NewSelectionRow {
            id: selection.id,
            student: selection.student.as_ref(),
            class_id: selection.class_id,
        };

        match diesel::insert_into(pending_selections::table)
            .values(&new_row)
            .execute(&mut conn)
            .await
        {
            Ok(_) => Ok(SelectionInsertOutcome::Inserted),
            Err(err) if is_unique_violation(&err) => Ok(SelectionInsertOutcome::Duplicate),
            Err(err) => Err(map_diesel(err)),
        }
    }

    async fn list_for_student(
        &self,
        student: &SubjectId,
    ) -> Result<Vec<PendingSelection>, SelectionRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool)?;

        let rows: Vec<SelectionRow> = pending_selections::table
            .filter(pending_selections::student.eq(student.as_ref()))
            .order(pending_selections::created_at.asc())
            .select(SelectionRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel)?;

        rows.into_iter().map(row_to_selection).collect()
    }

    async fn delete(
        &self,
        id: &Uuid,
        student: &SubjectId,
    ) -> Result<bool, SelectionRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool)?;

        let deleted = diesel::delete(
            pending_selections::table.filter(
                pending_selections::id
                    .eq(id)
                    .and(pending_selections::student.eq(student.as_ref())),
            ),
        )
        .execute(&mut conn)
        .await
        .map_err(map_diesel)?;

        Ok(deleted > 0)
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for row conversion edge cases.
    use chrono::Utc;
    use rstest::{fixture, rstest};

    use super::*;

    #[fixture]
    fn valid_row() -> SelectionRow {
        SelectionRow {
            id: Uuid::new_v4(),
            student: "sam@example.com".to_owned(),
            class_id: Uuid::new_v4(),
            created_at: Utc::now(),
        }
    }

    #[rstest]
    fn row_conversion_builds_selection(valid_row: SelectionRow) {
        let selection = row_to_selection(valid_row.clone()).expect("valid row");
        assert_eq!(selection.id, valid_row.id);
        assert_eq!(selection.class_id, valid_row.class_id);
    }

    #[rstest]
    fn row_conversion_rejects_malformed_student(mut valid_row: SelectionRow) {
        valid_row.student = "not-an-email".to_owned();
        let error = row_to_selection(valid_row).expect_err("malformed student should fail");
        assert!(matches!(error, SelectionRepositoryError::Query { .. }));
    }
}
