//! PostgreSQL-backed `ClassRepository` implementation using Diesel ORM.
//!
//! The seat counters are only ever touched through single conditional
//! `UPDATE` statements, so the guard and the write commit as one atomic unit
//! and concurrent purchases cannot oversell a class.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use uuid::Uuid;

use crate::domain::ports::{
    CapacityUpdateOutcome, ClassDetailsUpdate, ClassRepository, ClassRepositoryError,
    ReserveSeatOutcome,
};
use crate::domain::{ApprovalStatus, ClassOffering, ClassOfferingDraft, SubjectId};

use super::error_mapping::{map_diesel_error, map_pool_error};
use super::models::{ClassDetailsChangeset, ClassRow, NewClassRow};
use super::pool::{DbPool, PoolError};
use super::schema::class_offerings;

/// Diesel-backed implementation of the class repository port.
#[derive(Clone)]
pub struct DieselClassRepository {
    pool: DbPool,
}

impl DieselClassRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    async fn exists(
        &self,
        conn: &mut diesel_async::pooled_connection::bb8::PooledConnection<
            '_,
            diesel_async::AsyncPgConnection,
        >,
        id: &Uuid,
    ) -> Result<bool, ClassRepositoryError> {
        let count: i64 = class_offerings::table
            .filter(class_offerings::id.eq(id))
            .count()
            .get_result(conn)
            .await
            .map_err(map_diesel)?;
        Ok(count > 0)
    }
}

fn map_pool(error: PoolError) -> ClassRepositoryError {
    map_pool_error(error, ClassRepositoryError::connection)
}

fn map_diesel(error: diesel::result::Error) -> ClassRepositoryError {
    map_diesel_error(
        error,
        ClassRepositoryError::query,
        ClassRepositoryError::connection,
    )
}

/// Convert a database row into a validated class offering.
fn row_to_class(row: ClassRow) -> Result<ClassOffering, ClassRepositoryError> {
    let ClassRow {
        id,
        instructor,
        name,
        image_url,
        capacity,
        enrolled_count,
        status,
        feedback,
        price,
        created_at: _,
        updated_at: _,
    } = row;

    let instructor = SubjectId::new(instructor)
        .map_err(|err| ClassRepositoryError::query(format!("decode instructor: {err}")))?;
    let status: ApprovalStatus = status
        .parse()
        .map_err(|err| ClassRepositoryError::query(format!("decode status: {err}")))?;

    ClassOffering::new(ClassOfferingDraft {
        id,
        instructor,
        name,
        image_url,
        capacity,
        enrolled_count,
        status,
        feedback,
        price,
    })
    .map_err(|err| ClassRepositoryError::query(err.to_string()))
}

fn rows_to_classes(rows: Vec<ClassRow>) -> Result<Vec<ClassOffering>, ClassRepositoryError> {
    rows.into_iter().map(row_to_class).collect()
}

#[async_trait]
impl ClassRepository for DieselClassRepository {
    async fn insert(&self, class: &ClassOffering) -> Result<(), ClassRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool)?;

        let new_row = NewClassRow {
            id: class.id(),
            instructor: class.instructor().as_ref(),
            name: class.name(),
            image_url: class.image_url(),
            capacity: class.capacity(),
            enrolled_count: class.enrolled_count(),
            status: class.status().as_str(),
            feedback: class.feedback(),
            price: class.price(),
        };

        diesel::insert_into(class_offerings::table)
            .values(&new_row)
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(map_diesel)
    }

    async fn find_by_id(&self, id: &Uuid) -> Result<Option<ClassOffering>, ClassRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool)?;

        let row = class_offerings::table
            .filter(class_offerings::id.eq(id))
            .select(ClassRow::as_select())
            .first::<ClassRow>(&mut conn)
            .await
            .optional()
            .map_err(map_diesel)?;

        row.map(row_to_class).transpose()
    }

    async fn list_by_status(
        &self,
        status: ApprovalStatus,
    ) -> Result<Vec<ClassOffering>, ClassRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool)?;

        let rows: Vec<ClassRow> = class_offerings::table
            .filter(class_offerings::status.eq(status.as_str()))
            .order(class_offerings::created_at.desc())
            .select(ClassRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel)?;

        rows_to_classes(rows)
    }

    async fn list_all(&self) -> Result<Vec<ClassOffering>, ClassRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool)?;

        let rows: Vec<ClassRow> = class_offerings::table
            .order(class_offerings::created_at.desc())
            .select(ClassRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel)?;

        rows_to_classes(rows)
    }

    async fn list_by_instructor(
        &self,
        instructor: &SubjectId,
    ) -> Result<Vec<ClassOffering>, ClassRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool)?;

        let rows: Vec<ClassRow> = class_offerings::table
            .filter(class_offerings::instructor.eq(instructor.as_ref()))
            .order(class_offerings::created_at.desc())
            .select(ClassRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel)?;

        rows_to_classes(rows)
    }

    async fn list_popular(&self, limit: i64) -> Result<Vec<ClassOffering>, ClassRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool)?;

        let rows: Vec<ClassRow> = class_offerings::table
            .filter(class_offerings::status.eq(ApprovalStatus::Approved.as_str()))
            .order(class_offerings::enrolled_count.desc())
            .limit(limit)
            .select(ClassRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel)?;

        rows_to_classes(rows)
    }

    async fn update_details(
        &self,
        id: &Uuid,
        changes: &ClassDetailsUpdate,
    ) -> Result<Option<ClassOffering>, ClassRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool)?;

        let changeset = ClassDetailsChangeset {
            name: changes.name.as_deref(),
            image_url: changes.image_url.as_deref(),
            price: changes.price,
        };

        let row = diesel::update(class_offerings::table.filter(class_offerings::id.eq(id)))
            .set(&changeset)
            .returning(ClassRow::as_returning())
            .get_result::<ClassRow>(&mut conn)
            .await
            .optional()
            .map_err(map_diesel)?;

        row.map(row_to_class).transpose()
    }

    async fn set_status(
        &self,
        id: &Uuid,
        status: ApprovalStatus,
    ) -> Result<Option<ClassOffering>, ClassRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool)?;

        let row = diesel::update(class_offerings::table.filter(class_offerings::id.eq(id)))
            .set(class_offerings::status.eq(status.as_str()))
            .returning(ClassRow::as_returning())
            .get_result::<ClassRow>(&mut conn)
            .await
            .optional()
            .map_err(map_diesel)?;

        row.map(row_to_class).transpose()
    }

    async fn set_feedback(
        &self,
        id: &Uuid,
        feedback: &str,
    ) -> Result<Option<ClassOffering>, ClassRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool)?;

        let row = diesel::update(class_offerings::table.filter(class_offerings::id.eq(id)))
            .set(class_offerings::feedback.eq(feedback))
            .returning(ClassRow::as_returning())
            .get_result::<ClassRow>(&mut conn)
            .await
            .optional()
            .map_err(map_diesel)?;

        row.map(row_to_class).transpose()
    }

    async fn reserve_seat(&self, id: &Uuid) -> Result<ReserveSeatOutcome, ClassRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool)?;

        // Guard and increment in one statement: two racing purchases for the
        // last seat resolve to one row update and one zero-row update.
        let updated = diesel::update(
            class_offerings::table.filter(
                class_offerings::id
                    .eq(id)
                    .and(class_offerings::enrolled_count.lt(class_offerings::capacity)),
            ),
        )
        .set(class_offerings::enrolled_count.eq(class_offerings::enrolled_count + 1))
        .execute(&mut conn)
        .await
        .map_err(map_diesel)?;

        if updated == 1 {
            return Ok(ReserveSeatOutcome::Reserved);
        }
        if self.exists(&mut conn, id).await? {
            Ok(ReserveSeatOutcome::SoldOut)
        } else {
            Ok(ReserveSeatOutcome::NotFound)
        }
    }

    async fn release_seat(&self, id: &Uuid) -> Result<(), ClassRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool)?;

        // The `> 0` guard floors the counter at zero; a missing class is a
        // no-op so compensation cannot mask the failure it follows.
        diesel::update(
            class_offerings::table.filter(
                class_offerings::id
                    .eq(id)
                    .and(class_offerings::enrolled_count.gt(0)),
            ),
        )
        .set(class_offerings::enrolled_count.eq(class_offerings::enrolled_count - 1))
        .execute(&mut conn)
        .await
        .map(|_| ())
        .map_err(map_diesel)
    }

    async fn set_capacity(
        &self,
        id: &Uuid,
        capacity: i32,
    ) -> Result<CapacityUpdateOutcome, ClassRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool)?;

        let updated = diesel::update(
            class_offerings::table.filter(
                class_offerings::id
                    .eq(id)
                    .and(class_offerings::enrolled_count.le(capacity)),
            ),
        )
        .set(class_offerings::capacity.eq(capacity))
        .execute(&mut conn)
        .await
        .map_err(map_diesel)?;

        if updated == 1 {
            return Ok(CapacityUpdateOutcome::Updated);
        }
        if self.exists(&mut conn, id).await? {
            Ok(CapacityUpdateOutcome::BelowEnrollment)
        } else {
            Ok(CapacityUpdateOutcome::NotFound)
        }
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for error mapping and row conversion edge cases.
    use chrono::Utc;
    use rstest::{fixture, rstest};
    use rust_decimal::Decimal;

    use super::*;

    #[fixture]
    fn valid_row() -> ClassRow {
        let now = Utc::now();
        ClassRow {
            id: Uuid::new_v4(),
            instructor: "ida@example.com".to_owned(),
            name: "Beginner violin".to_owned(),
            image_url: None,
            capacity: 10,
            enrolled_count: 4,
            status: "approved".to_owned(),
            feedback: None,
            price: Decimal::new(4999, 2),
            created_at: now,
            updated_at: now,
        }
    }

    #[rstest]
    fn row_conversion_builds_class(valid_row: ClassRow) {
        let class = row_to_class(valid_row).expect("valid row");
        assert_eq!(class.available_seats(), 6);
        assert_eq!(class.status(), ApprovalStatus::Approved);
    }

    #[rstest]
    fn row_conversion_rejects_unknown_status(mut valid_row: ClassRow) {
        valid_row.status = "archived".to_owned();
        let error = row_to_class(valid_row).expect_err("unknown status should fail");
        assert!(matches!(error, ClassRepositoryError::Query { .. }));
        assert!(error.to_string().contains("decode status"));
    }

    #[rstest]
    fn row_conversion_rejects_broken_counters(mut valid_row: ClassRow) {
        valid_row.enrolled_count = valid_row.capacity + 1;
        let error = row_to_class(valid_row).expect_err("broken counters should fail");
        assert!(matches!(error, ClassRepositoryError::Query { .. }));
    }

    #[rstest]
    fn diesel_error_maps_to_query_error() {
        let repo_err = map_diesel(diesel::result::Error::NotFound);
        assert!(matches!(repo_err, ClassRepositoryError::Query { .. }));
        assert!(repo_err.to_string().contains("record not found"));
    }
}
