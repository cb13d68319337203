//! PostgreSQL-backed `EnrollmentRepository` implementation using Diesel ORM.
//!
//! The table is append-only; the unique `payment_reference` column is what
//! makes purchase retries idempotent.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::domain::ports::{EnrollmentRepository, EnrollmentRepositoryError};
use crate::domain::{EnrollmentRecord, SubjectId};

use super::error_mapping::{map_diesel_error, map_pool_error};
use super::models::{EnrollmentRow, NewEnrollmentRow};
use super::pool::{DbPool, PoolError};
use super::schema::enrollment_records;

/// Diesel-backed implementation of the enrollment repository port.
#[derive(Clone)]
pub struct DieselEnrollmentRepository {
    pool: DbPool,
}

impl DieselEnrollmentRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool(error: PoolError) -> EnrollmentRepositoryError {
    map_pool_error(error, EnrollmentRepositoryError::connection)
}

fn map_diesel(error: diesel::result::Error) -> EnrollmentRepositoryError {
    map_diesel_error(
        error,
        EnrollmentRepositoryError::query,
        EnrollmentRepositoryError::connection,
    )
}

/// Convert a database row into a validated enrollment record.
fn row_to_record(row: EnrollmentRow) -> Result<EnrollmentRecord, EnrollmentRepositoryError> {
    let EnrollmentRow {
        id,
        student,
        class_id,
        amount,
        payment_reference,
        enrolled_at,
    } = row;
    let student = SubjectId::new(student)
        .map_err(|err| EnrollmentRepositoryError::query(format!("decode student: {err}")))?;
    EnrollmentRecord::from_parts(id, student, class_id, amount, payment_reference, enrolled_at)
        .map_err(|err| EnrollmentRepositoryError::query(err.to_string()))
}

#[async_trait]
impl EnrollmentRepository for DieselEnrollmentRepository {
    async fn append(&self, record: &EnrollmentRecord) -> Result<(), EnrollmentRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool)?;

        let new_row = NewEnrollmentRow {
            id: record.id(),
            student: record.student().as_ref(),
            class_id: record.class_id(),
            amount: record.amount(),
            payment_reference: record.payment_reference(),
            enrolled_at: record.enrolled_at(),
        };

        diesel::insert_into(enrollment_records::table)
            .values(&new_row)
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(map_diesel)
    }

    async fn find_by_payment_reference(
        &self,
        reference: &str,
    ) -> Result<Option<EnrollmentRecord>, EnrollmentRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool)?;

        let row = enrollment_records::table
            .filter(enrollment_records::payment_reference.eq(reference))
            .select(EnrollmentRow::as_select())
            .first::<EnrollmentRow>(&mut conn)
            .await
            .optional()
            .map_err(map_diesel)?;

        row.map(row_to_record).transpose()
    }

    async fn list_for_student(
        &self,
        student: &SubjectId,
    ) -> Result<Vec<EnrollmentRecord>, EnrollmentRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool)?;

        let rows: Vec<EnrollmentRow> = enrollment_records::table
            .filter(enrollment_records::student.eq(student.as_ref()))
            .order(enrollment_records::enrolled_at.desc())
            .select(EnrollmentRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel)?;

        rows.into_iter().map(row_to_record).collect()
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for row conversion edge cases.
    use chrono::Utc;
    use rstest::{fixture, rstest};
    use rust_decimal::Decimal;
    use uuid::Uuid;

    use super::*;

    #[fixture]
    fn valid_row() -> EnrollmentRow {
        EnrollmentRow {
            id: Uuid::new_v4(),
            student: "sam@example.com".to_owned(),
            class_id: Uuid::new_v4(),
            amount: Decimal::new(4999, 2),
            payment_reference: "pi_abc123".to_owned(),
            enrolled_at: Utc::now(),
        }
    }

    #[rstest]
    fn row_conversion_builds_record(valid_row: EnrollmentRow) {
        let record = row_to_record(valid_row.clone()).expect("valid row");
        assert_eq!(record.payment_reference(), "pi_abc123");
        assert_eq!(record.amount(), valid_row.amount);
    }

    #[rstest]
    fn row_conversion_rejects_blank_reference(mut valid_row: EnrollmentRow) {
        valid_row.payment_reference = " ".to_owned();
        let error = row_to_record(valid_row).expect_err("blank reference should fail");
        assert!(matches!(error, EnrollmentRepositoryError::Query { .. }));
    }
}
