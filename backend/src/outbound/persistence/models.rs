//! Row structs mapping Diesel tables onto validated domain constructors.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use rust_decimal::Decimal;
use uuid::Uuid;

use super::schema::{class_offerings, enrollment_records, pending_selections, users};

/// Read model for the `users` table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct UserRow {
    pub id: Uuid,
    pub subject: String,
    pub role: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Insert model for the `users` table; timestamps use column defaults.
#[derive(Debug, Insertable)]
#[diesel(table_name = users)]
pub struct NewUserRow<'a> {
    pub id: Uuid,
    pub subject: &'a str,
    pub role: &'a str,
}

/// Read model for the `class_offerings` table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = class_offerings)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ClassRow {
    pub id: Uuid,
    pub instructor: String,
    pub name: String,
    pub image_url: Option<String>,
    pub capacity: i32,
    pub enrolled_count: i32,
    pub status: String,
    pub feedback: Option<String>,
    pub price: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Insert model for the `class_offerings` table.
#[derive(Debug, Insertable)]
#[diesel(table_name = class_offerings)]
pub struct NewClassRow<'a> {
    pub id: Uuid,
    pub instructor: &'a str,
    pub name: &'a str,
    pub image_url: Option<&'a str>,
    pub capacity: i32,
    pub enrolled_count: i32,
    pub status: &'a str,
    pub feedback: Option<&'a str>,
    pub price: Decimal,
}

/// Changeset applying optional detail edits; `None` fields stay untouched.
#[derive(Debug, AsChangeset)]
#[diesel(table_name = class_offerings)]
pub struct ClassDetailsChangeset<'a> {
    pub name: Option<&'a str>,
    pub image_url: Option<&'a str>,
    pub price: Option<Decimal>,
}

/// Read model for the `pending_selections` table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = pending_selections)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct SelectionRow {
    pub id: Uuid,
    pub student: String,
    pub class_id: Uuid,
    pub created_at: DateTime<Utc>,
}

/// Insert model for the `pending_selections` table.
#[derive(Debug, Insertable)]
#[diesel(table_name = pending_selections)]
pub struct NewSelectionRow<'a> {
    pub id: Uuid,
    pub student: &'a str,
    pub class_id: Uuid,
}

/// Read model for the `enrollment_records` table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = enrollment_records)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct EnrollmentRow {
    pub id: Uuid,
    pub student: String,
    pub class_id: Uuid,
    pub amount: Decimal,
    pub payment_reference: String,
    pub enrolled_at: DateTime<Utc>,
}

/// Insert model for the `enrollment_records` table; the domain timestamp is
/// preserved rather than re-stamped by the database.
#[derive(Debug, Insertable)]
#[diesel(table_name = enrollment_records)]
pub struct NewEnrollmentRow<'a> {
    pub id: Uuid,
    pub student: &'a str,
    pub class_id: Uuid,
    pub amount: Decimal,
    pub payment_reference: &'a str,
    pub enrolled_at: DateTime<Utc>,
}
