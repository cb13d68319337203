//! Diesel table definitions for the PostgreSQL schema.
//!
//! These definitions must match the migrations under `backend/migrations`
//! exactly; Diesel uses them for compile-time query validation and type-safe
//! SQL generation.

diesel::table! {
    /// Subject directory backing authorization decisions.
    users (id) {
        /// Primary key: UUID v4 identifier.
        id -> Uuid,
        /// Subject identifier (email address), unique.
        subject -> Varchar,
        /// Marketplace role name (`unassigned`, `student`, `instructor`, `admin`).
        role -> Varchar,
        /// Record creation timestamp.
        created_at -> Timestamptz,
        /// Last modification timestamp (auto-updated by trigger).
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Published classes with their seat-capacity counters.
    ///
    /// `enrolled_count <= capacity` is enforced by a table constraint and by
    /// the conditional updates in the class repository.
    class_offerings (id) {
        /// Primary key: UUID v4 identifier.
        id -> Uuid,
        /// Owning instructor's subject identifier.
        instructor -> Varchar,
        /// Display name.
        name -> Varchar,
        /// Optional cover image reference.
        image_url -> Nullable<Varchar>,
        /// Total seat capacity.
        capacity -> Int4,
        /// Seats currently taken.
        enrolled_count -> Int4,
        /// Review state (`pending`, `approved`, `denied`).
        status -> Varchar,
        /// Optional reviewer feedback.
        feedback -> Nullable<Text>,
        /// Price charged on purchase.
        price -> Numeric,
        /// Record creation timestamp.
        created_at -> Timestamptz,
        /// Last modification timestamp (auto-updated by trigger).
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Students' unconfirmed purchase intents.
    pending_selections (id) {
        /// Primary key: UUID v4 identifier.
        id -> Uuid,
        /// Owning student's subject identifier.
        student -> Varchar,
        /// Referenced class offering.
        class_id -> Uuid,
        /// Record creation timestamp.
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Append-only log of confirmed, paid enrollments.
    enrollment_records (id) {
        /// Primary key: UUID v4 identifier.
        id -> Uuid,
        /// Enrolled student's subject identifier.
        student -> Varchar,
        /// Purchased class offering.
        class_id -> Uuid,
        /// Amount paid.
        amount -> Numeric,
        /// Payment processor reference, unique; the purchase idempotency key.
        payment_reference -> Varchar,
        /// When the enrollment was recorded.
        enrolled_at -> Timestamptz,
    }
}

diesel::allow_tables_to_appear_in_same_query!(
    users,
    class_offerings,
    pending_selections,
    enrollment_records,
);
