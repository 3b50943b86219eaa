//! Diesel table definitions for the PostgreSQL schema.
//!
//! These definitions must match `backend/migrations` exactly. Regenerate with
//! `diesel print-schema` after changing a migration.

diesel::table! {
    /// Registered accounts.
    users (id) {
        /// Primary key.
        id -> Int8,
        /// Lowercased, unique email address.
        email -> Varchar,
        /// Display name, possibly empty.
        name -> Varchar,
        /// Argon2 PHC string.
        password_hash -> Text,
        /// Whether the account may authenticate.
        is_active -> Bool,
        /// Staff flag.
        is_staff -> Bool,
        /// Superuser flag; implies staff.
        is_superuser -> Bool,
        /// Registration timestamp.
        date_joined -> Timestamptz,
    }
}

diesel::table! {
    /// The single active API token of each user, stored as a digest.
    auth_tokens (user_id) {
        /// Owning user; also the primary key.
        user_id -> Int8,
        /// Hex SHA-256 of the token key.
        digest -> Varchar,
        /// Issue timestamp.
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// User-owned experience labels.
    tags (id) {
        /// Primary key.
        id -> Int8,
        /// Owner.
        user_id -> Int8,
        /// Label text.
        name -> Varchar,
    }
}

diesel::table! {
    /// User-owned places.
    locations (id) {
        /// Primary key.
        id -> Int8,
        /// Owner.
        user_id -> Int8,
        /// Place name.
        name -> Varchar,
        /// Free text, empty by default.
        description -> Varchar,
    }
}

diesel::table! {
    /// Bookable activities.
    experiences (id) {
        /// Primary key.
        id -> Int8,
        /// Owner.
        user_id -> Int8,
        /// Title.
        title -> Varchar,
        /// Duration in minutes, never negative.
        time_minutes -> Int4,
        /// NUMERIC(5, 2) price.
        price -> Numeric,
        /// Website, empty when unset.
        website -> Varchar,
        /// Where it happens.
        location_id -> Int8,
        /// Media-relative image path.
        image -> Nullable<Varchar>,
    }
}

diesel::table! {
    /// Many-to-many link between experiences and tags.
    experience_tags (experience_id, tag_id) {
        /// Linked experience.
        experience_id -> Int8,
        /// Linked tag.
        tag_id -> Int8,
    }
}

diesel::joinable!(auth_tokens -> users (user_id));
diesel::joinable!(tags -> users (user_id));
diesel::joinable!(locations -> users (user_id));
diesel::joinable!(experiences -> locations (location_id));
diesel::joinable!(experience_tags -> experiences (experience_id));
diesel::joinable!(experience_tags -> tags (tag_id));

diesel::allow_tables_to_appear_in_same_query!(
    users,
    auth_tokens,
    tags,
    locations,
    experiences,
    experience_tags,
);
