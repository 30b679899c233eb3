//! Diesel table definitions for the PostgreSQL schema.
//!
//! These definitions must match `backend/migrations` exactly. When a
//! migration changes the table, regenerate with `diesel print-schema` or
//! update by hand.

diesel::table! {
    /// Deduplicated cities.
    ///
    /// `(name, country_code)` is unique (`cities_name_country_code_key`) and
    /// both parts are stored normalized.
    cities (id) {
        id -> Uuid,
        name -> Varchar,
        country_code -> Varchar,
        /// Set together with `latitude` or not at all.
        longitude -> Nullable<Float8>,
        latitude -> Nullable<Float8>,
        image_url -> Nullable<Text>,
        /// Never negative.
        plan_count -> Int8,
        trending_score -> Float8,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}
