/// All record identifiers are opaque UUID v4 strings, assigned once and never reused.
pub type RecordId = String;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Calendar dates (`YYYY-MM-DD`) carry no time zone.
pub type Date = chrono::NaiveDate;

/// Generate a fresh record identifier.
pub fn new_record_id() -> RecordId {
    uuid::Uuid::new_v4().to_string()
}

/// Check that `id` has the shape of an identifier produced by [`new_record_id`].
pub fn is_valid_record_id(id: &str) -> bool {
    uuid::Uuid::parse_str(id).is_ok()
}
