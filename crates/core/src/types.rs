/// Database primary keys for owner-scoped tables are PostgreSQL BIGSERIAL.
pub type DbId = i64;

/// Video job ids are generated by the submitting client.
pub type VideoId = uuid::Uuid;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;
