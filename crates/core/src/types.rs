/// Job identifiers are opaque strings, e.g. `image_spring_42_3f9a1c2b`.
pub type JobId = String;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;
