use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct UploadedFile {
    pub id: i64,
    pub filename: String,
    pub file_path: String,
    pub upload_date: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewUploadedFile {
    pub filename: String,
    pub file_path: String,
}
