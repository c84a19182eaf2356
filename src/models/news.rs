// src/models/news.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// Represents the 'news' table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct News {
    pub id: i64,
    pub title: String,
    /// Sanitized HTML body.
    pub body: String,
    pub cover_img: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateNewsRequest {
    #[validate(length(min = 1, max = 300))]
    pub title: String,
    #[validate(length(min = 1, max = 50000))]
    pub body: String,
    #[validate(url)]
    pub cover_img: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateNewsRequest {
    pub title: Option<String>,
    pub body: Option<String>,
    pub cover_img: Option<String>,
}
