// src/models/activity.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// Represents the 'activities' table (club events, sessions, outings).
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Activity {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub activity_date: DateTime<Utc>,
    pub location: Option<String>,
    pub cover_img: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateActivityRequest {
    #[validate(length(min = 1, max = 300))]
    pub title: String,
    #[validate(length(max = 10000))]
    pub description: Option<String>,
    pub activity_date: DateTime<Utc>,
    #[validate(length(max = 300))]
    pub location: Option<String>,
    #[validate(url)]
    pub cover_img: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateActivityRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub activity_date: Option<DateTime<Utc>>,
    pub location: Option<String>,
    pub cover_img: Option<String>,
}
