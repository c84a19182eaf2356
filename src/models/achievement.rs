// src/models/achievement.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// Represents the 'achievements' table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Achievement {
    pub id: i64,
    pub user_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub points: i64,
    pub awarded_at: Option<DateTime<Utc>>,
}

/// DTO for awarding an achievement. Admin only.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateAchievementRequest {
    pub user_id: i64,
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[validate(length(max = 2000))]
    pub description: Option<String>,
    #[validate(range(min = 0, max = 10000))]
    pub points: i64,
}
