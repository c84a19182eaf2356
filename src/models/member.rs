// src/models/member.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// Represents the 'members' table: the public directory of club people.
/// Independent of login accounts.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Member {
    pub id: i64,
    pub name: String,
    pub position: String,
    pub photo_url: Option<String>,
    pub batch: Option<String>,
    pub display_order: i64,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateMemberRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[validate(length(min = 1, max = 100))]
    pub position: String,
    #[validate(url)]
    pub photo_url: Option<String>,
    #[validate(length(max = 50))]
    pub batch: Option<String>,
    pub display_order: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateMemberRequest {
    pub name: Option<String>,
    pub position: Option<String>,
    pub photo_url: Option<String>,
    pub batch: Option<String>,
    pub display_order: Option<i64>,
}
