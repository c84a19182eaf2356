// src/models/gallery.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// Represents the 'gallery' table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct GalleryItem {
    pub id: i64,
    pub title: String,
    pub image_url: String,
    pub caption: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateGalleryItemRequest {
    #[validate(length(min = 1, max = 300))]
    pub title: String,
    #[validate(url)]
    pub image_url: String,
    #[validate(length(max = 1000))]
    pub caption: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateGalleryItemRequest {
    pub title: Option<String>,
    pub image_url: Option<String>,
    pub caption: Option<String>,
}
