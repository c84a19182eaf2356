// src/models/branding.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// Represents the single-row 'site_config' table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct SiteConfig {
    pub id: i64,
    pub club_name: String,
    pub tagline: Option<String>,
    pub logo_url: Option<String>,
    pub contact_email: Option<String>,
    pub membership_fee: i64,
}

/// DTO for the branding upsert. Admin only.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateSiteConfigRequest {
    #[validate(length(min = 1, max = 200))]
    pub club_name: Option<String>,
    #[validate(length(max = 500))]
    pub tagline: Option<String>,
    #[validate(url)]
    pub logo_url: Option<String>,
    #[validate(email)]
    pub contact_email: Option<String>,
    #[validate(range(min = 0))]
    pub membership_fee: Option<i64>,
}
