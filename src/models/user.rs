// src/models/user.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// Represents the 'users' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct User {
    pub id: i64,

    /// Unique login email.
    pub email: String,

    /// Unique public handle.
    pub username: String,

    /// Argon2 password hash.
    /// Skipped during serialization to prevent leaking sensitive data.
    #[serde(skip)]
    pub password: String,

    /// User role: 'student', 'moderator' or 'admin'.
    pub role: String,

    pub full_name: String,
    pub institution: Option<String>,
    pub grade_level: Option<String>,

    /// Denormalized aggregate: achievement points + graded exam scores.
    /// Recomputed in the same transaction as any grade or achievement write.
    pub total_points: i64,

    /// Whether the email address has been confirmed via OTP.
    pub is_verified: bool,

    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// Aggregated user profile data for the current user.
#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub id: i64,
    pub email: String,
    pub username: String,
    pub role: String,
    pub full_name: String,
    pub institution: Option<String>,
    pub grade_level: Option<String>,
    pub total_points: i64,
    pub is_verified: bool,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
    pub registrations_count: i64,
    pub submissions_count: i64,
    pub achievements_count: i64,
    pub rank: i64,
}

/// DTO for creating a new user (Registration).
#[derive(Debug, Deserialize, Validate)]
pub struct CreateUserRequest {
    #[validate(email(message = "A valid email address is required."))]
    pub email: String,
    #[validate(length(
        min = 3,
        max = 50,
        message = "Username length must be between 3 and 50 characters."
    ))]
    pub username: String,
    #[validate(length(
        min = 8,
        max = 128,
        message = "Password length must be between 8 and 128 characters."
    ))]
    pub password: String,
    #[validate(length(min = 1, max = 100))]
    pub full_name: String,
    #[validate(length(max = 200))]
    pub institution: Option<String>,
    #[validate(length(max = 50))]
    pub grade_level: Option<String>,
}

/// DTO for user login.
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1, max = 128))]
    pub password: String,
}

/// DTO for consuming an email verification code.
#[derive(Debug, Deserialize, Validate)]
pub struct VerifyEmailRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(equal = 6, message = "Code must be 6 digits."))]
    pub code: String,
}

/// DTO for requesting a fresh verification code.
#[derive(Debug, Deserialize, Validate)]
pub struct ResendOtpRequest {
    #[validate(email)]
    pub email: String,
}

/// DTO for profile self-edit.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateProfileRequest {
    #[validate(length(min = 1, max = 100))]
    pub full_name: Option<String>,
    #[validate(length(max = 200))]
    pub institution: Option<String>,
    #[validate(length(max = 50))]
    pub grade_level: Option<String>,
}

/// A row on the public leaderboard.
#[derive(Debug, Serialize, FromRow)]
pub struct LeaderboardEntry {
    pub username: String,
    pub full_name: String,
    pub total_points: i64,
    /// 1-based rank, filled in after the ordered fetch.
    #[sqlx(default)]
    pub rank: i64,
}
