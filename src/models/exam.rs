// src/models/exam.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// Represents the 'exams' table in the database.
///
/// There is no stored status column: the lifecycle is derived from the four
/// window timestamps against the server clock on every request.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Exam {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub reg_start_time: DateTime<Utc>,
    pub reg_end_time: DateTime<Utc>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub duration_minutes: i64,
    pub max_score: i64,
    pub question_file_url: Option<String>,
    pub announcement: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

/// Time-derived lifecycle state of an exam.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExamWindow {
    Upcoming,
    RegistrationOpen,
    AwaitingStart,
    Ongoing,
    Concluded,
}

impl ExamWindow {
    /// Computes the window state at a given instant.
    ///
    /// The server clock is the sole authority; any client-side countdown is
    /// advisory UI. Boundaries are inclusive on both registration and exam
    /// windows.
    pub fn at(exam: &Exam, now: DateTime<Utc>) -> Self {
        if now < exam.reg_start_time {
            ExamWindow::Upcoming
        } else if now <= exam.reg_end_time {
            ExamWindow::RegistrationOpen
        } else if now < exam.start_time {
            ExamWindow::AwaitingStart
        } else if now <= exam.end_time {
            ExamWindow::Ongoing
        } else {
            ExamWindow::Concluded
        }
    }
}

/// Exam plus its computed window, as returned by list/detail endpoints.
#[derive(Debug, Serialize)]
pub struct ExamWithWindow {
    #[serde(flatten)]
    pub exam: Exam,
    pub window: ExamWindow,
}

/// Represents the 'exam_registrations' table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ExamRegistration {
    pub id: i64,
    pub user_id: i64,
    pub exam_id: i64,
    pub created_at: Option<DateTime<Utc>>,
}

/// Represents the 'exam_submissions' table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ExamSubmission {
    pub id: i64,
    pub user_id: i64,
    pub exam_id: i64,
    pub submission_file_url: Option<String>,
    pub answers: Option<serde_json::Value>,
    pub submitted_at: DateTime<Utc>,
    pub score: Option<i64>,
    pub feedback: Option<String>,
    pub graded_at: Option<DateTime<Utc>>,
}

/// Submission joined with exam name, for profile listings.
#[derive(Debug, FromRow, Serialize)]
pub struct SubmissionWithExam {
    pub id: i64,
    pub exam_id: i64,
    pub exam_name: String,
    pub submission_file_url: Option<String>,
    pub submitted_at: DateTime<Utc>,
    pub score: Option<i64>,
    pub feedback: Option<String>,
}

/// DTO for creating an exam. Admin only.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateExamRequest {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    #[validate(length(max = 5000))]
    pub description: Option<String>,
    pub reg_start_time: DateTime<Utc>,
    pub reg_end_time: DateTime<Utc>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    #[validate(range(min = 1, max = 1440))]
    pub duration_minutes: i64,
    #[validate(range(min = 1))]
    pub max_score: Option<i64>,
    #[validate(url)]
    pub question_file_url: Option<String>,
    #[validate(length(max = 5000))]
    pub announcement: Option<String>,
}

/// DTO for updating an exam. Fields are optional. Admin only.
#[derive(Debug, Deserialize)]
pub struct UpdateExamRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub reg_start_time: Option<DateTime<Utc>>,
    pub reg_end_time: Option<DateTime<Utc>>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub duration_minutes: Option<i64>,
    pub max_score: Option<i64>,
    pub question_file_url: Option<String>,
    pub announcement: Option<String>,
}

/// DTO for submitting an exam answer artifact.
#[derive(Debug, Deserialize)]
pub struct SubmitExamRequest {
    /// URL of the uploaded answer file. May be absent only when the server
    /// is configured to accept empty (timed-out) submissions.
    pub submission_file_url: Option<String>,
    /// Optional structured answers, stored verbatim.
    pub answers: Option<serde_json::Value>,
}

/// DTO for grading a submission. Admin only.
#[derive(Debug, Deserialize, Validate)]
pub struct GradeSubmissionRequest {
    pub submission_id: i64,
    #[validate(range(min = 0))]
    pub score: i64,
    #[validate(length(max = 5000))]
    pub feedback: Option<String>,
}

/// Checks the four window timestamps are consistently ordered:
/// reg_start <= reg_end <= start <= end.
pub fn window_ordering_ok(
    reg_start: DateTime<Utc>,
    reg_end: DateTime<Utc>,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> bool {
    reg_start <= reg_end && reg_end <= start && start <= end
}
