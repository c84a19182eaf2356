// src/handlers/payment.rs

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use sqlx::PgPool;
use validator::Validate;

use crate::{
    error::AppError,
    handlers::exam::require_verified_user,
    models::payment::{CreatePaymentRequest, Payment, PaymentStatus, ReviewPaymentRequest},
    utils::jwt::Claims,
};

const SELECT_PAYMENT: &str = r#"
    SELECT id, user_id, amount, note, method, transaction_id, status, created_at, reviewed_at
    FROM payments
"#;

/// Student claims a payment. Always created as PENDING.
pub async fn create_payment(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<CreatePaymentRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    // Cash payments are handed over in person; everything else needs the
    // provider's transaction reference for verification.
    if !payload.method.eq_ignore_ascii_case("cash")
        && payload
            .transaction_id
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .is_none()
    {
        return Err(AppError::BadRequest(
            "A transaction ID is required for this payment method".to_string(),
        ));
    }

    let user = require_verified_user(&pool, claims.user_id()).await?;

    let payment = sqlx::query_as::<_, Payment>(
        r#"
        INSERT INTO payments (user_id, amount, note, method, transaction_id)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id, user_id, amount, note, method, transaction_id, status, created_at, reviewed_at
        "#,
    )
    .bind(user.id)
    .bind(payload.amount)
    .bind(&payload.note)
    .bind(&payload.method)
    .bind(&payload.transaction_id)
    .fetch_one(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to create payment: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    Ok((StatusCode::CREATED, Json(payment)))
}

/// Student's own payment history, newest first. Read-only once submitted.
pub async fn list_my_payments(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let payments = sqlx::query_as::<_, Payment>(&format!(
        "{} WHERE user_id = $1 ORDER BY created_at DESC",
        SELECT_PAYMENT
    ))
    .bind(claims.user_id())
    .fetch_all(&pool)
    .await?;

    Ok(Json(payments))
}

#[derive(Debug, Deserialize)]
pub struct ListPaymentsParams {
    pub status: Option<String>,
}

/// Lists all payments, optionally filtered by status. Admin only.
pub async fn list_payments(
    State(pool): State<PgPool>,
    Query(params): Query<ListPaymentsParams>,
) -> Result<impl IntoResponse, AppError> {
    if let Some(status) = &params.status
        && PaymentStatus::parse(status).is_none()
    {
        return Err(AppError::BadRequest("Unknown payment status".to_string()));
    }

    let payments = sqlx::query_as::<_, Payment>(&format!(
        "{} WHERE ($1::TEXT IS NULL OR status = $1) ORDER BY created_at DESC",
        SELECT_PAYMENT
    ))
    .bind(&params.status)
    .fetch_all(&pool)
    .await?;

    Ok(Json(payments))
}

/// Reviews a pending payment: PENDING -> VERIFIED or PENDING -> REJECTED.
/// Admin only. Terminal states never transition again.
pub async fn review_payment(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
    Json(payload): Json<ReviewPaymentRequest>,
) -> Result<impl IntoResponse, AppError> {
    if !PaymentStatus::Pending.can_transition_to(payload.status) {
        return Err(AppError::BadRequest(
            "Payments can only be verified or rejected".to_string(),
        ));
    }

    // Guarded update: the WHERE clause is the transition check, so two
    // concurrent reviews cannot both take effect.
    let updated = sqlx::query_as::<_, Payment>(
        r#"
        UPDATE payments
        SET status = $1, reviewed_at = NOW()
        WHERE id = $2 AND status = 'PENDING'
        RETURNING id, user_id, amount, note, method, transaction_id, status, created_at, reviewed_at
        "#,
    )
    .bind(payload.status.as_str())
    .bind(id)
    .fetch_optional(&pool)
    .await?;

    match updated {
        Some(payment) => Ok(Json(payment)),
        None => {
            let existing =
                sqlx::query_as::<_, Payment>(&format!("{} WHERE id = $1", SELECT_PAYMENT))
                    .bind(id)
                    .fetch_optional(&pool)
                    .await?;

            match existing {
                Some(p) => Err(AppError::Conflict(format!(
                    "Payment has already been {}",
                    p.status.to_lowercase()
                ))),
                None => Err(AppError::NotFound("Payment not found".to_string())),
            }
        }
    }
}
