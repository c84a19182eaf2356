// src/handlers/content.rs

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use sqlx::{PgPool, Postgres, QueryBuilder};
use validator::Validate;

use crate::{
    error::AppError,
    models::{
        activity::{Activity, CreateActivityRequest, UpdateActivityRequest},
        branding::{SiteConfig, UpdateSiteConfigRequest},
        gallery::{CreateGalleryItemRequest, GalleryItem, UpdateGalleryItemRequest},
        member::{CreateMemberRequest, Member, UpdateMemberRequest},
        news::{CreateNewsRequest, News, UpdateNewsRequest},
    },
    utils::html::clean_html,
};

// ---------------------------------------------------------------------------
// News
// ---------------------------------------------------------------------------

/// Lists published news, newest first. Public.
pub async fn list_news(State(pool): State<PgPool>) -> Result<impl IntoResponse, AppError> {
    let news = sqlx::query_as::<_, News>(
        "SELECT id, title, body, cover_img, published_at FROM news ORDER BY published_at DESC",
    )
    .fetch_all(&pool)
    .await?;

    Ok(Json(news))
}

/// Retrieves a single news item. Public.
pub async fn get_news(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let item = sqlx::query_as::<_, News>(
        "SELECT id, title, body, cover_img, published_at FROM news WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(&pool)
    .await?
    .ok_or(AppError::NotFound("News item not found".to_string()))?;

    Ok(Json(item))
}

/// Creates a news item. Staff only. The body is sanitized before storage.
pub async fn create_news(
    State(pool): State<PgPool>,
    Json(payload): Json<CreateNewsRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let item = sqlx::query_as::<_, News>(
        r#"
        INSERT INTO news (title, body, cover_img)
        VALUES ($1, $2, $3)
        RETURNING id, title, body, cover_img, published_at
        "#,
    )
    .bind(&payload.title)
    .bind(clean_html(&payload.body))
    .bind(&payload.cover_img)
    .fetch_one(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to create news: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    Ok((StatusCode::CREATED, Json(item)))
}

/// Updates a news item by ID and returns the updated row. Staff only.
pub async fn update_news(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateNewsRequest>,
) -> Result<impl IntoResponse, AppError> {
    if payload.title.is_none() && payload.body.is_none() && payload.cover_img.is_none() {
        // Nothing to change; answer with the current row (or 404).
        let item = sqlx::query_as::<_, News>(
            "SELECT id, title, body, cover_img, published_at FROM news WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&pool)
        .await?
        .ok_or(AppError::NotFound("News item not found".to_string()))?;
        return Ok(Json(item));
    }

    let mut builder: QueryBuilder<Postgres> = QueryBuilder::new("UPDATE news SET ");
    let mut separated = builder.separated(", ");

    if let Some(title) = payload.title {
        separated.push("title = ");
        separated.push_bind_unseparated(title);
    }

    if let Some(body) = payload.body {
        separated.push("body = ");
        separated.push_bind_unseparated(clean_html(&body));
    }

    if let Some(cover_img) = payload.cover_img {
        separated.push("cover_img = ");
        separated.push_bind_unseparated(cover_img);
    }

    builder.push(" WHERE id = ");
    builder.push_bind(id);
    builder.push(" RETURNING id, title, body, cover_img, published_at");

    let item = builder
        .build_query_as::<News>()
        .fetch_optional(&pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to update news: {:?}", e);
            AppError::InternalServerError(e.to_string())
        })?
        .ok_or(AppError::NotFound("News item not found".to_string()))?;

    Ok(Json(item))
}

/// Deletes a news item by ID. Staff only.
pub async fn delete_news(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let result = sqlx::query("DELETE FROM news WHERE id = $1")
        .bind(id)
        .execute(&pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("News item not found".to_string()));
    }

    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Activities
// ---------------------------------------------------------------------------

/// Lists club activities, most recent first. Public.
pub async fn list_activities(State(pool): State<PgPool>) -> Result<impl IntoResponse, AppError> {
    let activities = sqlx::query_as::<_, Activity>(
        r#"
        SELECT id, title, description, activity_date, location, cover_img, created_at
        FROM activities
        ORDER BY activity_date DESC
        "#,
    )
    .fetch_all(&pool)
    .await?;

    Ok(Json(activities))
}

/// Creates an activity. Staff only.
pub async fn create_activity(
    State(pool): State<PgPool>,
    Json(payload): Json<CreateActivityRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let activity = sqlx::query_as::<_, Activity>(
        r#"
        INSERT INTO activities (title, description, activity_date, location, cover_img)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id, title, description, activity_date, location, cover_img, created_at
        "#,
    )
    .bind(&payload.title)
    .bind(payload.description.as_deref().unwrap_or(""))
    .bind(payload.activity_date)
    .bind(&payload.location)
    .bind(&payload.cover_img)
    .fetch_one(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to create activity: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    Ok((StatusCode::CREATED, Json(activity)))
}

/// Updates an activity by ID and returns the updated row. Staff only.
pub async fn update_activity(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateActivityRequest>,
) -> Result<impl IntoResponse, AppError> {
    if payload.title.is_none()
        && payload.description.is_none()
        && payload.activity_date.is_none()
        && payload.location.is_none()
        && payload.cover_img.is_none()
    {
        let activity = sqlx::query_as::<_, Activity>(
            r#"
            SELECT id, title, description, activity_date, location, cover_img, created_at
            FROM activities
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&pool)
        .await?
        .ok_or(AppError::NotFound("Activity not found".to_string()))?;
        return Ok(Json(activity));
    }

    let mut builder: QueryBuilder<Postgres> = QueryBuilder::new("UPDATE activities SET ");
    let mut separated = builder.separated(", ");

    if let Some(title) = payload.title {
        separated.push("title = ");
        separated.push_bind_unseparated(title);
    }

    if let Some(description) = payload.description {
        separated.push("description = ");
        separated.push_bind_unseparated(description);
    }

    if let Some(activity_date) = payload.activity_date {
        separated.push("activity_date = ");
        separated.push_bind_unseparated(activity_date);
    }

    if let Some(location) = payload.location {
        separated.push("location = ");
        separated.push_bind_unseparated(location);
    }

    if let Some(cover_img) = payload.cover_img {
        separated.push("cover_img = ");
        separated.push_bind_unseparated(cover_img);
    }

    builder.push(" WHERE id = ");
    builder.push_bind(id);
    builder.push(
        " RETURNING id, title, description, activity_date, location, cover_img, created_at",
    );

    let activity = builder
        .build_query_as::<Activity>()
        .fetch_optional(&pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to update activity: {:?}", e);
            AppError::InternalServerError(e.to_string())
        })?
        .ok_or(AppError::NotFound("Activity not found".to_string()))?;

    Ok(Json(activity))
}

/// Deletes an activity by ID. Staff only.
pub async fn delete_activity(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let result = sqlx::query("DELETE FROM activities WHERE id = $1")
        .bind(id)
        .execute(&pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Activity not found".to_string()));
    }

    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Gallery
// ---------------------------------------------------------------------------

/// Lists gallery items, newest first. Public.
pub async fn list_gallery(State(pool): State<PgPool>) -> Result<impl IntoResponse, AppError> {
    let items = sqlx::query_as::<_, GalleryItem>(
        "SELECT id, title, image_url, caption, created_at FROM gallery ORDER BY created_at DESC",
    )
    .fetch_all(&pool)
    .await?;

    Ok(Json(items))
}

/// Adds a gallery item. Staff only.
pub async fn create_gallery_item(
    State(pool): State<PgPool>,
    Json(payload): Json<CreateGalleryItemRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let item = sqlx::query_as::<_, GalleryItem>(
        r#"
        INSERT INTO gallery (title, image_url, caption)
        VALUES ($1, $2, $3)
        RETURNING id, title, image_url, caption, created_at
        "#,
    )
    .bind(&payload.title)
    .bind(&payload.image_url)
    .bind(&payload.caption)
    .fetch_one(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to create gallery item: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    Ok((StatusCode::CREATED, Json(item)))
}

/// Updates a gallery item by ID and returns the updated row. Staff only.
pub async fn update_gallery_item(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateGalleryItemRequest>,
) -> Result<impl IntoResponse, AppError> {
    if payload.title.is_none() && payload.image_url.is_none() && payload.caption.is_none() {
        let item = sqlx::query_as::<_, GalleryItem>(
            "SELECT id, title, image_url, caption, created_at FROM gallery WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&pool)
        .await?
        .ok_or(AppError::NotFound("Gallery item not found".to_string()))?;
        return Ok(Json(item));
    }

    let mut builder: QueryBuilder<Postgres> = QueryBuilder::new("UPDATE gallery SET ");
    let mut separated = builder.separated(", ");

    if let Some(title) = payload.title {
        separated.push("title = ");
        separated.push_bind_unseparated(title);
    }

    if let Some(image_url) = payload.image_url {
        separated.push("image_url = ");
        separated.push_bind_unseparated(image_url);
    }

    if let Some(caption) = payload.caption {
        separated.push("caption = ");
        separated.push_bind_unseparated(caption);
    }

    builder.push(" WHERE id = ");
    builder.push_bind(id);
    builder.push(" RETURNING id, title, image_url, caption, created_at");

    let item = builder
        .build_query_as::<GalleryItem>()
        .fetch_optional(&pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to update gallery item: {:?}", e);
            AppError::InternalServerError(e.to_string())
        })?
        .ok_or(AppError::NotFound("Gallery item not found".to_string()))?;

    Ok(Json(item))
}

/// Deletes a gallery item by ID. Staff only.
pub async fn delete_gallery_item(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let result = sqlx::query("DELETE FROM gallery WHERE id = $1")
        .bind(id)
        .execute(&pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Gallery item not found".to_string()));
    }

    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Member directory
// ---------------------------------------------------------------------------

/// Lists the public member directory in display order. Public.
pub async fn list_members(State(pool): State<PgPool>) -> Result<impl IntoResponse, AppError> {
    let members = sqlx::query_as::<_, Member>(
        r#"
        SELECT id, name, position, photo_url, batch, display_order
        FROM members
        ORDER BY display_order ASC, name ASC
        "#,
    )
    .fetch_all(&pool)
    .await?;

    Ok(Json(members))
}

/// Adds a directory entry. Staff only.
pub async fn create_member(
    State(pool): State<PgPool>,
    Json(payload): Json<CreateMemberRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let member = sqlx::query_as::<_, Member>(
        r#"
        INSERT INTO members (name, position, photo_url, batch, display_order)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id, name, position, photo_url, batch, display_order
        "#,
    )
    .bind(&payload.name)
    .bind(&payload.position)
    .bind(&payload.photo_url)
    .bind(&payload.batch)
    .bind(payload.display_order.unwrap_or(0))
    .fetch_one(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to create member: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    Ok((StatusCode::CREATED, Json(member)))
}

/// Updates a directory entry by ID and returns the updated row. Staff only.
pub async fn update_member(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateMemberRequest>,
) -> Result<impl IntoResponse, AppError> {
    if payload.name.is_none()
        && payload.position.is_none()
        && payload.photo_url.is_none()
        && payload.batch.is_none()
        && payload.display_order.is_none()
    {
        let member = sqlx::query_as::<_, Member>(
            "SELECT id, name, position, photo_url, batch, display_order FROM members WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&pool)
        .await?
        .ok_or(AppError::NotFound("Member not found".to_string()))?;
        return Ok(Json(member));
    }

    let mut builder: QueryBuilder<Postgres> = QueryBuilder::new("UPDATE members SET ");
    let mut separated = builder.separated(", ");

    if let Some(name) = payload.name {
        separated.push("name = ");
        separated.push_bind_unseparated(name);
    }

    if let Some(position) = payload.position {
        separated.push("position = ");
        separated.push_bind_unseparated(position);
    }

    if let Some(photo_url) = payload.photo_url {
        separated.push("photo_url = ");
        separated.push_bind_unseparated(photo_url);
    }

    if let Some(batch) = payload.batch {
        separated.push("batch = ");
        separated.push_bind_unseparated(batch);
    }

    if let Some(display_order) = payload.display_order {
        separated.push("display_order = ");
        separated.push_bind_unseparated(display_order);
    }

    builder.push(" WHERE id = ");
    builder.push_bind(id);
    builder.push(" RETURNING id, name, position, photo_url, batch, display_order");

    let member = builder
        .build_query_as::<Member>()
        .fetch_optional(&pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to update member: {:?}", e);
            AppError::InternalServerError(e.to_string())
        })?
        .ok_or(AppError::NotFound("Member not found".to_string()))?;

    Ok(Json(member))
}

/// Removes a directory entry by ID. Staff only.
pub async fn delete_member(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let result = sqlx::query("DELETE FROM members WHERE id = $1")
        .bind(id)
        .execute(&pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Member not found".to_string()));
    }

    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Branding
// ---------------------------------------------------------------------------

/// Returns the club branding row. Public.
pub async fn get_branding(State(pool): State<PgPool>) -> Result<impl IntoResponse, AppError> {
    let branding = sqlx::query_as::<_, SiteConfig>(
        r#"
        SELECT id, club_name, tagline, logo_url, contact_email, membership_fee
        FROM site_config
        WHERE id = 1
        "#,
    )
    .fetch_one(&pool)
    .await?;

    Ok(Json(branding))
}

/// Updates the single-row branding config. Staff only.
pub async fn update_branding(
    State(pool): State<PgPool>,
    Json(payload): Json<UpdateSiteConfigRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let branding = sqlx::query_as::<_, SiteConfig>(
        r#"
        UPDATE site_config
        SET club_name = COALESCE($1, club_name),
            tagline = COALESCE($2, tagline),
            logo_url = COALESCE($3, logo_url),
            contact_email = COALESCE($4, contact_email),
            membership_fee = COALESCE($5, membership_fee)
        WHERE id = 1
        RETURNING id, club_name, tagline, logo_url, contact_email, membership_fee
        "#,
    )
    .bind(&payload.club_name)
    .bind(&payload.tagline)
    .bind(&payload.logo_url)
    .bind(&payload.contact_email)
    .bind(payload.membership_fee)
    .fetch_one(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to update branding: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    Ok(Json(branding))
}
