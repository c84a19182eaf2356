// src/routes.rs

use std::sync::Arc;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::Method,
    middleware,
    routing::{delete, get, patch, post, put},
};
use tower_governor::{GovernorLayer, governor::GovernorConfigBuilder};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    handlers::{admin, auth, content, exam, payment, profile, upload},
    state::AppState,
    utils::jwt::{admin_middleware, auth_middleware, staff_middleware},
};

/// Assembles the main application router.
///
/// * Merges all sub-routers (auth, exams, payments, profile, content, admin).
/// * Applies global middleware (Trace, CORS) and rate limiting on auth.
/// * Injects global state (pool, config, mailer, uploader).
pub fn create_router(state: AppState) -> Router {
    let origins = [
        "http://localhost:3000".parse().unwrap(),
        "http://127.0.0.1:3000".parse().unwrap(),
    ];

    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
        ])
        .allow_headers([
            axum::http::header::AUTHORIZATION,
            axum::http::header::CONTENT_TYPE,
        ]);

    // Credential endpoints get a per-IP budget; everything else is uncapped.
    let governor_conf = Arc::new(
        GovernorConfigBuilder::default()
            .per_second(5)
            .burst_size(50)
            .finish()
            .unwrap(),
    );

    let auth_routes = Router::new()
        .route("/register", post(auth::register))
        .route("/verify-email", post(auth::verify_email))
        .route("/resend-otp", post(auth::resend_otp))
        .route("/login", post(auth::login))
        .layer(GovernorLayer::new(governor_conf));

    let exam_routes = Router::new()
        .route("/", get(exam::list_exams))
        .route("/leaderboard", get(exam::leaderboard))
        .route("/{id}", get(exam::get_exam))
        // Protected exam actions
        .merge(
            Router::new()
                .route("/{id}/register", post(exam::register_for_exam))
                .route("/{id}/submit", post(exam::submit_exam))
                .layer(middleware::from_fn_with_state(
                    state.clone(),
                    auth_middleware,
                )),
        );

    let payment_routes = Router::new()
        .route("/", post(payment::create_payment))
        .route("/mine", get(payment::list_my_payments))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    let profile_routes = Router::new()
        .route("/me", get(profile::get_me).put(profile::update_me))
        .route("/registrations", get(profile::list_my_registrations))
        .route("/submissions", get(profile::list_my_submissions))
        .route("/achievements", get(profile::list_my_achievements))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    // Public read-only content surfaces.
    let content_routes = Router::new()
        .route("/news", get(content::list_news))
        .route("/news/{id}", get(content::get_news))
        .route("/activities", get(content::list_activities))
        .route("/gallery", get(content::list_gallery))
        .route("/members", get(content::list_members))
        .route("/branding", get(content::get_branding));

    let upload_routes = Router::new()
        .route("/", post(upload::upload_file))
        .layer(DefaultBodyLimit::max(12 * 1024 * 1024))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    // Admin-only surfaces: accounts, exams, grading, payments, achievements.
    let admin_routes = Router::new()
        .route("/users", get(admin::list_users).post(admin::create_user))
        .route(
            "/users/{id}",
            put(admin::update_user).delete(admin::delete_user),
        )
        .route("/exams", post(admin::create_exam))
        .route(
            "/exams/{id}",
            put(admin::update_exam).delete(admin::delete_exam),
        )
        .route(
            "/exams/{id}/submissions",
            get(admin::list_exam_submissions).patch(admin::grade_submission),
        )
        .route("/payments", get(payment::list_payments))
        .route("/payments/{id}", patch(payment::review_payment))
        .route(
            "/achievements",
            get(admin::list_achievements).post(admin::create_achievement),
        )
        .route("/achievements/{id}", delete(admin::delete_achievement))
        // Double middleware protection: Auth first, then Admin check
        .layer(middleware::from_fn(admin_middleware))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    // Content management is open to moderators as well.
    let staff_routes = Router::new()
        .route("/news", post(content::create_news))
        .route(
            "/news/{id}",
            put(content::update_news).delete(content::delete_news),
        )
        .route("/activities", post(content::create_activity))
        .route(
            "/activities/{id}",
            put(content::update_activity).delete(content::delete_activity),
        )
        .route("/gallery", post(content::create_gallery_item))
        .route(
            "/gallery/{id}",
            put(content::update_gallery_item).delete(content::delete_gallery_item),
        )
        .route("/members", post(content::create_member))
        .route(
            "/members/{id}",
            put(content::update_member).delete(content::delete_member),
        )
        .route("/branding", put(content::update_branding))
        .layer(middleware::from_fn(staff_middleware))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new()
        .nest("/api/auth", auth_routes)
        .nest("/api/exams", exam_routes)
        .nest("/api/payments", payment_routes)
        .nest("/api/profile", profile_routes)
        .nest("/api/upload", upload_routes)
        .nest("/api/admin", admin_routes.merge(staff_routes))
        .merge(Router::new().nest("/api", content_routes))
        // Global Middleware (applied from outside in)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
