pub mod auth;
pub mod cvs;
pub mod drafts;
pub mod health;
pub mod requests;
pub mod scans;
pub mod webhook;

use axum::{
    extract::DefaultBodyLimit,
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};
use tower_http::{services::ServeDir, trace::TraceLayer};

use crate::{
    database::blob::UPLOADS_ROUTE,
    middleware::{
        auth::require_session,
        cors::api_cors,
        rate_limit::{rps_middleware, RateLimiter},
    },
    AppState,
};

const MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

pub fn build_router(state: AppState) -> Router {
    let public = Router::new()
        .route("/health", get(health::health))
        .route("/api/auth/register", post(auth::register))
        .route("/api/auth/login", post(auth::login))
        .route(
            "/api/webhook/subscription",
            post(webhook::subscription_event),
        );

    let ai_api = Router::new()
        .route("/api/scans", post(scans::scan).get(scans::history))
        .route("/api/scans/upload", post(scans::scan_upload))
        .route("/api/job-match", post(scans::job_match))
        .route("/api/improve", post(scans::improve))
        .layer(from_fn_with_state(
            RateLimiter::new(state.config.ai_rps),
            rps_middleware,
        ));

    let protected = Router::new()
        .route("/api/me", get(auth::me).patch(auth::update_me))
        .route("/api/drafts", post(drafts::create_draft))
        .route(
            "/api/drafts/:id",
            get(drafts::get_draft)
                .patch(drafts::edit_draft)
                .delete(drafts::discard_draft),
        )
        .route("/api/drafts/:id/template", post(drafts::choose_template))
        .route("/api/drafts/:id/photo", post(drafts::upload_photo))
        .route("/api/drafts/:id/advance", post(drafts::advance))
        .route("/api/drafts/:id/retreat", post(drafts::retreat))
        .route("/api/drafts/:id/preview", get(drafts::preview))
        .route("/api/drafts/:id/preview.html", get(drafts::preview_html))
        .route("/api/drafts/:id/save", post(drafts::save_draft))
        .route("/api/drafts/:id/export", post(drafts::export_draft))
        .route("/api/cvs", get(cvs::list_cvs))
        .route("/api/cvs/:id", get(cvs::get_cv))
        .route("/api/cvs/:id/export", post(cvs::export_cv))
        .route("/api/requests/:kind", get(requests::request_state))
        .merge(ai_api)
        .layer(from_fn_with_state(state.clone(), require_session));

    let uploads = ServeDir::new(&state.config.upload_dir);

    Router::new()
        .merge(public)
        .merge(protected)
        .nest_service(UPLOADS_ROUTE, uploads)
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(api_cors())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
