use axum::{
    extract::{Path, State},
    response::{IntoResponse, Json},
    Extension,
};

use crate::{
    error::{Error, Result},
    middleware::auth::Session,
    services::request_tracker::RequestKind,
    AppState,
};

#[utoipa::path(
    get,
    path = "/api/requests/{kind}",
    params(("kind" = String, Path, description = "save_cv, scan_cv, match_job, improve_cv or export_pdf")),
    responses(
        (status = 200, description = "Idle, pending or settled"),
        (status = 400, description = "Unknown request kind")
    )
)]
#[axum::debug_handler]
pub async fn request_state(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(kind): Path<String>,
) -> Result<impl IntoResponse> {
    let kind = RequestKind::parse(&kind)
        .ok_or_else(|| Error::BadRequest(format!("Unknown request kind '{}'", kind)))?;
    Ok(Json(state.requests.state(session.user_id(), kind)))
}
