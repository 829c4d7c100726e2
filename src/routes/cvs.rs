use axum::{
    extract::{Path, State},
    http::header,
    response::{IntoResponse, Json, Response},
    Extension,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::draft_dto::ExportPayload,
    error::Result,
    middleware::auth::Session,
    services::{cv_service::NamedArtifact, request_tracker::RequestKind},
    AppState,
};

/// Serves an artifact as a download.
pub(crate) fn artifact_response(named: NamedArtifact) -> Response {
    let disposition = format!("attachment; filename=\"{}\"", named.file_name);
    (
        [
            (header::CONTENT_TYPE, named.artifact.kind.content_type().to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        named.artifact.bytes,
    )
        .into_response()
}

#[utoipa::path(
    get,
    path = "/api/cvs",
    responses((status = 200, description = "Caller's saved CVs, newest first"))
)]
#[axum::debug_handler]
pub async fn list_cvs(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
) -> Result<impl IntoResponse> {
    Ok(Json(state.cv_service.list(&session).await?))
}

#[utoipa::path(
    get,
    path = "/api/cvs/{id}",
    params(("id" = Uuid, Path, description = "CV ID")),
    responses(
        (status = 200, description = "Saved CV"),
        (status = 404, description = "CV not found")
    )
)]
#[axum::debug_handler]
pub async fn get_cv(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    Ok(Json(state.cv_service.get(&session, id).await?))
}

#[utoipa::path(
    post,
    path = "/api/cvs/{id}/export",
    params(("id" = Uuid, Path, description = "CV ID")),
    request_body = ExportPayload,
    responses(
        (status = 200, description = "PDF or PNG attachment"),
        (status = 400, description = "Invalid file name"),
        (status = 404, description = "CV not found"),
        (status = 502, description = "Renderer failed")
    )
)]
#[axum::debug_handler]
pub async fn export_cv(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ExportPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let ticket = state
        .requests
        .begin(session.user_id(), RequestKind::ExportPdf)?;
    let named = ticket.finish_with(
        state
            .cv_service
            .export_record(&session, id, payload.kind, &payload.file_name)
            .await,
    )?;
    Ok(artifact_response(named))
}
