use axum::{
    extract::{Multipart, State},
    response::{IntoResponse, Json},
    Extension,
};
use validator::Validate;

use crate::{
    dto::scan_dto::{ImprovePayload, ImproveResponse, JobMatchPayload, ScanPayload},
    error::{Error, Result},
    middleware::auth::Session,
    services::{request_tracker::RequestKind, scan_service::CvSource},
    AppState,
};

#[utoipa::path(
    post,
    path = "/api/scans",
    request_body = ScanPayload,
    responses(
        (status = 200, description = "Score, or the fallback with `status: unavailable`"),
        (status = 400, description = "Neither or both of `text` and `cv_id`"),
        (status = 409, description = "A scan is already in progress")
    )
)]
#[axum::debug_handler]
pub async fn scan(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Json(payload): Json<ScanPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let source = payload.into_source()?;
    let ticket = state.requests.begin(session.user_id(), RequestKind::ScanCv)?;
    let outcome = ticket.finish_with(state.scan_service.scan(&session, source).await)?;
    Ok(Json(outcome))
}

#[utoipa::path(
    post,
    path = "/api/scans/upload",
    responses(
        (status = 200, description = "Score of the uploaded file"),
        (status = 400, description = "Unsupported or unreadable file")
    )
)]
#[axum::debug_handler]
pub async fn scan_upload(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse> {
    let mut text = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| Error::BadRequest(e.to_string()))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let file_name = field.file_name().unwrap_or("upload").to_string();
        let data = field
            .bytes()
            .await
            .map_err(|e| Error::BadRequest(e.to_string()))?;
        text = Some(state.scan_service.extract_text(&file_name, &data).await?);
    }
    let text = text.ok_or_else(|| Error::BadRequest("Missing `file` field".to_string()))?;

    let ticket = state.requests.begin(session.user_id(), RequestKind::ScanCv)?;
    let outcome = ticket.finish_with(
        state
            .scan_service
            .scan(&session, CvSource::Text(text))
            .await,
    )?;
    Ok(Json(outcome))
}

#[utoipa::path(
    get,
    path = "/api/scans",
    responses((status = 200, description = "Caller's scan history, newest first"))
)]
#[axum::debug_handler]
pub async fn history(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
) -> Result<impl IntoResponse> {
    Ok(Json(state.scan_service.history(&session).await?))
}

#[utoipa::path(
    post,
    path = "/api/job-match",
    request_body = JobMatchPayload,
    responses(
        (status = 200, description = "Match result, or the fallback with `status: unavailable`"),
        (status = 403, description = "Premium only")
    )
)]
#[axum::debug_handler]
pub async fn job_match(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Json(payload): Json<JobMatchPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let (source, job_text) = payload.into_parts()?;
    let ticket = state.requests.begin(session.user_id(), RequestKind::MatchJob)?;
    let outcome = ticket.finish_with(
        state
            .scan_service
            .match_job(&session, source, &job_text)
            .await,
    )?;
    Ok(Json(outcome))
}

#[utoipa::path(
    post,
    path = "/api/improve",
    request_body = ImprovePayload,
    responses(
        (status = 200, description = "Rewritten CV text", body = Json<ImproveResponse>),
        (status = 403, description = "Premium only"),
        (status = 502, description = "Model unavailable")
    )
)]
#[axum::debug_handler]
pub async fn improve(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Json(payload): Json<ImprovePayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let (source, score) = payload.into_parts()?;
    let ticket = state
        .requests
        .begin(session.user_id(), RequestKind::ImproveCv)?;
    let improved_text =
        ticket.finish_with(state.scan_service.improve(&session, source, score).await)?;
    Ok(Json(ImproveResponse { improved_text }))
}
