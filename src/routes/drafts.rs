use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    response::{Html, IntoResponse, Json},
    Extension,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    builder::Retreat,
    dto::draft_dto::{
        ChooseTemplatePayload, CreateDraftPayload, DraftView, EditResponse, ExportPayload,
        NavigationResponse,
    },
    error::{Error, Result},
    middleware::auth::Session,
    render::{build_layout, html::to_html, LayoutDocument, Photo},
    routes::cvs::artifact_response,
    services::{
        draft_service::{Draft, DraftEdit},
        request_tracker::RequestKind,
    },
    utils::file_kind::sniff_image,
    AppState,
};

#[utoipa::path(
    post,
    path = "/api/drafts",
    request_body = CreateDraftPayload,
    responses(
        (status = 201, description = "Draft started", body = Json<DraftView>),
        (status = 404, description = "Source CV not found")
    )
)]
#[axum::debug_handler]
pub async fn create_draft(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    payload: Option<Json<CreateDraftPayload>>,
) -> Result<impl IntoResponse> {
    let payload = payload.map(|Json(p)| p).unwrap_or_default();
    let source = match payload.cv_id {
        Some(id) => Some(state.cv_service.get(&session, id).await?),
        None => None,
    };
    let draft = state
        .draft_service
        .create(session.user_id(), source.as_ref())
        .await;
    Ok((StatusCode::CREATED, Json(DraftView::from(&draft))))
}

#[utoipa::path(
    get,
    path = "/api/drafts/{id}",
    params(("id" = Uuid, Path, description = "Draft ID")),
    responses(
        (status = 200, description = "Current wizard state", body = Json<DraftView>),
        (status = 404, description = "Draft not found")
    )
)]
#[axum::debug_handler]
pub async fn get_draft(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let draft = state.draft_service.get(session.user_id(), id).await?;
    Ok(Json(DraftView::from(&draft)))
}

#[utoipa::path(
    delete,
    path = "/api/drafts/{id}",
    params(("id" = Uuid, Path, description = "Draft ID")),
    responses(
        (status = 204, description = "Draft discarded"),
        (status = 404, description = "Draft not found")
    )
)]
#[axum::debug_handler]
pub async fn discard_draft(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    state.draft_service.discard(session.user_id(), id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/api/drafts/{id}/template",
    params(("id" = Uuid, Path, description = "Draft ID")),
    request_body = ChooseTemplatePayload,
    responses(
        (status = 200, description = "Template chosen", body = Json<DraftView>),
        (status = 404, description = "Draft not found")
    )
)]
#[axum::debug_handler]
pub async fn choose_template(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ChooseTemplatePayload>,
) -> Result<impl IntoResponse> {
    let draft = state
        .draft_service
        .choose_template(session.user_id(), id, payload.choice)
        .await?;
    Ok(Json(DraftView::from(&draft)))
}

#[utoipa::path(
    patch,
    path = "/api/drafts/{id}",
    params(("id" = Uuid, Path, description = "Draft ID")),
    request_body = DraftEdit,
    responses(
        (status = 200, description = "Edit applied", body = Json<EditResponse>),
        (status = 404, description = "Draft not found")
    )
)]
#[axum::debug_handler]
pub async fn edit_draft(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(id): Path<Uuid>,
    Json(edit): Json<DraftEdit>,
) -> Result<impl IntoResponse> {
    let (draft, outcome) = state
        .draft_service
        .apply_edit(session.user_id(), id, edit)
        .await?;
    Ok(Json(EditResponse {
        draft: DraftView::from(&draft),
        changed: outcome.changed,
        created_id: outcome.created_id,
    }))
}

#[utoipa::path(
    post,
    path = "/api/drafts/{id}/photo",
    params(("id" = Uuid, Path, description = "Draft ID")),
    responses(
        (status = 200, description = "Photo attached", body = Json<DraftView>),
        (status = 400, description = "Not an image, or the template has no photo slot")
    )
)]
#[axum::debug_handler]
pub async fn upload_photo(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(id): Path<Uuid>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse> {
    let mut photo = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| Error::BadRequest(e.to_string()))?
    {
        if field.name() != Some("photo") {
            continue;
        }
        let data = field
            .bytes()
            .await
            .map_err(|e| Error::BadRequest(e.to_string()))?;
        let content_type = sniff_image(&data)
            .ok_or_else(|| Error::BadRequest("Photo must be a PNG or JPEG image".to_string()))?;
        photo = Some(Photo {
            content_type: content_type.to_string(),
            bytes: data,
        });
    }
    let photo = photo.ok_or_else(|| Error::BadRequest("Missing `photo` field".to_string()))?;

    let draft = state
        .draft_service
        .set_photo(session.user_id(), id, photo)
        .await?;
    Ok(Json(DraftView::from(&draft)))
}

#[utoipa::path(
    post,
    path = "/api/drafts/{id}/advance",
    params(("id" = Uuid, Path, description = "Draft ID")),
    responses((status = 200, description = "Navigation result", body = Json<NavigationResponse>))
)]
#[axum::debug_handler]
pub async fn advance(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let (draft, moved) = state.draft_service.advance(session.user_id(), id).await?;
    Ok(Json(NavigationResponse {
        draft: DraftView::from(&draft),
        moved,
        exit: false,
    }))
}

#[utoipa::path(
    post,
    path = "/api/drafts/{id}/retreat",
    params(("id" = Uuid, Path, description = "Draft ID")),
    responses((status = 200, description = "Navigation result", body = Json<NavigationResponse>))
)]
#[axum::debug_handler]
pub async fn retreat(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let (draft, outcome) = state.draft_service.retreat(session.user_id(), id).await?;
    Ok(Json(NavigationResponse {
        draft: DraftView::from(&draft),
        moved: outcome == Retreat::Moved,
        exit: outcome == Retreat::Exit,
    }))
}

fn layout_of(draft: &Draft) -> Result<LayoutDocument> {
    let choice = draft
        .sequencer
        .choice()
        .ok_or_else(|| Error::BadRequest("Choose a template first".to_string()))?;
    Ok(build_layout(&draft.form.content, choice, draft.photo.as_ref()))
}

#[utoipa::path(
    get,
    path = "/api/drafts/{id}/preview",
    params(("id" = Uuid, Path, description = "Draft ID")),
    responses(
        (status = 200, description = "Layout tree of the live preview"),
        (status = 400, description = "No template chosen yet")
    )
)]
#[axum::debug_handler]
pub async fn preview(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let draft = state.draft_service.get(session.user_id(), id).await?;
    Ok(Json(layout_of(&draft)?))
}

#[utoipa::path(
    get,
    path = "/api/drafts/{id}/preview.html",
    params(("id" = Uuid, Path, description = "Draft ID")),
    responses(
        (status = 200, description = "Rendered HTML preview", content_type = "text/html"),
        (status = 400, description = "No template chosen yet")
    )
)]
#[axum::debug_handler]
pub async fn preview_html(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let draft = state.draft_service.get(session.user_id(), id).await?;
    Ok(Html(to_html(&layout_of(&draft)?)))
}

#[utoipa::path(
    post,
    path = "/api/drafts/{id}/save",
    params(("id" = Uuid, Path, description = "Draft ID")),
    responses(
        (status = 201, description = "New CV record created"),
        (status = 200, description = "Existing CV record updated"),
        (status = 403, description = "Free CV limit reached"),
        (status = 409, description = "A save is already in progress")
    )
)]
#[axum::debug_handler]
pub async fn save_draft(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let draft = state.draft_service.get(session.user_id(), id).await?;
    let ticket = state.requests.begin(session.user_id(), RequestKind::SaveCv)?;
    let outcome = ticket.finish_with(state.cv_service.save_draft(&session, &draft).await)?;

    let draft = state
        .draft_service
        .mark_saved(session.user_id(), id, outcome.record.id)
        .await?;
    let status = if outcome.created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((
        status,
        Json(serde_json::json!({
            "cv": outcome.record,
            "created": outcome.created,
            "image_saved": outcome.image_saved,
            "draft": DraftView::from(&draft),
        })),
    ))
}

#[utoipa::path(
    post,
    path = "/api/drafts/{id}/export",
    params(("id" = Uuid, Path, description = "Draft ID")),
    request_body = ExportPayload,
    responses(
        (status = 200, description = "PDF or PNG attachment"),
        (status = 400, description = "Invalid file name"),
        (status = 502, description = "Renderer failed")
    )
)]
#[axum::debug_handler]
pub async fn export_draft(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ExportPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let draft = state.draft_service.get(session.user_id(), id).await?;
    let ticket = state
        .requests
        .begin(session.user_id(), RequestKind::ExportPdf)?;
    let named = ticket.finish_with(
        state
            .cv_service
            .export_draft(&draft, payload.kind, &payload.file_name)
            .await,
    )?;
    Ok(artifact_response(named))
}
