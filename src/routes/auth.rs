use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
    Extension,
};
use validator::Validate;

use crate::{
    dto::auth_dto::{LoginPayload, RegisterPayload, UpdateProfilePayload},
    error::Result,
    middleware::auth::Session,
    models::user::ProfileUpdate,
    AppState,
};

#[utoipa::path(
    post,
    path = "/api/auth/register",
    request_body = RegisterPayload,
    responses(
        (status = 201, description = "Account created, token issued"),
        (status = 400, description = "Invalid payload"),
        (status = 409, description = "Email already registered")
    )
)]
#[axum::debug_handler]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let outcome = state
        .auth_service
        .register(&payload.email, &payload.password, &payload.display_name)
        .await?;
    Ok((StatusCode::CREATED, Json(outcome)))
}

#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginPayload,
    responses(
        (status = 200, description = "Token issued"),
        (status = 401, description = "Invalid email or password")
    )
)]
#[axum::debug_handler]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let outcome = state
        .auth_service
        .login(&payload.email, &payload.password)
        .await?;
    Ok(Json(outcome))
}

#[utoipa::path(
    get,
    path = "/api/me",
    responses((status = 200, description = "Caller's profile and counters"))
)]
#[axum::debug_handler]
pub async fn me(Extension(session): Extension<Session>) -> Result<impl IntoResponse> {
    Ok(Json(serde_json::json!({
        "user": session.user,
        "is_premium": session.premium,
    })))
}

#[utoipa::path(
    patch,
    path = "/api/me",
    request_body = UpdateProfilePayload,
    responses(
        (status = 200, description = "Profile updated"),
        (status = 400, description = "Invalid payload")
    )
)]
#[axum::debug_handler]
pub async fn update_me(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Json(payload): Json<UpdateProfilePayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let user = state
        .gateway
        .users
        .update_profile(
            session.user_id(),
            ProfileUpdate {
                display_name: payload.display_name.map(|n| n.trim().to_string()),
                photo_url: payload.photo_url,
            },
        )
        .await?;
    Ok(Json(user))
}
