use axum::{extract::State, http::HeaderMap, response::IntoResponse, Json};
use subtle::ConstantTimeEq;

use crate::{
    dto::webhook_dto::SubscriptionEvent,
    error::{Error, Result},
    AppState,
};

#[utoipa::path(
    post,
    path = "/api/webhook/subscription",
    request_body = SubscriptionEvent,
    responses(
        (status = 200, description = "Subscription updated"),
        (status = 401, description = "Missing or wrong webhook secret"),
        (status = 404, description = "Unknown user")
    )
)]
#[axum::debug_handler]
pub async fn subscription_event(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(event): Json<SubscriptionEvent>,
) -> Result<impl IntoResponse> {
    verify_secret(&headers, &state.config.webhook_secret)?;
    let user = state
        .gateway
        .users
        .set_subscription(event.user_id, event.status, event.expires_at)
        .await?;
    tracing::info!(
        user_id = %user.id,
        status = user.subscription_status.as_str(),
        "Subscription updated"
    );
    Ok(Json(user))
}

fn verify_secret(headers: &HeaderMap, expected: &str) -> Result<()> {
    let Some(secret_hdr) = headers.get("x-webhook-secret") else {
        return Err(Error::Unauthorized("missing_webhook_secret".into()));
    };
    let provided = secret_hdr
        .to_str()
        .map_err(|_| Error::Unauthorized("invalid_secret_header".into()))?;
    if ConstantTimeEq::ct_eq(provided.as_bytes(), expected.as_bytes()).into() {
        Ok(())
    } else {
        Err(Error::Unauthorized("invalid_webhook_secret".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn secret_must_match_exactly() {
        let mut headers = HeaderMap::new();
        assert!(verify_secret(&headers, "s3cret").is_err());
        headers.insert("x-webhook-secret", "s3cre".parse().unwrap());
        assert!(verify_secret(&headers, "s3cret").is_err());
        headers.insert("x-webhook-secret", "s3cret".parse().unwrap());
        assert!(verify_secret(&headers, "s3cret").is_ok());
    }
}
