use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Json, Response},
};
use chrono::Utc;
use serde_json::json;

use crate::models::user::{PremiumFeature, UserAccount};
use crate::AppState;

/// Who is calling, resolved once per request.
#[derive(Debug, Clone)]
pub struct Session {
    pub user: UserAccount,
    pub premium: bool,
}

impl Session {
    pub fn new(user: UserAccount) -> Self {
        let premium = user.is_premium(Utc::now());
        Self { user, premium }
    }

    pub fn user_id(&self) -> uuid::Uuid {
        self.user.id
    }

    pub fn allows(&self, feature: PremiumFeature) -> bool {
        feature.allowed_for(self.premium)
    }
}

fn unauthorized(code: &str) -> Response {
    (StatusCode::UNAUTHORIZED, Json(json!({ "error": code }))).into_response()
}

/// Resolves the bearer token to a [`Session`] in the request extensions.
pub async fn require_session(State(state): State<AppState>, mut req: Request, next: Next) -> Response {
    let Some(auth_header) = req.headers().get(axum::http::header::AUTHORIZATION) else {
        return unauthorized("missing_authorization");
    };
    let Ok(auth_str) = auth_header.to_str() else {
        return unauthorized("bad_authorization");
    };
    let Some(token) = auth_str.strip_prefix("Bearer ") else {
        return unauthorized("unsupported_scheme");
    };

    let user_id = match state.auth_service.verify_token(token) {
        Ok(id) => id,
        Err(_) => return unauthorized("invalid_token"),
    };

    match state.gateway.users.get(user_id).await {
        Ok(Some(user)) => {
            req.extensions_mut().insert(Session::new(user));
            next.run(req).await
        }
        Ok(None) => unauthorized("unknown_user"),
        Err(e) => e.into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::user::SubscriptionStatus;
    use chrono::Duration;
    use uuid::Uuid;

    fn account(status: SubscriptionStatus, expiry_days: Option<i64>) -> UserAccount {
        UserAccount {
            id: Uuid::new_v4(),
            email: "a@example.com".into(),
            display_name: "A".into(),
            photo_url: None,
            subscription_status: status,
            subscription_expiry: expiry_days.map(|d| Utc::now() + Duration::days(d)),
            cv_count: 0,
            scans_today: 0,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn premium_is_resolved_once() {
        let session = Session::new(account(SubscriptionStatus::Premium, Some(3)));
        assert!(session.premium);
        assert!(session.allows(PremiumFeature::JobMatching));

        let expired = Session::new(account(SubscriptionStatus::Premium, Some(-1)));
        assert!(!expired.premium);
        assert!(!expired.allows(PremiumFeature::AiFix));

        let free = Session::new(account(SubscriptionStatus::Free, None));
        assert!(!free.allows(PremiumFeature::NoAds));
    }
}
