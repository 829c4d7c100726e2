use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::user::SubscriptionStatus;

/// Billing provider notification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubscriptionEvent {
    pub user_id: Uuid,
    pub status: SubscriptionStatus,
    pub expires_at: Option<DateTime<Utc>>,
}
