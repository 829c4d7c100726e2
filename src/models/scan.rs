use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::score::CvScore;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    pub cv_id: Option<Uuid>,
    pub original_text: String,
    pub score: CvScore,
    pub created_at: DateTime<Utc>,
}
