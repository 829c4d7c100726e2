use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::error::{Error, Result};
use crate::models::score::CvScore;
use crate::services::scan_service::CvSource;

/// Exactly one of raw text or a saved CV id.
fn source_of(text: Option<String>, cv_id: Option<Uuid>) -> Result<CvSource> {
    match (text, cv_id) {
        (Some(text), None) => Ok(CvSource::Text(text)),
        (None, Some(id)) => Ok(CvSource::Saved(id)),
        _ => Err(Error::BadRequest(
            "Provide either `text` or `cv_id`".to_string(),
        )),
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ScanPayload {
    #[validate(length(max = 50000))]
    pub text: Option<String>,
    pub cv_id: Option<Uuid>,
}

impl ScanPayload {
    pub fn into_source(self) -> Result<CvSource> {
        source_of(self.text, self.cv_id)
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct JobMatchPayload {
    #[validate(length(max = 50000))]
    pub text: Option<String>,
    pub cv_id: Option<Uuid>,
    #[validate(length(min = 1, max = 20000))]
    pub job_description: String,
}

impl JobMatchPayload {
    pub fn into_parts(self) -> Result<(CvSource, String)> {
        Ok((source_of(self.text, self.cv_id)?, self.job_description))
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ImprovePayload {
    #[validate(length(max = 50000))]
    pub text: Option<String>,
    pub cv_id: Option<Uuid>,
    /// A previous scan result; scored afresh when absent.
    pub score: Option<CvScore>,
}

impl ImprovePayload {
    pub fn into_parts(self) -> Result<(CvSource, Option<CvScore>)> {
        Ok((source_of(self.text, self.cv_id)?, self.score))
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ImproveResponse {
    pub improved_text: String,
}
