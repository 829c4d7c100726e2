use serde::Serialize;
use tokio::fs;
use tokio::process::Command;
use uuid::Uuid;

use crate::database::Gateway;
use crate::error::{Error, Result};
use crate::middleware::auth::Session;
use crate::models::cv::CvPatch;
use crate::models::scan::ScanRecord;
use crate::models::score::{CvScore, JobMatch};
use crate::models::user::PremiumFeature;
use crate::render::artifact::run_tool;
use crate::services::ai_service::AiService;
use crate::utils::file_kind::is_pdf;

/// Where the text to analyse comes from.
#[derive(Debug, Clone)]
pub enum CvSource {
    Text(String),
    Saved(Uuid),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AssessmentStatus {
    Scored,
    Unavailable,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScanOutcome {
    pub status: AssessmentStatus,
    pub score: CvScore,
    /// Why scoring was unavailable.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scan_id: Option<Uuid>,
    pub cv_id: Option<Uuid>,
    pub ad_required: bool,
    pub scans_today: i32,
}

#[derive(Debug, Clone, Serialize)]
pub struct MatchOutcome {
    pub status: AssessmentStatus,
    #[serde(rename = "match")]
    pub result: JobMatch,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

#[derive(Clone)]
pub struct ScanService {
    gateway: Gateway,
    ai: AiService,
    pdftotext_bin: String,
}

impl ScanService {
    pub fn new(gateway: Gateway, ai: AiService, pdftotext_bin: String) -> Self {
        Self {
            gateway,
            ai,
            pdftotext_bin,
        }
    }

    async fn resolve(&self, session: &Session, source: CvSource) -> Result<(String, Option<Uuid>)> {
        match source {
            CvSource::Text(text) => {
                if text.trim().is_empty() {
                    return Err(Error::BadRequest("CV text is empty".to_string()));
                }
                Ok((text, None))
            }
            CvSource::Saved(id) => {
                let record = self
                    .gateway
                    .cvs
                    .get(id)
                    .await?
                    .filter(|r| r.user_id == session.user_id())
                    .ok_or_else(|| Error::NotFound(format!("CV {} not found", id)))?;
                Ok((record.content.to_plain_text(), Some(record.id)))
            }
        }
    }

    /// Scores a CV. A failed model call is reported, not raised.
    pub async fn scan(&self, session: &Session, source: CvSource) -> Result<ScanOutcome> {
        let (text, cv_id) = self.resolve(session, source).await?;
        let ad_required = !session.allows(PremiumFeature::NoAds);

        let score = match self.ai.score_cv(&text).await {
            Ok(score) => score,
            Err(e) => {
                tracing::error!(user_id = %session.user_id(), error = %e, "CV scan unavailable");
                return Ok(ScanOutcome {
                    status: AssessmentStatus::Unavailable,
                    score: CvScore::fallback(),
                    reason: Some(e.to_string()),
                    scan_id: None,
                    cv_id,
                    ad_required,
                    scans_today: session.user.scans_today,
                });
            }
        };

        let record = self
            .gateway
            .scans
            .insert(session.user_id(), cv_id, &text, &score)
            .await?;
        let user = self.gateway.users.record_scan(session.user_id()).await?;
        if let Some(id) = cv_id {
            self.gateway
                .cvs
                .update(id, CvPatch::last_score(score.overall_score))
                .await?;
        }
        tracing::info!(scan_id = %record.id, overall = score.overall_score, "CV scanned");

        Ok(ScanOutcome {
            status: AssessmentStatus::Scored,
            score,
            reason: None,
            scan_id: Some(record.id),
            cv_id,
            ad_required,
            scans_today: user.scans_today,
        })
    }

    pub async fn history(&self, session: &Session) -> Result<Vec<ScanRecord>> {
        self.gateway.scans.list(session.user_id()).await
    }

    pub async fn match_job(
        &self,
        session: &Session,
        source: CvSource,
        job_text: &str,
    ) -> Result<MatchOutcome> {
        if !session.allows(PremiumFeature::JobMatching) {
            return Err(Error::Forbidden("Job matching requires premium".to_string()));
        }
        if job_text.trim().is_empty() {
            return Err(Error::BadRequest("Job description is empty".to_string()));
        }
        let (text, _) = self.resolve(session, source).await?;

        Ok(match self.ai.match_job(&text, job_text).await {
            Ok(result) => MatchOutcome {
                status: AssessmentStatus::Scored,
                result,
                reason: None,
            },
            Err(e) => {
                tracing::error!(user_id = %session.user_id(), error = %e, "Job match unavailable");
                MatchOutcome {
                    status: AssessmentStatus::Unavailable,
                    result: JobMatch::fallback(),
                    reason: Some(e.to_string()),
                }
            }
        })
    }

    /// Rewrites the CV. Without a supplied score it is scored first, and a
    /// failed scoring call falls back to the zero score so every area reads as weak.
    pub async fn improve(
        &self,
        session: &Session,
        source: CvSource,
        score: Option<CvScore>,
    ) -> Result<String> {
        if !session.allows(PremiumFeature::AiFix) {
            return Err(Error::Forbidden("AI rewrite requires premium".to_string()));
        }
        let (text, _) = self.resolve(session, source).await?;
        let score = match score {
            Some(score) => score.normalized(),
            None => self.ai.score_cv_or_fallback(&text).await,
        };
        Ok(self.ai.improve_cv(&text, &score).await?)
    }

    /// Pulls plain text out of an uploaded PDF or text file.
    pub async fn extract_text(&self, file_name: &str, data: &[u8]) -> Result<String> {
        let text = if is_pdf(data) {
            let path = std::env::temp_dir().join(format!("cv_scan_{}.pdf", Uuid::new_v4()));
            fs::write(&path, data).await?;
            let out = run_tool(
                Command::new(&self.pdftotext_bin)
                    .arg("-layout")
                    .arg(&path)
                    .arg("-"),
                &self.pdftotext_bin,
            )
            .await;
            if let Err(e) = fs::remove_file(&path).await {
                tracing::warn!(path = %path.display(), error = %e, "Failed to remove upload");
            }
            String::from_utf8_lossy(&out?).into_owned()
        } else if file_name.to_ascii_lowercase().ends_with(".txt") {
            String::from_utf8(data.to_vec())
                .map_err(|_| Error::BadRequest("Text file is not valid UTF-8".to_string()))?
        } else {
            return Err(Error::BadRequest(
                "Only PDF and TXT files can be scanned".to_string(),
            ));
        };

        if text.trim().is_empty() {
            return Err(Error::BadRequest("No text found in the uploaded file".to_string()));
        }
        Ok(text)
    }
}
