use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use thiserror::Error;

use crate::models::score::{CvScore, JobMatch};

const TEMPERATURE: f32 = 0.7;
const MAX_OUTPUT_TOKENS: u32 = 2048;
/// Breakdown areas under this mark are targeted by the rewrite prompt.
const WEAK_AREA_THRESHOLD: f64 = 70.0;

#[derive(Debug, Error)]
pub enum AiError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("model returned empty content")]
    EmptyContent,
}

/// Single-prompt text completion.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, AiError>;
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    contents: Vec<RequestContent<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct RequestContent<'a> {
    parts: Vec<RequestPart<'a>>,
}

#[derive(Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    max_output_tokens: u32,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

impl GenerateResponse {
    fn into_text(self) -> Option<String> {
        self.candidates
            .into_iter()
            .next()?
            .content?
            .parts
            .into_iter()
            .next()?
            .text
            .filter(|t| !t.trim().is_empty())
    }
}

/// Google Gemini `generateContent` client.
#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    api_key: String,
    api_url: String,
}

impl GeminiClient {
    pub fn new(client: Client, api_key: String, api_url: String) -> Self {
        Self {
            client,
            api_key,
            api_url,
        }
    }
}

#[async_trait]
impl TextGenerator for GeminiClient {
    async fn generate(&self, prompt: &str) -> Result<String, AiError> {
        let body = GenerateRequest {
            contents: vec![RequestContent {
                parts: vec![RequestPart { text: prompt }],
            }],
            generation_config: GenerationConfig {
                temperature: TEMPERATURE,
                max_output_tokens: MAX_OUTPUT_TOKENS,
            },
        };

        let res = self
            .client
            .post(&self.api_url)
            .query(&[("key", &self.api_key)])
            .json(&body)
            .timeout(Duration::from_secs(120))
            .send()
            .await?;

        let status = res.status();
        if !status.is_success() {
            let message = res.text().await.unwrap_or_default();
            return Err(AiError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: GenerateResponse = res.json().await?;
        parsed.into_text().ok_or(AiError::EmptyContent)
    }
}

/// Removes a surrounding ```json / ``` fence from model output.
pub fn strip_json_fences(text: &str) -> &str {
    let text = text.trim();
    let inner = text
        .strip_prefix("```json")
        .or_else(|| text.strip_prefix("```"));
    match inner {
        Some(rest) => {
            let rest = rest.trim_start();
            rest.strip_suffix("```").map(str::trim).unwrap_or(rest)
        }
        None => text,
    }
}

fn parse_json<T: DeserializeOwned>(raw: &str) -> Result<T, AiError> {
    Ok(serde_json::from_str(strip_json_fences(raw))?)
}

fn score_prompt(cv_text: &str) -> String {
    format!(
        r#"Analyze the following CV/Resume for ATS (Applicant Tracking System) compatibility.
Provide a detailed score breakdown and suggestions for improvement.

CV Content:
{cv_text}

Respond ONLY with a valid JSON object in this exact format (no additional text):
{{
  "overallScore": <number 0-100>,
  "breakdown": {{
    "formatStructure": <number 0-100>,
    "keywordsSkills": <number 0-100>,
    "experienceDescription": <number 0-100>,
    "education": <number 0-100>,
    "contactInfo": <number 0-100>
  }},
  "suggestions": ["<specific improvement suggestion>", "..."],
  "atsCompatibility": "<Low|Medium|High>"
}}

Scoring criteria:
- formatStructure (20%): clean layout, proper sections, no complex formatting
- keywordsSkills (25%): relevant industry keywords, technical skills listed clearly
- experienceDescription (25%): action verbs, quantified achievements, relevant details
- education (15%): degree, institution names, graduation dates
- contactInfo (15%): complete contact details (email, phone, location)

Calculate overallScore as the weighted average of the breakdown scores.
Give at most 5 suggestions."#
    )
}

fn match_prompt(cv_text: &str, job_text: &str) -> String {
    format!(
        r#"Compare the following CV with the job requirements and provide a match analysis.

CV Content:
{cv_text}

Job Requirements:
{job_text}

Respond ONLY with a valid JSON object in this exact format (no additional text):
{{
  "matchScore": <number 0-100>,
  "matchingSkills": ["<skill from the CV that matches a requirement>"],
  "missingSkills": ["<required skill not found in the CV>"],
  "recommendations": ["<specific recommendation to improve the match>"]
}}

Consider technical skills, experience level, education requirements,
soft skills and industry-specific keywords."#
    )
}

fn improve_prompt(cv_text: &str, score: &CvScore) -> String {
    let weak = score.breakdown.weak_areas(WEAK_AREA_THRESHOLD).join(", ");
    let suggestions = score.suggestions.join("\n");
    format!(
        r#"You are a professional CV/Resume writer. Improve the following CV focusing on these low-scoring areas: {weak}

Current suggestions from analysis:
{suggestions}

Original CV:
{cv_text}

Provide an improved version of the CV that:
1. Keeps the original information but enhances presentation
2. Uses strong action verbs
3. Quantifies achievements where possible
4. Optimizes for ATS with relevant keywords
5. Improves formatting and structure

Respond with the improved CV text only, no additional commentary."#
    )
}

#[derive(Clone)]
pub struct AiService {
    generator: Arc<dyn TextGenerator>,
}

impl AiService {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self { generator }
    }

    pub async fn score_cv(&self, cv_text: &str) -> Result<CvScore, AiError> {
        let raw = self.generator.generate(&score_prompt(cv_text)).await?;
        let score: CvScore = parse_json(&raw)?;
        Ok(score.normalized())
    }

    /// Never fails; a failed call yields [`CvScore::fallback`].
    pub async fn score_cv_or_fallback(&self, cv_text: &str) -> CvScore {
        match self.score_cv(cv_text).await {
            Ok(score) => score,
            Err(e) => {
                tracing::error!(error = %e, "CV scoring failed; using fallback score");
                CvScore::fallback()
            }
        }
    }

    pub async fn match_job(&self, cv_text: &str, job_text: &str) -> Result<JobMatch, AiError> {
        let raw = self
            .generator
            .generate(&match_prompt(cv_text, job_text))
            .await?;
        let matched: JobMatch = parse_json(&raw)?;
        Ok(matched.normalized())
    }

    pub async fn improve_cv(&self, cv_text: &str, score: &CvScore) -> Result<String, AiError> {
        let text = self
            .generator
            .generate(&improve_prompt(cv_text, score))
            .await?;
        let text = text.trim();
        if text.is_empty() {
            return Err(AiError::EmptyContent);
        }
        Ok(text.to_string())
    }
}
