use serde::{Deserialize, Deserializer, Serialize};

pub const FALLBACK_SCORE_SUGGESTION: &str = "Unable to analyze CV. Please try again.";
pub const FALLBACK_MATCH_RECOMMENDATION: &str = "Unable to analyze the match. Please try again.";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum AtsCompatibility {
    #[default]
    Low,
    Medium,
    High,
}

/// Case-insensitive; an unrecognised tier reads as `Low`.
impl<'de> Deserialize<'de> for AtsCompatibility {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(match raw.trim().to_ascii_lowercase().as_str() {
            "high" => AtsCompatibility::High,
            "medium" => AtsCompatibility::Medium,
            _ => AtsCompatibility::Low,
        })
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawScore {
    Number(f64),
    Text(String),
}

/// Accepts integers, fractions and numeric strings, rounded to the nearest
/// whole point. Anything unparseable is 0.
fn lenient_score<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i32, D::Error> {
    let value = match Option::<RawScore>::deserialize(deserializer)? {
        Some(RawScore::Number(n)) => n,
        Some(RawScore::Text(s)) => s.trim().trim_end_matches('%').parse::<f64>().unwrap_or(0.0),
        None => 0.0,
    };
    Ok(if value.is_finite() {
        value.round().clamp(i32::MIN as f64, i32::MAX as f64) as i32
    } else {
        0
    })
}

/// Sub-scores on a 0-100 scale. Weights: 20/25/25/15/15.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreBreakdown {
    #[serde(default)]
    pub format_structure: f64,
    #[serde(default)]
    pub keywords_skills: f64,
    #[serde(default)]
    pub experience_description: f64,
    #[serde(default)]
    pub education: f64,
    #[serde(default)]
    pub contact_info: f64,
}

impl ScoreBreakdown {
    pub const FORMAT_STRUCTURE_WEIGHT: f64 = 0.20;
    pub const KEYWORDS_SKILLS_WEIGHT: f64 = 0.25;
    pub const EXPERIENCE_DESCRIPTION_WEIGHT: f64 = 0.25;
    pub const EDUCATION_WEIGHT: f64 = 0.15;
    pub const CONTACT_INFO_WEIGHT: f64 = 0.15;

    pub fn clamped(&self) -> Self {
        let c = |v: f64| if v.is_finite() { v.clamp(0.0, 100.0) } else { 0.0 };
        Self {
            format_structure: c(self.format_structure),
            keywords_skills: c(self.keywords_skills),
            experience_description: c(self.experience_description),
            education: c(self.education),
            contact_info: c(self.contact_info),
        }
    }

    pub fn weighted_average(&self) -> i32 {
        let total = self.format_structure * Self::FORMAT_STRUCTURE_WEIGHT
            + self.keywords_skills * Self::KEYWORDS_SKILLS_WEIGHT
            + self.experience_description * Self::EXPERIENCE_DESCRIPTION_WEIGHT
            + self.education * Self::EDUCATION_WEIGHT
            + self.contact_info * Self::CONTACT_INFO_WEIGHT;
        total.round() as i32
    }

    /// Named areas scoring under `threshold`, formatted for prompts.
    pub fn weak_areas(&self, threshold: f64) -> Vec<String> {
        [
            ("formatStructure", self.format_structure),
            ("keywordsSkills", self.keywords_skills),
            ("experienceDescription", self.experience_description),
            ("education", self.education),
            ("contactInfo", self.contact_info),
        ]
        .into_iter()
        .filter(|(_, v)| *v < threshold)
        .map(|(k, v)| format!("{}: {}", k, v))
        .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CvScore {
    #[serde(default, deserialize_with = "lenient_score")]
    pub overall_score: i32,
    #[serde(default)]
    pub breakdown: ScoreBreakdown,
    #[serde(default)]
    pub suggestions: Vec<String>,
    #[serde(default)]
    pub ats_compatibility: AtsCompatibility,
}

impl CvScore {
    /// The zero result handed out when the scoring call could not complete.
    pub fn fallback() -> Self {
        Self {
            overall_score: 0,
            breakdown: ScoreBreakdown::default(),
            suggestions: vec![FALLBACK_SCORE_SUGGESTION.to_string()],
            ats_compatibility: AtsCompatibility::Low,
        }
    }

    /// Clamps the breakdown and recomputes the overall score from it.
    pub fn normalized(mut self) -> Self {
        self.breakdown = self.breakdown.clamped();
        self.overall_score = self.breakdown.weighted_average();
        self.suggestions.retain(|s| !s.trim().is_empty());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobMatch {
    #[serde(default, deserialize_with = "lenient_score")]
    pub match_score: i32,
    #[serde(default)]
    pub matching_skills: Vec<String>,
    #[serde(default)]
    pub missing_skills: Vec<String>,
    #[serde(default)]
    pub recommendations: Vec<String>,
}

impl JobMatch {
    pub fn fallback() -> Self {
        Self {
            match_score: 0,
            matching_skills: vec![],
            missing_skills: vec![],
            recommendations: vec![FALLBACK_MATCH_RECOMMENDATION.to_string()],
        }
    }

    pub fn normalized(mut self) -> Self {
        self.match_score = self.match_score.clamp(0, 100);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overall_is_weighted_average_of_breakdown() {
        let score = CvScore {
            overall_score: 99,
            breakdown: ScoreBreakdown {
                format_structure: 80.0,
                keywords_skills: 60.0,
                experience_description: 70.0,
                education: 90.0,
                contact_info: 100.0,
            },
            suggestions: vec!["Add metrics".into(), "  ".into()],
            ats_compatibility: AtsCompatibility::Medium,
        }
        .normalized();

        // 16 + 15 + 17.5 + 13.5 + 15 = 77
        assert_eq!(score.overall_score, 77);
        assert_eq!(score.suggestions, vec!["Add metrics".to_string()]);
    }

    #[test]
    fn breakdown_is_clamped() {
        let b = ScoreBreakdown {
            format_structure: 140.0,
            keywords_skills: -5.0,
            experience_description: f64::NAN,
            education: 50.0,
            contact_info: 50.0,
        }
        .clamped();
        assert_eq!(b.format_structure, 100.0);
        assert_eq!(b.keywords_skills, 0.0);
        assert_eq!(b.experience_description, 0.0);
    }

    #[test]
    fn fallback_is_zero_with_single_suggestion() {
        let s = CvScore::fallback();
        assert_eq!(s.overall_score, 0);
        assert_eq!(s.breakdown, ScoreBreakdown::default());
        assert_eq!(s.ats_compatibility, AtsCompatibility::Low);
        assert_eq!(s.suggestions.len(), 1);
    }

    #[test]
    fn weak_areas_lists_only_low_scores() {
        let b = ScoreBreakdown {
            format_structure: 90.0,
            keywords_skills: 40.0,
            experience_description: 75.0,
            education: 69.0,
            contact_info: 100.0,
        };
        assert_eq!(b.weak_areas(70.0), vec!["keywordsSkills: 40", "education: 69"]);
    }

    #[test]
    fn parses_camel_case_model_output() {
        let raw = r#"{"overallScore":70,"breakdown":{"formatStructure":70,"keywordsSkills":70,
            "experienceDescription":70,"education":70,"contactInfo":70},
            "suggestions":["a"],"atsCompatibility":"High"}"#;
        let score: CvScore = serde_json::from_str(raw).unwrap();
        assert_eq!(score.ats_compatibility, AtsCompatibility::High);
        assert_eq!(score.normalized().overall_score, 70);
    }

    #[test]
    fn fractional_scores_and_lowercase_tiers_parse() {
        let raw = r#"{"overallScore":72.5,"breakdown":{"formatStructure":72.5},
            "atsCompatibility":"high"}"#;
        let score: CvScore = serde_json::from_str(raw).unwrap();
        assert_eq!(score.overall_score, 73);
        assert_eq!(score.breakdown.format_structure, 72.5);
        assert_eq!(score.ats_compatibility, AtsCompatibility::High);

        let m: JobMatch = serde_json::from_str(r#"{"matchScore":"82.4"}"#).unwrap();
        assert_eq!(m.match_score, 82);
        let m: JobMatch = serde_json::from_str(r#"{"matchScore":null}"#).unwrap();
        assert_eq!(m.match_score, 0);
    }
}
