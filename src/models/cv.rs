use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonalInfo {
    pub full_name: String,
    #[serde(default)]
    pub profession: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    #[serde(default)]
    pub linkedin: Option<String>,
    #[serde(default)]
    pub portfolio: Option<String>,
}

impl PersonalInfo {
    /// Required contact fields are all present (whitespace does not count).
    pub fn is_complete(&self) -> bool {
        [&self.full_name, &self.email, &self.phone, &self.address]
            .iter()
            .all(|v| !v.trim().is_empty())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SkillLevel {
    Beginner,
    #[default]
    Intermediate,
    Expert,
}

impl SkillLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            SkillLevel::Beginner => "Beginner",
            SkillLevel::Intermediate => "Intermediate",
            SkillLevel::Expert => "Expert",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Skill {
    pub name: String,
    #[serde(default)]
    pub level: SkillLevel,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Experience {
    pub id: String,
    pub company: String,
    pub position: String,
    pub start_date: String,
    pub end_date: String,
    #[serde(default)]
    pub is_current: bool,
    pub description: String,
}

impl Experience {
    pub fn blank(id: String) -> Self {
        Self {
            id,
            company: String::new(),
            position: String::new(),
            start_date: String::new(),
            end_date: String::new(),
            is_current: false,
            description: String::new(),
        }
    }

    pub fn period(&self) -> String {
        let end = if self.is_current || self.end_date.trim().is_empty() {
            "Present"
        } else {
            self.end_date.as_str()
        };
        format!("{}-{}", self.start_date, end)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Education {
    pub id: String,
    pub institution: String,
    pub degree: String,
    pub field: String,
    pub start_year: String,
    pub end_year: String,
    #[serde(default)]
    pub gpa: Option<String>,
}

impl Education {
    pub fn blank(id: String) -> Self {
        Self {
            id,
            institution: String::new(),
            degree: String::new(),
            field: String::new(),
            start_year: String::new(),
            end_year: String::new(),
            gpa: None,
        }
    }

    pub fn period(&self) -> String {
        format!("{}-{}", self.start_year, self.end_year)
    }
}

/// The part of a CV the wizard edits.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CvContent {
    pub personal_info: PersonalInfo,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub skills: Vec<Skill>,
    #[serde(default)]
    pub experience: Vec<Experience>,
    #[serde(default)]
    pub education: Vec<Education>,
}

impl CvContent {
    pub fn title(&self) -> String {
        let name = self.personal_info.full_name.trim();
        if name.is_empty() {
            "Untitled CV".to_string()
        } else {
            format!("CV - {}", name)
        }
    }

    /// Flattens the structured CV into the plain text fed to the scanner.
    pub fn to_plain_text(&self) -> String {
        let p = &self.personal_info;
        let mut out = String::new();

        out.push_str("Personal Information:\n");
        out.push_str(&format!("- Name: {}\n", p.full_name));
        if !p.profession.trim().is_empty() {
            out.push_str(&format!("- Profession: {}\n", p.profession));
        }
        out.push_str(&format!("- Email: {}\n", p.email));
        out.push_str(&format!("- Phone: {}\n", p.phone));
        out.push_str(&format!("- Address: {}\n", p.address));
        if let Some(linkedin) = p.linkedin.as_deref().filter(|s| !s.trim().is_empty()) {
            out.push_str(&format!("- LinkedIn: {}\n", linkedin));
        }
        if let Some(portfolio) = p.portfolio.as_deref().filter(|s| !s.trim().is_empty()) {
            out.push_str(&format!("- Portfolio: {}\n", portfolio));
        }

        out.push_str("\nProfessional Summary:\n");
        out.push_str(&self.summary);
        out.push('\n');

        out.push_str("\nSkills:\n");
        for s in &self.skills {
            out.push_str(&format!("- {} ({})\n", s.name, s.level.as_str()));
        }

        out.push_str("\nWork Experience:\n");
        for e in &self.experience {
            let end = if e.is_current { "Present" } else { e.end_date.as_str() };
            out.push_str(&format!(
                "- {} at {} ({} - {})\n  {}\n",
                e.position, e.company, e.start_date, end, e.description
            ));
        }

        out.push_str("\nEducation:\n");
        for e in &self.education {
            let gpa = e
                .gpa
                .as_deref()
                .filter(|g| !g.trim().is_empty())
                .map(|g| format!(" - GPA: {}", g))
                .unwrap_or_default();
            out.push_str(&format!(
                "- {} in {} from {} ({} - {}){}\n",
                e.degree, e.field, e.institution, e.start_year, e.end_year, gpa
            ));
        }

        out
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CvRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    pub template_id: String,
    pub title: String,
    #[serde(flatten)]
    pub content: CvContent,
    pub last_score: Option<i32>,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Partial update; `None` leaves the stored value untouched.
#[derive(Debug, Clone, Default)]
pub struct CvPatch {
    pub template_id: Option<String>,
    pub content: Option<CvContent>,
    pub last_score: Option<i32>,
    pub image_url: Option<String>,
}

impl CvPatch {
    pub fn content(template_id: String, content: CvContent) -> Self {
        Self {
            template_id: Some(template_id),
            content: Some(content),
            ..Default::default()
        }
    }

    pub fn image_url(url: String) -> Self {
        Self {
            image_url: Some(url),
            ..Default::default()
        }
    }

    pub fn last_score(score: i32) -> Self {
        Self {
            last_score: Some(score),
            ..Default::default()
        }
    }

    /// Merges the patch into an existing record in place.
    pub fn apply_to(self, record: &mut CvRecord) {
        if let Some(template_id) = self.template_id {
            record.template_id = template_id;
        }
        if let Some(content) = self.content {
            record.title = content.title();
            record.content = content;
        }
        if let Some(score) = self.last_score {
            record.last_score = Some(score);
        }
        if let Some(url) = self.image_url {
            record.image_url = Some(url);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info(name: &str, email: &str, phone: &str, address: &str) -> PersonalInfo {
        PersonalInfo {
            full_name: name.into(),
            email: email.into(),
            phone: phone.into(),
            address: address.into(),
            ..Default::default()
        }
    }

    #[test]
    fn personal_info_requires_all_four_fields() {
        assert!(info("Ana", "ana@example.com", "0812", "Bandung").is_complete());
        assert!(!info("Ana", "ana@example.com", "0812", "   ").is_complete());
        assert!(!info("", "ana@example.com", "0812", "Bandung").is_complete());
        assert!(!info("Ana", "\t", "0812", "Bandung").is_complete());
    }

    #[test]
    fn title_falls_back_when_name_blank() {
        let mut content = CvContent::default();
        assert_eq!(content.title(), "Untitled CV");
        content.personal_info.full_name = " Ana Putri ".into();
        assert_eq!(content.title(), "CV - Ana Putri");
    }

    #[test]
    fn experience_period_uses_present() {
        let mut exp = Experience::blank("1".into());
        exp.start_date = "2020".into();
        assert_eq!(exp.period(), "2020-Present");
        exp.end_date = "2023".into();
        assert_eq!(exp.period(), "2020-2023");
        exp.is_current = true;
        assert_eq!(exp.period(), "2020-Present");
    }

    #[test]
    fn plain_text_lists_every_section() {
        let mut content = CvContent::default();
        content.personal_info = info("Ana", "ana@example.com", "0812", "Bandung");
        content.skills.push(Skill { name: "Rust".into(), level: SkillLevel::Expert });
        let mut exp = Experience::blank("e1".into());
        exp.position = "Engineer".into();
        exp.company = "Acme".into();
        exp.is_current = true;
        content.experience.push(exp);

        let text = content.to_plain_text();
        assert!(text.contains("- Name: Ana"));
        assert!(text.contains("- Rust (Expert)"));
        assert!(text.contains("- Engineer at Acme ( - Present)"));
        assert!(!text.contains("LinkedIn"));
    }
}
