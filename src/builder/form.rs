use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::builder::editors::{
    EducationField, ExperienceField, PersonalField, SKILL_INPUT, SUMMARY_INPUT,
};
use crate::models::cv::{CvContent, Education, Experience, Skill, SkillLevel};

/// In-progress CV owned by a draft until it is saved.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormState {
    pub content: CvContent,
}

impl FormState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Re-hydrates the form from a saved record's content.
    pub fn from_content(content: CvContent) -> Self {
        Self { content }
    }

    pub fn set_personal(&mut self, field: PersonalField, raw: &str) {
        let value = field.input().apply(raw);
        let info = &mut self.content.personal_info;
        match field {
            PersonalField::FullName => info.full_name = value,
            PersonalField::Profession => info.profession = value,
            PersonalField::Email => info.email = value,
            PersonalField::Phone => info.phone = value,
            PersonalField::Address => info.address = value,
            PersonalField::Linkedin => info.linkedin = Some(value).filter(|v| !v.is_empty()),
            PersonalField::Portfolio => info.portfolio = Some(value).filter(|v| !v.is_empty()),
        }
    }

    pub fn set_summary(&mut self, raw: &str) {
        self.content.summary = SUMMARY_INPUT.apply(raw);
    }

    /// Appends a trimmed skill at the default level. Blank input is ignored.
    pub fn add_skill(&mut self, raw: &str) -> bool {
        let name = SKILL_INPUT.apply(raw.trim());
        let name = name.trim();
        if name.is_empty() {
            return false;
        }
        self.content.skills.push(Skill {
            name: name.to_string(),
            level: SkillLevel::default(),
        });
        true
    }

    pub fn remove_skill(&mut self, index: usize) -> bool {
        if index < self.content.skills.len() {
            self.content.skills.remove(index);
            true
        } else {
            false
        }
    }

    pub fn set_skill_level(&mut self, index: usize, level: SkillLevel) -> bool {
        match self.content.skills.get_mut(index) {
            Some(skill) => {
                skill.level = level;
                true
            }
            None => false,
        }
    }

    pub fn add_experience(&mut self) -> String {
        let id = Uuid::new_v4().to_string();
        self.content.experience.push(Experience::blank(id.clone()));
        id
    }

    pub fn update_experience(&mut self, id: &str, field: ExperienceField, raw: &str) -> bool {
        let Some(exp) = self.content.experience.iter_mut().find(|e| e.id == id) else {
            return false;
        };
        let value = field.input().apply(raw);
        match field {
            ExperienceField::Company => exp.company = value,
            ExperienceField::Position => exp.position = value,
            ExperienceField::StartDate => exp.start_date = value,
            ExperienceField::EndDate => exp.end_date = value,
            ExperienceField::Description => exp.description = value,
        }
        true
    }

    pub fn set_experience_current(&mut self, id: &str, is_current: bool) -> bool {
        match self.content.experience.iter_mut().find(|e| e.id == id) {
            Some(exp) => {
                exp.is_current = is_current;
                true
            }
            None => false,
        }
    }

    pub fn remove_experience(&mut self, id: &str) -> bool {
        let before = self.content.experience.len();
        self.content.experience.retain(|e| e.id != id);
        self.content.experience.len() != before
    }

    pub fn add_education(&mut self) -> String {
        let id = Uuid::new_v4().to_string();
        self.content.education.push(Education::blank(id.clone()));
        id
    }

    pub fn update_education(&mut self, id: &str, field: EducationField, raw: &str) -> bool {
        let Some(edu) = self.content.education.iter_mut().find(|e| e.id == id) else {
            return false;
        };
        let value = field.transform(raw);
        match field {
            EducationField::Institution => edu.institution = value,
            EducationField::Degree => edu.degree = value,
            EducationField::Field => edu.field = value,
            EducationField::StartYear => edu.start_year = value,
            EducationField::EndYear => edu.end_year = value,
            EducationField::Gpa => edu.gpa = Some(value).filter(|v| !v.is_empty()),
        }
        true
    }

    pub fn remove_education(&mut self, id: &str) -> bool {
        let before = self.content.education.len();
        self.content.education.retain(|e| e.id != id);
        self.content.education.len() != before
    }
}
