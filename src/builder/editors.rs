use serde::{Deserialize, Serialize};

/// Bounds for a free-text input.
#[derive(Debug, Clone, Copy)]
pub struct TextInput {
    pub max_len: Option<usize>,
    pub multiline: bool,
}

impl TextInput {
    pub const fn single_line(max_len: usize) -> Self {
        Self {
            max_len: Some(max_len),
            multiline: false,
        }
    }

    pub const fn multi_line(max_len: usize) -> Self {
        Self {
            max_len: Some(max_len),
            multiline: true,
        }
    }

    pub fn apply(&self, raw: &str) -> String {
        let text: String = if self.multiline {
            raw.to_string()
        } else {
            raw.chars()
                .map(|c| if c == '\n' || c == '\r' { ' ' } else { c })
                .collect()
        };
        match self.max_len {
            Some(max) => text.chars().take(max).collect(),
            None => text,
        }
    }
}

pub const NAME_INPUT: TextInput = TextInput::single_line(120);
pub const CONTACT_INPUT: TextInput = TextInput::single_line(200);
pub const SUMMARY_INPUT: TextInput = TextInput::multi_line(1500);
pub const DESCRIPTION_INPUT: TextInput = TextInput::multi_line(1500);
pub const SKILL_INPUT: TextInput = TextInput::single_line(60);
pub const GPA_INPUT: TextInput = TextInput::single_line(10);

/// Keeps ASCII digits only, at most four of them. Sanitizes, never rejects.
pub fn sanitize_year(raw: &str) -> String {
    raw.chars().filter(|c| c.is_ascii_digit()).take(4).collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PersonalField {
    FullName,
    Profession,
    Email,
    Phone,
    Address,
    Linkedin,
    Portfolio,
}

impl PersonalField {
    pub fn input(self) -> TextInput {
        match self {
            PersonalField::FullName | PersonalField::Profession => NAME_INPUT,
            _ => CONTACT_INPUT,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExperienceField {
    Company,
    Position,
    StartDate,
    EndDate,
    Description,
}

impl ExperienceField {
    pub fn input(self) -> TextInput {
        match self {
            ExperienceField::Company | ExperienceField::Position => NAME_INPUT,
            ExperienceField::StartDate | ExperienceField::EndDate => TextInput::single_line(20),
            ExperienceField::Description => DESCRIPTION_INPUT,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EducationField {
    Institution,
    Degree,
    Field,
    StartYear,
    EndYear,
    Gpa,
}

impl EducationField {
    /// Year fields are sanitized, the rest are bounded text.
    pub fn transform(self, raw: &str) -> String {
        match self {
            EducationField::StartYear | EducationField::EndYear => sanitize_year(raw),
            EducationField::Gpa => GPA_INPUT.apply(raw),
            _ => NAME_INPUT.apply(raw),
        }
    }
}
