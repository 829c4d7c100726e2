use serde::{Deserialize, Serialize};

use crate::builder::form::FormState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TemplateChoice {
    WithPhoto,
    WithoutPhoto,
}

impl TemplateChoice {
    pub fn template_id(self) -> &'static str {
        match self {
            TemplateChoice::WithPhoto => "photo-warm",
            TemplateChoice::WithoutPhoto => "classic-navy",
        }
    }

    pub fn from_template_id(id: &str) -> Option<Self> {
        match id {
            "photo-warm" => Some(TemplateChoice::WithPhoto),
            "classic-navy" => Some(TemplateChoice::WithoutPhoto),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    TemplateChoice,
    PhotoUpload,
    PersonalInfo,
    Skills,
    Experience,
    Education,
    Preview,
}

impl Step {
    pub fn label(self) -> &'static str {
        match self {
            Step::TemplateChoice => "Choose Template",
            Step::PhotoUpload => "Upload Photo",
            Step::PersonalInfo => "Personal Info",
            Step::Skills => "Skills",
            Step::Experience => "Experience",
            Step::Education => "Education",
            Step::Preview => "Preview",
        }
    }
}

const CHOOSING: &[Step] = &[Step::TemplateChoice];
const WITH_PHOTO: &[Step] = &[
    Step::PhotoUpload,
    Step::PersonalInfo,
    Step::Skills,
    Step::Experience,
    Step::Education,
    Step::Preview,
];
const WITHOUT_PHOTO: &[Step] = &[
    Step::PersonalInfo,
    Step::Skills,
    Step::Experience,
    Step::Education,
    Step::Preview,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Retreat {
    Moved,
    Exit,
}

/// Linear wizard over the steps implied by the template choice.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StepSequencer {
    choice: Option<TemplateChoice>,
    current: usize,
}

impl StepSequencer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn choice(&self) -> Option<TemplateChoice> {
        self.choice
    }

    pub fn steps(&self) -> &'static [Step] {
        match self.choice {
            None => CHOOSING,
            Some(TemplateChoice::WithPhoto) => WITH_PHOTO,
            Some(TemplateChoice::WithoutPhoto) => WITHOUT_PHOTO,
        }
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn current_step(&self) -> Step {
        self.steps()[self.current]
    }

    pub fn is_last(&self) -> bool {
        self.current + 1 >= self.steps().len()
    }

    pub fn choose_template(&mut self, choice: TemplateChoice) {
        self.choice = Some(choice);
        self.current = 0;
    }

    pub fn is_current_step_valid(&self, form: &FormState) -> bool {
        match self.current_step() {
            Step::PersonalInfo => form.content.personal_info.is_complete(),
            _ => true,
        }
    }

    pub fn can_advance(&self, form: &FormState) -> bool {
        !self.is_last() && self.is_current_step_valid(form)
    }

    /// Moves forward when allowed; otherwise leaves the position untouched.
    pub fn advance(&mut self, form: &FormState) -> bool {
        if !self.can_advance(form) {
            return false;
        }
        self.current += 1;
        true
    }

    pub fn retreat(&mut self) -> Retreat {
        if self.current == 0 {
            return Retreat::Exit;
        }
        self.current -= 1;
        Retreat::Moved
    }
}
