use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::builder::editors::{EducationField, ExperienceField, PersonalField};
use crate::builder::{FormState, Retreat, StepSequencer, TemplateChoice};
use crate::error::{Error, Result};
use crate::models::cv::{CvRecord, SkillLevel};
use crate::render::layout::Photo;

/// A wizard session held on the server for one user.
#[derive(Debug, Clone)]
pub struct Draft {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub form: FormState,
    pub sequencer: StepSequencer,
    pub photo: Option<Photo>,
    /// Set when the draft edits an already saved CV.
    pub source_cv_id: Option<Uuid>,
    pub updated_at: DateTime<Utc>,
}

/// One field-editor operation, tagged by `op`.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum DraftEdit {
    SetPersonal {
        field: PersonalField,
        value: String,
    },
    SetSummary {
        value: String,
    },
    AddSkill {
        name: String,
    },
    RemoveSkill {
        index: usize,
    },
    SetSkillLevel {
        index: usize,
        level: SkillLevel,
    },
    AddExperience,
    UpdateExperience {
        id: String,
        field: ExperienceField,
        value: String,
    },
    SetExperienceCurrent {
        id: String,
        is_current: bool,
    },
    RemoveExperience {
        id: String,
    },
    AddEducation,
    UpdateEducation {
        id: String,
        field: EducationField,
        value: String,
    },
    RemoveEducation {
        id: String,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EditOutcome {
    pub changed: bool,
    /// Id of a freshly added experience or education entry.
    pub created_id: Option<String>,
}

impl DraftEdit {
    pub fn apply(self, form: &mut FormState) -> EditOutcome {
        let changed = |changed: bool| EditOutcome {
            changed,
            created_id: None,
        };
        match self {
            DraftEdit::SetPersonal { field, value } => {
                form.set_personal(field, &value);
                changed(true)
            }
            DraftEdit::SetSummary { value } => {
                form.set_summary(&value);
                changed(true)
            }
            DraftEdit::AddSkill { name } => changed(form.add_skill(&name)),
            DraftEdit::RemoveSkill { index } => changed(form.remove_skill(index)),
            DraftEdit::SetSkillLevel { index, level } => changed(form.set_skill_level(index, level)),
            DraftEdit::AddExperience => EditOutcome {
                changed: true,
                created_id: Some(form.add_experience()),
            },
            DraftEdit::UpdateExperience { id, field, value } => {
                changed(form.update_experience(&id, field, &value))
            }
            DraftEdit::SetExperienceCurrent { id, is_current } => {
                changed(form.set_experience_current(&id, is_current))
            }
            DraftEdit::RemoveExperience { id } => changed(form.remove_experience(&id)),
            DraftEdit::AddEducation => EditOutcome {
                changed: true,
                created_id: Some(form.add_education()),
            },
            DraftEdit::UpdateEducation { id, field, value } => {
                changed(form.update_education(&id, field, &value))
            }
            DraftEdit::RemoveEducation { id } => changed(form.remove_education(&id)),
        }
    }
}

#[derive(Clone, Default)]
pub struct DraftService {
    drafts: Arc<RwLock<HashMap<Uuid, Draft>>>,
}

impl DraftService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a wizard, optionally pre-filled from a saved record.
    pub async fn create(&self, owner_id: Uuid, source: Option<&CvRecord>) -> Draft {
        let mut sequencer = StepSequencer::new();
        let (form, source_cv_id) = match source {
            Some(record) => {
                if let Some(choice) = TemplateChoice::from_template_id(&record.template_id) {
                    sequencer.choose_template(choice);
                }
                (FormState::from_content(record.content.clone()), Some(record.id))
            }
            None => (FormState::new(), None),
        };

        let draft = Draft {
            id: Uuid::new_v4(),
            owner_id,
            form,
            sequencer,
            photo: None,
            source_cv_id,
            updated_at: Utc::now(),
        };
        self.drafts.write().await.insert(draft.id, draft.clone());
        tracing::info!(draft_id = %draft.id, owner_id = %owner_id, "Draft created");
        draft
    }

    /// Drafts of other users read as missing.
    pub async fn get(&self, owner_id: Uuid, id: Uuid) -> Result<Draft> {
        self.drafts
            .read()
            .await
            .get(&id)
            .filter(|d| d.owner_id == owner_id)
            .cloned()
            .ok_or_else(|| draft_not_found(id))
    }

    async fn update<T>(
        &self,
        owner_id: Uuid,
        id: Uuid,
        f: impl FnOnce(&mut Draft) -> Result<T>,
    ) -> Result<(Draft, T)> {
        let mut drafts = self.drafts.write().await;
        let draft = drafts
            .get_mut(&id)
            .filter(|d| d.owner_id == owner_id)
            .ok_or_else(|| draft_not_found(id))?;
        let out = f(draft)?;
        draft.updated_at = Utc::now();
        Ok((draft.clone(), out))
    }

    pub async fn choose_template(
        &self,
        owner_id: Uuid,
        id: Uuid,
        choice: TemplateChoice,
    ) -> Result<Draft> {
        let (draft, _) = self
            .update(owner_id, id, |d| {
                d.sequencer.choose_template(choice);
                if choice == TemplateChoice::WithoutPhoto {
                    d.photo = None;
                }
                Ok(())
            })
            .await?;
        Ok(draft)
    }

    pub async fn apply_edit(
        &self,
        owner_id: Uuid,
        id: Uuid,
        edit: DraftEdit,
    ) -> Result<(Draft, EditOutcome)> {
        self.update(owner_id, id, |d| Ok(edit.apply(&mut d.form))).await
    }

    pub async fn set_photo(&self, owner_id: Uuid, id: Uuid, photo: Photo) -> Result<Draft> {
        let (draft, _) = self
            .update(owner_id, id, |d| {
                if d.sequencer.choice() != Some(TemplateChoice::WithPhoto) {
                    return Err(Error::BadRequest(
                        "The chosen template has no photo slot".to_string(),
                    ));
                }
                d.photo = Some(photo);
                Ok(())
            })
            .await?;
        Ok(draft)
    }

    /// Returns whether the wizard moved.
    pub async fn advance(&self, owner_id: Uuid, id: Uuid) -> Result<(Draft, bool)> {
        self.update(owner_id, id, |d| Ok(d.sequencer.advance(&d.form)))
            .await
    }

    pub async fn retreat(&self, owner_id: Uuid, id: Uuid) -> Result<(Draft, Retreat)> {
        self.update(owner_id, id, |d| Ok(d.sequencer.retreat())).await
    }

    /// Points the draft at the record it was saved into.
    pub async fn mark_saved(&self, owner_id: Uuid, id: Uuid, cv_id: Uuid) -> Result<Draft> {
        let (draft, _) = self
            .update(owner_id, id, |d| {
                d.source_cv_id = Some(cv_id);
                Ok(())
            })
            .await?;
        Ok(draft)
    }

    pub async fn discard(&self, owner_id: Uuid, id: Uuid) -> Result<()> {
        let mut drafts = self.drafts.write().await;
        match drafts.get(&id) {
            Some(d) if d.owner_id == owner_id => {
                drafts.remove(&id);
                Ok(())
            }
            _ => Err(draft_not_found(id)),
        }
    }
}

fn draft_not_found(id: Uuid) -> Error {
    Error::NotFound(format!("Draft {} not found", id))
}
