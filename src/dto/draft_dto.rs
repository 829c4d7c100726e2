use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::builder::{Step, TemplateChoice};
use crate::models::cv::CvContent;
use crate::render::artifact::ArtifactKind;
use crate::services::draft_service::Draft;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateDraftPayload {
    /// Re-open a saved CV for editing.
    pub cv_id: Option<Uuid>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChooseTemplatePayload {
    pub choice: TemplateChoice,
}

fn default_kind() -> ArtifactKind {
    ArtifactKind::Pdf
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ExportPayload {
    #[serde(default = "default_kind")]
    pub kind: ArtifactKind,
    #[validate(length(min = 1, max = 120))]
    pub file_name: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct StepView {
    pub step: Step,
    pub label: &'static str,
}

/// What the client needs to draw the current wizard screen.
#[derive(Debug, Clone, Serialize)]
pub struct DraftView {
    pub id: Uuid,
    pub template_id: Option<&'static str>,
    pub steps: Vec<StepView>,
    pub step_index: usize,
    pub current_step: Step,
    pub is_last: bool,
    pub step_valid: bool,
    pub can_advance: bool,
    pub has_photo: bool,
    pub source_cv_id: Option<Uuid>,
    pub content: CvContent,
}

impl From<&Draft> for DraftView {
    fn from(d: &Draft) -> Self {
        let seq = &d.sequencer;
        Self {
            id: d.id,
            template_id: seq.choice().map(TemplateChoice::template_id),
            steps: seq
                .steps()
                .iter()
                .map(|s| StepView {
                    step: *s,
                    label: s.label(),
                })
                .collect(),
            step_index: seq.current_index(),
            current_step: seq.current_step(),
            is_last: seq.is_last(),
            step_valid: seq.is_current_step_valid(&d.form),
            can_advance: seq.can_advance(&d.form),
            has_photo: d.photo.is_some(),
            source_cv_id: d.source_cv_id,
            content: d.form.content.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct EditResponse {
    pub draft: DraftView,
    pub changed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_id: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NavigationResponse {
    pub draft: DraftView,
    pub moved: bool,
    /// Retreating from the first step leaves the wizard.
    pub exit: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::{FormState, StepSequencer};
    use chrono::Utc;

    #[test]
    fn fresh_draft_view() {
        let draft = Draft {
            id: Uuid::new_v4(),
            owner_id: Uuid::new_v4(),
            form: FormState::new(),
            sequencer: StepSequencer::new(),
            photo: None,
            source_cv_id: None,
            updated_at: Utc::now(),
        };
        let view = DraftView::from(&draft);
        assert_eq!(view.template_id, None);
        assert_eq!(view.current_step, Step::TemplateChoice);
        assert!(view.is_last);
        assert!(!view.can_advance);

        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["current_step"], "template_choice");
        assert_eq!(json["steps"][0]["label"], "Choose Template");
    }

    #[test]
    fn export_kind_defaults_to_pdf() {
        let p: ExportPayload = serde_json::from_str(r#"{"file_name": "cv"}"#).unwrap();
        assert_eq!(p.kind, ArtifactKind::Pdf);
        let p: ExportPayload =
            serde_json::from_str(r#"{"file_name": "cv", "kind": "png"}"#).unwrap();
        assert_eq!(p.kind, ArtifactKind::Png);
    }
}
