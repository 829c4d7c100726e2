use std::sync::Arc;

use serde::Serialize;
use uuid::Uuid;

use crate::builder::TemplateChoice;
use crate::database::Gateway;
use crate::error::{Error, Result};
use crate::middleware::auth::Session;
use crate::models::cv::{CvContent, CvPatch, CvRecord};
use crate::models::user::PremiumFeature;
use crate::render::artifact::{sanitize_file_name, Artifact, ArtifactKind, ArtifactRenderer};
use crate::render::layout::{build_layout, Photo};
use crate::services::draft_service::Draft;

#[derive(Debug, Clone, Serialize)]
pub struct SaveOutcome {
    pub record: CvRecord,
    pub created: bool,
    /// False when the preview image could not be captured or uploaded.
    pub image_saved: bool,
}

#[derive(Debug, Clone)]
pub struct NamedArtifact {
    pub artifact: Artifact,
    pub file_name: String,
}

#[derive(Clone)]
pub struct CvService {
    gateway: Gateway,
    renderer: Arc<dyn ArtifactRenderer>,
    max_free_cvs: i32,
}

impl CvService {
    pub fn new(gateway: Gateway, renderer: Arc<dyn ArtifactRenderer>, max_free_cvs: i32) -> Self {
        Self {
            gateway,
            renderer,
            max_free_cvs,
        }
    }

    pub async fn list(&self, session: &Session) -> Result<Vec<CvRecord>> {
        self.gateway.cvs.list(session.user_id()).await
    }

    /// Records owned by someone else read as missing.
    pub async fn get(&self, session: &Session, id: Uuid) -> Result<CvRecord> {
        self.gateway
            .cvs
            .get(id)
            .await?
            .filter(|r| r.user_id == session.user_id())
            .ok_or_else(|| Error::NotFound(format!("CV {} not found", id)))
    }

    fn may_create(&self, session: &Session) -> bool {
        session.allows(PremiumFeature::MultipleCvs) || session.user.cv_count < self.max_free_cvs
    }

    /// Captures the preview image, persists the draft and attaches the image.
    ///
    /// Image capture and upload are best effort: the record is saved either
    /// way and `image_saved` reports whether the image made it.
    pub async fn save_draft(&self, session: &Session, draft: &Draft) -> Result<SaveOutcome> {
        let choice = draft
            .sequencer
            .choice()
            .ok_or_else(|| Error::BadRequest("Choose a template before saving".to_string()))?;
        let content = &draft.form.content;

        if draft.source_cv_id.is_none() && !self.may_create(session) {
            return Err(Error::Forbidden(format!(
                "Free accounts can keep {} CV(s); upgrade to premium for more",
                self.max_free_cvs
            )));
        }

        let layout = build_layout(content, choice, draft.photo.as_ref());
        let png = match self.renderer.render(&layout, ArtifactKind::Png).await {
            Ok(artifact) => Some(artifact.bytes),
            Err(e) => {
                tracing::warn!(draft_id = %draft.id, error = %e, "CV image capture failed; saving without image");
                None
            }
        };

        let (mut record, created) = match draft.source_cv_id {
            Some(id) => {
                self.get(session, id).await?;
                let patch = CvPatch::content(choice.template_id().to_string(), content.clone());
                (self.gateway.cvs.update(id, patch).await?, false)
            }
            None => {
                let record = self
                    .gateway
                    .cvs
                    .create(session.user_id(), choice.template_id(), content)
                    .await?;
                (record, true)
            }
        };
        tracing::info!(cv_id = %record.id, created, "CV saved");

        let mut image_saved = false;
        if let Some(png) = png {
            match self
                .gateway
                .blobs
                .put_cv_image(record.user_id, record.id, png)
                .await
            {
                Ok(url) => match self.gateway.cvs.update(record.id, CvPatch::image_url(url)).await {
                    Ok(updated) => {
                        record = updated;
                        image_saved = true;
                    }
                    Err(e) => tracing::warn!(cv_id = %record.id, error = %e, "Failed to attach CV image URL"),
                },
                Err(e) => tracing::warn!(cv_id = %record.id, error = %e, "CV image upload failed"),
            }
        }

        Ok(SaveOutcome {
            record,
            created,
            image_saved,
        })
    }

    async fn render_named(
        &self,
        content: &CvContent,
        choice: TemplateChoice,
        photo: Option<&Photo>,
        kind: ArtifactKind,
        file_name: &str,
    ) -> Result<NamedArtifact> {
        let file_name = sanitize_file_name(file_name, kind)?;
        let layout = build_layout(content, choice, photo);
        let artifact = self.renderer.render(&layout, kind).await?;
        Ok(NamedArtifact {
            artifact,
            file_name,
        })
    }

    pub async fn export_draft(
        &self,
        draft: &Draft,
        kind: ArtifactKind,
        file_name: &str,
    ) -> Result<NamedArtifact> {
        let choice = draft
            .sequencer
            .choice()
            .ok_or_else(|| Error::BadRequest("Choose a template before exporting".to_string()))?;
        self.render_named(&draft.form.content, choice, draft.photo.as_ref(), kind, file_name)
            .await
    }

    /// Saved records do not keep the photo, so the photo slot shows its placeholder.
    pub async fn export_record(
        &self,
        session: &Session,
        id: Uuid,
        kind: ArtifactKind,
        file_name: &str,
    ) -> Result<NamedArtifact> {
        let record = self.get(session, id).await?;
        let choice = TemplateChoice::from_template_id(&record.template_id).ok_or_else(|| {
            Error::Internal(format!("Unknown template '{}'", record.template_id))
        })?;
        self.render_named(&record.content, choice, None, kind, file_name)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::editors::PersonalField;
    use crate::database::memory::MemoryStore;
    use crate::database::{BlobStore, UserStore};
    use crate::models::user::{NewUser, SubscriptionStatus};
    use crate::render::artifact::ArtifactError;
    use crate::render::layout::LayoutDocument;
    use crate::services::draft_service::DraftService;
    use async_trait::async_trait;
    use bytes::Bytes;
    use chrono::{Duration, Utc};

    struct FakeRenderer {
        fail: bool,
    }

    #[async_trait]
    impl ArtifactRenderer for FakeRenderer {
        async fn render(
            &self,
            doc: &LayoutDocument,
            kind: ArtifactKind,
        ) -> std::result::Result<Artifact, ArtifactError> {
            if self.fail {
                return Err(ArtifactError::MissingOutput("fake".into()));
            }
            Ok(Artifact {
                kind,
                bytes: Bytes::from(doc.template_id.as_bytes().to_vec()),
            })
        }
    }

    struct FakeBlobs {
        fail: bool,
    }

    #[async_trait]
    impl BlobStore for FakeBlobs {
        async fn put_cv_image(&self, owner_id: Uuid, cv_id: Uuid, _png: Bytes) -> Result<String> {
            if self.fail {
                return Err(Error::Internal("storage offline".into()));
            }
            Ok(format!("mem://{}/{}", owner_id, cv_id))
        }
    }

    struct Fixture {
        svc: CvService,
        drafts: DraftService,
        store: Arc<MemoryStore>,
    }

    fn fixture(render_fails: bool, upload_fails: bool) -> Fixture {
        let store = Arc::new(MemoryStore::new());
        let gateway = Gateway {
            cvs: store.clone(),
            users: store.clone(),
            scans: store.clone(),
            blobs: Arc::new(FakeBlobs { fail: upload_fails }),
        };
        Fixture {
            svc: CvService::new(gateway, Arc::new(FakeRenderer { fail: render_fails }), 1),
            drafts: DraftService::new(),
            store,
        }
    }

    async fn session(store: &MemoryStore, premium: bool) -> Session {
        let user = UserStore::create(
            store,
            NewUser {
                email: format!("{}@example.com", Uuid::new_v4()),
                display_name: "Ana".into(),
                password_hash: "x".into(),
            },
        )
        .await
        .unwrap();
        let user = if premium {
            store
                .set_subscription(
                    user.id,
                    SubscriptionStatus::Premium,
                    Some(Utc::now() + Duration::days(30)),
                )
                .await
                .unwrap()
        } else {
            user
        };
        Session::new(user)
    }

    async fn filled_draft(f: &Fixture, session: &Session) -> Draft {
        let draft = f.drafts.create(session.user_id(), None).await;
        f.drafts
            .choose_template(session.user_id(), draft.id, TemplateChoice::WithoutPhoto)
            .await
            .unwrap();
        let (draft, _) = f
            .drafts
            .apply_edit(
                session.user_id(),
                draft.id,
                crate::services::draft_service::DraftEdit::SetPersonal {
                    field: PersonalField::FullName,
                    value: "Ana Putri".into(),
                },
            )
            .await
            .unwrap();
        draft
    }

    #[tokio::test]
    async fn save_then_read_back_is_deep_equal() {
        let f = fixture(false, false);
        let session = session(&f.store, false).await;
        let draft = filled_draft(&f, &session).await;

        let outcome = f.svc.save_draft(&session, &draft).await.unwrap();
        assert!(outcome.created);
        assert!(outcome.image_saved);
        assert_eq!(outcome.record.title, "CV - Ana Putri");
        assert!(outcome.record.image_url.is_some());

        let read = f.svc.get(&session, outcome.record.id).await.unwrap();
        assert_eq!(read.content, draft.form.content);
        assert_eq!(read.template_id, "classic-navy");
    }

    #[tokio::test]
    async fn capture_failure_still_saves() {
        let f = fixture(true, false);
        let session = session(&f.store, false).await;
        let draft = filled_draft(&f, &session).await;

        let outcome = f.svc.save_draft(&session, &draft).await.unwrap();
        assert!(!outcome.image_saved);
        assert!(outcome.record.image_url.is_none());
        assert_eq!(f.svc.list(&session).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn upload_failure_still_saves() {
        let f = fixture(false, true);
        let session = session(&f.store, false).await;
        let draft = filled_draft(&f, &session).await;

        let outcome = f.svc.save_draft(&session, &draft).await.unwrap();
        assert!(!outcome.image_saved);
        assert!(outcome.record.image_url.is_none());
    }

    #[tokio::test]
    async fn free_users_are_capped_but_can_update() {
        let f = fixture(false, false);
        let first = session(&f.store, false).await;
        let draft = filled_draft(&f, &first).await;
        let saved = f.svc.save_draft(&first, &draft).await.unwrap();

        // Reload the session so cv_count is current.
        let user = UserStore::get(f.store.as_ref(), first.user_id()).await.unwrap().unwrap();
        let session = Session::new(user);
        let another = filled_draft(&f, &session).await;
        assert!(matches!(
            f.svc.save_draft(&session, &another).await,
            Err(Error::Forbidden(_))
        ));

        let editing = f
            .drafts
            .mark_saved(session.user_id(), draft.id, saved.record.id)
            .await
            .unwrap();
        let outcome = f.svc.save_draft(&session, &editing).await.unwrap();
        assert!(!outcome.created);
        assert_eq!(outcome.record.id, saved.record.id);
    }

    #[tokio::test]
    async fn premium_users_are_not_capped() {
        let f = fixture(false, false);
        let session = session(&f.store, true).await;
        for _ in 0..3 {
            let draft = filled_draft(&f, &session).await;
            f.svc.save_draft(&session, &draft).await.unwrap();
        }
        assert_eq!(f.svc.list(&session).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn records_of_others_are_hidden() {
        let f = fixture(false, false);
        let owner = session(&f.store, false).await;
        let draft = filled_draft(&f, &owner).await;
        let saved = f.svc.save_draft(&owner, &draft).await.unwrap();

        let stranger = session(&f.store, false).await;
        assert!(matches!(
            f.svc.get(&stranger, saved.record.id).await,
            Err(Error::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn export_validates_name_and_uses_template() {
        let f = fixture(false, false);
        let session = session(&f.store, false).await;
        let draft = filled_draft(&f, &session).await;

        assert!(f.svc.export_draft(&draft, ArtifactKind::Pdf, "  ").await.is_err());

        let named = f
            .svc
            .export_draft(&draft, ArtifactKind::Pdf, "Ana CV")
            .await
            .unwrap();
        assert_eq!(named.file_name, "Ana CV.pdf");
        assert_eq!(named.artifact.bytes, Bytes::from_static(b"classic-navy"));
    }

    #[tokio::test]
    async fn export_failure_is_surfaced() {
        let f = fixture(true, false);
        let session = session(&f.store, false).await;
        let draft = filled_draft(&f, &session).await;
        assert!(matches!(
            f.svc.export_draft(&draft, ArtifactKind::Pdf, "cv").await,
            Err(Error::Artifact(_))
        ));
    }
}
