//! Storage seams used by the services.
//!
//! Every call returns `crate::error::Result`, so a caller has to deal with
//! the failure before it can touch the value.

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::Result;
use crate::models::cv::{CvContent, CvPatch, CvRecord};
use crate::models::scan::ScanRecord;
use crate::models::score::CvScore;
use crate::models::user::{NewUser, ProfileUpdate, SubscriptionStatus, UserAccount};

#[async_trait]
pub trait CvStore: Send + Sync {
    /// Inserts a record and bumps the owner's `cv_count` atomically.
    async fn create(&self, owner_id: Uuid, template_id: &str, content: &CvContent)
        -> Result<CvRecord>;

    /// Writes only the `Some` fields of the patch. Missing ids are `NotFound`.
    async fn update(&self, id: Uuid, patch: CvPatch) -> Result<CvRecord>;

    async fn get(&self, id: Uuid) -> Result<Option<CvRecord>>;

    /// Newest first.
    async fn list(&self, owner_id: Uuid) -> Result<Vec<CvRecord>>;
}

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Fails with `Conflict` when the email is taken.
    async fn create(&self, user: NewUser) -> Result<UserAccount>;

    async fn get(&self, id: Uuid) -> Result<Option<UserAccount>>;

    /// Returns the account together with its password hash.
    async fn find_by_email(&self, email: &str) -> Result<Option<(UserAccount, String)>>;

    async fn update_profile(&self, id: Uuid, update: ProfileUpdate) -> Result<UserAccount>;

    async fn set_subscription(
        &self,
        id: Uuid,
        status: SubscriptionStatus,
        expiry: Option<DateTime<Utc>>,
    ) -> Result<UserAccount>;

    /// Counts a scan against today (UTC), starting over on a new day.
    async fn record_scan(&self, id: Uuid) -> Result<UserAccount>;
}

#[async_trait]
pub trait ScanStore: Send + Sync {
    async fn insert(
        &self,
        owner_id: Uuid,
        cv_id: Option<Uuid>,
        original_text: &str,
        score: &CvScore,
    ) -> Result<ScanRecord>;

    async fn list(&self, owner_id: Uuid) -> Result<Vec<ScanRecord>>;
}

#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Stores the PNG at `cv-images/<owner>/<cv>.png` and returns its public URL.
    async fn put_cv_image(&self, owner_id: Uuid, cv_id: Uuid, png: Bytes) -> Result<String>;
}

pub fn cv_image_path(owner_id: Uuid, cv_id: Uuid) -> String {
    format!("cv-images/{}/{}.png", owner_id, cv_id)
}
