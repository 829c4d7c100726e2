use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::database::gateway::{CvStore, ScanStore, UserStore};
use crate::error::{Error, Result};
use crate::models::cv::{CvContent, CvPatch, CvRecord};
use crate::models::scan::ScanRecord;
use crate::models::score::CvScore;
use crate::models::user::{NewUser, ProfileUpdate, SubscriptionStatus, UserAccount};

struct StoredUser {
    account: UserAccount,
    password_hash: String,
    scans_day: Option<NaiveDate>,
}

impl StoredUser {
    /// A stale counter from an earlier day reads as zero.
    fn snapshot(&self) -> UserAccount {
        let mut account = self.account.clone();
        if self.scans_day != Some(Utc::now().date_naive()) {
            account.scans_today = 0;
        }
        account
    }
}

/// Process-local store used for tests and when no database is configured.
#[derive(Default)]
pub struct MemoryStore {
    cvs: RwLock<HashMap<Uuid, CvRecord>>,
    users: RwLock<HashMap<Uuid, StoredUser>>,
    scans: RwLock<Vec<ScanRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn user_not_found(id: Uuid) -> Error {
    Error::NotFound(format!("User {} not found", id))
}

#[async_trait]
impl CvStore for MemoryStore {
    async fn create(
        &self,
        owner_id: Uuid,
        template_id: &str,
        content: &CvContent,
    ) -> Result<CvRecord> {
        // Lock order: users, then cvs.
        let mut users = self.users.write().await;
        let mut cvs = self.cvs.write().await;

        let now = Utc::now();
        let record = CvRecord {
            id: Uuid::new_v4(),
            user_id: owner_id,
            template_id: template_id.to_string(),
            title: content.title(),
            content: content.clone(),
            last_score: None,
            image_url: None,
            created_at: now,
            updated_at: now,
        };
        cvs.insert(record.id, record.clone());
        if let Some(user) = users.get_mut(&owner_id) {
            user.account.cv_count += 1;
        }
        Ok(record)
    }

    async fn update(&self, id: Uuid, patch: CvPatch) -> Result<CvRecord> {
        let mut cvs = self.cvs.write().await;
        let record = cvs
            .get_mut(&id)
            .ok_or_else(|| Error::NotFound(format!("CV {} not found", id)))?;
        patch.apply_to(record);
        record.updated_at = Utc::now();
        Ok(record.clone())
    }

    async fn get(&self, id: Uuid) -> Result<Option<CvRecord>> {
        Ok(self.cvs.read().await.get(&id).cloned())
    }

    async fn list(&self, owner_id: Uuid) -> Result<Vec<CvRecord>> {
        let mut records: Vec<CvRecord> = self
            .cvs
            .read()
            .await
            .values()
            .filter(|r| r.user_id == owner_id)
            .cloned()
            .collect();
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(records)
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn create(&self, user: NewUser) -> Result<UserAccount> {
        let mut users = self.users.write().await;
        if users
            .values()
            .any(|u| u.account.email.eq_ignore_ascii_case(&user.email))
        {
            return Err(Error::Conflict("Email is already registered".to_string()));
        }

        let account = UserAccount {
            id: Uuid::new_v4(),
            email: user.email,
            display_name: user.display_name,
            photo_url: None,
            subscription_status: SubscriptionStatus::Free,
            subscription_expiry: None,
            cv_count: 0,
            scans_today: 0,
            created_at: Utc::now(),
        };
        users.insert(
            account.id,
            StoredUser {
                account: account.clone(),
                password_hash: user.password_hash,
                scans_day: None,
            },
        );
        Ok(account)
    }

    async fn get(&self, id: Uuid) -> Result<Option<UserAccount>> {
        Ok(self.users.read().await.get(&id).map(StoredUser::snapshot))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<(UserAccount, String)>> {
        Ok(self
            .users
            .read()
            .await
            .values()
            .find(|u| u.account.email.eq_ignore_ascii_case(email))
            .map(|u| (u.snapshot(), u.password_hash.clone())))
    }

    async fn update_profile(&self, id: Uuid, update: ProfileUpdate) -> Result<UserAccount> {
        let mut users = self.users.write().await;
        let user = users.get_mut(&id).ok_or_else(|| user_not_found(id))?;
        if let Some(name) = update.display_name {
            user.account.display_name = name;
        }
        if let Some(url) = update.photo_url {
            user.account.photo_url = Some(url);
        }
        Ok(user.snapshot())
    }

    async fn set_subscription(
        &self,
        id: Uuid,
        status: SubscriptionStatus,
        expiry: Option<DateTime<Utc>>,
    ) -> Result<UserAccount> {
        let mut users = self.users.write().await;
        let user = users.get_mut(&id).ok_or_else(|| user_not_found(id))?;
        user.account.subscription_status = status;
        user.account.subscription_expiry = expiry;
        Ok(user.snapshot())
    }

    async fn record_scan(&self, id: Uuid) -> Result<UserAccount> {
        let today = Utc::now().date_naive();
        let mut users = self.users.write().await;
        let user = users.get_mut(&id).ok_or_else(|| user_not_found(id))?;
        if user.scans_day == Some(today) {
            user.account.scans_today += 1;
        } else {
            user.scans_day = Some(today);
            user.account.scans_today = 1;
        }
        Ok(user.account.clone())
    }
}

#[async_trait]
impl ScanStore for MemoryStore {
    async fn insert(
        &self,
        owner_id: Uuid,
        cv_id: Option<Uuid>,
        original_text: &str,
        score: &CvScore,
    ) -> Result<ScanRecord> {
        let record = ScanRecord {
            id: Uuid::new_v4(),
            user_id: owner_id,
            cv_id,
            original_text: original_text.to_string(),
            score: score.clone(),
            created_at: Utc::now(),
        };
        self.scans.write().await.push(record.clone());
        Ok(record)
    }

    async fn list(&self, owner_id: Uuid) -> Result<Vec<ScanRecord>> {
        Ok(self
            .scans
            .read()
            .await
            .iter()
            .rev()
            .filter(|s| s.user_id == owner_id)
            .cloned()
            .collect())
    }
}
