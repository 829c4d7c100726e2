use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionStatus {
    #[default]
    Free,
    Premium,
}

impl SubscriptionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionStatus::Free => "free",
            SubscriptionStatus::Premium => "premium",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "free" => Some(SubscriptionStatus::Free),
            "premium" => Some(SubscriptionStatus::Premium),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PremiumFeature {
    NoAds,
    JobMatching,
    AiFix,
    MultipleCvs,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserAccount {
    pub id: Uuid,
    pub email: String,
    pub display_name: String,
    pub photo_url: Option<String>,
    pub subscription_status: SubscriptionStatus,
    pub subscription_expiry: Option<DateTime<Utc>>,
    pub cv_count: i32,
    pub scans_today: i32,
    pub created_at: DateTime<Utc>,
}

impl UserAccount {
    /// Premium only counts while the expiry is still ahead of `now`.
    pub fn is_premium(&self, now: DateTime<Utc>) -> bool {
        self.subscription_status == SubscriptionStatus::Premium
            && self.subscription_expiry.is_some_and(|expiry| expiry > now)
    }
}

impl PremiumFeature {
    pub fn allowed_for(self, premium: bool) -> bool {
        match self {
            PremiumFeature::NoAds
            | PremiumFeature::JobMatching
            | PremiumFeature::AiFix
            | PremiumFeature::MultipleCvs => premium,
        }
    }
}

/// Stored alongside the account; never serialized to clients.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub display_name: String,
    pub password_hash: String,
}

#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    pub display_name: Option<String>,
    pub photo_url: Option<String>,
}
