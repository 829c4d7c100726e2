use std::sync::Arc;

use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::database::UserStore;
use crate::error::{Error, Result};
use crate::models::user::{NewUser, UserAccount};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub exp: usize,
    pub iat: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct AuthOutcome {
    pub token: String,
    pub user: UserAccount,
}

fn hash_password(plain: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(plain.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| Error::Internal(format!("Password hashing failed: {}", e)))
}

fn verify_password(plain: &str, hashed: &str) -> bool {
    match PasswordHash::new(hashed) {
        Ok(parsed) => Argon2::default()
            .verify_password(plain.as_bytes(), &parsed)
            .is_ok(),
        Err(e) => {
            tracing::warn!(error = %e, "Stored password hash is malformed");
            false
        }
    }
}

#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UserStore>,
    jwt_secret: String,
    ttl_hours: i64,
}

impl AuthService {
    pub fn new(users: Arc<dyn UserStore>, jwt_secret: String, ttl_hours: i64) -> Self {
        Self {
            users,
            jwt_secret,
            ttl_hours,
        }
    }

    pub async fn register(
        &self,
        email: &str,
        password: &str,
        display_name: &str,
    ) -> Result<AuthOutcome> {
        let email = email.trim().to_lowercase();
        let user = self
            .users
            .create(NewUser {
                email,
                display_name: display_name.trim().to_string(),
                password_hash: hash_password(password)?,
            })
            .await?;
        tracing::info!(user_id = %user.id, "User registered");

        Ok(AuthOutcome {
            token: self.issue_token(user.id)?,
            user,
        })
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<AuthOutcome> {
        let invalid = || Error::Unauthorized("Invalid email or password".to_string());

        let (user, hash) = self
            .users
            .find_by_email(email.trim())
            .await?
            .ok_or_else(invalid)?;
        if !verify_password(password, &hash) {
            return Err(invalid());
        }

        Ok(AuthOutcome {
            token: self.issue_token(user.id)?,
            user,
        })
    }

    pub fn issue_token(&self, user_id: Uuid) -> Result<String> {
        let now = Utc::now();
        let claims = Claims {
            sub: user_id.to_string(),
            iat: now.timestamp() as usize,
            exp: (now + Duration::hours(self.ttl_hours)).timestamp() as usize,
        };
        Ok(encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_bytes()),
        )?)
    }

    /// Validates signature and expiry and returns the user id.
    pub fn verify_token(&self, token: &str) -> Result<Uuid> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        let data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.jwt_secret.as_bytes()),
            &validation,
        )?;
        Uuid::parse_str(&data.claims.sub)
            .map_err(|_| Error::Unauthorized("invalid_token".to_string()))
    }
}
