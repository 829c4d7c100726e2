use crate::error::{Error, Result};
use dotenvy::dotenv;
use std::env;
use std::sync::OnceLock;

const DEFAULT_GEMINI_API_URL: &str =
    "https://generativelanguage.googleapis.com/v1beta/models/gemini-1.5-flash:generateContent";

#[derive(Debug, Clone)]
pub struct Config {
    pub server_address: String,
    /// Unset selects the in-memory store.
    pub database_url: Option<String>,
    pub jwt_secret: String,
    pub jwt_ttl_hours: i64,
    pub webhook_secret: String,
    pub gemini_api_key: String,
    pub gemini_api_url: String,
    pub public_base_url: String,
    pub upload_dir: String,
    pub libreoffice_bin: String,
    pub pdftoppm_bin: String,
    pub pdftotext_bin: String,
    pub ai_rps: u32,
    pub max_free_cvs: i32,
}

pub static CONFIG: OnceLock<Config> = OnceLock::new();

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        Ok(Self {
            server_address: get_env_or("SERVER_ADDRESS", "0.0.0.0:8080"),
            database_url: env::var("DATABASE_URL").ok().filter(|v| !v.trim().is_empty()),
            jwt_secret: get_env("JWT_SECRET")?,
            jwt_ttl_hours: get_env_parse_or("JWT_TTL_HOURS", 168)?,
            webhook_secret: get_env("WEBHOOK_SECRET")?,
            gemini_api_key: get_env("GEMINI_API_KEY")?,
            gemini_api_url: get_env_or("GEMINI_API_URL", DEFAULT_GEMINI_API_URL),
            public_base_url: get_env_or("PUBLIC_BASE_URL", "http://localhost:8080"),
            upload_dir: get_env_or("UPLOAD_DIR", "./uploads"),
            libreoffice_bin: get_env_or("LIBREOFFICE_BIN", "libreoffice"),
            pdftoppm_bin: get_env_or("PDFTOPPM_BIN", "pdftoppm"),
            pdftotext_bin: get_env_or("PDFTOTEXT_BIN", "pdftotext"),
            ai_rps: get_env_parse_or("AI_RPS", 5)?,
            max_free_cvs: get_env_parse_or("MAX_FREE_CVS", 1)?,
        })
    }
}

fn get_env(name: &str) -> Result<String> {
    env::var(name).map_err(|_| Error::Config(format!("Missing environment variable: {}", name)))
}

fn get_env_or(name: &str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.to_string())
}

fn get_env_parse_or<T>(name: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) => raw
            .parse()
            .map_err(|e| Error::Config(format!("Invalid value for {}: {}", name, e))),
        Err(_) => Ok(default),
    }
}

pub fn init_config() -> Result<()> {
    let config = Config::from_env()?;
    CONFIG
        .set(config)
        .map_err(|_| Error::Config("Configuration has already been initialized".to_string()))?;
    Ok(())
}

pub fn get_config() -> Result<&'static Config> {
    CONFIG
        .get()
        .ok_or_else(|| Error::Config("Configuration has not been initialized".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_when_unset() {
        assert_eq!(get_env_or("CV_MASTER_TEST_UNSET_VAR", "fallback"), "fallback");
        let parsed: u32 = get_env_parse_or("CV_MASTER_TEST_UNSET_NUM", 7).unwrap();
        assert_eq!(parsed, 7);
    }

    #[test]
    fn bad_numbers_are_config_errors() {
        env::set_var("CV_MASTER_TEST_BAD_NUM", "many");
        let parsed: Result<u32> = get_env_parse_or("CV_MASTER_TEST_BAD_NUM", 1);
        assert!(matches!(parsed, Err(Error::Config(_))));
    }
}
