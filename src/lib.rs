pub mod builder;
pub mod config;
pub mod database;
pub mod dto;
pub mod error;
pub mod middleware;
pub mod models;
pub mod render;
pub mod routes;
pub mod services;
pub mod utils;

use std::sync::Arc;

use reqwest::Client;

use crate::config::Config;
use crate::database::Gateway;
use crate::error::{Error, Result};
use crate::render::artifact::{ArtifactRenderer, ExternalToolRenderer};
use crate::services::{
    ai_service::{AiService, GeminiClient, TextGenerator},
    auth_service::AuthService,
    cv_service::CvService,
    draft_service::DraftService,
    request_tracker::RequestTracker,
    scan_service::ScanService,
};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub gateway: Gateway,
    pub auth_service: AuthService,
    pub draft_service: DraftService,
    pub cv_service: CvService,
    pub scan_service: ScanService,
    pub requests: RequestTracker,
}

impl AppState {
    /// Production wiring: Gemini for text and LibreOffice/poppler for artifacts.
    pub fn new(config: Arc<Config>, gateway: Gateway) -> Result<Self> {
        let http_client = Client::builder()
            .timeout(std::time::Duration::from_secs(120))
            .build()
            .map_err(|e| Error::Internal(format!("Failed to build HTTP client: {}", e)))?;

        let generator = Arc::new(GeminiClient::new(
            http_client,
            config.gemini_api_key.clone(),
            config.gemini_api_url.clone(),
        ));
        let renderer = Arc::new(ExternalToolRenderer::new(
            config.libreoffice_bin.clone(),
            config.pdftoppm_bin.clone(),
        ));

        Ok(Self::from_parts(config, gateway, generator, renderer))
    }

    pub fn from_parts(
        config: Arc<Config>,
        gateway: Gateway,
        generator: Arc<dyn TextGenerator>,
        renderer: Arc<dyn ArtifactRenderer>,
    ) -> Self {
        let ai = AiService::new(generator);
        let auth_service = AuthService::new(
            gateway.users.clone(),
            config.jwt_secret.clone(),
            config.jwt_ttl_hours,
        );
        let cv_service = CvService::new(gateway.clone(), renderer, config.max_free_cvs);
        let scan_service = ScanService::new(gateway.clone(), ai, config.pdftotext_bin.clone());

        Self {
            config,
            gateway,
            auth_service,
            draft_service: DraftService::new(),
            cv_service,
            scan_service,
            requests: RequestTracker::new(),
        }
    }
}
