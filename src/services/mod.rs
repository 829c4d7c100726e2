pub mod ai_service;
pub mod auth_service;
pub mod cv_service;
pub mod draft_service;
pub mod request_tracker;
pub mod scan_service;
