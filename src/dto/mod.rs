pub mod auth_dto;
pub mod draft_dto;
pub mod scan_dto;
pub mod webhook_dto;
