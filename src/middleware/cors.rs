use axum::http::{header, Method};
use tower_http::cors::{Any, CorsLayer};

/// The mobile client calls from arbitrary origins with bearer tokens.
pub fn api_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .expose_headers([header::CONTENT_DISPOSITION])
        .allow_origin(Any)
}
