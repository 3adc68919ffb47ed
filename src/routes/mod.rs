//! HTTP handlers for the JSON API.

use actix_multipart::form::MultipartFormConfig;
use actix_web::{HttpResponse, web};

use crate::dto::api::ErrorResponse;
use crate::services::ServiceError;

pub mod clients;
pub mod receipt;

const MEGABYTE: usize = 1024 * 1024;

/// Cap on the text fields of one submission. Photos stream to disk and only
/// count toward the total limit.
pub const TEXT_FIELDS_LIMIT: usize = MEGABYTE;

/// Multipart limits for receipt submissions.
pub fn multipart_config(upload_limit_mb: usize) -> MultipartFormConfig {
    MultipartFormConfig::default()
        .total_limit(upload_limit_mb * MEGABYTE)
        .memory_limit(TEXT_FIELDS_LIMIT)
}

/// Maps a service failure onto the error envelope: form errors are 400,
/// everything else 500.
pub fn error_response(mensaje: &str, err: &ServiceError) -> HttpResponse {
    let body = ErrorResponse::new(mensaje, Some(err.to_string()));
    if err.is_client_error() {
        HttpResponse::BadRequest().json(body)
    } else {
        HttpResponse::InternalServerError().json(body)
    }
}

/// Registers every `/api` route.
pub fn configure_api(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .service(receipt::submit_receipt)
            .service(clients::list_clients)
            .service(clients::add_client),
    );
}
