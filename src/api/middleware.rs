//! API Middleware
//!
//! Caller identity and request logging.

use axum::{
    body::Body,
    http::{HeaderMap, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::net::IpAddr;
use uuid::Uuid;

use crate::domain::OperationContext;
use crate::error::AppError;

pub const USER_ID_HEADER: &str = "X-Request-User-Id";
pub const CORRELATION_ID_HEADER: &str = "X-Correlation-Id";

/// Authenticated caller, set by the upstream gateway
#[derive(Debug, Clone, Copy)]
pub struct RequestUser {
    pub account_id: Uuid,
}

// =========================================================================
// Identity Middleware
// =========================================================================

/// Resolve the caller from X-Request-User-Id and build the operation context
pub async fn identity_middleware(mut request: Request<Body>, next: Next) -> Response {
    let headers = request.headers();

    let account_id = match headers.get(USER_ID_HEADER).and_then(|v| v.to_str().ok()) {
        Some(raw) => match Uuid::parse_str(raw.trim()) {
            Ok(id) => id,
            Err(_) => {
                return AppError::InvalidHeader(format!("{USER_ID_HEADER} must be a UUID"))
                    .into_response();
            }
        },
        None => return AppError::MissingHeader(USER_ID_HEADER.to_string()).into_response(),
    };

    let correlation_id = correlation_id(headers).unwrap_or_else(Uuid::new_v4);

    let mut context = OperationContext::new()
        .with_caller(account_id)
        .with_correlation_id(correlation_id);
    if let Some(ip) = forwarded_ip(headers) {
        context = context.with_client_ip(ip);
    }

    request.extensions_mut().insert(RequestUser { account_id });
    request.extensions_mut().insert(context);

    next.run(request).await
}

fn correlation_id(headers: &HeaderMap) -> Option<Uuid> {
    headers
        .get(CORRELATION_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| Uuid::parse_str(s.trim()).ok())
}

/// First hop of X-Forwarded-For
fn forwarded_ip(headers: &HeaderMap) -> Option<IpAddr> {
    headers
        .get("X-Forwarded-For")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.split(',').next())
        .and_then(|s| s.trim().parse().ok())
}

// =========================================================================
// mask_headers_for_logging
// =========================================================================

/// Headers that should be masked in logs
const SENSITIVE_HEADERS: &[&str] = &["authorization", "cookie", "set-cookie", "x-api-key"];

/// Mask sensitive headers for logging
pub fn mask_headers_for_logging(headers: &HeaderMap) -> Vec<(String, String)> {
    headers
        .iter()
        .map(|(name, value)| {
            let name_lower = name.as_str().to_lowercase();
            let masked_value = if SENSITIVE_HEADERS.contains(&name_lower.as_str()) {
                "[REDACTED]".to_string()
            } else {
                value.to_str().unwrap_or("[invalid utf8]").to_string()
            };
            (name.to_string(), masked_value)
        })
        .collect()
}

// =========================================================================
// Request Logging Middleware
// =========================================================================

/// Request logging middleware
pub async fn logging_middleware(request: Request<Body>, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let headers = mask_headers_for_logging(request.headers());
    let correlation_id = correlation_id(request.headers());

    let start = std::time::Instant::now();

    tracing::info!(
        method = %method,
        uri = %uri,
        correlation_id = ?correlation_id,
        headers = ?headers,
        "Incoming request"
    );

    let response = next.run(request).await;

    tracing::info!(
        method = %method,
        uri = %uri,
        status = %response.status(),
        duration_ms = %start.elapsed().as_millis(),
        correlation_id = ?correlation_id,
        "Request completed"
    );

    response
}
