//! Shared-secret gate in front of every route.

use crate::error::AppError;
use crate::server::AppState;
use axum::{
    extract::{Request, State},
    http::{HeaderMap, header},
    middleware::Next,
    response::Response,
};

/// Header carrying the API token.
const API_KEY_HEADER: &str = "x-api-key";

/// Authorization scheme prefix, compared case-insensitively.
const BEARER_PREFIX: &str = "Bearer ";

/// Query parameter carrying the API token.
const API_TOKEN_PARAM: &str = "api_token";

/// Reject requests without the configured API token.
///
/// Does nothing when no token is configured.
pub async fn require_api_token(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let Some(expected) = state.config.auth.token() else {
        return Ok(next.run(request).await);
    };

    let provided = extract_token(request.headers(), request.uri().query());

    match provided {
        Some(token) if constant_time_eq(expected.as_bytes(), token.as_bytes()) => {
            Ok(next.run(request).await)
        }
        _ => Err(AppError::Unauthorized),
    }
}

/// Token from `X-Api-Key`, a bearer `Authorization` header, or the query
/// string, in that order.
pub fn extract_token(headers: &HeaderMap, query: Option<&str>) -> Option<String> {
    if let Some(key) = headers.get(API_KEY_HEADER).and_then(|v| v.to_str().ok()) {
        return Some(key.to_string());
    }

    if let Some(bearer) = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(strip_bearer)
    {
        return Some(bearer.trim().to_string());
    }

    query?.split('&').find_map(|pair| {
        let (key, value) = pair.split_once('=')?;
        if key != API_TOKEN_PARAM {
            return None;
        }
        urlencoding::decode(&value.replace('+', " "))
            .ok()
            .map(|v| v.into_owned())
    })
}

/// Credentials of a `Bearer` authorization value, scheme matched in any case.
fn strip_bearer(value: &str) -> Option<&str> {
    let (scheme, token) = value.split_at_checked(BEARER_PREFIX.len())?;
    scheme
        .eq_ignore_ascii_case(BEARER_PREFIX)
        .then_some(token)
}

/// Compare without short-circuiting on the first differing byte.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }

    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
