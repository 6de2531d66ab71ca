use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};

use crate::infra::app_state::AppState;
use crate::infra::errors::AppError;

/// Verifies the bearer token and stores the [`Principal`] in request
/// extensions for handlers to pick up.
///
/// [`Principal`]: lectern_core::domain::identity::Principal
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = extract_bearer_token(&request)?;
    let principal = state
        .verifier
        .verify(&token)
        .map_err(|_| AppError::unauthorized("Invalid or expired token"))?;

    request.extensions_mut().insert(principal);
    Ok(next.run(request).await)
}

fn extract_bearer_token(request: &Request) -> Result<String, AppError> {
    let auth_header = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| AppError::unauthorized("Authorization header required"))?;

    if !auth_header.starts_with("Bearer ") {
        return Err(AppError::unauthorized("Authorization header required"));
    }

    Ok(auth_header[7..].to_string())
}
