use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};

use messagely_types::api::Claims;

use crate::auth::AppState;
use crate::error::ApiError;

/// Extract and verify the bearer token, exposing its claims to handlers.
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let auth_header = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or(ApiError::Unauthenticated)?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or(ApiError::Unauthenticated)?;

    let username = state.tokens.verify(token)?;

    req.extensions_mut().insert(Claims { username });
    Ok(next.run(req).await)
}
