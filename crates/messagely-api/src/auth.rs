use std::sync::Arc;

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use tracing::{info, warn};

use messagely_db::Database;
use messagely_types::api::{LoginRequest, RegisterRequest, TokenResponse};

use crate::blocking;
use crate::credentials::{CredentialStore, HashCost};
use crate::error::ApiError;
use crate::extract::ApiJson;
use crate::message_store::MessageStore;
use crate::tokens::TokenIssuer;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub credentials: CredentialStore,
    pub messages: MessageStore,
    pub tokens: TokenIssuer,
}

impl AppStateInner {
    pub fn new(db: Database, jwt_secret: &str, cost: HashCost) -> anyhow::Result<AppState> {
        let db = Arc::new(db);
        Ok(Arc::new(Self {
            credentials: CredentialStore::new(db.clone(), cost)?,
            messages: MessageStore::new(db),
            tokens: TokenIssuer::new(jwt_secret),
        }))
    }
}

/// POST /auth/register: create the user, log them in, hand back a token.
pub async fn register(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let token = blocking(move || {
        let user = state.credentials.register(&req)?;
        let token = state.tokens.issue(&user.username)?;
        state.credentials.touch_login(&user.username)?;
        info!("Registered {}", user.username);
        Ok(token)
    })
    .await?;

    Ok((StatusCode::CREATED, Json(TokenResponse { token })))
}

/// POST /auth/login: trade a username and password for a token.
pub async fn login(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<LoginRequest>,
) -> Result<Json<TokenResponse>, ApiError> {
    let token = blocking(move || {
        if !state.credentials.authenticate(&req.username, &req.password)? {
            warn!("Failed login for {}", req.username);
            return Err(ApiError::InvalidCredentials);
        }

        let token = state.tokens.issue(&req.username)?;
        state.credentials.touch_login(&req.username)?;
        info!("{} logged in", req.username);
        Ok(token)
    })
    .await?;

    Ok(Json(TokenResponse { token }))
}
