use axum::{
    Extension, Json,
    extract::State,
};

use messagely_types::api::{
    Claims, ReceivedMessagesResponse, SentMessagesResponse, UserListResponse, UserResponse,
};

use crate::auth::AppState;
use crate::blocking;
use crate::error::ApiError;
use crate::extract::ApiPath;
use crate::guard;

/// GET /users: any logged-in user may list everyone.
pub async fn list_users(
    State(state): State<AppState>,
    Extension(_claims): Extension<Claims>,
) -> Result<Json<UserListResponse>, ApiError> {
    let users = blocking(move || state.credentials.all()).await?;
    Ok(Json(UserListResponse { users }))
}

/// GET /users/{username}
pub async fn get_user(
    State(state): State<AppState>,
    ApiPath(username): ApiPath<String>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<UserResponse>, ApiError> {
    guard::ensure_same_user(&claims.username, &username)?;

    let user = blocking(move || {
        state
            .credentials
            .get(&username)?
            .ok_or_else(|| ApiError::NotFound(format!("User {}", username)))
    })
    .await?;

    Ok(Json(UserResponse { user }))
}

/// GET /users/{username}/to
pub async fn messages_to(
    State(state): State<AppState>,
    ApiPath(username): ApiPath<String>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<ReceivedMessagesResponse>, ApiError> {
    guard::ensure_same_user(&claims.username, &username)?;

    let messages = blocking(move || state.messages.list_received_by(&username)).await?;
    Ok(Json(ReceivedMessagesResponse { messages }))
}

/// GET /users/{username}/from
pub async fn messages_from(
    State(state): State<AppState>,
    ApiPath(username): ApiPath<String>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<SentMessagesResponse>, ApiError> {
    guard::ensure_same_user(&claims.username, &username)?;

    let messages = blocking(move || state.messages.list_sent_by(&username)).await?;
    Ok(Json(SentMessagesResponse { messages }))
}
