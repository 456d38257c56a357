use axum::{
    Extension, Json,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
};
use uuid::Uuid;

use messagely_types::api::{
    Claims, MessageDetailResponse, NewMessageResponse, ReadReceiptResponse, SendMessageRequest,
};

use crate::auth::AppState;
use crate::blocking;
use crate::error::ApiError;
use crate::extract::{ApiJson, ApiPath};
use crate::guard;

/// GET /messages/{id}: visible to the sender and the recipient only.
pub async fn get_message(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<MessageDetailResponse>, ApiError> {
    let message = blocking(move || state.messages.get(id)).await?;
    guard::ensure_can_view(&claims.username, &message)?;

    Ok(Json(MessageDetailResponse { message }))
}

/// POST /messages: always sent as the token's user.
pub async fn send_message(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    ApiJson(req): ApiJson<SendMessageRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if req.to_username.is_empty() || req.body.is_empty() {
        return Err(ApiError::Validation(
            "Please enter a recipient and a message body".into(),
        ));
    }

    let message = blocking(move || {
        state
            .messages
            .create(&claims.username, &req.to_username, &req.body)
    })
    .await?;

    Ok((StatusCode::CREATED, Json(NewMessageResponse { message })))
}

/// POST /messages/{id}/read: only the recipient may mark it read.
pub async fn mark_read(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<ReadReceiptResponse>, ApiError> {
    let message = blocking(move || {
        let detail = state.messages.get(id)?;
        guard::ensure_can_mark_read(&claims.username, &detail)?;
        state.messages.mark_read(id)
    })
    .await?;

    Ok(Json(ReadReceiptResponse { message }))
}
