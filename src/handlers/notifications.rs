use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::entities::notification;
use crate::errors::ServiceError;
use crate::AppState;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct NotificationResponse {
    pub id: Uuid,
    pub message: String,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

impl From<notification::Model> for NotificationResponse {
    fn from(model: notification::Model) -> Self {
        Self {
            id: model.id,
            message: model.message,
            is_read: model.is_read,
            created_at: model.created_at,
        }
    }
}

/// List the caller's notifications, newest first
#[utoipa::path(
    get,
    path = "/notifications",
    responses(
        (status = 200, description = "The caller's notifications", body = [NotificationResponse]),
        (status = 401, description = "Unauthorized"),
    ),
    security(("Bearer" = [])),
    tag = "Notifications"
)]
pub async fn list_notifications(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> Result<Json<Vec<NotificationResponse>>, ServiceError> {
    let notifications = state
        .services
        .notifications
        .list_for_user(auth_user.user_id)
        .await?;

    Ok(Json(
        notifications.into_iter().map(Into::into).collect(),
    ))
}

/// Mark one of the caller's notifications as read
#[utoipa::path(
    post,
    path = "/notifications/{id}/read",
    params(("id" = Uuid, Path, description = "Notification ID")),
    responses(
        (status = 204, description = "Notification marked read"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Notification not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "Notifications"
)]
pub async fn mark_notification_read(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    auth_user: AuthUser,
) -> Result<StatusCode, ServiceError> {
    state
        .services
        .notifications
        .mark_read(auth_user.user_id, id)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

/// Notification routes
pub fn notification_routes() -> Router<AppState> {
    Router::new()
        .route("/notifications", get(list_notifications))
        .route("/notifications/:id/read", post(mark_notification_read))
}
