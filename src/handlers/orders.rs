use axum::{
    extract::{Path, Query, State},
    response::Json,
    routing::get,
    Router,
};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::auth::{access, AuthUser};
use crate::errors::ServiceError;
use crate::services::orders::OrderResponse;
use crate::AppState;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct OrderEnvelope {
    pub order: OrderResponse,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct StatusQuery {
    /// Target status for the order
    pub status: Option<String>,
}

/// Fetch an order with its line items
#[utoipa::path(
    get,
    path = "/order/{id}",
    params(("id" = Uuid, Path, description = "Order ID")),
    responses(
        (status = 200, description = "Order with items", body = OrderEnvelope),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden", body = crate::errors::ErrorResponse),
        (status = 404, description = "Order not found", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "Orders"
)]
pub async fn get_order(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    auth_user: AuthUser,
) -> Result<Json<OrderEnvelope>, ServiceError> {
    let order = state
        .services
        .orders
        .get_order(id)
        .await?
        .ok_or_else(|| ServiceError::NotFound("Order not found".to_string()))?;

    let role = state.services.accounts.role_of(auth_user.user_id).await?;
    access::ensure_can_view(role, auth_user.user_id, order.user_id)?;

    Ok(Json(OrderEnvelope { order }))
}

/// Update an order's status and notify its owner
#[utoipa::path(
    put,
    path = "/order/{id}",
    params(
        ("id" = Uuid, Path, description = "Order ID"),
        StatusQuery,
    ),
    responses(
        (status = 200, description = "Updated order", body = OrderEnvelope),
        (status = 400, description = "Missing status", body = crate::errors::ErrorResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden", body = crate::errors::ErrorResponse),
        (status = 404, description = "Order not found", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "Orders"
)]
pub async fn update_order_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(query): Query<StatusQuery>,
    auth_user: AuthUser,
) -> Result<Json<OrderEnvelope>, ServiceError> {
    // Presence is checked before the role so a missing status is always 400
    let status = query
        .status
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ServiceError::ValidationError("Status required".to_string()))?
        .to_string();

    let role = state.services.accounts.role_of(auth_user.user_id).await?;
    access::ensure_can_mutate(role)?;

    let order = state.services.orders.update_status(id, &status).await?;

    Ok(Json(OrderEnvelope { order }))
}

/// Permanently remove an order
#[utoipa::path(
    delete,
    path = "/order/{id}",
    params(("id" = Uuid, Path, description = "Order ID")),
    responses(
        (status = 200, description = "Order removed", body = MessageResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden", body = crate::errors::ErrorResponse),
        (status = 404, description = "Order not found", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "Orders"
)]
pub async fn delete_order(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    auth_user: AuthUser,
) -> Result<Json<MessageResponse>, ServiceError> {
    let role = state.services.accounts.role_of(auth_user.user_id).await?;
    access::ensure_can_mutate(role)?;

    state.services.orders.delete_order(id).await?;

    Ok(Json(MessageResponse {
        message: "Order removed successfully".to_string(),
    }))
}

/// Order routes
pub fn order_routes() -> Router<AppState> {
    Router::new().route(
        "/order/:id",
        get(get_order).put(update_order_status).delete(delete_order),
    )
}
