use axum::{
    extract::{Path, State},
    http::HeaderMap,
    response::Json,
    routing::{get, post},
    Router,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::auth::{access, AuthUser};
use crate::errors::ServiceError;
use crate::services::payments::{CheckoutResponse, PaymentResponse};
use crate::AppState;

fn validate_positive_decimal(value: &Decimal) -> Result<(), ValidationError> {
    if *value > Decimal::ZERO {
        Ok(())
    } else {
        let mut err = ValidationError::new("range");
        err.message = Some("Amount must be greater than 0".into());
        Err(err)
    }
}

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
#[schema(example = json!({
    "amount": "149.99",
    "email": "diner@example.com",
    "order_id": "550e8400-e29b-41d4-a716-446655440000"
}))]
pub struct CreateCheckoutRequest {
    /// Amount to charge
    #[validate(custom = "validate_positive_decimal")]
    pub amount: Decimal,

    /// Contact email the processor sends the receipt to
    #[validate(email)]
    pub email: String,

    /// Order being paid for
    pub order_id: Uuid,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PaymentEnvelope {
    pub payment: PaymentResponse,
}

/// Create a pending payment and a hosted checkout session
#[utoipa::path(
    post,
    path = "/payments",
    request_body = CreateCheckoutRequest,
    responses(
        (status = 200, description = "Payment created; redirect the customer", body = CheckoutResponse),
        (status = 400, description = "Invalid request", body = crate::errors::ErrorResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden", body = crate::errors::ErrorResponse),
        (status = 404, description = "Order not found", body = crate::errors::ErrorResponse),
        (status = 502, description = "Payment processor failure", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "Payments"
)]
pub async fn create_checkout_session(
    State(state): State<AppState>,
    headers: HeaderMap,
    auth_user: AuthUser,
    Json(request): Json<CreateCheckoutRequest>,
) -> Result<Json<CheckoutResponse>, ServiceError> {
    request.validate()?;

    let order = state
        .services
        .orders
        .get_order(request.order_id)
        .await?
        .ok_or_else(|| ServiceError::NotFound("Order not found".to_string()))?;

    let role = state.services.accounts.role_of(auth_user.user_id).await?;
    access::ensure_can_view(role, auth_user.user_id, order.user_id)?;

    let origin = request_origin(&headers);
    let response = state
        .services
        .payments
        .create_checkout(
            request.order_id,
            request.amount,
            &request.email,
            origin.as_deref(),
        )
        .await?;

    Ok(Json(response))
}

/// Fetch a payment record
#[utoipa::path(
    get,
    path = "/payments/{id}",
    params(("id" = Uuid, Path, description = "Payment ID")),
    responses(
        (status = 200, description = "Payment details", body = PaymentEnvelope),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden", body = crate::errors::ErrorResponse),
        (status = 404, description = "Payment not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "Payments"
)]
pub async fn get_payment(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    auth_user: AuthUser,
) -> Result<Json<PaymentEnvelope>, ServiceError> {
    let payment = state
        .services
        .payments
        .get_payment(id)
        .await?
        .ok_or_else(|| ServiceError::NotFound("Payment not found".to_string()))?;

    let role = state.services.accounts.role_of(auth_user.user_id).await?;
    match state.services.orders.get_order(payment.order_id).await? {
        Some(order) => access::ensure_can_view(role, auth_user.user_id, order.user_id)?,
        // The order has since been deleted; with no owner to compare against
        // only elevated roles may see the retained payment row.
        None => access::ensure_can_mutate(role)?,
    }

    Ok(Json(PaymentEnvelope {
        payment: payment.into(),
    }))
}

/// Origin of the inbound request, used when no base URL is configured.
fn request_origin(headers: &HeaderMap) -> Option<String> {
    let host = headers.get(http::header::HOST)?.to_str().ok()?;
    let proto = headers
        .get("x-forwarded-proto")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("http");

    Some(format!("{proto}://{host}"))
}

/// Payment routes
pub fn payment_routes() -> Router<AppState> {
    Router::new()
        .route("/payments", post(create_checkout_session))
        .route("/payments/:id", get(get_payment))
}
