use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Plateful API",
        version = "1.0.0",
        description = r#"
# Plateful Order & Payment API

Order retrieval, status management and checkout payments for the Plateful
food-ordering application.

## Authentication

All order and payment endpoints require a bearer token issued by the session
service:

```
Authorization: Bearer <your-jwt-token>
```

Reading an order requires ownership or a staff/admin role; mutating one
(status update, deletion) always requires staff/admin.
        "#,
        contact(
            name = "Plateful",
            email = "dev@plateful.app",
        ),
        license(
            name = "MIT",
            url = "https://opensource.org/licenses/MIT"
        )
    ),
    servers(
        (url = "https://api.plateful.app", description = "Production server"),
        (url = "http://localhost:8080", description = "Local development")
    ),
    tags(
        (name = "Orders", description = "Order retrieval, status updates and deletion"),
        (name = "Payments", description = "Checkout session creation and payment lookup"),
        (name = "Notifications", description = "Order status notifications"),
    ),
    paths(
        // Orders
        crate::handlers::orders::get_order,
        crate::handlers::orders::update_order_status,
        crate::handlers::orders::delete_order,

        // Payments
        crate::handlers::payments::create_checkout_session,
        crate::handlers::payments::get_payment,

        // Notifications
        crate::handlers::notifications::list_notifications,
        crate::handlers::notifications::mark_notification_read,
    ),
    components(
        schemas(
            // Order types
            crate::handlers::orders::OrderEnvelope,
            crate::handlers::orders::MessageResponse,
            crate::services::orders::OrderResponse,
            crate::services::orders::OrderItemResponse,

            // Payment types
            crate::handlers::payments::CreateCheckoutRequest,
            crate::handlers::payments::PaymentEnvelope,
            crate::services::payments::PaymentResponse,
            crate::services::payments::CheckoutResponse,

            // Notification types
            crate::handlers::notifications::NotificationResponse,

            // Error types
            crate::errors::ErrorResponse
        )
    )
)]
pub struct ApiDoc;

pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/swagger-ui")
        .url("/api-docs/openapi.json", ApiDoc::openapi())
        .config(utoipa_swagger_ui::Config::from("/api-docs/openapi.json").try_it_out_enabled(true))
}
