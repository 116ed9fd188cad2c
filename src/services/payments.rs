use crate::{
    config::PaymentConfig,
    db::DbPool,
    entities::item_image,
    entities::menu_item,
    entities::order::Entity as OrderEntity,
    entities::order_item::{self, Entity as OrderItemEntity},
    entities::payment::{self, ActiveModel as PaymentActiveModel, Entity as PaymentEntity},
    errors::ServiceError,
    events::{Event, EventSender},
    stripe::{CheckoutLineItem, CreateCheckoutSession, StripeClient},
};
use chrono::Utc;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;

pub const PAYMENT_METHOD: &str = "stripe";

pub const STATUS_PENDING: &str = "pending";
pub const STATUS_FAILED: &str = "failed";

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PaymentResponse {
    pub id: Uuid,
    pub order_id: Uuid,
    pub amount: Decimal,
    pub method: String,
    pub status: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: Option<chrono::DateTime<chrono::Utc>>,
}

impl From<payment::Model> for PaymentResponse {
    fn from(model: payment::Model) -> Self {
        Self {
            id: model.id,
            order_id: model.order_id,
            amount: model.amount,
            method: model.method,
            status: model.status,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

/// Result of a successful checkout session creation.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CheckoutResponse {
    pub payment: PaymentResponse,
    #[serde(rename = "redirectUrl")]
    pub redirect_url: String,
}

/// Service that creates pending payments and hosted checkout sessions.
///
/// Configuration is injected at construction; the checkout flow never reads
/// ambient environment state.
#[derive(Clone)]
pub struct PaymentService {
    db_pool: Arc<DbPool>,
    stripe: StripeClient,
    config: PaymentConfig,
    event_sender: Option<Arc<EventSender>>,
}

impl PaymentService {
    pub fn new(
        db_pool: Arc<DbPool>,
        stripe: StripeClient,
        config: PaymentConfig,
        event_sender: Option<Arc<EventSender>>,
    ) -> Self {
        Self {
            db_pool,
            stripe,
            config,
            event_sender,
        }
    }

    /// Fetches a payment record
    #[instrument(skip(self), fields(payment_id = %payment_id))]
    pub async fn get_payment(
        &self,
        payment_id: Uuid,
    ) -> Result<Option<payment::Model>, ServiceError> {
        PaymentEntity::find_by_id(payment_id)
            .one(&*self.db_pool)
            .await
            .map_err(ServiceError::DatabaseError)
    }

    /// Creates a pending payment for an order and requests a hosted checkout
    /// session from the processor, returning the payment and redirect URL.
    ///
    /// The payment row is inserted first so the processor callback always has
    /// something to reference; if the item fetch or the processor call then
    /// fails, the row is flipped to `failed` before the error surfaces, so no
    /// orphaned `pending` payment is left behind.
    #[instrument(skip(self), fields(order_id = %order_id, amount = %amount))]
    pub async fn create_checkout(
        &self,
        order_id: Uuid,
        amount: Decimal,
        email: &str,
        request_origin: Option<&str>,
    ) -> Result<CheckoutResponse, ServiceError> {
        let db = &*self.db_pool;

        let base_url = resolve_base_url(self.config.base_url_override.as_deref(), request_origin)
            .ok_or_else(|| {
            ServiceError::ValidationError(
                "Unable to determine the application base URL for checkout callbacks".to_string(),
            )
        })?;

        OrderEntity::find_by_id(order_id)
            .one(db)
            .await
            .map_err(ServiceError::DatabaseError)?
            .ok_or_else(|| ServiceError::NotFound("Order not found".to_string()))?;

        let now = Utc::now();
        let payment_model = PaymentActiveModel {
            id: Set(Uuid::new_v4()),
            order_id: Set(order_id),
            amount: Set(amount),
            method: Set(PAYMENT_METHOD.to_string()),
            status: Set(STATUS_PENDING.to_string()),
            created_at: Set(now),
            updated_at: Set(Some(now)),
        };

        let payment = payment_model.insert(db).await.map_err(|e| {
            error!(error = %e, order_id = %order_id, "Failed to insert payment");
            ServiceError::DatabaseError(e)
        })?;

        info!(payment_id = %payment.id, order_id = %order_id, "Pending payment created");

        let line_items = match self.load_line_items(order_id).await {
            Ok(items) => items,
            Err(e) => {
                self.mark_payment_failed(payment.id).await;
                return Err(e);
            }
        };

        let session_request = CreateCheckoutSession {
            customer_email: email.to_string(),
            line_items,
            success_url: success_url(&base_url, payment.id),
            cancel_url: cancel_url(&base_url, order_id),
            payment_id: payment.id,
        };

        let session = match self.stripe.create_checkout_session(&session_request).await {
            Ok(session) => session,
            Err(e) => {
                self.mark_payment_failed(payment.id).await;
                return Err(e);
            }
        };

        let Some(redirect_url) = session.url else {
            self.mark_payment_failed(payment.id).await;
            return Err(ServiceError::ExternalServiceError(
                "Checkout session has no redirect URL".to_string(),
            ));
        };

        info!(
            payment_id = %payment.id,
            session_id = %session.id,
            "Checkout session created"
        );

        if let Some(event_sender) = &self.event_sender {
            event_sender
                .send_or_log(Event::PaymentInitiated {
                    payment_id: payment.id,
                    order_id,
                    amount,
                })
                .await;
        }

        Ok(CheckoutResponse {
            payment: payment.into(),
            redirect_url,
        })
    }

    /// Loads the order's items joined with menu data and maps them into
    /// processor line items.
    async fn load_line_items(
        &self,
        order_id: Uuid,
    ) -> Result<Vec<CheckoutLineItem>, ServiceError> {
        let db = &*self.db_pool;

        let items = OrderItemEntity::find()
            .filter(order_item::Column::OrderId.eq(order_id))
            .find_also_related(menu_item::Entity)
            .all(db)
            .await
            .map_err(|e| {
                error!(error = %e, order_id = %order_id, "Failed to fetch order items");
                ServiceError::DatabaseError(e)
            })?;

        let mut line_items = Vec::with_capacity(items.len());
        for (item, menu) in &items {
            let image_url = match menu {
                Some(menu) => item_image::Entity::find()
                    .filter(item_image::Column::MenuItemId.eq(menu.id))
                    .order_by_asc(item_image::Column::Position)
                    .one(db)
                    .await
                    .map_err(ServiceError::DatabaseError)?
                    .map(|image| image.url),
                None => None,
            };

            line_items.push(map_line_item(
                item,
                menu.as_ref(),
                image_url,
                &self.config.currency,
            )?);
        }

        Ok(line_items)
    }

    /// Compensating action: flips a pending payment to `failed` so the row is
    /// never left pending for a checkout that will not happen. A failure here
    /// is logged and swallowed; the original error is what the caller sees.
    async fn mark_payment_failed(&self, payment_id: Uuid) {
        let update = PaymentActiveModel {
            id: Set(payment_id),
            status: Set(STATUS_FAILED.to_string()),
            updated_at: Set(Some(Utc::now())),
            ..Default::default()
        };

        if let Err(e) = update.update(&*self.db_pool).await {
            warn!(
                error = %e,
                payment_id = %payment_id,
                "Failed to mark payment as failed after checkout error"
            );
        }

        if let Some(event_sender) = &self.event_sender {
            if let Ok(Some(payment)) = self.get_payment(payment_id).await {
                event_sender
                    .send_or_log(Event::PaymentFailed {
                        payment_id,
                        order_id: payment.order_id,
                    })
                    .await;
            }
        }
    }
}

/// Picks the base URL for checkout callback links: a configured override wins
/// when it carries an http(s) scheme, otherwise the request's own origin.
pub(crate) fn resolve_base_url(
    override_url: Option<&str>,
    request_origin: Option<&str>,
) -> Option<String> {
    if let Some(configured) = override_url {
        if has_http_scheme(configured) {
            return Some(configured.trim_end_matches('/').to_string());
        }
    }

    request_origin.map(|origin| origin.trim_end_matches('/').to_string())
}

fn has_http_scheme(url: &str) -> bool {
    let lower = url.trim().to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

/// Success callback; `{CHECKOUT_SESSION_ID}` is substituted by the processor.
pub(crate) fn success_url(base_url: &str, payment_id: Uuid) -> String {
    format!("{base_url}/payments/success?payment_id={payment_id}&session_id={{CHECKOUT_SESSION_ID}}")
}

pub(crate) fn cancel_url(base_url: &str, order_id: Uuid) -> String {
    format!("{base_url}/payments/cancel?order_id={order_id}")
}

/// Unit price in minor currency units, rounded to the nearest integer.
///
/// Falls back to the stored subtotal divided by the quantity (floored at 1)
/// when the menu item no longer carries a price.
pub(crate) fn unit_amount_minor(
    menu_price: Option<Decimal>,
    subtotal: Decimal,
    quantity: i32,
) -> Result<i64, ServiceError> {
    let unit_price = match menu_price {
        Some(price) => price,
        None => subtotal / Decimal::from(quantity.max(1)),
    };

    (unit_price * Decimal::ONE_HUNDRED)
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i64()
        .ok_or_else(|| {
            ServiceError::InternalError(format!(
                "Line amount {unit_price} cannot be represented in minor units"
            ))
        })
}

fn map_line_item(
    item: &order_item::Model,
    menu: Option<&menu_item::Model>,
    image_url: Option<String>,
    currency: &str,
) -> Result<CheckoutLineItem, ServiceError> {
    let unit_amount = unit_amount_minor(
        menu.and_then(|m| m.price),
        item.subtotal,
        item.quantity,
    )?;

    Ok(CheckoutLineItem {
        name: menu
            .map(|m| m.name.clone())
            .unwrap_or_else(|| "Item".to_string()),
        unit_amount,
        quantity: item.quantity,
        currency: currency.to_string(),
        image_url,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn unit_amount_uses_menu_price_when_present() {
        let amount = unit_amount_minor(Some(dec!(19.99)), dec!(39.98), 2).unwrap();
        assert_eq!(amount, 1999);
    }

    #[test]
    fn unit_amount_derives_from_subtotal_when_price_missing() {
        let amount = unit_amount_minor(None, dec!(39.98), 2).unwrap();
        assert_eq!(amount, 1999);
    }

    #[test]
    fn unit_amount_floors_quantity_at_one() {
        // A zero quantity must not divide by zero
        let amount = unit_amount_minor(None, dec!(5.50), 0).unwrap();
        assert_eq!(amount, 550);
    }

    #[test]
    fn unit_amount_rounds_to_nearest_cent() {
        let amount = unit_amount_minor(Some(dec!(10.005)), dec!(10.005), 1).unwrap();
        assert_eq!(amount, 1001);
    }

    #[test]
    fn cancel_url_embeds_order_id() {
        let order_id = Uuid::parse_str("00000000-0000-0000-0000-000000000042").unwrap();
        assert_eq!(
            cancel_url("https://app.example.com", order_id),
            format!("https://app.example.com/payments/cancel?order_id={order_id}")
        );
    }

    #[test]
    fn success_url_keeps_session_placeholder() {
        let payment_id = Uuid::new_v4();
        let url = success_url("https://app.example.com", payment_id);
        assert!(url.ends_with("&session_id={CHECKOUT_SESSION_ID}"));
        assert!(url.contains(&format!("payment_id={payment_id}")));
    }

    #[test]
    fn base_url_prefers_valid_override() {
        let resolved = resolve_base_url(
            Some("https://app.example.com/"),
            Some("http://localhost:3000"),
        );
        assert_eq!(resolved.as_deref(), Some("https://app.example.com"));
    }

    #[test]
    fn base_url_falls_back_on_invalid_override() {
        let resolved = resolve_base_url(Some("app.example.com"), Some("http://localhost:3000"));
        assert_eq!(resolved.as_deref(), Some("http://localhost:3000"));

        let resolved = resolve_base_url(None, Some("http://localhost:3000"));
        assert_eq!(resolved.as_deref(), Some("http://localhost:3000"));
    }

    #[test]
    fn base_url_none_when_nothing_available() {
        assert!(resolve_base_url(Some("ftp://nope"), None).is_none());
        assert!(resolve_base_url(None, None).is_none());
    }

    #[test]
    fn line_item_falls_back_to_generic_name() {
        let item = order_item::Model {
            id: Uuid::new_v4(),
            order_id: Uuid::new_v4(),
            menu_item_id: Uuid::new_v4(),
            quantity: 2,
            subtotal: dec!(39.98),
            created_at: Utc::now(),
        };

        let line = map_line_item(&item, None, None, "zar").unwrap();
        assert_eq!(line.name, "Item");
        assert_eq!(line.unit_amount, 1999);
        assert_eq!(line.quantity, 2);
        assert_eq!(line.currency, "zar");
        assert!(line.image_url.is_none());
    }
}
