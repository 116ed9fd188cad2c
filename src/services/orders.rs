use crate::{
    db::DbPool,
    entities::notification,
    entities::order::{self, ActiveModel as OrderActiveModel, Entity as OrderEntity},
    entities::order_item::{self, Entity as OrderItemEntity},
    errors::ServiceError,
    events::{Event, EventSender},
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, ModelTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OrderItemResponse {
    pub id: Uuid,
    pub menu_item_id: Uuid,
    pub quantity: i32,
    pub subtotal: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OrderResponse {
    pub id: Uuid,
    pub user_id: Uuid,
    pub status: String,
    pub total: Decimal,
    pub items: Vec<OrderItemResponse>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Service for reading and mutating orders
#[derive(Clone)]
pub struct OrderService {
    db_pool: Arc<DbPool>,
    event_sender: Option<Arc<EventSender>>,
}

impl OrderService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Option<Arc<EventSender>>) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    /// Retrieves an order with its line items
    #[instrument(skip(self), fields(order_id = %order_id))]
    pub async fn get_order(&self, order_id: Uuid) -> Result<Option<OrderResponse>, ServiceError> {
        let db = &*self.db_pool;

        let order = OrderEntity::find_by_id(order_id).one(db).await.map_err(|e| {
            error!(error = %e, order_id = %order_id, "Failed to fetch order");
            ServiceError::DatabaseError(e)
        })?;

        let Some(order) = order else {
            info!(order_id = %order_id, "Order not found");
            return Ok(None);
        };

        let items = order
            .find_related(OrderItemEntity)
            .order_by_asc(order_item::Column::CreatedAt)
            .all(db)
            .await
            .map_err(|e| {
                error!(error = %e, order_id = %order_id, "Failed to fetch order items");
                ServiceError::DatabaseError(e)
            })?;

        Ok(Some(model_to_response(order, &items)))
    }

    /// Transitions an order's status and notifies its owner.
    ///
    /// The status mutation and the notification insert commit in one
    /// transaction; either both persist or neither does.
    #[instrument(skip(self), fields(order_id = %order_id, new_status = %status))]
    pub async fn update_status(
        &self,
        order_id: Uuid,
        status: &str,
    ) -> Result<OrderResponse, ServiceError> {
        let db = &*self.db_pool;
        let now = Utc::now();

        let txn = db.begin().await.map_err(|e| {
            error!(error = %e, order_id = %order_id, "Failed to start status update transaction");
            ServiceError::DatabaseError(e)
        })?;

        let order = OrderEntity::find_by_id(order_id)
            .one(&txn)
            .await
            .map_err(|e| {
                error!(error = %e, order_id = %order_id, "Failed to find order for status update");
                ServiceError::DatabaseError(e)
            })?
            .ok_or_else(|| {
                warn!(order_id = %order_id, "Order not found for status update");
                ServiceError::NotFound("Order not found".to_string())
            })?;

        let old_status = order.status.clone();
        let owner_id = order.user_id;

        let mut order_active_model: OrderActiveModel = order.into();
        order_active_model.status = Set(status.to_string());
        order_active_model.updated_at = Set(Some(now));

        let updated_order = order_active_model.update(&txn).await.map_err(|e| {
            error!(error = %e, order_id = %order_id, "Failed to update order status");
            ServiceError::DatabaseError(e)
        })?;

        let notification_model = notification::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(owner_id),
            message: Set(format!("Your order #{} is now {}", order_id, status)),
            is_read: Set(false),
            created_at: Set(now),
        };

        notification_model.insert(&txn).await.map_err(|e| {
            error!(error = %e, order_id = %order_id, "Failed to insert status notification");
            ServiceError::DatabaseError(e)
        })?;

        let items = OrderItemEntity::find()
            .filter(order_item::Column::OrderId.eq(order_id))
            .order_by_asc(order_item::Column::CreatedAt)
            .all(&txn)
            .await
            .map_err(ServiceError::DatabaseError)?;

        txn.commit().await.map_err(|e| {
            error!(error = %e, order_id = %order_id, "Failed to commit status update transaction");
            ServiceError::DatabaseError(e)
        })?;

        info!(
            order_id = %order_id,
            old_status = %old_status,
            new_status = %status,
            "Order status updated"
        );

        if let Some(event_sender) = &self.event_sender {
            event_sender
                .send_or_log(Event::OrderStatusChanged {
                    order_id,
                    old_status,
                    new_status: status.to_string(),
                })
                .await;
        }

        Ok(model_to_response(updated_order, &items))
    }

    /// Permanently removes an order and its line items.
    ///
    /// Payment rows referencing the order are retained as financial records.
    #[instrument(skip(self), fields(order_id = %order_id))]
    pub async fn delete_order(&self, order_id: Uuid) -> Result<(), ServiceError> {
        let db = &*self.db_pool;

        let txn = db.begin().await.map_err(|e| {
            error!(error = %e, order_id = %order_id, "Failed to start deletion transaction");
            ServiceError::DatabaseError(e)
        })?;

        let order = OrderEntity::find_by_id(order_id)
            .one(&txn)
            .await
            .map_err(|e| {
                error!(error = %e, order_id = %order_id, "Failed to find order for deletion");
                ServiceError::DatabaseError(e)
            })?
            .ok_or_else(|| {
                warn!(order_id = %order_id, "Order not found for deletion");
                ServiceError::NotFound("Order not found".to_string())
            })?;

        OrderItemEntity::delete_many()
            .filter(order_item::Column::OrderId.eq(order_id))
            .exec(&txn)
            .await
            .map_err(|e| {
                error!(error = %e, order_id = %order_id, "Failed to delete order items");
                ServiceError::DatabaseError(e)
            })?;

        order.delete(&txn).await.map_err(|e| {
            error!(error = %e, order_id = %order_id, "Failed to delete order");
            ServiceError::DatabaseError(e)
        })?;

        txn.commit().await.map_err(|e| {
            error!(error = %e, order_id = %order_id, "Failed to commit deletion transaction");
            ServiceError::DatabaseError(e)
        })?;

        info!(order_id = %order_id, "Order deleted");

        if let Some(event_sender) = &self.event_sender {
            event_sender.send_or_log(Event::OrderDeleted(order_id)).await;
        }

        Ok(())
    }
}

fn model_to_response(model: order::Model, items: &[order_item::Model]) -> OrderResponse {
    OrderResponse {
        id: model.id,
        user_id: model.user_id,
        status: model.status,
        total: model.total,
        items: items
            .iter()
            .map(|item| OrderItemResponse {
                id: item.id,
                menu_item_id: item.menu_item_id,
                quantity: item.quantity,
                subtotal: item.subtotal,
            })
            .collect(),
        created_at: model.created_at,
        updated_at: model.updated_at,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn model_to_response_embeds_items() {
        let now = Utc::now();
        let order_id = Uuid::new_v4();
        let user_id = Uuid::new_v4();

        let model = order::Model {
            id: order_id,
            user_id,
            status: "pending".to_string(),
            total: dec!(59.97),
            created_at: now,
            updated_at: None,
        };

        let items = vec![order_item::Model {
            id: Uuid::new_v4(),
            order_id,
            menu_item_id: Uuid::new_v4(),
            quantity: 3,
            subtotal: dec!(59.97),
            created_at: now,
        }];

        let response = model_to_response(model, &items);
        assert_eq!(response.id, order_id);
        assert_eq!(response.user_id, user_id);
        assert_eq!(response.items.len(), 1);
        assert_eq!(response.items[0].quantity, 3);
        assert_eq!(response.items[0].subtotal, dec!(59.97));
    }
}
