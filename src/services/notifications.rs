use crate::{
    db::DbPool,
    entities::notification::{self, Entity as NotificationEntity},
    errors::ServiceError,
};
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};
use std::sync::Arc;
use tracing::{error, instrument};
use uuid::Uuid;

/// Reads and updates the notification rows written when order statuses change.
#[derive(Clone)]
pub struct NotificationService {
    db_pool: Arc<DbPool>,
}

impl NotificationService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    /// Lists a user's notifications, newest first
    #[instrument(skip(self), fields(user_id = %user_id))]
    pub async fn list_for_user(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<notification::Model>, ServiceError> {
        NotificationEntity::find()
            .filter(notification::Column::UserId.eq(user_id))
            .order_by_desc(notification::Column::CreatedAt)
            .all(&*self.db_pool)
            .await
            .map_err(|e| {
                error!(error = %e, user_id = %user_id, "Failed to list notifications");
                ServiceError::DatabaseError(e)
            })
    }

    /// Marks one of the user's notifications as read.
    ///
    /// Another user's notification is indistinguishable from a missing one.
    #[instrument(skip(self), fields(user_id = %user_id, notification_id = %notification_id))]
    pub async fn mark_read(
        &self,
        user_id: Uuid,
        notification_id: Uuid,
    ) -> Result<(), ServiceError> {
        let db = &*self.db_pool;

        let notification = NotificationEntity::find_by_id(notification_id)
            .filter(notification::Column::UserId.eq(user_id))
            .one(db)
            .await
            .map_err(ServiceError::DatabaseError)?
            .ok_or_else(|| ServiceError::NotFound("Notification not found".to_string()))?;

        let mut active_model: notification::ActiveModel = notification.into();
        active_model.is_read = Set(true);
        active_model.update(db).await.map_err(|e| {
            error!(error = %e, notification_id = %notification_id, "Failed to mark notification read");
            ServiceError::DatabaseError(e)
        })?;

        Ok(())
    }
}
