use crate::{
    auth::RoleClass,
    db::DbPool,
    entities::user::{self, Entity as UserEntity},
    errors::ServiceError,
};
use sea_orm::EntityTrait;
use std::sync::Arc;
use tracing::{error, instrument};
use uuid::Uuid;

/// Reads user records; the only thing the request pipeline needs from them
/// is the role classification.
#[derive(Clone)]
pub struct AccountService {
    db_pool: Arc<DbPool>,
}

impl AccountService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    /// Classifies the caller's stored role. A missing user row or a blank
    /// role both classify as an ordinary customer.
    #[instrument(skip(self), fields(user_id = %user_id))]
    pub async fn role_of(&self, user_id: Uuid) -> Result<RoleClass, ServiceError> {
        let user = UserEntity::find_by_id(user_id)
            .one(&*self.db_pool)
            .await
            .map_err(|e| {
                error!(error = %e, user_id = %user_id, "Failed to read user role");
                ServiceError::DatabaseError(e)
            })?;

        Ok(RoleClass::from_role(
            user.as_ref().and_then(|u| u.role.as_deref()),
        ))
    }

    /// Fetches a user record
    #[instrument(skip(self), fields(user_id = %user_id))]
    pub async fn get_user(&self, user_id: Uuid) -> Result<Option<user::Model>, ServiceError> {
        UserEntity::find_by_id(user_id)
            .one(&*self.db_pool)
            .await
            .map_err(ServiceError::DatabaseError)
    }
}
