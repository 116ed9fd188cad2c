pub mod notifications;
pub mod orders;
pub mod payments;

use crate::config::PaymentConfig;
use crate::db::DbPool;
use crate::events::EventSender;
use crate::stripe::StripeClient;
use std::sync::Arc;

// Re-export AppState so handler modules can import it as crate::handlers::AppState
pub use crate::AppState;

/// Services layer that encapsulates business logic used by HTTP handlers
#[derive(Clone)]
pub struct AppServices {
    pub accounts: Arc<crate::services::accounts::AccountService>,
    pub orders: Arc<crate::services::orders::OrderService>,
    pub payments: Arc<crate::services::payments::PaymentService>,
    pub notifications: Arc<crate::services::notifications::NotificationService>,
}

impl AppServices {
    pub fn new(
        db_pool: Arc<DbPool>,
        event_sender: Arc<EventSender>,
        payment_config: PaymentConfig,
        stripe: StripeClient,
    ) -> Self {
        let accounts = Arc::new(crate::services::accounts::AccountService::new(
            db_pool.clone(),
        ));
        let orders = Arc::new(crate::services::orders::OrderService::new(
            db_pool.clone(),
            Some(event_sender.clone()),
        ));
        let payments = Arc::new(crate::services::payments::PaymentService::new(
            db_pool.clone(),
            stripe,
            payment_config,
            Some(event_sender),
        ));
        let notifications = Arc::new(crate::services::notifications::NotificationService::new(
            db_pool,
        ));

        Self {
            accounts,
            orders,
            payments,
            notifications,
        }
    }
}
