use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    http::{Method, Request},
    response::Response,
    routing::get,
    Extension, Router,
};
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set};
use serde_json::Value;
use tokio::sync::mpsc;
use tower::ServiceExt;
use uuid::Uuid;

use plateful_api::{
    auth::{AuthConfig, AuthService},
    config::{AppConfig, PaymentConfig},
    db::{self, DbConfig},
    entities::{item_image, menu_item, notification, order, order_item, payment, user},
    events::{self, EventSender},
    handlers::AppServices,
    stripe::StripeClient,
    AppState,
};

const TEST_JWT_SECRET: &str =
    "test_secret_key_for_integration_tests_that_is_at_least_64_characters_long";

/// Helper harness for spinning up an application backed by an in-memory
/// SQLite database.
pub struct TestApp {
    router: Router,
    pub state: AppState,
    pub auth_service: Arc<AuthService>,
    _event_task: tokio::task::JoinHandle<()>,
}

impl TestApp {
    /// Construct a new test application with fresh database state.
    pub async fn new() -> Self {
        // The Stripe client points at a closed port; order tests never reach it.
        Self::with_stripe_base("http://127.0.0.1:9".to_string()).await
    }

    /// Construct a test application whose payment processor calls go to the
    /// given base URL (normally a wiremock server).
    pub async fn with_stripe_base(stripe_base: String) -> Self {
        let mut cfg = AppConfig::new(
            "sqlite::memory:".to_string(),
            TEST_JWT_SECRET.to_string(),
            3600,
            "127.0.0.1".to_string(),
            18_080,
            "test".to_string(),
        );
        cfg.stripe_secret_key = "sk_test_plateful".to_string();

        // A single pooled connection keeps the in-memory database alive and
        // shared for the lifetime of the harness.
        let db_cfg = DbConfig {
            url: cfg.database_url.clone(),
            max_connections: 1,
            min_connections: 1,
            ..Default::default()
        };
        let db_pool = db::establish_connection_with_config(&db_cfg)
            .await
            .expect("test database");
        db::run_migrations(&db_pool).await.expect("migrations");

        let db_arc = Arc::new(db_pool);

        let (event_tx, event_rx) = mpsc::channel(64);
        let event_sender = EventSender::new(event_tx);
        let event_task = tokio::spawn(events::process_events(event_rx));

        let auth_service = Arc::new(AuthService::new(AuthConfig::new(
            cfg.jwt_secret.clone(),
            "plateful-auth".to_string(),
            "plateful-api".to_string(),
            Duration::from_secs(3600),
        )));

        let payment_config = PaymentConfig {
            base_url_override: Some("https://app.example.com".to_string()),
            stripe_secret_key: cfg.stripe_secret_key.clone(),
            currency: "zar".to_string(),
        };

        let stripe = StripeClient::with_api_base(cfg.stripe_secret_key.clone(), stripe_base);

        let services = AppServices::new(
            db_arc.clone(),
            Arc::new(event_sender.clone()),
            payment_config,
            stripe,
        );

        let state = AppState {
            db: db_arc,
            config: cfg,
            event_sender,
            services,
        };

        let router = Router::new()
            .route("/", get(|| async { "plateful-api up" }))
            .merge(plateful_api::api_routes())
            .layer(Extension(auth_service.clone()))
            .with_state(state.clone());

        Self {
            router,
            state,
            auth_service,
            _event_task: event_task,
        }
    }

    /// Override the configured base URL for checkout callbacks.
    pub async fn with_stripe_base_and_override(
        stripe_base: String,
        base_url_override: Option<String>,
    ) -> Self {
        let app = Self::with_stripe_base(stripe_base.clone()).await;

        let payment_config = PaymentConfig {
            base_url_override,
            stripe_secret_key: app.state.config.stripe_secret_key.clone(),
            currency: "zar".to_string(),
        };
        let stripe = StripeClient::with_api_base(
            app.state.config.stripe_secret_key.clone(),
            stripe_base,
        );
        let services = AppServices::new(
            app.state.db.clone(),
            Arc::new(app.state.event_sender.clone()),
            payment_config,
            stripe,
        );

        let state = AppState {
            db: app.state.db.clone(),
            config: app.state.config.clone(),
            event_sender: app.state.event_sender.clone(),
            services,
        };

        let router = Router::new()
            .merge(plateful_api::api_routes())
            .layer(Extension(app.auth_service.clone()))
            .with_state(state.clone());

        Self {
            router,
            state,
            auth_service: app.auth_service.clone(),
            _event_task: app._event_task,
        }
    }

    /// Seed a user with the given role and hand back the row and a token.
    pub async fn seed_user(&self, role: Option<&str>) -> (user::Model, String) {
        let user_id = Uuid::new_v4();
        let model = user::ActiveModel {
            user_id: Set(user_id),
            email: Set(format!("{user_id}@test.plateful.app")),
            name: Set(Some("Test User".to_string())),
            role: Set(role.map(str::to_string)),
            created_at: Set(Utc::now()),
        };
        let user = model.insert(&*self.state.db).await.expect("seed user");

        let token = self
            .auth_service
            .generate_token(user.user_id, Some(user.email.clone()), None)
            .expect("token");

        (user, token)
    }

    pub async fn seed_order(&self, user_id: Uuid, status: &str, total: Decimal) -> order::Model {
        let model = order::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(user_id),
            status: Set(status.to_string()),
            total: Set(total),
            created_at: Set(Utc::now()),
            updated_at: Set(None),
        };
        model.insert(&*self.state.db).await.expect("seed order")
    }

    pub async fn seed_menu_item(&self, name: &str, price: Option<Decimal>) -> menu_item::Model {
        let model = menu_item::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(name.to_string()),
            price: Set(price),
            created_at: Set(Utc::now()),
        };
        model.insert(&*self.state.db).await.expect("seed menu item")
    }

    pub async fn seed_item_image(&self, menu_item_id: Uuid, url: &str, position: i32) {
        let model = item_image::ActiveModel {
            id: Set(Uuid::new_v4()),
            menu_item_id: Set(menu_item_id),
            url: Set(url.to_string()),
            position: Set(position),
            created_at: Set(Utc::now()),
        };
        model.insert(&*self.state.db).await.expect("seed image");
    }

    pub async fn seed_order_item(
        &self,
        order_id: Uuid,
        menu_item_id: Uuid,
        quantity: i32,
        subtotal: Decimal,
    ) -> order_item::Model {
        let model = order_item::ActiveModel {
            id: Set(Uuid::new_v4()),
            order_id: Set(order_id),
            menu_item_id: Set(menu_item_id),
            quantity: Set(quantity),
            subtotal: Set(subtotal),
            created_at: Set(Utc::now()),
        };
        model.insert(&*self.state.db).await.expect("seed order item")
    }

    pub async fn notifications_for(&self, user_id: Uuid) -> Vec<notification::Model> {
        notification::Entity::find()
            .filter(notification::Column::UserId.eq(user_id))
            .all(&*self.state.db)
            .await
            .expect("notifications")
    }

    pub async fn payments_for_order(&self, order_id: Uuid) -> Vec<payment::Model> {
        payment::Entity::find()
            .filter(payment::Column::OrderId.eq(order_id))
            .all(&*self.state.db)
            .await
            .expect("payments")
    }

    /// Issue a request against the in-memory router.
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> Response {
        self.request_with_host(method, uri, token, body, None).await
    }

    /// Issue a request carrying an explicit Host header, for tests that
    /// exercise the request-origin fallback.
    pub async fn request_with_host(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
        host: Option<&str>,
    ) -> Response {
        let mut builder = Request::builder().method(method).uri(uri);

        if let Some(token) = token {
            builder = builder.header("Authorization", format!("Bearer {token}"));
        }

        if let Some(host) = host {
            builder = builder.header("Host", host);
        }

        let request = match body {
            Some(json) => builder
                .header("Content-Type", "application/json")
                .body(Body::from(serde_json::to_vec(&json).expect("body")))
                .expect("request"),
            None => builder.body(Body::empty()).expect("request"),
        };

        self.router.clone().oneshot(request).await.expect("response")
    }
}

/// Collects a response body as JSON.
pub async fn response_json(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("response body bytes");
    serde_json::from_slice(&bytes).expect("json response")
}
