//! Minimal Stripe Checkout client.
//!
//! Only the one call this service needs: create a hosted checkout session
//! and hand back the redirect URL. The Checkout API takes form-encoded
//! bodies with bracketed array keys, so the request is built as a flat
//! parameter list rather than JSON.

use crate::errors::ServiceError;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{error, instrument};
use uuid::Uuid;

const DEFAULT_API_BASE: &str = "https://api.stripe.com";

/// One priced, quantified checkout line.
#[derive(Debug, Clone, Serialize)]
pub struct CheckoutLineItem {
    pub name: String,
    /// Unit price in minor currency units
    pub unit_amount: i64,
    pub quantity: i32,
    pub currency: String,
    pub image_url: Option<String>,
}

/// Parameters for a hosted checkout session.
#[derive(Debug, Clone)]
pub struct CreateCheckoutSession {
    pub customer_email: String,
    pub line_items: Vec<CheckoutLineItem>,
    pub success_url: String,
    pub cancel_url: String,
    /// Recorded in session metadata so the callback can find the payment row
    pub payment_id: Uuid,
}

/// The subset of the session object this service reads back.
#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutSession {
    pub id: String,
    pub url: Option<String>,
}

#[derive(Clone)]
pub struct StripeClient {
    client: reqwest::Client,
    secret_key: String,
    api_base: String,
}

impl StripeClient {
    pub fn new(secret_key: String) -> Self {
        Self::with_api_base(secret_key, DEFAULT_API_BASE.to_string())
    }

    /// Point the client at a different API host (used by tests).
    pub fn with_api_base(secret_key: String, api_base: String) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(10))
                .build()
                .expect("reqwest client"),
            secret_key,
            api_base: api_base.trim_end_matches('/').to_string(),
        }
    }

    /// Create a hosted checkout session.
    #[instrument(skip(self, request), fields(payment_id = %request.payment_id))]
    pub async fn create_checkout_session(
        &self,
        request: &CreateCheckoutSession,
    ) -> Result<CheckoutSession, ServiceError> {
        let url = format!("{}/v1/checkout/sessions", self.api_base);
        let params = form_params(request);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.secret_key)
            .form(&params)
            .send()
            .await
            .map_err(|e| {
                error!("Checkout session request failed: {}", e);
                ServiceError::ExternalServiceError(
                    "Payment processor is unreachable".to_string(),
                )
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(
                status = status.as_u16(),
                body = %body,
                "Checkout session creation rejected"
            );
            return Err(ServiceError::ExternalServiceError(format!(
                "Payment processor rejected the checkout session ({})",
                status.as_u16()
            )));
        }

        let session: CheckoutSession = response.json().await.map_err(|e| {
            error!("Malformed checkout session response: {}", e);
            ServiceError::ExternalServiceError(
                "Payment processor returned a malformed response".to_string(),
            )
        })?;

        Ok(session)
    }
}

/// Flattens a session request into Stripe's bracketed form encoding.
fn form_params(request: &CreateCheckoutSession) -> Vec<(String, String)> {
    let mut params = vec![
        ("mode".to_string(), "payment".to_string()),
        (
            "payment_method_types[0]".to_string(),
            "card".to_string(),
        ),
        (
            "customer_email".to_string(),
            request.customer_email.clone(),
        ),
        ("success_url".to_string(), request.success_url.clone()),
        ("cancel_url".to_string(), request.cancel_url.clone()),
        (
            "metadata[payment_id]".to_string(),
            request.payment_id.to_string(),
        ),
    ];

    for (i, item) in request.line_items.iter().enumerate() {
        params.push((
            format!("line_items[{i}][quantity]"),
            item.quantity.to_string(),
        ));
        params.push((
            format!("line_items[{i}][price_data][currency]"),
            item.currency.clone(),
        ));
        params.push((
            format!("line_items[{i}][price_data][unit_amount]"),
            item.unit_amount.to_string(),
        ));
        params.push((
            format!("line_items[{i}][price_data][product_data][name]"),
            item.name.clone(),
        ));
        if let Some(url) = &item.image_url {
            params.push((
                format!("line_items[{i}][price_data][product_data][images][0]"),
                url.clone(),
            ));
        }
    }

    params
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_request() -> CreateCheckoutSession {
        CreateCheckoutSession {
            customer_email: "diner@example.com".to_string(),
            line_items: vec![
                CheckoutLineItem {
                    name: "Margherita".to_string(),
                    unit_amount: 1999,
                    quantity: 2,
                    currency: "zar".to_string(),
                    image_url: Some("https://cdn.example.com/margherita.jpg".to_string()),
                },
                CheckoutLineItem {
                    name: "Item".to_string(),
                    unit_amount: 550,
                    quantity: 1,
                    currency: "zar".to_string(),
                    image_url: None,
                },
            ],
            success_url: "https://app.example.com/payments/success?payment_id=p&session_id={CHECKOUT_SESSION_ID}"
                .to_string(),
            cancel_url: "https://app.example.com/payments/cancel?order_id=o".to_string(),
            payment_id: Uuid::nil(),
        }
    }

    #[test]
    fn form_params_flatten_line_items() {
        let params = form_params(&sample_request());

        let get = |key: &str| {
            params
                .iter()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.as_str())
        };

        assert_eq!(get("mode"), Some("payment"));
        assert_eq!(get("customer_email"), Some("diner@example.com"));
        assert_eq!(get("line_items[0][quantity]"), Some("2"));
        assert_eq!(
            get("line_items[0][price_data][unit_amount]"),
            Some("1999")
        );
        assert_eq!(
            get("line_items[0][price_data][product_data][images][0]"),
            Some("https://cdn.example.com/margherita.jpg")
        );
        assert_eq!(get("line_items[1][price_data][unit_amount]"), Some("550"));
        assert_eq!(
            get("metadata[payment_id]"),
            Some("00000000-0000-0000-0000-000000000000")
        );
    }

    #[test]
    fn form_params_omit_missing_images() {
        let params = form_params(&sample_request());
        assert!(!params
            .iter()
            .any(|(k, _)| k == "line_items[1][price_data][product_data][images][0]"));
    }

    #[test]
    fn session_response_deserializes() {
        let session: CheckoutSession = serde_json::from_str(
            r#"{"id":"cs_test_123","url":"https://checkout.stripe.com/c/pay/cs_test_123"}"#,
        )
        .unwrap();
        assert_eq!(session.id, "cs_test_123");
        assert!(session.url.is_some());
    }
}
