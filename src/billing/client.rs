use async_trait::async_trait;
use reqwest::Client;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::{debug, warn};
use uuid::Uuid;

use super::BillingError;
use crate::profiles::MembershipTier;

/// A hosted page the client is redirected to (checkout or billing portal).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedirectSession {
    pub id: String,
    pub url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SubscriptionState {
    pub id: String,
    pub status: String,
    #[serde(default)]
    pub cancel_at_period_end: bool,
    #[serde(default)]
    pub current_period_end: Option<i64>,
}

#[derive(Debug, Clone)]
pub struct CheckoutRequest {
    pub user_id: Uuid,
    pub customer_id: Option<String>,
    pub customer_email: Option<String>,
    pub tier: MembershipTier,
    pub price_id: String,
    pub success_url: String,
    pub cancel_url: String,
}

#[async_trait]
pub trait BillingClient: Send + Sync {
    async fn create_customer(&self, user_id: Uuid, email: Option<&str>) -> Result<String, BillingError>;
    async fn create_checkout_session(&self, req: &CheckoutRequest) -> Result<RedirectSession, BillingError>;
    async fn create_portal_session(&self, customer_id: &str, return_url: &str) -> Result<RedirectSession, BillingError>;
    /// `true` cancels at the end of the current period, `false` resumes.
    async fn set_cancel_at_period_end(
        &self,
        subscription_id: &str,
        cancel: bool,
    ) -> Result<SubscriptionState, BillingError>;
}

/// Form body for a subscription-mode checkout session.
pub fn checkout_params(req: &CheckoutRequest) -> Vec<(&'static str, String)> {
    let mut params = vec![
        ("mode", "subscription".to_string()),
        ("line_items[0][price]", req.price_id.clone()),
        ("line_items[0][quantity]", "1".to_string()),
        ("success_url", req.success_url.clone()),
        ("cancel_url", req.cancel_url.clone()),
        ("client_reference_id", req.user_id.to_string()),
        ("metadata[user_id]", req.user_id.to_string()),
        ("metadata[tier]", req.tier.as_str().to_string()),
        ("subscription_data[metadata][user_id]", req.user_id.to_string()),
        ("subscription_data[metadata][tier]", req.tier.as_str().to_string()),
    ];
    match (&req.customer_id, &req.customer_email) {
        (Some(customer), _) => params.push(("customer", customer.clone())),
        (None, Some(email)) => params.push(("customer_email", email.clone())),
        (None, None) => {}
    }
    params
}

#[derive(Deserialize)]
struct ProviderErrorBody {
    error: ProviderErrorDetail,
}

#[derive(Deserialize)]
struct ProviderErrorDetail {
    message: Option<String>,
}

#[derive(Deserialize)]
struct CreatedObject {
    id: String,
}

/// Payments processor REST client (Stripe API, form-encoded requests).
#[derive(Clone)]
pub struct StripeClient {
    http: Client,
    api_base: String,
    secret_key: String,
}

impl StripeClient {
    pub fn new(api_base: &str, secret_key: &str) -> anyhow::Result<Self> {
        let http = Client::builder()
            .timeout(std::time::Duration::from_secs(20))
            .build()?;
        Ok(Self {
            http,
            api_base: api_base.trim_end_matches('/').to_string(),
            secret_key: secret_key.to_string(),
        })
    }

    async fn post_form<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, String)],
    ) -> Result<T, BillingError> {
        let url = format!("{}{}", self.api_base, path);
        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.secret_key)
            .form(params)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            debug!(%path, %status, "billing request ok");
            return Ok(response.json::<T>().await?);
        }

        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Failed to read error body".to_string());
        let message = serde_json::from_str::<ProviderErrorBody>(&body)
            .ok()
            .and_then(|b| b.error.message)
            .unwrap_or(body);
        warn!(%path, %status, %message, "billing provider rejected request");
        Err(BillingError::Provider {
            status: status.as_u16(),
            message,
        })
    }
}

#[async_trait]
impl BillingClient for StripeClient {
    async fn create_customer(&self, user_id: Uuid, email: Option<&str>) -> Result<String, BillingError> {
        let mut params = vec![("metadata[user_id]", user_id.to_string())];
        if let Some(email) = email {
            params.push(("email", email.to_string()));
        }
        let created: CreatedObject = self.post_form("/v1/customers", &params).await?;
        Ok(created.id)
    }

    async fn create_checkout_session(&self, req: &CheckoutRequest) -> Result<RedirectSession, BillingError> {
        self.post_form("/v1/checkout/sessions", &checkout_params(req))
            .await
    }

    async fn create_portal_session(&self, customer_id: &str, return_url: &str) -> Result<RedirectSession, BillingError> {
        let params = [
            ("customer", customer_id.to_string()),
            ("return_url", return_url.to_string()),
        ];
        self.post_form("/v1/billing_portal/sessions", &params).await
    }

    async fn set_cancel_at_period_end(
        &self,
        subscription_id: &str,
        cancel: bool,
    ) -> Result<SubscriptionState, BillingError> {
        let params = [("cancel_at_period_end", cancel.to_string())];
        self.post_form(&format!("/v1/subscriptions/{subscription_id}"), &params)
            .await
    }
}
