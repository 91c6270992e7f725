use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use tracing::{error, info, instrument, warn};

use super::{
    client::CheckoutRequest,
    tiers::price_for,
    webhook::{membership_change, Event, MembershipChange, WebhookVerifier},
    BillingError,
};
use crate::{
    auth::AuthUser,
    profiles::{repo as profiles, MembershipTier, Profile},
    state::AppState,
};

#[derive(Debug, Deserialize)]
pub struct CheckoutBody {
    pub tier: MembershipTier,
}

#[derive(Debug, Serialize)]
pub struct RedirectResponse {
    pub url: String,
}

#[derive(Debug, Serialize)]
pub struct MembershipResponse {
    pub tier: MembershipTier,
    pub cancel_at_period_end: bool,
    #[serde(with = "time::serde::rfc3339::option")]
    pub current_period_end: Option<OffsetDateTime>,
}

impl From<&Profile> for MembershipResponse {
    fn from(p: &Profile) -> Self {
        Self {
            tier: p.membership_tier,
            cancel_at_period_end: p.cancel_at_period_end,
            current_period_end: p.current_period_end,
        }
    }
}

pub fn billing_routes() -> Router<AppState> {
    Router::new()
        .route("/billing/membership", get(get_membership))
        .route("/billing/checkout", post(create_checkout))
        .route("/billing/portal", post(create_portal))
        .route("/billing/cancel", post(cancel_subscription))
        .route("/billing/resume", post(resume_subscription))
        .route("/billing/webhook", post(webhook))
}

fn provider_error(e: BillingError) -> (StatusCode, String) {
    match e {
        // provider message goes to the user as-is
        BillingError::Provider { message, .. } => (StatusCode::BAD_GATEWAY, message),
        BillingError::Http(e) => {
            error!(error = %e, "billing transport failure");
            (StatusCode::BAD_GATEWAY, e.to_string())
        }
    }
}

fn internal(e: anyhow::Error) -> (StatusCode, String) {
    error!(error = %e, "billing storage failure");
    (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
}

async fn load_profile(st: &AppState, user: &AuthUser) -> Result<Profile, (StatusCode, String)> {
    profiles::ensure(&st.db, user.id, user.email.as_deref())
        .await
        .map_err(internal)
}

#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn get_membership(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<MembershipResponse>, (StatusCode, String)> {
    let profile = load_profile(&state, &user).await?;
    Ok(Json(MembershipResponse::from(&profile)))
}

/// POST /billing/checkout { tier } → hosted checkout URL
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn create_checkout(
    State(state): State<AppState>,
    user: AuthUser,
    Json(body): Json<CheckoutBody>,
) -> Result<Json<RedirectResponse>, (StatusCode, String)> {
    let billing_cfg = &state.config.billing;
    if !body.tier.is_paid() {
        return Err((StatusCode::BAD_REQUEST, "free tier has no checkout".to_string()));
    }
    let price_id = price_for(&billing_cfg.prices, body.tier)
        .ok_or((StatusCode::INTERNAL_SERVER_ERROR, "no price configured for tier".to_string()))?
        .to_string();

    let profile = load_profile(&state, &user).await?;
    let customer_id = match profile.stripe_customer_id {
        Some(id) => id,
        None => {
            let id = state
                .billing
                .create_customer(user.id, user.email.as_deref())
                .await
                .map_err(provider_error)?;
            profiles::set_stripe_customer(&state.db, user.id, &id)
                .await
                .map_err(internal)?;
            info!(customer_id = %id, "billing customer created");
            id
        }
    };

    let base = billing_cfg.app_base_url.trim_end_matches('/');
    let request = CheckoutRequest {
        user_id: user.id,
        customer_id: Some(customer_id),
        customer_email: user.email.clone(),
        tier: body.tier,
        price_id,
        success_url: format!("{base}/account?checkout=success"),
        cancel_url: format!("{base}/pricing?checkout=cancelled"),
    };
    let session = state
        .billing
        .create_checkout_session(&request)
        .await
        .map_err(provider_error)?;
    info!(session_id = %session.id, tier = %body.tier, "checkout session created");
    Ok(Json(RedirectResponse { url: session.url }))
}

#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn create_portal(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<RedirectResponse>, (StatusCode, String)> {
    let profile = load_profile(&state, &user).await?;
    let customer_id = profile
        .stripe_customer_id
        .ok_or((StatusCode::CONFLICT, "No billing account yet".to_string()))?;
    let return_url = format!(
        "{}/account",
        state.config.billing.app_base_url.trim_end_matches('/')
    );
    let session = state
        .billing
        .create_portal_session(&customer_id, &return_url)
        .await
        .map_err(provider_error)?;
    Ok(Json(RedirectResponse { url: session.url }))
}

async fn set_cancel(
    st: &AppState,
    user: &AuthUser,
    cancel: bool,
) -> Result<Json<MembershipResponse>, (StatusCode, String)> {
    let profile = load_profile(st, user).await?;
    let subscription_id = profile
        .stripe_subscription_id
        .clone()
        .ok_or((StatusCode::CONFLICT, "No active subscription".to_string()))?;
    let sub = st
        .billing
        .set_cancel_at_period_end(&subscription_id, cancel)
        .await
        .map_err(provider_error)?;
    profiles::set_cancel_flag(&st.db, user.id, sub.cancel_at_period_end)
        .await
        .map_err(internal)?;
    info!(subscription = %sub.id, status = %sub.status, cancel, "subscription cancel flag set");

    let mut membership = MembershipResponse::from(&profile);
    membership.cancel_at_period_end = sub.cancel_at_period_end;
    if let Some(end) = sub
        .current_period_end
        .and_then(|ts| OffsetDateTime::from_unix_timestamp(ts).ok())
    {
        membership.current_period_end = Some(end);
    }
    Ok(Json(membership))
}

#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn cancel_subscription(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<MembershipResponse>, (StatusCode, String)> {
    set_cancel(&state, &user, true).await
}

#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn resume_subscription(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<MembershipResponse>, (StatusCode, String)> {
    set_cancel(&state, &user, false).await
}

async fn apply_change(st: &AppState, change: MembershipChange) -> anyhow::Result<u64> {
    match change {
        MembershipChange::Checkout {
            user_id,
            tier,
            customer_id,
            subscription_id,
        } => {
            let updated = profiles::apply_checkout(
                &st.db,
                user_id,
                tier,
                customer_id.as_deref(),
                subscription_id.as_deref(),
            )
            .await?;
            Ok(updated as u64)
        }
        MembershipChange::Updated {
            customer_id,
            subscription_id,
            tier,
            cancel_at_period_end,
            current_period_end,
        } => {
            profiles::apply_subscription_update(
                &st.db,
                &customer_id,
                &subscription_id,
                tier,
                cancel_at_period_end,
                current_period_end,
            )
            .await
        }
        MembershipChange::Deleted {
            customer_id,
            subscription_id,
        } => profiles::clear_subscription(&st.db, &customer_id, &subscription_id).await,
    }
}

fn received() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "received": true }))
}

/// POST /billing/webhook
///
/// Once the signature checks out the processor always gets a 2xx, even when
/// the membership update fails, so it never starts a retry storm. Failures
/// are only visible in the logs.
#[instrument(skip(state, headers, body))]
pub async fn webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<serde_json::Value>, (StatusCode, String)> {
    let signature = headers
        .get("stripe-signature")
        .and_then(|v| v.to_str().ok());
    let verifier = WebhookVerifier::new(&state.config.billing.webhook_secret);
    let now = OffsetDateTime::now_utc().unix_timestamp();
    if let Err(e) = verifier.verify(signature, &body, now) {
        warn!(error = %e, "webhook signature rejected");
        return Err((StatusCode::BAD_REQUEST, e.to_string()));
    }

    let event: Event = match serde_json::from_slice(&body) {
        Ok(ev) => ev,
        Err(e) => {
            error!(error = %e, "signed webhook payload did not parse");
            return Ok(received());
        }
    };

    match membership_change(&event, &state.config.billing.prices) {
        Ok(Some(change)) => match apply_change(&state, change).await {
            Ok(rows) if rows > 0 => {
                info!(event_id = %event.id, kind = %event.kind, rows, "membership updated");
            }
            Ok(_) => {
                warn!(event_id = %event.id, kind = %event.kind, "no profile matched webhook event");
            }
            Err(e) => {
                error!(error = %e, event_id = %event.id, kind = %event.kind, "membership update failed");
            }
        },
        Ok(None) => {}
        Err(e) => {
            error!(error = %e, event_id = %event.id, kind = %event.kind, "webhook event rejected");
        }
    }
    Ok(received())
}
