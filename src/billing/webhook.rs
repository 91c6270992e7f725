//! Inbound payments webhook: signature check, event decoding and the
//! membership changes each event implies.
//!
//! The `Stripe-Signature` header has the form `t=<unix>,v1=<hex>[,v1=<hex>]`
//! where each `v1` is HMAC-SHA256 over `"<t>.<raw body>"` with the endpoint
//! secret.

use std::collections::HashMap;

use ring::hmac;
use serde::Deserialize;
use subtle::ConstantTimeEq;
use thiserror::Error;
use time::OffsetDateTime;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::tiers::tier_for_price;
use crate::{config::PriceCatalog, profiles::MembershipTier};

/// Maximum age of a signed timestamp, in seconds.
pub const SIGNATURE_TOLERANCE_SECS: i64 = 300;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum WebhookError {
    #[error("missing signature header")]
    MissingSignature,
    #[error("malformed signature header")]
    MalformedSignature,
    #[error("signature does not match payload")]
    SignatureMismatch,
    #[error("signature timestamp outside tolerance")]
    Expired,
    #[error("invalid event payload: {0}")]
    Payload(String),
}

pub struct WebhookVerifier {
    key: hmac::Key,
}

impl WebhookVerifier {
    pub fn new(secret: &str) -> Self {
        Self {
            key: hmac::Key::new(hmac::HMAC_SHA256, secret.as_bytes()),
        }
    }

    fn expected(&self, timestamp: &str, payload: &[u8]) -> String {
        let mut ctx = hmac::Context::with_key(&self.key);
        ctx.update(timestamp.as_bytes());
        ctx.update(b".");
        ctx.update(payload);
        hex::encode(ctx.sign().as_ref())
    }

    /// Header value the processor would send for `payload` at `timestamp`.
    pub fn signature_header(&self, payload: &[u8], timestamp: i64) -> String {
        let t = timestamp.to_string();
        format!("t={},v1={}", t, self.expected(&t, payload))
    }

    pub fn verify(&self, header: Option<&str>, payload: &[u8], now: i64) -> Result<(), WebhookError> {
        let header = header.ok_or(WebhookError::MissingSignature)?;

        let mut timestamp = None;
        let mut signatures = Vec::new();
        for part in header.split(',') {
            let Some((k, v)) = part.trim().split_once('=') else {
                continue;
            };
            match k {
                "t" => timestamp = Some(v),
                "v1" => signatures.push(v),
                _ => {}
            }
        }

        let raw_ts = timestamp.ok_or(WebhookError::MalformedSignature)?;
        let ts: i64 = raw_ts.parse().map_err(|_| WebhookError::MalformedSignature)?;
        if signatures.is_empty() {
            return Err(WebhookError::MalformedSignature);
        }
        if ts.abs_diff(now) > SIGNATURE_TOLERANCE_SECS as u64 {
            return Err(WebhookError::Expired);
        }

        let expected = self.expected(raw_ts, payload);
        let matched = signatures
            .iter()
            .any(|sig| bool::from(sig.as_bytes().ct_eq(expected.as_bytes())));
        if matched {
            Ok(())
        } else {
            Err(WebhookError::SignatureMismatch)
        }
    }
}

// ---- Events ----

#[derive(Debug, Deserialize)]
pub struct Event {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub data: EventData,
}

#[derive(Debug, Deserialize)]
pub struct EventData {
    pub object: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct CheckoutSessionObject {
    client_reference_id: Option<String>,
    customer: Option<String>,
    subscription: Option<String>,
    #[serde(default)]
    metadata: HashMap<String, String>,
}

#[derive(Debug, Deserialize)]
struct SubscriptionObject {
    id: String,
    customer: String,
    status: String,
    #[serde(default)]
    cancel_at_period_end: bool,
    current_period_end: Option<i64>,
    #[serde(default)]
    items: SubscriptionItems,
    #[serde(default)]
    metadata: HashMap<String, String>,
}

#[derive(Debug, Default, Deserialize)]
struct SubscriptionItems {
    #[serde(default)]
    data: Vec<SubscriptionItem>,
}

#[derive(Debug, Deserialize)]
struct SubscriptionItem {
    price: PriceRef,
    // newer API versions report the period per item
    current_period_end: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct PriceRef {
    id: String,
}

/// Statuses under which a subscription still grants its tier.
const ENTITLED_STATUSES: [&str; 3] = ["active", "trialing", "past_due"];

/// What an event means for the denormalized membership on a profile.
#[derive(Debug, Clone, PartialEq)]
pub enum MembershipChange {
    Checkout {
        user_id: Uuid,
        tier: MembershipTier,
        customer_id: Option<String>,
        subscription_id: Option<String>,
    },
    Updated {
        customer_id: String,
        subscription_id: String,
        tier: MembershipTier,
        cancel_at_period_end: bool,
        current_period_end: Option<OffsetDateTime>,
    },
    Deleted {
        customer_id: String,
        subscription_id: String,
    },
}

fn object<T: for<'de> Deserialize<'de>>(event: &Event) -> Result<T, WebhookError> {
    serde_json::from_value(event.data.object.clone()).map_err(|e| WebhookError::Payload(e.to_string()))
}

/// Maps an event to a membership change; `Ok(None)` for event types this
/// service does not track.
pub fn membership_change(event: &Event, prices: &PriceCatalog) -> Result<Option<MembershipChange>, WebhookError> {
    match event.kind.as_str() {
        "checkout.session.completed" => {
            let session: CheckoutSessionObject = object(event)?;
            let raw_user = session
                .metadata
                .get("user_id")
                .cloned()
                .or(session.client_reference_id)
                .ok_or_else(|| WebhookError::Payload("checkout session without user".into()))?;
            let user_id = Uuid::parse_str(&raw_user).map_err(|e| WebhookError::Payload(e.to_string()))?;
            let tier = session
                .metadata
                .get("tier")
                .ok_or_else(|| WebhookError::Payload("checkout session without tier".into()))?
                .parse::<MembershipTier>()
                .map_err(|e| WebhookError::Payload(e.to_string()))?;
            Ok(Some(MembershipChange::Checkout {
                user_id,
                tier,
                customer_id: session.customer,
                subscription_id: session.subscription,
            }))
        }
        "customer.subscription.updated" => {
            let sub: SubscriptionObject = object(event)?;
            let first_item = sub.items.data.first();
            let tier = if ENTITLED_STATUSES.contains(&sub.status.as_str()) {
                first_item
                    .and_then(|item| tier_for_price(prices, &item.price.id))
                    .or_else(|| sub.metadata.get("tier").and_then(|t| t.parse().ok()))
                    .unwrap_or_else(|| {
                        warn!(subscription = %sub.id, "subscription price not in catalog");
                        MembershipTier::Free
                    })
            } else {
                debug!(subscription = %sub.id, status = %sub.status, "subscription not entitled");
                MembershipTier::Free
            };
            let period_end = sub
                .current_period_end
                .or_else(|| first_item.and_then(|item| item.current_period_end))
                .and_then(|ts| OffsetDateTime::from_unix_timestamp(ts).ok());
            Ok(Some(MembershipChange::Updated {
                customer_id: sub.customer,
                subscription_id: sub.id,
                tier,
                cancel_at_period_end: sub.cancel_at_period_end,
                current_period_end: period_end,
            }))
        }
        "customer.subscription.deleted" => {
            let sub: SubscriptionObject = object(event)?;
            Ok(Some(MembershipChange::Deleted {
                customer_id: sub.customer,
                subscription_id: sub.id,
            }))
        }
        other => {
            info!(event_id = %event.id, kind = %other, "ignoring webhook event");
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    const NOW: i64 = 1_760_000_000;

    fn prices() -> PriceCatalog {
        PriceCatalog {
            basic: "price_basic".into(),
            standard: "price_standard".into(),
            premium: "price_premium".into(),
        }
    }

    fn event(kind: &str, object: serde_json::Value) -> Event {
        serde_json::from_value(json!({ "id": "evt_1", "type": kind, "data": { "object": object } }))
            .expect("event")
    }

    #[test]
    fn accepts_own_signature() {
        let verifier = WebhookVerifier::new("whsec_test");
        let body = br#"{"id":"evt_1"}"#;
        let header = verifier.signature_header(body, NOW);
        assert_eq!(verifier.verify(Some(&header), body, NOW + 10), Ok(()));
    }

    #[test]
    fn accepts_any_matching_v1_among_several() {
        let verifier = WebhookVerifier::new("whsec_test");
        let body = b"{}";
        let good = verifier.signature_header(body, NOW);
        let sig = good.split_once("v1=").map(|(_, s)| s).unwrap();
        let header = format!("t={NOW},v1=deadbeef,v0=ignored,v1={sig}");
        assert_eq!(verifier.verify(Some(&header), body, NOW), Ok(()));
    }

    #[test]
    fn rejects_tampered_body_and_wrong_secret() {
        let verifier = WebhookVerifier::new("whsec_test");
        let header = verifier.signature_header(b"original", NOW);
        assert_eq!(
            verifier.verify(Some(&header), b"tampered", NOW),
            Err(WebhookError::SignatureMismatch)
        );
        let other = WebhookVerifier::new("whsec_other");
        assert_eq!(
            other.verify(Some(&header), b"original", NOW),
            Err(WebhookError::SignatureMismatch)
        );
    }

    #[test]
    fn rejects_missing_malformed_and_stale_headers() {
        let verifier = WebhookVerifier::new("whsec_test");
        assert_eq!(verifier.verify(None, b"x", NOW), Err(WebhookError::MissingSignature));
        assert_eq!(
            verifier.verify(Some("v1=abc"), b"x", NOW),
            Err(WebhookError::MalformedSignature)
        );
        assert_eq!(
            verifier.verify(Some(&format!("t={NOW}")), b"x", NOW),
            Err(WebhookError::MalformedSignature)
        );
        let header = verifier.signature_header(b"x", NOW - SIGNATURE_TOLERANCE_SECS - 1);
        assert_eq!(verifier.verify(Some(&header), b"x", NOW), Err(WebhookError::Expired));
    }

    #[test]
    fn extreme_timestamps_are_expired_not_overflowing() {
        let verifier = WebhookVerifier::new("whsec_test");
        for ts in [i64::MIN, i64::MAX] {
            let header = format!("t={ts},v1=00");
            assert_eq!(verifier.verify(Some(&header), b"{}", NOW), Err(WebhookError::Expired));
        }
    }

    #[test]
    fn checkout_completed_sets_tier_from_metadata() {
        let user = Uuid::new_v4();
        let ev = event(
            "checkout.session.completed",
            json!({
                "client_reference_id": user.to_string(),
                "customer": "cus_1",
                "subscription": "sub_1",
                "metadata": { "user_id": user.to_string(), "tier": "premium" }
            }),
        );
        let change = membership_change(&ev, &prices()).unwrap().unwrap();
        assert_eq!(
            change,
            MembershipChange::Checkout {
                user_id: user,
                tier: MembershipTier::Premium,
                customer_id: Some("cus_1".into()),
                subscription_id: Some("sub_1".into()),
            }
        );
    }

    #[test]
    fn checkout_without_user_is_a_payload_error() {
        let ev = event("checkout.session.completed", json!({ "metadata": { "tier": "basic" } }));
        assert!(matches!(
            membership_change(&ev, &prices()),
            Err(WebhookError::Payload(_))
        ));
    }

    #[test]
    fn subscription_update_maps_price_and_lifecycle() {
        let ev = event(
            "customer.subscription.updated",
            json!({
                "id": "sub_1",
                "customer": "cus_1",
                "status": "active",
                "cancel_at_period_end": true,
                "items": { "data": [ { "price": { "id": "price_standard" }, "current_period_end": NOW } ] }
            }),
        );
        match membership_change(&ev, &prices()).unwrap().unwrap() {
            MembershipChange::Updated {
                tier,
                cancel_at_period_end,
                current_period_end,
                ..
            } => {
                assert_eq!(tier, MembershipTier::Standard);
                assert!(cancel_at_period_end);
                assert_eq!(current_period_end.map(|t| t.unix_timestamp()), Some(NOW));
            }
            other => panic!("unexpected change {other:?}"),
        }
    }

    #[test]
    fn unpaid_subscription_drops_to_free() {
        let ev = event(
            "customer.subscription.updated",
            json!({
                "id": "sub_1",
                "customer": "cus_1",
                "status": "unpaid",
                "items": { "data": [ { "price": { "id": "price_premium" } } ] }
            }),
        );
        match membership_change(&ev, &prices()).unwrap().unwrap() {
            MembershipChange::Updated { tier, .. } => assert_eq!(tier, MembershipTier::Free),
            other => panic!("unexpected change {other:?}"),
        }
    }

    #[test]
    fn deleted_and_unknown_events() {
        let ev = event(
            "customer.subscription.deleted",
            json!({ "id": "sub_9", "customer": "cus_9", "status": "canceled" }),
        );
        assert_eq!(
            membership_change(&ev, &prices()).unwrap(),
            Some(MembershipChange::Deleted {
                customer_id: "cus_9".into(),
                subscription_id: "sub_9".into(),
            })
        );
        let ev = event("invoice.paid", json!({}));
        assert_eq!(membership_change(&ev, &prices()).unwrap(), None);
    }
}
