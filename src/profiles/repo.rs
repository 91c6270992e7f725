use anyhow::Context;
use sqlx::PgPool;
use time::OffsetDateTime;
use uuid::Uuid;

use super::repo_types::{MembershipTier, Profile};

const COLUMNS: &str = "id, email, membership_tier, stripe_customer_id, stripe_subscription_id, \
     cancel_at_period_end, current_period_end, dietary_preference, budget_tier, servings, \
     allergies, created_at, updated_at";

pub struct Preferences<'a> {
    pub dietary_preference: Option<&'a str>,
    pub budget_tier: Option<&'a str>,
    pub servings: i32,
    pub allergies: &'a [String],
}

/// Returns the caller's profile, creating it on first access.
pub async fn ensure(db: &PgPool, user_id: Uuid, email: Option<&str>) -> anyhow::Result<Profile> {
    let profile = sqlx::query_as::<_, Profile>(&format!(
        r#"
        INSERT INTO profiles (id, email)
        VALUES ($1, $2)
        ON CONFLICT (id) DO UPDATE SET email = COALESCE(EXCLUDED.email, profiles.email)
        RETURNING {COLUMNS}
        "#
    ))
    .bind(user_id)
    .bind(email)
    .fetch_one(db)
    .await
    .context("ensure profile")?;
    Ok(profile)
}

pub async fn update_preferences(db: &PgPool, user_id: Uuid, prefs: &Preferences<'_>) -> anyhow::Result<Option<Profile>> {
    let profile = sqlx::query_as::<_, Profile>(&format!(
        r#"
        UPDATE profiles
           SET dietary_preference = $2, budget_tier = $3, servings = $4, allergies = $5,
               updated_at = now()
         WHERE id = $1
        RETURNING {COLUMNS}
        "#
    ))
    .bind(user_id)
    .bind(prefs.dietary_preference)
    .bind(prefs.budget_tier)
    .bind(prefs.servings)
    .bind(prefs.allergies)
    .fetch_optional(db)
    .await
    .context("update preferences")?;
    Ok(profile)
}

pub async fn set_stripe_customer(db: &PgPool, user_id: Uuid, customer_id: &str) -> anyhow::Result<()> {
    sqlx::query("UPDATE profiles SET stripe_customer_id = $2, updated_at = now() WHERE id = $1")
        .bind(user_id)
        .bind(customer_id)
        .execute(db)
        .await
        .context("set stripe customer")?;
    Ok(())
}

/// Records a completed checkout. Returns whether a profile was updated.
pub async fn apply_checkout(
    db: &PgPool,
    user_id: Uuid,
    tier: MembershipTier,
    customer_id: Option<&str>,
    subscription_id: Option<&str>,
) -> anyhow::Result<bool> {
    let result = sqlx::query(
        r#"
        UPDATE profiles
           SET membership_tier = $2,
               stripe_customer_id = COALESCE($3, stripe_customer_id),
               stripe_subscription_id = COALESCE($4, stripe_subscription_id),
               cancel_at_period_end = false,
               updated_at = now()
         WHERE id = $1
        "#,
    )
    .bind(user_id)
    .bind(tier.as_str())
    .bind(customer_id)
    .bind(subscription_id)
    .execute(db)
    .await
    .context("apply checkout")?;
    Ok(result.rows_affected() > 0)
}

/// Syncs lifecycle fields from a subscription event, matched by
/// subscription id or, failing that, customer id.
pub async fn apply_subscription_update(
    db: &PgPool,
    customer_id: &str,
    subscription_id: &str,
    tier: MembershipTier,
    cancel_at_period_end: bool,
    current_period_end: Option<OffsetDateTime>,
) -> anyhow::Result<u64> {
    let result = sqlx::query(
        r#"
        UPDATE profiles
           SET membership_tier = $3,
               stripe_subscription_id = $2,
               cancel_at_period_end = $4,
               current_period_end = $5,
               updated_at = now()
         WHERE stripe_subscription_id = $2 OR stripe_customer_id = $1
        "#,
    )
    .bind(customer_id)
    .bind(subscription_id)
    .bind(tier.as_str())
    .bind(cancel_at_period_end)
    .bind(current_period_end)
    .execute(db)
    .await
    .context("apply subscription update")?;
    Ok(result.rows_affected())
}

/// Drops a profile back to the free tier after its subscription ended.
pub async fn clear_subscription(db: &PgPool, customer_id: &str, subscription_id: &str) -> anyhow::Result<u64> {
    let result = sqlx::query(
        r#"
        UPDATE profiles
           SET membership_tier = 'free',
               stripe_subscription_id = NULL,
               cancel_at_period_end = false,
               current_period_end = NULL,
               updated_at = now()
         WHERE stripe_subscription_id = $2 OR stripe_customer_id = $1
        "#,
    )
    .bind(customer_id)
    .bind(subscription_id)
    .execute(db)
    .await
    .context("clear subscription")?;
    Ok(result.rows_affected())
}

pub async fn set_cancel_flag(db: &PgPool, user_id: Uuid, cancel_at_period_end: bool) -> anyhow::Result<()> {
    sqlx::query("UPDATE profiles SET cancel_at_period_end = $2, updated_at = now() WHERE id = $1")
        .bind(user_id)
        .bind(cancel_at_period_end)
        .execute(db)
        .await
        .context("set cancel flag")?;
    Ok(())
}
