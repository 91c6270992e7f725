use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use thiserror::Error;
use time::OffsetDateTime;
use uuid::Uuid;

/// Subscription level denormalized from the payments processor.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum MembershipTier {
    #[default]
    Free,
    Basic,
    Standard,
    Premium,
}

impl MembershipTier {
    pub fn as_str(self) -> &'static str {
        match self {
            MembershipTier::Free => "free",
            MembershipTier::Basic => "basic",
            MembershipTier::Standard => "standard",
            MembershipTier::Premium => "premium",
        }
    }

    pub fn is_paid(self) -> bool {
        self != MembershipTier::Free
    }
}

impl fmt::Display for MembershipTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
#[error("unknown membership tier '{0}'")]
pub struct UnknownTier(pub String);

impl FromStr for MembershipTier {
    type Err = UnknownTier;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "free" => Ok(MembershipTier::Free),
            "basic" => Ok(MembershipTier::Basic),
            "standard" => Ok(MembershipTier::Standard),
            "premium" => Ok(MembershipTier::Premium),
            other => Err(UnknownTier(other.to_string())),
        }
    }
}

impl TryFrom<String> for MembershipTier {
    type Error = UnknownTier;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BudgetTier {
    Low,
    Medium,
    High,
}

impl BudgetTier {
    pub fn as_str(self) -> &'static str {
        match self {
            BudgetTier::Low => "low",
            BudgetTier::Medium => "medium",
            BudgetTier::High => "high",
        }
    }
}

/// Profile record; `id` is the auth platform's user id.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Profile {
    pub id: Uuid,
    pub email: Option<String>,
    #[sqlx(try_from = "String")]
    pub membership_tier: MembershipTier,
    #[serde(skip_serializing)]
    pub stripe_customer_id: Option<String>,
    #[serde(skip_serializing)]
    pub stripe_subscription_id: Option<String>,
    pub cancel_at_period_end: bool,
    #[serde(with = "time::serde::rfc3339::option")]
    pub current_period_end: Option<OffsetDateTime>,
    pub dietary_preference: Option<String>,
    pub budget_tier: Option<String>,
    pub servings: i32,
    pub allergies: Vec<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tier_parses_and_prints() {
        for tier in [
            MembershipTier::Free,
            MembershipTier::Basic,
            MembershipTier::Standard,
            MembershipTier::Premium,
        ] {
            assert_eq!(tier.as_str().parse::<MembershipTier>().unwrap(), tier);
        }
        assert_eq!("PREMIUM".parse::<MembershipTier>().unwrap(), MembershipTier::Premium);
        assert!("gold".parse::<MembershipTier>().is_err());
        assert!(!MembershipTier::default().is_paid());
    }
}
