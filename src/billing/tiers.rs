use crate::{config::PriceCatalog, profiles::MembershipTier};

/// Price id for a paid tier; the free tier has no price.
pub fn price_for(prices: &PriceCatalog, tier: MembershipTier) -> Option<&str> {
    match tier {
        MembershipTier::Free => None,
        MembershipTier::Basic => Some(prices.basic.as_str()),
        MembershipTier::Standard => Some(prices.standard.as_str()),
        MembershipTier::Premium => Some(prices.premium.as_str()),
    }
}

pub fn tier_for_price(prices: &PriceCatalog, price_id: &str) -> Option<MembershipTier> {
    [
        MembershipTier::Basic,
        MembershipTier::Standard,
        MembershipTier::Premium,
    ]
    .into_iter()
    .find(|tier| price_for(prices, *tier) == Some(price_id))
}
