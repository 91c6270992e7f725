pub mod client;
pub mod handlers;
pub mod tiers;
pub mod webhook;

use crate::state::AppState;
use axum::Router;
use thiserror::Error;

pub use client::{BillingClient, StripeClient};

#[derive(Debug, Error)]
pub enum BillingError {
    #[error("billing request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("billing provider returned {status}: {message}")]
    Provider { status: u16, message: String },
}

pub fn router() -> Router<AppState> {
    handlers::billing_routes()
}
