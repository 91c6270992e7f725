use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// JWT payload issued by the auth platform for a signed-in user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,          // user ID
    pub exp: usize,         // expires at (unix timestamp)
    #[serde(default)]
    pub iat: usize,         // issued at (unix timestamp)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>, // issuer
    pub aud: String,        // audience
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}
