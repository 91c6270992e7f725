//! Bearer-token authentication against the external auth platform.
//!
//! Sessions, sign-in and sign-up live on the platform; this service only
//! verifies the tokens it hands out.

mod claims;
pub mod extractors;
pub mod jwt;

pub use claims::Claims;
pub use extractors::AuthUser;
pub use jwt::JwtKeys;
