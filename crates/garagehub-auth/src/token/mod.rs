//! Signed access tokens.

pub mod claims;
pub mod issuer;

pub use claims::Claims;
pub use issuer::{IssuedAccessToken, TokenIssuer};
