//! The token-contract collaborator from the external interface: HS256
//! JWT encode/decode over a shared secret, and the claim set a valid
//! token asserts. Credential issuance itself stays external.

pub mod claims;
pub mod crypto;

pub use claims::Claims;
pub use crypto::{Crypto, TOKEN_DURATION};
