use crate::claims::Claims;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};

/// Default token lifetime per the external interface's token contract.
pub const TOKEN_DURATION: std::time::Duration = std::time::Duration::from_secs(24 * 60 * 60);

/// HS256 signing/verification over a shared secret. This is the entire
/// surface the core needs from the credential-issuance collaborator: mint
/// a token when told to, validate one presented at the WebSocket upgrade.
pub struct Crypto {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl Crypto {
    pub fn new(secret: &str) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
        }
    }

    /// Reads the shared secret from `JWT_SECRET`, falling back to a
    /// development default so a bare `cargo run` still boots.
    pub fn from_env() -> Self {
        let secret = std::env::var("JWT_SECRET").unwrap_or_else(|_| "dev-secret-key".to_string());
        Self::new(&secret)
    }

    pub fn encode(&self, claims: &Claims) -> Result<String, jsonwebtoken::errors::Error> {
        encode(&Header::default(), claims, &self.encoding)
    }

    pub fn decode(&self, token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
        let mut validation = Validation::default();
        validation.validate_exp = false; // `Claims::expired` is checked explicitly by the caller
        Ok(decode::<Claims>(token, &self.decoding, &validation)?.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_a_token() {
        let crypto = Crypto::new("test-secret");
        let claims = Claims::new(42, "alice".into(), TOKEN_DURATION);
        let token = crypto.encode(&claims).unwrap();
        let decoded = crypto.decode(&token).unwrap();
        assert_eq!(decoded.user_id(), 42);
        assert_eq!(decoded.username(), "alice");
    }

    #[test]
    fn rejects_token_signed_with_a_different_secret() {
        let signer = Crypto::new("secret-a");
        let verifier = Crypto::new("secret-b");
        let token = signer
            .encode(&Claims::new(1, "bob".into(), TOKEN_DURATION))
            .unwrap();
        assert!(verifier.decode(&token).is_err());
    }
}
