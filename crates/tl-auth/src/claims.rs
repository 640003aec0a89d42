/// Claim set carried by the `/ws?token=<JWT>` upgrade token. Credential
/// issuance (password checking, session creation) is an external
/// collaborator; this type only describes what a valid token asserts.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Claims {
    /// Subject: the authenticated user's id.
    pub sub: i64,
    /// Display name, carried in the token so the upgrade handler doesn't
    /// need a separate user lookup to seat the player.
    pub usr: String,
    iat: i64,
    exp: i64,
}

impl Claims {
    pub fn new(user_id: i64, username: String, duration: std::time::Duration) -> Self {
        let now = now_unix();
        Self {
            sub: user_id,
            usr: username,
            iat: now,
            exp: now + duration.as_secs() as i64,
        }
    }

    pub fn user_id(&self) -> i64 {
        self.sub
    }

    pub fn username(&self) -> &str {
        &self.usr
    }

    pub fn expired(&self) -> bool {
        self.exp < now_unix()
    }
}

fn now_unix() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .expect("system clock before epoch")
        .as_secs() as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_claims_are_not_expired() {
        let claims = Claims::new(1, "alice".into(), std::time::Duration::from_secs(3600));
        assert!(!claims.expired());
    }

    #[test]
    fn zero_duration_claims_expire_immediately() {
        let claims = Claims::new(1, "alice".into(), std::time::Duration::from_secs(0));
        std::thread::sleep(std::time::Duration::from_millis(1100));
        assert!(claims.expired());
    }
}
