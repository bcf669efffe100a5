//! Bearer tokens and password digests.
//!
//! Tokens are `base64url(claims).base64url(hmac-sha256)` signed with the
//! configured secret; expiry is checked server-side on every protected
//! request. Passwords are stored as `hex(salt)$hex(sha256(salt || pw))`.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use studyshelf_core::{Error, Result, Role, User};

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User id.
    pub sub: String,
    pub role: Role,
    /// Unix seconds.
    pub exp: i64,
}

pub struct TokenAuth {
    secret: Vec<u8>,
    ttl_secs: u64,
}

impl TokenAuth {
    pub fn new(secret: &str, ttl_secs: u64) -> Self {
        Self {
            secret: secret.as_bytes().to_vec(),
            ttl_secs,
        }
    }

    pub fn issue(&self, user: &User) -> Result<String> {
        let claims = Claims {
            sub: user.id.clone(),
            role: user.role,
            exp: chrono::Utc::now().timestamp() + self.ttl_secs as i64,
        };
        let payload = URL_SAFE_NO_PAD.encode(
            serde_json::to_vec(&claims).map_err(|e| Error::Internal(e.to_string()))?,
        );
        let tag = URL_SAFE_NO_PAD.encode(self.mac(&payload)?);
        Ok(format!("{payload}.{tag}"))
    }

    pub fn verify(&self, token: &str) -> Result<Claims> {
        let (payload, tag) = token
            .split_once('.')
            .ok_or_else(|| Error::Unauthorized("Invalid token".into()))?;
        let tag_bytes = URL_SAFE_NO_PAD
            .decode(tag)
            .map_err(|_| Error::Unauthorized("Invalid token".into()))?;

        let mut mac = HmacSha256::new_from_slice(&self.secret)
            .map_err(|e| Error::Internal(e.to_string()))?;
        mac.update(payload.as_bytes());
        mac.verify_slice(&tag_bytes)
            .map_err(|_| Error::Unauthorized("Invalid token".into()))?;

        let claims: Claims = URL_SAFE_NO_PAD
            .decode(payload)
            .ok()
            .and_then(|raw| serde_json::from_slice(&raw).ok())
            .ok_or_else(|| Error::Unauthorized("Invalid token".into()))?;

        if chrono::Utc::now().timestamp() >= claims.exp {
            return Err(Error::Unauthorized("Token expired".into()));
        }
        Ok(claims)
    }

    fn mac(&self, payload: &str) -> Result<Vec<u8>> {
        let mut mac = HmacSha256::new_from_slice(&self.secret)
            .map_err(|e| Error::Internal(e.to_string()))?;
        mac.update(payload.as_bytes());
        Ok(mac.finalize().into_bytes().to_vec())
    }
}

pub fn hash_password(password: &str) -> String {
    let salt: [u8; 16] = rand::random();
    format!("{}${}", hex(&salt), hex(&digest(&salt, password)))
}

pub fn verify_password(password: &str, stored: &str) -> bool {
    let Some((salt_hex, digest_hex)) = stored.split_once('$') else {
        return false;
    };
    let Some(salt) = unhex(salt_hex) else {
        return false;
    };
    hex(&digest(&salt, password)) == digest_hex
}

fn digest(salt: &[u8], password: &str) -> Vec<u8> {
    let mut hasher = Sha256::new();
    hasher.update(salt);
    hasher.update(password.as_bytes());
    hasher.finalize().to_vec()
}

fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

fn unhex(s: &str) -> Option<Vec<u8>> {
    if s.len() % 2 != 0 {
        return None;
    }
    (0..s.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(&s[i..i + 2], 16).ok())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn user(role: Role) -> User {
        User {
            id: "u1".into(),
            name: "Admin".into(),
            email: "admin@example.com".into(),
            role,
            password_digest: String::new(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn issue_then_verify_round_trips_claims() {
        let auth = TokenAuth::new("sekrit", 3600);
        let token = auth.issue(&user(Role::Admin)).unwrap();
        let claims = auth.verify(&token).unwrap();
        assert_eq!(claims.sub, "u1");
        assert_eq!(claims.role, Role::Admin);
    }

    #[test]
    fn tampered_token_is_rejected() {
        let auth = TokenAuth::new("sekrit", 3600);
        let token = auth.issue(&user(Role::User)).unwrap();
        let mut tampered = token.clone();
        tampered.replace_range(0..1, if token.starts_with('A') { "B" } else { "A" });
        assert!(auth.verify(&tampered).is_err());
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let token = TokenAuth::new("a", 3600).issue(&user(Role::Admin)).unwrap();
        assert!(TokenAuth::new("b", 3600).verify(&token).is_err());
    }

    #[test]
    fn expired_token_is_rejected() {
        let auth = TokenAuth::new("sekrit", 0);
        let token = auth.issue(&user(Role::Admin)).unwrap();
        let err = auth.verify(&token).unwrap_err();
        assert!(err.to_string().contains("expired"));
    }

    #[test]
    fn password_digest_round_trips() {
        let stored = hash_password("hunter2");
        assert!(verify_password("hunter2", &stored));
        assert!(!verify_password("hunter3", &stored));
        // Fresh salts per call.
        assert_ne!(stored, hash_password("hunter2"));
    }
}
