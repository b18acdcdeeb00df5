use crate::model::role::Role;
use crate::models::Claims;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

fn now() -> usize {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock before epoch")
        .as_secs() as usize
}

/// Mint a bearer token the way the identity provider does. The service
/// itself never issues tokens in production; this is used to provision
/// service credentials and by the test suites.
pub fn generate_access_token(
    user_id: u64,
    name: String,
    role: Role,
    secret: &str,
    ttl: usize,
) -> String {
    let claims = Claims {
        user_id,
        sub: name,
        role: role.to_string(),
        exp: now() + ttl,
        jti: Uuid::new_v4().to_string(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .expect("claims are always encodable")
}

pub fn verify_token(token: &str, secret: &str) -> Result<Claims, String> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_preserves_identity_and_role() {
        let token = generate_access_token(1000, "Amina".to_string(), Role::HeadTeacher, "secret", 900);
        let claims = verify_token(&token, "secret").unwrap();
        assert_eq!(claims.user_id, 1000);
        assert_eq!(claims.sub, "Amina");
        assert_eq!(claims.role, "headTeacher");
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let token = generate_access_token(1000, "Amina".to_string(), Role::Teacher, "secret", 900);
        assert!(verify_token(&token, "other").is_err());
    }
}
