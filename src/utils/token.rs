use crate::error::{Error, Result};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub exp: usize,
    pub role: Option<String>,
}

impl Claims {
    pub fn is_admin(&self) -> bool {
        self.role
            .as_deref()
            .map(|r| r.eq_ignore_ascii_case("admin"))
            .unwrap_or(false)
    }
}

pub fn issue_session_token(email: &str, role: &str, secret: &str, ttl_hours: i64) -> Result<String> {
    let exp = chrono::Utc::now() + chrono::Duration::hours(ttl_hours.max(1));
    let claims = Claims {
        sub: email.to_string(),
        exp: exp.timestamp() as usize,
        role: Some(role.to_string()),
    };
    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| Error::Internal(format!("failed to sign session token: {}", e)))
}

pub fn decode_session_token(token: &str, secret: &str) -> Result<Claims> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = true;
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(|_| Error::Unauthorized("invalid_token".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issued_tokens_decode_with_the_same_secret() {
        let token = issue_session_token("ana@example.com", "admin", "secret", 1).unwrap();
        let claims = decode_session_token(&token, "secret").unwrap();
        assert_eq!(claims.sub, "ana@example.com");
        assert!(claims.is_admin());
        assert!(decode_session_token(&token, "other").is_err());
    }
}
