use jsonwebtoken::{decode, errors::ErrorKind, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::models::AuthContext;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    #[serde(default)]
    pub roles: Vec<String>,
    pub exp: u64,
}

/// HS256 bearer tokens signed with the shared `JWT_SECRET`.
#[derive(Clone)]
pub struct JwtValidator {
    key: DecodingKey,
    validation: Validation,
}

impl JwtValidator {
    pub fn new(secret: &str) -> Self {
        JwtValidator {
            key: DecodingKey::from_secret(secret.as_bytes()),
            validation: Validation::new(Algorithm::HS256),
        }
    }

    pub fn validate(&self, token: &str) -> Result<AuthContext, AppError> {
        let data = decode::<Claims>(token, &self.key, &self.validation).map_err(|e| {
            let reason = match e.kind() {
                ErrorKind::ExpiredSignature => "token expired".to_string(),
                ErrorKind::InvalidSignature => "token signature is invalid".to_string(),
                _ => format!("token validation failed: {e}"),
            };
            AppError::Unauthorized(reason)
        })?;
        Ok(AuthContext::user(data.claims.sub, data.claims.roles))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use jsonwebtoken::{encode, EncodingKey, Header};

    use super::*;

    pub fn token(secret: &str, sub: &str, exp: u64) -> String {
        let claims = Claims {
            sub: sub.to_string(),
            roles: vec!["user".into()],
            exp,
        };
        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    pub fn future_exp() -> u64 {
        (chrono::Utc::now().timestamp() + 3600) as u64
    }

    #[test]
    fn test_valid_token_yields_owner() {
        let validator = JwtValidator::new("s3cret");
        let ctx = validator.validate(&token("s3cret", "user-7", future_exp())).unwrap();
        assert_eq!(ctx.owner_id(), Some("user-7"));
        assert_eq!(ctx.roles, vec!["user".to_string()]);
    }

    #[test]
    fn test_wrong_secret_and_expired_rejected() {
        let validator = JwtValidator::new("s3cret");
        assert!(matches!(
            validator.validate(&token("other", "user-7", future_exp())),
            Err(AppError::Unauthorized(_))
        ));
        assert!(matches!(
            validator.validate(&token("s3cret", "user-7", 1_000)),
            Err(AppError::Unauthorized(_))
        ));
    }
}
