use crate::error::{AppError, AppResult};
use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // user_id
    pub exp: i64,
    pub iat: i64,
    pub token_type: String, // "access"
}

#[derive(Clone)]
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    access_token_expires_in: i64,
}

impl JwtService {
    pub fn new(secret: &str, access_expires_in: i64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            access_token_expires_in: access_expires_in,
        }
    }

    pub fn generate_access_token(&self, user_id: i64) -> AppResult<String> {
        let now = Utc::now();
        let exp = now + Duration::seconds(self.access_token_expires_in);

        let claims = Claims {
            sub: user_id.to_string(),
            exp: exp.timestamp(),
            iat: now.timestamp(),
            token_type: "access".to_string(),
        };

        encode(&Header::default(), &claims, &self.encoding_key).map_err(|e| AppError::JwtError(e))
    }

    pub fn verify_token(&self, token: &str) -> AppResult<Claims> {
        let validation = Validation::new(Algorithm::HS256);
        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| AppError::JwtError(e))
    }

    pub fn verify_access_token(&self, token: &str) -> AppResult<Claims> {
        let claims = self.verify_token(token)?;

        if claims.token_type != "access" {
            return Err(AppError::AuthError("Invalid access token type".to_string()));
        }

        Ok(claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_access_token_round_trip() {
        let service = JwtService::new("unit-test-secret", 3600);
        let token = service.generate_access_token(42).unwrap();

        let claims = service.verify_access_token(&token).unwrap();
        assert_eq!(claims.sub, "42");
        assert_eq!(claims.token_type, "access");
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn test_non_access_token_type_rejected() {
        let service = JwtService::new("unit-test-secret", 3600);
        let now = Utc::now();
        let claims = Claims {
            sub: "42".to_string(),
            exp: (now + Duration::seconds(3600)).timestamp(),
            iat: now.timestamp(),
            token_type: "refresh".to_string(),
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(b"unit-test-secret"),
        )
        .unwrap();

        let result = service.verify_access_token(&token);
        assert!(matches!(result, Err(AppError::AuthError(_))));
    }

    #[test]
    fn test_expired_token_rejected() {
        // jsonwebtoken 默认有 60 秒宽限，过期时间需远超该窗口
        let service = JwtService::new("unit-test-secret", -120);
        let token = service.generate_access_token(42).unwrap();

        let result = service.verify_access_token(&token);
        assert!(matches!(result, Err(AppError::JwtError(_))));
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let service = JwtService::new("unit-test-secret", 3600);
        let other = JwtService::new("another-secret", 3600);
        let token = service.generate_access_token(42).unwrap();

        assert!(other.verify_access_token(&token).is_err());
    }
}
