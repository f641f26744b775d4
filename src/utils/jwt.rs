use jsonwebtoken::{encode, decode, Header, Validation, EncodingKey, DecodingKey, Algorithm};
use jsonwebtoken::errors::ErrorKind;
use serde::{Deserialize, Serialize};
use chrono::{Utc, Duration};
use rand::RngCore;

use crate::config::Config;

const ISSUER: &str = "authstarter";

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: i32,        // user_id
    pub email: String,
    pub exp: i64,        // expiration timestamp
    pub iss: String,
}

/// Échec de vérification d'un token de session.
/// Les deux cas produisent des messages différents côté client
/// ("session expirée" vs "token invalide"), d'où l'enum.
#[derive(Debug, PartialEq, Eq)]
pub enum TokenError {
    Expired,
    Invalid,
}

/// Génère un JWT de session pour un utilisateur
pub fn generate_token(config: &Config, user_id: i32, email: &str) -> Result<String, String> {
    let expiration = Utc::now()
        .checked_add_signed(Duration::minutes(config.jwt_expires_minutes))
        .ok_or("Failed to calculate expiration")?
        .timestamp();

    let claims = Claims {
        sub: user_id,
        email: email.to_string(),
        exp: expiration,
        iss: ISSUER.to_string(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.jwt_secret.as_ref()),
    )
        .map_err(|e| format!("Failed to generate token: {}", e))
}

/// Vérifie et décode un JWT de session
pub fn verify_token(config: &Config, token: &str) -> Result<Claims, TokenError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_issuer(&[ISSUER]);

    decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.jwt_secret.as_ref()),
        &validation,
    )
        .map(|data| data.claims)
        .map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => TokenError::Expired,
            _ => TokenError::Invalid,
        })
}

/// Génère un token opaque pour verification / reset / magic link
/// 32 bytes aléatoires (256 bits) encodés en hex = 64 caractères
pub fn generate_secure_token() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> Config {
        Config {
            jwt_secret: "test-secret".to_string(),
            jwt_expires_minutes: 60,
            resend_api_key: String::new(),
            production_from_email: None,
            email_verification_expires_minutes: 60,
            password_reset_expires_minutes: 30,
            magic_link_expires_minutes: 15,
        }
    }

    #[test]
    fn test_generate_and_verify_token() {
        let config = test_config();

        let token = generate_token(&config, 123, "alice@example.com").unwrap();
        let claims = verify_token(&config, &token).unwrap();

        assert_eq!(claims.sub, 123);
        assert_eq!(claims.email, "alice@example.com");
        assert_eq!(claims.iss, "authstarter");
    }

    #[test]
    fn test_invalid_token() {
        let config = test_config();

        let result = verify_token(&config, "invalid.token.here");
        assert_eq!(result.unwrap_err(), TokenError::Invalid);
    }

    #[test]
    fn test_wrong_secret() {
        let config = test_config();
        let mut other = test_config();
        other.jwt_secret = "another-secret".to_string();

        let token = generate_token(&config, 1, "a@b.com").unwrap();
        let result = verify_token(&other, &token);
        assert_eq!(result.unwrap_err(), TokenError::Invalid);
    }

    #[test]
    fn test_expired_token() {
        let config = test_config();

        // token déjà expiré (au-delà de la leeway par défaut)
        let claims = Claims {
            sub: 1,
            email: "a@b.com".to_string(),
            exp: (Utc::now() - Duration::hours(2)).timestamp(),
            iss: ISSUER.to_string(),
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(config.jwt_secret.as_ref()),
        ).unwrap();

        let result = verify_token(&config, &token);
        assert_eq!(result.unwrap_err(), TokenError::Expired);
    }

    #[test]
    fn test_secure_token_format() {
        let token = generate_secure_token();
        assert_eq!(token.len(), 64);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(token, generate_secure_token());
    }
}
