// Configuration chargée une seule fois au démarrage puis partagée en
// web::Data<Config> (pas de variable globale, testable avec un secret par test)

use std::env;

#[derive(Debug, Clone)]
pub struct Config {
    pub jwt_secret: String,
    pub jwt_expires_minutes: i64,
    pub resend_api_key: String,
    pub production_from_email: Option<String>,
    pub email_verification_expires_minutes: i64,
    pub password_reset_expires_minutes: i64,
    pub magic_link_expires_minutes: i64,
}

impl Config {
    /// Charge la configuration depuis les variables d'environnement (.env)
    pub fn from_env() -> Result<Config, String> {
        let jwt_secret = env::var("JWT_SECRET")
            .map_err(|_| "JWT_SECRET environment variable is required".to_string())?;

        Ok(Config {
            jwt_secret,
            jwt_expires_minutes: env_minutes("JWT_EXPIRES_IN", 60),
            resend_api_key: env::var("RESEND_API_KEY").unwrap_or_default(),
            production_from_email: env::var("PRODUCTION_FROM_EMAIL").ok(),
            email_verification_expires_minutes: env_minutes("EMAIL_VERIFICATION_EXPIRES", 60),
            password_reset_expires_minutes: env_minutes("PASSWORD_RESET_EXPIRES", 30),
            magic_link_expires_minutes: env_minutes("MAGIC_LINK_EXPIRES", 15),
        })
    }
}

fn env_minutes(name: &str, default: i64) -> i64 {
    env::var(name)
        .ok()
        .and_then(|value| value.parse::<i64>().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_minutes_default() {
        assert_eq!(env_minutes("DOES_NOT_EXIST_12345", 30), 30);
    }
}
