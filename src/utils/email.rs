// Envoi d'emails via l'API HTTP de Resend (reqwest).
// Trois templates: bienvenue/vérification, reset password, magic link.
// L'expéditeur suit une chaîne de fallback: expéditeur custom de l'app,
// puis expéditeur de production configuré, puis l'adresse noreply par défaut.

use reqwest::Client;
use serde_json::json;
use std::time::Duration;

use crate::config::Config;
use crate::models::apps;

const RESEND_API_URL: &str = "https://api.resend.com/emails";
const DEFAULT_FROM_EMAIL: &str = "noreply@buttermetrics.com";

/// Normalise une adresse email avant tout lookup ou insert:
/// minuscules, trim, et suppression de l'alias "+tag"
/// (user+tag@domain.com -> user@domain.com)
pub fn normalize_email(email: &str) -> String {
    let normalized = email.trim().to_lowercase();

    match (normalized.find('+'), normalized.find('@')) {
        (Some(plus), Some(at)) if plus < at => {
            format!("{}{}", &normalized[..plus], &normalized[at..])
        }
        _ => normalized,
    }
}

/// Adresse "From" selon la configuration de l'app
pub fn from_address(config: &Config, app: &apps::Model) -> String {
    // Priorité 1: l'app a un expéditeur custom vérifié
    if let Some(from_email) = &app.from_email {
        let display_name = app.from_name.as_deref().unwrap_or(&app.name);
        return format!("{} <{}>", display_name, from_email);
    }

    // Priorité 2: expéditeur de production configuré
    if let Some(production_from) = &config.production_from_email {
        return format!("{} <{}>", app.name, production_from);
    }

    // Priorité 3: fallback par défaut
    format!("{} <{}>", app.name, DEFAULT_FROM_EMAIL)
}

async fn send_email(
    config: &Config,
    from: String,
    to: &str,
    subject: String,
    html: String,
) -> Result<(), String> {
    let client = Client::builder()
        .timeout(Duration::from_secs(10))
        .build()
        .map_err(|e| format!("Failed to build email client: {}", e))?;

    let response = client
        .post(RESEND_API_URL)
        .bearer_auth(&config.resend_api_key)
        .json(&json!({
            "from": from,
            "to": to,
            "subject": subject,
            "html": html,
        }))
        .send()
        .await
        .map_err(|e| format!("Failed to send email: {}", e))?;

    if !response.status().is_success() {
        return Err(format!("Resend API error: {}", response.status()));
    }

    Ok(())
}

/// Email de bienvenue avec lien de vérification
pub async fn send_welcome_email(
    config: &Config,
    app: &apps::Model,
    email: &str,
    first_name: Option<&str>,
    verification_token: &str,
) -> Result<(), String> {
    let verification_url = format!("{}/verify-email?token={}", app.domain, verification_token);
    let greeting = first_name.map(|name| format!(", {}", name)).unwrap_or_default();

    let html = format!(
        r#"<div style="font-family: Arial, sans-serif; max-width: 600px; margin: 0 auto;">
  <h2>Welcome to {}{}!</h2>
  <p>Thank you for signing up. Please verify your email address by clicking the button below:</p>
  <div style="text-align: center; margin: 30px 0;">
    <a href="{}" style="background-color: #007bff; color: white; padding: 12px 24px; text-decoration: none; border-radius: 5px; display: inline-block;">Verify Email Address</a>
  </div>
  <p>Or copy and paste this link in your browser:</p>
  <p style="word-break: break-all; color: #666;">{}</p>
  <p><small>This link will expire in {} minutes.</small></p>
  <p style="color: #666; font-size: 12px;">If you didn't create an account, you can safely ignore this email.</p>
</div>"#,
        app.name, greeting, verification_url, verification_url,
        config.email_verification_expires_minutes,
    );

    send_email(
        config,
        from_address(config, app),
        email,
        "Welcome! Please verify your email".to_string(),
        html,
    ).await
}

/// Email de reset password
pub async fn send_password_reset_email(
    config: &Config,
    app: &apps::Model,
    email: &str,
    first_name: Option<&str>,
    reset_token: &str,
) -> Result<(), String> {
    let reset_url = format!("{}/reset-password?token={}", app.domain, reset_token);
    let greeting = first_name.map(|name| format!(" {}", name)).unwrap_or_default();

    let html = format!(
        r#"<div style="font-family: Arial, sans-serif; max-width: 600px; margin: 0 auto;">
  <h2>Password Reset Request</h2>
  <p>Hello{},</p>
  <p>We received a request to reset your password. Click the button below to create a new password:</p>
  <div style="text-align: center; margin: 30px 0;">
    <a href="{}" style="background-color: #dc3545; color: white; padding: 12px 24px; text-decoration: none; border-radius: 5px; display: inline-block;">Reset Password</a>
  </div>
  <p>Or copy and paste this link in your browser:</p>
  <p style="word-break: break-all; color: #666;">{}</p>
  <p><small>This link will expire in {} minutes.</small></p>
  <p style="color: #666; font-size: 12px;">If you didn't request a password reset, you can safely ignore this email.</p>
</div>"#,
        greeting, reset_url, reset_url, config.password_reset_expires_minutes,
    );

    send_email(
        config,
        from_address(config, app),
        email,
        "Password Reset Request".to_string(),
        html,
    ).await
}

/// Email de magic link (sujet et texte différents pour un nouveau user)
pub async fn send_magic_link_email(
    config: &Config,
    app: &apps::Model,
    email: &str,
    first_name: Option<&str>,
    magic_token: &str,
    is_new_user: bool,
) -> Result<(), String> {
    let magic_url = format!("{}/auth/magic?token={}", app.domain, magic_token);
    let greeting = first_name.map(|name| format!(", {}", name)).unwrap_or_default();

    let subject = if is_new_user {
        format!("Welcome to {}! Your Magic Link", app.name)
    } else {
        format!("Your {} Magic Link", app.name)
    };

    let (title, intro, button) = if is_new_user {
        (
            format!("Welcome to {}{}!", app.name, greeting),
            "Your account has been created! Click the magic link below to complete your registration and sign in:",
            "Complete Registration",
        )
    } else {
        (
            format!("Sign in to {}{}", app.name, greeting),
            "Click the magic link below to sign in:",
            "Sign In with Magic Link",
        )
    };

    let html = format!(
        r#"<div style="font-family: Arial, sans-serif; max-width: 600px; margin: 0 auto;">
  <h2>{}</h2>
  <p>{}</p>
  <div style="text-align: center; margin: 30px 0;">
    <a href="{}" style="background-color: #28a745; color: white; padding: 12px 24px; text-decoration: none; border-radius: 5px; display: inline-block;">{}</a>
  </div>
  <p>Or copy and paste this link in your browser:</p>
  <p style="word-break: break-all; color: #666;">{}</p>
  <p><small>This magic link will expire in {} minutes.</small></p>
  <p style="color: #666; font-size: 12px;">If you didn't request this magic link, you can safely ignore this email.</p>
</div>"#,
        title, intro, magic_url, button, magic_url, config.magic_link_expires_minutes,
    );

    send_email(config, from_address(config, app), email, subject, html).await
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

    fn test_app() -> apps::Model {
        apps::Model {
            id: 1,
            name: "Demo App".to_string(),
            domain: "https://demo.example.com".to_string(),
            api_key: "app_test".to_string(),
            from_email: None,
            from_name: None,
            created_at: None,
        }
    }

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email("User@Example.COM"), "user@example.com");
        assert_eq!(normalize_email("  alice@example.com  "), "alice@example.com");
        assert_eq!(normalize_email("user+tag@domain.com"), "user@domain.com");
        assert_eq!(normalize_email("user+a+b@domain.com"), "user@domain.com");
        assert_eq!(normalize_email("plain@domain.com"), "plain@domain.com");
    }

    #[test]
    fn test_from_address_default() {
        let config = test_config();
        let app = test_app();

        assert_eq!(
            from_address(&config, &app),
            "Demo App <noreply@buttermetrics.com>"
        );
    }

    #[test]
    fn test_from_address_production() {
        let mut config = test_config();
        config.production_from_email = Some("hello@authstarter.dev".to_string());
        let app = test_app();

        assert_eq!(from_address(&config, &app), "Demo App <hello@authstarter.dev>");
    }

    #[test]
    fn test_from_address_custom_sender() {
        let mut config = test_config();
        config.production_from_email = Some("hello@authstarter.dev".to_string());
        let mut app = test_app();
        app.from_email = Some("team@demo.example.com".to_string());
        app.from_name = Some("The Demo Team".to_string());

        // l'expéditeur custom de l'app gagne sur celui de production
        assert_eq!(
            from_address(&config, &app),
            "The Demo Team <team@demo.example.com>"
        );

        app.from_name = None;
        assert_eq!(
            from_address(&config, &app),
            "Demo App <team@demo.example.com>"
        );
    }
}
