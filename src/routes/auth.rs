use actix_web::{post, get, web, HttpResponse};
use chrono::{Duration, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set, Value,
};
use serde::Deserialize;
use validator::Validate;

use crate::config::Config;
use crate::middleware::{AuthApp, OptionalAuthApp};
use crate::models::dto::UserResponse;
use crate::models::users::{ActiveModel as UserActiveModel, Column as UserColumn, Entity as Users};
use crate::routes::{db_error, validation_error};
use crate::services::token_service::{self, TokenKind};
use crate::utils::{email, jwt, password};
use crate::utils::password::validate_password_strength;

// DTO pour l'inscription
#[derive(Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    #[validate(email(message = "Please provide a valid email address"))]
    pub email: String,
    #[validate(
        length(min = 8, message = "Password must be at least 8 characters long"),
        custom(
            function = validate_password_strength,
            message = "Password must contain at least one uppercase letter, one lowercase letter, and one number"
        )
    )]
    pub password: String,
    #[validate(length(min = 1, max = 50, message = "First name must be between 1 and 50 characters"))]
    pub first_name: Option<String>,
    #[validate(length(min = 1, max = 50, message = "Last name must be between 1 and 50 characters"))]
    pub last_name: Option<String>,
}

// DTO pour la connexion
#[derive(Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "Please provide a valid email address"))]
    pub email: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

// DTO pour la demande de reset
#[derive(Deserialize, Validate)]
pub struct ForgotPasswordRequest {
    #[validate(email(message = "Please provide a valid email address"))]
    pub email: String,
}

// DTO pour le reset effectif
#[derive(Deserialize, Validate)]
pub struct ResetPasswordRequest {
    #[validate(length(min = 1, message = "Reset token is required"))]
    pub token: String,
    #[validate(
        length(min = 8, message = "Password must be at least 8 characters long"),
        custom(
            function = validate_password_strength,
            message = "Password must contain at least one uppercase letter, one lowercase letter, and one number"
        )
    )]
    pub password: String,
}

// token de vérification passé en query string (lien cliqué depuis l'email)
#[derive(Deserialize)]
pub struct VerifyEmailQuery {
    pub token: Option<String>,
}

// DTO pour la demande de magic link
#[derive(Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct MagicLinkRequest {
    #[validate(email(message = "Please provide a valid email address"))]
    pub email: String,
    #[validate(length(min = 1, max = 50, message = "First name must be between 1 and 50 characters"))]
    pub first_name: Option<String>,
    #[validate(length(min = 1, max = 50, message = "Last name must be between 1 and 50 characters"))]
    pub last_name: Option<String>,
}

// DTO pour la consommation d'un magic link
#[derive(Deserialize, Validate)]
pub struct MagicVerifyRequest {
    #[validate(length(min = 1, message = "Magic link token is required"))]
    pub token: String,
}

fn invalid_or_expired(message: &str) -> HttpResponse {
    // réponse unique pour "token inconnu" ET "token expiré":
    // ne jamais révéler lequel des deux
    HttpResponse::BadRequest().json(serde_json::json!({
        "error": "Invalid Token",
        "message": message
    }))
}

fn password_reset_ack() -> HttpResponse {
    // même réponse que l'email existe ou non (anti-énumération)
    HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "message": "If an account with that email exists, a password reset link has been sent."
    }))
}

/// POST /api/auth/register - Créer un compte avec mot de passe (X-API-Key)
#[post("/register")]
pub async fn register(
    AuthApp(app): AuthApp,
    body: web::Json<RegisterRequest>,
    db: web::Data<DatabaseConnection>,
    config: web::Data<Config>,
) -> HttpResponse {
    // 1. Valider le payload
    if let Err(errors) = body.validate() {
        return validation_error(&errors);
    }

    let user_email = email::normalize_email(&body.email);

    // 2. Vérifier que l'email n'existe pas déjà pour CETTE app
    let existing_user = Users::find()
        .filter(UserColumn::AppId.eq(app.id))
        .filter(UserColumn::Email.eq(&user_email))
        .one(db.get_ref())
        .await;

    match existing_user {
        Ok(Some(_)) => {
            return HttpResponse::BadRequest().json(serde_json::json!({
                "error": "User Already Exists",
                "message": "A user with this email address already exists"
            }));
        }
        Err(e) => return db_error(e),
        _ => {}
    }

    // 3. Hash le mot de passe
    let password_hash = match password::hash_password(&body.password) {
        Ok(hash) => hash,
        Err(e) => {
            eprintln!("Failed to hash password: {}", e);
            return HttpResponse::InternalServerError().json(serde_json::json!({
                "error": "Internal Server Error",
                "message": "Something went wrong"
            }));
        }
    };

    // 4. Créer le user avec son token de vérification déjà en place
    let verification_token = jwt::generate_secure_token();
    let verification_expires = (Utc::now()
        + Duration::minutes(TokenKind::EmailVerification.expires_minutes(config.get_ref())))
        .naive_utc();

    let new_user = UserActiveModel {
        app_id: Set(app.id),
        email: Set(user_email),
        password_hash: Set(Some(password_hash)),
        first_name: Set(body.first_name.as_deref().map(|name| name.trim().to_string())),
        last_name: Set(body.last_name.as_deref().map(|name| name.trim().to_string())),
        email_verified: Set(false),
        email_verification_token: Set(Some(verification_token.clone())),
        email_verification_expires: Set(Some(verification_expires)),
        ..Default::default()
    };

    let user = match new_user.insert(db.get_ref()).await {
        Ok(user) => user,
        Err(e) => return db_error(e),
    };

    // 5. Envoyer l'email de bienvenue; un échec ne fait PAS échouer
    // l'inscription (le compte existe, juste non vérifié)
    if let Err(e) = email::send_welcome_email(
        config.get_ref(),
        &app,
        &user.email,
        user.first_name.as_deref(),
        &verification_token,
    ).await {
        eprintln!("Failed to send welcome email: {}", e);
    }

    HttpResponse::Created().json(serde_json::json!({
        "success": true,
        "message": "User registered successfully. Please check your email to verify your account.",
        "user": UserResponse::from(user)
    }))
}

/// POST /api/auth/login - Se connecter avec mot de passe (X-API-Key)
#[post("/login")]
pub async fn login(
    AuthApp(app): AuthApp,
    body: web::Json<LoginRequest>,
    db: web::Data<DatabaseConnection>,
    config: web::Data<Config>,
) -> HttpResponse {
    // 1. Valider le payload
    if let Err(errors) = body.validate() {
        return validation_error(&errors);
    }

    let user_email = email::normalize_email(&body.email);

    // 2. Trouver le user dans le périmètre de l'app
    let user = Users::find()
        .filter(UserColumn::AppId.eq(app.id))
        .filter(UserColumn::Email.eq(&user_email))
        .one(db.get_ref())
        .await;

    let user = match user {
        Ok(Some(user)) => user,
        Ok(None) => {
            // même réponse que pour un mauvais mot de passe
            return HttpResponse::Unauthorized().json(serde_json::json!({
                "error": "Invalid Credentials",
                "message": "Invalid email or password"
            }));
        }
        Err(e) => return db_error(e),
    };

    // 3. Un compte magic-link-only n'a pas de mot de passe: le dire
    // explicitement (la seule asymétrie assumée, pour rediriger le user
    // vers le magic link au lieu d'un échec silencieux)
    let password_hash = match user.password_hash {
        Some(ref hash) => hash,
        None => {
            return HttpResponse::BadRequest().json(serde_json::json!({
                "error": "Password Not Set",
                "message": "This account uses magic link sign-in. Please request a magic link to log in."
            }));
        }
    };

    // 4. Vérifier le mot de passe
    let is_valid = match password::verify_password(&body.password, password_hash) {
        Ok(valid) => valid,
        Err(e) => {
            eprintln!("Password verification error: {}", e);
            return HttpResponse::InternalServerError().json(serde_json::json!({
                "error": "Internal Server Error",
                "message": "Something went wrong"
            }));
        }
    };

    if !is_valid {
        return HttpResponse::Unauthorized().json(serde_json::json!({
            "error": "Invalid Credentials",
            "message": "Invalid email or password"
        }));
    }

    // 5. Générer le JWT de session
    let token = match jwt::generate_token(config.get_ref(), user.id, &user.email) {
        Ok(token) => token,
        Err(e) => {
            eprintln!("Failed to generate token: {}", e);
            return HttpResponse::InternalServerError().json(serde_json::json!({
                "error": "Internal Server Error",
                "message": "Something went wrong"
            }));
        }
    };

    HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "message": "Login successful",
        "token": token,
        "user": UserResponse::from(user)
    }))
}

/// POST /api/auth/forgot - Demander un reset de mot de passe (X-API-Key)
#[post("/forgot")]
pub async fn forgot_password(
    AuthApp(app): AuthApp,
    body: web::Json<ForgotPasswordRequest>,
    db: web::Data<DatabaseConnection>,
    config: web::Data<Config>,
) -> HttpResponse {
    // 1. Valider le payload
    if let Err(errors) = body.validate() {
        return validation_error(&errors);
    }

    let user_email = email::normalize_email(&body.email);

    // 2. Trouver le user; s'il n'existe pas, répondre succès quand même
    let user = match Users::find()
        .filter(UserColumn::AppId.eq(app.id))
        .filter(UserColumn::Email.eq(&user_email))
        .one(db.get_ref())
        .await
    {
        Ok(Some(user)) => user,
        Ok(None) => return password_reset_ack(),
        Err(e) => return db_error(e),
    };

    // 3. Émettre le token de reset (écrase un éventuel token précédent)
    let reset_token = match token_service::issue_token(
        db.get_ref(),
        config.get_ref(),
        user.id,
        TokenKind::PasswordReset,
    ).await {
        Ok(token) => token,
        Err(e) => return db_error(e),
    };

    // 4. Envoyer l'email; ici un échec est fatal, c'est la seule action
    // que le user a demandée
    if let Err(e) = email::send_password_reset_email(
        config.get_ref(),
        &app,
        &user.email,
        user.first_name.as_deref(),
        &reset_token,
    ).await {
        eprintln!("Failed to send password reset email: {}", e);
        return HttpResponse::InternalServerError().json(serde_json::json!({
            "error": "Email Error",
            "message": "Failed to send password reset email. Please try again."
        }));
    }

    password_reset_ack()
}

/// POST /api/auth/reset - Changer le mot de passe avec un token de reset (X-API-Key)
#[post("/reset")]
pub async fn reset_password(
    AuthApp(app): AuthApp,
    body: web::Json<ResetPasswordRequest>,
    db: web::Data<DatabaseConnection>,
) -> HttpResponse {
    // 1. Valider le payload (même politique de mot de passe qu'à l'inscription)
    if let Err(errors) = body.validate() {
        return validation_error(&errors);
    }

    // 2. Trouver le user porteur de ce token, non expiré
    let user = match token_service::find_user_by_token(
        db.get_ref(),
        Some(app.id),
        TokenKind::PasswordReset,
        &body.token,
    ).await {
        Ok(Some(user)) => user,
        Ok(None) => return invalid_or_expired("Password reset token is invalid or has expired"),
        Err(e) => return db_error(e),
    };

    // 3. Hash du nouveau mot de passe
    let password_hash = match password::hash_password(&body.password) {
        Ok(hash) => hash,
        Err(e) => {
            eprintln!("Failed to hash password: {}", e);
            return HttpResponse::InternalServerError().json(serde_json::json!({
                "error": "Internal Server Error",
                "message": "Something went wrong"
            }));
        }
    };

    // 4. Consommer le token et poser le nouveau hash en un seul UPDATE
    let consumed = match token_service::consume_token(
        db.get_ref(),
        user.id,
        TokenKind::PasswordReset,
        &body.token,
        vec![(UserColumn::PasswordHash, Value::from(password_hash))],
    ).await {
        Ok(consumed) => consumed,
        Err(e) => return db_error(e),
    };

    if !consumed {
        // un redeem concurrent a gagné la course
        return invalid_or_expired("Password reset token is invalid or has expired");
    }

    HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "message": "Password has been reset successfully"
    }))
}

/// GET /api/auth/verify - Vérifier un email avec le token reçu (API key optionnelle:
/// le lien peut être ouvert directement depuis la boîte mail, sans header)
#[get("/verify")]
pub async fn verify_email(
    OptionalAuthApp(app): OptionalAuthApp,
    query: web::Query<VerifyEmailQuery>,
    db: web::Data<DatabaseConnection>,
) -> HttpResponse {
    // 1. Le token est obligatoire
    let token = match query.token.as_deref() {
        Some(token) if !token.is_empty() => token,
        _ => {
            return HttpResponse::BadRequest().json(serde_json::json!({
                "error": "Validation Error",
                "message": "Verification token is required"
            }));
        }
    };

    // 2. Trouver le user porteur de ce token, non expiré
    let user = match token_service::find_user_by_token(
        db.get_ref(),
        app.as_ref().map(|app| app.id),
        TokenKind::EmailVerification,
        token,
    ).await {
        Ok(Some(user)) => user,
        Ok(None) => return invalid_or_expired("Email verification token is invalid or has expired"),
        Err(e) => return db_error(e),
    };

    // 3. Consommer le token et marquer l'email vérifié
    let consumed = match token_service::consume_token(
        db.get_ref(),
        user.id,
        TokenKind::EmailVerification,
        token,
        vec![(UserColumn::EmailVerified, Value::from(true))],
    ).await {
        Ok(consumed) => consumed,
        Err(e) => return db_error(e),
    };

    if !consumed {
        return invalid_or_expired("Email verification token is invalid or has expired");
    }

    HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "message": "Email verified successfully"
    }))
}

/// POST /api/auth/magic-link - Demander un magic link (X-API-Key)
/// Crée le compte au passage s'il n'existe pas encore (sans mot de passe)
#[post("/magic-link")]
pub async fn magic_link(
    AuthApp(app): AuthApp,
    body: web::Json<MagicLinkRequest>,
    db: web::Data<DatabaseConnection>,
    config: web::Data<Config>,
) -> HttpResponse {
    // 1. Valider le payload
    if let Err(errors) = body.validate() {
        return validation_error(&errors);
    }

    let user_email = email::normalize_email(&body.email);

    // 2. Upsert: réutiliser le user existant ou le créer sans mot de passe
    let existing_user = match Users::find()
        .filter(UserColumn::AppId.eq(app.id))
        .filter(UserColumn::Email.eq(&user_email))
        .one(db.get_ref())
        .await
    {
        Ok(user) => user,
        Err(e) => return db_error(e),
    };

    let (user, is_new_user) = match existing_user {
        Some(user) => (user, false),
        None => {
            let new_user = UserActiveModel {
                app_id: Set(app.id),
                email: Set(user_email),
                password_hash: Set(None),
                first_name: Set(body.first_name.as_deref().map(|name| name.trim().to_string())),
                last_name: Set(body.last_name.as_deref().map(|name| name.trim().to_string())),
                email_verified: Set(false),
                ..Default::default()
            };

            match new_user.insert(db.get_ref()).await {
                Ok(user) => (user, true),
                Err(e) => return db_error(e),
            }
        }
    };

    // 3. Émettre le token de magic link
    let magic_token = match token_service::issue_token(
        db.get_ref(),
        config.get_ref(),
        user.id,
        TokenKind::MagicLink,
    ).await {
        Ok(token) => token,
        Err(e) => return db_error(e),
    };

    // 4. Envoyer l'email; échec fatal: le magic link est le SEUL chemin
    // vers ce token, le perdre en silence bloquerait le user
    if let Err(e) = email::send_magic_link_email(
        config.get_ref(),
        &app,
        &user.email,
        user.first_name.as_deref(),
        &magic_token,
        is_new_user,
    ).await {
        eprintln!("Failed to send magic link email: {}", e);
        return HttpResponse::InternalServerError().json(serde_json::json!({
            "error": "Email Error",
            "message": "Failed to send magic link email. Please try again."
        }));
    }

    HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "message": "Magic link sent! Please check your email.",
        "isNewUser": is_new_user
    }))
}

/// POST /api/auth/magic-link/verify - Se connecter avec un magic link (X-API-Key)
#[post("/magic-link/verify")]
pub async fn magic_link_verify(
    AuthApp(app): AuthApp,
    body: web::Json<MagicVerifyRequest>,
    db: web::Data<DatabaseConnection>,
    config: web::Data<Config>,
) -> HttpResponse {
    // 1. Valider le payload
    if let Err(errors) = body.validate() {
        return validation_error(&errors);
    }

    // 2. Trouver le user porteur de ce token, non expiré
    let user = match token_service::find_user_by_token(
        db.get_ref(),
        Some(app.id),
        TokenKind::MagicLink,
        &body.token,
    ).await {
        Ok(Some(user)) => user,
        Ok(None) => return invalid_or_expired("Magic link token is invalid or has expired"),
        Err(e) => return db_error(e),
    };

    // 3. Consommer le token; posséder le lien prouve l'accès à la boîte
    // mail, donc l'email passe vérifié quel que soit son état d'avant
    let consumed = match token_service::consume_token(
        db.get_ref(),
        user.id,
        TokenKind::MagicLink,
        &body.token,
        vec![(UserColumn::EmailVerified, Value::from(true))],
    ).await {
        Ok(consumed) => consumed,
        Err(e) => return db_error(e),
    };

    if !consumed {
        return invalid_or_expired("Magic link token is invalid or has expired");
    }

    // 4. Générer le JWT de session dans la même réponse
    let token = match jwt::generate_token(config.get_ref(), user.id, &user.email) {
        Ok(token) => token,
        Err(e) => {
            eprintln!("Failed to generate token: {}", e);
            return HttpResponse::InternalServerError().json(serde_json::json!({
                "error": "Internal Server Error",
                "message": "Something went wrong"
            }));
        }
    };

    let mut user = user;
    user.email_verified = true;

    HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "message": "Magic link verified successfully",
        "token": token,
        "user": UserResponse::from(user)
    }))
}

pub fn auth_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/auth")
            .service(register)
            .service(login)
            .service(forgot_password)
            .service(reset_password)
            .service(verify_email)
            .service(magic_link)
            .service(magic_link_verify)
    );
}
