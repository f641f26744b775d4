use actix_web::{dev::Payload, web, Error, FromRequest, HttpRequest, HttpResponse};
use futures::future::LocalBoxFuture;
use sea_orm::{DatabaseConnection, EntityTrait};

use crate::config::Config;
use crate::models::users::{self, Entity as Users};
use crate::utils::jwt::{self, TokenError};

/// Utilisateur authentifié par Bearer token
/// Le user est relu en BD à chaque requête: on ne fait jamais confiance
/// aux claims pour des champs qui changent (email_verified notamment)
#[derive(Debug, Clone)]
pub struct AuthUser(pub users::Model);

/// AuthUser dont l'email est vérifié (routes sensibles)
#[derive(Debug, Clone)]
pub struct VerifiedUser(pub users::Model);

fn unauthorized(error: &str, message: &str) -> Error {
    let response = HttpResponse::Unauthorized().json(serde_json::json!({
        "error": error,
        "message": message
    }));
    actix_web::error::InternalError::from_response("", response).into()
}

impl FromRequest for AuthUser {
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let req = req.clone();
        Box::pin(async move {
            // 1. Extraire le token du header Authorization (format: "Bearer <token>")
            let auth_header = req
                .headers()
                .get("Authorization")
                .and_then(|header| header.to_str().ok());

            let token = match auth_header.and_then(|value| value.strip_prefix("Bearer ")) {
                Some(token) => token.to_string(),
                None => {
                    return Err(unauthorized(
                        "Access Denied",
                        "No authentication token provided",
                    ));
                }
            };

            // 2. Vérifier le JWT de session
            let config = match req.app_data::<web::Data<Config>>() {
                Some(config) => config.clone(),
                None => {
                    return Err(unauthorized(
                        "Invalid Token",
                        "Please provide a valid authentication token",
                    ));
                }
            };

            let claims = match jwt::verify_token(config.get_ref(), &token) {
                Ok(claims) => claims,
                Err(TokenError::Expired) => {
                    return Err(unauthorized(
                        "Token Expired",
                        "Your session has expired. Please log in again",
                    ));
                }
                Err(TokenError::Invalid) => {
                    return Err(unauthorized(
                        "Invalid Token",
                        "Please provide a valid authentication token",
                    ));
                }
            };

            // 3. Relire le user en BD (les claims peuvent être périmés)
            let db = match req.app_data::<web::Data<DatabaseConnection>>() {
                Some(db) => db.clone(),
                None => {
                    return Err(unauthorized("Invalid Token", "User not found"));
                }
            };

            match Users::find_by_id(claims.sub).one(db.get_ref()).await {
                Ok(Some(user)) => Ok(AuthUser(user)),
                Ok(None) => Err(unauthorized("Invalid Token", "User not found")),
                Err(e) => {
                    eprintln!("User authentication error: {}", e);
                    Err(unauthorized("Invalid Token", "User not found"))
                }
            }
        })
    }
}

impl FromRequest for VerifiedUser {
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let auth = AuthUser::from_request(req, &mut Payload::None);
        Box::pin(async move {
            let AuthUser(user) = auth.await?;

            if !user.email_verified {
                let response = HttpResponse::Forbidden().json(serde_json::json!({
                    "error": "Email Verification Required",
                    "message": "Please verify your email address before accessing this resource"
                }));
                return Err(actix_web::error::InternalError::from_response("", response).into());
            }

            Ok(VerifiedUser(user))
        })
    }
}
