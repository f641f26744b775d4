use actix_web::{dev::Payload, web, Error, FromRequest, HttpRequest, HttpResponse};
use futures::future::LocalBoxFuture;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};

use crate::models::apps::{self, Column as AppColumn, Entity as Apps};

/// App authentifiée via le header X-API-Key
/// Toutes les routes /api/auth passent par cet extracteur: le contexte
/// tenant est résolu AVANT toute lecture/écriture de users
#[derive(Debug, Clone)]
pub struct AuthApp(pub apps::Model);

/// Variante optionnelle: sans header, pas de contexte app;
/// mais si une clé est fournie, elle doit être valide
#[derive(Debug, Clone)]
pub struct OptionalAuthApp(pub Option<apps::Model>);

fn unauthorized(error: &str, message: &str) -> Error {
    let response = HttpResponse::Unauthorized().json(serde_json::json!({
        "error": error,
        "message": message
    }));
    actix_web::error::InternalError::from_response("", response).into()
}

fn authentication_error() -> Error {
    let response = HttpResponse::InternalServerError().json(serde_json::json!({
        "error": "Authentication Error",
        "message": "Failed to authenticate app"
    }));
    actix_web::error::InternalError::from_response("", response).into()
}

async fn lookup_app(req: HttpRequest, api_key: String) -> Result<apps::Model, Error> {
    let db = match req.app_data::<web::Data<DatabaseConnection>>() {
        Some(db) => db.clone(),
        None => return Err(authentication_error()),
    };

    match Apps::find()
        .filter(AppColumn::ApiKey.eq(api_key))
        .one(db.get_ref())
        .await
    {
        Ok(Some(app)) => Ok(app),
        Ok(None) => Err(unauthorized(
            "Invalid API Key",
            "The provided API key is not valid",
        )),
        Err(e) => {
            eprintln!("App authentication error: {}", e);
            Err(authentication_error())
        }
    }
}

impl FromRequest for AuthApp {
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let req = req.clone();
        Box::pin(async move {
            // 1. Extraire le header X-API-Key
            let api_key = match req.headers().get("X-API-Key").and_then(|h| h.to_str().ok()) {
                Some(key) => key.to_string(),
                None => {
                    return Err(unauthorized(
                        "API Key Required",
                        "X-API-Key header is required",
                    ));
                }
            };

            // 2. Résoudre l'app propriétaire de la clé
            let app = lookup_app(req, api_key).await?;
            Ok(AuthApp(app))
        })
    }
}

impl FromRequest for OptionalAuthApp {
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let req = req.clone();
        Box::pin(async move {
            // Pas de header => pas de contexte app, la route reste accessible
            let api_key = match req.headers().get("X-API-Key").and_then(|h| h.to_str().ok()) {
                Some(key) => key.to_string(),
                None => return Ok(OptionalAuthApp(None)),
            };

            // Une clé fournie doit être valide
            let app = lookup_app(req, api_key).await?;
            Ok(OptionalAuthApp(Some(app)))
        })
    }
}
