use actix_web::{post, get, web, HttpResponse};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait,
    QueryFilter, Set,
};
use serde::Deserialize;
use validator::{Validate, ValidationError};

use crate::middleware::AuthApp;
use crate::models::apps::{ActiveModel as AppActiveModel, Column as AppColumn, Entity as Apps};
use crate::models::dto::{AppInfoResponse, AppResponse};
use crate::models::users::{Column as UserColumn, Entity as Users};
use crate::routes::{db_error, validation_error};
use crate::utils::jwt;

// DTO pour l'enregistrement d'une app
#[derive(Deserialize, Validate)]
pub struct RegisterAppRequest {
    #[validate(length(min = 1, max = 100, message = "App name is required"))]
    pub name: String,
    #[validate(
        url(message = "Domain must be a valid URL (http:// or https://)"),
        custom(function = validate_http_scheme, message = "Domain must be a valid URL (http:// or https://)")
    )]
    pub domain: String,
}

// le crate validator accepte n'importe quel scheme d'URL, on restreint à http(s)
fn validate_http_scheme(domain: &str) -> Result<(), ValidationError> {
    let lowered = domain.to_lowercase();
    if lowered.starts_with("http://") || lowered.starts_with("https://") {
        Ok(())
    } else {
        Err(ValidationError::new("scheme"))
    }
}

/// POST /api/apps/register - Enregistrer une app et obtenir son API key (PUBLIC)
#[post("/register")]
pub async fn register_app(
    body: web::Json<RegisterAppRequest>,
    db: web::Data<DatabaseConnection>,
) -> HttpResponse {
    // 1. Valider le payload
    if let Err(errors) = body.validate() {
        return validation_error(&errors);
    }

    // le domain sert d'identité: toujours comparé en minuscules
    let domain = body.domain.trim().to_lowercase();

    // 2. Vérifier que le domain n'est pas déjà enregistré
    let existing_app = Apps::find()
        .filter(AppColumn::Domain.eq(&domain))
        .one(db.get_ref())
        .await;

    match existing_app {
        Ok(Some(_)) => {
            return HttpResponse::BadRequest().json(serde_json::json!({
                "error": "Domain Already Registered",
                "message": "An app with this domain already exists"
            }));
        }
        Err(e) => return db_error(e),
        _ => {}
    }

    // 3. Générer l'API key
    let api_key = format!("app_{}", jwt::generate_secure_token());

    // 4. Créer l'app
    let new_app = AppActiveModel {
        name: Set(body.name.trim().to_string()),
        domain: Set(domain),
        api_key: Set(api_key),
        ..Default::default()
    };

    let app = match new_app.insert(db.get_ref()).await {
        Ok(app) => app,
        Err(e) => return db_error(e),
    };

    // 5. Retourner l'app avec son API key (seule fois où elle est exposée)
    HttpResponse::Created().json(serde_json::json!({
        "success": true,
        "message": "App registered successfully",
        "app": AppResponse::from(app)
    }))
}

/// GET /api/apps/verify - Vérifier une API key et obtenir l'app (X-API-Key)
#[get("/verify")]
pub async fn verify_app(
    AuthApp(app): AuthApp,
    db: web::Data<DatabaseConnection>,
) -> HttpResponse {
    let user_count = match Users::find()
        .filter(UserColumn::AppId.eq(app.id))
        .count(db.get_ref())
        .await
    {
        Ok(count) => count,
        Err(e) => return db_error(e),
    };

    HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "app": AppInfoResponse {
            id: app.id,
            name: app.name,
            domain: app.domain,
            created_at: app.created_at,
            user_count,
        }
    }))
}

pub fn apps_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/apps")
            .service(register_app)
            .service(verify_app)
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_scheme_validation() {
        assert!(validate_http_scheme("https://demo.example.com").is_ok());
        assert!(validate_http_scheme("http://localhost:3000").is_ok());
        assert!(validate_http_scheme("ftp://demo.example.com").is_err());
        assert!(validate_http_scheme("demo.example.com").is_err());
    }
}
