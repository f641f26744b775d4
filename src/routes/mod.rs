pub mod health;
pub mod apps;
pub mod auth;
pub mod user;

use actix_web::{web, HttpResponse};
use sea_orm::DbErr;
use validator::ValidationErrors;

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .service(health::health_check)
            .configure(apps::apps_routes)
            .configure(auth::auth_routes)
            .configure(user::user_routes)
    );
}

/// 400 avec le premier message de validation (format {error, message})
pub fn validation_error(errors: &ValidationErrors) -> HttpResponse {
    let message = errors
        .field_errors()
        .into_iter()
        .flat_map(|(_, field_errors)| field_errors.iter())
        .filter_map(|error| error.message.as_ref())
        .map(|message| message.to_string())
        .next()
        .unwrap_or_else(|| "Invalid request body".to_string());

    HttpResponse::BadRequest().json(serde_json::json!({
        "error": "Validation Error",
        "message": message
    }))
}

/// Erreur BD: le détail est loggé, jamais renvoyé au client.
/// Les erreurs de connexion sont signalées comme transitoires (le client
/// peut réessayer), tout le reste part en 500 générique.
pub fn db_error(e: DbErr) -> HttpResponse {
    eprintln!("Database error: {}", e);

    match e {
        DbErr::Conn(_) | DbErr::ConnectionAcquire(_) => {
            HttpResponse::ServiceUnavailable().json(serde_json::json!({
                "error": "Service Unavailable",
                "message": "Database temporarily unavailable. Please try again."
            }))
        }
        _ => HttpResponse::InternalServerError().json(serde_json::json!({
            "error": "Internal Server Error",
            "message": "Something went wrong"
        })),
    }
}
