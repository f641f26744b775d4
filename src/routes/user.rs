use actix_web::{get, web, HttpResponse};

use crate::middleware::{AuthUser, VerifiedUser};
use crate::models::dto::UserResponse;

/// GET /api/user/me - Infos du user courant (PROTÉGÉE)
#[get("/me")]
pub async fn me(AuthUser(user): AuthUser) -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "user": UserResponse::from(user)
    }))
}

/// GET /api/user/profile - Profil du user courant (PROTÉGÉE + email vérifié)
#[get("/profile")]
pub async fn profile(VerifiedUser(user): VerifiedUser) -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "message": "Profile access granted",
        "user": UserResponse::from(user)
    }))
}

pub fn user_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/user")
            .service(me)
            .service(profile)
    );
}

#[cfg(test)]
mod tests {
    use actix_web::{test, web, App};
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase};

    use crate::config::Config;
    use crate::models::users;
    use crate::utils::jwt;

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

    fn test_user(email_verified: bool) -> users::Model {
        users::Model {
            id: 42,
            app_id: 1,
            email: "alice@example.com".to_string(),
            password_hash: None,
            first_name: Some("Alice".to_string()),
            last_name: None,
            email_verified,
            email_verification_token: None,
            email_verification_expires: None,
            password_reset_token: None,
            password_reset_expires: None,
            magic_link_token: None,
            magic_link_expires: None,
            created_at: Some(Utc::now().naive_utc()),
        }
    }

    #[actix_web::test]
    async fn test_me_without_token() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(db))
                .app_data(web::Data::new(test_config()))
                .configure(crate::routes::configure_routes),
        ).await;

        let req = test::TestRequest::get().uri("/api/user/me").to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), 401);
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["error"], "Access Denied");
    }

    #[actix_web::test]
    async fn test_me_with_valid_token() {
        let config = test_config();
        let token = jwt::generate_token(&config, 42, "alice@example.com").unwrap();

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![test_user(true)]])
            .into_connection();
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(db))
                .app_data(web::Data::new(config))
                .configure(crate::routes::configure_routes),
        ).await;

        let req = test::TestRequest::get()
            .uri("/api/user/me")
            .insert_header(("Authorization", format!("Bearer {}", token)))
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), 200);
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["user"]["id"], 42);
        assert_eq!(body["user"]["email"], "alice@example.com");
        // le hash et les slots de token ne sont jamais exposés
        assert!(body["user"].get("passwordHash").is_none());
        assert!(body["user"].get("password_hash").is_none());
    }

    #[actix_web::test]
    async fn test_profile_requires_verified_email() {
        let config = test_config();
        let token = jwt::generate_token(&config, 42, "alice@example.com").unwrap();

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![test_user(false)]])
            .into_connection();
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(db))
                .app_data(web::Data::new(config))
                .configure(crate::routes::configure_routes),
        ).await;

        let req = test::TestRequest::get()
            .uri("/api/user/profile")
            .insert_header(("Authorization", format!("Bearer {}", token)))
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), 403);
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["error"], "Email Verification Required");
    }

    #[actix_web::test]
    async fn test_me_with_stale_token() {
        let config = test_config();
        let token = jwt::generate_token(&config, 42, "alice@example.com").unwrap();

        // le user référencé par le token n'existe plus
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<users::Model>::new()])
            .into_connection();
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(db))
                .app_data(web::Data::new(config))
                .configure(crate::routes::configure_routes),
        ).await;

        let req = test::TestRequest::get()
            .uri("/api/user/me")
            .insert_header(("Authorization", format!("Bearer {}", token)))
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), 401);
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["message"], "User not found");
    }
}
