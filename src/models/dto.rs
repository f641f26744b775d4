//pour les réponses structurées de l'API (jamais de password_hash ni de tokens)
use serde::Serialize;
use chrono::NaiveDateTime;

use super::{apps, users};

// 1 user tel qu'exposé par l'API
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: i32,
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email_verified: bool,
    pub created_at: Option<NaiveDateTime>,
}

impl From<users::Model> for UserResponse {
    fn from(user: users::Model) -> Self {
        UserResponse {
            id: user.id,
            email: user.email,
            first_name: user.first_name,
            last_name: user.last_name,
            email_verified: user.email_verified,
            created_at: user.created_at,
        }
    }
}

// 1 app après enregistrement (seule réponse qui expose l'API key)
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppResponse {
    pub id: i32,
    pub name: String,
    pub domain: String,
    pub api_key: String,
    pub created_at: Option<NaiveDateTime>,
}

impl From<apps::Model> for AppResponse {
    fn from(app: apps::Model) -> Self {
        AppResponse {
            id: app.id,
            name: app.name,
            domain: app.domain,
            api_key: app.api_key,
            created_at: app.created_at,
        }
    }
}

// info app pour GET /api/apps/verify (sans API key, avec compteur d'users)
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppInfoResponse {
    pub id: i32,
    pub name: String,
    pub domain: String,
    pub created_at: Option<NaiveDateTime>,
    pub user_count: u64,
}
