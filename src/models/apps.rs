// ============================================================================
// MODÈLE : APPS
// ============================================================================
//
// Description:
//   Modèle de la table apps. Une app = une application cliente du service
//   (tenant), identifiée par une API key unique envoyée dans le header
//   X-API-Key. Chaque app possède sa propre population d'utilisateurs.
//
// Colonnes de la table apps:
//   - id (INTEGER, PRIMARY KEY, SERIAL)
//   - name (VARCHAR, NOT NULL)
//   - domain (VARCHAR, UNIQUE, NOT NULL) - URL absolue http(s), en minuscules
//   - api_key (VARCHAR, UNIQUE, NOT NULL) - format: app_<64 hex>
//   - from_email (VARCHAR, NULL) - expéditeur custom vérifié pour les emails
//   - from_name (VARCHAR, NULL) - nom d'affichage custom pour les emails
//   - created_at (TIMESTAMP, DEFAULT CURRENT_TIMESTAMP)
//
// Workflow:
//   1. Un développeur enregistre son app via POST /api/apps/register
//   2. Backend vérifie que le domain n'est pas déjà pris
//   3. Backend génère l'API key (app_ + 64 hex) et crée la ligne
//   4. L'app envoie ensuite X-API-Key sur toutes les routes /api/auth
//
// Points d'attention:
//   - domain et api_key sont uniques sur TOUTES les apps
//   - le domain sert aussi de base pour les liens dans les emails
//   - une app n'est jamais supprimée par cette API (action opérateur)
//
// ============================================================================

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "apps")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub name: String,

    #[sea_orm(unique)]
    pub domain: String,

    #[sea_orm(unique)]
    #[serde(skip_serializing)] // Ne jamais exposer l'API key via les modèles
    pub api_key: String,

    pub from_email: Option<String>,

    pub from_name: Option<String>,

    pub created_at: Option<DateTime>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::users::Entity")]
    Users,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Users.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
