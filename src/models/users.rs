// ============================================================================
// MODÈLE : USERS
// ============================================================================
//
// Description:
//   Modèle de la table users. Un user appartient toujours à exactement une
//   app (tenant): le même email peut exister sous deux apps différentes,
//   avec credentials et état de vérification indépendants.
//
// Colonnes de la table users:
//   - id (INTEGER, PRIMARY KEY, SERIAL)
//   - app_id (INTEGER, NOT NULL, FK vers apps)
//   - email (VARCHAR, NOT NULL) - normalisé (minuscules, alias + retiré)
//   - password_hash (VARCHAR, NULL) - NULL pour les comptes magic-link-only
//   - first_name / last_name (VARCHAR, NULL)
//   - email_verified (BOOLEAN, DEFAULT FALSE, NOT NULL)
//   - email_verification_token / _expires (VARCHAR / TIMESTAMP, NULL)
//   - password_reset_token / _expires (VARCHAR / TIMESTAMP, NULL)
//   - magic_link_token / _expires (VARCHAR / TIMESTAMP, NULL)
//   - created_at (TIMESTAMP, DEFAULT CURRENT_TIMESTAMP)
//   - UNIQUE (app_id, email)
//
// Points d'attention:
//   - chaque slot (token, expires) contient au plus un token actif:
//     en émettre un nouveau écrase et invalide le précédent
//   - un slot est vidé (NULL, NULL) quand son token est consommé
//   - la consommation se fait en un seul UPDATE conditionnel (voir
//     services/token_service.rs) pour que deux redeems concurrents ne
//     puissent pas réussir tous les deux
//
// ============================================================================

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub app_id: i32,

    pub email: String,

    #[serde(skip_serializing)] // Ne jamais exposer le hash en JSON
    pub password_hash: Option<String>,

    pub first_name: Option<String>,

    pub last_name: Option<String>,

    pub email_verified: bool,

    #[serde(skip_serializing)]
    pub email_verification_token: Option<String>,

    #[serde(skip_serializing)]
    pub email_verification_expires: Option<DateTime>,

    #[serde(skip_serializing)]
    pub password_reset_token: Option<String>,

    #[serde(skip_serializing)]
    pub password_reset_expires: Option<DateTime>,

    #[serde(skip_serializing)]
    pub magic_link_token: Option<String>,

    #[serde(skip_serializing)]
    pub magic_link_expires: Option<DateTime>,

    pub created_at: Option<DateTime>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::apps::Entity",
        from = "Column::AppId",
        to = "super::apps::Column::Id"
    )]
    App,
}

impl Related<super::apps::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::App.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
