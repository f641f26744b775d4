// ============================================================================
// SERVICE : TOKENS À USAGE UNIQUE
// ============================================================================
//
// Description:
//   Routine générique issue/redeem pour les trois slots de token du user
//   (email verification, password reset, magic link). Chaque kind choisit
//   ses colonnes et son TTL; la logique est identique pour les trois.
//
// Workflow (redeem):
//   1. SELECT du user dont le slot contient CE token ET expires > now
//   2. UPDATE conditionnel (id + token + not expired) qui vide le slot et
//      applique la mutation propre au kind (email_verified, password_hash)
//   3. rows_affected == 0 => un redeem concurrent a gagné, même réponse
//      qu'un token inconnu ou expiré
//
// Points d'attention:
//   - ne JAMAIS distinguer "token inconnu" de "token expiré" côté caller
//   - l'UPDATE conditionnel est la seule écriture: pas de fenêtre où deux
//     redeems concurrents peuvent réussir tous les deux
//   - émettre un nouveau token écrase le précédent (au plus un actif par slot)
//
// ============================================================================

use chrono::{Duration, Utc};
use sea_orm::{ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, Value};
use sea_orm::sea_query::Expr;

use crate::config::Config;
use crate::models::users::{self, Column as UserColumn, Entity as Users};
use crate::utils::jwt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    EmailVerification,
    PasswordReset,
    MagicLink,
}

impl TokenKind {
    fn columns(&self) -> (UserColumn, UserColumn) {
        match self {
            TokenKind::EmailVerification => (
                UserColumn::EmailVerificationToken,
                UserColumn::EmailVerificationExpires,
            ),
            TokenKind::PasswordReset => (
                UserColumn::PasswordResetToken,
                UserColumn::PasswordResetExpires,
            ),
            TokenKind::MagicLink => (
                UserColumn::MagicLinkToken,
                UserColumn::MagicLinkExpires,
            ),
        }
    }

    pub fn expires_minutes(&self, config: &Config) -> i64 {
        match self {
            TokenKind::EmailVerification => config.email_verification_expires_minutes,
            TokenKind::PasswordReset => config.password_reset_expires_minutes,
            TokenKind::MagicLink => config.magic_link_expires_minutes,
        }
    }
}

/// Génère un token opaque et le place dans le slot du user.
/// Écrase le token précédent du même kind: en émettre un nouveau
/// invalide l'ancien même s'il n'était pas expiré.
pub async fn issue_token(
    db: &DatabaseConnection,
    config: &Config,
    user_id: i32,
    kind: TokenKind,
) -> Result<String, DbErr> {
    let token = jwt::generate_secure_token();
    let expires = (Utc::now() + Duration::minutes(kind.expires_minutes(config))).naive_utc();
    let (token_col, expires_col) = kind.columns();

    Users::update_many()
        .col_expr(token_col, Expr::value(Value::from(token.clone())))
        .col_expr(expires_col, Expr::value(Value::from(expires)))
        .filter(UserColumn::Id.eq(user_id))
        .exec(db)
        .await?;

    Ok(token)
}

/// Cherche le user dont le slot contient ce token, non expiré.
/// `app_id` est None uniquement pour la vérification d'email, dont le lien
/// peut être ouvert sans header X-API-Key (le token suffit, il est unique).
pub async fn find_user_by_token(
    db: &DatabaseConnection,
    app_id: Option<i32>,
    kind: TokenKind,
    token: &str,
) -> Result<Option<users::Model>, DbErr> {
    let (token_col, expires_col) = kind.columns();

    let mut query = Users::find()
        .filter(token_col.eq(token))
        .filter(expires_col.gt(Utc::now().naive_utc()));

    if let Some(app_id) = app_id {
        query = query.filter(UserColumn::AppId.eq(app_id));
    }

    query.one(db).await
}

/// Consomme un token: vide le slot et applique les mutations du kind en un
/// seul UPDATE conditionnel. Retourne false si le token n'était déjà plus
/// dans le slot (redeem concurrent, nouveau token émis entre-temps...).
pub async fn consume_token(
    db: &DatabaseConnection,
    user_id: i32,
    kind: TokenKind,
    token: &str,
    mutations: Vec<(UserColumn, Value)>,
) -> Result<bool, DbErr> {
    let (token_col, expires_col) = kind.columns();

    let mut update = Users::update_many()
        .col_expr(token_col, Expr::value(Value::String(None)))
        .col_expr(expires_col, Expr::value(Value::ChronoDateTime(None)));

    for (column, value) in mutations {
        update = update.col_expr(column, Expr::value(value));
    }

    let result = update
        .filter(UserColumn::Id.eq(user_id))
        .filter(token_col.eq(token))
        .filter(expires_col.gt(Utc::now().naive_utc()))
        .exec(db)
        .await?;

    Ok(result.rows_affected == 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

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

    fn test_user() -> users::Model {
        users::Model {
            id: 42,
            app_id: 1,
            email: "alice@example.com".to_string(),
            password_hash: None,
            first_name: None,
            last_name: None,
            email_verified: false,
            email_verification_token: Some("aa".repeat(32)),
            email_verification_expires: Some(
                (Utc::now() + Duration::minutes(30)).naive_utc(),
            ),
            password_reset_token: None,
            password_reset_expires: None,
            magic_link_token: None,
            magic_link_expires: None,
            created_at: None,
        }
    }

    #[tokio::test]
    async fn test_issue_token_returns_opaque_hex() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 1,
            }])
            .into_connection();

        let token = issue_token(&db, &test_config(), 42, TokenKind::PasswordReset)
            .await
            .unwrap();

        assert_eq!(token.len(), 64);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[tokio::test]
    async fn test_find_user_by_token_hit_and_miss() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![test_user()], vec![]])
            .into_connection();

        let found = find_user_by_token(&db, Some(1), TokenKind::EmailVerification, &"aa".repeat(32))
            .await
            .unwrap();
        assert_eq!(found.map(|user| user.id), Some(42));

        let missing = find_user_by_token(&db, Some(1), TokenKind::EmailVerification, "deadbeef")
            .await
            .unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn test_consume_token_single_use() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results([
                MockExecResult { last_insert_id: 0, rows_affected: 1 },
                MockExecResult { last_insert_id: 0, rows_affected: 0 },
            ])
            .into_connection();

        let token = "aa".repeat(32);
        let mutations = vec![(UserColumn::EmailVerified, Value::from(true))];

        // premier redeem: le slot contient encore le token
        let first = consume_token(&db, 42, TokenKind::EmailVerification, &token, mutations.clone())
            .await
            .unwrap();
        assert!(first);

        // deuxième redeem du même token: le slot est déjà vidé
        let second = consume_token(&db, 42, TokenKind::EmailVerification, &token, mutations)
            .await
            .unwrap();
        assert!(!second);
    }
}
