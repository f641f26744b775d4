// ============================================================================
// MODELS - MODULE PRINCIPAL
// ============================================================================
//
// Description:
//   Point d'entrée pour tous les modèles de données.
//   Chaque modèle correspond à une table PostgreSQL avec SeaORM.
//
// Liste des modules:
//   - health : Health check API
//   - dto : Data Transfer Objects pour les réponses API
//   - apps : Applications clientes (tenants, authentifiées par API key)
//   - users : Utilisateurs finaux, isolés par app (password + magic link)
//
// Points d'attention:
//   - Tous les modèles utilisent SeaORM (pas de SQL brut)
//   - Les tokens à usage unique vivent comme colonnes de users
//     (un slot par type: verification / reset / magic link)
//   - Les relations entre tables sont définies dans chaque modèle
//
// ============================================================================

pub mod health;
pub mod dto;
pub mod apps;
pub mod users;
