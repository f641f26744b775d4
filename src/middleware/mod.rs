pub mod auth;
pub mod app_auth;

pub use auth::{AuthUser, VerifiedUser};
pub use app_auth::{AuthApp, OptionalAuthApp};
