// Service exports
pub mod auth;
pub mod postgres;
pub mod store;

pub use auth::{hash_password, verify_password, AuthError, Claims, JwtManager};
pub use postgres::{NewUser, PostgresClient};
pub use store::{MatchStore, StoreError};
