//! Adapters layer: Concrete implementations of ports.
//!
//! - `sqlite`: SQLite document store for every collection
//! - `credentials`: Argon2id digests and Ed25519-signed session tokens
//! - `sanitize`: PII filtering for logs

pub mod credentials;
pub mod sanitize;
pub mod sqlite;

pub use credentials::{LocalCredentialStore, PasswordCost, TokenSeed, DEFAULT_TOKEN_TTL_HOURS};
pub use sqlite::SqliteStorage;
