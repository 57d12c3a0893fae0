//! Credential port: password digests and signed session tokens.

use serde::{Deserialize, Serialize};

/// Errors from the credential store.
#[derive(Debug, thiserror::Error)]
pub enum CredentialError {
    #[error("Token has expired")]
    Expired,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Password hashing failed: {0}")]
    Hashing(String),

    #[error("Token encoding failed: {0}")]
    Encoding(String),

    #[error("Invalid signing key: {0}")]
    InvalidKey(String),
}

/// Claims embedded in a session token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenClaims {
    pub user_id: String,
    pub is_admin: bool,
    pub is_doctor: bool,
    /// Expiry as Unix seconds
    pub exp: i64,
}

/// Trait for password hashing and token issuance.
pub trait CredentialStore: Send + Sync {
    /// Hash a password into a self-describing digest.
    ///
    /// # Errors
    /// Returns error if the hasher rejects its parameters.
    fn hash_password(&self, password: &str) -> Result<String, CredentialError>;

    /// Check a password against a digest. Malformed digests never verify.
    fn verify_password(&self, password: &str, digest: &str) -> bool;

    /// Issue a signed token for `user_id` with the given role flags.
    ///
    /// # Errors
    /// Returns error if the claims cannot be encoded.
    fn issue_token(
        &self,
        user_id: &str,
        is_admin: bool,
        is_doctor: bool,
    ) -> Result<String, CredentialError>;

    /// Verify signature and expiry, returning the embedded claims.
    ///
    /// # Errors
    /// `Expired` for a well-signed but stale token, `InvalidToken` otherwise.
    fn verify_token(&self, token: &str) -> Result<TokenClaims, CredentialError>;
}
