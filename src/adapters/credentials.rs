//! Local credential store: Argon2id password digests and Ed25519-signed
//! session tokens.
//!
//! Digests are PHC strings, so the cost parameters travel with each digest
//! and old digests keep verifying after the defaults change.
//!
//! Tokens use the compact JWT layout `header.claims.signature`, each part
//! base64url without padding, with header `{"alg":"EdDSA","typ":"JWT"}`.

use argon2::password_hash::SaltString;
use argon2::{Algorithm, Argon2, Params, PasswordHash, PasswordHasher, PasswordVerifier, Version};
use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};
use base64::Engine;
use chrono::{DateTime, Duration, Utc};
use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use rand::rngs::OsRng;
use rand::RngCore;
use serde::Deserialize;
use sha2::{Digest, Sha256};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::ports::{CredentialError, CredentialStore, TokenClaims};

const TOKEN_HEADER: &str = r#"{"alg":"EdDSA","typ":"JWT"}"#;
const TOKEN_ALG: &str = "EdDSA";

/// Default session lifetime.
pub const DEFAULT_TOKEN_TTL_HOURS: i64 = 24;

/// Argon2id cost parameters for new digests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PasswordCost {
    /// Memory in KiB
    pub m_cost: u32,
    pub t_cost: u32,
    pub p_cost: u32,
}

impl Default for PasswordCost {
    fn default() -> Self {
        Self {
            m_cost: 47104,
            t_cost: 1,
            p_cost: 1,
        }
    }
}

impl PasswordCost {
    /// Minimal parameters for tests.
    #[cfg(test)]
    pub(crate) fn cheap() -> Self {
        Self {
            m_cost: 8,
            t_cost: 1,
            p_cost: 1,
        }
    }
}

/// 32-byte Ed25519 seed used to sign session tokens.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct TokenSeed([u8; 32]);

impl TokenSeed {
    /// Fresh seed from OS entropy.
    #[must_use]
    pub fn generate() -> Self {
        let mut seed = [0u8; 32];
        OsRng.fill_bytes(&mut seed);
        Self(seed)
    }

    /// Decode a standard-base64 seed.
    ///
    /// # Errors
    /// Returns `InvalidKey` unless the input decodes to exactly 32 bytes.
    pub fn from_b64(b64: &str) -> Result<Self, CredentialError> {
        let mut bytes = STANDARD
            .decode(b64.trim())
            .map_err(|_| CredentialError::InvalidKey("seed is not valid base64".into()))?;

        let result = <[u8; 32]>::try_from(bytes.as_slice())
            .map(Self)
            .map_err(|_| CredentialError::InvalidKey(format!("expected 32 bytes, got {}", bytes.len())));
        bytes.zeroize();
        result
    }

    #[must_use]
    pub fn to_b64(&self) -> String {
        STANDARD.encode(self.0)
    }

    /// Identifier for the derived verifying key: the first 8 bytes of its
    /// SHA-256, hex encoded. Not secret.
    #[must_use]
    pub fn fingerprint(&self) -> String {
        let verifying_key = SigningKey::from_bytes(&self.0).verifying_key();
        Sha256::digest(verifying_key.as_bytes())[..8]
            .iter()
            .map(|b| format!("{b:02x}"))
            .collect()
    }
}

#[derive(Deserialize)]
struct TokenHeader {
    alg: String,
}

/// Credential store backed by in-process keys.
pub struct LocalCredentialStore {
    argon2: Argon2<'static>,
    signing_key: SigningKey,
    verifying_key: VerifyingKey,
    token_ttl: Duration,
}

impl LocalCredentialStore {
    /// # Errors
    /// Returns `Hashing` if the Argon2 parameters are out of range.
    pub fn new(
        seed: &TokenSeed,
        cost: PasswordCost,
        token_ttl: Duration,
    ) -> Result<Self, CredentialError> {
        let params = Params::new(cost.m_cost, cost.t_cost, cost.p_cost, None)
            .map_err(|e| CredentialError::Hashing(format!("Invalid Argon2 params: {e}")))?;
        let signing_key = SigningKey::from_bytes(&seed.0);

        Ok(Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
            verifying_key: signing_key.verifying_key(),
            signing_key,
            token_ttl,
        })
    }

    /// Issue a token as if the current time were `now`.
    ///
    /// # Errors
    /// Returns `Encoding` if the claims cannot be serialized.
    pub fn issue_token_at(
        &self,
        user_id: &str,
        is_admin: bool,
        is_doctor: bool,
        now: DateTime<Utc>,
    ) -> Result<String, CredentialError> {
        let claims = TokenClaims {
            user_id: user_id.to_string(),
            is_admin,
            is_doctor,
            exp: (now + self.token_ttl).timestamp(),
        };
        let claims_json =
            serde_json::to_vec(&claims).map_err(|e| CredentialError::Encoding(e.to_string()))?;

        let signing_input = format!(
            "{}.{}",
            URL_SAFE_NO_PAD.encode(TOKEN_HEADER),
            URL_SAFE_NO_PAD.encode(claims_json)
        );
        let signature = self.signing_key.sign(signing_input.as_bytes());

        Ok(format!(
            "{signing_input}.{}",
            URL_SAFE_NO_PAD.encode(signature.to_bytes())
        ))
    }

    /// Verify a token as if the current time were `now`.
    ///
    /// # Errors
    /// `Expired` when the signature holds but `exp` has passed,
    /// `InvalidToken` for anything else.
    pub fn verify_token_at(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<TokenClaims, CredentialError> {
        let mut parts = token.split('.');
        let (Some(header_b64), Some(claims_b64), Some(signature_b64), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(CredentialError::InvalidToken);
        };

        let header: TokenHeader = decode_segment(header_b64)?;
        if header.alg != TOKEN_ALG {
            return Err(CredentialError::InvalidToken);
        }

        let signature_bytes: [u8; 64] = URL_SAFE_NO_PAD
            .decode(signature_b64)
            .ok()
            .and_then(|bytes| bytes.try_into().ok())
            .ok_or(CredentialError::InvalidToken)?;
        let signature = Signature::from_bytes(&signature_bytes);

        let signing_input_len = header_b64.len() + 1 + claims_b64.len();
        self.verifying_key
            .verify(token[..signing_input_len].as_bytes(), &signature)
            .map_err(|_| CredentialError::InvalidToken)?;

        let claims: TokenClaims = decode_segment(claims_b64)?;
        if claims.exp <= now.timestamp() {
            return Err(CredentialError::Expired);
        }

        Ok(claims)
    }
}

fn decode_segment<T: serde::de::DeserializeOwned>(segment: &str) -> Result<T, CredentialError> {
    let bytes = URL_SAFE_NO_PAD
        .decode(segment)
        .map_err(|_| CredentialError::InvalidToken)?;
    serde_json::from_slice(&bytes).map_err(|_| CredentialError::InvalidToken)
}

impl CredentialStore for LocalCredentialStore {
    fn hash_password(&self, password: &str) -> Result<String, CredentialError> {
        let mut salt_bytes = [0u8; 16];
        OsRng.fill_bytes(&mut salt_bytes);
        let salt = SaltString::encode_b64(&salt_bytes)
            .map_err(|e| CredentialError::Hashing(e.to_string()))?;

        let digest = self
            .argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| CredentialError::Hashing(e.to_string()))?;
        Ok(digest.to_string())
    }

    fn verify_password(&self, password: &str, digest: &str) -> bool {
        PasswordHash::new(digest)
            .map(|parsed| {
                self.argon2
                    .verify_password(password.as_bytes(), &parsed)
                    .is_ok()
            })
            .unwrap_or(false)
    }

    fn issue_token(
        &self,
        user_id: &str,
        is_admin: bool,
        is_doctor: bool,
    ) -> Result<String, CredentialError> {
        self.issue_token_at(user_id, is_admin, is_doctor, Utc::now())
    }

    fn verify_token(&self, token: &str) -> Result<TokenClaims, CredentialError> {
        self.verify_token_at(token, Utc::now())
    }
}
