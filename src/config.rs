//! Environment-driven server configuration.
//!
//! Plain settings come from environment variables. The token signing seed
//! is a secret and is read from, in order: an inherited file descriptor, an
//! explicit file, the Docker secrets path, and (debug builds only) an
//! environment variable.

use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use zeroize::Zeroizing;

use crate::adapters::{PasswordCost, TokenSeed, DEFAULT_TOKEN_TTL_HOURS};

const BIND_ADDR_ENV: &str = "DOCTORONCALL_BIND_ADDR";
const PORT_ENV: &str = "PORT";
const DB_PATH_ENV: &str = "DOCTORONCALL_DB_PATH";
const TOKEN_TTL_ENV: &str = "DOCTORONCALL_TOKEN_TTL_HOURS";
const ARGON2_M_COST_ENV: &str = "DOCTORONCALL_ARGON2_M_COST";
const ARGON2_T_COST_ENV: &str = "DOCTORONCALL_ARGON2_T_COST";

const TOKEN_SEED_FD_ENV: &str = "DOCTORONCALL_TOKEN_SEED_B64_FD";
const TOKEN_SEED_FILE_ENV: &str = "DOCTORONCALL_TOKEN_SEED_B64_FILE";
const TOKEN_SEED_DOCKER_SECRET_PATH: &str = "/run/secrets/doctoroncall_token_seed_b64";
const TOKEN_SEED_ENV_DEV: &str = "DOCTORONCALL_TOKEN_SEED_B64";

const DEFAULT_PORT: u16 = 8000;
const DEFAULT_DB_PATH: &str = "doctoroncall.db";

/// Configuration errors. All of them abort startup.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {name}: {value:?}")]
    Invalid { name: &'static str, value: String },

    #[error("No token signing seed configured")]
    MissingTokenSeed,

    #[error("Failed to read token signing seed: {0}")]
    SeedIo(#[from] std::io::Error),

    #[error("Invalid token signing seed: {0}")]
    InvalidSeed(String),
}

/// Non-secret server settings.
#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    pub database_path: PathBuf,
    pub token_ttl: chrono::Duration,
    pub password_cost: PasswordCost,
}

impl ServerConfig {
    /// # Errors
    /// `Invalid` for any variable that does not parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from an arbitrary variable lookup.
    ///
    /// # Errors
    /// `Invalid` for any variable that does not parse.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let bind_addr = match lookup(BIND_ADDR_ENV) {
            Some(addr) => parse(BIND_ADDR_ENV, &addr)?,
            None => {
                let port = lookup(PORT_ENV)
                    .map(|port| parse::<u16>(PORT_ENV, &port))
                    .transpose()?
                    .unwrap_or(DEFAULT_PORT);
                SocketAddr::from(([0, 0, 0, 0], port))
            }
        };

        let ttl_hours = lookup(TOKEN_TTL_ENV)
            .map(|hours| parse::<i64>(TOKEN_TTL_ENV, &hours))
            .transpose()?
            .unwrap_or(DEFAULT_TOKEN_TTL_HOURS);
        if ttl_hours <= 0 {
            return Err(ConfigError::Invalid {
                name: TOKEN_TTL_ENV,
                value: ttl_hours.to_string(),
            });
        }

        let mut password_cost = PasswordCost::default();
        if let Some(m_cost) = lookup(ARGON2_M_COST_ENV) {
            password_cost.m_cost = parse(ARGON2_M_COST_ENV, &m_cost)?;
        }
        if let Some(t_cost) = lookup(ARGON2_T_COST_ENV) {
            password_cost.t_cost = parse(ARGON2_T_COST_ENV, &t_cost)?;
        }

        Ok(Self {
            bind_addr,
            database_path: lookup(DB_PATH_ENV)
                .filter(|path| !path.trim().is_empty())
                .map_or_else(|| PathBuf::from(DEFAULT_DB_PATH), PathBuf::from),
            token_ttl: chrono::Duration::hours(ttl_hours),
            password_cost,
        })
    }
}

fn parse<T: std::str::FromStr>(name: &'static str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::Invalid {
        name,
        value: value.to_string(),
    })
}

/// Load the token signing seed from the first configured secret source.
///
/// In release builds, environment variables are not accepted for secrets.
///
/// # Errors
/// `MissingTokenSeed` when no source is configured, `SeedIo` or
/// `InvalidSeed` when the configured source is unusable.
pub fn load_token_seed() -> Result<TokenSeed, ConfigError> {
    // 1) An already-open FD (systemd/K8s sidecars)
    #[cfg(unix)]
    if let Ok(fd_str) = std::env::var(TOKEN_SEED_FD_ENV) {
        use std::io::Read;
        use std::os::unix::io::FromRawFd;

        let fd: i32 = fd_str.trim().parse().map_err(|_| ConfigError::Invalid {
            name: TOKEN_SEED_FD_ENV,
            value: fd_str.clone(),
        })?;
        if fd <= 2 {
            return Err(ConfigError::Invalid {
                name: TOKEN_SEED_FD_ENV,
                value: fd_str,
            });
        }

        // SAFETY: We take ownership of the FD for a one-time secret read and close it.
        let mut file = unsafe { fs::File::from_raw_fd(fd) };
        let mut buf = Zeroizing::new(String::new());
        file.read_to_string(&mut buf)?;
        return seed_from_text(&buf);
    }

    // 2) An explicit file path
    if let Ok(path) = std::env::var(TOKEN_SEED_FILE_ENV) {
        return read_seed_file(Path::new(path.trim()));
    }

    // 3) Docker secrets default path
    let docker_secret = Path::new(TOKEN_SEED_DOCKER_SECRET_PATH);
    if docker_secret.exists() {
        return read_seed_file(docker_secret);
    }

    // 4) Dev-only env var
    if cfg!(debug_assertions) {
        if let Ok(value) = std::env::var(TOKEN_SEED_ENV_DEV) {
            tracing::warn!(
                "Using token seed from {}; not accepted in release builds",
                TOKEN_SEED_ENV_DEV
            );
            return seed_from_text(&Zeroizing::new(value));
        }
    }

    Err(ConfigError::MissingTokenSeed)
}

fn read_seed_file(path: &Path) -> Result<TokenSeed, ConfigError> {
    let content = Zeroizing::new(fs::read_to_string(path)?);
    seed_from_text(&content)
}

fn seed_from_text(text: &str) -> Result<TokenSeed, ConfigError> {
    let trimmed = text.trim_end_matches(['\n', '\r']).trim();
    if trimmed.is_empty() {
        return Err(ConfigError::MissingTokenSeed);
    }
    TokenSeed::from_b64(trimmed).map_err(|e| ConfigError::InvalidSeed(e.to_string()))
}
