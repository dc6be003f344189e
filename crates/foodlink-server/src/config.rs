use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{Context, Result, bail};

/// One year. Longer lifetimes push token expiry past what timestamps can hold.
pub const MAX_TOKEN_TTL_HOURS: i64 = 24 * 365;

const PLACEHOLDER_SECRETS: &[&str] = &["dev-secret-change-me", "change-me-to-a-random-string"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Sqlite,
    Memory,
}

impl FromStr for StorageBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sqlite" => Ok(Self::Sqlite),
            "memory" => Ok(Self::Memory),
            other => bail!("unknown storage backend `{}` (expected sqlite or memory)", other),
        }
    }
}

impl fmt::Display for StorageBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Sqlite => "sqlite",
            Self::Memory => "memory",
        })
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub jwt_secret: String,
    pub token_ttl_hours: i64,
    pub storage: StorageBackend,
    pub db_path: PathBuf,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup. Unset keys fall back to defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let port = var("FOODLINK_PORT", "3000");
        let ttl = var("FOODLINK_TOKEN_TTL_HOURS", "24");

        let config = Self {
            host: var("FOODLINK_HOST", "0.0.0.0"),
            port: port
                .parse()
                .with_context(|| format!("FOODLINK_PORT `{}` is not a valid port", port))?,
            jwt_secret: var("FOODLINK_JWT_SECRET", "dev-secret-change-me"),
            token_ttl_hours: ttl
                .parse()
                .with_context(|| format!("FOODLINK_TOKEN_TTL_HOURS `{}` is not a number", ttl))?,
            storage: var("FOODLINK_STORAGE", "sqlite").parse()?,
            db_path: var("FOODLINK_DB_PATH", "foodlink.db").into(),
        };

        if !(1..=MAX_TOKEN_TTL_HOURS).contains(&config.token_ttl_hours) {
            bail!(
                "FOODLINK_TOKEN_TTL_HOURS must be between 1 and {}",
                MAX_TOKEN_TTL_HOURS
            );
        }
        Ok(config)
    }

    pub fn has_placeholder_secret(&self) -> bool {
        self.jwt_secret.is_empty() || PLACEHOLDER_SECRETS.contains(&self.jwt_secret.as_str())
    }
}
