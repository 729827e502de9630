use std::ops::RangeInclusive;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};

/// One minute to one day.
pub const CODE_TTL_MINUTES_RANGE: RangeInclusive<u32> = 1..=1440;
/// One hour to one year.
pub const SESSION_TTL_HOURS_RANGE: RangeInclusive<u32> = 1..=8760;

/// Which resume engine variant serves `generate`. Chosen once at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineKind {
    Stub,
    Llm,
}

/// Where generated artifacts are stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArtifactBackend {
    Filesystem {
        root: PathBuf,
    },
    S3 {
        bucket: String,
        endpoint: String,
        access_key_id: String,
        secret_access_key: String,
    },
}

/// Application configuration loaded from environment variables.
/// Startup fails if required variables are missing or malformed.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub redis_url: String,
    pub port: u16,
    pub rust_log: String,
    pub code_ttl_minutes: u32,
    pub session_ttl_hours: u32,
    pub engine: EngineKind,
    pub anthropic_api_key: Option<String>,
    pub artifacts: ArtifactBackend,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let engine = match optional_env("RESUME_ENGINE").as_deref() {
            None | Some("stub") => EngineKind::Stub,
            Some("llm") => EngineKind::Llm,
            Some(other) => bail!("RESUME_ENGINE must be 'stub' or 'llm', got '{other}'"),
        };

        let anthropic_api_key = optional_env("ANTHROPIC_API_KEY");
        if engine == EngineKind::Llm && anthropic_api_key.is_none() {
            bail!("ANTHROPIC_API_KEY is required when RESUME_ENGINE=llm");
        }

        let artifacts = match optional_env("ARTIFACT_BACKEND").as_deref() {
            None | Some("fs") => ArtifactBackend::Filesystem {
                root: PathBuf::from(
                    optional_env("ARTIFACT_DIR").unwrap_or_else(|| "./artifacts".to_string()),
                ),
            },
            Some("s3") => ArtifactBackend::S3 {
                bucket: require_env("S3_BUCKET")?,
                endpoint: require_env("S3_ENDPOINT")?,
                access_key_id: require_env("AWS_ACCESS_KEY_ID")?,
                secret_access_key: require_env("AWS_SECRET_ACCESS_KEY")?,
            },
            Some(other) => bail!("ARTIFACT_BACKEND must be 'fs' or 's3', got '{other}'"),
        };

        Ok(Config {
            database_url: require_env("DATABASE_URL")?,
            redis_url: require_env("REDIS_URL")?,
            port: parse_env("PORT", 8080)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            code_ttl_minutes: parse_bounded(
                "CODE_TTL_MINUTES",
                optional_env("CODE_TTL_MINUTES"),
                10,
                CODE_TTL_MINUTES_RANGE,
            )?,
            session_ttl_hours: parse_bounded(
                "SESSION_TTL_HOURS",
                optional_env("SESSION_TTL_HOURS"),
                720,
                SESSION_TTL_HOURS_RANGE,
            )?,
            engine,
            anthropic_api_key,
            artifacts,
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
{
    match optional_env(key) {
        None => Ok(default),
        Some(raw) => raw
            .parse::<T>()
            .map_err(|_| anyhow::anyhow!("{key} must be a valid number, got '{raw}'")),
    }
}

fn parse_bounded(
    key: &str,
    raw: Option<String>,
    default: u32,
    range: RangeInclusive<u32>,
) -> Result<u32> {
    let value = match raw {
        None => default,
        Some(raw) => raw
            .parse::<u32>()
            .map_err(|_| anyhow::anyhow!("{key} must be a whole number, got '{raw}'"))?,
    };
    if !range.contains(&value) {
        bail!(
            "{key} must be between {} and {}, got {value}",
            range.start(),
            range.end()
        );
    }
    Ok(value)
}
