//! Environment-driven configuration
//!
//! [`KbConfig::from_env`] loads an optional `.env` file and then reads the
//! process environment. Every setting has a default except the generator
//! API key, which is only needed once a summary has to be generated.

use crate::cache::{DEFAULT_TTL, MAX_TTL};
use crate::error::{KbError, Result};
use crate::origin::LinkPolicy;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info};

pub const DEFAULT_WIKI_API_URL: &str = "https://en.wikipedia.org/w/api.php";
pub const DEFAULT_USER_AGENT: &str = "WikiTutorBot/1.0";
pub const DEFAULT_ANTHROPIC_BASE_URL: &str = "https://api.anthropic.com";
pub const DEFAULT_ANTHROPIC_MODEL: &str = "claude-3-haiku-20240307";

/// Knowledge base configuration
#[derive(Debug, Clone)]
pub struct KbConfig {
    /// SQLite database file
    pub db_path: PathBuf,

    /// Shared cache; `None` selects the in-process cache
    pub redis_url: Option<String>,

    /// MediaWiki API endpoint
    pub wiki_api_url: String,

    pub user_agent: String,

    /// Cooperative delay before each origin request
    pub origin_pacing: Duration,

    /// Lifetime of volatile cache entries
    pub cache_ttl: Duration,

    pub link_policy: LinkPolicy,

    pub generator: GeneratorConfig,
}

/// Anthropic Messages API settings
#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    pub api_key: Option<String>,
    pub model: String,
    pub max_tokens: u32,
    pub base_url: String,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_ANTHROPIC_MODEL.to_string(),
            max_tokens: 4096,
            base_url: DEFAULT_ANTHROPIC_BASE_URL.to_string(),
        }
    }
}

impl Default for KbConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            redis_url: None,
            wiki_api_url: DEFAULT_WIKI_API_URL.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            origin_pacing: Duration::from_millis(100),
            cache_ttl: DEFAULT_TTL,
            link_policy: LinkPolicy::default(),
            generator: GeneratorConfig::default(),
        }
    }
}

impl KbConfig {
    /// Load `.env` (if present) and read settings from the environment
    pub fn from_env() -> Result<Self> {
        match dotenv::dotenv() {
            Ok(path) => debug!("Loaded environment from {}", path.display()),
            Err(_) => debug!("No .env file found, using process environment"),
        }

        let config = Self::from_lookup(|key| std::env::var(key).ok())?;
        info!(
            "Knowledge base config: db={}, cache={}, link_policy={}",
            config.db_path.display(),
            if config.redis_url.is_some() { "redis" } else { "memory" },
            config.link_policy
        );
        Ok(config)
    }

    /// Build a config from an arbitrary variable source
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let defaults = Self::default();

        let pacing_ms: u64 = parse_var(&var, "ORIGIN_PACING_MS")?.unwrap_or(100);
        let ttl_secs: u64 = parse_var(&var, "CACHE_TTL_SECS")?
            .unwrap_or(defaults.cache_ttl.as_secs());
        if ttl_secs == 0 {
            return Err(KbError::Config("CACHE_TTL_SECS must be greater than 0".to_string()));
        }
        if ttl_secs > MAX_TTL.as_secs() {
            return Err(KbError::Config(format!(
                "CACHE_TTL_SECS must be at most {}",
                MAX_TTL.as_secs()
            )));
        }

        let generator = GeneratorConfig {
            api_key: var("ANTHROPIC_API_KEY"),
            model: var("ANTHROPIC_MODEL").unwrap_or(defaults.generator.model),
            max_tokens: parse_var(&var, "ANTHROPIC_MAX_TOKENS")?
                .unwrap_or(defaults.generator.max_tokens),
            base_url: var("ANTHROPIC_BASE_URL").unwrap_or(defaults.generator.base_url),
        };

        Ok(Self {
            db_path: var("WIKITUTOR_DB_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.db_path),
            redis_url: var("REDIS_URL"),
            wiki_api_url: var("WIKI_API_URL").unwrap_or(defaults.wiki_api_url),
            user_agent: var("WIKI_USER_AGENT").unwrap_or(defaults.user_agent),
            origin_pacing: Duration::from_millis(pacing_ms),
            cache_ttl: Duration::from_secs(ttl_secs),
            link_policy: parse_var(&var, "LINK_POLICY")?.unwrap_or(defaults.link_policy),
            generator,
        })
    }
}

fn parse_var<T, F>(var: &F, key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    var(key)
        .map(|raw| {
            raw.parse::<T>()
                .map_err(|e| KbError::Config(format!("{}={:?}: {}", key, raw, e)))
        })
        .transpose()
}

/// `<data dir>/wikitutor/wikitutor.db`, or `./wikitutor.db` without a data dir
pub fn default_db_path() -> PathBuf {
    dirs::data_dir()
        .map(|dir| dir.join("wikitutor").join("wikitutor.db"))
        .unwrap_or_else(|| PathBuf::from("wikitutor.db"))
}
