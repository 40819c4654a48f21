use clap::{Parser, ValueEnum};
use std::fmt::{Display, Formatter};
use std::net::SocketAddr;
use std::path::PathBuf;
use tunebox_telemetry::LogFormat;

pub const LISTEN_ADDR_ENV: &str = "TUNEBOX_LISTEN_ADDR";
pub const CACHE_BACKEND_ENV: &str = "TUNEBOX_CACHE_BACKEND";
pub const REDIS_URL_ENV: &str = "TUNEBOX_REDIS_URL";
pub const CACHE_KEY_PREFIX_ENV: &str = "TUNEBOX_CACHE_KEY_PREFIX";
pub const CACHE_OP_TIMEOUT_ENV: &str = "TUNEBOX_CACHE_OP_TIMEOUT_MS";
pub const YTDLP_PATH_ENV: &str = "TUNEBOX_YTDLP_PATH";
pub const PREFERRED_CONTAINER_ENV: &str = "TUNEBOX_PREFERRED_CONTAINER";
pub const USER_AGENT_ENV: &str = "TUNEBOX_USER_AGENT";
pub const COOKIES_FILE_ENV: &str = "TUNEBOX_COOKIES_FILE";
pub const COOKIES_VAR_ENV: &str = "TUNEBOX_COOKIES_VAR";
pub const EXTRACT_TIMEOUT_ENV: &str = "TUNEBOX_EXTRACT_TIMEOUT_SECS";
pub const RECORD_TTL_ENV: &str = "TUNEBOX_RECORD_TTL_SECS";
pub const VALIDATION_TIMEOUT_ENV: &str = "TUNEBOX_VALIDATION_TIMEOUT_SECS";
pub const YOUTUBE_API_KEY_ENV: &str = "TUNEBOX_YOUTUBE_API_KEY";
pub const SEARCH_TTL_ENV: &str = "TUNEBOX_SEARCH_TTL_SECS";
pub const CORS_ORIGINS_ENV: &str = "TUNEBOX_CORS_ORIGINS";
pub const LOG_FORMAT_ENV: &str = "TUNEBOX_LOG_FORMAT";
pub const OTLP_ENDPOINT_ENV: &str = "TUNEBOX_OTLP_ENDPOINT";

pub const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:8080";
pub const DEFAULT_CACHE_OP_TIMEOUT_MS: u64 = 500;
pub const DEFAULT_EXTRACT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_RECORD_TTL_SECS: u64 = 3600;
pub const DEFAULT_VALIDATION_TIMEOUT_SECS: u64 = 5;
pub const DEFAULT_SEARCH_TTL_SECS: u64 = 3600;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CacheBackendArg {
    #[value(name = "redis")]
    Redis,
    #[value(name = "memory")]
    Memory,
}

impl Display for CacheBackendArg {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            CacheBackendArg::Redis => write!(f, "redis"),
            CacheBackendArg::Memory => write!(f, "memory"),
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "tunebox-gateway")]
pub struct CLI {
    #[arg(long, env = LISTEN_ADDR_ENV, default_value = DEFAULT_LISTEN_ADDR)]
    pub listen_addr: SocketAddr,

    #[arg(
        long,
        env = CACHE_BACKEND_ENV,
        value_enum,
        default_value_t = CacheBackendArg::Redis
    )]
    pub cache: CacheBackendArg,

    #[arg(long, env = REDIS_URL_ENV, required_if_eq("cache", "redis"))]
    pub redis_url: Option<String>,

    #[arg(
        long,
        env = CACHE_KEY_PREFIX_ENV,
        default_value = tunebox_cache::redis::DEFAULT_KEY_PREFIX
    )]
    pub cache_key_prefix: String,

    #[arg(long, env = CACHE_OP_TIMEOUT_ENV, default_value_t = DEFAULT_CACHE_OP_TIMEOUT_MS)]
    pub cache_op_timeout_ms: u64,

    #[arg(long, env = YTDLP_PATH_ENV, default_value = "yt-dlp")]
    pub ytdlp_path: PathBuf,

    #[arg(
        long,
        env = PREFERRED_CONTAINER_ENV,
        default_value = tunebox_extractor::ytdlp::DEFAULT_PREFERRED_CONTAINER
    )]
    pub preferred_container: String,

    #[arg(long, env = USER_AGENT_ENV, default_value = tunebox_core::BROWSER_USER_AGENT)]
    pub user_agent: String,

    /// Netscape cookie jar re-read on every extraction.
    #[arg(long, env = COOKIES_FILE_ENV, conflicts_with = "cookies_var")]
    pub cookies_file: Option<PathBuf>,

    /// Name of an environment variable holding the cookie jar.
    #[arg(long, env = COOKIES_VAR_ENV)]
    pub cookies_var: Option<String>,

    #[arg(long, env = EXTRACT_TIMEOUT_ENV, default_value_t = DEFAULT_EXTRACT_TIMEOUT_SECS)]
    pub extract_timeout_secs: u64,

    #[arg(long, env = RECORD_TTL_ENV, default_value_t = DEFAULT_RECORD_TTL_SECS)]
    pub record_ttl_secs: u64,

    #[arg(
        long,
        env = VALIDATION_TIMEOUT_ENV,
        default_value_t = DEFAULT_VALIDATION_TIMEOUT_SECS
    )]
    pub validation_timeout_secs: u64,

    /// Enables `/search`.
    #[arg(long, env = YOUTUBE_API_KEY_ENV, hide_env_values = true)]
    pub youtube_api_key: Option<String>,

    #[arg(long, env = SEARCH_TTL_ENV, default_value_t = DEFAULT_SEARCH_TTL_SECS)]
    pub search_ttl_secs: u64,

    /// Comma separated; `*` or nothing allows any origin.
    #[arg(long, env = CORS_ORIGINS_ENV, value_delimiter = ',')]
    pub cors_origins: Vec<String>,

    #[arg(long, env = LOG_FORMAT_ENV, default_value_t = LogFormat::Compact)]
    pub log_format: LogFormat,

    #[arg(long, env = OTLP_ENDPOINT_ENV)]
    pub otlp_endpoint: Option<String>,
}
