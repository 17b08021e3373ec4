use clap::builder::TypedValueParser as _;
use clap::Parser;
use dotenvy::dotenv;
use log::LevelFilter;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Default TikTok Login Kit v2 endpoints, overridable for tests and sandboxes.
pub const DEFAULT_TIKTOK_AUTH_URL: &str = "https://www.tiktok.com/v2/auth/authorize/";
pub const DEFAULT_TIKTOK_TOKEN_URL: &str = "https://open.tiktokapis.com/v2/oauth/token/";
pub const DEFAULT_TIKTOK_USER_INFO_URL: &str = "https://open.tiktokapis.com/v2/user/info/";
pub const DEFAULT_TIKTOK_SCOPES: &str = "user.info.basic,video.list";

#[derive(Clone, Debug, PartialEq)]
pub enum RustEnv {
    Development,
    Production,
    Staging,
}

#[derive(Debug, PartialEq, Eq)]
pub struct RustEnvParseError;

impl FromStr for RustEnv {
    type Err = RustEnvParseError;
    fn from_str(level: &str) -> Result<RustEnv, Self::Err> {
        match level.to_lowercase().as_str() {
            "development" => Ok(RustEnv::Development),
            "production" => Ok(RustEnv::Production),
            "staging" => Ok(RustEnv::Staging),
            _ => Err(RustEnvParseError),
        }
    }
}

impl fmt::Display for RustEnv {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            RustEnv::Development => write!(f, "development"),
            RustEnv::Production => write!(f, "production"),
            RustEnv::Staging => write!(f, "staging"),
        }
    }
}

#[derive(Clone, Debug, Parser)]
#[command(author, version, about, long_about = None)]
pub struct Config {
    /// A list of full CORS origin URLs that are allowed to receive server responses.
    /// A single `*` allows any origin.
    #[arg(
        long,
        env,
        value_delimiter = ',',
        use_value_delimiter = true,
        default_value = "*"
    )]
    pub allowed_origins: Vec<String>,

    /// The TikTok application client key.
    #[arg(long, env)]
    tiktok_client_key: Option<String>,

    /// The TikTok application client secret.
    #[arg(long, env, hide_env_values = true)]
    tiktok_client_secret: Option<String>,

    /// The callback URL registered with TikTok for this relay.
    #[arg(
        long,
        env,
        default_value = "http://localhost:8000/auth/tiktok/callback"
    )]
    tiktok_redirect_uri: String,

    /// Comma separated scopes requested during authorization.
    #[arg(long, env, default_value = DEFAULT_TIKTOK_SCOPES)]
    tiktok_scopes: String,

    /// TikTok authorize endpoint.
    #[arg(long, env, default_value = DEFAULT_TIKTOK_AUTH_URL)]
    tiktok_auth_url: String,

    /// TikTok token endpoint.
    #[arg(long, env, default_value = DEFAULT_TIKTOK_TOKEN_URL)]
    tiktok_token_url: String,

    /// TikTok user info endpoint.
    #[arg(long, env, default_value = DEFAULT_TIKTOK_USER_INFO_URL)]
    tiktok_user_info_url: String,

    /// The base URL of the client application; users land on `{frontend_url}/search`.
    #[arg(long, env, default_value = "http://localhost:3000")]
    frontend_url: String,

    /// Seconds an issued OAuth state stays valid. 0 disables expiry.
    #[arg(long, env, default_value_t = 600)]
    pub state_ttl_secs: u64,

    /// Seconds between sweeps that purge expired OAuth states.
    #[arg(long, env, default_value_t = 60)]
    pub state_sweep_interval_secs: u64,

    /// Timeout in seconds for each outbound call to the OAuth provider.
    #[arg(long, env, default_value_t = 10)]
    pub provider_timeout_secs: u64,

    /// Base URL of the Supabase project used to persist user profiles.
    #[arg(long, env)]
    supabase_url: Option<String>,

    /// Supabase service key.
    #[arg(long, env, hide_env_values = true)]
    supabase_key: Option<String>,

    /// Table receiving profile upserts.
    #[arg(long, env, default_value = "tiktok_users")]
    supabase_profile_table: String,

    /// Table read by the store connectivity probe endpoint.
    #[arg(long, env, default_value = "recipes")]
    supabase_probe_table: String,

    /// 64 hex characters. When set, access tokens are encrypted before persistence.
    #[arg(long, env, hide_env_values = true)]
    token_encryption_key: Option<String>,

    /// The host interface to listen for incoming connections
    #[arg(short, long, env, default_value = "127.0.0.1")]
    pub interface: Option<String>,

    /// The host TCP port to listen for incoming connections
    #[arg(short, long, env, default_value_t = 8000)]
    pub port: u16,

    /// Set the log level verbosity threshold (level) to control what gets displayed on console output
    #[arg(
        short,
        long,
        env,
        default_value_t = LevelFilter::Info,
        value_parser = clap::builder::PossibleValuesParser::new(["OFF", "ERROR", "WARN", "INFO", "DEBUG", "TRACE"])
            .map(|s| s.parse::<LevelFilter>().unwrap()),
        )]
    pub log_level_filter: LevelFilter,

    /// Set the Rust runtime environment to use.
    #[arg(
    short,
    long,
    env,
    default_value_t = RustEnv::Development,
    value_parser = clap::builder::PossibleValuesParser::new([
        "DEVELOPMENT", "PRODUCTION", "STAGING",
        "development", "production", "staging"
    ])
        .map(|s| s.parse::<RustEnv>().unwrap()),
    )]
    pub runtime_env: RustEnv,
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

/// Treats unset and blank values the same.
fn non_blank(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

impl Config {
    pub fn new() -> Self {
        // Load .env file first
        dotenv().ok();
        // Then parse the command line parameters and flags
        Config::parse()
    }

    pub fn tiktok_client_key(&self) -> Option<String> {
        non_blank(&self.tiktok_client_key)
    }

    pub fn tiktok_client_secret(&self) -> Option<String> {
        non_blank(&self.tiktok_client_secret)
    }

    pub fn tiktok_redirect_uri(&self) -> &str {
        &self.tiktok_redirect_uri
    }

    pub fn tiktok_scopes(&self) -> &str {
        &self.tiktok_scopes
    }

    pub fn tiktok_auth_url(&self) -> &str {
        &self.tiktok_auth_url
    }

    pub fn tiktok_token_url(&self) -> &str {
        &self.tiktok_token_url
    }

    pub fn tiktok_user_info_url(&self) -> &str {
        &self.tiktok_user_info_url
    }

    /// Returns the client application base URL without a trailing slash.
    pub fn frontend_url(&self) -> &str {
        self.frontend_url.trim_end_matches('/')
    }

    /// Returns the state expiry, `None` when expiry is disabled.
    pub fn state_ttl(&self) -> Option<Duration> {
        match self.state_ttl_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }

    pub fn provider_timeout(&self) -> Duration {
        Duration::from_secs(self.provider_timeout_secs.max(1))
    }

    pub fn supabase_url(&self) -> Option<String> {
        non_blank(&self.supabase_url).map(|url| url.trim_end_matches('/').to_string())
    }

    pub fn supabase_key(&self) -> Option<String> {
        non_blank(&self.supabase_key)
    }

    pub fn supabase_profile_table(&self) -> &str {
        &self.supabase_profile_table
    }

    pub fn supabase_probe_table(&self) -> &str {
        &self.supabase_probe_table
    }

    pub fn token_encryption_key(&self) -> Option<String> {
        non_blank(&self.token_encryption_key)
    }

    /// Names of the provider credential variables that are unset or blank.
    pub fn missing_provider_credentials(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.tiktok_client_key().is_none() {
            missing.push("TIKTOK_CLIENT_KEY");
        }
        if self.tiktok_client_secret().is_none() {
            missing.push("TIKTOK_CLIENT_SECRET");
        }
        missing
    }

    /// True when any configured origin is the `*` wildcard.
    pub fn allows_any_origin(&self) -> bool {
        self.allowed_origins.iter().any(|origin| origin.trim() == "*")
    }

    pub fn runtime_env(&self) -> RustEnv {
        self.runtime_env.clone()
    }

    pub fn is_production(&self) -> bool {
        self.runtime_env() == RustEnv::Production
    }
}
