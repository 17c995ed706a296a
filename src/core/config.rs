use dotenv::dotenv;
use std::env;
use tracing::{info, warn};

const DEFAULT_JWT_SECRET: &str = "development secret, change me";

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub server_host: String,
    pub server_port: u16,
    pub max_connections: u32,
    pub app_env: String,
    /// Reuse the thread whose active participants are exactly the requested set.
    pub thread_unique_for_active_recipients: bool,
    /// Rolling 24h send quota per sender, `None` means unlimited.
    pub daily_message_limit: Option<u32>,
    pub messages_page_size: usize,
    pub participant_cache_ttl_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: "sqlite::memory:".to_string(),
            jwt_secret: DEFAULT_JWT_SECRET.to_string(),
            server_host: "127.0.0.1".to_string(),
            server_port: 3000,
            max_connections: 5,
            app_env: "development".to_string(),
            thread_unique_for_active_recipients: true,
            daily_message_limit: None,
            messages_page_size: 30,
            participant_cache_ttl_secs: 60 * 60,
        }
    }
}

impl Config {
    /// Loads the configuration from environment variables
    /// Calls dotenv() automatically
    pub fn from_env() -> Result<Self, String> {
        dotenv().ok();
        let defaults = Config::default();

        let database_url = env::var("DATABASE_URL")
            .map_err(|_| "DATABASE_URL must be set in .env file".to_string())?;

        let jwt_secret = env::var("JWT_SECRET").unwrap_or_else(|_| {
            warn!("JWT_SECRET not set, using default (not secure for production!)");
            defaults.jwt_secret.clone()
        });

        let server_host = env::var("SERVER_HOST").unwrap_or(defaults.server_host);

        let server_port = env::var("SERVER_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|_| "Invalid SERVER_PORT: must be a number between 0-65535".to_string())?;

        let max_connections = env::var("MAX_DB_CONNECTIONS")
            .unwrap_or_else(|_| "5".to_string())
            .parse::<u32>()
            .map_err(|_| "Invalid MAX_DB_CONNECTIONS: must be a positive number".to_string())?;

        let app_env = env::var("APP_ENV").unwrap_or(defaults.app_env);

        let thread_unique_for_active_recipients = match env::var("THREAD_UNIQUE_FOR_ACTIVE_RECIPIENTS") {
            Ok(value) => parse_flag(&value).ok_or_else(|| {
                "Invalid THREAD_UNIQUE_FOR_ACTIVE_RECIPIENTS: expected true or false".to_string()
            })?,
            Err(_) => defaults.thread_unique_for_active_recipients,
        };

        let daily_message_limit = match env::var("DAILY_MESSAGE_LIMIT") {
            Ok(value) if !value.trim().is_empty() => Some(
                value
                    .trim()
                    .parse::<u32>()
                    .map_err(|_| "Invalid DAILY_MESSAGE_LIMIT: must be a positive number".to_string())?,
            ),
            _ => None,
        };

        let messages_page_size = env::var("MESSAGES_PAGE_SIZE")
            .unwrap_or_else(|_| "30".to_string())
            .parse::<usize>()
            .ok()
            .filter(|size| *size > 0)
            .ok_or_else(|| "Invalid MESSAGES_PAGE_SIZE: must be a positive number".to_string())?;

        let participant_cache_ttl_secs = env::var("PARTICIPANT_CACHE_TTL_SECS")
            .unwrap_or_else(|_| "3600".to_string())
            .parse::<u64>()
            .map_err(|_| "Invalid PARTICIPANT_CACHE_TTL_SECS: must be a positive number".to_string())?;

        Ok(Config {
            database_url,
            jwt_secret,
            server_host,
            server_port,
            max_connections,
            app_env,
            thread_unique_for_active_recipients,
            daily_message_limit,
            messages_page_size,
            participant_cache_ttl_secs,
        })
    }

    /// Logs the configuration (hiding the secrets)
    pub fn print_info(&self) {
        info!("Server configuration:");
        info!("   Environment: {}", self.app_env);
        info!("   Server Address: {}:{}", self.server_host, self.server_port);
        info!("   Database: {}", Self::mask_url(&self.database_url));
        info!("   Max DB Connections: {}", self.max_connections);
        info!("   Unique thread per active recipients: {}", self.thread_unique_for_active_recipients);
        match self.daily_message_limit {
            Some(limit) => info!("   Daily message limit: {}", limit),
            None => info!("   Daily message limit: none"),
        }
        info!("   Messages page size: {}", self.messages_page_size);
        info!("   Participant cache TTL: {}s", self.participant_cache_ttl_secs);
        if self.jwt_secret == DEFAULT_JWT_SECRET {
            warn!("   JWT Secret: USING DEFAULT (INSECURE!)");
        } else {
            info!("   JWT Secret: custom secret configured");
        }
    }

    /// Masks the credentials of the database URL for logging
    fn mask_url(url: &str) -> String {
        if let Some(at_pos) = url.find('@') {
            if let Some(scheme_end) = url.find("://") {
                let scheme = &url[..scheme_end + 3];
                let after_at = &url[at_pos..];
                return format!("{}***{}", scheme, after_at);
            }
        }
        if url.starts_with("sqlite:") {
            return url.to_string();
        }
        "***".to_string()
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
