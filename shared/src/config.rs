//! Configuration management for the dashboard service

use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

pub const DEFAULT_GAME_API_URL: &str = "https://api.mgame.nu/server-2025-rpp-na-circlek/server.php";
pub const DEFAULT_GAME_ORIGIN: &str = "https://rockpaperprizes.com";
/// Upper bound for `COOLDOWN_HOURS` (one year)
pub const MAX_COOLDOWN_HOURS: i64 = 24 * 365;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub game_api: GameApiConfig,
    pub app: AppConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub static_dir: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub config_path: PathBuf,
    pub state_path: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameApiConfig {
    pub url: String,
    pub origin: String,
    pub country: String,
    pub request_timeout_seconds: u64,
    /// How long an account stays on cooldown after a play when the API gives no end time.
    pub cooldown_hours: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: String,
    pub log_level: String,
    /// Cron expression (with seconds) for background sweeps. `None` disables them.
    pub poll_cron: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 3000,
                static_dir: PathBuf::from("static"),
            },
            storage: StorageConfig {
                config_path: PathBuf::from("config.json"),
                state_path: PathBuf::from("state.json"),
            },
            game_api: GameApiConfig {
                url: DEFAULT_GAME_API_URL.to_string(),
                origin: DEFAULT_GAME_ORIGIN.to_string(),
                country: "ca".to_string(),
                request_timeout_seconds: 30,
                cooldown_hours: 24,
            },
            app: AppConfig {
                environment: "development".to_string(),
                log_level: "info".to_string(),
                poll_cron: None,
            },
        }
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let defaults = Config::default();

        Ok(Config {
            server: ServerConfig {
                host: env::var("HOST").unwrap_or(defaults.server.host),
                port: env::var("PORT")
                    .unwrap_or_else(|_| defaults.server.port.to_string())
                    .parse()?,
                static_dir: env::var("STATIC_DIR")
                    .map(PathBuf::from)
                    .unwrap_or(defaults.server.static_dir),
            },
            storage: StorageConfig {
                config_path: env::var("CONFIG_PATH")
                    .map(PathBuf::from)
                    .unwrap_or(defaults.storage.config_path),
                state_path: env::var("STATE_PATH")
                    .map(PathBuf::from)
                    .unwrap_or(defaults.storage.state_path),
            },
            game_api: GameApiConfig {
                url: env::var("GAME_API_URL").unwrap_or(defaults.game_api.url),
                origin: env::var("GAME_API_ORIGIN").unwrap_or(defaults.game_api.origin),
                country: env::var("GAME_API_COUNTRY").unwrap_or(defaults.game_api.country),
                request_timeout_seconds: env::var("REQUEST_TIMEOUT_SECONDS")
                    .unwrap_or_else(|_| defaults.game_api.request_timeout_seconds.to_string())
                    .parse()?,
                cooldown_hours: match env::var("COOLDOWN_HOURS") {
                    Ok(raw) => parse_cooldown_hours(&raw)?,
                    Err(_) => defaults.game_api.cooldown_hours,
                },
            },
            app: AppConfig {
                environment: env::var("ENVIRONMENT").unwrap_or(defaults.app.environment),
                log_level: env::var("RUST_LOG").unwrap_or(defaults.app.log_level),
                poll_cron: env::var("POLL_CRON")
                    .ok()
                    .filter(|expr| !expr.trim().is_empty()),
            },
        })
    }

    pub fn is_production(&self) -> bool {
        self.app.environment == "production"
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

fn parse_cooldown_hours(raw: &str) -> anyhow::Result<i64> {
    let hours: i64 = raw.trim().parse()?;
    anyhow::ensure!(
        (1..=MAX_COOLDOWN_HOURS).contains(&hours),
        "COOLDOWN_HOURS must be between 1 and {}, got {}",
        MAX_COOLDOWN_HOURS,
        hours
    );
    Ok(hours)
}
