use crate::duration::EligibilityWindow;
use crate::teacher::parse_date;
use std::env;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use thiserror::Error;

pub const DATABASE_FILE: &str = "fundef.db";

/// Top-level configuration, read from the environment (and `.env`).
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub data_dir: PathBuf,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub window: EligibilityWindow,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let data_dir = env::var("DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("dados"));

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let defaults = EligibilityWindow::fundef();
        let window = EligibilityWindow::new(
            window_bound("FUNDEF_WINDOW_START", defaults.start)?,
            window_bound("FUNDEF_WINDOW_END", defaults.end)?,
        );
        if window.start > window.end {
            return Err(ConfigError::InvertedWindow {
                start: window.start.to_string(),
                end: window.end.to_string(),
            });
        }

        Ok(Self {
            data_dir,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            window,
        })
    }

    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join(DATABASE_FILE)
    }
}

fn window_bound(var: &'static str, default: chrono::NaiveDate) -> Result<chrono::NaiveDate, ConfigError> {
    match env::var(var) {
        Ok(raw) => parse_date(&raw).ok_or(ConfigError::InvalidDate { var, value: raw }),
        Err(_) => Ok(default),
    }
}

/// Settings controlling the HTTP server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }

        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|source| ConfigError::InvalidHost { source })?;

        Ok(SocketAddr::new(ip, self.port))
    }
}

#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("APP_PORT must be a valid u16")]
    InvalidPort,

    #[error("APP_HOST must parse to an IPv4 or IPv6 address")]
    InvalidHost { source: std::net::AddrParseError },

    #[error("{var} must be a date (YYYY-MM-DD or DD/MM/YYYY), got '{value}'")]
    InvalidDate { var: &'static str, value: String },

    #[error("FUNDEF window starts ({start}) after it ends ({end})")]
    InvertedWindow { start: String, end: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::sync::{Mutex, OnceLock};

    fn env_guard() -> &'static Mutex<()> {
        static GUARD: OnceLock<Mutex<()>> = OnceLock::new();
        GUARD.get_or_init(|| Mutex::new(()))
    }

    fn reset_env() {
        for var in [
            "DATA_DIR",
            "APP_HOST",
            "APP_PORT",
            "APP_LOG_LEVEL",
            "FUNDEF_WINDOW_START",
            "FUNDEF_WINDOW_END",
        ] {
            env::remove_var(var);
        }
    }

    #[test]
    fn load_uses_defaults_when_env_missing() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();

        let config = AppConfig::load().expect("config loads with defaults");
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.telemetry.log_level, "info");
        assert_eq!(config.window, EligibilityWindow::fundef());
        assert_eq!(config.database_path(), PathBuf::from("dados").join("fundef.db"));
    }

    #[test]
    fn window_can_be_overridden() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("FUNDEF_WINDOW_START", "01/01/1999");
        env::set_var("FUNDEF_WINDOW_END", "2005-12-31");

        let config = AppConfig::load().expect("config loads");
        assert_eq!(config.window.start, NaiveDate::from_ymd_opt(1999, 1, 1).unwrap());
        assert_eq!(config.window.end, NaiveDate::from_ymd_opt(2005, 12, 31).unwrap());
        reset_env();
    }

    #[test]
    fn rejects_bad_values() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();

        env::set_var("APP_PORT", "not-a-port");
        assert!(matches!(AppConfig::load(), Err(ConfigError::InvalidPort)));
        reset_env();

        env::set_var("FUNDEF_WINDOW_END", "yesterday");
        assert!(matches!(
            AppConfig::load(),
            Err(ConfigError::InvalidDate { var: "FUNDEF_WINDOW_END", .. })
        ));
        reset_env();

        env::set_var("FUNDEF_WINDOW_START", "2010-01-01");
        assert!(matches!(AppConfig::load(), Err(ConfigError::InvertedWindow { .. })));
        reset_env();
    }

    #[test]
    fn accepts_localhost_host() {
        let config = ServerConfig {
            host: "localhost".to_string(),
            port: 8080,
        };
        let addr = config.socket_addr().expect("localhost resolves");
        assert_eq!(addr, SocketAddr::new(IpAddr::from([127, 0, 0, 1]), 8080));
    }
}
