use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use chrono::Duration;

use crate::auth::parse_expires_in;

const DEFAULT_DATABASE_URL: &str = "sqlite://data/shabd.db?mode=rwc";

#[derive(Debug, Clone)]
pub struct Config {
    pub host: IpAddr,
    pub port: u16,
    pub log_level: String,
    pub database_url: String,
    pub jwt_secret: Option<String>,
    pub token_ttl: Duration,
    pub seed_demo_user: bool,
}

impl Config {
    pub fn from_env() -> Self {
        let port = std::env::var("PORT")
            .ok()
            .and_then(|value| value.parse::<u16>().ok())
            .unwrap_or(3000);

        let host = std::env::var("HOST")
            .ok()
            .and_then(|value| value.parse::<IpAddr>().ok())
            .unwrap_or(IpAddr::V4(Ipv4Addr::new(0, 0, 0, 0)));

        let log_level = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

        let database_url = std::env::var("DATABASE_URL")
            .ok()
            .filter(|value| !value.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string());

        let jwt_secret = std::env::var("JWT_SECRET")
            .ok()
            .filter(|value| !value.trim().is_empty());

        let token_ttl = std::env::var("JWT_EXPIRES_IN")
            .ok()
            .and_then(|value| parse_expires_in(&value).ok())
            .unwrap_or_else(|| Duration::days(7));

        let seed_demo_user = env_bool("SEED_DEMO_USER").unwrap_or(false);

        Self {
            host,
            port,
            log_level,
            database_url,
            jwt_secret,
            token_ttl,
            seed_demo_user,
        }
    }

    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: 3000,
            log_level: "info".to_string(),
            database_url: DEFAULT_DATABASE_URL.to_string(),
            jwt_secret: None,
            token_ttl: Duration::days(7),
            seed_demo_user: false,
        }
    }
}

pub fn env_bool(key: &str) -> Option<bool> {
    let value = std::env::var(key).ok()?;
    let normalized = value.trim().to_ascii_lowercase();
    if normalized.is_empty() {
        return None;
    }
    match normalized.as_str() {
        "1" | "true" | "yes" | "y" | "on" => Some(true),
        "0" | "false" | "no" | "n" | "off" => Some(false),
        _ => None,
    }
}
