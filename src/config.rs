use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

pub const DEFAULT_HTTP_PORT: u16 = 3000;
pub const DEFAULT_WHOIS_PORT: u16 = 43;
pub const DEFAULT_QUERY_TIMEOUT_SECONDS: u64 = 5;
pub const DEFAULT_READ_TIMEOUT_SECONDS: u64 = 30;
pub const DEFAULT_WRITE_TIMEOUT_SECONDS: u64 = 10;
pub const DEFAULT_DNS_TIMEOUT_SECONDS: u64 = 5;
/// Hard cap on a single WHOIS response body.
pub const MAX_RESPONSE_SIZE: usize = 10 * 1024 * 1024;
pub const DEFAULT_ARIN_SERVER: &str = "whois.arin.net";

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub whois_port: u16,
    pub query_timeout_seconds: u64,
    pub read_timeout_seconds: u64,
    pub write_timeout_seconds: u64,
    pub max_response_size: usize,
    pub arin_server: String,
    /// File path or http(s) URL of the server-list XML; empty selects the embedded list.
    pub server_list: String,
    /// File path or http(s) URL of the Public Suffix List; empty selects the embedded list.
    pub public_suffix_list: String,
    pub dns_timeout_seconds: u64,
    pub start_time: Instant,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ConfigData {
    pub port: u16,
    pub whois_port: u16,
    pub query_timeout_seconds: u64,
    pub read_timeout_seconds: u64,
    pub write_timeout_seconds: u64,
    pub max_response_size: usize,
    pub arin_server: String,
    pub server_list: String,
    pub public_suffix_list: String,
    pub dns_timeout_seconds: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: DEFAULT_HTTP_PORT,
            whois_port: DEFAULT_WHOIS_PORT,
            query_timeout_seconds: DEFAULT_QUERY_TIMEOUT_SECONDS,
            read_timeout_seconds: DEFAULT_READ_TIMEOUT_SECONDS,
            write_timeout_seconds: DEFAULT_WRITE_TIMEOUT_SECONDS,
            max_response_size: MAX_RESPONSE_SIZE,
            arin_server: DEFAULT_ARIN_SERVER.to_string(),
            server_list: String::new(),
            public_suffix_list: String::new(),
            dns_timeout_seconds: DEFAULT_DNS_TIMEOUT_SECONDS,
            start_time: Instant::now(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        let mut settings = config::Config::builder()
            .set_default("port", Self::get_default_port())?
            .set_default("whois_port", DEFAULT_WHOIS_PORT)?
            .set_default("query_timeout_seconds", DEFAULT_QUERY_TIMEOUT_SECONDS)?
            .set_default("read_timeout_seconds", DEFAULT_READ_TIMEOUT_SECONDS)?
            .set_default("write_timeout_seconds", DEFAULT_WRITE_TIMEOUT_SECONDS)?
            .set_default("max_response_size", MAX_RESPONSE_SIZE as i64)?
            .set_default("arin_server", DEFAULT_ARIN_SERVER)?
            .set_default("server_list", "")?
            .set_default("public_suffix_list", "")?
            .set_default("dns_timeout_seconds", DEFAULT_DNS_TIMEOUT_SECONDS)?;

        // Override with environment variables if present
        settings = Self::apply_env_overrides(settings)?;

        let config_data: ConfigData = settings.build()?.try_deserialize()?;

        Ok(Config {
            port: config_data.port,
            whois_port: config_data.whois_port,
            query_timeout_seconds: config_data.query_timeout_seconds,
            read_timeout_seconds: config_data.read_timeout_seconds,
            write_timeout_seconds: config_data.write_timeout_seconds,
            // Never above the hard cap, whatever the environment says
            max_response_size: config_data.max_response_size.min(MAX_RESPONSE_SIZE),
            arin_server: config_data.arin_server,
            server_list: config_data.server_list,
            public_suffix_list: config_data.public_suffix_list,
            dns_timeout_seconds: config_data.dns_timeout_seconds,
            start_time: Instant::now(),
        })
    }

    pub fn query_timeout(&self) -> Duration {
        Duration::from_secs(self.query_timeout_seconds)
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_secs(self.read_timeout_seconds)
    }

    pub fn write_timeout(&self) -> Duration {
        Duration::from_secs(self.write_timeout_seconds)
    }

    pub fn dns_timeout(&self) -> Duration {
        Duration::from_secs(self.dns_timeout_seconds)
    }

    fn get_default_port() -> u16 {
        // Check common environment variables for port
        std::env::var("PORT")
            .or_else(|_| std::env::var("HTTP_PORT"))
            .or_else(|_| std::env::var("SERVER_PORT"))
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(DEFAULT_HTTP_PORT)
    }

    fn apply_env_overrides(mut settings: config::ConfigBuilder<config::builder::DefaultState>) -> Result<config::ConfigBuilder<config::builder::DefaultState>, config::ConfigError> {
        let env_mappings = [
            ("PORT", "port"),
            ("WHOIS_PORT", "whois_port"),
            ("WHOIS_TIMEOUT", "query_timeout_seconds"),
            ("WHOIS_QUERY_TIMEOUT", "query_timeout_seconds"),
            ("WHOIS_READ_TIMEOUT", "read_timeout_seconds"),
            ("WHOIS_WRITE_TIMEOUT", "write_timeout_seconds"),
            ("MAX_RESPONSE_SIZE", "max_response_size"),
            ("ARIN_SERVER", "arin_server"),
            ("WHOIS_SERVER_LIST", "server_list"),
            ("PUBLIC_SUFFIX_LIST", "public_suffix_list"),
            ("DNS_TIMEOUT", "dns_timeout_seconds"),
        ];

        for (env_var, config_key) in env_mappings {
            if let Ok(value) = std::env::var(env_var) {
                settings = settings.set_override(config_key, value)?;
            }
        }

        Ok(settings)
    }
}
