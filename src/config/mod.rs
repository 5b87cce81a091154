use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    #[serde(default)]
    pub otp: OtpConfig,
    #[serde(default)]
    pub gateway: GatewayConfig,
    #[serde(default)]
    pub smtp: SmtpConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub base_url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    pub session_duration_hours: i64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct OtpConfig {
    pub code_length: usize,
    pub ttl_seconds: i64,
    /// Accept any submitted code and issue a fixed sentinel. Development
    /// only; must never be enabled in a production build.
    pub dev_auto_verify: bool,
}

impl Default for OtpConfig {
    fn default() -> Self {
        Self {
            code_length: 6,
            ttl_seconds: 600,
            dev_auto_verify: false,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct GatewayConfig {
    /// Server-held secret for HMAC signature verification of gateway
    /// callbacks. Signature-bearing confirmations are rejected when unset.
    pub secret: Option<String>,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct SmtpConfig {
    #[serde(default)]
    pub enabled: bool,
    pub host: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub from_address: Option<String>,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let config = Config::builder()
            // Start with default values
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 8080)?
            .set_default("server.base_url", "http://localhost:8080")?
            .set_default("database.max_connections", 10)?
            .set_default("auth.session_duration_hours", 24)?
            .set_default("otp.code_length", 6)?
            .set_default("otp.ttl_seconds", 600)?
            .set_default("otp.dev_auto_verify", false)?
            .set_default("smtp.enabled", false)?
            // Add config file if it exists
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            // Add environment variables (with GYMBOOK__ prefix, double underscore separates levels)
            .add_source(Environment::with_prefix("GYMBOOK").separator("__"))
            .build()?;

        config.try_deserialize()
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 8080,
                base_url: "http://localhost:8080".to_string(),
            },
            database: DatabaseConfig {
                url: "sqlite://gymbook.db".to_string(),
                max_connections: 10,
            },
            auth: AuthConfig {
                session_duration_hours: 24,
            },
            otp: OtpConfig::default(),
            gateway: GatewayConfig::default(),
            smtp: SmtpConfig::default(),
        }
    }
}
