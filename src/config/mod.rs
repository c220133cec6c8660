use config::{Config, ConfigBuilder, ConfigError, Environment, File};
use config::builder::DefaultState;
use serde::Deserialize;
use std::env;

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub workers: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    pub token_lifetime_secs: i64,
    pub sweep_interval_secs: u64,
    pub token_bytes: usize,
    pub login_attempts_per_window: u32,
    pub login_window_secs: i64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AccountsConfig {
    pub seed_demo_users: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CorsConfig {
    pub enabled: bool,
    pub allow_any_origin: bool,
    pub max_age: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    pub environment: String,
    pub server: ServerConfig,
    pub auth: AuthConfig,
    pub accounts: AccountsConfig,
    pub cors: CorsConfig,
}

/// Tokens below this many random bytes (128 bits) are rejected.
pub const MIN_TOKEN_BYTES: usize = 16;

/// Longest accepted session lifetime (30 days).
pub const MAX_TOKEN_LIFETIME_SECS: i64 = 30 * 24 * 60 * 60;

/// Longest accepted login throttle window (1 day).
pub const MAX_LOGIN_WINDOW_SECS: i64 = 24 * 60 * 60;

fn with_defaults(environment: &str) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    Config::builder()
        .set_default("environment", environment)?
        .set_default("server.host", "127.0.0.1")?
        .set_default("server.port", 3000)?
        .set_default("server.workers", num_cpus::get() as i64)?
        .set_default("auth.token_lifetime_secs", 30 * 60)?
        .set_default("auth.sweep_interval_secs", 60)?
        .set_default("auth.token_bytes", 32)?
        .set_default("auth.login_attempts_per_window", 10)?
        .set_default("auth.login_window_secs", 60)?
        .set_default("accounts.seed_demo_users", false)?
        .set_default("cors.enabled", true)?
        .set_default("cors.allow_any_origin", true)?
        .set_default("cors.max_age", 3600)
}

fn app_environment() -> Environment {
    // E.g., `APP_AUTH__TOKEN_LIFETIME_SECS=600` sets `Settings.auth.token_lifetime_secs`
    Environment::with_prefix("app")
        .separator("__")
        .try_parsing(true)
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let settings: Settings = with_defaults("development")?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            .add_source(app_environment())
            .build()?
            .try_deserialize()?;

        settings.validate()?;
        Ok(settings)
    }

    /// Defaults only, with no file or environment sources, so tests are
    /// unaffected by the host's configuration.
    pub fn new_for_test() -> Result<Self, ConfigError> {
        let settings: Settings = with_defaults("test")?
            .set_override("server.workers", 1)?
            .build()?
            .try_deserialize()?;

        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.auth.token_lifetime_secs <= 0 {
            return Err(ConfigError::Message(
                "auth.token_lifetime_secs must be positive".into(),
            ));
        }
        if self.auth.token_lifetime_secs > MAX_TOKEN_LIFETIME_SECS {
            return Err(ConfigError::Message(format!(
                "auth.token_lifetime_secs must not exceed {}",
                MAX_TOKEN_LIFETIME_SECS
            )));
        }
        if self.auth.sweep_interval_secs == 0 {
            return Err(ConfigError::Message(
                "auth.sweep_interval_secs must be positive".into(),
            ));
        }
        if self.auth.token_bytes < MIN_TOKEN_BYTES {
            return Err(ConfigError::Message(format!(
                "auth.token_bytes must be at least {}",
                MIN_TOKEN_BYTES
            )));
        }
        if self.auth.login_window_secs <= 0 {
            return Err(ConfigError::Message(
                "auth.login_window_secs must be positive".into(),
            ));
        }
        if self.auth.login_window_secs > MAX_LOGIN_WINDOW_SECS {
            return Err(ConfigError::Message(format!(
                "auth.login_window_secs must not exceed {}",
                MAX_LOGIN_WINDOW_SECS
            )));
        }
        Ok(())
    }
}
