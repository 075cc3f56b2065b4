// Configuration management with layered configuration (defaults, file, env)

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Legacy flat environment variables that override the database section
const LEGACY_DB_HOST: &str = "dbhost";
const LEGACY_DB_USER: &str = "dbuser";
const LEGACY_DB_PASSWORD: &str = "dbpassword";
const LEGACY_DB_NAME: &str = "dbname";
const LEGACY_DB_PORT: &str = "dbport";

/// Main settings structure containing all configuration options
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub request_timeout_seconds: u64,
}

/// Store connection parameters used by every request-scoped gateway
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub host: String,
    pub user: String,
    #[serde(default)]
    pub password: String,
    pub name: String,
    pub port: u16,
    pub connect_timeout_seconds: u64,
    pub query_timeout_seconds: u64,
}

impl DatabaseConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_seconds)
    }

    pub fn query_timeout(&self) -> Duration {
        Duration::from_secs(self.query_timeout_seconds)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    pub log_level: String,
    #[serde(default)]
    pub json_logs: bool,
}

impl Settings {
    /// Load configuration with layered precedence: defaults → file → env
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from_path("config")
    }

    /// Load configuration from a specific path
    pub fn load_from_path<P: AsRef<Path>>(config_dir: P) -> Result<Self, ConfigError> {
        let config_dir = config_dir.as_ref();
        let defaults = Settings::default();

        let builder = Config::builder()
            .set_default("server.host", defaults.server.host)?
            .set_default("server.port", i64::from(defaults.server.port))?
            .set_default(
                "server.request_timeout_seconds",
                defaults.server.request_timeout_seconds as i64,
            )?
            .set_default("database.host", defaults.database.host)?
            .set_default("database.user", defaults.database.user)?
            .set_default("database.password", defaults.database.password)?
            .set_default("database.name", defaults.database.name)?
            .set_default("database.port", i64::from(defaults.database.port))?
            .set_default(
                "database.connect_timeout_seconds",
                defaults.database.connect_timeout_seconds as i64,
            )?
            .set_default(
                "database.query_timeout_seconds",
                defaults.database.query_timeout_seconds as i64,
            )?
            .set_default("observability.log_level", defaults.observability.log_level)?
            .set_default("observability.json_logs", defaults.observability.json_logs)?
            .add_source(File::from(config_dir.join("default.toml")).required(false))
            // Add local configuration (not committed to git)
            .add_source(File::from(config_dir.join("local.toml")).required(false))
            .add_source(
                Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            )
            .set_override_option("database.host", std::env::var(LEGACY_DB_HOST).ok())?
            .set_override_option("database.user", std::env::var(LEGACY_DB_USER).ok())?
            .set_override_option("database.password", std::env::var(LEGACY_DB_PASSWORD).ok())?
            .set_override_option("database.name", std::env::var(LEGACY_DB_NAME).ok())?
            .set_override_option("database.port", std::env::var(LEGACY_DB_PORT).ok())?;

        let config = builder.build()?;
        config.try_deserialize()
    }

    /// Validate configuration settings
    pub fn validate(&self) -> Result<(), String> {
        if self.server.port == 0 {
            return Err("Server port must be greater than 0".to_string());
        }
        if self.server.request_timeout_seconds == 0 {
            return Err("Server request_timeout_seconds must be greater than 0".to_string());
        }

        if self.database.host.is_empty() {
            return Err("Database host cannot be empty".to_string());
        }
        if self.database.user.is_empty() {
            return Err("Database user cannot be empty".to_string());
        }
        if self.database.name.is_empty() {
            return Err("Database name cannot be empty".to_string());
        }
        if self.database.port == 0 {
            return Err("Database port must be greater than 0".to_string());
        }
        if self.database.connect_timeout_seconds == 0 || self.database.query_timeout_seconds == 0 {
            return Err("Database timeouts must be greater than 0".to_string());
        }

        Ok(())
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8000,
                request_timeout_seconds: 60,
            },
            database: DatabaseConfig {
                host: "localhost".to_string(),
                user: "root".to_string(),
                password: String::new(),
                name: "banco1022a".to_string(),
                port: 3306,
                connect_timeout_seconds: 10,
                query_timeout_seconds: 30,
            },
            observability: ObservabilityConfig {
                log_level: "info".to_string(),
                json_logs: false,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Serializes tests that read or write process environment variables
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    const OVERRIDE_VARS: [&str; 6] = [
        LEGACY_DB_HOST,
        LEGACY_DB_USER,
        LEGACY_DB_PASSWORD,
        LEGACY_DB_NAME,
        LEGACY_DB_PORT,
        "APP__DATABASE__NAME",
    ];

    fn clear_overrides() {
        for var in OVERRIDE_VARS {
            std::env::remove_var(var);
        }
    }

    #[test]
    fn test_default_settings_are_valid() {
        let settings = Settings::default();
        assert!(settings.validate().is_ok());
        assert_eq!(settings.database.port, 3306);
        assert_eq!(settings.database.name, "banco1022a");
        assert_eq!(settings.server.port, 8000);
    }

    #[test]
    fn test_validation_catches_empty_database_host() {
        let mut settings = Settings::default();
        settings.database.host = String::new();
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_validation_catches_zero_port() {
        let mut settings = Settings::default();
        settings.server.port = 0;
        assert!(settings.validate().is_err());

        let mut settings = Settings::default();
        settings.database.port = 0;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_validation_catches_zero_query_timeout() {
        let mut settings = Settings::default();
        settings.database.query_timeout_seconds = 0;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_empty_password_is_allowed() {
        let settings = Settings::default();
        assert!(settings.database.password.is_empty());
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_load_without_files_falls_back_to_defaults() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        clear_overrides();

        let settings = Settings::load_from_path("does-not-exist").unwrap();

        assert!(settings.validate().is_ok());
        assert_eq!(settings.database.host, "localhost");
        assert_eq!(settings.database.port, 3306);
        assert_eq!(settings.database.name, "banco1022a");
    }

    #[test]
    fn test_environment_overrides_file_and_defaults() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        clear_overrides();

        let dir = std::env::temp_dir().join(format!("livraria-config-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(
            dir.join("default.toml"),
            "[database]\nhost = \"file-host\"\nuser = \"livreiro\"\nname = \"from_file\"\nport = 3310\n",
        )
        .unwrap();

        let from_file = Settings::load_from_path(&dir).unwrap();
        assert_eq!(from_file.database.host, "file-host");
        assert_eq!(from_file.database.port, 3310);
        assert_eq!(from_file.database.name, "from_file");

        std::env::set_var(LEGACY_DB_HOST, "db.internal");
        std::env::set_var(LEGACY_DB_PORT, "3307");
        std::env::set_var("APP__DATABASE__NAME", "livraria");
        let result = Settings::load_from_path(&dir);
        clear_overrides();
        std::fs::remove_dir_all(&dir).ok();

        let settings = result.unwrap();
        assert_eq!(settings.database.host, "db.internal");
        assert_eq!(settings.database.port, 3307);
        assert_eq!(settings.database.name, "livraria");
        assert_eq!(settings.database.user, "livreiro");
        assert_eq!(settings.database.query_timeout_seconds, 30);
    }

    #[test]
    fn test_legacy_name_wins_over_prefixed_variable() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        clear_overrides();

        std::env::set_var("APP__DATABASE__NAME", "livraria");
        std::env::set_var(LEGACY_DB_NAME, "banco_legado");
        let result = Settings::load_from_path("does-not-exist");
        clear_overrides();

        assert_eq!(result.unwrap().database.name, "banco_legado");
    }
}
