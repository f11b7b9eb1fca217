//! API server configuration.
//!
//! Layered, lowest precedence first:
//! 1. built-in defaults
//! 2. `depot.toml` in the working directory (optional)
//! 3. `DEPOT_*` environment variables, `__` between sections
//!    (`DEPOT_DATABASE__SELLER_URL`, `DEPOT_JWT__SECRET`)

use std::time::Duration;

use config::{Config, Environment, File};
use depot_db::DbConfig;
use serde::Deserialize;

/// Default access token lifetime: one shift.
const DEFAULT_ACCESS_LIFETIME_SECS: i64 = 8 * 3600;

/// Database section.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    /// Login belonging to `admin_role`.
    pub admin_url: String,

    /// Login belonging to `seller_role`.
    pub seller_url: String,

    /// Schema owner. Used for migrations, login and employee provisioning.
    pub provisioning_url: String,

    pub max_connections: u32,
    pub min_connections: u32,
    pub connect_timeout_secs: u64,

    /// Apply embedded migrations on startup (provisioning pool only).
    pub run_migrations: bool,
}

/// Token section.
#[derive(Debug, Clone, Deserialize)]
pub struct JwtSettings {
    pub secret: String,

    /// Access token lifetime in seconds
    pub access_lifetime_secs: i64,
}

/// Depot API configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    /// HTTP listen port
    pub http_port: u16,

    pub database: DatabaseSettings,

    pub jwt: JwtSettings,
}

impl ApiConfig {
    /// Load configuration from defaults, `depot.toml` and the environment.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_builder(
            Config::builder()
                .add_source(File::with_name("depot").required(false))
                .add_source(
                    Environment::with_prefix("DEPOT")
                        .prefix_separator("_")
                        .separator("__"),
                ),
        )
    }

    fn from_builder(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
    ) -> Result<Self, ConfigError> {
        let settings = Self::defaults(builder)?
            .build()
            .map_err(|e| ConfigError::InvalidValue(e.to_string()))?;

        let config: ApiConfig = settings
            .try_deserialize()
            .map_err(|e| ConfigError::InvalidValue(e.to_string()))?;

        config.validate()?;
        Ok(config)
    }

    fn defaults(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
    ) -> Result<config::ConfigBuilder<config::builder::DefaultState>, ConfigError> {
        let set = |b: config::ConfigBuilder<config::builder::DefaultState>, key: &str, value: config::Value| {
            b.set_default(key, value)
                .map_err(|e| ConfigError::InvalidValue(format!("{}: {}", key, e)))
        };

        let builder = set(builder, "http_port", 8080_i64.into())?;
        let builder = set(builder, "database.admin_url", "".into())?;
        let builder = set(builder, "database.seller_url", "".into())?;
        let builder = set(builder, "database.provisioning_url", "".into())?;
        let builder = set(builder, "database.max_connections", 10_i64.into())?;
        let builder = set(builder, "database.min_connections", 0_i64.into())?;
        let builder = set(builder, "database.connect_timeout_secs", 30_i64.into())?;
        let builder = set(builder, "database.run_migrations", true.into())?;
        let builder = set(builder, "jwt.secret", "".into())?;
        set(builder, "jwt.access_lifetime_secs", DEFAULT_ACCESS_LIFETIME_SECS.into())
    }

    /// Rejects configurations that would start a server with a broken
    /// privilege split.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let db = &self.database;
        for (key, url) in [
            ("database.admin_url", &db.admin_url),
            ("database.seller_url", &db.seller_url),
            ("database.provisioning_url", &db.provisioning_url),
        ] {
            if url.trim().is_empty() {
                return Err(ConfigError::MissingRequired(key.to_string()));
            }
        }

        if db.admin_url == db.seller_url {
            return Err(ConfigError::SharedRoleLogin);
        }

        if self.jwt.secret.trim().is_empty() {
            return Err(ConfigError::MissingRequired("jwt.secret".to_string()));
        }
        if self.jwt.access_lifetime_secs <= 0 {
            return Err(ConfigError::InvalidValue(
                "jwt.access_lifetime_secs must be positive".to_string(),
            ));
        }

        Ok(())
    }

    fn pool(&self, url: &str) -> DbConfig {
        DbConfig::new(url)
            .max_connections(self.database.max_connections)
            .min_connections(self.database.min_connections)
            .connect_timeout(Duration::from_secs(self.database.connect_timeout_secs))
    }

    pub fn admin_db(&self) -> DbConfig {
        self.pool(&self.database.admin_url)
    }

    pub fn seller_db(&self) -> DbConfig {
        self.pool(&self.database.seller_url)
    }

    pub fn provisioning_db(&self) -> DbConfig {
        self.pool(&self.database.provisioning_url)
            .run_migrations(self.database.run_migrations)
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    InvalidValue(String),

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),

    #[error("database.admin_url and database.seller_url must use different logins")]
    SharedRoleLogin,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn load_from(toml: &str) -> Result<ApiConfig, ConfigError> {
        ApiConfig::from_builder(
            Config::builder().add_source(File::from_str(toml, config::FileFormat::Toml)),
        )
    }

    const FULL: &str = r#"
        [database]
        admin_url = "postgres://admin_app@localhost/depot"
        seller_url = "postgres://seller_app@localhost/depot"
        provisioning_url = "postgres://depot_owner@localhost/depot"

        [jwt]
        secret = "test-secret"
    "#;

    #[test]
    fn test_defaults_fill_the_gaps() {
        let config = load_from(FULL).unwrap();
        assert_eq!(config.http_port, 8080);
        assert_eq!(config.database.max_connections, 10);
        assert!(config.database.run_migrations);
        assert_eq!(config.jwt.access_lifetime_secs, 8 * 3600);
    }

    #[test]
    fn test_missing_url_rejected() {
        let err = load_from("[jwt]\nsecret = \"s\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::MissingRequired(ref k) if k == "database.admin_url"));
    }

    #[test]
    fn test_shared_login_rejected() {
        let toml = r#"
            [database]
            admin_url = "postgres://app@localhost/depot"
            seller_url = "postgres://app@localhost/depot"
            provisioning_url = "postgres://owner@localhost/depot"
            [jwt]
            secret = "s"
        "#;
        assert!(matches!(load_from(toml), Err(ConfigError::SharedRoleLogin)));
    }

    #[test]
    fn test_empty_secret_rejected() {
        let toml = FULL.replace("test-secret", " ");
        assert!(matches!(
            load_from(&toml),
            Err(ConfigError::MissingRequired(ref k)) if k == "jwt.secret"
        ));
    }

    #[test]
    fn test_only_provisioning_pool_migrates() {
        let config = load_from(FULL).unwrap();
        assert!(config.provisioning_db().run_migrations);
        assert!(!config.admin_db().run_migrations);
        assert!(!config.seller_db().run_migrations);
        assert_eq!(config.seller_db().url, "postgres://seller_app@localhost/depot");
    }
}
