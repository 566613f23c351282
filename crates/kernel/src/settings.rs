use std::path::PathBuf;

use anyhow::{anyhow, Context};
use serde::Deserialize;

const DEFAULT_ENV: &str = "local";
const ENV_VAR_NAME: &str = "LIBRIS_ENV";
const CONFIG_DIR_ENV: &str = "LIBRIS_CONFIG_DIR";

/// Upper bound for `loan_period_days` and `due_soon_days`, ten years.
pub const MAX_LENDING_DAYS: i64 = 3650;

/// Deployment environment the application is running in.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Local,
    Staging,
    Production,
}

impl Environment {
    fn parse(name: &str) -> anyhow::Result<Self> {
        match name {
            "local" => Ok(Self::Local),
            "staging" => Ok(Self::Staging),
            "production" => Ok(Self::Production),
            other => Err(anyhow!(
                "unsupported environment '{}'; expected local/staging/production",
                other
            )),
        }
    }
}

/// Top-level configuration structure loaded from layered sources.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Settings {
    #[serde(default)]
    pub environment: Environment,
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub storage: StorageSettings,
    #[serde(default)]
    pub lending: LendingSettings,
    #[serde(default)]
    pub telemetry: TelemetrySettings,
}

impl Settings {
    /// Load configuration by layering `.env`, base file, and environment overlay.
    pub fn load() -> anyhow::Result<Self> {
        // Allow missing `.env` files without failing.
        let _ = dotenvy::dotenv();

        let environment = std::env::var(ENV_VAR_NAME).unwrap_or_else(|_| DEFAULT_ENV.to_string());
        let config_dir = match std::env::var(CONFIG_DIR_ENV) {
            Ok(dir) => PathBuf::from(dir),
            // Default to repo root `config` directory.
            Err(_) => std::env::current_dir()
                .map(|cwd| cwd.join("config"))
                .context("unable to resolve current directory")?,
        };

        let base_path = config_dir.join("base.toml");
        let environment_path = config_dir.join(format!("{}.toml", environment));

        let cfg = config::Config::builder()
            .add_source(config::File::from(base_path).required(false))
            .add_source(config::File::from(environment_path).required(false))
            .add_source(
                config::Environment::with_prefix("LIBRIS")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()
            .with_context(|| "failed to build configuration")?;

        let mut settings: Settings = cfg
            .try_deserialize()
            .with_context(|| "failed to deserialize configuration")?;

        // Override environment field with parsed enum variant.
        settings.environment = Environment::parse(&environment)?;
        settings
            .lending
            .validate()
            .with_context(|| "invalid [lending] configuration")?;

        Ok(settings)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "ServerSettings::default_host")]
    pub host: String,
    #[serde(default = "ServerSettings::default_port")]
    pub port: u16,
    #[serde(default = "ServerSettings::default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

impl ServerSettings {
    fn default_host() -> String {
        "127.0.0.1".to_string()
    }

    fn default_port() -> u16 {
        8080
    }

    fn default_request_timeout_ms() -> u64 {
        15000
    }
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: Self::default_host(),
            port: Self::default_port(),
            request_timeout_ms: Self::default_request_timeout_ms(),
        }
    }
}

/// Which key-value backend holds the catalog.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Memory,
    #[default]
    File,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageSettings {
    #[serde(default)]
    pub backend: StorageBackend,
    /// Location of the storage scope file when `backend = "file"`.
    #[serde(default = "StorageSettings::default_path")]
    pub path: PathBuf,
    #[serde(default = "StorageSettings::default_books_key")]
    pub books_key: String,
    #[serde(default = "StorageSettings::default_borrowed_key")]
    pub borrowed_key: String,
}

impl StorageSettings {
    fn default_path() -> PathBuf {
        PathBuf::from("data/library.json")
    }

    fn default_books_key() -> String {
        "library_books".to_string()
    }

    fn default_borrowed_key() -> String {
        "borrowed_books".to_string()
    }
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            backend: StorageBackend::default(),
            path: Self::default_path(),
            books_key: Self::default_books_key(),
            borrowed_key: Self::default_borrowed_key(),
        }
    }
}

/// Loan rules applied by the catalog.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct LendingSettings {
    /// Maximum number of books out at once, across the whole catalog.
    #[serde(default = "LendingSettings::default_max_loans")]
    pub max_loans: usize,
    #[serde(default = "LendingSettings::default_loan_period_days")]
    pub loan_period_days: i64,
    #[serde(default = "LendingSettings::default_due_soon_days")]
    pub due_soon_days: i64,
}

impl LendingSettings {
    fn default_max_loans() -> usize {
        3
    }

    fn default_loan_period_days() -> i64 {
        14
    }

    fn default_due_soon_days() -> i64 {
        3
    }

    /// Reject rules that would make every loan overdue at once or push due
    /// dates out of the representable range.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.max_loans == 0 {
            return Err(anyhow!("max_loans must be at least 1"));
        }
        if !(1..=MAX_LENDING_DAYS).contains(&self.loan_period_days) {
            return Err(anyhow!(
                "loan_period_days must be between 1 and {}, got {}",
                MAX_LENDING_DAYS,
                self.loan_period_days
            ));
        }
        if !(0..=MAX_LENDING_DAYS).contains(&self.due_soon_days) {
            return Err(anyhow!(
                "due_soon_days must be between 0 and {}, got {}",
                MAX_LENDING_DAYS,
                self.due_soon_days
            ));
        }
        Ok(())
    }
}

impl Default for LendingSettings {
    fn default() -> Self {
        Self {
            max_loans: Self::default_max_loans(),
            loan_period_days: Self::default_loan_period_days(),
            due_soon_days: Self::default_due_soon_days(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TelemetrySettings {
    #[serde(default)]
    pub log_format: LogFormat,
    /// Default `EnvFilter` directive; `RUST_LOG` takes precedence.
    #[serde(default = "TelemetrySettings::default_filter")]
    pub filter: String,
}

impl TelemetrySettings {
    fn default_filter() -> String {
        "info".to_string()
    }
}

impl Default for TelemetrySettings {
    fn default() -> Self {
        Self {
            log_format: LogFormat::Pretty,
            filter: Self::default_filter(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}
