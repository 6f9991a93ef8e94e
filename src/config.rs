use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::matching::{
    DEFAULT_CASCADE_STEPS, DEFAULT_EXPANSION_TRIGGER, DEFAULT_THRESHOLD, ResolverOptions,
};

pub const DEFAULT_TABLE: &str = "name_types";

#[derive(Clone, Serialize, Deserialize, Default)]
pub struct DatabaseConfig {
    pub username: String,
    pub password: String,
    pub host: String,
    pub port: u16,
    pub database: String,
}

impl DatabaseConfig {
    pub fn to_url(&self) -> String {
        format!(
            "mysql://{}:{}@{}:{}/{}",
            self.username, self.password, self.host, self.port, self.database
        )
    }

    /// Build from `DB_HOST`, `DB_PORT`, `DB_USER`, `DB_PASSWORD`, `DB_NAME`.
    /// Returns `None` when no host is configured.
    pub fn from_env() -> Option<Self> {
        let host = std::env::var("DB_HOST").ok().filter(|h| !h.trim().is_empty())?;
        let port = std::env::var("DB_PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(3306);
        Some(Self {
            username: std::env::var("DB_USER").unwrap_or_default(),
            password: std::env::var("DB_PASSWORD")
                .or_else(|_| std::env::var("DB_PASS"))
                .unwrap_or_default(),
            host,
            port,
            database: std::env::var("DB_NAME").unwrap_or_default(),
        })
    }
}

impl std::fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database", &self.database)
            .finish()
    }
}

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct MatchingConfig {
    pub threshold: f64,
    pub cascade_steps: u32,
    pub expansion_trigger: usize,
    /// Max edit distance between phonetic codes judged close.
    pub phonetic_max_distance: usize,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            cascade_steps: DEFAULT_CASCADE_STEPS,
            expansion_trigger: DEFAULT_EXPANSION_TRIGGER,
            phonetic_max_distance: 1,
        }
    }
}

impl MatchingConfig {
    pub fn resolver_options(&self) -> ResolverOptions {
        ResolverOptions {
            threshold: self.threshold,
            cascade_steps: self.cascade_steps,
            expansion_trigger: self.expansion_trigger,
        }
    }

    /// Apply `NAME_RESOLVER_THRESHOLD` / `NAME_RESOLVER_CASCADE_STEPS` when set.
    pub fn apply_env(&mut self) {
        if let Ok(s) = std::env::var("NAME_RESOLVER_THRESHOLD") {
            match s.parse::<f64>() {
                Ok(v) => self.threshold = v,
                Err(_) => log::warn!("Invalid NAME_RESOLVER_THRESHOLD='{}'; keeping {}", s, self.threshold),
            }
        }
        if let Ok(s) = std::env::var("NAME_RESOLVER_CASCADE_STEPS") {
            match s.parse::<u32>() {
                Ok(v) => self.cascade_steps = v,
                Err(_) => log::warn!(
                    "Invalid NAME_RESOLVER_CASCADE_STEPS='{}'; keeping {}",
                    s,
                    self.cascade_steps
                ),
            }
        }
    }
}

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct SourceConfig {
    /// Read the reference table from this CSV instead of the database.
    pub csv_path: Option<String>,
    pub table: String,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            csv_path: None,
            table: DEFAULT_TABLE.into(),
        }
    }
}

#[derive(Clone, Serialize, Deserialize, Debug, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub database: Option<DatabaseConfig>,
    #[serde(default)]
    pub matching: MatchingConfig,
    #[serde(default)]
    pub source: SourceConfig,
}

impl AppConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.source.csv_path.is_none() {
            let Some(db) = self.database.as_ref() else {
                return Err(ConfigError::MissingField {
                    field: "database.host",
                });
            };
            if db.host.trim().is_empty() {
                return Err(ConfigError::MissingField {
                    field: "database.host",
                });
            }
            if db.username.trim().is_empty() {
                return Err(ConfigError::MissingField {
                    field: "database.username",
                });
            }
            if db.database.trim().is_empty() {
                return Err(ConfigError::MissingField {
                    field: "database.database",
                });
            }
            if db.port == 0 {
                return Err(ConfigError::InvalidValue {
                    field: "database.port",
                    reason: format!("{} is out of range", db.port),
                });
            }
        }
        if !is_ident(&self.source.table) {
            return Err(ConfigError::InvalidValue {
                field: "source.table",
                reason: format!("'{}' is not a plain identifier", self.source.table),
            });
        }

        let m = &self.matching;
        if !(m.threshold > 0.0 && m.threshold <= 1.0) {
            return Err(ConfigError::InvalidValue {
                field: "matching.threshold",
                reason: format!("{} not in (0, 1]", m.threshold),
            });
        }
        if m.cascade_steps > 9 || m.threshold - 0.1 * f64::from(m.cascade_steps) < -1e-9 {
            return Err(ConfigError::InvalidValue {
                field: "matching.cascade_steps",
                reason: format!(
                    "{} steps from threshold {} would go below zero",
                    m.cascade_steps, m.threshold
                ),
            });
        }
        if m.expansion_trigger == 0 {
            return Err(ConfigError::InvalidValue {
                field: "matching.expansion_trigger",
                reason: "must be > 0".into(),
            });
        }
        Ok(())
    }
}

pub(crate) fn is_ident(name: &str) -> bool {
    !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}
