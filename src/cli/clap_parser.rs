use crate::config::{AppConfig, DEFAULT_TABLE, DatabaseConfig, MatchingConfig, SourceConfig};
use crate::error::ConfigError;
use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "name_resolver",
    version,
    about = "Fuzzy canonical name lookup over a phonetic reference table",
    disable_help_subcommand = true
)]
pub struct Cli {
    /// Use this CSV as the reference table instead of MySQL (env: NAME_RESOLVER_CSV)
    #[arg(long, global = true, value_name = "PATH", env = "NAME_RESOLVER_CSV")]
    pub csv: Option<String>,
    /// Reference table name (env: NAME_RESOLVER_TABLE)
    #[arg(long, global = true, env = "NAME_RESOLVER_TABLE", default_value = DEFAULT_TABLE)]
    pub table: String,
    /// Initial similarity threshold (default 0.8)
    #[arg(long, global = true, value_name = "THRESHOLD")]
    pub threshold: Option<f64>,
    /// Extra filter passes at 0.1 lower thresholds (default 1)
    #[arg(long = "cascade-steps", global = true, value_name = "N")]
    pub cascade_steps: Option<u32>,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Resolve a name to its canonical record (JSON)
    Resolve { name: String },
    /// Resolve one name per line of INPUT and write a CSV report to OUT
    Batch { input: String, out: String },
    /// Exact lookup by name
    Get { name: String },
    /// List records sharing the phonetic code of NAME
    Phonetic { name: String },
    /// Add a name to the database
    Add {
        name: String,
        #[arg(long, default_value = "")]
        classification: String,
        /// Pipe-separated variations, e.g. "SYLVA|CILVA"
        #[arg(long, value_delimiter = '|')]
        variations: Vec<String>,
    },
    /// Update a name by id
    Update {
        id: u64,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        classification: Option<String>,
        #[arg(long, value_delimiter = '|')]
        variations: Option<Vec<String>>,
    },
    /// Delete a name by id
    Delete { id: u64 },
    /// Bulk-load a CSV into the database
    Import { csv_path: String },
    /// Write a .env.template
    EnvTemplate { path: Option<String> },
}

impl Command {
    pub fn writes(&self) -> bool {
        matches!(
            self,
            Self::Add { .. } | Self::Update { .. } | Self::Delete { .. } | Self::Import { .. }
        )
    }
}

impl Cli {
    /// Precedence: CLI flag > environment > default.
    pub fn to_app_config(&self) -> Result<AppConfig, ConfigError> {
        let mut matching = MatchingConfig::default();
        matching.apply_env();
        if let Some(t) = self.threshold {
            matching.threshold = t;
        }
        if let Some(n) = self.cascade_steps {
            matching.cascade_steps = n;
        }
        let cfg = AppConfig {
            database: DatabaseConfig::from_env(),
            matching,
            source: SourceConfig {
                csv_path: self.csv.clone(),
                table: self.table.clone(),
            },
        };
        // the template is how a configuration gets created in the first place
        if matches!(self.command, Command::EnvTemplate { .. }) {
            return Ok(cfg);
        }
        cfg.validate()?;
        if self.command.writes() && cfg.database.is_none() {
            return Err(ConfigError::MissingField {
                field: "database.host",
            });
        }
        Ok(cfg)
    }
}

pub fn parse_cli_to_app_config() -> Result<(Cli, AppConfig), ConfigError> {
    let cli = Cli::parse();
    let cfg = cli.to_app_config()?;
    Ok((cli, cfg))
}
