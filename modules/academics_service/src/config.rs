//! Configuration for academics service module

use crate::contract::model::DEFAULT_START_MONTH;
use anyhow::{bail, Context, Result};
use figment::providers::{Env, Format, Serialized, Yaml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Prefix of environment variables overriding file configuration
pub const ENV_PREFIX: &str = "ACADEMICS_";

/// Academics service configuration
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// SeaORM connection string (postgres:// or sqlite:)
    #[serde(default = "default_database_url")]
    pub database_url: String,

    /// Connection pool size
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// Apply pending migrations on start
    #[serde(default = "default_true")]
    pub run_migrations: bool,

    /// Month (1-12) in which the academic year begins
    #[serde(default = "default_start_month")]
    pub academic_year_start_month: u32,

    /// Upper bound for assignment points
    #[serde(default = "default_max_assignment_points")]
    pub max_assignment_points: u32,

    /// Accept assignments whose due date is already in the past
    #[serde(default)]
    pub allow_past_due_dates: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: default_database_url(),
            max_connections: default_max_connections(),
            run_migrations: true,
            academic_year_start_month: default_start_month(),
            max_assignment_points: default_max_assignment_points(),
            allow_past_due_dates: false,
        }
    }
}

impl Config {
    /// Load defaults, then the optional YAML file, then `ACADEMICS_*` env vars
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut figment = Figment::from(Serialized::defaults(Config::default()));
        if let Some(path) = path {
            figment = figment.merge(Yaml::file(path));
        }
        figment = figment.merge(Env::prefixed(ENV_PREFIX));

        Self::from_figment(&figment)
    }

    /// Extract and validate a configuration from any figment
    pub fn from_figment(figment: &Figment) -> Result<Self> {
        let config: Config = figment
            .extract()
            .context("failed to read academics configuration")?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !(1..=12).contains(&self.academic_year_start_month) {
            bail!(
                "academic_year_start_month must be within 1..=12, got {}",
                self.academic_year_start_month
            );
        }
        if self.max_connections == 0 {
            bail!("max_connections must be positive");
        }
        if self.database_url.trim().is_empty() {
            bail!("database_url cannot be empty");
        }
        Ok(())
    }
}

fn default_database_url() -> String {
    "sqlite::memory:".to_string()
}

fn default_max_connections() -> u32 {
    10
}

fn default_true() -> bool {
    true
}

fn default_start_month() -> u32 {
    DEFAULT_START_MONTH
}

fn default_max_assignment_points() -> u32 {
    1000
}
