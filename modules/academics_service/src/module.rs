//! Module wiring and lifecycle

use crate::api::native::NativeClient;
use crate::config::Config;
use crate::contract::AcademicsApi;
use crate::domain::{Clock, EventPublisher, NoOpEventPublisher, Service, ServicePolicy, SystemClock};
use crate::infra::storage::{sea_orm_repositories, Migrator};
use anyhow::{anyhow, Context, Result};
use parking_lot::RwLock;
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use sea_orm_migration::MigratorTrait;
use std::sync::Arc;

/// Academics service module
pub struct AcademicsServiceModule {
    config: RwLock<Config>,
    service: RwLock<Option<Arc<Service>>>,
    client: RwLock<Option<Arc<dyn AcademicsApi>>>,
}

impl Default for AcademicsServiceModule {
    fn default() -> Self {
        Self {
            config: RwLock::new(Config::default()),
            service: RwLock::new(None),
            client: RwLock::new(None),
        }
    }
}

impl AcademicsServiceModule {
    /// Connect, migrate and build the service with the system clock
    pub async fn init(&self, cfg: Config) -> Result<()> {
        self.init_with(cfg, Arc::new(SystemClock), Arc::new(NoOpEventPublisher))
            .await
    }

    /// Same as [`Self::init`] with injected clock and event publisher
    pub async fn init_with(
        &self,
        cfg: Config,
        clock: Arc<dyn Clock>,
        events: Arc<dyn EventPublisher>,
    ) -> Result<()> {
        cfg.validate()?;

        let db = connect(&cfg).await?;
        if cfg.run_migrations {
            migrate(&db).await?;
        }
        self.init_with_connection(cfg, Arc::new(db), clock, events);
        Ok(())
    }

    /// Build the service over an existing connection; migrations are the caller's
    pub fn init_with_connection(
        &self,
        cfg: Config,
        db: Arc<DatabaseConnection>,
        clock: Arc<dyn Clock>,
        events: Arc<dyn EventPublisher>,
    ) {
        let repos = sea_orm_repositories(db);
        let service = Arc::new(Service::new(repos, clock, events).with_policy(ServicePolicy::from(&cfg)));
        let client: Arc<dyn AcademicsApi> = Arc::new(NativeClient::new(service.clone()));

        *self.config.write() = cfg;
        *self.service.write() = Some(service);
        *self.client.write() = Some(client);

        tracing::info!("Academics service initialized with native client");
    }

    pub fn config(&self) -> Config {
        self.config.read().clone()
    }

    pub fn service(&self) -> Result<Arc<Service>> {
        self.service
            .read()
            .clone()
            .ok_or_else(|| anyhow!("academics service is not initialized"))
    }

    pub fn client(&self) -> Result<Arc<dyn AcademicsApi>> {
        self.client
            .read()
            .clone()
            .ok_or_else(|| anyhow!("academics service is not initialized"))
    }
}

/// Open a pooled connection as configured
pub async fn connect(cfg: &Config) -> Result<DatabaseConnection> {
    let mut options = ConnectOptions::new(cfg.database_url.clone());
    options.max_connections(cfg.max_connections).sqlx_logging(false);
    // Each in-memory SQLite connection is its own database
    if cfg.database_url.contains(":memory:") {
        options.max_connections(1).min_connections(1);
    }

    let db = Database::connect(options)
        .await
        .with_context(|| format!("failed to connect to {}", redact(&cfg.database_url)))?;
    tracing::debug!(max_connections = cfg.max_connections, "academics database connected");
    Ok(db)
}

/// Apply pending migrations
pub async fn migrate(db: &DatabaseConnection) -> Result<()> {
    Migrator::up(db, None).await?;
    tracing::info!("Academics service migrations completed");
    Ok(())
}

/// Drop credentials from a connection string before logging it
fn redact(url: &str) -> String {
    match (url.find("://"), url.rfind('@')) {
        (Some(scheme_end), Some(at)) if at > scheme_end => {
            format!("{}://***{}", &url[..scheme_end], &url[at..])
        }
        _ => url.to_string(),
    }
}
