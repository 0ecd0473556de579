//! Application state wiring the thread locator and the ownership store.
//!
//! The core is generic over `UnitFactory` and `OwnershipRepository`; AppState
//! pins those to the SQLite implementations in threadkeep-infra.

use std::path::PathBuf;
use std::sync::Arc;

use threadkeep_core::thread::locator::ThreadLocator;
use threadkeep_infra::config::{busy_timeout, idle_timeout, load_global_config};
use threadkeep_infra::filesystem::{resolve_data_dir, threads_dir};
use threadkeep_infra::sqlite::ownership::SqliteOwnershipRepository;
use threadkeep_infra::sqlite::pool::{DatabasePool, database_url};
use threadkeep_infra::sqlite::unit_factory::SqliteUnitFactory;
use threadkeep_types::config::GlobalConfig;

pub type ConcreteLocator = ThreadLocator<SqliteUnitFactory>;

/// Shared application state, used by both CLI commands and HTTP handlers.
#[derive(Clone)]
pub struct AppState {
    pub locator: Arc<ConcreteLocator>,
    pub ownership: Arc<SqliteOwnershipRepository>,
    pub data_dir: PathBuf,
    pub config: GlobalConfig,
}

impl AppState {
    /// Initialize against the resolved data directory.
    pub async fn init() -> anyhow::Result<Self> {
        Self::from_data_dir(resolve_data_dir()).await
    }

    /// Initialize against an explicit data directory: load config, open the
    /// ownership store (running migrations) and set up the thread locator.
    pub async fn from_data_dir(data_dir: PathBuf) -> anyhow::Result<Self> {
        tokio::fs::create_dir_all(&data_dir).await?;

        let config = load_global_config(&data_dir).await;
        let db_pool = DatabasePool::new(&database_url(&data_dir)).await?;

        let factory = SqliteUnitFactory::new(threads_dir(&data_dir), busy_timeout(&config));
        let locator = ThreadLocator::new(factory, config.mailbox_capacity)
            .with_idle_timeout(idle_timeout(&config))
            .with_max_resident(config.max_resident_threads);

        tracing::debug!(
            data_dir = %data_dir.display(),
            mailbox_capacity = config.mailbox_capacity,
            max_resident_threads = config.max_resident_threads,
            "application state ready"
        );

        Ok(Self {
            locator: Arc::new(locator),
            ownership: Arc::new(SqliteOwnershipRepository::new(db_pool)),
            data_dir,
            config,
        })
    }
}
