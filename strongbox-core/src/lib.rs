//! Strongbox Core - timelocked single-owner custody accounts
//!
//! This crate implements the custody logic following hexagonal architecture:
//!
//! - **domain**: Core entities and the account state machine
//! - **ports**: Trait definitions for the clock, storage and value transfer
//! - **services**: Business logic orchestration
//! - **adapters**: Concrete implementations (DuckDB, in-memory, clocks, file lock)

pub mod adapters;
pub mod config;
pub mod domain;
pub mod log_migrations;
pub mod migrations;
pub mod ports;
pub mod services;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use adapters::clock::SystemClock;
use adapters::duckdb::DuckDbRepository;
use adapters::lock::DataDirLock;
use config::Config;
use ports::Clock;
use services::{CustodyService, StatusService};

// Re-export commonly used types at crate root
pub use domain::result::{Error, OperationResult, Result};
pub use services::{EntryPoint, LogEvent, LoggingService};
pub use domain::{
    Account, AccountDetails, Amount, Identity, Payout, PayoutKind, TimelockPolicy,
    WithdrawalDetails, WithdrawalStatus,
};

pub const DB_FILE: &str = "strongbox.duckdb";

/// Main context for Strongbox operations
///
/// Holds the data directory lock for its whole lifetime, so operations from
/// different processes against one data directory never interleave.
pub struct StrongboxContext {
    pub config: Config,
    pub data_dir: PathBuf,
    pub repository: Arc<DuckDbRepository>,
    pub custody_service: CustodyService,
    pub status_service: StatusService,
    _lock: DataDirLock,
}

impl StrongboxContext {
    /// Create a context on the wall clock
    pub fn new(data_dir: &Path) -> Result<Self> {
        Self::with_clock(data_dir, Arc::new(SystemClock))
    }

    /// Create a context with an injected clock
    pub fn with_clock(data_dir: &Path, clock: Arc<dyn Clock>) -> Result<Self> {
        std::fs::create_dir_all(data_dir)?;
        let lock = DataDirLock::acquire(data_dir)?;
        let config = Config::load(data_dir)?;

        let repository = Arc::new(DuckDbRepository::new(&data_dir.join(DB_FILE))?);
        repository.ensure_schema()?;

        let custody_service = CustodyService::new(
            repository.clone(),
            repository.clone(),
            clock,
            config.timelock,
        );
        let status_service = StatusService::new(repository.clone());

        Ok(Self {
            config,
            data_dir: data_dir.to_path_buf(),
            repository,
            custody_service,
            status_service,
            _lock: lock,
        })
    }
}
