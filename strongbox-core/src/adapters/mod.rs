//! Adapter implementations
//!
//! Adapters implement the port traits with concrete technologies:
//! - DuckDB for AccountRepository and the ledger-backed ValueTransfer
//! - In-memory table and payout recorder
//! - System and manual clocks
//! - Advisory file lock on the data directory

pub mod clock;
pub mod duckdb;
pub mod lock;
pub mod memory;
