//! Port definitions (hexagonal architecture)
//!
//! Ports define the interfaces for the collaborators the custody core does
//! not own: the clock, durable account storage and the value transfer
//! mechanism. Services depend only on these traits.

mod clock;
mod repository;
mod transfer;

pub use clock::Clock;
pub use repository::AccountRepository;
pub use transfer::ValueTransfer;
