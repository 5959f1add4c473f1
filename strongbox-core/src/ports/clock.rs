//! Clock port

/// Source of the current time in unix seconds
///
/// Readings are expected to be monotonically non-decreasing. The core reads
/// the clock once per operation and never caches it between calls.
pub trait Clock: Send + Sync {
    fn now(&self) -> i64;
}
