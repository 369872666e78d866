//! Lock aliases.
//!
//! Everything in the workspace locks through these so the backing
//! implementation can be swapped in one place.

/// Mutex used for short, synchronous critical sections.
pub type SyncMutex<T> = parking_lot::Mutex<T>;

/// Read-write lock used for read-mostly shared state.
pub type SyncRwLock<T> = parking_lot::RwLock<T>;
