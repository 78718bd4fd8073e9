//! Transactional resource store.
//!
//! # Data Flow
//! ```text
//! descriptor predicate / action
//!     → ResourceStore (read / create / update / upsert / delete)
//!     → DashMap<id, Arc<Mutex<Slot>>> (slot lookup only)
//!     → per-id Mutex (the transaction boundary)
//!     → Entry snapshot handed back to the caller
//! ```
//!
//! # Design Decisions
//! - Each id owns its own lock; the shared map is only touched to find or insert a slot
//! - Versions come from one store-wide clock, so a revived id never repeats an ETag
//! - Deleted ids stay behind as tombstones for the lifetime of the store
//! - Callers never see a lock; every operation is a single transaction

pub mod entry;
pub mod error;
pub mod memory;

pub use entry::Entry;
pub use error::{StoreError, StoreResult};
pub use memory::{IdStrategy, ResourceStore, Upserted};
