//! Quota-bounded persistence for storyforge.
//!
//! Two interchangeable key-value backends (a synchronized remote store and a
//! local fallback) behind one facade that handles capacity failures by
//! evicting the oldest records and sweeps expired records on load.

mod backend;
mod error;
mod local;
mod store;
mod synced;


pub use backend::KeyValueBackend;
pub use error::StoreError;
pub use local::LocalStore;
pub use store::StudioStore;
pub use synced::SyncedStore;
