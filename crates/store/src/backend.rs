//! Storage backend abstraction trait.
//!
//! Provides a common interface for the synchronized remote store and the
//! local fallback store. Enables mocking, testing, and backend-agnostic
//! code in the facade.

use async_trait::async_trait;

use crate::error::StoreError;

/// Minimal key-value contract both physical backends satisfy.
///
/// The trait is async to accommodate the remote store; the local store's
/// filesystem calls go through tokio's async fs.
#[async_trait]
pub trait KeyValueBackend: Send + Sync {
    /// Read the raw blob under `key`, `None` when absent.
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Write the raw blob under `key`, replacing any previous value.
    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;
}
