//! Generation backend integration: vendor HTTP client, the
//! [`GenerationBackend`] seam, and the [`Retrier`] resilient call wrapper.

mod client;
mod error;
mod generation;
mod retry;
mod types;

#[cfg(test)]
mod client_tests;

pub use client::{StudioClient, truncate};
pub use error::{BackendError, ErrorClass, is_retryable_message};
pub use generation::GenerationBackend;
pub use retry::{Retrier, RetryPolicy};
