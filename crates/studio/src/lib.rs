//! Service layer for storyforge
//!
//! Centralizes business logic between the caller-facing surface and the
//! generation backend / persistent store: action lifecycle with
//! last-writer-wins cancellation, daily quota enforcement, and the
//! saved-item collection.

mod error;
mod prompt;
mod service;


pub use error::StudioError;
pub use prompt::{motion_prompt, panel_prompt};
pub use service::StudioService;
