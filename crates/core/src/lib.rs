//! Core types and constants for storyforge
//!
//! This crate contains domain types shared across all other crates.

pub mod constants;
mod env_config;

mod assets;
mod saved;
mod usage;

pub use assets::*;
pub use env_config::env_parse_with_default;
pub use saved::*;
pub use usage::*;
