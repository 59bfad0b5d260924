//! Configuration module for Quill
//!
//! This module handles user preferences and viewer settings, including
//! serialization to JSON, persistent storage in platform-specific
//! directories, resource lookup, and the revision-tracking service that
//! owns the viewer template cache.

mod persistence;
mod resources;
mod service;
mod settings;

pub use persistence::*;
pub use resources::ResourceLocator;
#[cfg(test)]
pub use resources::bundled_asset;
pub use service::ConfigService;
pub use settings::*;
