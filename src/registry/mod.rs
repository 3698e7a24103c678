//! Handle registry.
//!
//! Discovers surfaces, binds one [`Handle`](crate::surface::Handle) per
//! surface identifier, reclaims handles whose surface vanished and answers
//! "handle #i", "handle matching P" and "newly opened handle" queries.

// ============================================================================
// Submodules
// ============================================================================

/// Registry state machine and queries.
pub mod manager;

/// Surface matchers.
pub mod query;

// ============================================================================
// Re-exports
// ============================================================================

pub use manager::Registry;
pub use query::{HandleQuery, SurfaceMatcher};
