//! Application model: parts, decomposition and interception.
//!
//! An application is a tree of [`Part`]s. The [`Decomposer`] builds each
//! part through its single matching [`Constructor`], fills its [`Slot`]s
//! depth-first and hands it out wrapped in an [`Intercepted`] proxy whose
//! calls pass through the [`InterceptorChain`].
//!
//! # Components
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Launcher`] | Opens a session and builds the root part |
//! | [`Decomposer`] | Constructor selection and field population |
//! | [`Intercepted`] | Proxy routing calls through interceptors |
//! | [`Interceptor`] | Before and after hooks around a call |
//! | [`Scope`] | Handle, frames and locator a part is bound to |

// ============================================================================
// Submodules
// ============================================================================

/// Built-in interceptors.
pub mod behaviors;

/// Decomposition engine.
pub mod decompose;

/// Interceptor chain and proxy.
pub mod intercept;

/// Application launcher.
pub mod launcher;

/// Part declarations.
pub mod part;

// ============================================================================
// Re-exports
// ============================================================================

pub use behaviors::{AwaitReady, Logging, RetryOnRecoverable};
pub use decompose::Decomposer;
pub use intercept::{
    ChainBuilder, Flow, Intercepted, Interceptor, InterceptorChain, Invocation, Outcome,
};
pub use launcher::{Launcher, Target};
pub use part::{Constructor, Descriptor, Field, Part, Scope, Shape, Slot, SlotFill};
