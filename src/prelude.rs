//! # genrun Prelude
//!
//! This module provides a convenient prelude for the most commonly used types
//! and traits from the genrun library. Import this module to get quick access
//! to the essential types for running compiled generator bodies.

// ================================================================================================
// Core Types and Error Handling
// ================================================================================================

/// The main error type for all genrun operations
pub use crate::Error;

/// The result type used throughout genrun
pub use crate::Result;

// ================================================================================================
// Main Entry Points
// ================================================================================================

/// Turn a compiled body into a live generator instance
pub use crate::runtime::{wrap, wrap_with_limits};

/// Lift a compiled-body factory into a reusable generator function
pub use crate::runtime::mark;

// ================================================================================================
// Compiled Form
// ================================================================================================

/// A compiler-produced body: start label, exception table, step closure
pub use crate::runtime::CompiledBody;

/// Protected-region tables and the label space
pub use crate::runtime::{ExceptionTable, Label, TryEntry};

/// What one step invocation reports back to the dispatcher
pub use crate::runtime::Flow;

// ================================================================================================
// Instances and Results
// ================================================================================================

/// A live generator instance and its per-call factory
pub use crate::runtime::{Generator, GeneratorFn};

/// The suspend state one instance carries between protocol calls
pub use crate::runtime::Context;

/// The standard iterator-result pair returned by every protocol call
pub use crate::runtime::IterResult;

// ================================================================================================
// Delegation
// ================================================================================================

/// The protocol expected of delegation targets
pub use crate::runtime::Iterable;

/// Adapter making any plain [`Iterator`] a delegation target
pub use crate::runtime::IterDelegate;

// ================================================================================================
// Execution Control
// ================================================================================================

/// Per-resume execution limits and accumulated counters
pub use crate::runtime::{DispatchLimits, DispatchStats};
