//! # RedLilium Core
//!
//! Frame-level building blocks shared by the RedLilium render graph:
//!
//! - [`pool`] - reuse allocations across frames
//! - [`arena`] - per-frame arena with index handles
//! - [`tasks`] - fork-join task scheduling
//! - [`profiling`] - optional Tracy instrumentation

pub mod arena;
pub mod pool;
pub mod profiling;
pub mod tasks;

/// Core library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
