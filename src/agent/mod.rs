//! Agent module.
//!
//! This module contains the `Agent` struct (one worker of a crew), its
//! `WorkerKey` identity, and the `WorkerFactory` that builds agents from
//! stored definitions.

pub mod core;
pub mod factory;

// Re-export the main Agent type.
pub use self::core::{Agent, WorkerKey};
pub use self::factory::WorkerFactory;
