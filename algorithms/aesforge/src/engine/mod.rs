//! Execution Engine
//!
//! Capability probing, kernel dispatch and session construction.

pub mod capabilities;
pub mod dispatcher;
pub mod factory;

pub use capabilities::{CapabilityRecord, CpuVariant, CPU_VARIANT_ENV};
pub use factory::{active_backend, create, Engine, EngineFactory};
