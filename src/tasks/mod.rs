//! Background Tasks Module
//!
//! Contains background tasks that run periodically during server operation.
//!
//! # Tasks
//! - Retention Sweep: Removes entries older than the retention horizon

mod sweep;

pub use sweep::{run_sweep, spawn_sweep_task};
