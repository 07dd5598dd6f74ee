//! Analysis of normalized events.
//!
//! This module turns normalized events into:
//! - Per-core CPU utilization and activity series
//! - Jank classification and frame statistics
//! - Scheduling run-state counts

pub mod cpu_load;
pub mod jank;
pub mod sched_state;

// Re-export main functions
pub use cpu_load::analyze_cpu_load;
pub use jank::detect_jank;
pub use sched_state::count_states;
