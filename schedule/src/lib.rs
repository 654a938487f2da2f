//! Memory-minimizing instruction scheduling for sumrak IR modules.
//!
//! Produces, for every non-fusion computation of a module, a total
//! instruction order consistent with data and control dependencies that
//! tries to minimize peak live memory under sequential execution.
//!
//! # Module Organization
//!
//! - [`liveness`] - Per-computation buffer use sets and unscheduled-use counts
//! - [`list`] - Greedy list scheduler with a repriceable ready queue
//! - [`dfs`] - DFS post-order scheduler with transitive weight heuristics
//! - [`post_order`] - The computation's natural post-order, verbatim
//! - [`driver`] - Strategy racing and call-graph-ordered module scheduling
//! - [`memory`] - Fragmentation-free peak-memory simulation used for scoring
//! - [`update`] - Incremental schedule reconciliation after module mutation
//! - [`verify`] - Completeness and topological validity checks
//!
//! All entry points are pure with respect to the module: the IR and the
//! points-to analysis are borrowed read-only for the duration of a run, and
//! every failure aborts the run with an error instead of a partial schedule.

pub mod dfs;
pub mod driver;
pub mod error;
pub mod list;
pub mod liveness;
pub mod memory;
pub mod post_order;
pub mod sequence;
pub mod update;
pub mod verify;

#[cfg(test)]
pub mod test;

pub use driver::{Algorithm, schedule_module, schedule_one_computation};
pub use error::{Error, Result};
pub use liveness::LivenessView;
pub use memory::peak_memory;
pub use sequence::{IdSchedule, ModuleSchedule, compute_id_schedule};
pub use update::update_schedule;
pub use verify::verify_schedule;
