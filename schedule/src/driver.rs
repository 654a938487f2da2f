//! Strategy selection and module-level scheduling.
//!
//! The default driver races the list, DFS, and post-order schedulers for each
//! computation, scores every candidate with the peak-memory simulation, and
//! keeps the cheapest. The module scheduler walks computations in call-graph
//! post-order so that a computation's peak is always known by the time its
//! callers are scheduled.

use std::collections::HashMap;

use snafu::ensure;
use sumrak_ir::{ComputationId, InstrId, LogicalBuffer, Module, PointsToAnalysis};
use tracing::debug;

use crate::dfs::dfs_schedule;
use crate::error::{FusionComputationSnafu, Result};
use crate::list::list_schedule;
use crate::memory::peak_memory;
use crate::post_order::post_order_schedule;
use crate::sequence::ModuleSchedule;

/// Scheduling strategy. `None` passed to the entry points means "race all
/// three and keep the cheapest".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Algorithm {
    List,
    Dfs,
    PostOrder,
}

/// Schedules every non-fusion computation of the module.
pub fn schedule_module<F>(
    module: &Module,
    size_fn: &F,
    algorithm: Option<Algorithm>,
) -> Result<ModuleSchedule>
where
    F: Fn(&LogicalBuffer) -> u64,
{
    let points_to = PointsToAnalysis::run(module);
    let mut memory_by_computation = HashMap::new();
    let mut schedule = ModuleSchedule::default();
    for computation in module.computation_post_order() {
        if module[computation].is_fusion() {
            continue;
        }
        let sequence = schedule_computation(
            module,
            computation,
            &points_to,
            size_fn,
            algorithm,
            &memory_by_computation,
        )?;
        let peak = peak_memory(
            module,
            computation,
            &sequence,
            &points_to,
            size_fn,
            &memory_by_computation,
        )?;
        debug!(computation = module[computation].name(), peak_bytes = peak, "computation scheduled");
        memory_by_computation.insert(computation, peak);
        schedule.insert(computation, sequence);
    }
    Ok(schedule)
}

/// Schedules a single non-fusion computation with the default driver,
/// assuming no previously scheduled subcomputations.
pub fn schedule_one_computation<F>(
    module: &Module,
    computation: ComputationId,
    size_fn: &F,
) -> Result<Vec<InstrId>>
where
    F: Fn(&LogicalBuffer) -> u64,
{
    ensure!(
        !module[computation].is_fusion(),
        FusionComputationSnafu { computation: module[computation].name() }
    );
    let points_to = PointsToAnalysis::run(module);
    schedule_computation(module, computation, &points_to, size_fn, None, &HashMap::new())
}

fn schedule_computation<F>(
    module: &Module,
    computation: ComputationId,
    points_to: &PointsToAnalysis,
    size_fn: &F,
    algorithm: Option<Algorithm>,
    memory_by_computation: &HashMap<ComputationId, u64>,
) -> Result<Vec<InstrId>>
where
    F: Fn(&LogicalBuffer) -> u64,
{
    match algorithm {
        Some(Algorithm::List) => {
            list_schedule(module, computation, points_to, size_fn, memory_by_computation)
        }
        Some(Algorithm::Dfs) => {
            dfs_schedule(module, computation, points_to, size_fn, memory_by_computation)
        }
        Some(Algorithm::PostOrder) => post_order_schedule(module, computation),
        None => {
            min_memory_schedule(module, computation, points_to, size_fn, memory_by_computation)
        }
    }
}

/// Races all three strategies and keeps the one with the smallest simulated
/// peak. List wins most graphs; post-order-based orders win some recurrent
/// ones. Ties go to list, then DFS.
fn min_memory_schedule<F>(
    module: &Module,
    computation: ComputationId,
    points_to: &PointsToAnalysis,
    size_fn: &F,
    memory_by_computation: &HashMap<ComputationId, u64>,
) -> Result<Vec<InstrId>>
where
    F: Fn(&LogicalBuffer) -> u64,
{
    let list_sequence =
        list_schedule(module, computation, points_to, size_fn, memory_by_computation)?;
    let list_memory = peak_memory(
        module,
        computation,
        &list_sequence,
        points_to,
        size_fn,
        memory_by_computation,
    )?;
    debug!(bytes = list_memory, "min-memory list sequence");

    let dfs_sequence =
        dfs_schedule(module, computation, points_to, size_fn, memory_by_computation)?;
    let dfs_memory = peak_memory(
        module,
        computation,
        &dfs_sequence,
        points_to,
        size_fn,
        memory_by_computation,
    )?;
    debug!(bytes = dfs_memory, "min-memory dfs sequence");

    let post_order_sequence = post_order_schedule(module, computation)?;
    let post_order_memory = peak_memory(
        module,
        computation,
        &post_order_sequence,
        points_to,
        size_fn,
        memory_by_computation,
    )?;
    debug!(bytes = post_order_memory, "min-memory post-order sequence");

    let min_memory = list_memory.min(dfs_memory).min(post_order_memory);
    if min_memory == list_memory {
        debug!(bytes = list_memory, "chose list sequence");
        Ok(list_sequence)
    } else if min_memory == dfs_memory {
        debug!(bytes = dfs_memory, "chose dfs sequence");
        Ok(dfs_sequence)
    } else {
        debug!(bytes = post_order_memory, "chose post-order sequence");
        Ok(post_order_sequence)
    }
}
