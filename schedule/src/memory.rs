//! Fragmentation-free peak-memory simulation.
//!
//! Walks a sequence and tracks the total size of live buffers: a buffer
//! becomes live when its defining instruction executes and is released after
//! the instruction holding its last use retires. Buffers reachable from the
//! root stay live to the end. An instruction that calls subcomputations
//! transiently adds the peak of the largest one while it runs.
//!
//! This is a lower bound on real allocator behavior (no fragmentation, no
//! packing); it exists to score candidate sequences against each other.

use std::collections::HashMap;

use sumrak_ir::{ComputationId, InstrId, LogicalBuffer, Module, PointsToAnalysis};

use crate::error::{Result, UseBeforeDefinitionSnafu};

/// Peak bytes simultaneously live while executing `sequence`.
pub fn peak_memory<F>(
    module: &Module,
    computation: ComputationId,
    sequence: &[InstrId],
    points_to: &PointsToAnalysis,
    size_fn: &F,
    memory_by_computation: &HashMap<ComputationId, u64>,
) -> Result<u64>
where
    F: Fn(&LogicalBuffer) -> u64,
{
    let comp = &module[computation];

    // Per-step consumed sets and, per buffer, the last step that touches it.
    let mut consumed_at: Vec<Vec<_>> = Vec::with_capacity(sequence.len());
    let mut last_action: HashMap<_, usize> = HashMap::new();
    for (step, &id) in sequence.iter().enumerate() {
        let mut consumed: Vec<_> = comp[id]
            .operands()
            .iter()
            .flat_map(|&op| points_to.points_to(computation, op).iter().copied())
            .collect();
        consumed.sort_unstable();
        consumed.dedup();
        for &buffer in consumed.iter().chain(points_to.buffers_defined(computation, id)) {
            last_action.insert(buffer, step);
        }
        consumed_at.push(consumed);
    }

    let live_out: std::collections::HashSet<_> =
        points_to.live_out(module, computation).iter().copied().collect();

    let mut allocated = vec![false; points_to.buffer_count()];
    let mut live_bytes = 0u64;
    let mut peak = 0u64;

    for (step, &id) in sequence.iter().enumerate() {
        for &buffer in points_to.buffers_defined(computation, id) {
            if !points_to.buffer(buffer).is_ignorable() {
                allocated[buffer.index()] = true;
                live_bytes += size_fn(points_to.buffer(buffer));
            }
        }
        for &buffer in &consumed_at[step] {
            let buffer = points_to.buffer(buffer);
            if !buffer.is_ignorable() && !allocated[buffer.id().index()] {
                return UseBeforeDefinitionSnafu {
                    buffer: buffer.instruction_name(),
                    name: comp[id].name(),
                    id: comp[id].unique_id(),
                }
                .fail();
            }
        }

        // Subcomputations do not run concurrently: only the largest peak is
        // resident while this instruction executes.
        let transient = comp[id]
            .called_computations()
            .iter()
            .filter_map(|called| memory_by_computation.get(called).copied())
            .max()
            .unwrap_or(0);
        peak = peak.max(live_bytes + transient);

        for &buffer in
            consumed_at[step].iter().chain(points_to.buffers_defined(computation, id))
        {
            if last_action.get(&buffer) == Some(&step)
                && allocated[buffer.index()]
                && !live_out.contains(&buffer)
            {
                allocated[buffer.index()] = false;
                live_bytes -= size_fn(points_to.buffer(buffer));
            }
        }
    }

    Ok(peak)
}
