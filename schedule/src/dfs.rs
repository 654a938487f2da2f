//! DFS scheduler.
//!
//! Emits a computation in DFS post-order, choosing which operand to descend
//! into first with two transitive weights: `extra_users` (users beyond the
//! first, so high-fan-out subtrees are visited earlier) and `total_size`
//! (bytes defined by the subtree). Both weights fold in the weights of the
//! instruction's operands.

use std::collections::HashMap;

use smallvec::SmallVec;
use snafu::ensure;
use sumrak_ir::{ComputationId, InstrId, LogicalBuffer, Module, PointsToAnalysis};

use crate::error::{EmittedCountMismatchSnafu, Result};

/// Produces a DFS post-order for one computation, high-fan-out and
/// large-footprint operands first.
pub fn dfs_schedule<F>(
    module: &Module,
    computation: ComputationId,
    points_to: &PointsToAnalysis,
    size_fn: &F,
    _memory_by_computation: &HashMap<ComputationId, u64>,
) -> Result<Vec<InstrId>>
where
    F: Fn(&LogicalBuffer) -> u64,
{
    let comp = &module[computation];
    let expected = comp.instruction_count();

    // The weights are transitive, so a node reached along multiple paths is
    // double-counted; on large branchy graphs the raw sums overflow. The
    // running total of raw sizes and the module's instruction census bound
    // them. It is unclear why transitive sizes matter at all here (a node's
    // own inputs and outputs should be what counts), but the heuristic is
    // kept as-is.
    let mut cumulative_total_size = 0i64;
    let total_instructions = module.num_unique_instruction_ids() as i64;
    let mut extra_users = vec![0i64; comp.slot_count()];
    let mut total_sizes = vec![0i64; comp.slot_count()];

    for id in comp.post_order() {
        let instr = &comp[id];
        if instr.opcode().is_parameter() || instr.opcode().is_constant() {
            continue;
        }
        extra_users[id.index()] = instr.user_count().saturating_sub(1) as i64;
        let mut defined_bytes = 0i64;
        for &buffer in points_to.buffers_defined(computation, id) {
            defined_bytes += size_fn(points_to.buffer(buffer)) as i64;
        }
        total_sizes[id.index()] = defined_bytes;
        cumulative_total_size += defined_bytes;

        let mut operands: SmallVec<[InstrId; 4]> = SmallVec::from_slice(instr.operands());
        operands.sort_unstable();
        operands.dedup();
        for &operand in &operands {
            extra_users[id.index()] += extra_users[operand.index()];
            total_sizes[id.index()] += total_sizes[operand.index()];
        }
        total_sizes[id.index()] = total_sizes[id.index()].min(cumulative_total_size);
        extra_users[id.index()] = extra_users[id.index()].min(total_instructions);
    }

    let weight_order = |a: &InstrId, b: &InstrId| {
        extra_users[b.index()]
            .cmp(&extra_users[a.index()])
            .then(total_sizes[b.index()].cmp(&total_sizes[a.index()]))
            .then(comp[*a].name().cmp(comp[*b].name()))
    };

    let mut sequence = Vec::with_capacity(expected);
    let mut visited = vec![false; comp.slot_count()];
    for root in comp.traversal_roots() {
        if visited[root.index()] {
            continue;
        }
        visited[root.index()] = true;
        // Children: operands sorted by weight, then control predecessors
        // sorted the same way.
        let children = |id: InstrId| -> Vec<InstrId> {
            let instr = &comp[id];
            let mut operands = instr.operands().to_vec();
            operands.sort_by(&weight_order);
            let mut preds = instr.control_predecessors().to_vec();
            preds.sort_by(&weight_order);
            operands.extend(preds);
            operands
        };
        let mut stack: Vec<(InstrId, Vec<InstrId>, usize)> = vec![(root, children(root), 0)];
        while let Some(top) = stack.last_mut() {
            let child = top.2;
            top.2 += 1;
            match top.1.get(child).copied() {
                Some(dep) => {
                    if !visited[dep.index()] {
                        visited[dep.index()] = true;
                        let deps = children(dep);
                        stack.push((dep, deps, 0));
                    }
                }
                None => {
                    let id = top.0;
                    sequence.push(id);
                    stack.pop();
                }
            }
        }
    }

    ensure!(
        sequence.len() == expected,
        EmittedCountMismatchSnafu {
            computation: comp.name(),
            emitted: sequence.len(),
            expected,
        }
    );
    Ok(sequence)
}
