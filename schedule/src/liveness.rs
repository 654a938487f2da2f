//! Per-computation buffer liveness view.
//!
//! Precomputes, for one computation, which buffers each instruction consumes
//! and how many unscheduled uses every buffer has. Buffers reachable from the
//! root carry one extra implicit use: they are live out of the computation
//! and conceptually consumed at its end, so scheduling their last explicit
//! user must never drop their count to zero.
//!
//! The view is immutable once built; the list scheduler clones the count
//! table and decrements its own copy as the schedule advances.

use sumrak_ir::{BufferId, ComputationId, InstrId, Module, PointsToAnalysis};

#[derive(Debug)]
pub struct LivenessView {
    /// Deduplicated buffers consumed per instruction slot, operands flattened
    /// through the points-to analysis.
    uses: Vec<Vec<BufferId>>,
    /// Unscheduled-use count per buffer, indexed by [`BufferId`].
    initial_use_count: Vec<i64>,
}

impl LivenessView {
    pub fn new(module: &Module, computation: ComputationId, points_to: &PointsToAnalysis) -> Self {
        let comp = &module[computation];
        let mut uses = vec![Vec::new(); comp.slot_count()];
        let mut counts = vec![0i64; points_to.buffer_count()];

        for (id, instr) in comp.instructions() {
            let mut consumed: Vec<BufferId> = instr
                .operands()
                .iter()
                .flat_map(|&op| points_to.points_to(computation, op).iter().copied())
                .collect();
            consumed.sort_unstable();
            consumed.dedup();
            for &buffer in &consumed {
                counts[buffer.index()] += 1;
            }
            uses[id.index()] = consumed;
        }

        for &buffer in points_to.live_out(module, computation) {
            counts[buffer.index()] += 1;
        }

        Self { uses, initial_use_count: counts }
    }

    /// Buffers the instruction consumes, deduplicated.
    pub fn uses(&self, instr: InstrId) -> &[BufferId] {
        &self.uses[instr.index()]
    }

    /// Starting count table, one slot per buffer in the analysis.
    pub fn initial_use_count(&self) -> &[i64] {
        &self.initial_use_count
    }
}
