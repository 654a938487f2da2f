//! Greedy list scheduler.
//!
//! Emits one ready instruction at a time, preferring whichever frees the most
//! bytes. The priority of a ready instruction is the pair (bytes freed, user
//! count), compared lexicographically with larger values winning. Bytes
//! freed is dynamic: it counts every consumed buffer whose only outstanding
//! use is the candidate itself, minus the bytes the candidate defines, minus
//! the peak memory of its largest called subcomputation.
//!
//! Greedy selection cannot guarantee a global optimum; it is one of the
//! strategies raced by [`crate::driver`].

use std::cmp::Reverse;
use std::collections::{BTreeMap, HashMap};

use smallvec::SmallVec;
use snafu::ensure;
use sumrak_ir::{
    BufferId, Computation, ComputationId, InstrId, LogicalBuffer, Module, PointsToAnalysis,
};
use tracing::debug;

use crate::error::{
    EmittedCountMismatchSnafu, NegativePredecessorCountSnafu, NegativeUseCountSnafu, Result,
    StaleReadyEntrySnafu,
};
use crate::liveness::LivenessView;

/// Scheduling priority; larger is scheduled earlier.
type Priority = (i64, i64);

/// Ready-queue key. `Reverse` on the insertion sequence number makes the
/// map's maximum the earliest-inserted entry among equal priorities, so ties
/// pop in insertion order and output is deterministic.
type QueueKey = (Priority, Reverse<u64>);

/// One ready instruction plus the data needed to recompute its priority.
struct ReadyEntry {
    instr: InstrId,
    /// Total non-ignorable bytes defined by the instruction.
    bytes_defined: i64,
    /// Non-ignorable buffers the instruction consumes. These are keys into
    /// the scheduler's use-count table, read at priority time, so count
    /// decrements are visible without rebuilding the entry.
    used: SmallVec<[BufferId; 4]>,
}

/// Produces a memory-minimizing order for one computation.
pub fn list_schedule<F>(
    module: &Module,
    computation: ComputationId,
    points_to: &PointsToAnalysis,
    size_fn: &F,
    memory_by_computation: &HashMap<ComputationId, u64>,
) -> Result<Vec<InstrId>>
where
    F: Fn(&LogicalBuffer) -> u64,
{
    ListScheduler::new(module, computation, points_to, size_fn, memory_by_computation).run()
}

struct ListScheduler<'a, F> {
    comp: &'a Computation,
    computation: ComputationId,
    points_to: &'a PointsToAnalysis,
    size_fn: &'a F,
    /// Peak memory of already-scheduled computations, for charging calls.
    memory_by_computation: &'a HashMap<ComputationId, u64>,
    view: LivenessView,
    /// Unscheduled uses per buffer; starts from the view's table and
    /// decrements as instructions retire.
    use_count: Vec<i64>,
}

impl<'a, F: Fn(&LogicalBuffer) -> u64> ListScheduler<'a, F> {
    fn new(
        module: &'a Module,
        computation: ComputationId,
        points_to: &'a PointsToAnalysis,
        size_fn: &'a F,
        memory_by_computation: &'a HashMap<ComputationId, u64>,
    ) -> Self {
        let view = LivenessView::new(module, computation, points_to);
        let use_count = view.initial_use_count().to_vec();
        Self {
            comp: &module[computation],
            computation,
            points_to,
            size_fn,
            memory_by_computation,
            view,
            use_count,
        }
    }

    fn make_entry(&self, instr: InstrId) -> ReadyEntry {
        let mut bytes_defined = 0i64;
        for &buffer in self.points_to.buffers_defined(self.computation, instr) {
            let buffer = self.points_to.buffer(buffer);
            if !buffer.is_ignorable() {
                bytes_defined += (self.size_fn)(buffer) as i64;
            }
        }
        let used = self
            .view
            .uses(instr)
            .iter()
            .copied()
            .filter(|&buffer| !self.points_to.buffer(buffer).is_ignorable())
            .collect();
        ReadyEntry { instr, bytes_defined, used }
    }

    /// Bytes freed if the entry is scheduled now. An instruction that calls
    /// subcomputations is charged the peak of the largest one only: the
    /// target IR never runs subcomputations concurrently, so their peaks do
    /// not add up.
    fn bytes_freed_if_scheduled(&self, entry: &ReadyEntry) -> i64 {
        let mut freed = 0i64;
        for &buffer in &entry.used {
            if self.use_count[buffer.index()] == 1 {
                freed += (self.size_fn)(self.points_to.buffer(buffer)) as i64;
            }
        }
        let subcomputation = self.comp[entry.instr]
            .called_computations()
            .iter()
            .filter_map(|called| self.memory_by_computation.get(called).copied())
            .max()
            .unwrap_or(0);
        freed - entry.bytes_defined - subcomputation as i64
    }

    fn priority(&self, entry: &ReadyEntry) -> Priority {
        (self.bytes_freed_if_scheduled(entry), self.comp[entry.instr].user_count() as i64)
    }

    fn run(mut self) -> Result<Vec<InstrId>> {
        let comp = self.comp;
        let expected = comp.instruction_count();
        let mut sequence = Vec::with_capacity(expected);

        // An instruction is ready once all operand producers and control
        // predecessors have been emitted.
        let mut pred_count = vec![0i64; comp.slot_count()];
        for (_, instr) in comp.instructions() {
            for &user in instr.users() {
                pred_count[user.index()] += 1;
            }
            for &succ in instr.control_successors() {
                pred_count[succ.index()] += 1;
            }
        }

        let mut queue: BTreeMap<QueueKey, ReadyEntry> = BTreeMap::new();
        let mut handles: HashMap<InstrId, QueueKey> = HashMap::new();
        let mut next_seq = 0u64;

        for id in comp.instr_ids() {
            if pred_count[id.index()] == 0 {
                let entry = self.make_entry(id);
                let priority = self.priority(&entry);
                insert_ready(&mut queue, &mut handles, &mut next_seq, priority, entry);
            }
        }

        while let Some((key, entry)) = queue.pop_last() {
            let best = entry.instr;
            handles.remove(&best);
            let (bytes_freed, _) = key.0;
            debug!(instruction = comp[best].name(), bytes_freed, "schedule instruction");
            sequence.push(best);

            // Retire the consumed buffers. A count dropping to exactly one
            // means some ready instruction may now be the last use, so its
            // priority can rise.
            let mut adjust_queue = false;
            for &buffer in self.view.uses(best) {
                let count = &mut self.use_count[buffer.index()];
                ensure!(
                    *count > 0,
                    NegativeUseCountSnafu {
                        buffer: self.points_to.buffer(buffer).instruction_name(),
                        name: comp[best].name(),
                        id: comp[best].unique_id(),
                    }
                );
                *count -= 1;
                if *count == 1 {
                    adjust_queue = true;
                }
            }

            // Newly ready instructions enter the queue.
            for &succ in comp[best].users().iter().chain(comp[best].control_successors()) {
                let count = &mut pred_count[succ.index()];
                *count -= 1;
                ensure!(
                    *count >= 0,
                    NegativePredecessorCountSnafu {
                        name: comp[succ].name(),
                        id: comp[succ].unique_id(),
                    }
                );
                if *count == 0 {
                    let entry = self.make_entry(succ);
                    let priority = self.priority(&entry);
                    insert_ready(&mut queue, &mut handles, &mut next_seq, priority, entry);
                }
            }

            // Only ready users of the retired instruction's operands can have
            // gained priority; reprice exactly those.
            if adjust_queue {
                let mut operands: SmallVec<[InstrId; 4]> =
                    SmallVec::from_slice(comp[best].operands());
                operands.sort_unstable();
                operands.dedup();
                for &operand in &operands {
                    for &user in comp[operand].users() {
                        let Some(&old_key) = handles.get(&user) else { continue };
                        let Some(entry) = queue.remove(&old_key) else {
                            return StaleReadyEntrySnafu {
                                name: comp[user].name(),
                                id: comp[user].unique_id(),
                            }
                            .fail();
                        };
                        let new_priority = self.priority(&entry);
                        if new_priority == old_key.0 {
                            queue.insert(old_key, entry);
                            continue;
                        }
                        let key = (new_priority, Reverse(next_seq));
                        next_seq += 1;
                        handles.insert(user, key);
                        queue.insert(key, entry);
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
}

fn insert_ready(
    queue: &mut BTreeMap<QueueKey, ReadyEntry>,
    handles: &mut HashMap<InstrId, QueueKey>,
    next_seq: &mut u64,
    priority: Priority,
    entry: ReadyEntry,
) {
    let key = (priority, Reverse(*next_seq));
    *next_seq += 1;
    handles.insert(entry.instr, key);
    queue.insert(key, entry);
}
