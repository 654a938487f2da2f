//! Incremental schedule update after module mutation.
//!
//! The caller keeps the previous schedule as unique-id sequences (see
//! [`compute_id_schedule`](crate::compute_id_schedule)), mutates the module,
//! then reconciles: surviving instructions keep their relative order, removed
//! ones drop out, and every new instruction is placed as early as its
//! operands permit.

use std::collections::{HashMap, HashSet, VecDeque};

use snafu::ensure;
use sumrak_ir::{Computation, InstrId, Module};

use crate::error::{MissingComputationSnafu, NegativeOperandCountSnafu, Result};
use crate::sequence::{IdSchedule, ModuleSchedule};
use crate::verify::verify_schedule;

/// Rebuilds `schedule` against the current state of `module`, then verifies
/// it. `id_schedule` is the previous schedule keyed by unique instruction id.
pub fn update_schedule(
    module: &Module,
    id_schedule: &IdSchedule,
    schedule: &mut ModuleSchedule,
) -> Result<()> {
    for computation in module.non_fusion_computations() {
        let comp = &module[computation];
        let old_ids = id_schedule
            .get(&computation)
            .ok_or_else(|| MissingComputationSnafu { computation: comp.name() }.build())?;
        let sequence = merge_computation(comp, old_ids)?;
        schedule.insert(computation, sequence);
    }
    verify_schedule(module, schedule)
}

fn merge_computation(comp: &Computation, old_ids: &[u64]) -> Result<Vec<InstrId>> {
    let mut id_to_instr: HashMap<u64, InstrId> = HashMap::with_capacity(comp.instruction_count());
    for (id, instr) in comp.instructions() {
        id_to_instr.insert(instr.unique_id(), id);
    }
    let scheduled_ids: HashSet<u64> = old_ids.iter().copied().collect();

    // New instructions wait for their operand count to drain before they can
    // be appended; each operand occurrence remembers which new instructions
    // consume it.
    let mut new_users: HashMap<InstrId, Vec<InstrId>> = HashMap::new();
    let mut operand_count: HashMap<InstrId, i64> = HashMap::new();
    let mut worklist: VecDeque<InstrId> = VecDeque::new();
    for (id, instr) in comp.instructions() {
        if scheduled_ids.contains(&instr.unique_id()) {
            continue;
        }
        for &operand in instr.operands() {
            new_users.entry(operand).or_default().push(id);
        }
        if instr.operands().is_empty() {
            worklist.push_back(id);
        }
        operand_count.insert(id, instr.operands().len() as i64);
    }

    let mut sequence = Vec::with_capacity(comp.instruction_count());
    drain_worklist(comp, &mut worklist, &mut sequence, &new_users, &mut operand_count)?;
    for old_id in old_ids {
        // Deleted from the module: drop from the schedule.
        let Some(&id) = id_to_instr.get(old_id) else { continue };
        worklist.push_back(id);
        drain_worklist(comp, &mut worklist, &mut sequence, &new_users, &mut operand_count)?;
    }
    Ok(sequence)
}

fn drain_worklist(
    comp: &Computation,
    worklist: &mut VecDeque<InstrId>,
    sequence: &mut Vec<InstrId>,
    new_users: &HashMap<InstrId, Vec<InstrId>>,
    operand_count: &mut HashMap<InstrId, i64>,
) -> Result<()> {
    while let Some(id) = worklist.pop_front() {
        sequence.push(id);
        let Some(users) = new_users.get(&id) else { continue };
        for &user in users {
            let count = operand_count
                .get_mut(&user)
                .ok_or_else(|| {
                    NegativeOperandCountSnafu {
                        name: comp[user].name(),
                        id: comp[user].unique_id(),
                    }
                    .build()
                })?;
            *count -= 1;
            ensure!(
                *count >= 0,
                NegativeOperandCountSnafu { name: comp[user].name(), id: comp[user].unique_id() }
            );
            if *count == 0 {
                worklist.push_back(user);
            }
        }
    }
    Ok(())
}
