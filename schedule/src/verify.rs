//! Schedule verification: completeness and topological validity.

use std::collections::HashMap;

use snafu::ensure;
use sumrak_ir::{InstrId, Module};

use crate::error::{
    ComputationSetMismatchSnafu, ControlOutOfOrderSnafu, DuplicateInstructionSnafu,
    ForeignInstructionSnafu, MissingComputationSnafu, MissingInstructionSnafu,
    OperandOutOfOrderSnafu, Result, UnknownComputationSnafu,
};
use crate::sequence::ModuleSchedule;

/// Checks that the schedule covers exactly the module's non-fusion
/// computations, that each sequence is a permutation of its computation's
/// instructions, and that every operand and control edge points backwards in
/// the sequence. Reports the first violation found.
pub fn verify_schedule(module: &Module, schedule: &ModuleSchedule) -> Result<()> {
    let non_fusion = module.non_fusion_computations();
    ensure!(
        schedule.len() == non_fusion.len(),
        ComputationSetMismatchSnafu { scheduled: schedule.len(), expected: non_fusion.len() }
    );
    for computation in schedule.computations() {
        ensure!(
            module.contains(computation) && !module[computation].is_fusion(),
            UnknownComputationSnafu { computation: computation.to_string() }
        );
    }

    for computation in non_fusion {
        let comp = &module[computation];
        let sequence = schedule
            .sequence(computation)
            .ok_or_else(|| MissingComputationSnafu { computation: comp.name() }.build())?;

        let mut position: HashMap<InstrId, usize> = HashMap::with_capacity(sequence.len());
        for (pos, &id) in sequence.iter().enumerate() {
            ensure!(
                comp.contains(id),
                ForeignInstructionSnafu { computation: comp.name(), slot: id.index() }
            );
            ensure!(
                position.insert(id, pos).is_none(),
                DuplicateInstructionSnafu {
                    computation: comp.name(),
                    name: comp[id].name(),
                    id: comp[id].unique_id(),
                }
            );
        }

        for (id, instr) in comp.instructions() {
            ensure!(
                position.contains_key(&id),
                MissingInstructionSnafu {
                    computation: comp.name(),
                    name: instr.name(),
                    id: instr.unique_id(),
                }
            );
        }

        for (id, instr) in comp.instructions() {
            for &operand in instr.operands() {
                ensure!(
                    position[&operand] < position[&id],
                    OperandOutOfOrderSnafu {
                        name: instr.name(),
                        id: instr.unique_id(),
                        operand_name: comp[operand].name(),
                        operand_id: comp[operand].unique_id(),
                    }
                );
            }
            for &pred in instr.control_predecessors() {
                ensure!(
                    position[&pred] < position[&id],
                    ControlOutOfOrderSnafu {
                        name: instr.name(),
                        id: instr.unique_id(),
                        predecessor_name: comp[pred].name(),
                        predecessor_id: comp[pred].unique_id(),
                    }
                );
            }
        }
    }

    Ok(())
}
