//! Schedule containers: per-module instruction sequences and their id form.

use std::collections::HashMap;

use sumrak_ir::{ComputationId, InstrId, Module};

/// A total instruction order for every scheduled (non-fusion) computation.
///
/// Owned by the caller once returned; only [`update_schedule`]
/// (crate::update_schedule) mutates one after the fact.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModuleSchedule {
    sequences: HashMap<ComputationId, Vec<InstrId>>,
}

impl ModuleSchedule {
    pub fn insert(&mut self, computation: ComputationId, sequence: Vec<InstrId>) {
        self.sequences.insert(computation, sequence);
    }

    pub fn sequence(&self, computation: ComputationId) -> Option<&[InstrId]> {
        self.sequences.get(&computation).map(Vec::as_slice)
    }

    pub fn contains(&self, computation: ComputationId) -> bool {
        self.sequences.contains_key(&computation)
    }

    pub fn computations(&self) -> impl Iterator<Item = ComputationId> + '_ {
        self.sequences.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.sequences.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sequences.is_empty()
    }
}

/// A schedule keyed by module-unique instruction ids instead of slots.
///
/// Slots are only stable while the module is unchanged; unique ids survive
/// mutation, so this is the form handed back to [`update_schedule`]
/// (crate::update_schedule) after the module has been edited.
pub type IdSchedule = HashMap<ComputationId, Vec<u64>>;

/// Converts a module schedule into its unique-id form.
pub fn compute_id_schedule(module: &Module, schedule: &ModuleSchedule) -> IdSchedule {
    let mut id_schedule = IdSchedule::new();
    for computation in schedule.computations() {
        let comp = &module[computation];
        let Some(sequence) = schedule.sequence(computation) else { continue };
        let ids = sequence.iter().map(|&instr| comp[instr].unique_id()).collect();
        id_schedule.insert(computation, ids);
    }
    id_schedule
}
