//! Test utilities for scheduler tests.
//!
//! Small builders for named instruction graphs and name-keyed size
//! functions, so scenario tests read close to their diagrams.

use std::collections::HashMap;

use sumrak_ir::{Computation, ComputationId, InstrId, LogicalBuffer, Module, Opcode};

/// Builds a single-computation module from `(name, opcode, operand names)`
/// triples. Operands must be declared before their users; the last entry
/// becomes the root.
pub fn module_from(
    nodes: &[(&str, Opcode, &[&str])],
) -> (Module, ComputationId, HashMap<String, InstrId>) {
    let mut comp = Computation::new("entry");
    let mut by_name: HashMap<String, InstrId> = HashMap::new();
    for (name, opcode, operands) in nodes {
        let operand_ids: Vec<InstrId> = operands.iter().map(|n| by_name[*n]).collect();
        let id = comp.add_instruction(opcode.clone(), *name, &operand_ids).unwrap();
        by_name.insert((*name).to_string(), id);
    }
    if let Some((last, _, _)) = nodes.last() {
        comp.set_root(by_name[*last]).unwrap();
    }
    let mut module = Module::new("test");
    let cid = module.add_computation(comp);
    (module, cid, by_name)
}

/// Size function keyed by defining-instruction name. Buffers of instructions
/// not in the table default to one byte.
pub fn sizes(table: &[(&str, u64)]) -> impl Fn(&LogicalBuffer) -> u64 + use<> {
    let table: HashMap<String, u64> =
        table.iter().map(|(name, size)| ((*name).to_string(), *size)).collect();
    move |buffer: &LogicalBuffer| table.get(buffer.instruction_name()).copied().unwrap_or(1)
}

/// Maps a sequence back to instruction names for readable assertions.
pub fn names(comp: &Computation, sequence: &[InstrId]) -> Vec<String> {
    sequence.iter().map(|&id| comp[id].name().to_string()).collect()
}
