//! Points-to analysis: resolves instruction outputs to logical buffers.
//!
//! Every non-aliasing instruction defines one fresh buffer. Tuples define a
//! shell buffer and forward their operands' buffers; `get-tuple-element` and
//! `bitcast` define nothing and forward. The analysis is computed once per
//! module and is read-only afterwards, which is what the scheduler's
//! lifecycle requires.

use std::collections::HashMap;

use smallvec::SmallVec;

use crate::computation::InstrId;
use crate::module::{ComputationId, Module};

/// Identity of a logical buffer, unique within one analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BufferId(u32);

impl BufferId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// An abstract storage cell defined by one instruction.
#[derive(Debug, Clone)]
pub struct LogicalBuffer {
    id: BufferId,
    computation: ComputationId,
    instruction: InstrId,
    instruction_id: u64,
    instruction_name: String,
    ignorable: bool,
}

impl LogicalBuffer {
    pub fn id(&self) -> BufferId {
        self.id
    }

    pub fn computation(&self) -> ComputationId {
        self.computation
    }

    /// Slot of the defining instruction.
    pub fn instruction(&self) -> InstrId {
        self.instruction
    }

    /// Unique id of the defining instruction.
    pub fn instruction_id(&self) -> u64 {
        self.instruction_id
    }

    pub fn instruction_name(&self) -> &str {
        &self.instruction_name
    }

    /// Defined by a parameter or constant; never charged to memory.
    pub fn is_ignorable(&self) -> bool {
        self.ignorable
    }
}

#[derive(Debug, Default)]
struct ComputationSets {
    /// Buffers defined per instruction slot.
    defined: Vec<SmallVec<[BufferId; 2]>>,
    /// Flattened, deduplicated buffer set reachable from each slot's output.
    pointed: Vec<Vec<BufferId>>,
}

/// Module-wide buffer resolution. See the module docs for the aliasing rules.
#[derive(Debug)]
pub struct PointsToAnalysis {
    buffers: Vec<LogicalBuffer>,
    sets: HashMap<ComputationId, ComputationSets>,
    empty: Vec<BufferId>,
}

impl PointsToAnalysis {
    pub fn run(module: &Module) -> Self {
        let mut analysis =
            Self { buffers: Vec::new(), sets: HashMap::new(), empty: Vec::new() };
        for (cid, comp) in module.computations() {
            let mut sets = ComputationSets {
                defined: vec![SmallVec::new(); comp.slot_count()],
                pointed: vec![Vec::new(); comp.slot_count()],
            };
            for id in comp.post_order() {
                let instr = &comp[id];
                let opcode = instr.opcode();
                let mut pointed: Vec<BufferId> = Vec::new();
                if opcode.forwards_operands() || opcode.is_tuple() {
                    for &op in instr.operands() {
                        pointed.extend_from_slice(&sets.pointed[op.index()]);
                    }
                }
                if !opcode.forwards_operands() {
                    let buffer = BufferId(analysis.buffers.len() as u32);
                    analysis.buffers.push(LogicalBuffer {
                        id: buffer,
                        computation: cid,
                        instruction: id,
                        instruction_id: instr.unique_id(),
                        instruction_name: instr.name().to_string(),
                        ignorable: opcode.is_parameter() || opcode.is_constant(),
                    });
                    sets.defined[id.index()].push(buffer);
                    pointed.push(buffer);
                }
                pointed.sort_unstable();
                pointed.dedup();
                sets.pointed[id.index()] = pointed;
            }
            analysis.sets.insert(cid, sets);
        }
        analysis
    }

    /// Buffers defined by the instruction (empty for forwarding opcodes).
    pub fn buffers_defined(&self, computation: ComputationId, instr: InstrId) -> &[BufferId] {
        match self.sets.get(&computation) {
            Some(sets) => &sets.defined[instr.index()],
            None => &self.empty,
        }
    }

    /// Flattened set of buffers reachable from the instruction's output.
    pub fn points_to(&self, computation: ComputationId, instr: InstrId) -> &[BufferId] {
        match self.sets.get(&computation) {
            Some(sets) => &sets.pointed[instr.index()],
            None => &self.empty,
        }
    }

    /// Buffers reachable from the computation's root: live out of the
    /// computation and implicitly used at its end.
    pub fn live_out(&self, module: &Module, computation: ComputationId) -> &[BufferId] {
        match module[computation].root() {
            Some(root) => self.points_to(computation, root),
            None => &self.empty,
        }
    }

    pub fn buffer(&self, id: BufferId) -> &LogicalBuffer {
        &self.buffers[id.index()]
    }

    pub fn buffer_count(&self) -> usize {
        self.buffers.len()
    }
}
