//! Instruction nodes.

use smallvec::SmallVec;

use crate::computation::InstrId;
use crate::module::ComputationId;
use crate::opcode::Opcode;

/// A node in a computation's dataflow graph.
///
/// Operand and called-computation lists are ordered; user and control lists
/// are deduplicated and kept in insertion order. All edges stay inside the
/// owning computation. Instructions are created and wired exclusively through
/// [`Computation`](crate::Computation) mutation methods.
#[derive(Debug, Clone)]
pub struct Instruction {
    id: u64,
    name: String,
    opcode: Opcode,
    operands: SmallVec<[InstrId; 2]>,
    users: Vec<InstrId>,
    control_predecessors: Vec<InstrId>,
    control_successors: Vec<InstrId>,
    called_computations: SmallVec<[ComputationId; 1]>,
}

impl Instruction {
    pub(crate) fn new(
        id: u64,
        name: String,
        opcode: Opcode,
        operands: SmallVec<[InstrId; 2]>,
        called_computations: SmallVec<[ComputationId; 1]>,
    ) -> Self {
        Self {
            id,
            name,
            opcode,
            operands,
            users: Vec::new(),
            control_predecessors: Vec::new(),
            control_successors: Vec::new(),
            called_computations,
        }
    }

    /// Module-unique integer id, stable for the instruction's lifetime.
    pub fn unique_id(&self) -> u64 {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn opcode(&self) -> &Opcode {
        &self.opcode
    }

    pub fn operands(&self) -> &[InstrId] {
        &self.operands
    }

    /// Distinct instructions that take this one as an operand.
    pub fn users(&self) -> &[InstrId] {
        &self.users
    }

    pub fn user_count(&self) -> usize {
        self.users.len()
    }

    pub fn control_predecessors(&self) -> &[InstrId] {
        &self.control_predecessors
    }

    pub fn control_successors(&self) -> &[InstrId] {
        &self.control_successors
    }

    pub fn called_computations(&self) -> &[ComputationId] {
        &self.called_computations
    }

    pub(crate) fn add_user(&mut self, user: InstrId) {
        if !self.users.contains(&user) {
            self.users.push(user);
        }
    }

    pub(crate) fn remove_user(&mut self, user: InstrId) {
        self.users.retain(|&u| u != user);
    }

    pub(crate) fn add_control_predecessor(&mut self, pred: InstrId) {
        if !self.control_predecessors.contains(&pred) {
            self.control_predecessors.push(pred);
        }
    }

    pub(crate) fn add_control_successor(&mut self, succ: InstrId) {
        if !self.control_successors.contains(&succ) {
            self.control_successors.push(succ);
        }
    }

    pub(crate) fn remove_control_successor(&mut self, succ: InstrId) {
        self.control_successors.retain(|&s| s != succ);
    }
}
