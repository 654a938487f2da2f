//! Computations: instruction arenas with a designated root.

use smallvec::SmallVec;
use snafu::ensure;

use crate::error::{
    RemoveRootSnafu, RemoveWithDependentsSnafu, Result, SelfControlDependencySnafu,
    UnknownInstructionSnafu,
};
use crate::instruction::Instruction;
use crate::module::ComputationId;
use crate::next_instruction_id;
use crate::opcode::Opcode;

/// Slot index of an instruction inside its computation.
///
/// Slots tombstone on removal, so an id handed out once stays valid as an
/// index for the computation's lifetime (though the slot may become vacant).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InstrId(u32);

impl InstrId {
    pub(crate) fn new(index: usize) -> Self {
        Self(index as u32)
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl std::fmt::Display for InstrId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "%{}", self.0)
    }
}

/// A callable unit: an acyclic instruction graph with one root.
///
/// Acyclicity across operand and control edges is a construction invariant:
/// operands must already exist when an instruction is added, and control
/// dependencies are expected to follow the same direction (a violation is
/// surfaced by the schedule verifier, not here).
#[derive(Debug, Clone)]
pub struct Computation {
    name: String,
    slots: Vec<Option<Instruction>>,
    root: Option<InstrId>,
    fusion: bool,
    live: usize,
}

impl Computation {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), slots: Vec::new(), root: None, fusion: false, live: 0 }
    }

    /// A fusion computation: excluded from module scheduling.
    pub fn new_fusion(name: impl Into<String>) -> Self {
        Self { fusion: true, ..Self::new(name) }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_fusion(&self) -> bool {
        self.fusion
    }

    /// Number of live instructions.
    pub fn instruction_count(&self) -> usize {
        self.live
    }

    /// Number of slots ever allocated, vacant ones included. Dense
    /// per-instruction tables are sized by this.
    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    pub fn contains(&self, id: InstrId) -> bool {
        self.slots.get(id.index()).is_some_and(Option::is_some)
    }

    /// Live instructions in slot order.
    pub fn instructions(&self) -> impl Iterator<Item = (InstrId, &Instruction)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(index, slot)| slot.as_ref().map(|instr| (InstrId::new(index), instr)))
    }

    pub fn instr_ids(&self) -> impl Iterator<Item = InstrId> + '_ {
        self.instructions().map(|(id, _)| id)
    }

    pub fn get(&self, id: InstrId) -> Option<&Instruction> {
        self.slots.get(id.index()).and_then(Option::as_ref)
    }

    /// Slot of the instruction with the given module-unique id, if present.
    pub fn find_by_unique_id(&self, unique_id: u64) -> Option<InstrId> {
        self.instructions().find(|(_, instr)| instr.unique_id() == unique_id).map(|(id, _)| id)
    }

    pub fn root(&self) -> Option<InstrId> {
        self.root
    }

    pub fn set_root(&mut self, id: InstrId) -> Result<()> {
        self.check(id)?;
        self.root = Some(id);
        Ok(())
    }

    /// Adds an instruction and wires it into its operands' user lists.
    pub fn add_instruction(
        &mut self,
        opcode: Opcode,
        name: impl Into<String>,
        operands: &[InstrId],
    ) -> Result<InstrId> {
        self.add_call_instruction(opcode, name, operands, &[])
    }

    /// Adds an instruction that calls the given subcomputations.
    pub fn add_call_instruction(
        &mut self,
        opcode: Opcode,
        name: impl Into<String>,
        operands: &[InstrId],
        called: &[ComputationId],
    ) -> Result<InstrId> {
        for &op in operands {
            self.check(op)?;
        }
        let id = InstrId::new(self.slots.len());
        let instr = Instruction::new(
            next_instruction_id(),
            name.into(),
            opcode,
            SmallVec::from_slice(operands),
            SmallVec::from_slice(called),
        );
        self.slots.push(Some(instr));
        self.live += 1;
        for &op in operands {
            self.slot_mut(op).add_user(id);
        }
        Ok(id)
    }

    /// Records that `to` must execute after `from`.
    pub fn add_control_dependency(&mut self, from: InstrId, to: InstrId) -> Result<()> {
        self.check(from)?;
        self.check(to)?;
        if from == to {
            let instr = self.slot(from);
            return SelfControlDependencySnafu { name: instr.name(), id: instr.unique_id() }
                .fail();
        }
        self.slot_mut(from).add_control_successor(to);
        self.slot_mut(to).add_control_predecessor(from);
        Ok(())
    }

    /// Removes an instruction with no remaining dependents. The slot becomes
    /// vacant; the id is never reused.
    pub fn remove_instruction(&mut self, id: InstrId) -> Result<()> {
        self.check(id)?;
        let instr = self.slot(id);
        ensure!(
            self.root != Some(id),
            RemoveRootSnafu { name: instr.name(), id: instr.unique_id() }
        );
        ensure!(
            instr.users().is_empty() && instr.control_successors().is_empty(),
            RemoveWithDependentsSnafu {
                name: instr.name(),
                id: instr.unique_id(),
                users: instr.user_count(),
                successors: instr.control_successors().len(),
            }
        );
        let mut operands: SmallVec<[InstrId; 2]> = SmallVec::from_slice(instr.operands());
        operands.sort_unstable();
        operands.dedup();
        let preds: Vec<InstrId> = instr.control_predecessors().to_vec();
        for op in operands {
            self.slot_mut(op).remove_user(id);
        }
        for pred in preds {
            self.slot_mut(pred).remove_control_successor(id);
        }
        self.slots[id.index()] = None;
        self.live -= 1;
        Ok(())
    }

    /// Roots for graph traversals: every sink (no users, no control
    /// successors) except the root, in slot order, then the root itself.
    pub fn traversal_roots(&self) -> Vec<InstrId> {
        let mut roots: Vec<InstrId> = self
            .instructions()
            .filter(|&(id, instr)| {
                Some(id) != self.root
                    && instr.users().is_empty()
                    && instr.control_successors().is_empty()
            })
            .map(|(id, _)| id)
            .collect();
        roots.extend(self.root);
        roots
    }

    /// Deterministic DFS post-order over all live instructions, visiting
    /// operands first, then control predecessors. Every operand and control
    /// predecessor appears before its dependents; the root comes last.
    pub fn post_order(&self) -> Vec<InstrId> {
        let mut order = Vec::with_capacity(self.live);
        let mut visited = vec![false; self.slots.len()];
        for root in self.traversal_roots() {
            self.post_order_from(root, &mut visited, &mut order);
        }
        order
    }

    fn post_order_from(&self, start: InstrId, visited: &mut [bool], order: &mut Vec<InstrId>) {
        if visited[start.index()] {
            return;
        }
        visited[start.index()] = true;
        let mut stack: Vec<(InstrId, usize)> = vec![(start, 0)];
        while let Some(top) = stack.last_mut() {
            let (id, child) = *top;
            let instr = self.slot(id);
            let next = instr
                .operands()
                .get(child)
                .or_else(|| instr.control_predecessors().get(child - instr.operands().len()))
                .copied();
            match next {
                Some(dep) => {
                    top.1 += 1;
                    if !visited[dep.index()] {
                        visited[dep.index()] = true;
                        stack.push((dep, 0));
                    }
                }
                None => {
                    order.push(id);
                    stack.pop();
                }
            }
        }
    }

    fn check(&self, id: InstrId) -> Result<()> {
        ensure!(
            self.contains(id),
            UnknownInstructionSnafu { computation: self.name.clone(), slot: id.index() }
        );
        Ok(())
    }

    fn slot(&self, id: InstrId) -> &Instruction {
        self.slots[id.index()].as_ref().unwrap_or_else(|| vacant(&self.name, id))
    }

    fn slot_mut(&mut self, id: InstrId) -> &mut Instruction {
        let name = self.name.clone();
        self.slots[id.index()].as_mut().unwrap_or_else(|| vacant(&name, id))
    }
}

/// Indexing a vacant or out-of-range slot is a programmer error and panics,
/// like any arena. Fallible access goes through [`Computation::get`].
impl std::ops::Index<InstrId> for Computation {
    type Output = Instruction;

    fn index(&self, id: InstrId) -> &Instruction {
        self.slot(id)
    }
}

fn vacant(computation: &str, id: InstrId) -> ! {
    panic!("computation {computation} has no instruction at slot {}", id.index())
}
