//! Modules: computation arenas with an entry and an acyclic call graph.

use crate::computation::{Computation, InstrId};

/// Index of a computation inside its module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ComputationId(u32);

impl ComputationId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl std::fmt::Display for ComputationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "@{}", self.0)
    }
}

/// A set of computations with a unique entry.
///
/// The call graph is derived from instructions' called-computations lists and
/// is acyclic by construction: a computation must be added to the module
/// before any instruction can call it.
#[derive(Debug, Clone, Default)]
pub struct Module {
    name: String,
    computations: Vec<Computation>,
    entry: Option<ComputationId>,
}

impl Module {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), computations: Vec::new(), entry: None }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Adds a computation. The first non-fusion computation becomes the entry
    /// unless one was set explicitly.
    pub fn add_computation(&mut self, computation: Computation) -> ComputationId {
        let id = ComputationId(self.computations.len() as u32);
        if self.entry.is_none() && !computation.is_fusion() {
            self.entry = Some(id);
        }
        self.computations.push(computation);
        id
    }

    pub fn set_entry(&mut self, id: ComputationId) {
        self.entry = Some(id);
    }

    pub fn entry(&self) -> Option<ComputationId> {
        self.entry
    }

    pub fn computation_count(&self) -> usize {
        self.computations.len()
    }

    pub fn contains(&self, id: ComputationId) -> bool {
        id.index() < self.computations.len()
    }

    pub fn computations(&self) -> impl Iterator<Item = (ComputationId, &Computation)> {
        self.computations
            .iter()
            .enumerate()
            .map(|(index, comp)| (ComputationId(index as u32), comp))
    }

    pub fn computation_mut(&mut self, id: ComputationId) -> &mut Computation {
        &mut self.computations[id.index()]
    }

    /// Total number of live instructions across all computations.
    pub fn total_instruction_count(&self) -> usize {
        self.computations.iter().map(Computation::instruction_count).sum()
    }

    /// Number of instruction ids ever allocated across all computations.
    /// Removal tombstones a slot without retiring its id, so this count only
    /// grows; heuristic clamps rely on it as a stable bound.
    pub fn num_unique_instruction_ids(&self) -> usize {
        self.computations.iter().map(Computation::slot_count).sum()
    }

    /// Locates an instruction anywhere in the module by its unique id.
    pub fn find_instruction(&self, unique_id: u64) -> Option<(ComputationId, InstrId)> {
        self.computations()
            .find_map(|(cid, comp)| comp.find_by_unique_id(unique_id).map(|iid| (cid, iid)))
    }

    /// All computations in call-graph post-order: every computation appears
    /// after the computations its instructions call. Deterministic given
    /// identical modules.
    pub fn computation_post_order(&self) -> Vec<ComputationId> {
        let mut order = Vec::with_capacity(self.computations.len());
        let mut visited = vec![false; self.computations.len()];
        for index in 0..self.computations.len() {
            self.post_order_from(ComputationId(index as u32), &mut visited, &mut order);
        }
        order
    }

    /// Call-graph post-order with fusion computations filtered out.
    pub fn non_fusion_computations(&self) -> Vec<ComputationId> {
        self.computation_post_order()
            .into_iter()
            .filter(|&id| !self[id].is_fusion())
            .collect()
    }

    fn post_order_from(
        &self,
        start: ComputationId,
        visited: &mut [bool],
        order: &mut Vec<ComputationId>,
    ) {
        if visited[start.index()] {
            return;
        }
        visited[start.index()] = true;
        let mut stack: Vec<(ComputationId, Vec<ComputationId>, usize)> =
            vec![(start, self.callees(start), 0)];
        while let Some(top) = stack.last_mut() {
            let child = top.2;
            top.2 += 1;
            match top.1.get(child).copied() {
                Some(callee) => {
                    if !visited[callee.index()] {
                        visited[callee.index()] = true;
                        let callees = self.callees(callee);
                        stack.push((callee, callees, 0));
                    }
                }
                None => {
                    let id = top.0;
                    order.push(id);
                    stack.pop();
                }
            }
        }
    }

    fn callees(&self, id: ComputationId) -> Vec<ComputationId> {
        let mut callees: Vec<ComputationId> = self[id]
            .instructions()
            .flat_map(|(_, instr)| instr.called_computations().iter().copied())
            .collect();
        callees.sort_unstable();
        callees.dedup();
        callees
    }
}

impl std::ops::Index<ComputationId> for Module {
    type Output = Computation;

    fn index(&self, id: ComputationId) -> &Computation {
        &self.computations[id.index()]
    }
}
