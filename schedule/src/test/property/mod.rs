//! Property-based invariants over randomly generated computations.
//!
//! Graphs are generated acyclic by construction: an instruction may only take
//! already-created instructions as operands, and control edges always point
//! from an earlier instruction to a later one.

use std::collections::HashMap;

use proptest::prelude::*;
use sumrak_ir::{
    Computation, ComputationId, InstrId, LogicalBuffer, Module, Opcode, PointsToAnalysis,
};

use crate::driver::Algorithm;
use crate::sequence::compute_id_schedule;
use crate::{peak_memory, schedule_module, update_schedule, verify_schedule};

#[derive(Debug, Clone)]
struct NodeSpec {
    operands: Vec<prop::sample::Index>,
    size: u64,
    parameter: bool,
}

fn node_spec() -> impl Strategy<Value = NodeSpec> {
    (prop::collection::vec(any::<prop::sample::Index>(), 0..3), 0u64..32, any::<bool>())
        .prop_map(|(operands, size, parameter)| NodeSpec { operands, size, parameter })
}

fn control_edges() -> impl Strategy<Value = Vec<(prop::sample::Index, prop::sample::Index)>> {
    prop::collection::vec((any::<prop::sample::Index>(), any::<prop::sample::Index>()), 0..4)
}

fn build_module(
    specs: &[NodeSpec],
    edges: &[(prop::sample::Index, prop::sample::Index)],
) -> (Module, ComputationId, HashMap<String, u64>) {
    let mut comp = Computation::new("entry");
    let mut ids: Vec<InstrId> = Vec::new();
    let mut size_table = HashMap::new();
    for (i, spec) in specs.iter().enumerate() {
        let operands: Vec<InstrId> = if i == 0 {
            Vec::new()
        } else {
            spec.operands.iter().map(|pick| ids[pick.index(i)]).collect()
        };
        let opcode = if operands.is_empty() {
            if spec.parameter { Opcode::Parameter } else { Opcode::Iota }
        } else {
            Opcode::Custom("op".into())
        };
        let name = format!("n{i}");
        let id = comp.add_instruction(opcode, name.as_str(), &operands).unwrap();
        size_table.insert(name, spec.size);
        ids.push(id);
    }
    comp.set_root(*ids.last().unwrap()).unwrap();
    for (x, y) in edges {
        let (mut i, mut j) = (x.index(specs.len()), y.index(specs.len()));
        if i == j {
            continue;
        }
        if i > j {
            std::mem::swap(&mut i, &mut j);
        }
        comp.add_control_dependency(ids[i], ids[j]).unwrap();
    }
    let mut module = Module::new("random");
    let cid = module.add_computation(comp);
    (module, cid, size_table)
}

fn size_fn_of(table: HashMap<String, u64>) -> impl Fn(&LogicalBuffer) -> u64 + use<> {
    move |buffer| table.get(buffer.instruction_name()).copied().unwrap_or(1)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    // Every strategy yields a complete, dependency-respecting schedule.
    #[test]
    fn every_strategy_verifies(
        specs in prop::collection::vec(node_spec(), 1..24),
        edges in control_edges(),
    ) {
        let (module, cid, table) = build_module(&specs, &edges);
        let size_fn = size_fn_of(table);
        for algorithm in [None, Some(Algorithm::List), Some(Algorithm::Dfs), Some(Algorithm::PostOrder)] {
            let schedule = schedule_module(&module, &size_fn, algorithm).unwrap();
            verify_schedule(&module, &schedule).unwrap();
            prop_assert_eq!(schedule.sequence(cid).unwrap().len(), module[cid].instruction_count());
        }
    }

    // Picking the minimum cannot be worse than any single strategy.
    #[test]
    fn default_peak_is_the_minimum(
        specs in prop::collection::vec(node_spec(), 1..24),
        edges in control_edges(),
    ) {
        let (module, cid, table) = build_module(&specs, &edges);
        let size_fn = size_fn_of(table);
        let points_to = PointsToAnalysis::run(&module);
        let empty = HashMap::new();

        let chosen = schedule_module(&module, &size_fn, None).unwrap();
        let chosen_peak =
            peak_memory(&module, cid, chosen.sequence(cid).unwrap(), &points_to, &size_fn, &empty)
                .unwrap();
        for algorithm in [Algorithm::List, Algorithm::Dfs, Algorithm::PostOrder] {
            let schedule = schedule_module(&module, &size_fn, Some(algorithm)).unwrap();
            let peak = peak_memory(
                &module,
                cid,
                schedule.sequence(cid).unwrap(),
                &points_to,
                &size_fn,
                &empty,
            )
            .unwrap();
            prop_assert!(chosen_peak <= peak);
        }
    }

    // Identical inputs produce byte-identical schedules.
    #[test]
    fn scheduling_is_deterministic(
        specs in prop::collection::vec(node_spec(), 1..24),
        edges in control_edges(),
    ) {
        let (module, _, table) = build_module(&specs, &edges);
        let size_fn = size_fn_of(table);
        let first = schedule_module(&module, &size_fn, None).unwrap();
        let second = schedule_module(&module, &size_fn, None).unwrap();
        prop_assert_eq!(first, second);
    }

    // Updating against an unmutated module is a no-op and still verifies.
    #[test]
    fn update_without_mutation_is_noop(
        specs in prop::collection::vec(node_spec(), 1..24),
        edges in control_edges(),
    ) {
        let (module, _, table) = build_module(&specs, &edges);
        let size_fn = size_fn_of(table);
        let mut schedule = schedule_module(&module, &size_fn, None).unwrap();
        let before = schedule.clone();
        let id_schedule = compute_id_schedule(&module, &schedule);
        update_schedule(&module, &id_schedule, &mut schedule).unwrap();
        prop_assert_eq!(before, schedule);
    }
}
