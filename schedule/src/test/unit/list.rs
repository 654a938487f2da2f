//! List-scheduler scenarios: greedy definer choice and subcomputation
//! accounting.

use std::collections::HashMap;

use sumrak_ir::{Computation, Module, Opcode, PointsToAnalysis};

use crate::driver::Algorithm;
use crate::list::list_schedule;
use crate::schedule_module;
use crate::test::helpers::{module_from, names, sizes};

#[test]
fn diamond_prefers_small_definer_first() {
    // After a, scheduling b frees nothing and defines 1; c defines 2.
    let (module, cid, _) = module_from(&[
        ("a", Opcode::Iota, &[]),
        ("b", Opcode::Negate, &["a"]),
        ("c", Opcode::Negate, &["a"]),
        ("d", Opcode::Add, &["b", "c"]),
    ]);
    let size_fn = sizes(&[("a", 1), ("b", 1), ("c", 2), ("d", 1)]);
    let points_to = PointsToAnalysis::run(&module);
    let order = list_schedule(&module, cid, &points_to, &size_fn, &HashMap::new()).unwrap();
    assert_eq!(names(&module[cid], &order), ["a", "b", "c", "d"]);
}

#[test]
fn subcomputation_charge_is_max_not_sum() {
    // w calls subcomputations with peaks 100 and 40. Charged as max (100),
    // w's priority beats a size-110 definer; charged as a 140 sum it would
    // lose, so the emitted order discriminates the two accountings.
    let mut module = Module::new("m");

    let mut sub = Computation::new("sub.big");
    let s = sub.add_instruction(Opcode::Iota, "sbig", &[]).unwrap();
    sub.set_root(s).unwrap();
    let big = module.add_computation(sub);

    let mut sub = Computation::new("sub.small");
    let t = sub.add_instruction(Opcode::Iota, "ssmall", &[]).unwrap();
    sub.set_root(t).unwrap();
    let small = module.add_computation(sub);

    let mut entry = Computation::new("entry");
    let w = entry.add_call_instruction(Opcode::While, "w", &[], &[big, small]).unwrap();
    let y = entry.add_instruction(Opcode::Iota, "y", &[]).unwrap();
    let r = entry.add_instruction(Opcode::Add, "r", &[w, y]).unwrap();
    entry.set_root(r).unwrap();
    let entry_id = module.add_computation(entry);
    module.set_entry(entry_id);

    let size_fn = sizes(&[("sbig", 100), ("ssmall", 40), ("w", 1), ("y", 110), ("r", 1)]);
    let schedule = schedule_module(&module, &size_fn, Some(Algorithm::List)).unwrap();
    assert_eq!(
        names(&module[entry_id], schedule.sequence(entry_id).unwrap()),
        ["w", "y", "r"]
    );
}
