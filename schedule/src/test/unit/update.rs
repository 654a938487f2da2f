//! Updater scenarios: appending a new sink, and merging across a removed
//! instruction.

use sumrak_ir::Opcode;

use crate::sequence::{ModuleSchedule, compute_id_schedule};
use crate::test::helpers::{module_from, names};
use crate::update_schedule;

#[test]
fn new_sink_appended() {
    let (mut module, cid, n) = module_from(&[
        ("a", Opcode::Iota, &[]),
        ("b", Opcode::Negate, &["a"]),
    ]);
    let mut schedule = ModuleSchedule::default();
    schedule.insert(cid, vec![n["a"], n["b"]]);
    let id_schedule = compute_id_schedule(&module, &schedule);

    let comp = module.computation_mut(cid);
    let c = comp.add_instruction(Opcode::Negate, "c", &[n["b"]]).unwrap();
    comp.set_root(c).unwrap();

    update_schedule(&module, &id_schedule, &mut schedule).unwrap();
    assert_eq!(names(&module[cid], schedule.sequence(cid).unwrap()), ["a", "b", "c"]);
}

#[test]
fn removed_instruction_dropped_and_new_user_placed() {
    let (mut module, cid, n) = module_from(&[
        ("a", Opcode::Iota, &[]),
        ("b", Opcode::Iota, &[]),
        ("c", Opcode::Negate, &["a"]),
        ("d", Opcode::Negate, &["c"]),
    ]);
    let mut schedule = ModuleSchedule::default();
    schedule.insert(cid, vec![n["a"], n["b"], n["c"], n["d"]]);
    let id_schedule = compute_id_schedule(&module, &schedule);

    let comp = module.computation_mut(cid);
    comp.remove_instruction(n["b"]).unwrap();
    let e = comp.add_instruction(Opcode::Negate, "e", &[n["a"]]).unwrap();
    comp.set_root(e).unwrap();

    update_schedule(&module, &id_schedule, &mut schedule).unwrap();
    let sequence = schedule.sequence(cid).unwrap();
    let order = names(&module[cid], sequence);
    assert_eq!(sequence.len(), 4);
    assert!(!order.contains(&"b".to_string()));
    let pos = |name: &str| order.iter().position(|x| x == name).unwrap();
    assert!(pos("a") < pos("c"));
    assert!(pos("a") < pos("e"));
    assert!(pos("c") < pos("d"));
}
