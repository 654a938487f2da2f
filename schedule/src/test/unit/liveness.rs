//! Live-out accounting: buffers reachable from the root carry an implicit
//! end-of-computation use.

use sumrak_ir::{Computation, Module, Opcode, PointsToAnalysis};

use crate::liveness::LivenessView;

#[test]
fn live_out_adds_implicit_use() {
    // r defines a buffer nobody consumes; it must still start at one use.
    let mut comp = Computation::new("entry");
    let a = comp.add_instruction(Opcode::Iota, "a", &[]).unwrap();
    let r = comp.add_instruction(Opcode::Negate, "r", &[a]).unwrap();
    comp.set_root(r).unwrap();
    let mut module = Module::new("m");
    let cid = module.add_computation(comp);
    let points_to = PointsToAnalysis::run(&module);
    let view = LivenessView::new(&module, cid, &points_to);

    let r_buf = points_to.buffers_defined(cid, r)[0];
    let a_buf = points_to.buffers_defined(cid, a)[0];
    assert_eq!(view.initial_use_count()[r_buf.index()], 1);
    // a is consumed by r only and is not live out.
    assert_eq!(view.initial_use_count()[a_buf.index()], 1);
}

#[test]
fn last_explicit_user_never_drops_live_out_to_zero() {
    // a flows into the tuple root, so its count is two explicit uses plus
    // the implicit one; retiring both explicit users leaves one, not zero.
    let mut comp = Computation::new("entry");
    let a = comp.add_instruction(Opcode::Iota, "a", &[]).unwrap();
    let u = comp.add_instruction(Opcode::Negate, "u", &[a]).unwrap();
    let t = comp.add_instruction(Opcode::Tuple, "t", &[a, u]).unwrap();
    comp.set_root(t).unwrap();
    let mut module = Module::new("m");
    let cid = module.add_computation(comp);
    let points_to = PointsToAnalysis::run(&module);
    let view = LivenessView::new(&module, cid, &points_to);

    let a_buf = points_to.buffers_defined(cid, a)[0];
    assert_eq!(view.initial_use_count()[a_buf.index()], 3);
}
