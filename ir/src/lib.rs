//! Dataflow IR for the sumrak scheduler.
//!
//! A [`Module`] holds a set of [`Computation`]s connected by an acyclic call
//! graph; each computation is an acyclic graph of [`Instruction`]s with a
//! designated root. Instructions are stored in per-computation arenas and
//! addressed by [`InstrId`]; removal tombstones the slot so ids stay stable
//! across mutation.
//!
//! The crate also provides [`PointsToAnalysis`], which resolves every
//! instruction output to the set of [`LogicalBuffer`]s it may carry. The
//! scheduler consumes modules exclusively through these types.

use std::cell::Cell;

pub mod computation;
pub mod error;
pub mod instruction;
pub mod module;
pub mod opcode;
pub mod points_to;

pub use computation::{Computation, InstrId};
pub use error::{Error, Result};
pub use instruction::Instruction;
pub use module::{ComputationId, Module};
pub use opcode::Opcode;
pub use points_to::{BufferId, LogicalBuffer, PointsToAnalysis};

// Thread-local counter for module-unique instruction ids.
//
// Cell is !Send + !Sync, which matches the single-threaded ownership model of
// a scheduling run and avoids atomic traffic. Ids are monotonic and never
// reused, so a removed instruction's id cannot be confused with a new one.
thread_local! {
    static INSTR_ID_COUNTER: Cell<u64> = const { Cell::new(0) };
}

pub(crate) fn next_instruction_id() -> u64 {
    INSTR_ID_COUNTER.with(|counter| {
        let id = counter.get();
        counter.set(id + 1);
        id
    })
}
