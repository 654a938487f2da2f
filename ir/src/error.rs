//! Error types for IR construction and mutation.

use snafu::Snafu;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Clone, PartialEq, Eq, Snafu)]
#[snafu(visibility(pub))]
pub enum Error {
    /// An operand or control edge references a slot with no live instruction.
    #[snafu(display("computation {computation} has no instruction at slot {slot}"))]
    UnknownInstruction { computation: String, slot: usize },

    /// Removing an instruction that still has dependents.
    #[snafu(display(
        "cannot remove {name} (id {id}): it still has {users} users and {successors} control successors"
    ))]
    RemoveWithDependents { name: String, id: u64, users: usize, successors: usize },

    /// Removing the computation root.
    #[snafu(display("cannot remove {name} (id {id}): it is the computation root"))]
    RemoveRoot { name: String, id: u64 },

    /// A control dependency from an instruction to itself.
    #[snafu(display("control dependency of {name} (id {id}) on itself"))]
    SelfControlDependency { name: String, id: u64 },
}
