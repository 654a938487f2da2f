//! Error types for scheduling, updating, and verification.

use snafu::Snafu;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Scheduling failures.
///
/// Internal-invariant variants indicate a scheduler bug and are not
/// recoverable; verification variants describe the first violation found in a
/// schedule. Nothing is retried locally: every error aborts the run and
/// surfaces to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Snafu)]
#[snafu(visibility(pub))]
pub enum Error {
    /// A buffer's unscheduled-use count would go negative.
    #[snafu(display(
        "use count of buffer defined by {buffer} went negative while scheduling {name} (id {id})"
    ))]
    NegativeUseCount { buffer: String, name: String, id: u64 },

    /// An instruction's unscheduled-predecessor count would go negative.
    #[snafu(display("predecessor count of {name} (id {id}) went negative"))]
    NegativePredecessorCount { name: String, id: u64 },

    /// The scheduler emitted a different number of instructions than the
    /// computation holds.
    #[snafu(display(
        "schedule for {computation} emitted {emitted} instructions, expected {expected}"
    ))]
    EmittedCountMismatch { computation: String, emitted: usize, expected: usize },

    /// The ready queue and its handle map disagreed during repricing.
    #[snafu(display("ready queue lost the entry for {name} (id {id}) during repricing"))]
    StaleReadyEntry { name: String, id: u64 },

    /// A new instruction's unscheduled-operand count would go negative.
    #[snafu(display("operand count of new instruction {name} (id {id}) went negative"))]
    NegativeOperandCount { name: String, id: u64 },

    /// Fusion computations are never scheduled.
    #[snafu(display("cannot schedule fusion computation {computation}"))]
    FusionComputation { computation: String },

    /// The simulated sequence consumes a buffer before anything defines it.
    #[snafu(display(
        "buffer defined by {buffer} is consumed by {name} (id {id}) before it is defined"
    ))]
    UseBeforeDefinition { buffer: String, name: String, id: u64 },

    /// An instruction appears more than once in a schedule.
    #[snafu(display("{name} (id {id}) appears more than once in the schedule for {computation}"))]
    DuplicateInstruction { computation: String, name: String, id: u64 },

    /// An instruction of the computation is absent from its schedule.
    #[snafu(display("{name} (id {id}) is missing from the schedule for {computation}"))]
    MissingInstruction { computation: String, name: String, id: u64 },

    /// A schedule references a slot the computation no longer holds.
    #[snafu(display(
        "schedule for {computation} references slot {slot}, which holds no instruction"
    ))]
    ForeignInstruction { computation: String, slot: usize },

    /// A data dependency is scheduled out of order.
    #[snafu(display(
        "{name} (id {id}) is scheduled before its operand {operand_name} (id {operand_id})"
    ))]
    OperandOutOfOrder { name: String, id: u64, operand_name: String, operand_id: u64 },

    /// A control dependency is scheduled out of order.
    #[snafu(display(
        "{name} (id {id}) is scheduled before its control predecessor {predecessor_name} \
         (id {predecessor_id})"
    ))]
    ControlOutOfOrder { name: String, id: u64, predecessor_name: String, predecessor_id: u64 },

    /// The schedule's computation set differs from the module's non-fusion set.
    #[snafu(display(
        "schedule covers {scheduled} computations, module has {expected} non-fusion computations"
    ))]
    ComputationSetMismatch { scheduled: usize, expected: usize },

    /// The schedule names a computation the module does not schedule.
    #[snafu(display("schedule contains {computation}, which is not a non-fusion computation"))]
    UnknownComputation { computation: String },

    /// A non-fusion computation has no entry in the schedule.
    #[snafu(display("no schedule entry for computation {computation}"))]
    MissingComputation { computation: String },
}
