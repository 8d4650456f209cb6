//! The task model.

use bitflags::bitflags;
use dashu::{
    rational::Relaxed,
    integer::Sign
};

/// Type of time instants and durations.
///
/// The intended semantics of this type are left to the user and do not
/// interfere with use of this library as long as it relates to integral
/// multiples of a constant time interval; in most cases it is an integral
/// number of microseconds.
pub type Time = u64;

bitflags! {
    /// State flags carried by a [`Task`].
    ///
    /// `ABORTED` and `FAILED` are set by the scheduler and persist until the
    /// dispatcher handles the task. `DEADLOCKED` and `MARKED` are scratch flags
    /// and never survive a call to a strategy.
    #[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
    pub struct TaskFlags: u8 {
        /// The task has missed its deadline and must be aborted.
        const ABORTED    = 1 << 0;
        /// The task cannot be run for other reasons.
        const FAILED     = 1 << 1;
        /// The task sits on a cycle of the wait-for graph.
        const DEADLOCKED = 1 << 2;
        /// The task has been visited by the current dependency walk.
        const MARKED     = 1 << 3;
    }
}

/// A single ready task.
#[derive(Clone, Debug)]
pub struct Task {
    /// The task's absolute deadline.
    pub deadline: Time,
    /// The task's period.
    pub period: Time,
    /// Remaining execution time still owed to the task.
    pub left: Time,
    /// Utility accrued when the task completes by its deadline.
    pub value: u64,
    /// Inverse value density; lower is more valuable per unit of cost.
    ///
    /// Written by a [`ValueDensity`](`crate::oracle::ValueDensity`) oracle.
    pub ivd: u64,
    /// The task's dynamic priority, if already assigned.
    pub dynamic_priority: Option<u64>,
    /// Number of resources currently held by the task.
    pub locks_held: usize,
    /// Resource the task is blocked on, as an index into some
    /// [`System`](`crate::rsrc::System`).
    pub requested: Option<usize>,
    /// State flags.
    pub flags: TaskFlags
}

impl Task {
    /// Constructs a new `Task` with the given remaining time `left` and `period`,
    /// implicit deadline (equal to `period`), unit value and no resource usage.
    pub fn new(left: Time, period: Time) -> Self {
        Self {
            deadline: period,
            period,
            left,
            value: 1,
            ivd: 0,
            dynamic_priority: None,
            locks_held: 0,
            requested: None,
            flags: TaskFlags::empty()
        }
    }

    /// Returns the task with new absolute deadline `deadline`.
    pub fn with_deadline(self, deadline: Time) -> Self {
        Self { deadline, ..self }
    }

    /// Returns the task with value `value`.
    pub fn with_value(self, value: u64) -> Self {
        Self { value, ..self }
    }

    /// Returns the task blocked on the resource at index `rsrc`.
    pub fn requesting(self, rsrc: usize) -> Self {
        Self { requested: Some(rsrc), ..self }
    }

    /// Returns the task holding `locks` resources.
    pub fn holding(self, locks: usize) -> Self {
        Self { locks_held: locks, ..self }
    }

    /// Tests whether the task has been flagged aborted or failed.
    pub fn is_failed(&self) -> bool {
        self.flags.intersects(TaskFlags::ABORTED | TaskFlags::FAILED)
    }
}

/// Trait for tasks and collections of tasks (task-sets).
pub trait Set {
    /// Returns the exact value of the total utilization of the task-set,
    /// computed from each task's remaining time over its period.
    ///
    /// Use [`Relaxed::canonicalize`] to convert to a
    /// [`RBig`](`dashu::rational::RBig`) if needed.
    fn utilization(self) -> Relaxed;
}

/// A `Task` is in and of itself a `Set` of one element and is treated accordingly.
impl Set for &'_ Task {
    fn utilization(self) -> Relaxed {
        Relaxed::from_parts_const(
            Sign::Positive,
            self.left.into(),
            self.period.max(1).into()
        )
    }
}

/// Any collection of `Set`s (including [`Task`]) is a `Set`, and is treated as if each
/// of its elements were a task.
impl<I, T: Set> Set for I where I: IntoIterator<Item = T> {
    fn utilization(self) -> Relaxed {
        let mut out = Relaxed::default();

        for x in self {
            out += x.utilization();
        }

        out
    }
}
