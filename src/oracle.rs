//! Services a strategy consults but does not implement: the clock, the
//! value-density computation and the task-failure test.

use crate::{
    depend,
    rsrc::System,
    sched::SchedFlags,
    task::{TaskFlags, Time}
};

use tracing::debug;

/// Source of the current time.
pub trait Clock {
    /// Returns the current time.
    fn now(&self) -> Time;
}

/// A fixed point in time is its own clock.
impl Clock for Time {
    fn now(&self) -> Time {
        *self
    }
}

/// Computes how valuable a task is per unit of remaining work.
pub trait ValueDensity {
    /// Writes the [`ivd`](`crate::task::Task::ivd`) of the task at index `task`.
    ///
    /// With `dependency_aware` set, the computation may account for the tasks
    /// the task waits on, and may flag the task
    /// [`ABORTED`](`TaskFlags::ABORTED`) if it judges it unrecoverably
    /// deadlocked.
    fn compute(&self, sys: &mut System, task: usize, dependency_aware: bool, flags: SchedFlags);
}

/// Decides whether a task can no longer be run.
pub trait FailureCheck {
    /// Tests whether the task at index `task` has failed, possibly flagging it
    /// along the way.
    fn is_failed(&self, sys: &mut System, task: usize, flags: SchedFlags) -> bool;
}

/// Fixed-point scale of inverse value densities.
const IVD_SHIFT: u32 = 16;

fn ivd(left: u128, value: u128) -> u64 {
    u64::try_from((left << IVD_SHIFT) / value.max(1)).unwrap_or(u64::MAX)
}

/// The standard oracle.
///
/// Inverse value density is remaining time over value, in 16.16 fixed point.
/// The dependency-aware variant sums both over the task's wait-for chain, and
/// aborts deadlocked tasks. A task has failed if it is flagged
/// [`ABORTED`](`TaskFlags::ABORTED`) or [`FAILED`](`TaskFlags::FAILED`); with
/// [`SchedFlags::ABORT_MISSED`], a task whose deadline has already passed is
/// flagged aborted first.
#[derive(Default, Clone, Copy)]
pub struct Standard;

impl ValueDensity for Standard {
    fn compute(&self, sys: &mut System, task: usize, dependency_aware: bool, _: SchedFlags) {
        let out = if dependency_aware {
            if sys.task(task).flags.contains(TaskFlags::DEADLOCKED) {
                debug!(task, "aborting deadlocked task");
                sys.task_mut(task).flags.insert(TaskFlags::ABORTED);
            }

            let (left, value) = depend::chain(sys, task).into_iter()
                .map(|i| sys.task(i))
                .fold((0u128, 0u128), |(l, v), t| (l + u128::from(t.left), v + u128::from(t.value)));

            ivd(left, value)
        } else {
            let t = sys.task(task);
            ivd(t.left.into(), t.value.into())
        };

        sys.task_mut(task).ivd = out;
    }
}

impl FailureCheck for Standard {
    fn is_failed(&self, sys: &mut System, task: usize, flags: SchedFlags) -> bool {
        let now = sys.now();
        let t = sys.task_mut(task);

        if flags.contains(SchedFlags::ABORT_MISSED) && !t.is_failed() && t.deadline < now {
            debug!(task, deadline = t.deadline, now, "aborting task past its deadline");
            t.flags.insert(TaskFlags::ABORTED);
        }

        t.is_failed()
    }
}
