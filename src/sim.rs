//! Non-preemptive evaluation of strategies.
//!
//! [`run`] plays the dispatcher: it asks a strategy for a decision, carries
//! it out to completion, and repeats until no task is left. It is meant for
//! comparing strategies on generated ready sets, not for modelling a kernel.

use crate::{
    depend,
    error::Result,
    rsrc::{Resource, System},
    sched::{Pick, SchedFlags, Strategy},
    task::{Task, Time}
};

use tracing::trace;

/// Counters accumulated over a run.
#[derive(Default, Clone, Copy, Debug, PartialEq, Eq)]
pub struct Stats {
    /// Tasks that completed by their deadline.
    pub met: usize,
    /// Tasks that completed after their deadline.
    pub missed: usize,
    /// Tasks retired after the strategy flagged them failed.
    pub aborted: usize,
    /// Total value of the tasks that met their deadline.
    pub value: u64,
    /// Total value of every task in the ready set.
    pub offered: u64
}

impl Stats {
    /// Returns the fraction of the offered value that was accrued.
    #[allow(clippy::cast_precision_loss)]
    pub fn accrued(&self) -> f64 {
        if self.offered == 0 {
            1.0
        } else {
            self.value as f64 / self.offered as f64
        }
    }
}

/// Removes the task at index `i` from the ready set, handing every resource
/// it held to the first task waiting on it.
fn retire(tasks: &mut Vec<Task>, rsrc: &mut [Resource], i: usize) {
    tasks.remove(i);

    for (r, res) in rsrc.iter_mut().enumerate() {
        match res.owner {
            Some(o) if o == i => {
                let next = tasks.iter().position(|t| t.requested == Some(r));

                if let Some(n) = next {
                    tasks[n].requested = None;
                    tasks[n].locks_held += 1;
                }

                res.owner = next;
            },
            Some(o) if o > i => res.owner = Some(o - 1),
            _ => {}
        }
    }
}

/// Runs `strategy` on ready set `tasks` with resources `rsrc` from time
/// `start` until every task has been either run or retired.
///
/// A picked task that waits on a resource cannot run; the last task of its
/// wait-for chain runs on its behalf instead.
///
/// # Errors
///
/// Propagates any error of the strategy.
pub fn run<S>(strategy: &S, tasks: &[Task], rsrc: &[Resource], start: Time, flags: SchedFlags)
-> Result<Stats> where S: Strategy + ?Sized {
    let mut tasks = tasks.to_vec();
    let mut rsrc = rsrc.to_vec();
    let mut now = start;

    let mut stats = Stats {
        offered: tasks.iter().map(|t| t.value).sum(),
        ..Stats::default()
    };

    while !tasks.is_empty() {
        let mut sys = System::at(&mut tasks, &rsrc, &now);

        let ran = match strategy.schedule(&mut sys, flags)? {
            Pick::Failed(i) => {
                trace!(task = i, now, "retiring failed task");
                stats.aborted += 1;
                i
            },
            Pick::Run(i) => {
                let i = depend::pi_task(&sys, i);
                let task = sys.task(i);

                now = now.saturating_add(task.left);

                if now <= task.deadline {
                    stats.met += 1;
                    stats.value += task.value;
                } else {
                    stats.missed += 1;
                }

                trace!(task = i, now, "completed");
                i
            }
        };

        retire(&mut tasks, &mut rsrc, ran);
    }

    Ok(stats)
}
