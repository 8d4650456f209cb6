use crate::{
    depend,
    error::Result,
    feasible::feasible,
    oracle::{FailureCheck, Standard, ValueDensity},
    rsrc::System,
    sched::{insert_sorted, Pick, SchedFlags, Strategy},
    task::{TaskFlags, Time}
};

use tracing::{debug, trace};

/// Clark's _Dependent Activity Scheduling Algorithm_ (DASA).
///
/// Like [`DasaNd`](`crate::sched::DasaNd`), admits tasks greedily from the
/// most to the least value-dense while the schedule stays feasible, except
/// that a task is admitted together with every task it transitively waits
/// on: it cannot run before they release what it needs. Those blockers
/// inherit the waiting task's deadline while the schedule is being checked.
#[derive(Default)]
pub struct Dasa<O = Standard> {
    oracle: O
}

/// Working state of a single DASA decision.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Plan {
    /// The decision itself.
    pub pick: Pick,
    /// The ready set by ascending inverse value density.
    ///
    /// Empty if a failed task short-circuited the decision.
    pub density: Vec<usize>,
    /// The admitted schedule, by ascending deadline.
    pub committed: Vec<usize>,
    /// Working deadline of each task, indexed like the ready set.
    ///
    /// Every candidate's chain walk resets the candidate's own entry to its
    /// deadline and lowers each task it waits on to the earliest deadline
    /// seen so far on the chain. Entries written by a rejected candidate are
    /// rolled back.
    pub tentative: Vec<Time>
}

impl Dasa {
    /// Constructs a new instance of `Dasa` consulting the standard oracle.
    pub fn new() -> Self {
        Self { oracle: Standard }
    }
}

impl<O> Dasa<O> {
    /// Constructs a new instance of `Dasa` consulting `oracle`.
    pub fn with_oracle(oracle: O) -> Self {
        Self { oracle }
    }
}

impl<O> Dasa<O> where O: ValueDensity + FailureCheck {
    /// Runs the full algorithm on `sys` and returns its working state along
    /// with the decision.
    ///
    /// # Errors
    ///
    /// Fails if the ready set is empty.
    pub fn plan(&self, sys: &mut System, flags: SchedFlags) -> Result<Plan> {
        sys.ensure_ready()?;

        let n = sys.num_tasks();

        for i in 0 .. n {
            if !flags.contains(SchedFlags::NO_DEADLOCKS) {
                depend::mark_and_detect_deadlock(sys, i);
            }

            self.oracle.compute(sys, i, true, flags);
        }

        for i in 0 .. n {
            sys.task_mut(i).flags.remove(TaskFlags::DEADLOCKED);
        }

        let mut density = Vec::with_capacity(n);

        for i in 0 .. n {
            if self.oracle.is_failed(sys, i, flags) {
                return Ok(Plan {
                    pick: Pick::Failed(i),
                    density: Vec::new(),
                    committed: Vec::new(),
                    tentative: Vec::new()
                });
            }

            insert_sorted(&mut density, i, |j| sys.task(j).ivd);
        }

        let mut tentative = sys.tasks().iter().map(|t| t.deadline).collect::<Vec<_>>();
        let mut committed = Vec::new();

        for &cand in &density {
            let saved = tentative.clone();
            let mut sched = committed.clone();

            for i in depend::compute_tentative_deadlines(sys, cand, &mut tentative) {
                if !sched.contains(&i) {
                    sched.push(i);
                }
            }

            sched.sort_by_key(|&i| (tentative[i], sys.task(i).deadline));

            if feasible(sys, &sched, sys.now()) {
                sched.sort_by_key(|&i| sys.task(i).deadline);
                trace!(task = cand, schedule = ?sched, "admitted");
                committed = sched;
            } else {
                trace!(task = cand, "rejected");
                tentative = saved;
            }
        }

        let best = match committed.first() {
            Some(&head) => head,
            None => {
                debug!("DASA admitted nothing, falling back to highest value density");
                density[0]
            }
        };

        debug!(task = best, admitted = committed.len(), "DASA pick");

        Ok(Plan { pick: Pick::Run(best), density, committed, tentative })
    }
}

impl<O> Strategy for Dasa<O> where O: ValueDensity + FailureCheck {
    fn schedule(&self, sys: &mut System, flags: SchedFlags) -> Result<Pick> {
        self.plan(sys, flags).map(|plan| plan.pick)
    }

    fn name(&self) -> &'static str { "DASA" }
}
