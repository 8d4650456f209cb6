use crate::{
    depend,
    error::Result,
    feasible::feasible,
    oracle::{FailureCheck, Standard, ValueDensity},
    rsrc::System,
    sched::{Pick, SchedFlags, Strategy}
};

use itertools::Itertools;
use tracing::{debug, trace};

/// Locke's _Best-Effort Scheduling Algorithm_ (LBESA).
///
/// Orders the ready set by deadline and, while that schedule is infeasible,
/// sheds the task with the lowest value density. Runs the head of whatever
/// remains.
#[derive(Default)]
pub struct Lbesa<O = Standard> {
    oracle: O
}

impl Lbesa {
    /// Constructs a new instance of `Lbesa` consulting the standard oracle.
    pub fn new() -> Self {
        Self { oracle: Standard }
    }
}

impl<O> Lbesa<O> {
    /// Constructs a new instance of `Lbesa` consulting `oracle`.
    pub fn with_oracle(oracle: O) -> Self {
        Self { oracle }
    }
}

impl<O> Lbesa<O> where O: ValueDensity + FailureCheck {
    /// Runs the shedding loop and returns the surviving schedule, in
    /// deadline order, along with the number of tasks shed.
    ///
    /// Expects value densities to be up to date.
    fn shed(sys: &System) -> (Vec<usize>, usize) {
        let mut cand = (0 .. sys.num_tasks()).collect::<Vec<_>>();
        cand.sort_by_key(|&i| sys.task(i).deadline);

        let mut removed = 0;

        while !feasible(sys, &cand, sys.now()) {
            // last of equals, so later-found tasks go first
            let Some(worst) = cand.iter().position_max_by_key(|&&i| sys.task(i).ivd) else {
                break;
            };

            trace!(task = cand[worst], ivd = sys.task(cand[worst]).ivd, "shedding");
            cand.remove(worst);
            removed += 1;
        }

        (cand, removed)
    }
}

impl<O> Strategy for Lbesa<O> where O: ValueDensity + FailureCheck {
    fn schedule(&self, sys: &mut System, flags: SchedFlags) -> Result<Pick> {
        sys.ensure_ready()?;

        for i in 0 .. sys.num_tasks() {
            if self.oracle.is_failed(sys, i, flags) {
                return Ok(Pick::Failed(i));
            }

            self.oracle.compute(sys, i, false, flags);
        }

        let (cand, removed) = Self::shed(sys);

        let best = match cand.first() {
            Some(&head) => head,
            None => {
                // nothing can meet its deadline: fall back on plain EDF
                let edf = sys.tasks().iter()
                             .position_min_by_key(|t| t.deadline)
                             .unwrap_or_default();

                debug!(task = edf, "LBESA shed every task, falling back to earliest deadline");
                edf
            }
        };

        let best = if flags.contains(SchedFlags::PI) {
            depend::pi_task(sys, best)
        } else {
            best
        };

        debug!(task = best, removed, "LBESA pick");
        Ok(Pick::Run(best))
    }

    fn name(&self) -> &'static str { "LBESA" }
}
