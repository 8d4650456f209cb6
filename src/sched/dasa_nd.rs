use crate::{
    error::Result,
    feasible::feasible,
    oracle::{FailureCheck, Standard, ValueDensity},
    rsrc::System,
    sched::{insert_sorted, Pick, SchedFlags, Strategy}
};

use tracing::{debug, trace};

/// Clark's _Dependent Activity Scheduling Algorithm_ without dependency
/// handling (DASA-ND).
///
/// Tries tasks from the most to the least value-dense, admitting each into a
/// deadline-ordered schedule only if the schedule stays feasible.
#[derive(Default)]
pub struct DasaNd<O = Standard> {
    oracle: O
}

impl DasaNd {
    /// Constructs a new instance of `DasaNd` consulting the standard oracle.
    pub fn new() -> Self {
        Self { oracle: Standard }
    }
}

impl<O> DasaNd<O> {
    /// Constructs a new instance of `DasaNd` consulting `oracle`.
    pub fn with_oracle(oracle: O) -> Self {
        Self { oracle }
    }
}

impl<O> Strategy for DasaNd<O> where O: ValueDensity + FailureCheck {
    fn schedule(&self, sys: &mut System, flags: SchedFlags) -> Result<Pick> {
        sys.ensure_ready()?;

        let mut density = Vec::with_capacity(sys.num_tasks());

        for i in 0 .. sys.num_tasks() {
            if self.oracle.is_failed(sys, i, flags) {
                return Ok(Pick::Failed(i));
            }

            self.oracle.compute(sys, i, false, flags);
            insert_sorted(&mut density, i, |j| sys.task(j).ivd);
        }

        let mut schedule = Vec::with_capacity(density.len());

        for &i in &density {
            let at = insert_sorted(&mut schedule, i, |j| sys.task(j).deadline);

            if !feasible(sys, &schedule, sys.now()) {
                trace!(task = i, "rejected");
                schedule.remove(at);
            }
        }

        let best = match schedule.first() {
            Some(&head) => head,
            None => {
                debug!("DASA-ND admitted nothing, falling back to highest value density");
                density[0]
            }
        };

        debug!(task = best, admitted = schedule.len(), "DASA-ND pick");
        Ok(Pick::Run(best))
    }

    fn name(&self) -> &'static str { "DASA_ND" }
}
