use crate::{
    depend,
    error::Result,
    rsrc::System,
    sched::{Pick, SchedFlags, SortKey, Strategy}
};

use itertools::Itertools;
use tracing::debug;

/// Earliest-deadline-first.
///
/// Picks the ready task with the earliest absolute deadline, the first one
/// in ready-set order on ties. No feasibility test is made.
pub struct Edf;

impl Strategy for Edf {
    fn schedule(&self, sys: &mut System, flags: SchedFlags) -> Result<Pick> {
        sys.ensure_ready()?;

        let best = sys.tasks().iter()
                      .position_min_by_key(|t| t.deadline)
                      .unwrap_or_default();

        let best = if flags.contains(SchedFlags::PI) {
            depend::pi_task(sys, best)
        } else {
            best
        };

        debug!(task = best, deadline = sys.task(best).deadline, "EDF pick");
        Ok(Pick::Run(best))
    }

    fn name(&self) -> &'static str { "EDF" }

    fn sort_key(&self) -> SortKey { SortKey::Deadline }
}
