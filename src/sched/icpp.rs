use crate::{
    error::Result,
    rsrc::System,
    sched::{Pick, SchedFlags, Strategy}
};

use tracing::{debug, trace};

/// Dynamic-priority scheduling inspired by the _Immediate Ceiling Priority
/// Protocol_ (ICPP).
///
/// Tasks without a dynamic priority are given their period, so shorter
/// periods are more urgent, and the most urgent task runs. A system ceiling
/// is tracked alongside, lowered to the priority of each new most urgent task
/// holding a lock.
pub struct Icpp;

impl Icpp {
    /// Assigns missing priorities and returns the most urgent task, first in
    /// ready-set order on ties, along with the final ceiling.
    fn select(sys: &mut System) -> (Option<usize>, u64) {
        let mut best: Option<(usize, u64)> = None;
        let mut ceiling = u64::MAX;

        for i in 0 .. sys.num_tasks() {
            let task = sys.task_mut(i);
            let prio = *task.dynamic_priority.get_or_insert(task.period);

            if best.is_none_or(|(_, p)| prio < p) {
                if task.locks_held > 0 {
                    ceiling = ceiling.min(prio);
                }

                trace!(task = i, prio, ceiling, "new most urgent task");
                best = Some((i, prio));
            }
        }

        (best.map(|(i, _)| i), ceiling)
    }
}

impl Strategy for Icpp {
    fn schedule(&self, sys: &mut System, _: SchedFlags) -> Result<Pick> {
        sys.ensure_ready()?;

        let (best, ceiling) = Self::select(sys);

        let best = best.unwrap_or_else(|| {
            debug!("ICPP found no candidate, falling back to first task");
            0
        });

        debug!(task = best, ceiling, "ICPP pick");
        Ok(Pick::Run(best))
    }

    fn name(&self) -> &'static str { "ICPP" }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::Task;

    #[test]
    fn shortest_period_wins() {
        let mut tasks = [Task::new(1, 30), Task::new(1, 10), Task::new(1, 20), Task::new(1, 10)];
        let mut sys = System::new(&mut tasks, &[], 0);

        assert_eq!(Icpp.schedule(&mut sys, SchedFlags::empty()).unwrap(), Pick::Run(1));
        assert_eq!(tasks.map(|t| t.dynamic_priority), [Some(30), Some(10), Some(20), Some(10)]);
    }

    #[test]
    fn assigned_priorities_are_kept() {
        let mut tasks = [Task::new(1, 30), Task::new(1, 10)];
        tasks[0].dynamic_priority = Some(5);
        let mut sys = System::new(&mut tasks, &[], 0);

        assert_eq!(Icpp.schedule(&mut sys, SchedFlags::empty()).unwrap(), Pick::Run(0));
        assert_eq!(tasks[0].dynamic_priority, Some(5));
    }

    #[test]
    fn ceiling_follows_lock_holding_best() {
        let mut tasks = [
            Task::new(1, 40).holding(1),
            Task::new(1, 30),
            Task::new(1, 20).holding(2),
            Task::new(1, 50).holding(1)
        ];
        let mut sys = System::new(&mut tasks, &[], 0);

        assert_eq!(Icpp::select(&mut sys), (Some(2), 20));
    }

    #[test]
    fn ceiling_ignores_free_best() {
        let mut tasks = [Task::new(1, 40).holding(1), Task::new(1, 30)];
        let mut sys = System::new(&mut tasks, &[], 0);

        assert_eq!(Icpp::select(&mut sys), (Some(1), 40));
    }
}
