//! Feasibility tests.

use crate::{
    rsrc::System,
    task::{Set, Time}
};

use num_order::NumOrd;

/// Tests whether running the tasks at indices `order` back to back,
/// non-preemptively and starting at time `start`, meets every deadline.
///
/// The sequence is feasible iff for every prefix, `start` plus the sum of
/// remaining times in the prefix does not exceed the deadline of the task
/// ending it. The empty sequence is feasible.
pub fn feasible(sys: &System, order: &[usize], start: Time) -> bool {
    let mut elapsed = start;

    for &i in order {
        let task = sys.task(i);
        elapsed = elapsed.saturating_add(task.left);

        if elapsed > task.deadline {
            return false;
        }
    }

    true
}

/// Tests whether task-set `ts` does not overload a single core, i.e. whether
/// its total utilization is no greater than `1`.
///
/// This is a necessary condition for any strategy to meet every deadline in
/// the long run; it says nothing about a single decision.
pub fn underloaded(ts: impl Set) -> bool {
    ts.utilization().num_le(&1usize)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::Task;

    use proptest::prelude::*;

    #[test]
    fn empty_is_feasible() {
        let sys = System::new(&mut [], &[], 100);

        assert!(feasible(&sys, &[], 100));
    }

    #[test]
    fn deadline_is_inclusive() {
        let mut tasks = [Task::new(3, 10).with_deadline(5), Task::new(2, 10).with_deadline(7)];
        let sys = System::new(&mut tasks, &[], 2);

        assert!(feasible(&sys, &[0, 1], 2));
        assert!(!feasible(&sys, &[1, 0], 2));
        assert!(!feasible(&sys, &[0, 1], 3));
    }

    #[test]
    fn underloaded_at_exactly_one() {
        let full = [Task::new(1, 2), Task::new(1, 2)];
        let over = [Task::new(1, 2), Task::new(2, 3)];

        assert!(underloaded(full.iter()));
        assert!(!underloaded(over.iter()));
    }

    proptest! {
        #[test]
        fn matches_prefix_sums(
            params in prop::collection::vec((0 .. 20u64, 0 .. 100u64), 0 .. 8),
            start in 0 .. 10u64
        ) {
            let mut tasks = params.iter()
                                .map(|&(left, deadline)| Task::new(left, 100).with_deadline(deadline))
                                .collect::<Vec<_>>();
            let order = (0 .. tasks.len()).collect::<Vec<_>>();

            let expected = (1 ..= tasks.len()).all(|k| {
                start + tasks[.. k].iter().map(|t| t.left).sum::<u64>() <= tasks[k - 1].deadline
            });

            let before = tasks.iter().map(|t| (t.left, t.deadline)).collect::<Vec<_>>();
            let sys = System::new(&mut tasks, &[], start);

            prop_assert_eq!(feasible(&sys, &order, start), expected);
            prop_assert_eq!(
                sys.tasks().iter().map(|t| (t.left, t.deadline)).collect::<Vec<_>>(),
                before
            );
        }
    }
}
