//! Wait-for chains over the resource-ownership graph.
//!
//! A task blocked on a resource depends on the task currently holding it,
//! which may in turn be blocked on another resource, and so on. Every walk
//! here is bounded by a call-local visited set, so it visits each ready task
//! at most once and terminates on cycles of any shape. None of these
//! functions modifies the resource table.

use crate::{
    rsrc::System,
    task::{TaskFlags, Time}
};

use tracing::trace;

/// Returns the task that the task at index `task` is waiting on, if any.
pub fn first_dependency(sys: &System, task: usize) -> Option<usize> {
    sys.task(task).requested.and_then(|rsrc| sys.owner(rsrc))
}

/// Returns the wait-for chain starting at the task at index `task`, in walk
/// order and with `task` first.
///
/// The walk stops at the first task that is not waiting on anything, or just
/// before revisiting a task, so the chain never contains duplicates.
pub fn chain(sys: &System, task: usize) -> Vec<usize> {
    let mut visited = vec![false; sys.num_tasks()];
    let mut out = Vec::new();
    let mut cur = Some(task);

    while let Some(i) = cur {
        if visited[i] {
            break;
        }

        visited[i] = true;
        out.push(i);
        cur = first_dependency(sys, i);
    }

    out
}

/// Returns the task able to make progress on behalf of the task at index
/// `task`: the last task of its wait-for chain.
///
/// For a task that waits on nothing, this is the task itself.
pub fn pi_task(sys: &System, task: usize) -> usize {
    chain(sys, task).last().copied().unwrap_or(task)
}

/// Walks the wait-for chain from the task at index `task`, marking every task
/// visited, and flags `task` [`DEADLOCKED`](`TaskFlags::DEADLOCKED`) if the walk
/// comes back to a task it already marked.
///
/// Marks are cleared again before returning, whether or not a cycle was found.
/// Returns whether a deadlock was detected.
pub fn mark_and_detect_deadlock(sys: &mut System, task: usize) -> bool {
    let mut visited = vec![false; sys.num_tasks()];
    let mut touched = Vec::new();
    let mut cur = Some(task);
    let mut deadlock = false;

    while let Some(i) = cur {
        if visited[i] {
            deadlock = true;
            break;
        }

        visited[i] = true;
        sys.task_mut(i).flags.insert(TaskFlags::MARKED);
        touched.push(i);
        cur = first_dependency(sys, i);
    }

    if deadlock {
        trace!(task, chain = ?touched, "deadlock detected");
        sys.task_mut(task).flags.insert(TaskFlags::DEADLOCKED);
    }

    for i in touched {
        sys.task_mut(i).flags.remove(TaskFlags::MARKED);
    }

    deadlock
}

/// Propagates deadlines along the wait-for chain of the task at index `task`.
///
/// Each task on the chain gets, in `temp`, the earliest deadline among itself
/// and the tasks before it on the chain: a task blocking a more urgent one
/// inherits its urgency. `temp` must be indexed like the ready set.
///
/// Returns the chain, as per [`chain`].
pub fn compute_tentative_deadlines(sys: &System, task: usize, temp: &mut [Time]) -> Vec<usize> {
    let chain = chain(sys, task);
    let mut min = Time::MAX;

    for &i in &chain {
        min = min.min(sys.task(i).deadline);
        temp[i] = min;
    }

    chain
}
