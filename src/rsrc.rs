//! The resource model.

use crate::{
    error::{Error, Result},
    oracle::Clock,
    task::{Task, Time}
};

/// A lockable resource.
#[derive(Default, Clone, Copy, Debug)]
pub struct Resource {
    /// The task holding the resource, as an index into some [`System`].
    pub owner: Option<usize>
}

impl Resource {
    /// Constructs a new `Resource` held by the task at index `owner`.
    pub fn owned_by(owner: usize) -> Self {
        Self { owner: Some(owner) }
    }
}

/// Ready set with the resource-ownership graph, borrowed for a single
/// scheduling decision.
///
/// Tasks are identified by their index in the ready set; resources by their
/// index in the resource table. The tasks are borrowed mutably so that
/// strategies can record value densities, priorities and flags, but no
/// strategy ever modifies the resource table.
pub struct System<'a> {
    tasks: &'a mut [Task],
    rsrc: &'a [Resource],
    now: Time
}

impl<'a> System<'a> {
    /// Constructs a new `System` over ready set `tasks` and resource table
    /// `rsrc`, as seen at time `now`.
    pub fn new(tasks: &'a mut [Task], rsrc: &'a [Resource], now: Time) -> Self {
        Self { tasks, rsrc, now }
    }

    /// Constructs a new `System` as seen at the current time of `clock`.
    pub fn at(tasks: &'a mut [Task], rsrc: &'a [Resource], clock: &impl Clock) -> Self {
        Self::new(tasks, rsrc, clock.now())
    }

    /// Fails with [`Error::EmptyReadySet`] if there are no ready tasks.
    pub fn ensure_ready(&self) -> Result<()> {
        if self.tasks.is_empty() {
            Err(Error::EmptyReadySet)
        } else {
            Ok(())
        }
    }
}

impl System<'_> {
    /// Returns the number of ready tasks.
    pub fn num_tasks(&self) -> usize {
        self.tasks.len()
    }

    /// Returns the current time.
    pub fn now(&self) -> Time {
        self.now
    }

    /// Retrieves the task at index `i`.
    ///
    /// # Panics
    ///
    /// Panics if `i` is out of bounds for the ready set.
    pub fn task(&self, i: usize) -> &Task {
        &self.tasks[i]
    }

    /// Retrieves the task at index `i` mutably.
    ///
    /// # Panics
    ///
    /// Panics if `i` is out of bounds for the ready set.
    pub fn task_mut(&mut self, i: usize) -> &mut Task {
        &mut self.tasks[i]
    }

    /// Returns the whole ready set.
    pub fn tasks(&self) -> &[Task] {
        self.tasks
    }

    /// Returns the current holder of the resource at index `rsrc`.
    ///
    /// Unknown resources and owners outside the ready set are reported as
    /// unowned, which ends any wait-for chain passing through them.
    pub fn owner(&self, rsrc: usize) -> Option<usize> {
        self.rsrc.get(rsrc)
                 .and_then(|r| r.owner)
                 .filter(|&owner| owner < self.tasks.len())
    }
}
