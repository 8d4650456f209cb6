//! Scheduling strategies.
//!
//! Each strategy selects, from a ready set, the single task the dispatcher
//! should handle next. Strategies keep no state between calls.

mod dasa;
mod dasa_nd;
mod edf;
mod icpp;
mod lbesa;

pub use dasa::{Dasa, Plan};
pub use dasa_nd::DasaNd;
pub use edf::Edf;
pub use icpp::Icpp;
pub use lbesa::Lbesa;

use crate::{
    error::{Error, Result},
    rsrc::System
};

use bitflags::bitflags;

bitflags! {
    /// Flags passed to every scheduling decision.
    #[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
    pub struct SchedFlags: u8 {
        /// Run the task at the end of the chosen task's wait-for chain
        /// instead of the task itself, where supported.
        const PI           = 1 << 0;
        /// The caller guarantees the wait-for graph is acyclic; skip
        /// deadlock detection.
        const NO_DEADLOCKS = 1 << 1;
        /// Flag tasks whose deadline has already passed as aborted.
        const ABORT_MISSED = 1 << 2;
    }
}

/// Key by which the dispatcher should keep its ready list ordered.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SortKey {
    /// Ascending period.
    Period,
    /// Ascending absolute deadline.
    Deadline
}

/// Outcome of a scheduling decision.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Pick {
    /// The task at this index was already flagged aborted or failed; the
    /// dispatcher must retire it before anything else runs.
    Failed(usize),
    /// The task at this index should run next.
    Run(usize)
}

impl Pick {
    /// Returns the index of the picked task, whatever the outcome.
    pub fn task(self) -> usize {
        match self {
            Pick::Failed(i) | Pick::Run(i) => i
        }
    }
}

/// A scheduling strategy for a single core.
pub trait Strategy {
    /// Selects the next task out of the ready set in `sys`.
    ///
    /// Always picks some task of a non-empty ready set, and fails with
    /// [`Error::EmptyReadySet`] otherwise. Any scratch state used during the
    /// call is cleared before returning.
    fn schedule(&self, sys: &mut System, flags: SchedFlags) -> Result<Pick>;

    /// Returns the name of the strategy.
    fn name(&self) -> &'static str;

    /// Returns the ordering the dispatcher should maintain on its ready list.
    fn sort_key(&self) -> SortKey { SortKey::Period }
}

/// Returns every strategy, with the standard oracle where one is needed.
pub fn all() -> Box<[Box<dyn Strategy + Sync>]> {
    Box::new([Box::new(Edf),
              Box::new(Lbesa::new()),
              Box::new(DasaNd::new()),
              Box::new(Dasa::new()),
              Box::new(Icpp)])
}

/// Looks up a strategy in [`all`] by name.
///
/// Matching ignores case and treats `-` and `_` alike.
pub fn by_name(name: &str) -> Result<Box<dyn Strategy + Sync>> {
    let wanted = name.to_ascii_uppercase().replace('-', "_");

    all().into_vec()
         .into_iter()
         .find(|s| s.name() == wanted)
         .ok_or_else(|| Error::UnknownStrategy(name.to_owned()))
}

/// Inserts task `i` into `list` so that `list` stays ascending by `key`,
/// after any tasks with an equal key. Returns the insertion point.
fn insert_sorted<K: Ord>(list: &mut Vec<usize>, i: usize, key: impl Fn(usize) -> K) -> usize {
    let k = key(i);
    let at = list.partition_point(|&j| key(j) <= k);
    list.insert(at, i);
    at
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_resolve() {
        for name in ["edf", "LBESA", "dasa-nd", "DASA_ND", "Dasa", "icpp"] {
            assert!(by_name(name).is_ok(), "{name} should resolve");
        }

        assert!(matches!(by_name("rms"), Err(Error::UnknownStrategy(n)) if n == "rms"));
    }

    #[test]
    fn names_are_unique() {
        let names = all().iter().map(|s| s.name()).collect::<Vec<_>>();

        for (i, name) in names.iter().enumerate() {
            assert!(!names[i + 1 ..].contains(name));
        }
    }

    #[test]
    fn insertion_is_stable() {
        let keys = [3, 1, 3, 2, 1];
        let mut list = Vec::new();

        for i in 0 .. keys.len() {
            insert_sorted(&mut list, i, |j| keys[j]);
        }

        assert_eq!(list, [1, 4, 3, 0, 2]);
    }

    #[test]
    fn pick_task() {
        assert_eq!(Pick::Failed(3).task(), 3);
        assert_eq!(Pick::Run(5).task(), 5);
    }
}
