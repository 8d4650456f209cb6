use localsched::{
    rsrc::{Resource, System},
    sched::{self, Dasa, Edf, Lbesa, Pick, SchedFlags, Strategy},
    task::{Task, TaskFlags, Time},
    Error
};

use proptest::{prelude::*, strategy::Strategy as _};

/// Ready set with resources; owners and requests always point in range.
#[derive(Clone, Debug)]
struct ReadySet {
    tasks: Vec<Task>,
    rsrc: Vec<Resource>
}

fn ready_set(max_tasks: usize, max_rsrc: usize) -> impl proptest::strategy::Strategy<Value = ReadySet> {
    (1 ..= max_tasks, 0 ..= max_rsrc).prop_flat_map(|(n, r)| {
        let tasks = prop::collection::vec(
            (1 .. 50 as Time, 1 .. 200 as Time, 0 .. 300 as Time, 1 .. 100u64,
             prop::option::of(0 .. r.max(1))),
            n
        );
        let owners = prop::collection::vec(prop::option::of(0 .. n), r);

        (tasks, owners).prop_map(move |(params, owners)| {
            let rsrc = owners.into_iter().map(|owner| Resource { owner }).collect::<Vec<_>>();

            let tasks = params.into_iter().enumerate().map(|(i, (left, period, deadline, value, req))| {
                let mut task = Task::new(left, period)
                    .with_deadline(deadline)
                    .with_value(value)
                    .holding(rsrc.iter().filter(|res| res.owner == Some(i)).count());

                task.requested = req.filter(|&q| q < rsrc.len());
                task
            }).collect();

            ReadySet { tasks, rsrc }
        })
    })
}

/// Ready set that completes in time when run in generated order from time
/// `0`, shuffled afterwards.
fn feasible_set(max_tasks: usize) -> impl proptest::strategy::Strategy<Value = Vec<Task>> {
    prop::collection::vec((1 .. 20 as Time, 0 .. 20 as Time, 1 .. 100u64), 1 ..= max_tasks)
        .prop_map(|params| {
            let mut elapsed = 0;

            params.into_iter().map(|(left, slack, value)| {
                elapsed += left;
                Task::new(left, 500).with_deadline(elapsed + slack).with_value(value)
            }).collect::<Vec<_>>()
        })
        .prop_shuffle()
}

fn flags() -> impl proptest::strategy::Strategy<Value = SchedFlags> {
    (0 ..= SchedFlags::all().bits()).prop_map(SchedFlags::from_bits_truncate)
}

fn decide(strategy: &dyn Strategy, set: &ReadySet, now: Time, flags: SchedFlags) -> (Pick, Vec<Task>) {
    let mut tasks = set.tasks.clone();
    let mut sys = System::new(&mut tasks, &set.rsrc, now);
    let pick = strategy.schedule(&mut sys, flags).unwrap();

    (pick, tasks)
}

#[test]
fn empty_ready_set_is_an_error() {
    for strategy in sched::all().iter() {
        let mut sys = System::new(&mut [], &[], 0);

        assert!(
            matches!(strategy.schedule(&mut sys, SchedFlags::empty()), Err(Error::EmptyReadySet)),
            "{} accepted an empty ready set", strategy.name()
        );
    }
}

#[test]
fn single_task_is_picked() {
    let set = ReadySet { tasks: vec![Task::new(5, 10).with_deadline(3)], rsrc: Vec::new() };

    for strategy in sched::all().iter() {
        assert_eq!(decide(strategy.as_ref(), &set, 0, SchedFlags::empty()).0, Pick::Run(0),
                   "{}", strategy.name());
    }
}

#[test]
fn sort_keys() {
    for strategy in sched::all().iter() {
        let expected = if strategy.name() == "EDF" {
            sched::SortKey::Deadline
        } else {
            sched::SortKey::Period
        };

        assert_eq!(strategy.sort_key(), expected, "{}", strategy.name());
    }
}

proptest! {
    #[test]
    fn picks_a_ready_task(set in ready_set(12, 4), now in 0 .. 100 as Time, flags in flags()) {
        for strategy in sched::all().iter() {
            let (pick, _) = decide(strategy.as_ref(), &set, now, flags);

            prop_assert!(pick.task() < set.tasks.len(), "{} picked {:?}", strategy.name(), pick);
        }
    }

    #[test]
    fn decisions_are_idempotent(set in ready_set(12, 4), now in 0 .. 100 as Time, flags in flags()) {
        let state = |tasks: &[Task]| {
            tasks.iter().map(|t| (t.ivd, t.dynamic_priority, t.flags)).collect::<Vec<_>>()
        };

        for strategy in sched::all().iter() {
            // the second call sees everything the first one wrote
            let mut tasks = set.tasks.clone();
            let mut sys = System::new(&mut tasks, &set.rsrc, now);

            let first = strategy.schedule(&mut sys, flags).unwrap();
            let after_first = state(sys.tasks());
            let second = strategy.schedule(&mut sys, flags).unwrap();

            prop_assert_eq!(first, second, "{}", strategy.name());
            prop_assert_eq!(after_first, state(sys.tasks()), "{}", strategy.name());
        }
    }

    #[test]
    fn scratch_flags_are_cleared(set in ready_set(12, 4), now in 0 .. 100 as Time, flags in flags()) {
        for strategy in sched::all().iter() {
            let (_, tasks) = decide(strategy.as_ref(), &set, now, flags);

            prop_assert!(
                tasks.iter().all(|t| !t.flags.intersects(TaskFlags::MARKED | TaskFlags::DEADLOCKED)),
                "{} left scratch flags behind", strategy.name()
            );
        }
    }

    #[test]
    fn only_the_oracle_touches_tasks(set in ready_set(12, 4), now in 0 .. 100 as Time, flags in flags()) {
        for strategy in sched::all().iter() {
            let (_, tasks) = decide(strategy.as_ref(), &set, now, flags);

            for (before, after) in set.tasks.iter().zip(&tasks) {
                prop_assert_eq!(
                    (before.deadline, before.left, before.value, before.locks_held, before.requested),
                    (after.deadline, after.left, after.value, after.locks_held, after.requested)
                );
            }
        }
    }

    #[test]
    fn edf_picks_an_earliest_deadline(set in ready_set(12, 4), now in 0 .. 100 as Time) {
        let (pick, _) = decide(&Edf, &set, now, SchedFlags::empty());
        let min = set.tasks.iter().map(|t| t.deadline).min();

        prop_assert_eq!(Some(set.tasks[pick.task()].deadline), min);
        prop_assert_eq!(pick, Pick::Run(set.tasks.iter().position(|t| Some(t.deadline) == min).unwrap()));
    }

    #[test]
    fn lbesa_runs_edf_on_feasible_sets(set in feasible_set(8), now in 0 .. 10 as Time) {
        let set = ReadySet {
            tasks: set.into_iter().map(|mut t| {
                t.deadline += now;
                t
            }).collect(),
            rsrc: Vec::new()
        };

        let (lbesa, _) = decide(&Lbesa::new(), &set, now, SchedFlags::empty());
        let (edf, _) = decide(&Edf, &set, now, SchedFlags::empty());

        prop_assert_eq!(lbesa, edf);
    }

    #[test]
    fn dasa_commits_a_feasible_schedule(set in ready_set(10, 3), now in 0 .. 50 as Time) {
        let mut tasks = set.tasks.clone();
        let mut sys = System::new(&mut tasks, &set.rsrc, now);
        let plan = Dasa::new().plan(&mut sys, SchedFlags::empty()).unwrap();

        if let Pick::Run(_) = plan.pick {
            let mut elapsed = now;

            for &i in &plan.committed {
                elapsed += set.tasks[i].left;
                prop_assert!(elapsed <= set.tasks[i].deadline);
            }

            if let Some(&head) = plan.committed.first() {
                prop_assert_eq!(plan.pick, Pick::Run(head));
            }
        }
    }
}
