//! Ready sets described in TOML.
//!
//! ```toml
//! now = 0
//! flags = ["ABORT_MISSED"]
//!
//! [[task]]
//! name = "sensor"
//! left = 2
//! period = 20
//! deadline = 10
//! value = 5
//! requests = "bus"
//!
//! [[task]]
//! name = "logger"
//! left = 3
//! period = 40
//!
//! [[resource]]
//! name = "bus"
//! owner = "logger"
//! ```
//!
//! Deadlines default to the period and values to `1`. Lock counts are
//! derived from resource ownership.

use crate::{
    error::{Error, Result},
    rsrc::Resource,
    sched::SchedFlags,
    task::{Task, TaskFlags, Time}
};

use serde::Deserialize;

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawScenario {
    #[serde(default)]
    now: Time,
    #[serde(default)]
    flags: Vec<String>,
    #[serde(default, rename = "task")]
    tasks: Vec<RawTask>,
    #[serde(default, rename = "resource")]
    rsrc: Vec<RawResource>
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawTask {
    name: Option<String>,
    left: Time,
    period: Time,
    deadline: Option<Time>,
    #[serde(default = "default_value")]
    value: u64,
    priority: Option<u64>,
    requests: Option<String>,
    #[serde(default)]
    flags: Vec<String>
}

fn default_value() -> u64 {
    1
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawResource {
    name: String,
    owner: Option<String>
}

/// A ready set together with its resources and scheduling context.
#[derive(Debug)]
pub struct Scenario {
    /// Time at which the decision is made.
    pub now: Time,
    /// Flags to schedule with.
    pub flags: SchedFlags,
    /// Task names, indexed like [`tasks`](`Self::tasks`).
    pub names: Vec<String>,
    /// The ready set.
    pub tasks: Vec<Task>,
    /// The resource table.
    pub rsrc: Vec<Resource>
}

fn parse_flags<F: bitflags::Flags>(names: &[String], what: &str) -> Result<F> {
    names.iter().try_fold(F::empty(), |acc, name| {
        F::from_name(&name.to_ascii_uppercase().replace('-', "_"))
            .map(|f| acc.union(f))
            .ok_or_else(|| Error::Scenario(format!("unknown {what} flag `{name}`")))
    })
}

impl Scenario {
    /// Parses a scenario from TOML source `src`.
    ///
    /// # Errors
    ///
    /// Fails on malformed TOML, duplicate names, references to unknown tasks
    /// or resources, and unknown flags.
    pub fn from_toml(src: &str) -> Result<Self> {
        let raw: RawScenario = toml::from_str(src)?;

        let names = raw.tasks.iter()
                             .enumerate()
                             .map(|(i, t)| t.name.clone().unwrap_or_else(|| format!("T{i}")))
                             .collect::<Vec<_>>();

        for (i, name) in names.iter().enumerate() {
            if names[.. i].contains(name) {
                return Err(Error::Scenario(format!("duplicate task `{name}`")));
            }
        }

        let task_index = |name: &str| {
            names.iter()
                 .position(|n| n == name)
                 .ok_or_else(|| Error::Scenario(format!("unknown task `{name}`")))
        };

        let rsrc_index = |name: &str| {
            raw.rsrc.iter()
                    .position(|r| r.name == name)
                    .ok_or_else(|| Error::Scenario(format!("unknown resource `{name}`")))
        };

        let rsrc = raw.rsrc.iter().enumerate().map(|(i, r)| {
            if raw.rsrc[.. i].iter().any(|other| other.name == r.name) {
                return Err(Error::Scenario(format!("duplicate resource `{}`", r.name)));
            }

            Ok(Resource { owner: r.owner.as_deref().map(task_index).transpose()? })
        }).collect::<Result<Vec<_>>>()?;

        let tasks = raw.tasks.iter().enumerate().map(|(i, t)| {
            let mut task = Task::new(t.left, t.period)
                .with_deadline(t.deadline.unwrap_or(t.period))
                .with_value(t.value)
                .holding(rsrc.iter().filter(|r| r.owner == Some(i)).count());

            task.dynamic_priority = t.priority;
            task.requested = t.requests.as_deref().map(rsrc_index).transpose()?;
            task.flags = parse_flags::<TaskFlags>(&t.flags, "task")?;

            Ok(task)
        }).collect::<Result<Vec<_>>>()?;

        Ok(Self {
            now: raw.now,
            flags: parse_flags(&raw.flags, "scheduling")?,
            names,
            tasks,
            rsrc
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EXAMPLE: &str = r#"
        now = 1
        flags = ["abort-missed", "PI"]

        [[task]]
        name = "sensor"
        left = 2
        period = 20
        deadline = 10
        value = 5
        requests = "bus"

        [[task]]
        left = 3
        period = 40
        priority = 7
        flags = ["failed"]

        [[resource]]
        name = "bus"
        owner = "T1"
    "#;

    #[test]
    fn parses_example() {
        let sc = Scenario::from_toml(EXAMPLE).unwrap();

        assert_eq!(sc.now, 1);
        assert_eq!(sc.flags, SchedFlags::ABORT_MISSED | SchedFlags::PI);
        assert_eq!(sc.names, ["sensor", "T1"]);

        assert_eq!(sc.tasks[0].deadline, 10);
        assert_eq!(sc.tasks[0].value, 5);
        assert_eq!(sc.tasks[0].requested, Some(0));
        assert_eq!(sc.tasks[0].locks_held, 0);

        assert_eq!(sc.tasks[1].deadline, 40);
        assert_eq!(sc.tasks[1].value, 1);
        assert_eq!(sc.tasks[1].dynamic_priority, Some(7));
        assert_eq!(sc.tasks[1].locks_held, 1);
        assert_eq!(sc.tasks[1].flags, TaskFlags::FAILED);

        assert_eq!(sc.rsrc[0].owner, Some(1));
    }

    #[test]
    fn rejects_unknown_references() {
        let owner = "[[task]]\nleft = 1\nperiod = 2\n[[resource]]\nname = \"r\"\nowner = \"nobody\"";
        let request = "[[task]]\nleft = 1\nperiod = 2\nrequests = \"r\"";
        let flag = "flags = [\"turbo\"]";

        for src in [owner, request, flag] {
            assert!(matches!(Scenario::from_toml(src), Err(Error::Scenario(_))), "{src}");
        }
    }

    #[test]
    fn rejects_duplicates() {
        let src = "[[task]]\nname = \"a\"\nleft = 1\nperiod = 2\n[[task]]\nname = \"a\"\nleft = 1\nperiod = 2";

        assert!(matches!(Scenario::from_toml(src), Err(Error::Scenario(_))));
    }

    #[test]
    fn rejects_bad_toml() {
        assert!(matches!(Scenario::from_toml("[[task]]\nleft = \"x\""), Err(Error::Toml(_))));
    }
}
