#![warn(clippy::pedantic)]

use localsched::{
    task::Time,
    rsrc::System,
    scenario::Scenario,
    feasible::underloaded,
    sched::{self, Dasa, Pick, SchedFlags, Strategy},
    gen, sim
};

use anyhow::Context;
use clap::{Args, Parser, Subcommand, ValueEnum};
use itertools::Itertools;
use rand::{rngs::StdRng, SeedableRng};
use tracing_subscriber::EnvFilter;

use std::{
    ops::RangeInclusive,
    path::{Path, PathBuf},
    thread, fmt, fs
};

/// Periods (short, medium, long) in microseconds.
const PERIODS: [RangeInclusive<Time>; 3] = [
     3_000 ..=  33_000,
    10_000 ..= 100_000,
    50_000 ..= 500_000
];

/// Ready-set sizes drawn for the statistics.
const NUM_TASKS: RangeInclusive<usize> = 4 ..= 24;

// normalized load function
struct Nuf {
    range: RangeInclusive<usize>,
    gen: Box<dyn Fn(usize) -> f64 + Sync>
}

impl Nuf {
    #[allow(clippy::cast_precision_loss)]
    fn uniform() -> Self {
        Self {
            range: 2 ..= 15,
            gen: Box::new(|x| x as f64 / 10.0)
        }
    }

    #[allow(clippy::cast_precision_loss)]
    fn log() -> Self {
        Self {
            range: 1 ..= 32,
            gen: Box::new(|x| -2.0 * (x as f64 / -8.0).exp_m1())
        }
    }

    fn gen(&self) -> impl Iterator<Item = f64> + '_ {
        self.range.clone().map(&self.gen)
    }
}

struct StatRunner<'a> {
    strategies: &'a [Box<dyn Strategy + Sync>],
    args: &'a StatArgs,
    nuf: &'a Nuf
}

impl StatRunner<'_> {
    /// Accrued-value ratio of each strategy, summed over all passes at load
    /// `load`, followed by the number of underloaded ready sets.
    fn collect(&self, load: f64, seed: u64) -> anyhow::Result<Box<[f64]>> {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut res = vec![0.0; self.strategies.len() + 1].into_boxed_slice();

        let tasks = gen::Tasks::new(load, NUM_TASKS, PERIODS[self.args.periods as usize].clone());
        let owners = gen::Ownership::new(self.args.prob_hold, self.args.prob_req);

        for _ in 0 .. self.args.passes {
            let mut ready = tasks.gen(&mut rng);
            let rsrc = owners.gen(&mut ready, self.args.num_rsrc, &mut rng);

            for (acc, strategy) in res.iter_mut().zip(self.strategies) {
                *acc += sim::run(strategy.as_ref(), &ready, &rsrc, 0, self.args.flags())?.accrued();
            }

            if underloaded(ready.iter()) {
                res[self.strategies.len()] += 1.0;
            }
        }

        Ok(res)
    }
}

impl fmt::Display for StatRunner<'_> {
    #[allow(clippy::cast_precision_loss)]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let loads = self.nuf.gen().collect::<Vec<_>>();

        let results = thread::scope(|s| {
            let handles = loads.iter().enumerate().map(|(i, &load)| {
                let seed = self.args.seed.wrapping_add(i as u64);
                s.spawn(move || self.collect(load, seed))
            }).collect::<Vec<_>>();

            handles.into_iter()
                   .map(|h| h.join().unwrap_or_else(|_| Err(anyhow::anyhow!("worker panicked"))))
                   .collect::<Vec<_>>()
        });

        write!(f, "load\t{}\tunderloaded", self.strategies.iter().map(|s| s.name()).join("\t"))?;

        for (load, res) in loads.iter().zip(results) {
            writeln!(f)?;
            write!(f, "{load}")?;

            match res {
                Ok(res) => {
                    for value in res.iter() {
                        write!(f, "\t{}", value / self.args.passes.max(1) as f64)?;
                    }
                },
                Err(e) => {
                    tracing::error!("statistics at load {load} failed: {e:#}");
                    return Err(fmt::Error);
                }
            }
        }

        Ok(())
    }
}

#[derive(Clone, Copy, ValueEnum)]
#[repr(usize)]
enum Length {
    Short,
    Medium,
    Long
}

#[derive(Clone, Copy, ValueEnum)]
enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogLevel::Error => write!(f, "error"),
            LogLevel::Warn  => write!(f, "warn"),
            LogLevel::Info  => write!(f, "info"),
            LogLevel::Debug => write!(f, "debug"),
            LogLevel::Trace => write!(f, "trace")
        }
    }
}

#[derive(Args)]
struct StatArgs {
    #[arg(value_enum, short = 'p', default_value = "medium")]
    /// Task period length class
    periods: Length,
    #[arg(short = 'r', default_value_t = 4)]
    /// Number of resources in system
    num_rsrc: usize,
    #[arg(short = 'a', default_value_t = 0.5)]
    /// Probability that a resource is held
    prob_hold: f64,
    #[arg(short = 'q', default_value_t = 0.25)]
    /// Probability that a task waits on a held resource
    prob_req: f64,
    #[arg(short = 'u')]
    /// Generate log-scale loads instead of linear-scale
    log_nuf: bool,
    #[arg(short = 'n', default_value_t = 1_000)]
    /// Number of ready sets generated per load
    passes: usize,
    #[arg(long, default_value_t = 0)]
    /// Seed for the ready-set generator
    seed: u64,
    #[arg(long)]
    /// Abort tasks past their deadline instead of running them late
    abort_missed: bool
}

impl StatArgs {
    fn flags(&self) -> SchedFlags {
        if self.abort_missed {
            SchedFlags::ABORT_MISSED
        } else {
            SchedFlags::empty()
        }
    }
}

#[derive(Subcommand)]
enum Command {
    /// Pick the next task of a scenario file
    Pick {
        /// Scenario file (TOML)
        scenario: PathBuf,
        #[arg(short = 's')]
        /// Strategy to use; all of them if omitted
        strategy: Option<String>
    },
    /// Show the working state of a DASA decision on a scenario file
    Explain {
        /// Scenario file (TOML)
        scenario: PathBuf
    },
    /// Compare accrued value of all strategies over generated ready sets
    Stats {
        #[command(flatten)]
        args: StatArgs
    }
}

#[derive(Parser)]
#[command(version)]
struct Cli {
    #[arg(long, value_enum, global = true)]
    /// Logging level; defaults to `LOCALSCHED_LOG` or `warn`
    log_level: Option<LogLevel>,
    #[command(subcommand)]
    command: Command
}

fn init_logging(level: Option<LogLevel>) {
    let filter = match level {
        Some(level) => EnvFilter::new(level.to_string()),
        None => EnvFilter::try_from_env("LOCALSCHED_LOG")
                          .unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load(path: &Path) -> anyhow::Result<Scenario> {
    let src = fs::read_to_string(path)
        .with_context(|| format!("error while reading {}", path.display()))?;

    Scenario::from_toml(&src)
        .with_context(|| format!("error while loading {}", path.display()))
}

fn describe(sc: &Scenario, pick: Pick) -> String {
    match pick {
        Pick::Run(i)    => format!("run {}", sc.names[i]),
        Pick::Failed(i) => format!("abort {}", sc.names[i])
    }
}

fn pick(path: &Path, strategy: Option<&str>) -> anyhow::Result<()> {
    let strategies = match strategy {
        Some(name) => vec![sched::by_name(name)?],
        None => sched::all().into_vec()
    };

    let sc = load(path)?;

    for strategy in strategies {
        // every strategy decides on the same, untouched ready set
        let mut tasks = sc.tasks.clone();
        let mut sys = System::new(&mut tasks, &sc.rsrc, sc.now);
        let pick = strategy.schedule(&mut sys, sc.flags)?;

        println!("{}\t{}", strategy.name(), describe(&sc, pick));
    }

    Ok(())
}

fn explain(path: &Path) -> anyhow::Result<()> {
    let mut sc = load(path)?;
    let mut sys = System::new(&mut sc.tasks, &sc.rsrc, sc.now);
    let plan = Dasa::new().plan(&mut sys, sc.flags)?;

    let names = |list: &[usize]| list.iter().map(|&i| sc.names[i].as_str()).join(" ");

    println!("density\t{}", names(&plan.density));
    println!("schedule\t{}", names(&plan.committed));

    for (i, deadline) in plan.tentative.iter().enumerate() {
        println!("deadline\t{}\t{}\t{deadline}", sc.names[i], sc.tasks[i].deadline);
    }

    println!("decision\t{}", describe(&sc, plan.pick));
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_logging(cli.log_level);

    match cli.command {
        Command::Pick { scenario, strategy } => pick(&scenario, strategy.as_deref()),
        Command::Explain { scenario } => explain(&scenario),
        Command::Stats { args } => {
            let nuf = if args.log_nuf {
                Nuf::log()
            } else {
                Nuf::uniform()
            };

            let strategies = sched::all();

            println!("{}", StatRunner {
                strategies: &strategies,
                args: &args,
                nuf: &nuf
            });

            Ok(())
        }
    }
}
