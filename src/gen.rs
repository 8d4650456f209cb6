//! Generators for ready sets and resource ownership.

use crate::{
    rsrc::Resource,
    task::{Task, Time}
};

use rand::{
    distributions::{uniform::SampleRange, Bernoulli},
    seq::SliceRandom,
    Rng
};

use std::mem;

/// Generator that implements Stafford's RandFixedSum.
struct Rfs {
    t: Box<[Box<[Bernoulli]>]>,
    s: f64,
    k: usize
}

impl Rfs {
    #[allow(clippy::cast_precision_loss, clippy::cast_sign_loss,
            clippy::cast_possible_truncation)]
    fn new(length: usize, s: f64) -> Self {
        assert!(length > 0, "length must be nonzero");
        assert!((0.0 ..= length as f64).contains(&s), "s must be between 0 and length");

        let k = (s as usize).min(length - 1); // 0 <= k <= length-1
        let s = s.clamp(k as f64, (k+1) as f64); // k <= s <= k+1

        // t[i][j] is only used where j <= i + 1
        let always = Bernoulli::from_ratio(1, 1).unwrap();

        let mut w = vec![0.0; length].into_boxed_slice();
        let mut t = (1 .. length).map(|l| vec![always; l + 1].into_boxed_slice())
                                 .collect::<Box<_>>();

        w[0] = f64::MAX;

        let delta = s - k as f64;

        for i in 1 .. length {
            let mut lastw = 0.0;

            for j in 0 .. i {
                let coe1 = (j as f64       + delta) / i as f64;
                let coe2 = ((i - j) as f64 - delta) / i as f64;

                let tmp1 = w[j]  * coe1;
                let tmp2 = lastw * coe2;

                lastw = mem::replace(&mut w[j], tmp1 + tmp2);

                let p = if w[j] == 0.0 {
                    f64::from(u8::from(coe1 >= 0.5))
                } else {
                    (tmp2 / w[j]).clamp(0.0, 1.0)
                };

                t[i-1][j] = Bernoulli::new(p).unwrap_or(always);
            }
        }

        Self { t, s, k }
    }

    #[allow(clippy::cast_precision_loss)]
    fn sample(&self, rng: &mut impl Rng) -> Box<[f64]> {
        let length = self.t.len() + 1;

        let mut out = vec![0.0; length].into_boxed_slice();

        // simplex coordinates: running sum and product
        let mut sm = 0.0;
        let mut pr = 1.0;

        let mut j = self.k;

        for i in (1 .. length).rev() {
            let s = self.s - (self.k - j) as f64;
            let e = rng.sample(self.t[i-1][j]);
            let sx = rng.gen::<f64>().powf((i as f64).recip());
            sm += (1.0 - sx) * pr * s / (i + 1) as f64;
            pr *= sx;
            out[length - i] = f64::from(u8::from(e)).mul_add(pr, sm);
            j -= usize::from(e);
        }

        out[0] = (self.s - (self.k - j) as f64).mul_add(pr, sm);
        out.shuffle(rng);

        out
    }
}

/// Generator for ready sets.
pub struct Tasks<R1, R2> {
    util: f64,
    num: R1,
    period: R2
}

impl<R1, R2> Tasks<R1, R2> {
    /// Constructs a new `Tasks` with the given parameters.
    ///
    /// The ready set to be generated will have total utilization `util`,
    /// counted over each task's remaining time. The number of tasks will be
    /// chosen uniformly at random from `num_tasks`, and their period also
    /// uniformly at random from `period`.
    ///
    /// Utilizations are picked uniformly at random from the space described
    /// above using [Stafford's RandFixedSum](https://www.mathworks.com/matlabcentral/fileexchange/9700-random-vectors-with-fixed-sum).
    pub fn new(util: f64, num_tasks: R1, period: R2) -> Self {
        Self {
            util,
            num: num_tasks,
            period
        }
    }
}

impl<R1, R2> Tasks<R1, R2> where R1: SampleRange<usize> + Clone,
                                 R2: SampleRange<Time> + Clone {
    /// Runs the generator.
    ///
    /// Every task is ready at time `0` and can meet its own deadline if run
    /// alone: the deadline lies uniformly between the remaining time and the
    /// period. Values are uniform in `1 ..= 100`. The total utilization is
    /// clamped to the number of tasks drawn.
    #[allow(clippy::cast_precision_loss, clippy::cast_sign_loss,
            clippy::cast_possible_truncation)]
    pub fn gen(&self, rng: &mut impl Rng) -> Vec<Task> {
        let num = rng.gen_range(self.num.clone()).max(1);
        let utils = Rfs::new(num, self.util.clamp(0.0, num as f64)).sample(rng);

        utils.iter().map(|&u| {
            let period = rng.gen_range(self.period.clone()).max(1);
            let left = ((period as f64 * u).ceil() as Time).clamp(1, period);

            Task::new(left, period)
                .with_deadline(rng.gen_range(left ..= period))
                .with_value(rng.gen_range(1 ..= 100))
        }).collect()
    }
}

/// Generator for resource ownership and requests.
pub struct Ownership {
    prob_hold: f64,
    prob_req: f64
}

impl Ownership {
    /// Constructs a new `Ownership` with the given parameters.
    ///
    /// Each resource is held by some task with probability `prob_hold`; each
    /// task then waits on some held resource with probability `prob_req`.
    pub fn new(prob_hold: f64, prob_req: f64) -> Self {
        assert!((0.0 ..= 1.0).contains(&prob_hold));
        assert!((0.0 ..= 1.0).contains(&prob_req));

        Self { prob_hold, prob_req }
    }

    /// Runs the generator, creating `num_rsrc` resources for ready set
    /// `tasks` and updating the lock counts and requests of its tasks.
    ///
    /// A task never waits on a resource it holds itself, but waits may form
    /// cycles through several tasks.
    pub fn gen(&self, tasks: &mut [Task], num_rsrc: usize, rng: &mut impl Rng) -> Vec<Resource> {
        if tasks.is_empty() {
            return vec![Resource::default(); num_rsrc];
        }

        let rsrc = (0 .. num_rsrc).map(|_| {
            if rng.gen_bool(self.prob_hold) {
                let owner = rng.gen_range(0 .. tasks.len());
                tasks[owner].locks_held += 1;
                Resource::owned_by(owner)
            } else {
                Resource::default()
            }
        }).collect::<Vec<_>>();

        for (i, task) in tasks.iter_mut().enumerate() {
            if !rng.gen_bool(self.prob_req) {
                continue;
            }

            let held = rsrc.iter()
                           .enumerate()
                           .filter(|(_, r)| r.owner.is_some_and(|o| o != i))
                           .map(|(r, _)| r)
                           .collect::<Vec<_>>();

            task.requested = held.choose(rng).copied();
        }

        rsrc
    }
}
