//! Query-set selection for benchmark runs.
//!
//! Generators are passed in explicitly; the same seed always yields the same
//! subset and the same order for a given map file.

use rand::distributions::{Bernoulli, Distribution};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

/// Keeps each offered id with fixed probability, one draw per offer.
pub struct BernoulliSampler<R> {
    dist: Bernoulli,
    rng: R,
}

impl<R: Rng> BernoulliSampler<R> {
    pub fn new(proportion: f64, rng: R) -> anyhow::Result<Self> {
        let dist = Bernoulli::new(proportion)
            .map_err(|e| anyhow::anyhow!("invalid sample proportion {proportion}: {e}"))?;
        Ok(Self { dist, rng })
    }

    pub fn keep(&mut self) -> bool {
        self.dist.sample(&mut self.rng)
    }
}

/// Seeded generator used for both sampling and shuffling.
pub fn seeded(seed: u64) -> StdRng {
    StdRng::seed_from_u64(seed)
}

/// Shuffle ids in place with the given generator.
pub fn shuffle_ids<R: Rng>(ids: &mut [String], rng: &mut R) {
    ids.shuffle(rng);
}

/// Collects the ids a run will query while the archive map loads.
pub enum QuerySet {
    /// Interactive and index-only runs query nothing up front
    Empty,
    Sampled {
        sampler: BernoulliSampler<StdRng>,
        ids: Vec<String>,
    },
    Full(Vec<String>),
}

impl QuerySet {
    pub fn sampled(proportion: f64, seed: u64, capacity: usize) -> anyhow::Result<Self> {
        let expected = (capacity as f64 * proportion).ceil() as usize;
        Ok(QuerySet::Sampled {
            sampler: BernoulliSampler::new(proportion, seeded(seed))?,
            ids: Vec::with_capacity(expected),
        })
    }

    pub fn full(capacity: usize) -> Self {
        QuerySet::Full(Vec::with_capacity(capacity))
    }

    pub fn offer(&mut self, content_id: &str) {
        match self {
            QuerySet::Empty => {}
            QuerySet::Sampled { sampler, ids } => {
                if sampler.keep() {
                    ids.push(content_id.to_string());
                }
            }
            QuerySet::Full(ids) => ids.push(content_id.to_string()),
        }
    }

    pub fn into_ids(self) -> Vec<String> {
        match self {
            QuerySet::Empty => Vec::new(),
            QuerySet::Sampled { ids, .. } | QuerySet::Full(ids) => ids,
        }
    }
}
