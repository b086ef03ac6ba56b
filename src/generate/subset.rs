use std::ops::Range;

use rand::{Rng, RngCore, SeedableRng, seq::SliceRandom};
use rand_chacha::ChaCha8Rng;

use crate::{
    foundation::core::Canvas,
    foundation::error::{MmnistError, MmnistResult},
    motion::digit::{Digit, DigitConfig},
    render::sequence::Sequence,
    source::{idx::SourceSplit, sprite::Sprite},
};

/// Shape of the sequences generated from one source split.
#[derive(Clone, Debug, PartialEq)]
pub struct SubsetParams {
    pub n_sequences: usize,
    pub n_frames: u32,
    /// Inclusive bounds on the number of digits per sequence.
    pub min_digits: usize,
    pub max_digits: usize,
    pub canvas: Canvas,
    pub digit: DigitConfig,
}

impl SubsetParams {
    pub fn validate(&self) -> MmnistResult<()> {
        if self.n_frames == 0 {
            return Err(MmnistError::validation("n_frames must be > 0"));
        }
        if self.min_digits == 0 {
            return Err(MmnistError::validation("min_digits must be > 0"));
        }
        if self.min_digits > self.max_digits {
            return Err(MmnistError::validation(format!(
                "min_digits ({}) must be <= max_digits ({})",
                self.min_digits, self.max_digits
            )));
        }
        if self.canvas.width == 0 || self.canvas.height == 0 {
            return Err(MmnistError::validation("canvas width/height must be non-zero"));
        }
        self.digit.validate()
    }
}

/// Which pool entries a sequence consumes and the seed its digits are drawn with.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SequencePlan {
    pub index: usize,
    pub pool_range: Range<usize>,
    pub seed: u64,
}

/// Walks a shuffled pool of source sprites in consecutive chunks, one chunk per sequence.
///
/// The master RNG decides the shuffle, each chunk's size and each sequence's seed, in that
/// order; digit state is then drawn from a per-sequence RNG. Plans can therefore be built on
/// any thread and still reproduce the serial output. When a chunk would run past the end of
/// the pool the cursor restarts at 0 without reshuffling, so images repeat once the pool is
/// exhausted.
pub struct SubsetGenerator {
    pool: Vec<Sprite>,
    params: SubsetParams,
    rng: ChaCha8Rng,
    cursor: usize,
    emitted: usize,
}

impl SubsetGenerator {
    pub fn new(split: &SourceSplit, params: SubsetParams, mut rng: ChaCha8Rng) -> MmnistResult<Self> {
        params.validate()?;
        if params.n_sequences > 0 && split.len() < params.max_digits {
            return Err(MmnistError::validation(format!(
                "source pool has {} images, fewer than max_digits ({})",
                split.len(),
                params.max_digits
            )));
        }

        let mut pool = split.sprites.clone();
        pool.shuffle(&mut rng);
        Ok(Self {
            pool,
            params,
            rng,
            cursor: 0,
            emitted: 0,
        })
    }

    pub fn pool(&self) -> &[Sprite] {
        &self.pool
    }

    pub fn params(&self) -> &SubsetParams {
        &self.params
    }

    /// Decide the next sequence's pool chunk and seed, or `None` once all are planned.
    pub fn next_plan(&mut self) -> Option<SequencePlan> {
        if self.emitted >= self.params.n_sequences {
            return None;
        }

        let k = self
            .rng
            .gen_range(self.params.min_digits..=self.params.max_digits);
        if self.cursor + k > self.pool.len() {
            tracing::debug!(
                sequence = self.emitted,
                pool = self.pool.len(),
                "source pool exhausted, restarting from the beginning"
            );
            self.cursor = 0;
        }
        let pool_range = self.cursor..self.cursor + k;
        self.cursor = pool_range.end;

        let plan = SequencePlan {
            index: self.emitted,
            pool_range,
            seed: self.rng.next_u64(),
        };
        self.emitted += 1;
        Some(plan)
    }

    /// Plan every remaining sequence.
    pub fn plans(&mut self) -> impl Iterator<Item = SequencePlan> + '_ {
        std::iter::from_fn(move || self.next_plan())
    }

    /// Build the digits of `plan` and wrap them in a [`Sequence`].
    ///
    /// Source images without any bright pixel are skipped, so such a sequence carries fewer
    /// digits; track ids stay contiguous.
    pub fn build(&self, plan: &SequencePlan) -> MmnistResult<Sequence> {
        build_sequence(&self.pool, &self.params, plan)
    }
}

pub(crate) fn build_sequence(
    pool: &[Sprite],
    params: &SubsetParams,
    plan: &SequencePlan,
) -> MmnistResult<Sequence> {
    let sprites = pool.get(plan.pool_range.clone()).ok_or_else(|| {
        MmnistError::validation(format!(
            "sequence {} pool range {:?} exceeds pool of {}",
            plan.index,
            plan.pool_range,
            pool.len()
        ))
    })?;

    let mut rng = ChaCha8Rng::seed_from_u64(plan.seed);
    let mut digits = Vec::with_capacity(sprites.len());
    for (offset, sprite) in sprites.iter().enumerate() {
        if !sprite.has_content() {
            tracing::warn!(
                sequence = plan.index,
                pool_index = plan.pool_range.start + offset,
                label = sprite.label(),
                "skipping blank source image"
            );
            continue;
        }
        digits.push(Digit::random(
            sprite.clone(),
            params.canvas,
            &params.digit,
            &mut rng,
        )?);
    }

    Ok(Sequence::new(digits, params.n_frames, params.canvas))
}

impl Iterator for SubsetGenerator {
    type Item = MmnistResult<Sequence>;

    fn next(&mut self) -> Option<Self::Item> {
        let plan = self.next_plan()?;
        Some(self.build(&plan))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/generate/subset.rs"]
mod tests;
