use std::sync::atomic::{AtomicU64, Ordering};

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;

use crate::{
    dataset::{
        writer::{DatasetWriter, SequenceSummary},
        yolo::{PrepareSummary, prepare_dataset},
    },
    foundation::error::{MmnistError, MmnistResult},
    generate::subset::{SequencePlan, SubsetGenerator, SubsetParams, build_sequence},
    pipeline::config::{GenerateThreading, GeneratorConfig},
    source::idx::{SourceDataset, SourceSplit, fetch_mnist},
};

/// Dataset partition a subset is written to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Split {
    Train,
    Test,
}

impl Split {
    pub fn dir_name(self) -> &'static str {
        match self {
            Self::Train => "train",
            Self::Test => "test",
        }
    }

    /// Independent ChaCha stream per split, so the test split does not depend on train size.
    fn stream(self) -> u64 {
        match self {
            Self::Train => 0,
            Self::Test => 1,
        }
    }
}

/// Master RNG for one split.
pub fn split_rng(seed: u64, split: Split) -> ChaCha8Rng {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    rng.set_stream(split.stream());
    rng
}

/// Totals for one generated subset.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SubsetStats {
    pub sequences: u64,
    pub frames: u64,
    pub objects: u64,
}

impl SubsetStats {
    fn add(&mut self, s: &SequenceSummary) {
        self.sequences += 1;
        self.frames += u64::from(s.frames);
        self.objects += s.objects;
    }
}

/// Totals for a full generation run.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DatasetStats {
    pub train: SubsetStats,
    pub test: SubsetStats,
    pub prepare: PrepareSummary,
}

/// Generate and persist every sequence of one split.
#[tracing::instrument(skip(source, params, rng, writer, threading))]
pub fn generate_subset(
    split: Split,
    source: &SourceSplit,
    params: SubsetParams,
    rng: ChaCha8Rng,
    writer: &DatasetWriter,
    threading: &GenerateThreading,
) -> MmnistResult<SubsetStats> {
    let total = params.n_sequences;
    let mut generator = SubsetGenerator::new(source, params, rng)?;
    let progress = Progress::new(split, total);
    let mut stats = SubsetStats::default();

    if !threading.parallel {
        while let Some(plan) = generator.next_plan() {
            let summary = write_plan(&generator, split, &plan, writer)?;
            stats.add(&summary);
            progress.record();
        }
        return Ok(stats);
    }

    let plans: Vec<SequencePlan> = generator.plans().collect();
    let pool = build_thread_pool(threading.threads)?;
    let results = pool.install(|| {
        plans
            .par_iter()
            .map(|plan| -> MmnistResult<SequenceSummary> {
                let summary = write_plan(&generator, split, plan, writer)?;
                progress.record();
                Ok(summary)
            })
            .collect::<Vec<_>>()
    });
    for result in results {
        stats.add(&result?);
    }
    Ok(stats)
}

fn write_plan(
    generator: &SubsetGenerator,
    split: Split,
    plan: &SequencePlan,
    writer: &DatasetWriter,
) -> MmnistResult<SequenceSummary> {
    let sequence = build_sequence(generator.pool(), generator.params(), plan)?;
    tracing::debug!(
        sequence = plan.index,
        digits = sequence.digits().len(),
        "rendering sequence"
    );
    let n_frames = sequence.n_frames();
    writer.write_sequence(split.dir_name(), plan.index, n_frames, sequence)
}

/// Completed-sequence counter shared by the workers of one split; logs every tenth of the way.
struct Progress {
    split: Split,
    total: usize,
    every: u64,
    done: AtomicU64,
}

impl Progress {
    fn new(split: Split, total: usize) -> Self {
        Self {
            split,
            total,
            every: (total as u64 / 10).max(1),
            done: AtomicU64::new(0),
        }
    }

    /// Count one finished sequence and return the running total.
    fn record(&self) -> u64 {
        let done = self.done.fetch_add(1, Ordering::Relaxed) + 1;
        if done % self.every == 0 || done == self.total as u64 {
            tracing::info!(split = self.split.dir_name(), done, total = self.total, "generating");
        }
        done
    }
}

/// Generate both splits from already loaded source digits, then write detector manifests.
#[tracing::instrument(skip(cfg, source))]
pub fn generate_from_source(
    cfg: &GeneratorConfig,
    source: &SourceDataset,
) -> MmnistResult<DatasetStats> {
    cfg.validate()?;
    let writer = DatasetWriter::new(&cfg.output_dir, cfg.frame_format);

    tracing::info!(sequences = cfg.train_size, "generating train dataset");
    let train = generate_subset(
        Split::Train,
        &source.train,
        cfg.subset_params(cfg.train_size),
        split_rng(cfg.seed, Split::Train),
        &writer,
        &cfg.threading,
    )?;

    tracing::info!(sequences = cfg.test_size, "generating test dataset");
    let test = generate_subset(
        Split::Test,
        &source.test,
        cfg.subset_params(cfg.test_size),
        split_rng(cfg.seed, Split::Test),
        &writer,
        &cfg.threading,
    )?;

    tracing::info!("generating annotations");
    let prepare = prepare_dataset(
        &cfg.output_dir,
        Split::Train.dir_name(),
        Split::Test.dir_name(),
    )?;

    tracing::info!("done");
    Ok(DatasetStats {
        train,
        test,
        prepare,
    })
}

/// Load the source digits from `cfg.data_dir` and run [`generate_from_source`].
pub fn generate_dataset(cfg: &GeneratorConfig) -> MmnistResult<DatasetStats> {
    cfg.validate()?;
    let source = fetch_mnist(&cfg.data_dir)?;
    generate_from_source(cfg, &source)
}

fn build_thread_pool(threads: Option<usize>) -> MmnistResult<rayon::ThreadPool> {
    if let Some(n) = threads
        && n == 0
    {
        return Err(MmnistError::validation(
            "threading 'threads' must be >= 1 when set",
        ));
    }

    let mut builder = rayon::ThreadPoolBuilder::new();
    if let Some(n) = threads {
        builder = builder.num_threads(n);
    }
    builder
        .build()
        .map_err(|e| MmnistError::validation(format!("failed to build rayon thread pool: {e}")))
}

#[cfg(test)]
#[path = "../../tests/unit/pipeline/generate.rs"]
mod tests;
