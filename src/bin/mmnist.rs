use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "mmnist", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate train/test sequences and detector manifests.
    Generate(GenerateArgs),
    /// Write YOLO label files and manifests for an existing dataset.
    Prepare(PrepareArgs),
}

#[derive(Parser, Debug)]
struct GenerateArgs {
    /// JSON config; flags below override its values.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Random seed.
    #[arg(long, short = 's')]
    seed: Option<u64>,

    /// Directory with train/test image and label files.
    #[arg(long, short = 'd')]
    data_dir: Option<PathBuf>,

    /// Dataset output directory.
    #[arg(long, short = 'o')]
    output_dir: Option<PathBuf>,

    /// Number of train sequences.
    #[arg(long)]
    train_size: Option<usize>,

    /// Number of test sequences.
    #[arg(long)]
    test_size: Option<usize>,

    /// Number of frames in a sequence.
    #[arg(long)]
    n_frames: Option<u32>,

    /// Minimum number of digits in a sequence.
    #[arg(long)]
    min_digits: Option<usize>,

    /// Maximum number of digits in a sequence.
    #[arg(long)]
    max_digits: Option<usize>,

    /// Output frame size.
    #[arg(long, num_args = 2, value_names = ["WIDTH", "HEIGHT"])]
    image_size: Option<Vec<u32>>,

    /// Digit sizes.
    #[arg(long, num_args = 1..)]
    sizes: Option<Vec<u32>>,

    /// Size oscillation period factors.
    #[arg(long, num_args = 1..)]
    oscillations: Option<Vec<f64>>,

    /// Size oscillation variances.
    #[arg(long, num_args = 1..)]
    oscillation_variances: Option<Vec<f64>>,

    /// Frames per second (oscillation period length).
    #[arg(long)]
    fps: Option<f64>,

    /// Digit velocity scale.
    #[arg(long, short = 'v')]
    velocity: Option<f64>,

    /// Frame image encoding.
    #[arg(long, value_enum)]
    frame_format: Option<FrameFormatChoice>,

    /// Generate sequences in parallel.
    #[arg(long)]
    parallel: bool,

    /// Worker threads for --parallel.
    #[arg(long)]
    threads: Option<usize>,
}

#[derive(Parser, Debug)]
struct PrepareArgs {
    /// Dataset directory.
    dataset: PathBuf,

    /// Train subdirectory.
    #[arg(long, default_value = "train")]
    train: String,

    /// Test subdirectory.
    #[arg(long, default_value = "test")]
    test: String,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum FrameFormatChoice {
    Jpeg,
    Png,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Generate(args) => cmd_generate(args),
        Command::Prepare(args) => cmd_prepare(args),
    }
}

fn build_config(args: GenerateArgs) -> anyhow::Result<mmnist::GeneratorConfig> {
    let mut cfg = match &args.config {
        Some(path) => mmnist::GeneratorConfig::from_json_file(path)?,
        None => mmnist::GeneratorConfig::default(),
    };

    if let Some(v) = args.seed {
        cfg.seed = v;
    }
    if let Some(v) = args.data_dir {
        cfg.data_dir = v;
    }
    if let Some(v) = args.output_dir {
        cfg.output_dir = v;
    }
    if let Some(v) = args.train_size {
        cfg.train_size = v;
    }
    if let Some(v) = args.test_size {
        cfg.test_size = v;
    }
    if let Some(v) = args.n_frames {
        cfg.n_frames = v;
    }
    if let Some(v) = args.min_digits {
        cfg.min_digits = v;
    }
    if let Some(v) = args.max_digits {
        cfg.max_digits = v;
    }
    if let Some(v) = args.image_size {
        let [width, height] = v.as_slice() else {
            anyhow::bail!("--image-size takes exactly two values");
        };
        cfg.canvas = mmnist::Canvas::new(*width, *height)?;
    }
    if let Some(v) = args.sizes {
        cfg.digit.sizes = v;
    }
    if let Some(v) = args.oscillations {
        cfg.digit.oscillations = v;
    }
    if let Some(v) = args.oscillation_variances {
        cfg.digit.oscillation_variances = v;
    }
    if let Some(v) = args.fps {
        cfg.digit.fps = v;
    }
    if let Some(v) = args.velocity {
        cfg.digit.velocity = v;
    }
    if let Some(v) = args.frame_format {
        cfg.frame_format = match v {
            FrameFormatChoice::Jpeg => mmnist::FrameFormat::Jpeg,
            FrameFormatChoice::Png => mmnist::FrameFormat::Png,
        };
    }
    if args.parallel {
        cfg.threading.parallel = true;
    }
    if args.threads.is_some() {
        cfg.threading.threads = args.threads;
    }

    cfg.validate()?;
    Ok(cfg)
}

fn cmd_generate(args: GenerateArgs) -> anyhow::Result<()> {
    let cfg = build_config(args)?;
    let stats = mmnist::generate_dataset(&cfg)?;
    eprintln!(
        "wrote {} train / {} test sequences to {}",
        stats.train.sequences,
        stats.test.sequences,
        cfg.output_dir.display()
    );
    Ok(())
}

fn cmd_prepare(args: PrepareArgs) -> anyhow::Result<()> {
    let summary = mmnist::prepare_dataset(&args.dataset, &args.train, &args.test)?;
    eprintln!(
        "indexed {} train / {} test frames, {} classes",
        summary.train_images, summary.test_images, summary.classes
    );
    Ok(())
}
