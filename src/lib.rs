//! Moving multiscale MNIST: a synthetic video object-detection dataset generator.
//!
//! Handwritten-digit sprites bounce around a fixed-size canvas while their size oscillates.
//! Every frame is recorded together with tight, normalized bounding boxes, class labels and
//! per-sequence track ids, then written out as a detector-ready dataset.
//!
//! # Pipeline overview
//!
//! 1. **Load**: IDX image/label files -> [`SourceSplit`] (see [`fetch_mnist`])
//! 2. **Plan**: shuffled pool -> consecutive chunks, one [`SequencePlan`] per sequence
//!    ([`SubsetGenerator`])
//! 3. **Animate**: one [`Digit`] per pool entry, composited frame by frame by [`Sequence`]
//! 4. **Persist**: frames + `annotations.json` ([`DatasetWriter`]), then YOLO label files and
//!    manifests ([`prepare_dataset`])
//!
//! Generation is deterministic for a given seed, with or without sequence-level parallelism.
#![forbid(unsafe_code)]

mod dataset;
mod foundation;
mod generate;
mod motion;
mod pipeline;
mod render;
mod source;

pub use dataset::writer::{
    ANNOTATIONS_FILE, DatasetWriter, FrameFormat, SequenceSummary, frame_file_name,
    read_annotations,
};
pub use dataset::yolo::{
    DATA_FILE, NAMES_FILE, PrepareSummary, SubsetIndex, TEST_LIST, TRAIN_LIST, convert_sequence,
    convert_subset, prepare_dataset,
};
pub use foundation::core::{Canvas, NormBox, PixelRect};
pub use foundation::error::{MmnistError, MmnistResult};
pub use generate::subset::{SequencePlan, SubsetGenerator, SubsetParams};
pub use motion::bounce::{BOUNCE_DEBOUNCE_TICKS, BounceGate};
pub use motion::digit::{Digit, DigitConfig, Oscillation};
pub use pipeline::config::{GenerateThreading, GeneratorConfig};
pub use pipeline::generate::{
    DatasetStats, Split, SubsetStats, generate_dataset, generate_from_source, generate_subset,
    split_rng,
};
pub use render::composite::paste_masked;
pub use render::sequence::{FrameRecord, ObjectAnnotation, Sequence, bbox_coords};
pub use source::idx::{
    IMAGE_HEADER_LEN, LABEL_HEADER_LEN, SOURCE_SIDE, SourceDataset, SourceSplit, fetch_mnist,
    load_images, load_labels,
};
pub use source::sprite::{BRIGHTNESS_THRESHOLD, Sprite, bright_bounds};
