use std::{
    fs::File,
    io::{BufWriter, Write as _},
    path::{Path, PathBuf},
};

use anyhow::Context as _;

use crate::{
    foundation::error::{MmnistError, MmnistResult},
    render::sequence::{FrameRecord, ObjectAnnotation},
};

/// Per-sequence annotation file name.
pub const ANNOTATIONS_FILE: &str = "annotations.json";

/// Encoding used for frame images.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FrameFormat {
    #[default]
    Jpeg,
    Png,
}

impl FrameFormat {
    pub fn extension(self) -> &'static str {
        match self {
            Self::Jpeg => "jpg",
            Self::Png => "png",
        }
    }

    fn image_format(self) -> image::ImageFormat {
        match self {
            Self::Jpeg => image::ImageFormat::Jpeg,
            Self::Png => image::ImageFormat::Png,
        }
    }
}

/// `0007.jpg` style name for a frame index.
pub fn frame_file_name(index: u32, format: FrameFormat) -> String {
    format!("{index:04}.{}", format.extension())
}

/// What was persisted for one sequence.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SequenceSummary {
    pub dir: PathBuf,
    pub frames: u32,
    pub objects: u64,
}

/// Persists rendered sequences as `<root>/<split>/<seq>/<frame>.<ext>` plus `annotations.json`.
#[derive(Clone, Debug)]
pub struct DatasetWriter {
    root: PathBuf,
    format: FrameFormat,
}

impl DatasetWriter {
    pub fn new(root: impl Into<PathBuf>, format: FrameFormat) -> Self {
        Self {
            root: root.into(),
            format,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn format(&self) -> FrameFormat {
        self.format
    }

    pub fn sequence_dir(&self, split: &str, index: usize) -> PathBuf {
        self.root.join(split).join(format!("{index:06}"))
    }

    /// Drain `frames` to disk.
    ///
    /// Fails without leaving the sequence directory behind when a frame or the annotations cannot
    /// be written, or when the number of frames produced differs from `expected_frames`.
    pub fn write_sequence(
        &self,
        split: &str,
        index: usize,
        expected_frames: u32,
        frames: impl IntoIterator<Item = FrameRecord>,
    ) -> MmnistResult<SequenceSummary> {
        let dir = self.sequence_dir(split, index);
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("create sequence dir '{}'", dir.display()))?;

        match self.write_contents(&dir, index, expected_frames, frames) {
            Ok(objects) => Ok(SequenceSummary {
                dir,
                frames: expected_frames,
                objects,
            }),
            Err(err) => {
                let _ = std::fs::remove_dir_all(&dir);
                Err(err)
            }
        }
    }

    fn write_contents(
        &self,
        dir: &Path,
        index: usize,
        expected_frames: u32,
        frames: impl IntoIterator<Item = FrameRecord>,
    ) -> MmnistResult<u64> {
        let mut annotations: Vec<Vec<ObjectAnnotation>> =
            Vec::with_capacity(expected_frames as usize);
        for frame in frames {
            let path = dir.join(frame_file_name(frame.index, self.format));
            frame
                .image
                .save_with_format(&path, self.format.image_format())
                .with_context(|| format!("write frame '{}'", path.display()))?;
            annotations.push(frame.objects());
        }

        if annotations.len() != expected_frames as usize {
            return Err(MmnistError::dataset(format!(
                "sequence {index} produced {} frames, expected {expected_frames}",
                annotations.len()
            )));
        }

        let ann_path = dir.join(ANNOTATIONS_FILE);
        let f = File::create(&ann_path)
            .with_context(|| format!("create annotations '{}'", ann_path.display()))?;
        let mut w = BufWriter::new(f);
        serde_json::to_writer(&mut w, &annotations)
            .with_context(|| format!("write annotations '{}'", ann_path.display()))?;
        w.flush()
            .with_context(|| format!("flush annotations '{}'", ann_path.display()))?;

        Ok(annotations.iter().map(|a| a.len() as u64).sum())
    }
}

/// Read back a sequence's `annotations.json`.
pub fn read_annotations(sequence_dir: &Path) -> MmnistResult<Vec<Vec<ObjectAnnotation>>> {
    let path = sequence_dir.join(ANNOTATIONS_FILE);
    let f = File::open(&path).with_context(|| format!("open annotations '{}'", path.display()))?;
    let annotations = serde_json::from_reader(std::io::BufReader::new(f))
        .with_context(|| format!("parse annotations '{}'", path.display()))?;
    Ok(annotations)
}

#[cfg(test)]
#[path = "../../tests/unit/dataset/writer.rs"]
mod tests;
