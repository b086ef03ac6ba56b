use std::{
    collections::BTreeSet,
    fmt::Write as _,
    path::{Path, PathBuf},
};

use anyhow::Context as _;

use crate::{
    dataset::writer::read_annotations,
    foundation::error::{MmnistError, MmnistResult},
};

pub const TRAIN_LIST: &str = "train.txt";
pub const TEST_LIST: &str = "test.txt";
pub const NAMES_FILE: &str = "obj.names";
pub const DATA_FILE: &str = "obj.data";

const IMAGE_EXTENSIONS: [&str; 3] = ["jpg", "jpeg", "png"];

/// Frame images (relative to the split directory) and labels seen in one split.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SubsetIndex {
    pub images: Vec<PathBuf>,
    pub labels: BTreeSet<u8>,
}

/// Output of [`prepare_dataset`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PrepareSummary {
    pub train_images: usize,
    pub test_images: usize,
    pub classes: usize,
}

fn sorted_entries(dir: &Path) -> MmnistResult<Vec<PathBuf>> {
    let mut out = Vec::new();
    for entry in std::fs::read_dir(dir).with_context(|| format!("list '{}'", dir.display()))? {
        let entry = entry.with_context(|| format!("list '{}'", dir.display()))?;
        out.push(entry.path());
    }
    out.sort();
    Ok(out)
}

fn is_frame_image(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| IMAGE_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
}

/// Write one `label cx cy w h` file next to every frame image of a sequence.
///
/// Returns the sequence's frame images (sorted) and the labels it uses.
pub fn convert_sequence(dir: &Path) -> MmnistResult<(Vec<PathBuf>, BTreeSet<u8>)> {
    let annotations = read_annotations(dir)?;
    let images: Vec<PathBuf> = sorted_entries(dir)?
        .into_iter()
        .filter(|p| is_frame_image(p))
        .collect();
    if images.len() != annotations.len() {
        return Err(MmnistError::dataset(format!(
            "'{}' has {} images but {} annotated frames",
            dir.display(),
            images.len(),
            annotations.len()
        )));
    }

    let mut labels = BTreeSet::new();
    for (image, objects) in images.iter().zip(&annotations) {
        let mut body = String::new();
        for obj in objects {
            labels.insert(obj.label);
            let b = obj.bbox;
            let _ = writeln!(body, "{} {} {} {} {}", obj.label, b.cx, b.cy, b.w, b.h);
        }
        let txt = image.with_extension("txt");
        std::fs::write(&txt, body).with_context(|| format!("write '{}'", txt.display()))?;
    }
    Ok((images, labels))
}

/// Convert every sequence directory under `split_dir`, in sorted order.
pub fn convert_subset(split_dir: &Path) -> MmnistResult<SubsetIndex> {
    let mut index = SubsetIndex::default();
    for seq_dir in sorted_entries(split_dir)?.into_iter().filter(|p| p.is_dir()) {
        let (images, labels) = convert_sequence(&seq_dir)?;
        for image in images {
            let rel = image.strip_prefix(split_dir).map_err(|_| {
                MmnistError::dataset(format!(
                    "'{}' is not under '{}'",
                    image.display(),
                    split_dir.display()
                ))
            })?;
            index.images.push(rel.to_path_buf());
        }
        index.labels.extend(labels);
    }
    Ok(index)
}

fn manifest_line(split: &str, rel: &Path) -> String {
    let parts: Vec<String> = rel
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    format!("data/{split}/{}", parts.join("/"))
}

fn write_manifest(path: &Path, split: &str, images: &[PathBuf]) -> MmnistResult<()> {
    let mut body = String::new();
    for rel in images {
        body.push_str(&manifest_line(split, rel));
        body.push('\n');
    }
    std::fs::write(path, body).with_context(|| format!("write '{}'", path.display()))?;
    Ok(())
}

/// Emit per-frame YOLO label files plus the image lists, class names and data descriptor.
#[tracing::instrument]
pub fn prepare_dataset(root: &Path, train: &str, test: &str) -> MmnistResult<PrepareSummary> {
    let train_index = convert_subset(&root.join(train))?;
    let test_index = convert_subset(&root.join(test))?;

    write_manifest(&root.join(TRAIN_LIST), train, &train_index.images)?;
    write_manifest(&root.join(TEST_LIST), test, &test_index.images)?;

    let names: BTreeSet<u8> = train_index
        .labels
        .union(&test_index.labels)
        .copied()
        .collect();
    let mut names_body = String::new();
    for label in &names {
        let _ = writeln!(names_body, "{label}");
    }
    let names_path = root.join(NAMES_FILE);
    std::fs::write(&names_path, names_body)
        .with_context(|| format!("write '{}'", names_path.display()))?;

    let data_path = root.join(DATA_FILE);
    let data_body = format!(
        "classes = {}\ntrain = data/{TRAIN_LIST}\nvalid = data/{TEST_LIST}\nnames = data/{NAMES_FILE}\nbackup = data/\n",
        names.len()
    );
    std::fs::write(&data_path, data_body)
        .with_context(|| format!("write '{}'", data_path.display()))?;

    let summary = PrepareSummary {
        train_images: train_index.images.len(),
        test_images: test_index.images.len(),
        classes: names.len(),
    };
    tracing::info!(
        train = summary.train_images,
        test = summary.test_images,
        classes = summary.classes,
        "wrote detector manifests"
    );
    Ok(summary)
}

#[cfg(test)]
#[path = "../../tests/unit/dataset/yolo.rs"]
mod tests;
