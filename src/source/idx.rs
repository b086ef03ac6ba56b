use std::path::Path;

use anyhow::Context as _;
use image::GrayImage;

use crate::{
    foundation::error::{MmnistError, MmnistResult},
    source::sprite::Sprite,
};

pub const IMAGE_HEADER_LEN: usize = 16;
pub const LABEL_HEADER_LEN: usize = 8;
pub const IMAGE_MAGIC: u32 = 0x0000_0803;
pub const LABEL_MAGIC: u32 = 0x0000_0801;
/// Edge length of every source image.
pub const SOURCE_SIDE: u32 = 28;

const TRAIN_IMAGES: &str = "train-images";
const TRAIN_LABELS: &str = "train-labels";
const TEST_IMAGES: &str = "test-images";
const TEST_LABELS: &str = "test-labels";

/// Labelled sprites of one split, in file order.
#[derive(Clone, Debug, Default)]
pub struct SourceSplit {
    pub sprites: Vec<Sprite>,
}

impl SourceSplit {
    /// Pair decoded images with their labels.
    pub fn from_parts(images: Vec<GrayImage>, labels: Vec<u8>) -> MmnistResult<Self> {
        if images.len() != labels.len() {
            return Err(MmnistError::source(format!(
                "image count ({}) does not match label count ({})",
                images.len(),
                labels.len()
            )));
        }
        let sprites = images
            .into_iter()
            .zip(labels)
            .map(|(img, label)| Sprite::new(img, label))
            .collect();
        Ok(Self { sprites })
    }

    pub fn len(&self) -> usize {
        self.sprites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sprites.is_empty()
    }
}

/// Train and test splits of the source digits.
#[derive(Clone, Debug, Default)]
pub struct SourceDataset {
    pub train: SourceSplit,
    pub test: SourceSplit,
}

fn read_be_u32(bytes: &[u8], offset: usize) -> u32 {
    u32::from_be_bytes([
        bytes[offset],
        bytes[offset + 1],
        bytes[offset + 2],
        bytes[offset + 3],
    ])
}

/// Decode an IDX image file: 16-byte header followed by `count` 28x28 grayscale images.
pub fn load_images(bytes: &[u8]) -> MmnistResult<Vec<GrayImage>> {
    if bytes.len() < IMAGE_HEADER_LEN {
        return Err(MmnistError::source(format!(
            "image file is {} bytes, shorter than the {IMAGE_HEADER_LEN}-byte header",
            bytes.len()
        )));
    }
    let magic = read_be_u32(bytes, 0);
    if magic != IMAGE_MAGIC {
        return Err(MmnistError::source(format!(
            "bad image file magic {magic:#010x}, expected {IMAGE_MAGIC:#010x}"
        )));
    }
    let count = read_be_u32(bytes, 4) as usize;
    let rows = read_be_u32(bytes, 8);
    let cols = read_be_u32(bytes, 12);
    if rows != SOURCE_SIDE || cols != SOURCE_SIDE {
        return Err(MmnistError::source(format!(
            "images are {rows}x{cols}, expected {SOURCE_SIDE}x{SOURCE_SIDE}"
        )));
    }

    let item_len = (SOURCE_SIDE * SOURCE_SIDE) as usize;
    let payload = &bytes[IMAGE_HEADER_LEN..];
    let expected = count
        .checked_mul(item_len)
        .ok_or_else(|| MmnistError::source("image count overflows payload size"))?;
    if payload.len() != expected {
        return Err(MmnistError::source(format!(
            "image payload is {} bytes, header declares {count} images ({expected} bytes)",
            payload.len()
        )));
    }

    payload
        .chunks_exact(item_len)
        .map(|chunk| {
            GrayImage::from_raw(SOURCE_SIDE, SOURCE_SIDE, chunk.to_vec())
                .ok_or_else(|| MmnistError::source("image chunk does not fill 28x28"))
        })
        .collect()
}

/// Decode an IDX label file: 8-byte header followed by one byte per label.
pub fn load_labels(bytes: &[u8]) -> MmnistResult<Vec<u8>> {
    if bytes.len() < LABEL_HEADER_LEN {
        return Err(MmnistError::source(format!(
            "label file is {} bytes, shorter than the {LABEL_HEADER_LEN}-byte header",
            bytes.len()
        )));
    }
    let magic = read_be_u32(bytes, 0);
    if magic != LABEL_MAGIC {
        return Err(MmnistError::source(format!(
            "bad label file magic {magic:#010x}, expected {LABEL_MAGIC:#010x}"
        )));
    }
    let count = read_be_u32(bytes, 4) as usize;
    let payload = &bytes[LABEL_HEADER_LEN..];
    if payload.len() != count {
        return Err(MmnistError::source(format!(
            "label payload is {} bytes, header declares {count} labels",
            payload.len()
        )));
    }
    Ok(payload.to_vec())
}

fn read_file(path: &Path) -> MmnistResult<Vec<u8>> {
    Ok(std::fs::read(path).with_context(|| format!("read source file '{}'", path.display()))?)
}

fn load_split(dir: &Path, images_file: &str, labels_file: &str) -> MmnistResult<SourceSplit> {
    let images = load_images(&read_file(&dir.join(images_file))?)?;
    let labels = load_labels(&read_file(&dir.join(labels_file))?)?;
    SourceSplit::from_parts(images, labels)
}

/// Load both splits from `dir` (`train-images`, `train-labels`, `test-images`, `test-labels`).
#[tracing::instrument]
pub fn fetch_mnist(dir: &Path) -> MmnistResult<SourceDataset> {
    let train = load_split(dir, TRAIN_IMAGES, TRAIN_LABELS)?;
    let test = load_split(dir, TEST_IMAGES, TEST_LABELS)?;
    tracing::info!(train = train.len(), test = test.len(), "loaded source digits");
    Ok(SourceDataset { train, test })
}

#[cfg(test)]
#[path = "../../tests/unit/source/idx.rs"]
mod tests;
