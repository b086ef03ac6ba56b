use super::*;

pub(crate) fn idx_images(images: &[Vec<u8>]) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(&IMAGE_MAGIC.to_be_bytes());
    out.extend_from_slice(&(images.len() as u32).to_be_bytes());
    out.extend_from_slice(&SOURCE_SIDE.to_be_bytes());
    out.extend_from_slice(&SOURCE_SIDE.to_be_bytes());
    for img in images {
        out.extend_from_slice(img);
    }
    out
}

pub(crate) fn idx_labels(labels: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(&LABEL_MAGIC.to_be_bytes());
    out.extend_from_slice(&(labels.len() as u32).to_be_bytes());
    out.extend_from_slice(labels);
    out
}

fn gradient_image(seed: u8) -> Vec<u8> {
    (0..784u32).map(|i| (i as u8).wrapping_add(seed)).collect()
}

#[test]
fn load_images_reshapes_payload_to_28x28() {
    let bytes = idx_images(&[gradient_image(0), gradient_image(3)]);
    let images = load_images(&bytes).unwrap();
    assert_eq!(images.len(), 2);
    assert_eq!(images[0].dimensions(), (28, 28));
    // Row-major: pixel (x=1, y=1) is byte 29.
    assert_eq!(images[0].get_pixel(1, 1).0[0], 29);
    assert_eq!(images[1].get_pixel(0, 0).0[0], 3);
}

#[test]
fn load_images_rejects_short_header() {
    let err = load_images(&[0u8; 10]).unwrap_err();
    assert!(matches!(err, MmnistError::Source(_)));
}

#[test]
fn load_images_rejects_truncated_payload() {
    let mut bytes = idx_images(&[gradient_image(0)]);
    bytes.truncate(bytes.len() - 1);
    assert!(matches!(
        load_images(&bytes).unwrap_err(),
        MmnistError::Source(_)
    ));
}

#[test]
fn load_images_rejects_wrong_magic() {
    let mut bytes = idx_images(&[gradient_image(0)]);
    bytes[3] = 0x01;
    assert!(load_images(&bytes).is_err());
}

#[test]
fn load_labels_reads_payload() {
    let labels = load_labels(&idx_labels(&[7, 2, 1])).unwrap();
    assert_eq!(labels, vec![7, 2, 1]);
}

#[test]
fn load_labels_rejects_count_mismatch() {
    let mut bytes = idx_labels(&[7, 2, 1]);
    bytes.pop();
    assert!(load_labels(&bytes).is_err());
    assert!(load_labels(&[0u8; 4]).is_err());
}

#[test]
fn split_pairs_images_with_labels() {
    let images = load_images(&idx_images(&[gradient_image(0), gradient_image(1)])).unwrap();
    let split = SourceSplit::from_parts(images.clone(), vec![4, 9]).unwrap();
    assert_eq!(split.len(), 2);
    assert_eq!(split.sprites[1].label(), 9);
    assert!(SourceSplit::from_parts(images, vec![4]).is_err());
}

#[test]
fn fetch_mnist_reads_all_four_files() {
    let dir = std::path::PathBuf::from("target").join("unit_fetch_mnist");
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("train-images"), idx_images(&[gradient_image(0)])).unwrap();
    std::fs::write(dir.join("train-labels"), idx_labels(&[3])).unwrap();
    std::fs::write(
        dir.join("test-images"),
        idx_images(&[gradient_image(1), gradient_image(2)]),
    )
    .unwrap();
    std::fs::write(dir.join("test-labels"), idx_labels(&[8, 0])).unwrap();

    let ds = fetch_mnist(&dir).unwrap();
    assert_eq!(ds.train.len(), 1);
    assert_eq!(ds.test.len(), 2);
    assert_eq!(ds.test.sprites[0].label(), 8);
}

#[test]
fn fetch_mnist_missing_dir_is_an_error() {
    let dir = std::path::PathBuf::from("target").join("unit_fetch_mnist_missing");
    let _ = std::fs::remove_dir_all(&dir);
    assert!(fetch_mnist(&dir).is_err());
}
