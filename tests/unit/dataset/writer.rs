use image::GrayImage;

use crate::foundation::core::NormBox;

use super::*;

fn frame(index: u32) -> FrameRecord {
    let mut image = GrayImage::new(16, 16);
    image.put_pixel(index % 16, 3, image::Luma([255]));
    FrameRecord {
        index,
        image,
        bboxes: vec![
            NormBox {
                cx: 0.5,
                cy: 0.25,
                w: 0.125,
                h: 0.5,
            },
            NormBox {
                cx: 0.1,
                cy: 0.2,
                w: 0.3,
                h: 0.4,
            },
        ],
        labels: vec![7, 1],
        track_ids: vec![0, 1],
    }
}

fn fresh_root(name: &str) -> PathBuf {
    let root = PathBuf::from("target").join(name);
    let _ = std::fs::remove_dir_all(&root);
    root
}

#[test]
fn frame_names_are_zero_padded() {
    assert_eq!(frame_file_name(7, FrameFormat::Jpeg), "0007.jpg");
    assert_eq!(frame_file_name(123, FrameFormat::Png), "0123.png");
}

#[test]
fn writes_frames_and_annotations() {
    let writer = DatasetWriter::new(fresh_root("unit_writer_ok"), FrameFormat::Png);
    let summary = writer
        .write_sequence("train", 3, 2, vec![frame(0), frame(1)])
        .unwrap();

    assert_eq!(summary.dir, writer.sequence_dir("train", 3));
    assert!(summary.dir.ends_with("train/000003"));
    assert_eq!(summary.frames, 2);
    assert_eq!(summary.objects, 4);
    assert!(summary.dir.join("0000.png").exists());
    assert!(summary.dir.join("0001.png").exists());

    let reloaded = image::open(summary.dir.join("0001.png")).unwrap().to_luma8();
    assert_eq!(reloaded.get_pixel(1, 3).0[0], 255);

    let ann = read_annotations(&summary.dir).unwrap();
    assert_eq!(ann.len(), 2);
    assert_eq!(ann[1][0].label, 7);
    assert_eq!(ann[1][1].track_id, 1);
    assert_eq!(ann[0][0].bbox.cx, 0.5);
}

#[test]
fn annotation_schema_is_bbox_label_track_id() {
    let writer = DatasetWriter::new(fresh_root("unit_writer_schema"), FrameFormat::Png);
    let summary = writer.write_sequence("test", 0, 1, vec![frame(0)]).unwrap();
    let raw = std::fs::read_to_string(summary.dir.join(ANNOTATIONS_FILE)).unwrap();
    let v: serde_json::Value = serde_json::from_str(&raw).unwrap();
    let obj = &v[0][0];
    assert_eq!(obj["bbox"], serde_json::json!([0.5, 0.25, 0.125, 0.5]));
    assert_eq!(obj["label"], 7);
    assert_eq!(obj["track_id"], 0);
}

#[test]
fn jpeg_frames_are_written() {
    let writer = DatasetWriter::new(fresh_root("unit_writer_jpeg"), FrameFormat::Jpeg);
    let summary = writer.write_sequence("train", 0, 1, vec![frame(0)]).unwrap();
    assert!(summary.dir.join("0000.jpg").exists());
}

#[test]
fn frame_count_mismatch_aborts_sequence() {
    let writer = DatasetWriter::new(fresh_root("unit_writer_mismatch"), FrameFormat::Png);
    let err = writer
        .write_sequence("train", 0, 3, vec![frame(0), frame(1)])
        .unwrap_err();
    assert!(matches!(err, MmnistError::Dataset(_)));
    assert!(!writer.sequence_dir("train", 0).exists());
}

#[test]
fn failed_frame_write_removes_partial_sequence() {
    let writer = DatasetWriter::new(fresh_root("unit_writer_save_error"), FrameFormat::Png);
    let dir = writer.sequence_dir("train", 0);
    // A directory squatting on the second frame's path makes that save fail.
    std::fs::create_dir_all(dir.join(frame_file_name(1, FrameFormat::Png))).unwrap();

    let err = writer
        .write_sequence("train", 0, 3, vec![frame(0), frame(1), frame(2)])
        .unwrap_err();
    assert!(matches!(err, MmnistError::Other(_)));
    assert!(!dir.exists());
}
