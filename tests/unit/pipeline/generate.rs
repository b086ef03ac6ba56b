use std::path::{Path, PathBuf};

use image::GrayImage;
use rand::RngCore;

use crate::{dataset::writer::FrameFormat, foundation::core::Canvas, source::sprite::Sprite};

use super::*;

fn source_split(n: usize) -> SourceSplit {
    let sprites = (0..n)
        .map(|i| {
            let mut img = GrayImage::new(28, 28);
            for y in 4..24 {
                for x in 8 + (i % 4) as u32..16 + (i % 4) as u32 {
                    img.put_pixel(x, y, image::Luma([255]));
                }
            }
            Sprite::new(img, (i % 10) as u8)
        })
        .collect();
    SourceSplit { sprites }
}

fn small_config(out: &Path, parallel: bool) -> GeneratorConfig {
    let mut cfg = GeneratorConfig {
        seed: 5,
        output_dir: out.to_path_buf(),
        train_size: 4,
        test_size: 2,
        n_frames: 3,
        min_digits: 1,
        max_digits: 3,
        canvas: Canvas {
            width: 64,
            height: 64,
        },
        frame_format: FrameFormat::Png,
        ..GeneratorConfig::default()
    };
    cfg.digit.sizes = vec![16, 24];
    cfg.threading.parallel = parallel;
    cfg.threading.threads = if parallel { Some(2) } else { None };
    cfg
}

fn fresh(name: &str) -> PathBuf {
    let root = PathBuf::from("target").join(name);
    let _ = std::fs::remove_dir_all(&root);
    root
}

fn source() -> SourceDataset {
    SourceDataset {
        train: source_split(12),
        test: source_split(6),
    }
}

#[test]
fn split_streams_differ() {
    let mut a = split_rng(1, Split::Train);
    let mut b = split_rng(1, Split::Test);
    assert_ne!(a.next_u64(), b.next_u64());

    let mut c = split_rng(1, Split::Train);
    let mut d = split_rng(1, Split::Train);
    assert_eq!(c.next_u64(), d.next_u64());
}

#[test]
fn generates_layout_and_manifests() {
    let out = fresh("unit_generate_layout");
    let stats = generate_from_source(&small_config(&out, false), &source()).unwrap();

    assert_eq!(stats.train.sequences, 4);
    assert_eq!(stats.test.sequences, 2);
    assert_eq!(stats.train.frames, 12);
    assert_eq!(stats.prepare.train_images, 12);
    assert_eq!(stats.prepare.test_images, 6);

    for idx in 0..4 {
        let dir = out.join("train").join(format!("{idx:06}"));
        assert!(dir.join("annotations.json").exists());
        for f in 0..3 {
            assert!(dir.join(format!("{f:04}.png")).exists());
            assert!(dir.join(format!("{f:04}.txt")).exists());
        }
    }
    assert!(out.join("train.txt").exists());
    assert!(out.join("test.txt").exists());
    assert!(out.join("obj.names").exists());
    assert!(out.join("obj.data").exists());
}

#[test]
fn track_ids_are_stable_across_written_frames() {
    let out = fresh("unit_generate_tracks");
    generate_from_source(&small_config(&out, false), &source()).unwrap();
    let ann = crate::dataset::writer::read_annotations(&out.join("train").join("000000")).unwrap();
    assert_eq!(ann.len(), 3);
    for frame in &ann {
        let ids: Vec<u32> = frame.iter().map(|o| o.track_id).collect();
        assert_eq!(ids, (0..frame.len() as u32).collect::<Vec<_>>());
        let labels: Vec<u8> = frame.iter().map(|o| o.label).collect();
        let first: Vec<u8> = ann[0].iter().map(|o| o.label).collect();
        assert_eq!(labels, first);
        for o in frame {
            for v in <[f64; 4]>::from(o.bbox) {
                assert!((0.0..=1.0).contains(&v));
            }
        }
    }
}

#[test]
fn parallel_output_matches_serial() {
    let serial = fresh("unit_generate_serial");
    let parallel = fresh("unit_generate_parallel");
    generate_from_source(&small_config(&serial, false), &source()).unwrap();
    generate_from_source(&small_config(&parallel, true), &source()).unwrap();

    for split in ["train", "test"] {
        let n = if split == "train" { 4 } else { 2 };
        for idx in 0..n {
            let rel = Path::new(split).join(format!("{idx:06}"));
            let a = std::fs::read(serial.join(&rel).join("annotations.json")).unwrap();
            let b = std::fs::read(parallel.join(&rel).join("annotations.json")).unwrap();
            assert_eq!(a, b, "{}", rel.display());
            let fa = std::fs::read(serial.join(&rel).join("0002.png")).unwrap();
            let fb = std::fs::read(parallel.join(&rel).join("0002.png")).unwrap();
            assert_eq!(fa, fb);
        }
    }
}

#[test]
fn invalid_config_fails_before_writing() {
    let out = fresh("unit_generate_invalid");
    let mut cfg = small_config(&out, false);
    cfg.min_digits = 4;
    assert!(generate_from_source(&cfg, &source()).is_err());
    assert!(!out.exists());
}

#[test]
fn missing_source_dir_is_fatal() {
    let out = fresh("unit_generate_nosource");
    let mut cfg = small_config(&out, false);
    cfg.data_dir = PathBuf::from("target").join("definitely_missing_mnist");
    assert!(generate_dataset(&cfg).is_err());
}

#[test]
fn zero_threads_is_rejected() {
    assert!(build_thread_pool(Some(0)).is_err());
    assert!(build_thread_pool(Some(1)).is_ok());
}

#[test]
fn progress_counts_each_sequence_as_it_finishes() {
    let progress = Progress::new(Split::Train, 100);
    let pool = build_thread_pool(Some(4)).unwrap();
    let mut seen: Vec<u64> = pool.install(|| {
        (0..100)
            .into_par_iter()
            .map(|_| progress.record())
            .collect()
    });
    seen.sort_unstable();
    assert_eq!(seen, (1..=100).collect::<Vec<u64>>());
    assert_eq!(progress.record(), 101);
}
