//! End-to-end batches over real files with the `image`-crate backend.
//!
//! Inputs are small synthetic PNG/JPEG files in a temp directory; outputs are
//! re-identified from disk to check format and dimensions.

use cropline::batch::{BatchJob, BatchSpec, FileFailure, TaskStatus, run_batch};
use cropline::crop::Rectangle;
use cropline::imaging::{ConvertParams, ExportFormat, ImageBackend, Quality, RustBackend};
use cropline::naming::OutputNaming;
use cropline::pipeline::{Operation, ResizeAlgorithm, ResizeOp};
use cropline::progress::{self, ProgressSink};
use cropline::selection::{SelectionError, expand_inputs, select_files};
use image::{Rgb, RgbImage, Rgba, RgbaImage};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn write_png(path: &Path, width: u32, height: u32) {
    RgbaImage::from_fn(width, height, |x, y| Rgba([x as u8, y as u8, 90, 255]))
        .save(path)
        .unwrap();
}

fn write_jpeg(path: &Path, width: u32, height: u32) {
    RgbImage::from_fn(width, height, |x, y| Rgb([x as u8, y as u8, 200]))
        .save(path)
        .unwrap();
}

fn fixture() -> TempDir {
    let tmp = TempDir::new().unwrap();
    let input = tmp.path().join("in");
    fs::create_dir_all(&input).unwrap();
    write_png(&input.join("a.png"), 120, 80);
    write_png(&input.join("b.png"), 64, 64);
    write_jpeg(&input.join("c.jpg"), 100, 50);
    fs::write(input.join("notes.txt"), "not an image").unwrap();
    fs::write(input.join("broken.png"), b"definitely not a png").unwrap();
    tmp
}

#[test]
fn convert_directory_to_webp() {
    let tmp = fixture();
    let backend = RustBackend::new();
    let out = tmp.path().join("out");

    let paths = expand_inputs(&[tmp.path().join("in")]);
    let selection = select_files(&backend, &paths);
    assert_eq!(selection.accepted.len(), 3);
    assert_eq!(selection.rejected.len(), 1);
    assert!(matches!(
        &selection.rejected[0],
        SelectionError::MetadataLoadFailure { path, .. } if path.ends_with("broken.png")
    ));

    let spec = BatchSpec::Convert(ConvertParams {
        format: Some(ExportFormat::Webp),
        quality: Quality::default(),
        resize: None,
    });
    let (sink, subscription) = progress::channel();
    let result = run_batch(
        &backend,
        &selection.accepted,
        &spec,
        &OutputNaming::in_dir(&out, "_converted"),
        &sink,
    );
    drop(sink);

    assert_eq!(result.success_count, 3);
    assert_eq!(result.failed_count, 0);
    let last = subscription.last().unwrap();
    assert_eq!((last.processed, last.total), (3, 3));

    for name in ["a_converted.webp", "b_converted.webp", "c_converted.webp"] {
        let info = backend.identify(&out.join(name)).unwrap();
        assert_eq!(info.format, "WEBP");
    }
    let c = result.outcomes[2].result.as_ref().unwrap();
    assert_eq!((c.width, c.height), (100, 50));
    assert!(c.processed_size > 0);
}

#[test]
fn edit_pipeline_applies_in_order() {
    let tmp = fixture();
    let backend = RustBackend::new();
    let out = tmp.path().join("out");
    let source = tmp.path().join("in/a.png");
    let inputs = vec![backend.identify(&source).unwrap()];

    // 120x80 → rotate → 80x120 → crop 40x60 → 50% → 20x30
    let spec = BatchSpec::Pipeline {
        operations: vec![
            Operation::Rotate { angle: 90 },
            Operation::Crop(Rectangle::new(10.0, 10.0, 40.0, 60.0)),
            Operation::Resize(ResizeOp {
                width: None,
                height: None,
                percentage: Some(50.0),
                maintain_aspect: true,
                algorithm: ResizeAlgorithm::Lanczos3,
            }),
            Operation::Flip {
                horizontal: true,
                vertical: false,
            },
        ],
        format: Some(ExportFormat::Jpeg),
        quality: Quality::new(90),
    };

    let result = run_batch(
        &backend,
        &inputs,
        &spec,
        &OutputNaming::in_dir(&out, "_edited"),
        &ProgressSink::disabled(),
    );

    assert_eq!(result.success_count, 1);
    let written = out.join("a_edited.jpg");
    let info = backend.identify(&written).unwrap();
    assert_eq!((info.width, info.height), (20, 30));
    assert_eq!(info.format, "JPEG");
}

#[test]
fn compress_keeps_formats_and_reports_missing_files() {
    let tmp = fixture();
    let backend = RustBackend::new();
    let out = tmp.path().join("out");
    let paths: Vec<PathBuf> = ["a.png", "b.png", "c.jpg"]
        .iter()
        .map(|n| tmp.path().join("in").join(n))
        .collect();
    let selection = select_files(&backend, &paths);

    // Vanishes between selection and processing.
    fs::remove_file(tmp.path().join("in/b.png")).unwrap();

    let mut job = BatchJob::new(BatchSpec::Compress {
        quality: Quality::new(50),
        resize: None,
    });
    assert_eq!(job.add_files(selection.accepted), 3);
    let result = job.run(
        &backend,
        &OutputNaming::in_dir(&out, "_small"),
        &ProgressSink::disabled(),
    );

    assert_eq!(result.outcomes.len(), 3);
    assert_eq!(result.success_count, 2);
    assert!(matches!(
        job.status(&paths[1]),
        Some(TaskStatus::Failed(FileFailure::Backend(_)))
    ));
    assert_eq!(backend.identify(&out.join("a_small.png")).unwrap().format, "PNG");
    assert_eq!(backend.identify(&out.join("c_small.jpg")).unwrap().format, "JPEG");
}

#[test]
fn out_of_bounds_crop_is_rejected_before_touching_files() {
    let tmp = fixture();
    let backend = RustBackend::new();
    let out = tmp.path().join("out");
    let inputs = vec![backend.identify(&tmp.path().join("in/b.png")).unwrap()];
    let spec = BatchSpec::Pipeline {
        operations: vec![Operation::Crop(Rectangle::new(0.0, 0.0, 100.0, 100.0))],
        format: None,
        quality: Quality::default(),
    };

    let result = run_batch(
        &backend,
        &inputs,
        &spec,
        &OutputNaming::in_dir(&out, "_edited"),
        &ProgressSink::disabled(),
    );

    assert!(matches!(
        result.outcomes[0].result,
        Err(FileFailure::InvalidParameters(_))
    ));
    assert!(!out.exists());
}

#[test]
fn batch_leaves_inputs_that_match_another_output_untouched() {
    let tmp = TempDir::new().unwrap();
    let a = tmp.path().join("a.png");
    let b = tmp.path().join("a_converted.png");
    write_png(&a, 32, 32);
    write_png(&b, 48, 16);
    let original = fs::read(&b).unwrap();

    let backend = RustBackend::new();
    let inputs = vec![
        backend.identify(&a).unwrap(),
        backend.identify(&b).unwrap(),
    ];
    let spec = BatchSpec::Compress {
        quality: Quality::new(60),
        resize: None,
    };
    let result = run_batch(
        &backend,
        &inputs,
        &spec,
        &OutputNaming::beside_source("_converted"),
        &ProgressSink::disabled(),
    );

    assert!(matches!(
        &result.outcomes[0].result,
        Err(FileFailure::OutputConflict(path)) if *path == b
    ));
    assert!(result.outcomes[1].result.is_ok());
    assert_eq!(fs::read(&b).unwrap(), original);
    assert!(tmp.path().join("a_converted_converted.png").exists());
}
