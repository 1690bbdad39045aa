//! End-to-end tests for label-based frame saving.
//!
//! These exercise the full save path: directory creation, JPEG encoding,
//! filename generation, and the per-label counters.

use std::fs;
use std::path::Path;

use framegrab::labels::LabelSet;
use framegrab::saver::{FrameSaver, SaveError};
use framegrab::source::Frame;
use tempfile::tempdir;

fn labels(list: &[&str]) -> LabelSet {
    LabelSet::new(list.iter().map(|s| s.to_string()).collect()).expect("valid label set")
}

/// A small but real RGB frame so JPEG encoding has something to chew on.
fn test_frame() -> Frame {
    let width = 8;
    let height = 6;
    let mut data = Vec::with_capacity((width * height * 3) as usize);
    for y in 0..height {
        for x in 0..width {
            data.push((x * 32) as u8);
            data.push((y * 42) as u8);
            data.push(128);
        }
    }
    Frame {
        data,
        width,
        height,
    }
}

fn file_count(dir: &Path) -> usize {
    fs::read_dir(dir).expect("readable dir").count()
}

#[test]
fn test_first_save_uses_counter_zero() {
    let dir = tempdir().expect("tempdir");
    let mut saver = FrameSaver::create(dir.path(), labels(&["one", "two", "three"])).unwrap();

    let path = saver.save(&test_frame(), 1).unwrap();

    assert_eq!(path, dir.path().join("two-000.jpg"));
    assert!(path.is_file());
    assert_eq!(saver.counts(), &[0, 1, 0]);
}

#[test]
fn test_reference_scenario_two_saves_then_quit() {
    // labels = ["one","two","three"], empty output dir. Press '1' twice:
    // two-000.jpg then two-001.jpg, exactly 2 files on disk.
    let dir = tempdir().expect("tempdir");
    let mut saver = FrameSaver::create(dir.path(), labels(&["one", "two", "three"])).unwrap();

    let first = saver.save(&test_frame(), 1).unwrap();
    let second = saver.save(&test_frame(), 1).unwrap();

    assert_eq!(first, dir.path().join("two-000.jpg"));
    assert_eq!(second, dir.path().join("two-001.jpg"));
    assert_eq!(file_count(dir.path()), 2);
}

#[test]
fn test_counters_are_independent_across_labels() {
    let dir = tempdir().expect("tempdir");
    let mut saver = FrameSaver::create(dir.path(), labels(&["one", "two"])).unwrap();
    let frame = test_frame();

    saver.save(&frame, 0).unwrap();
    saver.save(&frame, 1).unwrap();
    saver.save(&frame, 0).unwrap();
    saver.save(&frame, 0).unwrap();

    assert_eq!(saver.counts(), &[3, 1]);
    assert_eq!(saver.total_saved(), 4);
    assert!(dir.path().join("one-000.jpg").is_file());
    assert!(dir.path().join("one-001.jpg").is_file());
    assert!(dir.path().join("one-002.jpg").is_file());
    assert!(dir.path().join("two-000.jpg").is_file());
    assert_eq!(file_count(dir.path()), 4);
}

#[test]
fn test_repeated_saves_produce_distinct_increasing_files() {
    let dir = tempdir().expect("tempdir");
    let mut saver = FrameSaver::create(dir.path(), labels(&["one"])).unwrap();
    let frame = test_frame();

    let mut paths = Vec::new();
    for _ in 0..5 {
        paths.push(saver.save(&frame, 0).unwrap());
    }

    let expected: Vec<_> = (0..5)
        .map(|i| dir.path().join(format!("one-{:03}.jpg", i)))
        .collect();
    assert_eq!(paths, expected);
    assert_eq!(file_count(dir.path()), 5);
}

#[test]
fn test_invalid_index_writes_nothing() {
    let dir = tempdir().expect("tempdir");
    let mut saver = FrameSaver::create(dir.path(), labels(&["one"])).unwrap();

    let err = saver.save(&test_frame(), 5).unwrap_err();

    assert!(matches!(err, SaveError::InvalidLabel(5)));
    assert_eq!(saver.counts(), &[0]);
    assert_eq!(file_count(dir.path()), 0);
}

#[test]
fn test_directory_creation_is_idempotent_and_counters_are_per_run() {
    let dir = tempdir().expect("tempdir");

    // First run saves one file
    let mut first_run = FrameSaver::create(dir.path(), labels(&["one"])).unwrap();
    first_run.save(&test_frame(), 0).unwrap();
    drop(first_run);
    assert_eq!(file_count(dir.path()), 1);

    // A second run against the same directory starts counting from zero
    // again: it overwrites one-000.jpg rather than continuing from disk.
    let mut second_run = FrameSaver::create(dir.path(), labels(&["one"])).unwrap();
    assert_eq!(second_run.counts(), &[0]);
    let path = second_run.save(&test_frame(), 0).unwrap();
    assert_eq!(path, dir.path().join("one-000.jpg"));
    assert_eq!(file_count(dir.path()), 1);
}

#[test]
fn test_nested_output_dir_is_created() {
    let dir = tempdir().expect("tempdir");
    let nested = dir.path().join("a").join("b").join("c");

    let mut saver = FrameSaver::create(&nested, labels(&["one"])).unwrap();
    saver.save(&test_frame(), 0).unwrap();

    assert!(nested.join("one-000.jpg").is_file());
}

#[test]
fn test_failed_write_does_not_increment_counter() {
    let dir = tempdir().expect("tempdir");
    let output = dir.path().join("out");
    let mut saver = FrameSaver::create(&output, labels(&["one"])).unwrap();

    // Yank the directory out from under the saver so the write fails
    fs::remove_dir(&output).expect("remove output dir");
    let err = saver.save(&test_frame(), 0).unwrap_err();
    assert!(matches!(err, SaveError::WriteFailed { .. }));
    assert_eq!(saver.counts(), &[0]);

    // After the directory comes back, the same filename is used: the failed
    // attempt consumed no counter value.
    fs::create_dir_all(&output).expect("recreate output dir");
    let path = saver.save(&test_frame(), 0).unwrap();
    assert_eq!(path, output.join("one-000.jpg"));
    assert_eq!(saver.counts(), &[1]);
}

#[test]
fn test_saved_file_is_a_jpeg() {
    let dir = tempdir().expect("tempdir");
    let mut saver = FrameSaver::create(dir.path(), labels(&["one"])).unwrap();

    let path = saver.save(&test_frame(), 0).unwrap();

    // JPEG files start with the SOI marker FF D8
    let bytes = fs::read(path).expect("readable file");
    assert!(bytes.len() > 2);
    assert_eq!(&bytes[0..2], &[0xFF, 0xD8]);
}
