//! Tests for the key-to-action mapping and its interplay with saving.
//!
//! The capture loop itself needs a terminal and a device, but its decision
//! logic is pure: classify a key, then maybe save. These tests drive that
//! pair the way the loop does.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use framegrab::input::{classify_key, KeyAction};
use framegrab::labels::LabelSet;
use framegrab::saver::FrameSaver;
use framegrab::source::Frame;
use tempfile::tempdir;

fn labels(count: usize) -> LabelSet {
    LabelSet::new((0..count).map(|i| format!("label{}", i)).collect()).expect("valid label set")
}

fn digit(d: u8) -> KeyEvent {
    KeyEvent::new(KeyCode::Char((b'0' + d) as char), KeyModifiers::NONE)
}

fn frame() -> Frame {
    Frame {
        data: vec![90; 4 * 4 * 3],
        width: 4,
        height: 4,
    }
}

#[test]
fn test_digit_mapping_for_every_label_set_size() {
    // For all label sets of size <= 10: digit i saves under label i iff
    // i < len, otherwise nothing happens.
    for len in 1..=10usize {
        let set = labels(len);
        for d in 0..10u8 {
            let action = classify_key(&digit(d), set.len());
            if (d as usize) < len {
                assert_eq!(action, KeyAction::Save(d as usize), "len={} d={}", len, d);
            } else {
                assert_eq!(action, KeyAction::Ignore, "len={} d={}", len, d);
            }
        }
    }
}

#[test]
fn test_quit_key_regardless_of_label_count() {
    for len in 1..=10usize {
        let event = KeyEvent::new(KeyCode::Char('q'), KeyModifiers::NONE);
        assert_eq!(classify_key(&event, len), KeyAction::Quit);
    }
}

#[test]
fn test_key_sequence_drives_expected_saves() {
    // Simulate the reference session: labels one/two/three, press '1', '1',
    // then 'q'. Exactly two files result, both under the second label.
    let dir = tempdir().expect("tempdir");
    let set = LabelSet::new(vec![
        "one".to_string(),
        "two".to_string(),
        "three".to_string(),
    ])
    .unwrap();
    let mut saver = FrameSaver::create(dir.path(), set.clone()).unwrap();

    let keys = [
        digit(1),
        digit(1),
        KeyEvent::new(KeyCode::Char('q'), KeyModifiers::NONE),
    ];

    let mut quit = false;
    for key in &keys {
        match classify_key(key, set.len()) {
            KeyAction::Quit => {
                quit = true;
                break;
            }
            KeyAction::Save(index) => {
                saver.save(&frame(), index).unwrap();
            }
            KeyAction::Ignore => {}
        }
    }

    assert!(quit);
    assert_eq!(saver.counts(), &[0, 2, 0]);
    assert!(dir.path().join("two-000.jpg").is_file());
    assert!(dir.path().join("two-001.jpg").is_file());
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 2);
}

#[test]
fn test_unmapped_keys_change_nothing() {
    let dir = tempdir().expect("tempdir");
    let set = labels(1);
    let mut saver = FrameSaver::create(dir.path(), set.clone()).unwrap();

    for code in [
        KeyCode::Char('5'),
        KeyCode::Char('a'),
        KeyCode::Enter,
        KeyCode::Esc,
    ] {
        let event = KeyEvent::new(code, KeyModifiers::NONE);
        match classify_key(&event, set.len()) {
            KeyAction::Ignore => {}
            other => panic!("expected Ignore for {:?}, got {:?}", code, other),
        }
    }

    assert_eq!(saver.counts(), &[0]);
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    // Saver untouched; next real save still starts at 000
    let path = saver.save(&frame(), 0).unwrap();
    assert!(path.ends_with("label0-000.jpg"));
}
