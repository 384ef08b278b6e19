#![cfg(feature = "std")]

mod support;

use std::{fs, path::Path};

use domestique::{
    avec::{FitCodec, decode_slice},
    edit::{EditOptions, date_from_file, default_output, edit_directory, edit_file, edit_file_with},
    profile::{FileId, Profile, manufacturer, mesg_num},
    rewrite::rewrite_bytes,
    sans::{data::Record, length::Strict},
};

use support::{Document, TIME_CREATED_MS, UINT8, UINT16};

fn write_ride(dir: &Path, name: &str) -> std::path::PathBuf {
    let path = dir.join(name);
    fs::write(&path, support::ride(manufacturer::ZWIFT).build()).unwrap();
    path
}

#[test]
fn output_name() {
    assert_eq!(
        default_output(Path::new("rides/2024-06-01.fit")),
        Path::new("rides/2024-06-01_modified.fit")
    );
    assert_eq!(
        default_output(Path::new("Ride.FIT")),
        Path::new("Ride_modified.fit")
    );
}

#[test]
fn edit_writes_output() {
    support::init_logger();

    let dir = tempfile::tempdir().unwrap();
    let path = write_ride(dir.path(), "ride.fit");

    let output = edit_file(&path, &EditOptions::default()).unwrap().unwrap();
    assert_eq!(output, dir.path().join("ride_modified.fit"));

    let records = decode_slice(&fs::read(&output).unwrap(), &Strict).unwrap();
    let file_id = records
        .iter()
        .filter_map(Record::as_message)
        .find(|m| m.global == mesg_num::FILE_ID)
        .map(FileId::from_message)
        .unwrap();

    assert_eq!(file_id.manufacturer, Some(manufacturer::GARMIN));
}

#[test]
fn edit_to_explicit_output() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_ride(dir.path(), "ride.fit");
    let target = dir.path().join("upload.fit");

    let options = EditOptions {
        output: Some(target.clone()),
        dry_run: false,
    };

    let output = edit_file_with(&path, &options, &FitCodec::new(), &support::clock)
        .unwrap()
        .unwrap();

    assert_eq!(output, target);
    assert!(target.exists());
    assert!(!dir.path().join("ride_modified.fit").exists());
}

#[test]
fn edit_writes_rewritten_bytes() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_ride(dir.path(), "ride.fit");

    let output = edit_file_with(&path, &EditOptions::default(), &FitCodec::new(), &support::clock)
        .unwrap()
        .unwrap();

    let expected = rewrite_bytes(&FitCodec::new(), &fs::read(&path).unwrap(), &support::clock)
        .unwrap()
        .unwrap();

    assert_eq!(fs::read(output).unwrap(), expected);
}

#[test]
fn edit_uses_given_codec() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("coros.fit");

    let document = Document::new()
        .define(0, 23, &[(0, 1, UINT8), (2, 3, UINT16)])
        .data(0, &[1, 0x26, 0x01, 0xAA]);
    fs::write(&path, document.build()).unwrap();

    let strict = FitCodec::with_length(Strict);
    let skipped = edit_file_with(&path, &EditOptions::default(), &strict, &support::clock);
    assert!(skipped.unwrap().is_none());

    let lenient = FitCodec::new();
    let edited = edit_file_with(&path, &EditOptions::default(), &lenient, &support::clock);
    assert!(edited.unwrap().unwrap().exists());
}

#[test]
fn dry_run_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_ride(dir.path(), "ride.fit");

    let options = EditOptions {
        output: None,
        dry_run: true,
    };

    let output = edit_file(&path, &options).unwrap().unwrap();
    assert!(!output.exists());
    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
}

#[test]
fn corrupt_file_is_skipped() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("notes.fit");
    fs::write(&path, b"not a fit file at all").unwrap();

    assert!(edit_file(&path, &EditOptions::default()).unwrap().is_none());
    assert!(!dir.path().join("notes_modified.fit").exists());
}

#[test]
fn missing_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("missing.fit");

    assert!(edit_file(&path, &EditOptions::default()).is_err());
}

#[test]
fn edit_whole_directory() {
    let dir = tempfile::tempdir().unwrap();

    write_ride(dir.path(), "b.fit");
    write_ride(dir.path(), "a.FIT");
    write_ride(dir.path(), "c_modified.fit");
    fs::write(dir.path().join("corrupt.fit"), b"garbage").unwrap();
    fs::write(dir.path().join("notes.txt"), b"not a ride").unwrap();

    let report = edit_directory(dir.path(), false).unwrap();

    assert_eq!(
        report.edited,
        [
            dir.path().join("a_modified.fit"),
            dir.path().join("b_modified.fit"),
        ]
    );
    assert_eq!(report.skipped, [dir.path().join("corrupt.fit")]);
    assert!(report.failed.is_empty());

    assert!(dir.path().join("a_modified.fit").exists());
    assert!(dir.path().join("b_modified.fit").exists());
    assert!(!dir.path().join("c_modified_modified.fit").exists());
}

#[test]
fn dry_run_directory() {
    let dir = tempfile::tempdir().unwrap();
    write_ride(dir.path(), "ride.fit");

    let report = edit_directory(dir.path(), true).unwrap();

    assert_eq!(report.edited.len(), 1);
    assert!(!dir.path().join("ride_modified.fit").exists());
}

#[test]
fn creation_date() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_ride(dir.path(), "ride.fit");

    assert_eq!(date_from_file(&path).unwrap(), Some(TIME_CREATED_MS));

    let path = dir.path().join("corrupt.fit");
    fs::write(&path, b"garbage").unwrap();
    assert!(date_from_file(&path).is_err());
}
