//! Editing FIT files on disk.
//!
//! _Requires Cargo feature `std`._

extern crate std;

use std::{
    ffi::OsStr,
    fs::{self, File},
    io::{self, BufReader},
    path::{Path, PathBuf},
    time::SystemTime,
    vec::Vec,
};

use thiserror::Error;

use crate::{
    avec::{Builder, Codec, FitCodec, builder, reader},
    profile::{FileId, Profile, mesg_num},
    rewrite::{Clock, rewrite_bytes},
    sans::{data::Record, length::Lenient},
};

/// Errors occurring while editing files.
#[derive(Debug, Error)]
pub enum Error {
    /// An error reading or writing a file.
    #[error(transparent)]
    Io(#[from] io::Error),
    /// A file could not be decoded.
    #[error(transparent)]
    Decode(#[from] reader::Error),
    /// The rewritten records could not be encoded.
    #[error(transparent)]
    Build(#[from] builder::Error),
}

/// Options for [`edit_file`].
#[derive(Debug, Default, Clone)]
pub struct EditOptions {
    /// Where to write the edited file. Defaults to [`default_output`].
    pub output: Option<PathBuf>,
    /// Rewrite the file without writing the result.
    pub dry_run: bool,
}

/// The system clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        SystemTime::now()
            .duration_since(SystemTime::UNIX_EPOCH)
            .map_or(0, |d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
    }
}

/// The outcome of [`edit_directory`].
#[derive(Debug, Default)]
pub struct BatchReport {
    /// Files written, or that would have been written on a dry run.
    pub edited: Vec<PathBuf>,
    /// Files that could not be decoded.
    pub skipped: Vec<PathBuf>,
    /// Files that failed after decoding.
    pub failed: Vec<(PathBuf, Error)>,
}

const MODIFIED_SUFFIX: &str = "_modified.fit";

/// The path an edited file is written to when none is given:
/// `<stem>_modified.fit` beside the input.
pub fn default_output(path: &Path) -> PathBuf {
    let stem = path.file_stem().unwrap_or_default().to_string_lossy();
    path.with_file_name(std::format!("{stem}{MODIFIED_SUFFIX}"))
}

/// Rewrite a single file.
///
/// Returns the path written, or `None` if the file could not be decoded.
pub fn edit_file(path: &Path, options: &EditOptions) -> Result<Option<PathBuf>, Error> {
    edit_file_with(path, options, &FitCodec::new(), &SystemClock)
}

/// Rewrite a single file through a specific codec and source of the current
/// time.
pub fn edit_file_with<C>(
    path: &Path,
    options: &EditOptions,
    codec: &C,
    clock: &impl Clock,
) -> Result<Option<PathBuf>, Error>
where
    C: Codec,
    Error: From<<C::Builder as Builder>::Error>,
{
    let output = options
        .output
        .clone()
        .unwrap_or_else(|| default_output(path));

    if options.dry_run {
        log::warn!("In dry-run mode, will not actually write new file");
    }

    log::info!("Processing \"{}\"", path.display());

    let data = fs::read(path)?;

    let Some(document) = rewrite_bytes(codec, &data, clock)? else {
        log::info!("Skipped \"{}\"", path.display());
        return Ok(None);
    };

    if options.dry_run {
        log::info!("Dry run, not writing \"{}\"", output.display());
    } else {
        fs::write(&output, document)?;
        log::info!("Saved FIT file to \"{}\"", output.display());
    }

    Ok(Some(output))
}

/// Rewrite every FIT file in a directory.
///
/// Files already named `*_modified.fit` are left alone. Failures are
/// collected in the report and do not stop the batch.
pub fn edit_directory(dir: &Path, dry_run: bool) -> Result<BatchReport, Error> {
    let mut paths = fs::read_dir(dir)?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<Result<Vec<_>, _>>()?;

    paths.retain(|path| is_unmodified_fit(path));
    paths.sort();

    let options = EditOptions {
        output: None,
        dry_run,
    };

    let mut report = BatchReport::default();

    for path in paths {
        match edit_file(&path, &options) {
            Ok(Some(output)) => report.edited.push(output),
            Ok(None) => report.skipped.push(path),
            Err(err) => {
                log::error!("Failed to edit \"{}\": {err}", path.display());
                report.failed.push((path, err));
            }
        }
    }

    Ok(report)
}

/// The creation time of a file, in milliseconds since the Unix epoch.
///
/// Read from the first `file_id` message. `None` if there is none, or it has
/// no creation time.
pub fn date_from_file(path: &Path) -> Result<Option<u64>, Error> {
    let records = read_records(path)?;

    Ok(records
        .iter()
        .filter_map(Record::as_message)
        .find(|message| message.global == mesg_num::FILE_ID)
        .and_then(|message| FileId::from_message(message).time_created_ms()))
}

fn read_records(path: &Path) -> Result<Vec<Record>, Error> {
    let mut r = BufReader::new(File::open(path)?);

    match reader::decode(&mut r, &Lenient) {
        Ok(records) => Ok(records),
        Err(reader::Error::Io(err)) if err.kind() != io::ErrorKind::UnexpectedEof => {
            Err(Error::Io(err))
        }
        Err(err) => Err(Error::Decode(err)),
    }
}

fn is_unmodified_fit(path: &Path) -> bool {
    let Some(name) = path.file_name().and_then(OsStr::to_str) else {
        return false;
    };

    let name = name.to_ascii_lowercase();
    path.is_file() && name.ends_with(".fit") && !name.ends_with(MODIFIED_SUFFIX)
}
