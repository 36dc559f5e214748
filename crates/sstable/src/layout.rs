//! Directory layout, file naming and run numbering.
//!
//! Runs live under `Data/SSTable/Level{1..N}`, one numbered directory per
//! run. The numeric suffix of a run directory is its age within the level:
//! the next run created in a level takes the highest existing number plus
//! one, so higher numbers are newer.

use std::fs;
use std::io::{self, BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

/// Prefix of a run directory name within a level.
pub const RUN_PREFIX: &str = "SSTable";

/// Prefix used while a run is being built; renamed away on completion.
/// Anything still carrying it at startup is debris from a crash.
pub const TMP_RUN_PREFIX: &str = ".tmp-SSTable";

/// The five data-bearing files of a run, plus its manifest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Data,
    Index,
    Summary,
    Filter,
    Metadata,
    Toc,
}

impl FileKind {
    fn label(self) -> &'static str {
        match self {
            FileKind::Data => "Data",
            FileKind::Index => "Index",
            FileKind::Summary => "Summary",
            FileKind::Filter => "Filter",
            FileKind::Metadata => "Metadata",
            FileKind::Toc => "TOC",
        }
    }

    fn extension(self) -> &'static str {
        match self {
            // The Metadata dump is text (one hex hash per line).
            FileKind::Metadata => "txt",
            _ => "db",
        }
    }
}

/// Root of the SSTable tree: `{root}/Data/SSTable`.
#[must_use]
pub fn sstable_root(root: &Path) -> PathBuf {
    root.join("Data").join("SSTable")
}

/// Directory of one level: `{root}/Data/SSTable/Level{level}`.
#[must_use]
pub fn level_dir(root: &Path, level: u32) -> PathBuf {
    sstable_root(root).join(format!("Level{level}"))
}

/// File name of one run component, e.g. `usertable-2-Index.db`.
#[must_use]
pub fn file_name(level: u32, kind: FileKind) -> String {
    format!("usertable-{level}-{}.{}", kind.label(), kind.extension())
}

/// Full path of one run component inside `run_dir`.
#[must_use]
pub fn run_file(run_dir: &Path, level: u32, kind: FileKind) -> PathBuf {
    run_dir.join(file_name(level, kind))
}

/// Parses the numeric suffix of a `SSTable{n}` run directory name.
#[must_use]
pub fn parse_run_number(name: &str) -> Option<u64> {
    name.strip_prefix(RUN_PREFIX)?.parse().ok()
}

/// Lists the runs of a level as `(number, path)`, ascending by number.
///
/// Temp directories and anything not matching `SSTable{n}` are skipped.
/// A missing level directory reads as empty.
pub fn list_runs(level_dir: &Path) -> io::Result<Vec<(u64, PathBuf)>> {
    let mut runs = Vec::new();
    let entries = match fs::read_dir(level_dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(runs),
        Err(e) => return Err(e),
    };
    for entry in entries {
        let entry = entry?;
        let path = entry.path();
        if !path.is_dir() {
            continue;
        }
        if let Some(n) = path
            .file_name()
            .and_then(|n| n.to_str())
            .and_then(parse_run_number)
        {
            runs.push((n, path));
        }
    }
    runs.sort_by_key(|(n, _)| *n);
    Ok(runs)
}

/// Next run number for a level: highest existing + 1, or 1 when empty.
pub fn next_run_number(level_dir: &Path) -> io::Result<u64> {
    let runs = list_runs(level_dir)?;
    Ok(runs.last().map_or(1, |(n, _)| n + 1))
}

/// Writes the TOC manifest listing the run's five component files.
pub fn write_toc(run_dir: &Path, level: u32) -> io::Result<()> {
    let mut file = fs::File::create(run_file(run_dir, level, FileKind::Toc))?;
    for kind in [
        FileKind::Data,
        FileKind::Index,
        FileKind::Summary,
        FileKind::Filter,
        FileKind::Metadata,
    ] {
        writeln!(file, "{}", file_name(level, kind))?;
    }
    file.sync_all()
}

/// Reads back the file names listed in a run's TOC.
pub fn read_toc(run_dir: &Path, level: u32) -> io::Result<Vec<String>> {
    let file = fs::File::open(run_file(run_dir, level, FileKind::Toc))?;
    BufReader::new(file).lines().collect()
}

/// Creates the level directories `Level1..=max_level` if absent.
pub fn ensure_levels(root: &Path, max_level: u32) -> io::Result<()> {
    for level in 1..=max_level {
        fs::create_dir_all(level_dir(root, level))?;
    }
    Ok(())
}

/// Removes leftover temp run directories from interrupted builds.
pub fn sweep_temp_runs(root: &Path, max_level: u32) -> io::Result<()> {
    for level in 1..=max_level {
        let dir = level_dir(root, level);
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => continue,
            Err(e) => return Err(e),
        };
        for entry in entries {
            let path = entry?.path();
            let is_tmp = path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with(TMP_RUN_PREFIX));
            if is_tmp {
                fs::remove_dir_all(&path)?;
            }
        }
    }
    Ok(())
}
