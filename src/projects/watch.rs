//! Rebuilds a project whenever its sources change.
//!
//! A recursive `notify` watcher feeds filesystem events into a channel. Events that
//! arrive close together are collapsed into one rebuild, and a rebuild only happens
//! when the fingerprints of the watched sources actually changed.

use crate::build_system::build::{self, output_dir};
use crate::compiler_frontend::Flag;
use crate::compiler_frontend::compiler_errors::{CompilerError, CompilerMessages};
use crate::compiler_frontend::display_messages::print_compiler_messages;
use crate::projects::settings::{Config, WATCH_DEBOUNCE_MS};
use notify::{Event, RecursiveMode, Watcher};
use saying::say;
use std::collections::HashMap;
use std::ffi::OsStr;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::time::{Duration, Instant, SystemTime};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileFingerprint {
    pub modified: SystemTime,
    pub len: u64,
}

pub type Fingerprints = HashMap<PathBuf, FileFingerprint>;

/// Fingerprints of every source file the config accepts below `watch_root`.
pub fn collect_fingerprints(watch_root: &Path, output_dir: &Path, config: &Config) -> io::Result<Fingerprints> {
    let mut fingerprints = HashMap::new();

    if watch_root.is_file() {
        let metadata = fs::metadata(watch_root)?;
        fingerprints.insert(watch_root.to_path_buf(), fingerprint_of(&metadata));
        return Ok(fingerprints);
    }

    let mut stack = vec![watch_root.to_path_buf()];
    while let Some(dir_path) = stack.pop() {
        for entry in fs::read_dir(&dir_path)? {
            let entry = entry?;
            let path = entry.path();

            if should_ignore_path(&path, output_dir) {
                continue;
            }

            let metadata = entry.metadata()?;
            if metadata.is_dir() {
                stack.push(path);
            } else if metadata.is_file() && config.accepts_file(&path) {
                fingerprints.insert(path, fingerprint_of(&metadata));
            }
        }
    }

    Ok(fingerprints)
}

fn fingerprint_of(metadata: &fs::Metadata) -> FileFingerprint {
    FileFingerprint {
        modified: metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH),
        len: metadata.len(),
    }
}

pub fn detect_changes(previous: &Fingerprints, current: &Fingerprints) -> bool {
    if previous.len() != current.len() {
        return true;
    }

    previous
        .iter()
        .any(|(path, fingerprint)| current.get(path) != Some(fingerprint))
}

pub fn should_trigger_debounced_build(dirty_since: Option<Instant>, debounce_window: Duration) -> bool {
    dirty_since.is_some_and(|first_dirty_at| first_dirty_at.elapsed() >= debounce_window)
}

/// Generated output and `.git` never trigger a rebuild.
pub fn should_ignore_path(path: &Path, output_dir: &Path) -> bool {
    if path.starts_with(output_dir) {
        return true;
    }

    path.components()
        .any(|component| component.as_os_str() == OsStr::new(".git"))
}

/// Whether any path of the event is worth a fingerprint check.
pub fn event_is_relevant(event: &Event, output_dir: &Path) -> bool {
    event
        .paths
        .iter()
        .any(|path| !should_ignore_path(path, output_dir))
}

/// Builds once, then rebuilds on every change until the watcher disconnects.
pub fn watch_project(entry_path: &Path, config: &Config, flags: &[Flag]) -> Result<(), CompilerMessages> {
    let out_dir = output_dir(entry_path, config);
    let watch_error = |msg: String| CompilerMessages::from_error(CompilerError::file_error(entry_path, msg));

    let (sender, receiver) = mpsc::channel::<notify::Result<Event>>();
    let mut watcher =
        notify::recommended_watcher(sender).map_err(|e| watch_error(format!("Could not start watching: {e}")))?;
    watcher
        .watch(entry_path, RecursiveMode::Recursive)
        .map_err(|e| watch_error(format!("Could not watch the path: {e}")))?;

    let mut fingerprints = collect_fingerprints(entry_path, &out_dir, config)
        .map_err(|e| watch_error(format!("Could not read the sources: {e}")))?;
    run_build(entry_path, config, flags);

    say!(Green "\nWatching ", Dark Magenta entry_path.display().to_string(), Reset " for changes");

    let debounce_window = Duration::from_millis(WATCH_DEBOUNCE_MS);
    let mut dirty_since: Option<Instant> = None;

    loop {
        match receiver.recv_timeout(debounce_window) {
            Ok(Ok(event)) => {
                if event_is_relevant(&event, &out_dir) && dirty_since.is_none() {
                    dirty_since = Some(Instant::now());
                }
            }
            Ok(Err(e)) => say!(Red "Watch error: ", e.to_string()),
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => return Ok(()),
        }

        if !should_trigger_debounced_build(dirty_since, debounce_window) {
            continue;
        }
        dirty_since = None;

        let current = match collect_fingerprints(entry_path, &out_dir, config) {
            Ok(current) => current,
            Err(e) => {
                say!(Red "Could not read the sources: ", e.to_string());
                continue;
            }
        };

        if detect_changes(&fingerprints, &current) {
            fingerprints = current;
            run_build(entry_path, config, flags);
        }
    }
}

fn run_build(entry_path: &Path, config: &Config, flags: &[Flag]) {
    let result = build::build_project(entry_path, config, flags);
    let mut messages = result.messages;
    messages.extend(build::write_outputs(&result.output_files));
    print_compiler_messages(messages);
}

#[cfg(test)]
#[path = "tests/watch_tests.rs"]
mod tests;
