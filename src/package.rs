//! Runs the external converter (`kindlegen`) over the rendered files and
//! cleans up the intermediate files afterwards.
//!
//! The converter is treated as an opaque collaborator: it gets the manifest
//! path and the desired output filename as arguments, and its exit status is
//! the only feedback. Statuses up to 1 mean success (1 is kindlegen's "built
//! with warnings").

use std::io;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus};
use std::thread;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// The converter looked up on `PATH` when none is configured.
pub const DEFAULT_CONVERTER: &str = "kindlegen";

/// How long the converter may run before it is killed.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);

/// The highest exit status still counted as success.
const MAX_SUCCESS_STATUS: i32 = 1;

const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Extensions of the intermediate files removed by [`cleanup`].
const INTERMEDIATE_EXTENSIONS: [&str; 3] = ["html", "opf", "ncx"];

/// Invokes the external converter.
#[derive(Clone, Debug)]
pub struct Packager {
    /// Path (or bare name, resolved through `PATH`) of the converter binary.
    pub converter: PathBuf,

    /// Upper bound on the converter's run time. `None` waits indefinitely.
    pub timeout: Option<Duration>,
}

impl Default for Packager {
    fn default() -> Self {
        Packager {
            converter: PathBuf::from(DEFAULT_CONVERTER),
            timeout: Some(DEFAULT_TIMEOUT),
        }
    }
}

impl Packager {
    /// Runs the converter as `<converter> -c2 <working_dir>/<manifest_file>
    /// -o <output_filename>.mobi` and returns the artifact's path. No shell is
    /// involved, so titles and filenames are never interpreted.
    pub fn build_final_artifact(
        &self,
        working_dir: &Path,
        manifest_file: &str,
        output_filename: &str,
    ) -> Result<PathBuf> {
        let artifact = format!("{}.mobi", output_filename);
        let mut command = Command::new(&self.converter);
        command
            .arg("-c2")
            .arg(working_dir.join(manifest_file))
            .arg("-o")
            .arg(&artifact);
        debug!(command = ?command, "running converter");

        let mut child = command.spawn().map_err(|err| Error::Spawn {
            converter: self.converter.clone(),
            err,
        })?;
        let status = match self.timeout {
            Some(timeout) => wait_with_timeout(&mut child, timeout)?,
            None => child.wait().map_err(Error::Wait)?,
        };

        match status.code() {
            Some(code) if code <= MAX_SUCCESS_STATUS => Ok(PathBuf::from(artifact)),
            Some(code) => Err(Error::Status(code)),
            None => Err(Error::Terminated),
        }
    }

    /// Like [`Packager::build_final_artifact`] but recovers from failure: the
    /// error is logged and `None` returned, leaving the intermediate files in
    /// place for inspection.
    pub fn package(
        &self,
        working_dir: &Path,
        manifest_file: &str,
        output_filename: &str,
    ) -> Option<PathBuf> {
        match self.build_final_artifact(working_dir, manifest_file, output_filename) {
            Ok(artifact) => {
                info!(artifact = %artifact.display(), "packaged periodical");
                Some(artifact)
            }
            Err(err) => {
                warn!(error = %err, "packaging failed; intermediate files kept");
                None
            }
        }
    }
}

fn wait_with_timeout(child: &mut Child, timeout: Duration) -> Result<ExitStatus> {
    let deadline = Instant::now() + timeout;
    loop {
        if let Some(status) = child.try_wait().map_err(Error::Wait)? {
            return Ok(status);
        }
        if Instant::now() >= deadline {
            // the child may have exited in the meantime; either way reap it
            let _ = child.kill();
            let _ = child.wait();
            return Err(Error::Timeout(timeout));
        }
        thread::sleep(POLL_INTERVAL);
    }
}

/// Deletes the intermediate HTML, manifest, and navigation files directly in
/// `working_dir`. Returns `false` if anything couldn't be removed; failures
/// are logged and never propagated, and removal continues past them.
pub fn cleanup(working_dir: &Path) -> bool {
    let mut clean = true;
    for entry in WalkDir::new(working_dir).min_depth(1).max_depth(1) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                warn!(error = %err, "listing intermediate files");
                clean = false;
                continue;
            }
        };
        if !entry.file_type().is_file() || !is_intermediate(entry.path()) {
            continue;
        }
        if let Err(err) = std::fs::remove_file(entry.path()) {
            warn!(path = %entry.path().display(), error = %err, "removing intermediate file");
            clean = false;
        }
    }
    clean
}

fn is_intermediate(path: &Path) -> bool {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) => INTERMEDIATE_EXTENSIONS.contains(&ext),
        None => false,
    }
}

/// The result of a packaging operation.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents a failure to produce the final artifact. Callers are expected
/// to recover from these; see [`Packager::package`].
#[derive(Debug, Error)]
pub enum Error {
    /// The converter couldn't be started, typically because it isn't
    /// installed.
    #[error("Running converter '{}': {err}", .converter.display())]
    Spawn {
        converter: PathBuf,
        #[source]
        err: io::Error,
    },

    /// Waiting for the converter failed.
    #[error("Waiting for converter: {0}")]
    Wait(#[source] io::Error),

    /// The converter exited with a failure status.
    #[error("Converter exited with status {0}")]
    Status(i32),

    /// The converter was terminated by a signal.
    #[error("Converter was terminated by a signal")]
    Terminated,

    /// The converter ran longer than the configured timeout and was killed.
    #[error("Converter timed out after {0:?}")]
    Timeout(Duration),
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::os::unix::fs::PermissionsExt;
    use std::sync::Mutex;

    // Writing an executable while another test thread forks can leave the
    // file busy (ETXTBSY), so script creation and spawning are serialized.
    static SPAWN_LOCK: Mutex<()> = Mutex::new(());

    fn script(dir: &Path, body: &str) -> PathBuf {
        let path = dir.join("fake-kindlegen");
        std::fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    fn packager(converter: PathBuf) -> Packager {
        Packager {
            converter,
            timeout: Some(Duration::from_secs(10)),
        }
    }

    #[test]
    fn low_exit_statuses_succeed() {
        let _guard = SPAWN_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let dir = tempfile::tempdir().unwrap();
        for status in &[0, 1] {
            let converter = script(dir.path(), &format!("exit {}", status));
            let artifact = packager(converter)
                .build_final_artifact(dir.path(), "content.opf", "daily")
                .unwrap();
            assert_eq!(artifact, PathBuf::from("daily.mobi"));
        }
    }

    #[test]
    fn passes_manifest_and_output_as_arguments() {
        let _guard = SPAWN_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let dir = tempfile::tempdir().unwrap();
        let args_file = dir.path().join("args");
        let converter = script(
            dir.path(),
            &format!("printf '%s\\n' \"$@\" > '{}'", args_file.display()),
        );
        packager(converter)
            .build_final_artifact(dir.path(), "content.opf", "my news; rm -rf")
            .unwrap();

        let args = std::fs::read_to_string(&args_file).unwrap();
        let expected = format!(
            "-c2\n{}\n-o\nmy news; rm -rf.mobi\n",
            dir.path().join("content.opf").display()
        );
        assert_eq!(args, expected);
    }

    #[test]
    fn high_exit_status_yields_no_artifact() {
        let _guard = SPAWN_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let dir = tempfile::tempdir().unwrap();
        let packager = packager(script(dir.path(), "exit 2"));

        let result = packager.build_final_artifact(dir.path(), "content.opf", "daily");
        assert!(matches!(result, Err(Error::Status(2))));
        assert_eq!(packager.package(dir.path(), "content.opf", "daily"), None);
    }

    #[test]
    fn missing_converter_yields_no_artifact() {
        let _guard = SPAWN_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let dir = tempfile::tempdir().unwrap();
        let packager = packager(dir.path().join("does-not-exist"));

        let result = packager.build_final_artifact(dir.path(), "content.opf", "daily");
        assert!(matches!(result, Err(Error::Spawn { .. })));
        assert_eq!(packager.package(dir.path(), "content.opf", "daily"), None);
    }

    #[test]
    fn slow_converter_is_killed() {
        let _guard = SPAWN_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let dir = tempfile::tempdir().unwrap();
        let packager = Packager {
            converter: script(dir.path(), "exec sleep 30"),
            timeout: Some(Duration::from_millis(200)),
        };

        let started = Instant::now();
        let result = packager.build_final_artifact(dir.path(), "content.opf", "daily");
        assert!(matches!(result, Err(Error::Timeout(_))));
        assert!(started.elapsed() < Duration::from_secs(10));
    }

    #[test]
    fn cleanup_removes_only_intermediate_files() {
        let dir = tempfile::tempdir().unwrap();
        for name in &["a.html", "contents.html", "content.opf", "nav-contents.ncx", "keep.txt"] {
            std::fs::write(dir.path().join(name), "x").unwrap();
        }
        std::fs::create_dir(dir.path().join("nested.html")).unwrap();

        assert!(cleanup(dir.path()));

        let mut remaining: Vec<String> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        remaining.sort();
        assert_eq!(remaining, vec!["keep.txt", "nested.html"]);
    }

    #[test]
    fn cleanup_of_missing_directory_reports_failure() {
        let dir = tempfile::tempdir().unwrap();
        assert!(!cleanup(&dir.path().join("absent")));
    }
}
