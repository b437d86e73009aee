//! Per-attempt scratch directory.
//!
//! Holds the staged copies of the generated artifacts and the step journal.
//! It is created as the current user (mode 0700, under
//! `HelperConfig::staging_root`) and removed when dropped; the privileged
//! sequence only reads the staged files and appends to the journal.
//!
//! Staged files are written to `<name>.tmp` and renamed into place, so a
//! staged copy is either complete or absent.

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;
use throttle_core::{ArtifactKind, DaemonArtifact};

use crate::error::{staging_err, InstallError};
use crate::plan::Step;

const JOURNAL_FILE: &str = "journal";

#[derive(Debug)]
pub struct Scratch {
    dir: TempDir,
    journal: PathBuf,
}

impl Scratch {
    /// Create a fresh scratch directory under `root` with an empty journal.
    pub fn create(root: &Path) -> Result<Self, InstallError> {
        fs::create_dir_all(root).map_err(|e| staging_err(root, e))?;
        let dir = tempfile::Builder::new()
            .prefix("macthrottle-")
            .tempdir_in(root)
            .map_err(|e| staging_err(root, e))?;
        let journal = dir.path().join(JOURNAL_FILE);
        fs::write(&journal, "").map_err(|e| staging_err(&journal, e))?;
        Ok(Self { dir, journal })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn journal_path(&self) -> &Path {
        &self.journal
    }

    /// Write the canonical content of `artifact` into the scratch directory
    /// and return the staged path.
    pub fn stage(&self, artifact: &DaemonArtifact) -> Result<PathBuf, InstallError> {
        let name = match artifact.kind {
            ArtifactKind::Script => "script",
            ArtifactKind::ServiceDescriptor => "descriptor.plist",
        };
        let path = self.dir.path().join(name);
        let tmp = self.dir.path().join(format!("{name}.tmp"));

        fs::write(&tmp, &artifact.canonical_content).map_err(|e| staging_err(&tmp, e))?;
        set_readable(&tmp)?;
        if let Err(e) = fs::rename(&tmp, &path) {
            let _ = fs::remove_file(&tmp);
            return Err(staging_err(&path, e));
        }

        tracing::debug!(kind = %artifact.kind, path = %path.display(), "staged artifact");
        Ok(path)
    }

    /// Steps the privileged sequence reported as finished, in order.
    ///
    /// An unreadable journal reads as empty; unknown lines are skipped.
    pub fn completed_steps(&self) -> Vec<Step> {
        let contents = match fs::read_to_string(&self.journal) {
            Ok(contents) => contents,
            Err(err) => {
                tracing::warn!(error = %err, path = %self.journal.display(), "journal unreadable");
                return Vec::new();
            }
        };
        contents
            .lines()
            .filter_map(|line| line.parse::<Step>().ok())
            .collect()
    }
}

#[cfg(unix)]
fn set_readable(path: &Path) -> Result<(), InstallError> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o644)).map_err(|e| staging_err(path, e))
}

#[cfg(not(unix))]
fn set_readable(_path: &Path) -> Result<(), InstallError> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use throttle_core::HelperConfig;

    #[test]
    fn stages_both_artifacts_with_canonical_content() {
        let root = TempDir::new().expect("root");
        let scratch = Scratch::create(root.path()).expect("scratch");
        let artifacts = throttle_artifacts::generate(&HelperConfig::default());

        let script = scratch.stage(&artifacts.script).expect("stage script");
        let plist = scratch.stage(&artifacts.descriptor).expect("stage plist");

        assert_eq!(
            fs::read_to_string(&script).expect("read"),
            artifacts.script.canonical_content
        );
        assert_eq!(
            fs::read_to_string(&plist).expect("read"),
            artifacts.descriptor.canonical_content
        );
        assert!(!scratch.path().join("script.tmp").exists());
        assert!(scratch.journal_path().exists());
    }

    #[test]
    fn scratch_is_removed_on_drop() {
        let root = TempDir::new().expect("root");
        let path = {
            let scratch = Scratch::create(root.path()).expect("scratch");
            scratch.path().to_path_buf()
        };
        assert!(!path.exists());
    }

    #[test]
    fn journal_parses_known_steps_only() {
        let root = TempDir::new().expect("root");
        let scratch = Scratch::create(root.path()).expect("scratch");
        fs::write(
            scratch.journal_path(),
            "deregister\ndeploy-script\nnoise\n",
        )
        .expect("write journal");
        assert_eq!(
            scratch.completed_steps(),
            vec![Step::Deregister, Step::DeployScript]
        );
    }

    #[cfg(unix)]
    #[test]
    fn unwritable_root_is_staging_failure() {
        let root = TempDir::new().expect("root");
        let blocker = root.path().join("not-a-dir");
        fs::write(&blocker, "file").expect("write");
        let err = Scratch::create(&blocker.join("nested")).unwrap_err();
        assert!(matches!(err, InstallError::StagingFailed { .. }), "got: {err}");
    }
}
