//! Durable artifact writes beneath the export directory.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::errors::ExportError;
use crate::metrics::ARTIFACTS_WRITTEN;

/// Write `content` to `dir/file_name`, creating `dir` (and parents) first.
///
/// The bytes go to a hidden sibling temp file which is synced and then
/// renamed over the target, so readers see either the old file or the
/// complete new one. An existing file of the same name is replaced.
pub fn write_artifact(dir: &Path, file_name: &str, content: &str) -> Result<PathBuf, ExportError> {
    fs::create_dir_all(dir).map_err(|e| ExportError::io(dir, e))?;

    let target = dir.join(file_name);
    let tmp = dir.join(format!(".{file_name}.{}.tmp", std::process::id()));

    if let Err(e) = write_synced(&tmp, content.as_bytes()) {
        let _ = fs::remove_file(&tmp);
        return Err(ExportError::io(&tmp, e));
    }
    if let Err(e) = fs::rename(&tmp, &target) {
        let _ = fs::remove_file(&tmp);
        return Err(ExportError::io(&target, e));
    }

    ARTIFACTS_WRITTEN.inc();
    info!(path = %target.display(), bytes = content.len(), "Wrote artifact");
    Ok(target)
}

fn write_synced(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut f = File::create(path)?;
    f.write_all(bytes)?;
    f.sync_all()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn creates_nested_directories() {
        let root = tempfile::tempdir().unwrap();
        let dir = root.path().join("a").join("b");

        let path = write_artifact(&dir, "out.json", "{}").unwrap();
        assert_eq!(path, dir.join("out.json"));
        assert_eq!(fs::read_to_string(path).unwrap(), "{}");
    }

    #[test]
    fn overwrites_and_leaves_no_temp_files() {
        let root = tempfile::tempdir().unwrap();
        write_artifact(root.path(), "stats.json", "first version, longer").unwrap();
        write_artifact(root.path(), "stats.json", "second").unwrap();

        assert_eq!(
            fs::read_to_string(root.path().join("stats.json")).unwrap(),
            "second"
        );
        let names: Vec<_> = fs::read_dir(root.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().into_string().unwrap())
            .collect();
        assert_eq!(names, ["stats.json"]);
    }

    #[test]
    fn unwritable_location_is_an_io_error() {
        let root = tempfile::tempdir().unwrap();
        let blocker = root.path().join("file");
        fs::write(&blocker, "not a dir").unwrap();

        let err = write_artifact(&blocker.join("sub"), "x.csv", "a").unwrap_err();
        assert!(matches!(err, ExportError::Io { .. }));
    }
}
