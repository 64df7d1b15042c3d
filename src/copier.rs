use std::fs;
use std::io;
use std::path::Path;

/// Copies one file into the library.
pub trait FileCopier {
    fn copy_file(&self, from: &Path, to: &Path, debug: bool, dry_run: bool) -> io::Result<()>;
}

/// Copies on the local filesystem, creating destination directories as needed.
#[derive(Debug, Default, Clone, Copy)]
pub struct FsCopier;

impl FileCopier for FsCopier {
    fn copy_file(&self, from: &Path, to: &Path, debug: bool, dry_run: bool) -> io::Result<()> {
        if dry_run {
            log::info!("Would copy {} to {}", from.display(), to.display());
            return Ok(());
        }
        if let Some(parent) = to.parent() {
            fs::create_dir_all(parent)?;
        }
        let bytes = fs::copy(from, to)?;
        if debug {
            log::debug!("Copied {} bytes to {}", bytes, to.display());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn copies_into_new_directories() {
        let tmp = tempfile::tempdir().unwrap();
        let from = tmp.path().join("a.xisf");
        fs::write(&from, b"pixels").unwrap();
        let to = tmp.path().join("lib/MASTER BIAS/CAM1/masterBias.xisf");

        FsCopier.copy_file(&from, &to, false, false).unwrap();

        assert_eq!(fs::read(&to).unwrap(), b"pixels");
    }

    #[test]
    fn dry_run_writes_nothing() {
        let tmp = tempfile::tempdir().unwrap();
        let from = tmp.path().join("a.xisf");
        fs::write(&from, b"pixels").unwrap();
        let to = tmp.path().join("lib/masterBias.xisf");

        FsCopier.copy_file(&from, &to, true, true).unwrap();

        assert!(!to.exists());
        assert!(!tmp.path().join("lib").exists());
    }

    #[test]
    fn missing_source_is_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        let result = FsCopier.copy_file(
            &tmp.path().join("gone.xisf"),
            &tmp.path().join("out.xisf"),
            false,
            false,
        );
        assert!(result.is_err());
    }
}
