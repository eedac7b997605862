//! Staged output files
//!
//! Every output is first written to `<target>.tmp`. Only when all of them
//! have been written are they renamed over their targets. Dropping a
//! [`StagedFiles`] without committing removes whatever temp files remain,
//! so a failed run leaves none of its outputs behind.

use crate::{Error, Result, Table};
use std::ffi::OsString;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;

/// `<path>.tmp` next to the target
pub fn temp_path_for(path: &Path) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(".tmp");
    PathBuf::from(name)
}

/// A set of outputs written beside their targets, moved into place together
#[derive(Debug, Default)]
pub struct StagedFiles {
    /// (temp file, final target) in staging order
    staged: Vec<(PathBuf, PathBuf)>,
}

impl StagedFiles {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stage a file whose content is produced by `fill`
    ///
    /// On failure the temp file is removed before the error is returned.
    pub fn stage_with<F>(&mut self, path: &Path, fill: F) -> Result<()>
    where
        F: FnOnce(&mut File) -> Result<()>,
    {
        let temp_path = temp_path_for(path);
        let written: Result<()> = File::create(&temp_path)
            .map_err(Error::from)
            .and_then(|mut file| {
                fill(&mut file)?;
                file.flush()?;
                Ok(())
            });
        if let Err(e) = written {
            let _ = fs::remove_file(&temp_path);
            return Err(e);
        }
        self.staged.push((temp_path, path.to_path_buf()));
        Ok(())
    }

    /// Stage a table as delimited text
    pub fn stage_table(&mut self, table: &Table, path: &Path, delimiter: u8) -> Result<()> {
        self.stage_with(path, |file| table.to_writer(file, delimiter))
    }

    /// Stage raw bytes (JSON reports)
    pub fn stage_bytes(&mut self, path: &Path, bytes: &[u8]) -> Result<()> {
        self.stage_with(path, |file| Ok(file.write_all(bytes)?))
    }

    /// Rename every staged file over its target
    ///
    /// A failed rename stops the commit; temp files not yet renamed are
    /// removed when `self` drops.
    pub fn commit(mut self) -> Result<()> {
        let staged = std::mem::take(&mut self.staged);
        let mut pending = staged.into_iter();
        while let Some((temp_path, target)) = pending.next() {
            if let Err(e) = fs::rename(&temp_path, &target) {
                self.staged.push((temp_path, target));
                self.staged.extend(pending);
                return Err(e.into());
            }
            debug!(path = %target.display(), "Committed staged output");
        }
        Ok(())
    }
}

impl Drop for StagedFiles {
    fn drop(&mut self) {
        for (temp_path, _) in self.staged.drain(..) {
            let _ = fs::remove_file(&temp_path);
        }
    }
}
