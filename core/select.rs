use crate::error::{AppError, Result};
use log;
use std::cmp::Ordering;
use std::collections::HashSet;
use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

/// Extension allow-list plus file/directory name exclusions.
///
/// All comparisons are exact and case-sensitive. Directory exclusion is
/// optional and empty unless [`FileFilter::exclude_dirs`] is called.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileFilter {
    allowed_extensions: HashSet<String>,
    excluded_names: HashSet<String>,
    excluded_dirs: HashSet<String>,
}

impl FileFilter {
    pub fn new<I, S>(allowed_extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let allowed_extensions = allowed_extensions
            .into_iter()
            .map(|ext| ext.as_ref().trim_start_matches('.').to_string())
            .filter(|ext| !ext.is_empty())
            .collect();
        Self {
            allowed_extensions,
            ..Self::default()
        }
    }

    pub fn exclude_names<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.excluded_names.extend(names.into_iter().map(Into::into));
        self
    }

    pub fn exclude_dirs<I, S>(mut self, dirs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.excluded_dirs.extend(dirs.into_iter().map(Into::into));
        self
    }

    pub fn allowed_extensions(&self) -> &HashSet<String> {
        &self.allowed_extensions
    }

    pub fn is_excluded_name(&self, file_name: &str) -> bool {
        self.excluded_names.contains(file_name)
    }

    pub fn is_excluded_dir(&self, dir_name: &str) -> bool {
        self.excluded_dirs.contains(dir_name)
    }

    /// Name exclusion first, then extension membership.
    pub fn accepts_file_name(&self, file_name: &str) -> bool {
        self.accepts_os_file_name(OsStr::new(file_name))
    }

    /// Same as [`FileFilter::accepts_file_name`] for names that may not be
    /// UTF-8. Only the extension has to decode to match the allow-list.
    pub fn accepts_os_file_name(&self, file_name: &OsStr) -> bool {
        // A non UTF-8 name can never equal a configured (UTF-8) exclusion
        if file_name.to_str().is_some_and(|n| self.is_excluded_name(n)) {
            return false;
        }
        os_file_extension(file_name).is_some_and(|ext| self.allowed_extensions.contains(ext))
    }

    fn prunes_dir(&self, dir_name: &OsStr) -> bool {
        dir_name.to_str().is_some_and(|n| self.is_excluded_dir(n))
    }
}

/// Text after the last `.` of a file name.
///
/// Dot-files such as `.bashrc` and names ending in `.` have no extension.
pub fn file_extension(file_name: &str) -> Option<&str> {
    os_file_extension(OsStr::new(file_name))
}

fn os_file_extension(file_name: &OsStr) -> Option<&str> {
    Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .filter(|ext| !ext.is_empty())
}

pub fn validate_root(root: &Path) -> Result<()> {
    let metadata = fs::metadata(root).map_err(|e| AppError::InvalidRoot {
        path: root.to_path_buf(),
        reason: e.to_string(),
    })?;
    if !metadata.is_dir() {
        return Err(AppError::InvalidRoot {
            path: root.to_path_buf(),
            reason: "not a directory".to_string(),
        });
    }
    Ok(())
}

/// Lazily yields every file under `root` accepted by `filter`.
///
/// Within a directory, files come before subdirectories and both are ordered
/// by name, so the sequence is stable for an unchanged tree. Excluded
/// directories are skipped before descent.
pub fn select_files<'a>(root: &Path, filter: &'a FileFilter) -> Result<SelectedFiles<'a>> {
    validate_root(root)?;
    log::debug!("Selecting files under: {}", root.display());
    let walker = WalkDir::new(root)
        .follow_links(false)
        .sort_by(files_then_dirs)
        .into_iter();
    Ok(SelectedFiles { walker, filter })
}

fn files_then_dirs(a: &DirEntry, b: &DirEntry) -> Ordering {
    // false < true, so plain files (and links) sort ahead of directories
    a.file_type()
        .is_dir()
        .cmp(&b.file_type().is_dir())
        .then_with(|| a.file_name().cmp(b.file_name()))
}

pub struct SelectedFiles<'a> {
    walker: walkdir::IntoIter,
    filter: &'a FileFilter,
}

impl SelectedFiles<'_> {
    // Directory symlinks are never followed; anything else a link points at
    // (including nothing) is handed on so the reader reports it.
    fn is_candidate_file(entry: &DirEntry) -> bool {
        let file_type = entry.file_type();
        file_type.is_file() || (file_type.is_symlink() && !entry.path().is_dir())
    }
}

impl Iterator for SelectedFiles<'_> {
    type Item = Result<PathBuf>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let entry = match self.walker.next()? {
                Ok(entry) => entry,
                Err(e) => {
                    log::warn!("Error walking directory: {}", e);
                    return Some(Err(e.into()));
                }
            };

            if entry.file_type().is_dir() {
                // depth 0 is the root itself, which is never pruned
                if entry.depth() > 0 && self.filter.prunes_dir(entry.file_name()) {
                    log::trace!("Pruning excluded directory: {}", entry.path().display());
                    self.walker.skip_current_dir();
                }
                continue;
            }

            if !Self::is_candidate_file(&entry) {
                continue;
            }

            if self.filter.accepts_os_file_name(entry.file_name()) {
                log::trace!("Selected: {}", entry.path().display());
                return Some(Ok(entry.into_path()));
            }
            log::trace!("Excluding file: {}", entry.path().display());
        }
    }
}
