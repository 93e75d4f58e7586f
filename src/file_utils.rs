use anyhow::{Context, Result, anyhow};
use log::debug;
use std::collections::BTreeSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::subtitle::SubtitleFormat;

// @module: File and directory utilities

// @struct: File operations utility
pub struct FileManager;

impl FileManager {
    // @checks: File existence
    pub fn file_exists<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref().is_file()
    }

    // @checks: Directory existence
    pub fn dir_exists<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref().is_dir()
    }

    // @creates: Directory and parents if needed
    pub fn ensure_dir<P: AsRef<Path>>(path: P) -> io::Result<()> {
        let path = path.as_ref();
        if !path.as_os_str().is_empty() && !path.exists() {
            fs::create_dir_all(path)?;
        }
        Ok(())
    }

    // @checks: Extension is one the converter accepts
    pub fn is_subtitle_file<P: AsRef<Path>>(path: P) -> bool {
        SubtitleFormat::from_path(path.as_ref()).is_some()
    }

    // @generates: `<output_dir>/<stem>.ass`, next to the source when no directory is given
    pub fn generate_output_path<P: AsRef<Path>>(input_file: P, output_dir: Option<&Path>) -> PathBuf {
        let input_file = input_file.as_ref();
        let stem = input_file.file_stem().unwrap_or_default();

        let mut output_filename = stem.to_os_string();
        output_filename.push(".ass");

        match output_dir {
            Some(dir) => dir.join(output_filename),
            None => input_file.with_file_name(output_filename),
        }
    }

    /// Expand a leading `~` to the user's home directory
    pub fn expand_home(path: &str) -> PathBuf {
        let rest = match path.strip_prefix('~') {
            Some(rest) if rest.is_empty() || rest.starts_with('/') || rest.starts_with('\\') => rest,
            _ => return PathBuf::from(path),
        };
        match dirs::home_dir() {
            Some(home) => home.join(rest.trim_start_matches(['/', '\\'])),
            None => PathBuf::from(path),
        }
    }

    /// Find subtitle files below a directory, sorted by path
    pub fn find_subtitle_files<P: AsRef<Path>>(dir: P) -> Result<Vec<PathBuf>> {
        let mut result = Vec::new();

        for entry in WalkDir::new(dir.as_ref()).follow_links(true).sort_by_file_name() {
            let entry = entry.context("Failed to read directory entry")?;
            let path = entry.path();

            if path.is_file() && Self::is_subtitle_file(path) {
                result.push(path.to_path_buf());
            }
        }

        Ok(result)
    }

    /// Expand the given paths into the list of subtitle files to convert
    ///
    /// Directories are searched recursively; files are taken as given (an
    /// unsupported extension is reported later, per file). Duplicates are dropped.
    pub fn collect_inputs(paths: &[PathBuf]) -> Result<Vec<PathBuf>> {
        let mut seen = BTreeSet::new();
        let mut result = Vec::new();

        for path in paths {
            let found = if path.is_dir() {
                let files = Self::find_subtitle_files(path)?;
                debug!("Found {} subtitle file(s) in {:?}", files.len(), path);
                files
            } else if path.exists() {
                vec![path.clone()]
            } else {
                return Err(anyhow!("Path does not exist: {:?}", path));
            };

            for file in found {
                if seen.insert(file.clone()) {
                    result.push(file);
                }
            }
        }

        Ok(result)
    }

    /// Read a file to a string
    pub fn read_to_string<P: AsRef<Path>>(path: P) -> Result<String> {
        fs::read_to_string(&path).with_context(|| format!("Failed to read file: {:?}", path.as_ref()))
    }

    /// Write a string to a file, creating parent directories
    pub fn write_to_file<P: AsRef<Path>>(path: P, content: &str) -> io::Result<()> {
        if let Some(parent) = path.as_ref().parent() {
            Self::ensure_dir(parent)?;
        }

        fs::write(&path, content)
    }

    pub fn remove_file<P: AsRef<Path>>(path: P) -> io::Result<()> {
        fs::remove_file(path)
    }
}
