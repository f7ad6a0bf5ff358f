use std::collections::HashSet;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use thiserror::Error;
use wxr_logging::{wxr_debug, wxr_info};

use crate::frontmatter::render_document;
use crate::page::Page;

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("output directory missing or not writable: {0}")]
    OutputDir(String),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("front matter: {0}")]
    FrontMatter(#[from] serde_yaml::Error),
}

/// Ensure output directory exists; create if missing.
pub fn ensure_output_dir(dir: &Path) -> Result<(), PersistError> {
    if dir.exists() {
        let meta = fs::metadata(dir).map_err(|e| PersistError::OutputDir(e.to_string()))?;
        if !meta.is_dir() {
            return Err(PersistError::OutputDir(format!(
                "{} is not a directory",
                dir.display()
            )));
        }
    } else {
        fs::create_dir_all(dir).map_err(|e| PersistError::OutputDir(e.to_string()))?;
    }
    NamedTempFile::new_in(dir).map_err(|e| PersistError::OutputDir(e.to_string()))?;
    Ok(())
}

/// Writes pages into one directory. Names already used during this run get
/// a `-1`, `-2`, ... suffix.
pub struct PageWriter {
    dir: PathBuf,
    taken: HashSet<String>,
}

impl PageWriter {
    pub fn new(dir: PathBuf) -> Result<Self, PersistError> {
        ensure_output_dir(&dir)?;
        Ok(Self {
            dir,
            taken: HashSet::new(),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn write_page(&mut self, stem: &str, page: &Page) -> Result<PathBuf, PersistError> {
        let doc = render_document(page)?;
        self.write(stem, &doc)
    }

    /// Atomically write `content` to `<stem>.md` or the next free variant.
    pub fn write(&mut self, stem: &str, content: &str) -> Result<PathBuf, PersistError> {
        let filename = self.claim(stem);
        let target = self.dir.join(&filename);
        let mut tmp = NamedTempFile::new_in(&self.dir)?;
        tmp.write_all(content.as_bytes())?;
        tmp.flush()?;
        tmp.as_file_mut().sync_all()?;

        if target.exists() {
            fs::remove_file(&target)?;
        }
        tmp.persist(&target).map_err(|e| PersistError::Io(e.error))?;
        wxr_info!("wrote {}", target.display());
        Ok(target)
    }

    fn claim(&mut self, stem: &str) -> String {
        let stem = if stem.is_empty() { "untitled" } else { stem };
        let mut candidate = format!("{stem}.md");
        let mut n = 0;
        while self.taken.contains(&candidate) {
            n += 1;
            candidate = format!("{stem}-{n}.md");
        }
        if n > 0 {
            wxr_debug!("{stem}.md already written in this run, using {candidate}");
        }
        self.taken.insert(candidate.clone());
        candidate
    }
}
