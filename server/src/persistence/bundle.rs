//! Read-only question bundles shipped with the server.
//!
//! A bundle is a resource root holding `questions/*.json` and
//! `categories/*.json`. The root is either an unpacked directory or a zip
//! archive; both are enumerated through [`ResourceIndex`].

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use glob::{MatchOptions, Pattern};
use quiz::{AnswerCategory, Question};

use super::decode::{decode_categories, decode_questions, ResourceEntry};
use super::traits::QuestionSource;
use super::{Loaded, PersistenceError, CATEGORIES_PATTERN, QUESTIONS_PATTERN};

/// Enumerates resources under a root by glob pattern.
pub trait ResourceIndex: Send + Sync {
    fn describe(&self) -> String;

    /// Entries matching `pattern`, sorted by name. A missing root yields no
    /// entries rather than an error.
    fn entries(&self, pattern: &str) -> Result<Vec<ResourceEntry>, PersistenceError>;
}

/// Resources stored as plain files below a directory.
pub struct DirectoryResources {
    root: PathBuf,
}

impl DirectoryResources {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl ResourceIndex for DirectoryResources {
    fn describe(&self) -> String {
        format!("bundle directory {}", self.root.display())
    }

    fn entries(&self, pattern: &str) -> Result<Vec<ResourceEntry>, PersistenceError> {
        if !self.root.is_dir() {
            return Ok(vec![]);
        }

        let root = Pattern::escape(&self.root.to_string_lossy());
        let full = format!("{}/{}", root.trim_end_matches('/'), pattern);

        let mut entries = Vec::new();
        for matched in glob::glob(&full)? {
            match matched {
                Ok(path) => {
                    if !path.is_file() {
                        continue;
                    }
                    let contents = std::fs::read(&path);
                    entries.push(ResourceEntry::new(relative_name(&self.root, &path), contents));
                }
                Err(e) => {
                    let name = relative_name(&self.root, e.path());
                    entries.push(ResourceEntry::new(name, Err(std::io::Error::from(e))));
                }
            }
        }
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }
}

fn relative_name(root: &Path, path: &Path) -> String {
    let rel = path.strip_prefix(root).unwrap_or(path);
    rel.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// Resources packed into a zip archive.
pub struct ArchiveResources {
    path: PathBuf,
}

impl ArchiveResources {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl ResourceIndex for ArchiveResources {
    fn describe(&self) -> String {
        format!("bundle archive {}", self.path.display())
    }

    fn entries(&self, pattern: &str) -> Result<Vec<ResourceEntry>, PersistenceError> {
        if !self.path.is_file() {
            return Ok(vec![]);
        }

        let pattern = Pattern::new(pattern)?;
        let options = MatchOptions {
            require_literal_separator: true,
            ..MatchOptions::new()
        };

        let mut archive = zip::ZipArchive::new(File::open(&self.path)?)?;
        let mut entries = Vec::new();
        for i in 0..archive.len() {
            let mut file = archive.by_index(i)?;
            if file.is_dir() || !pattern.matches_with(file.name(), options) {
                continue;
            }
            let name = file.name().to_string();
            let mut contents = Vec::new();
            let read = file.read_to_end(&mut contents).map(|_| contents);
            entries.push(ResourceEntry::new(name, read));
        }
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }
}

/// Read-only source over a packaged bundle.
pub struct BundleSource {
    resources: Box<dyn ResourceIndex>,
}

impl BundleSource {
    pub fn new(resources: Box<dyn ResourceIndex>) -> Self {
        Self { resources }
    }

    /// Open a bundle at `path`: a regular file or a `.zip` path is treated
    /// as an archive, anything else as an unpacked directory.
    pub fn open(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        let is_archive =
            path.is_file() || path.extension().and_then(|e| e.to_str()) == Some("zip");
        if is_archive {
            Self::new(Box::new(ArchiveResources::new(path)))
        } else {
            Self::new(Box::new(DirectoryResources::new(path)))
        }
    }
}

impl QuestionSource for BundleSource {
    fn describe(&self) -> String {
        self.resources.describe()
    }

    async fn load_questions(&self) -> Result<Loaded<Question>, PersistenceError> {
        let entries = self.resources.entries(QUESTIONS_PATTERN)?;
        Ok(decode_questions(&entries))
    }

    async fn load_categories(&self) -> Result<Loaded<AnswerCategory>, PersistenceError> {
        let categories = self.resources.entries(CATEGORIES_PATTERN)?;
        let questions = self.resources.entries(QUESTIONS_PATTERN)?;
        Ok(decode_categories(&categories, &questions))
    }
}
