use super::decode::ResourceEntry;
use super::PersistenceError;
use serde::Serialize;
use std::io::Write;
use std::path::{Path, PathBuf};

/// JSON-file-per-record directory. Records are addressed by file stem.
pub struct JsonStore {
    dir: PathBuf,
}

impl JsonStore {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    pub fn ensure_dir(&self) -> Result<(), PersistenceError> {
        std::fs::create_dir_all(&self.dir)?;
        Ok(())
    }

    #[allow(dead_code)]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path for a record. Stems that would escape the directory or are not
    /// valid file names are rejected.
    pub fn file_path(&self, stem: &str) -> Result<PathBuf, PersistenceError> {
        let invalid = stem.is_empty()
            || stem == "."
            || stem == ".."
            || stem.contains(['/', '\\', '\0']);
        if invalid {
            return Err(PersistenceError::InvalidRecordName(stem.to_string()));
        }
        Ok(self.dir.join(format!("{}.json", stem)))
    }

    /// Write a record as pretty JSON to `<stem>.json`.
    pub fn save<T: Serialize>(&self, stem: &str, data: &T) -> Result<PathBuf, PersistenceError> {
        let path = self.file_path(stem)?;
        self.write_file(&path, data)?;
        Ok(path)
    }

    /// Like [`JsonStore::save`], and also remove files whose stem differs
    /// from `stem` only by case, for records keyed by their file name.
    pub fn save_replacing_variants<T: Serialize>(
        &self,
        stem: &str,
        data: &T,
    ) -> Result<PathBuf, PersistenceError> {
        let path = self.save(stem, data)?;

        let folded = stem.to_lowercase();
        for existing in self.files()? {
            if existing == path {
                continue;
            }
            let same_record = existing
                .file_stem()
                .map(|s| s.to_string_lossy().to_lowercase() == folded)
                .unwrap_or(false);
            if same_record {
                tracing::debug!("Removing case variant {:?}", existing);
                std::fs::remove_file(&existing)?;
            }
        }

        Ok(path)
    }

    /// Atomically replace `path` with `data` as pretty JSON. Each write goes
    /// through its own temporary file in the store directory.
    pub fn write_file<T: Serialize>(&self, path: &Path, data: &T) -> Result<(), PersistenceError> {
        self.ensure_dir()?;
        let json = serde_json::to_string_pretty(data)?;
        let mut tmp = tempfile::NamedTempFile::new_in(&self.dir)?;
        tmp.write_all(json.as_bytes())?;
        tmp.persist(path).map_err(|e| e.error)?;
        Ok(())
    }

    /// Read every `*.json` file, sorted by name. A missing directory is an
    /// empty store. Per-file read errors are kept on the entry.
    pub fn read_all(&self) -> Result<Vec<ResourceEntry>, PersistenceError> {
        Ok(self
            .files()?
            .into_iter()
            .map(|path| {
                let contents = std::fs::read(&path);
                ResourceEntry::new(path.display().to_string(), contents)
            })
            .collect())
    }

    /// Every `*.json` file in the store, sorted by name.
    pub fn files(&self) -> Result<Vec<PathBuf>, PersistenceError> {
        if !self.dir.exists() {
            return Ok(vec![]);
        }
        let mut files = Vec::new();
        for entry in std::fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.is_file() && path.extension().and_then(|e| e.to_str()) == Some("json") {
                files.push(path);
            }
        }
        files.sort();
        Ok(files)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> (tempfile::TempDir, JsonStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonStore::new(dir.path().join("records"));
        (dir, store)
    }

    #[test]
    fn missing_dir_reads_empty() {
        let (_dir, store) = store();
        assert!(store.read_all().unwrap().is_empty());
    }

    #[test]
    fn save_then_read_all_sorted() {
        let (_dir, store) = store();
        store.save("b", &vec!["x"]).unwrap();
        store.save("a", &vec!["y"]).unwrap();
        std::fs::write(store.dir().join("notes.txt"), "ignored").unwrap();

        let entries = store.read_all().unwrap();
        assert_eq!(entries.len(), 2);
        assert!(entries[0].name.ends_with("a.json"));
        assert!(entries[1].name.ends_with("b.json"));
        let body: Vec<String> =
            serde_json::from_slice(entries[0].contents.as_ref().unwrap()).unwrap();
        assert_eq!(body, vec!["y"]);
    }

    #[test]
    fn save_replacing_variants_removes_other_casings() {
        let (_dir, store) = store();
        store.ensure_dir().unwrap();
        std::fs::write(store.dir().join("Cities.json"), "[]").unwrap();

        store.save_replacing_variants("cities", &vec!["Oslo"]).unwrap();

        let entries = store.read_all().unwrap();
        assert_eq!(entries.len(), 1);
        assert!(entries[0].name.ends_with("cities.json"));
    }

    #[test]
    fn rejects_path_like_names() {
        let (_dir, store) = store();
        for bad in ["", ".", "..", "a/b", "a\\b"] {
            assert!(matches!(
                store.file_path(bad),
                Err(PersistenceError::InvalidRecordName(_))
            ));
        }
    }

    #[test]
    fn overlapping_saves_of_one_record_all_succeed() {
        let (_dir, store) = store();
        let store = std::sync::Arc::new(store);

        let writers: Vec<_> = (0..16)
            .map(|i| {
                let store = std::sync::Arc::clone(&store);
                std::thread::spawn(move || {
                    for round in 0..20 {
                        store.save("same", &vec![format!("{i}-{round}")]).unwrap();
                    }
                })
            })
            .collect();
        for writer in writers {
            writer.join().unwrap();
        }

        let entries = store.read_all().unwrap();
        assert_eq!(entries.len(), 1);
        let body: Vec<String> =
            serde_json::from_slice(entries[0].contents.as_ref().unwrap()).unwrap();
        assert_eq!(body.len(), 1);
        assert_eq!(store.dir().read_dir().unwrap().count(), 1);
    }
}
