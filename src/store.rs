//! Filesystem canonical store.
//!
//! One JSON file per `(country, month)` at `<root>/<country>/ev/YYYY-MM.json`.
//! Files are write-once: the pipeline never overwrites a persisted month, and a
//! record becomes visible in a single step so a crash cannot leave a partial
//! file behind for the idempotence check to trust.

use crate::config::StoreConfig;
use crate::error::StorageError;
use crate::model::{CanonicalRecord, MonthKey};
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

const RECORD_DIR: &str = "ev";

pub struct CanonicalStore {
    root: PathBuf,
}

impl CanonicalStore {
    pub fn new(config: &StoreConfig) -> Self {
        Self::at(&config.root)
    }

    pub fn at(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn country_dir(&self, country: &str) -> PathBuf {
        self.root.join(country.to_lowercase()).join(RECORD_DIR)
    }

    /// Path of the record file for `(country, key)`.
    pub fn record_path(&self, country: &str, key: MonthKey) -> PathBuf {
        self.country_dir(country).join(format!("{}.json", key))
    }

    pub fn exists(&self, country: &str, key: MonthKey) -> bool {
        self.record_path(country, key).is_file()
    }

    /// Months of `keys` with no persisted record, in input order.
    ///
    /// Creates the country directory when it is missing.
    pub fn filter_missing(
        &self,
        country: &str,
        keys: &[MonthKey],
    ) -> Result<Vec<MonthKey>, StorageError> {
        let dir = self.country_dir(country);
        fs::create_dir_all(&dir)
            .map_err(|e| StorageError::create_dir(dir.display().to_string(), e))?;

        Ok(keys
            .iter()
            .copied()
            .filter(|key| !self.exists(country, *key))
            .collect())
    }

    /// Persists `record` under its own month.
    ///
    /// The record is serialized in full, written to a sibling temporary file
    /// and hard-linked into place; linking fails if the target already exists,
    /// which gives write-once semantics without a check-then-write race.
    pub fn write(&self, country: &str, record: &CanonicalRecord) -> Result<PathBuf, StorageError> {
        let key = record.month_key().ok_or_else(|| {
            StorageError::EmptyRecord(format!("{} {}-{}", country, record.year, record.month))
        })?;
        if record.is_empty() {
            return Err(StorageError::EmptyRecord(format!("{} {}", country, key)));
        }

        let path = self.record_path(country, key);
        let path_str = path.display().to_string();
        if path.exists() {
            return Err(StorageError::AlreadyExists { path: path_str });
        }

        let dir = self.country_dir(country);
        fs::create_dir_all(&dir)
            .map_err(|e| StorageError::create_dir(dir.display().to_string(), e))?;

        let body = serde_json::to_vec_pretty(record).map_err(|source| {
            StorageError::Serialization {
                path: path_str.clone(),
                source,
            }
        })?;

        let tmp = dir.join(format!(".{}.json.tmp", key));
        let result = write_file(&tmp, &body).and_then(|_| fs::hard_link(&tmp, &path));
        let _ = fs::remove_file(&tmp);

        match result {
            Ok(()) => {
                tracing::debug!(country, month = %key, path = %path_str, "Record persisted");
                Ok(path)
            }
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                Err(StorageError::AlreadyExists { path: path_str })
            }
            Err(e) => Err(StorageError::write(path_str, e)),
        }
    }

    pub fn read(
        &self,
        country: &str,
        key: MonthKey,
    ) -> Result<Option<CanonicalRecord>, StorageError> {
        let path = self.record_path(country, key);
        let path_str = path.display().to_string();
        let body = match fs::read(&path) {
            Ok(body) => body,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(StorageError::Read {
                    path: path_str,
                    source,
                })
            }
        };

        serde_json::from_slice(&body)
            .map(Some)
            .map_err(|source| StorageError::Serialization {
                path: path_str,
                source,
            })
    }
}

fn write_file(path: &Path, body: &[u8]) -> std::io::Result<()> {
    let mut file = fs::File::create(path)?;
    file.write_all(body)?;
    file.sync_all()
}
