//! Snapshot file I/O.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::store::{StoreDocument, StoreError};

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("snapshot I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("snapshot at {path} is not valid JSON: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("snapshot at {path} is inconsistent: {source}")]
    Integrity {
        path: PathBuf,
        #[source]
        source: StoreError,
    },
}

impl SnapshotError {
    fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    fn json(path: &Path, source: serde_json::Error) -> Self {
        Self::Json {
            path: path.to_path_buf(),
            source,
        }
    }

    pub(crate) fn integrity(path: &Path, source: StoreError) -> Self {
        Self::Integrity {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Reads a snapshot. A missing file yields an empty document.
pub fn load(path: &Path) -> Result<StoreDocument, SnapshotError> {
    if !path.exists() {
        return Ok(StoreDocument::default());
    }
    let file = File::open(path).map_err(|e| SnapshotError::io(path, e))?;
    serde_json::from_reader(BufReader::new(file)).map_err(|e| SnapshotError::json(path, e))
}

/// Writes `doc` as pretty JSON via a sibling temp file and rename.
pub fn write(path: &Path, doc: &StoreDocument) -> Result<(), SnapshotError> {
    ensure_parent(path)?;

    let tmp = temp_path(path);
    let file = File::create(&tmp).map_err(|e| SnapshotError::io(&tmp, e))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, doc).map_err(|e| SnapshotError::json(&tmp, e))?;
    writer.write_all(b"\n").map_err(|e| SnapshotError::io(&tmp, e))?;
    let file = writer
        .into_inner()
        .map_err(|e| SnapshotError::io(&tmp, e.into_error()))?;
    file.sync_all().map_err(|e| SnapshotError::io(&tmp, e))?;

    fs::rename(&tmp, path).map_err(|e| SnapshotError::io(path, e))
}

/// Creates the directory that will hold the snapshot at `path`.
pub fn ensure_parent(path: &Path) -> Result<(), SnapshotError> {
    match path.parent().filter(|p| !p.as_os_str().is_empty()) {
        Some(parent) => fs::create_dir_all(parent).map_err(|e| SnapshotError::io(parent, e)),
        None => Ok(()),
    }
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".tmp");
    PathBuf::from(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Middleware, ResourceRef, Router, Service, ServiceSpec};

    fn sample() -> StoreDocument {
        let mut doc = StoreDocument::default();
        doc.services.insert(
            "s1".into(),
            Service {
                id: "s1".into(),
                spec: ServiceSpec::Url("http://b:80".into()),
            },
        );
        doc.middlewares.insert(
            "m1".into(),
            Middleware {
                id: "m1".into(),
                middleware_type: "addPrefix".into(),
                config: serde_json::json!({"prefix": "/v1"}),
            },
        );
        doc.routers.insert(
            "r1".into(),
            Router {
                id: "r1".into(),
                entry_points: vec!["web".into()],
                middlewares: vec![ResourceRef::new("m1")],
                service: ResourceRef::new("s1"),
                rule: "Host(`a`)".into(),
                rule_syntax: None,
                priority: Some(10),
                tls: None,
                observability: None,
            },
        );
        doc
    }

    #[test]
    fn test_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let doc = load(&dir.path().join("absent.json")).unwrap();
        assert!(doc.is_empty());
    }

    #[test]
    fn test_missing_maps_are_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("partial.json");
        fs::write(&path, r#"{"services": {"s": {"id": "s", "url": "http://x"}}}"#).unwrap();

        let doc = load(&path).unwrap();
        assert_eq!(doc.services.len(), 1);
        assert!(doc.routers.is_empty());
        assert!(doc.middlewares.is_empty());
    }

    #[test]
    fn test_write_is_pretty_and_reloads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("store.json");

        write(&path, &sample()).unwrap();
        let text = fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("{\n  \"middlewares\""));
        assert!(!temp_path(&path).exists());

        assert_eq!(load(&path).unwrap(), sample());
    }

    #[test]
    fn test_corrupt_file_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        fs::write(&path, "{not json").unwrap();

        let err = load(&path).unwrap_err();
        assert!(matches!(err, SnapshotError::Json { .. }));
        assert!(err.to_string().contains("bad.json"));
    }
}
