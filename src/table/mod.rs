//! CSV output table
//!
//! A run initializes the table once (header only, previous content dropped)
//! and appends rows as entries complete. Appending never creates the file:
//! a missing table means initialization was skipped or the file was removed
//! mid-run, and writing a headerless table would hide that.

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum TableError {
    #[error("table {0} does not exist; initialize it before appending")]
    NotFound(PathBuf),

    #[error("I/O error on table {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error on table {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
}

impl TableError {
    fn io(path: &Path, source: std::io::Error) -> Self {
        TableError::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    fn csv(path: &Path, source: csv::Error) -> Self {
        TableError::Csv {
            path: path.to_path_buf(),
            source,
        }
    }
}

fn writer<W: Write>(inner: W) -> csv::Writer<W> {
    csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .flexible(true)
        .from_writer(inner)
}

/// Creates missing parent directories and writes `header` as the only row,
/// replacing any previous content.
pub fn initialize_table<S: AsRef<str>>(path: &Path, header: &[S]) -> Result<(), TableError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| TableError::io(parent, e))?;
    }

    let file = File::create(path).map_err(|e| TableError::io(path, e))?;
    let mut out = writer(file);
    out.write_record(header.iter().map(|h| h.as_ref()))
        .map_err(|e| TableError::csv(path, e))?;
    out.flush().map_err(|e| TableError::io(path, e))?;

    info!(path = %path.display(), columns = header.len(), "Initialized output table");
    Ok(())
}

/// Appends `rows` in order and returns how many were written.
pub fn append_rows<S: AsRef<str>>(path: &Path, rows: &[Vec<S>]) -> Result<usize, TableError> {
    if !path.is_file() {
        return Err(TableError::NotFound(path.to_path_buf()));
    }

    let file = OpenOptions::new()
        .append(true)
        .open(path)
        .map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => TableError::NotFound(path.to_path_buf()),
            _ => TableError::io(path, e),
        })?;

    let mut out = writer(file);
    for row in rows {
        out.write_record(row.iter().map(|cell| cell.as_ref()))
            .map_err(|e| TableError::csv(path, e))?;
    }
    out.flush().map_err(|e| TableError::io(path, e))?;

    debug!(path = %path.display(), rows = rows.len(), "Appended rows");
    Ok(rows.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn read_records(path: &Path) -> Vec<Vec<String>> {
        csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_path(path)
            .unwrap()
            .records()
            .map(|r| r.unwrap().iter().map(str::to_string).collect())
            .collect()
    }

    #[test]
    fn test_initialize_creates_parents_and_truncates() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out/nested/table.csv");

        initialize_table(&path, &["Repo Name", "Docker"]).unwrap();
        append_rows(&path, &[vec!["a/b", "yes"]]).unwrap();
        initialize_table(&path, &["Repo Name", "Docker"]).unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "Repo Name,Docker\n");
    }

    #[test]
    fn test_append_preserves_order_and_quotes() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("table.csv");
        initialize_table(&path, &["Repo Name", "Example Activation Command(s)"]).unwrap();

        let written = append_rows(
            &path,
            &[
                vec!["acme/one".to_string(), "npx one\nnpx one --stdio".to_string()],
                vec!["acme/two".to_string(), "uvx \"two\", --flag".to_string()],
            ],
        )
        .unwrap();
        append_rows(&path, &[vec!["acme/three", ""]]).unwrap();

        assert_eq!(written, 2);
        let records = read_records(&path);
        assert_eq!(records.len(), 4);
        assert_eq!(records[1][1], "npx one\nnpx one --stdio");
        assert_eq!(records[2][1], "uvx \"two\", --flag");
        assert_eq!(records[3], vec!["acme/three", ""]);
    }

    #[test]
    fn test_append_to_missing_table() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("missing.csv");

        let result = append_rows(&path, &[vec!["x"]]);

        assert!(matches!(result, Err(TableError::NotFound(p)) if p == path));
        assert!(!path.exists());
    }

    #[test]
    fn test_append_nothing() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("table.csv");
        initialize_table(&path, &["A"]).unwrap();

        let empty: Vec<Vec<String>> = Vec::new();
        assert_eq!(append_rows(&path, &empty).unwrap(), 0);
        assert_eq!(fs::read_to_string(&path).unwrap(), "A\n");
    }
}
