//! Load and save of the backing flat file.

use std::fs::{self, File};
use std::io::{ErrorKind, Read, Write};
use std::path::{Path, PathBuf};

use tracing::warn;

use crate::config::StoreConfig;
use crate::error::StoreError;
use crate::record::{Record, Value};
use crate::table::{Table, ID_COLUMN};

use super::csv;

/// Serializes the table to the backing file and reloads it.
///
/// The file is a full-state snapshot, not a log: `save` rewrites it
/// completely after every mutation.
#[derive(Debug, Clone)]
pub struct PersistenceAdapter {
    path: PathBuf,
    max_attempts: u32,
}

impl PersistenceAdapter {
    /// Creates an adapter for the configured backing file.
    pub fn new(config: &StoreConfig) -> Self {
        Self {
            path: config.data_path.clone(),
            max_attempts: config.max_io_attempts,
        }
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the backing file and builds the table.
    ///
    /// Transient read failures are retried up to the attempt budget
    /// with no backoff. A missing file, an exhausted budget, and
    /// malformed content each surface as a distinguishable error.
    pub fn load(&self) -> Result<Table, StoreError> {
        let contents = retry_transient(|| self.read_contents(), self.max_attempts, "load")
            .map_err(|e| match e {
                StoreError::Load(_) | StoreError::Malformed(_) => e,
                other => StoreError::Load(other.to_string()),
            })?;
        parse_table(&contents)
    }

    fn read_contents(&self) -> Result<String, StoreError> {
        let mut file = match File::open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(StoreError::Load(format!(
                    "backing file {} does not exist",
                    self.path.display()
                )));
            }
            Err(e) => return Err(classify_io_error(e, "Failed to open backing file")),
        };
        let mut contents = String::new();
        file.read_to_string(&mut contents)
            .map_err(|e| classify_io_error(e, "Failed to read backing file"))?;
        Ok(contents)
    }

    /// Overwrites the backing file with the full table state.
    ///
    /// Writes a temporary sibling file, fsyncs, then renames over the
    /// target, so a failed write never truncates the previous
    /// snapshot. Transient failures use the same attempt budget as
    /// `load`.
    pub fn save(&self, table: &Table) -> Result<(), StoreError> {
        retry_transient(|| self.write_snapshot(table), self.max_attempts, "save")
    }

    fn write_snapshot(&self, table: &Table) -> Result<(), StoreError> {
        let mut out = String::new();
        out.push_str(&csv::write_line(table.columns()));
        out.push('\n');
        for record in table.rows() {
            let cells: Vec<String> = table
                .columns()
                .iter()
                .map(|column| {
                    if column == ID_COLUMN {
                        record.id.to_string()
                    } else {
                        record.field(column).map(|v| v.render()).unwrap_or_default()
                    }
                })
                .collect();
            out.push_str(&csv::write_line(&cells));
            out.push('\n');
        }

        let temp_path = self.path.with_extension("tmp");
        let mut file = File::create(&temp_path)
            .map_err(|e| classify_io_error(e, "Failed to create temp file"))?;
        file.write_all(out.as_bytes())
            .map_err(|e| classify_io_error(e, "Failed to write snapshot"))?;
        file.sync_all()
            .map_err(|e| classify_io_error(e, "Failed to sync snapshot"))?;
        fs::rename(&temp_path, &self.path)
            .map_err(|e| classify_io_error(e, "Failed to rename snapshot"))?;

        Ok(())
    }
}

/// Parses full file contents into a table.
fn parse_table(contents: &str) -> Result<Table, StoreError> {
    let mut lines = contents.lines();
    let header = lines
        .next()
        .filter(|line| !line.trim().is_empty())
        .ok_or_else(|| StoreError::Malformed("backing file is empty".to_string()))?;
    let columns = csv::parse_line(header)
        .ok_or_else(|| StoreError::Malformed("unparsable header row".to_string()))?;

    let mut table = Table::new(columns)?;
    let expected = table.columns().len();

    for (line_no, line) in lines.enumerate() {
        if line.trim().is_empty() {
            // Tolerate a trailing newline
            continue;
        }
        let cells = csv::parse_line(line).ok_or_else(|| {
            StoreError::Malformed(format!("unparsable row at line {}", line_no + 2))
        })?;
        if cells.len() != expected {
            return Err(StoreError::Malformed(format!(
                "row at line {} has {} cells, header declares {}",
                line_no + 2,
                cells.len(),
                expected
            )));
        }
        let record = row_from_cells(table.columns(), &cells)?;
        table.push_loaded(record)?;
    }

    Ok(table)
}

/// Builds a record from one row of cells aligned with the columns.
fn row_from_cells(columns: &[String], cells: &[String]) -> Result<Record, StoreError> {
    let mut id = None;
    let mut fields = Vec::with_capacity(cells.len().saturating_sub(1));

    for (column, cell) in columns.iter().zip(cells) {
        if column == ID_COLUMN {
            let parsed = cell.trim().parse::<i64>().map_err(|_| {
                StoreError::Malformed(format!("id cell '{}' is not an integer", cell))
            })?;
            id = Some(parsed);
        } else {
            fields.push((column.clone(), Value::infer(cell)));
        }
    }

    // Table::new guarantees the id column is present in the header.
    let id = id.ok_or_else(|| StoreError::Malformed("row missing id cell".to_string()))?;
    Ok(Record { id, fields })
}

/// Sorts an I/O error into the retryable and fatal variants.
fn classify_io_error(error: std::io::Error, context: &str) -> StoreError {
    match error.kind() {
        ErrorKind::WouldBlock | ErrorKind::TimedOut | ErrorKind::Interrupted => {
            StoreError::TransientIo(format!("{}: {}", context, error))
        }
        _ => StoreError::Io(format!("{}: {}", context, error)),
    }
}

/// Retries an operation up to the attempt budget, with no backoff.
///
/// Only `TransientIo` failures consume the budget; any other error
/// surfaces immediately.
fn retry_transient<T>(
    mut operation: impl FnMut() -> Result<T, StoreError>,
    max_attempts: u32,
    context: &str,
) -> Result<T, StoreError> {
    let mut attempt = 1;
    loop {
        match operation() {
            Ok(value) => return Ok(value),
            Err(StoreError::TransientIo(msg)) if attempt < max_attempts => {
                warn!(
                    "Transient I/O error during {} (attempt {}/{}): {}",
                    context, attempt, max_attempts, msg
                );
                attempt += 1;
            }
            Err(err) => return Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_table_infers_cell_types() {
        let table =
            parse_table("id,first_name,age\n1,Ross,29\n2,Rachel,28\n").unwrap();
        assert_eq!(table.len(), 2);
        let ross = table.get(1).unwrap();
        assert_eq!(ross.field("first_name"), Some(&Value::Str("Ross".to_string())));
        assert_eq!(ross.field("age"), Some(&Value::Int(29)));
    }

    #[test]
    fn test_parse_table_rejects_empty_file() {
        assert!(matches!(parse_table(""), Err(StoreError::Malformed(_))));
    }

    #[test]
    fn test_parse_table_rejects_missing_id_column() {
        let result = parse_table("first_name,last_name\nRoss,Geller\n");
        assert!(matches!(result, Err(StoreError::Malformed(_))));
    }

    #[test]
    fn test_parse_table_rejects_non_integer_id() {
        let result = parse_table("id,first_name\none,Ross\n");
        assert!(matches!(result, Err(StoreError::Malformed(_))));
    }

    #[test]
    fn test_parse_table_rejects_short_row() {
        let result = parse_table("id,first_name,last_name\n1,Ross\n");
        assert!(matches!(result, Err(StoreError::Malformed(_))));
    }

    #[test]
    fn test_parse_table_rejects_duplicate_ids() {
        let result = parse_table("id,first_name\n1,Ross\n1,Rachel\n");
        assert!(matches!(result, Err(StoreError::Malformed(_))));
    }

    #[test]
    fn test_retry_budget_applies_to_transient_errors_only() {
        let mut io_attempts = 0;
        let io_result: Result<(), StoreError> = retry_transient(
            || {
                io_attempts += 1;
                Err(StoreError::Io("disk on fire".to_string()))
            },
            5,
            "test",
        );
        assert!(matches!(io_result, Err(StoreError::Io(_))));
        assert_eq!(io_attempts, 1);

        let mut transient_attempts = 0;
        let transient_result: Result<(), StoreError> = retry_transient(
            || {
                transient_attempts += 1;
                Err(StoreError::TransientIo("locked".to_string()))
            },
            5,
            "test",
        );
        assert!(matches!(transient_result, Err(StoreError::TransientIo(_))));
        assert_eq!(transient_attempts, 5);
    }

    #[test]
    fn test_retry_recovers_after_transient_failures() {
        let mut attempts = 0;
        let result = retry_transient(
            || {
                attempts += 1;
                if attempts < 3 {
                    Err(StoreError::TransientIo("locked".to_string()))
                } else {
                    Ok(attempts)
                }
            },
            5,
            "test",
        );
        assert_eq!(result.unwrap(), 3);
    }
}
