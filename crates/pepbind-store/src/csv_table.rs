//! CSV-file tables, one file per partition.
//!
//! Layout: `<root>/<method>/<allele stem>.csv` with header
//! `peptide,strength,percentile`. An empty percentile field means unknown.
//! Writes append rows; on load the last row for a peptide wins, so
//! re-persisting a peptide never needs an in-place edit.
//!
//! A batch is appended with a single write. If that write is cut short the
//! file ends in a partial row without a newline: loading skips it, and the
//! next append truncates it before writing.

use std::collections::BTreeMap;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use pepbind_common::{BindRecord, PartitionKey, Peptide};

use crate::error::{Result, StoreError};
use crate::table::{BindTable, TableFactory};

const HEADER: [&str; 3] = ["peptide", "strength", "percentile"];

#[derive(Debug, Serialize, Deserialize)]
struct Row {
    peptide: String,
    strength: f64,
    percentile: Option<f64>,
}

impl From<&BindRecord> for Row {
    fn from(record: &BindRecord) -> Self {
        Self {
            peptide: record.peptide().to_string(),
            strength: record.strength(),
            percentile: record.percentile(),
        }
    }
}

/// Offset just past the last newline of `file`, if its last byte is not one.
fn torn_tail(file: &mut File, len: u64) -> io::Result<Option<u64>> {
    const CHUNK: u64 = 4096;
    if len == 0 {
        return Ok(None);
    }

    let mut last = [0u8; 1];
    file.seek(SeekFrom::Start(len - 1))?;
    file.read_exact(&mut last)?;
    if last[0] == b'\n' {
        return Ok(None);
    }

    let mut end = len;
    let mut buf = vec![0u8; CHUNK as usize];
    while end > 0 {
        let start = end.saturating_sub(CHUNK);
        let chunk = &mut buf[..(end - start) as usize];
        file.seek(SeekFrom::Start(start))?;
        file.read_exact(chunk)?;
        if let Some(i) = chunk.iter().rposition(|&b| b == b'\n') {
            return Ok(Some(start + i as u64 + 1));
        }
        end = start;
    }
    Ok(Some(0))
}

fn ends_with_newline(path: &Path) -> io::Result<bool> {
    let mut file = File::open(path)?;
    let len = file.metadata()?.len();
    Ok(torn_tail(&mut file, len)?.is_none())
}

/// Append-only CSV table. The file is opened for appending on first upsert
/// and the handle is kept until the table is dropped or compacted.
pub struct CsvBindTable {
    path: PathBuf,
    file: Mutex<Option<File>>,
}

impl CsvBindTable {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            file: Mutex::new(None),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn corrupt(&self, line: u64, reason: impl Into<String>) -> StoreError {
        StoreError::Corrupt {
            path: self.path.clone(),
            line,
            reason: reason.into(),
        }
    }

    fn open_for_append(&self) -> Result<File> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| StoreError::io(parent, e))?;
        }
        let mut file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| StoreError::io(&self.path, e))?;
        let mut len = file
            .metadata()
            .map_err(|e| StoreError::io(&self.path, e))?
            .len();

        if let Some(keep) = torn_tail(&mut file, len).map_err(|e| StoreError::io(&self.path, e))? {
            warn!(
                path = %self.path.display(),
                dropped = len - keep,
                "Truncating partial row left by an interrupted write"
            );
            file.set_len(keep).map_err(|e| StoreError::io(&self.path, e))?;
            len = keep;
        }

        if len == 0 {
            let header = Self::encode(&[], true)?;
            file.write_all(&header).map_err(|e| StoreError::io(&self.path, e))?;
        }
        debug!(path = %self.path.display(), "Opened bind table for writing");
        Ok(file)
    }

    /// CSV bytes for `records`, optionally preceded by the header line.
    fn encode(records: &[BindRecord], header: bool) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        {
            let mut out = csv::WriterBuilder::new().has_headers(false).from_writer(&mut buf);
            if header {
                out.write_record(HEADER)?;
            }
            for record in records {
                out.serialize(Row::from(record))?;
            }
            out.flush().map_err(csv::Error::from)?;
        }
        Ok(buf)
    }

    /// Every row, later rows replacing earlier ones for the same peptide.
    fn read_rows(&self) -> Result<BTreeMap<Peptide, BindRecord>> {
        let mut rows = BTreeMap::new();
        let file = match File::open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(rows),
            Err(e) => return Err(StoreError::io(&self.path, e)),
        };

        let torn = !ends_with_newline(&self.path).map_err(|e| StoreError::io(&self.path, e))?;
        let mut reader = csv::ReaderBuilder::new().has_headers(true).from_reader(file);
        let headers = reader.headers()?.clone();
        if headers.is_empty() {
            return Ok(rows);
        }
        if !headers.iter().eq(HEADER) {
            return Err(self.corrupt(1, format!("unexpected header {:?}", headers)));
        }

        let mut records = reader.records().peekable();
        while let Some(result) = records.next() {
            let is_last = records.peek().is_none();
            match self.parse_row(result, &headers) {
                Ok(record) => {
                    rows.insert(record.peptide().clone(), record);
                }
                Err(StoreError::Corrupt { line, reason, .. }) if torn && is_last => {
                    warn!(path = %self.path.display(), line, %reason, "Skipping partial last row");
                }
                Err(e) => return Err(e),
            }
        }
        Ok(rows)
    }

    fn parse_row(
        &self,
        result: csv::Result<csv::StringRecord>,
        headers: &csv::StringRecord,
    ) -> Result<BindRecord> {
        let record = result.map_err(|e| {
            let line = e.position().map(|p| p.line()).unwrap_or(0);
            self.corrupt(line, e.to_string())
        })?;
        let line = record.position().map(|p| p.line()).unwrap_or(0);

        let row: Row = record
            .deserialize(Some(headers))
            .map_err(|e| self.corrupt(line, e.to_string()))?;
        let peptide = Peptide::new(&row.peptide).map_err(|e| self.corrupt(line, e.to_string()))?;
        BindRecord::new(peptide, row.strength, row.percentile).map_err(|e| self.corrupt(line, e.to_string()))
    }

    /// Rewrite the file with one row per peptide. Returns the row count.
    ///
    /// The new file is written next to the old one and renamed over it.
    pub fn compact(&self) -> Result<usize> {
        let mut file = self.file.lock();
        let rows = self.read_rows()?;
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::create_dir_all(dir).map_err(|e| StoreError::io(dir, e))?;

        let records: Vec<BindRecord> = rows.into_values().collect();
        let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(|e| StoreError::io(dir, e))?;
        tmp.write_all(&Self::encode(&records, true)?)
            .map_err(|e| StoreError::io(tmp.path(), e))?;
        tmp.persist(&self.path)
            .map_err(|e| StoreError::io(&self.path, e.error))?;

        // The old handle points at the replaced file
        *file = None;
        info!(path = %self.path.display(), rows = records.len(), "Compacted bind table");
        Ok(records.len())
    }
}

impl BindTable for CsvBindTable {
    fn load_all(&self) -> Result<Vec<BindRecord>> {
        Ok(self.read_rows()?.into_values().collect())
    }

    fn upsert_many(&self, records: &[BindRecord]) -> Result<()> {
        if records.is_empty() {
            return Ok(());
        }
        let bytes = Self::encode(records, false)?;

        let mut guard = self.file.lock();
        let file = match guard.take() {
            Some(file) => file,
            None => self.open_for_append()?,
        };
        let file = guard.insert(file);

        let result = file
            .write_all(&bytes)
            .and_then(|_| file.flush())
            .map_err(|e| StoreError::io(&self.path, e));
        if result.is_err() {
            // Reopen on the next write so a partial row gets truncated
            *guard = None;
        }
        result
    }

    fn location(&self) -> String {
        self.path.display().to_string()
    }
}

/// Opens [`CsvBindTable`]s under one root directory.
#[derive(Debug, Clone)]
pub struct CsvTableFactory {
    root: PathBuf,
}

impl CsvTableFactory {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// `<root>/<method>/<allele stem>.csv`
    pub fn table_path(&self, key: &PartitionKey) -> PathBuf {
        self.root
            .join(key.method.name())
            .join(format!("{}.csv", key.allele.file_stem()))
    }
}

impl TableFactory for CsvTableFactory {
    fn open(&self, key: &PartitionKey) -> Result<Box<dyn BindTable>> {
        Ok(Box::new(CsvBindTable::new(self.table_path(key))))
    }
}
