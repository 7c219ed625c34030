use std::fs::OpenOptions;
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use csv::{ReaderBuilder, StringRecord, WriterBuilder};
use tokio::sync::Mutex;

use crate::error::{AppError, AppResult};
use crate::models::CatalogRecord;

/// Handle on a catalog CSV file.
///
/// All reads are header-driven; appends serialize fields in the order of the
/// file's own header row, so base files carrying extra columns (e.g.
/// `release_date`) stay consistent. The append lock serializes writers within
/// this process; the file itself stays append-only.
pub struct CatalogFile {
    path: PathBuf,
    append_lock: Mutex<()>,
}

impl CatalogFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            append_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Reads the header row.
    pub fn header(&self) -> AppResult<StringRecord> {
        let mut reader = ReaderBuilder::new()
            .flexible(true)
            .from_path(&self.path)?;
        Ok(reader.headers()?.clone())
    }

    /// Parses every row into a [`CatalogRecord`].
    ///
    /// Rows that fail to parse (legacy hand-appended lines) are logged and
    /// skipped rather than failing the whole scan.
    pub fn records(&self) -> AppResult<Vec<CatalogRecord>> {
        let mut reader = ReaderBuilder::new()
            .flexible(true)
            .from_path(&self.path)?;

        let mut records = Vec::new();
        let mut skipped = 0usize;
        for result in reader.deserialize::<CatalogRecord>() {
            match result {
                Ok(record) => records.push(record),
                Err(e) => {
                    skipped += 1;
                    tracing::warn!(error = %e, "Skipping unparsable catalog row");
                }
            }
        }

        if skipped > 0 {
            tracing::warn!(skipped, rows = records.len(), "Catalog scan had bad rows");
        }

        Ok(records)
    }

    /// Returns the header plus every raw row.
    ///
    /// The synchronizer works on raw rows so matched lines can be re-emitted
    /// with only the `userId`/`rating` fields rewritten.
    pub fn raw_rows(&self) -> AppResult<(StringRecord, Vec<StringRecord>)> {
        let mut reader = ReaderBuilder::new()
            .flexible(true)
            .from_path(&self.path)?;
        let header = reader.headers()?.clone();
        let rows = reader.records().collect::<Result<Vec<_>, _>>()?;
        Ok((header, rows))
    }

    /// Largest `movieId` present in the file, or 0 for an empty catalog.
    pub fn max_movie_id(&self) -> AppResult<i64> {
        let (header, rows) = self.raw_rows()?;
        let id_pos = column_position(&header, "movieId").unwrap_or(0);

        let mut max_id = 0i64;
        for row in rows {
            if let Some(id) = row.get(id_pos).and_then(|v| v.trim().parse::<i64>().ok()) {
                max_id = max_id.max(id);
            }
        }
        Ok(max_id)
    }

    /// Largest numeric `userId` present in the file, or 0.
    ///
    /// Base catalog rows carry the dataset's numeric rater ids; rows
    /// appended by this service carry document ids and are skipped. Used to
    /// seed the registration counter above the dataset's range.
    pub fn max_user_id(&self) -> AppResult<i64> {
        let (header, rows) = self.raw_rows()?;
        let user_pos = match column_position(&header, "userId") {
            Some(pos) => pos,
            None => return Ok(0),
        };

        let mut max_id = 0i64;
        for row in rows {
            if let Some(id) = row.get(user_pos).and_then(|v| v.trim().parse::<i64>().ok()) {
                max_id = max_id.max(id);
            }
        }
        Ok(max_id)
    }

    /// Appends one record, field order taken from the file's header.
    pub async fn append(&self, record: &CatalogRecord) -> AppResult<()> {
        let _guard = self.append_lock.lock().await;
        let header = self.header()?;

        let mut file = OpenOptions::new().read(true).append(true).open(&self.path)?;
        ensure_trailing_newline(&mut file)?;

        let mut writer = WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);
        let fields: Vec<String> = header.iter().map(|col| record.field(col)).collect();
        writer.write_record(&fields)?;
        writer.flush()?;

        Ok(())
    }

    /// Whole file contents, for the raw catalog download endpoint.
    pub fn read_to_string(&self) -> AppResult<String> {
        if !self.exists() {
            return Err(AppError::NotFound(
                "Fichier movies_enriched.csv introuvable".to_string(),
            ));
        }
        Ok(std::fs::read_to_string(&self.path)?)
    }
}

/// Index of a named column in a header row.
pub fn column_position(header: &StringRecord, name: &str) -> Option<usize> {
    header.iter().position(|col| col == name)
}

/// Legacy files were appended without a final newline; a raw append after one
/// of those would glue two rows together.
pub(crate) fn ensure_trailing_newline(file: &mut std::fs::File) -> std::io::Result<()> {
    let len = file.seek(SeekFrom::End(0))?;
    if len == 0 {
        return Ok(());
    }
    file.seek(SeekFrom::End(-1))?;
    let mut last = [0u8; 1];
    file.read_exact(&mut last)?;
    file.seek(SeekFrom::End(0))?;
    if last[0] != b'\n' {
        file.write_all(b"\n")?;
    }
    Ok(())
}
