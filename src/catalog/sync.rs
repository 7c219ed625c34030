use std::collections::HashMap;
use std::fs::OpenOptions;
use std::path::Path;

use csv::WriterBuilder;

use crate::error::{AppError, AppResult};
use crate::models::format_rating;
use crate::store::Store;

use super::file::{column_position, ensure_trailing_newline, CatalogFile};

/// Outcome of one synchronization run.
///
/// `orphans_dropped` counts ratings that referenced a film with neither a
/// base catalog row nor a custom-movie record; they are absent from the
/// derived file but never silently so.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub base_rows: usize,
    pub appended: usize,
    pub synthesized: usize,
    pub orphans_dropped: usize,
}

/// Rebuilds the derived catalog: a verbatim copy of the base file followed by
/// one row per (rating event, movie).
///
/// Matched ratings re-emit the movie's base row with only the `userId` and
/// `rating` fields rewritten. Ratings for movies missing from the base file
/// are synthesized from the custom-movie store. A missing base file aborts
/// the whole run with no partial output.
pub async fn sync_catalog(
    base: &CatalogFile,
    derived_path: &Path,
    store: &Store,
) -> AppResult<SyncReport> {
    if !base.exists() {
        return Err(AppError::NotFound(format!(
            "Base catalog not found: {}",
            base.path().display()
        )));
    }

    std::fs::copy(base.path(), derived_path)?;

    let (header, rows) = base.raw_rows()?;
    let user_pos = column_position(&header, "userId").unwrap_or(header.len() - 2);
    let rating_pos = column_position(&header, "rating").unwrap_or(header.len() - 1);

    // Last row wins for a given id, matching scan order.
    let mut rows_by_id: HashMap<String, &csv::StringRecord> = HashMap::new();
    for row in &rows {
        if let Some(id) = row.get(0) {
            if !id.is_empty() {
                rows_by_id.insert(id.to_string(), row);
            }
        }
    }

    let mut report = SyncReport {
        base_rows: rows.len(),
        ..Default::default()
    };

    let mut file = OpenOptions::new()
        .read(true)
        .append(true)
        .open(derived_path)?;
    ensure_trailing_newline(&mut file)?;
    let mut writer = WriterBuilder::new().has_headers(false).from_writer(file);

    for (user, ratings) in store.all_ratings().await {
        let user_key = user.to_string();

        // One line per film even if the document carries stale duplicates.
        let mut unique: HashMap<i64, f64> = HashMap::new();
        for entry in &ratings {
            unique.insert(entry.film_id, entry.note);
        }

        for (film_id, note) in unique {
            match rows_by_id.get(&film_id.to_string()) {
                Some(source) => {
                    let mut fields: Vec<String> =
                        source.iter().map(String::from).collect();
                    fields.resize(header.len(), String::new());
                    fields[user_pos] = user_key.clone();
                    fields[rating_pos] = format_rating(note);
                    writer.write_record(&fields)?;
                    report.appended += 1;
                }
                None => match store.custom_movie_by_id(film_id).await {
                    Some(movie) => {
                        let record = movie.to_catalog_record(&user_key, note);
                        let fields: Vec<String> =
                            header.iter().map(|col| record.field(col)).collect();
                        writer.write_record(&fields)?;
                        report.synthesized += 1;
                    }
                    None => {
                        report.orphans_dropped += 1;
                        tracing::warn!(
                            film_id,
                            user = %user_key,
                            "Rating references a film with no catalog or custom record"
                        );
                    }
                },
            }
        }
    }

    writer.flush()?;

    if report.orphans_dropped > 0 {
        tracing::warn!(
            orphans = report.orphans_dropped,
            "Orphaned ratings were left out of the derived catalog"
        );
    }
    tracing::info!(
        base_rows = report.base_rows,
        appended = report.appended,
        synthesized = report.synthesized,
        "Catalog synchronization finished"
    );

    Ok(report)
}
