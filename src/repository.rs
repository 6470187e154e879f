use crate::calculator::apply_derived_fields;
use crate::error::{CaseTrackerError, Result};
use crate::normalizer::normalize_raw_table;
use crate::schema::{CaseRecord, CaseTable, MatchField, RawTable, RecordPatch};
use log::{debug, info, warn};

/// A remote worksheet read and written as whole snapshots.
pub trait TableSource {
    /// Fetches the current contents, bypassing any client-side cache.
    fn fetch(&self, worksheet: &str) -> Result<RawTable>;

    /// Replaces the worksheet's contents with `table`.
    fn overwrite(&self, worksheet: &str, table: &RawTable) -> Result<()>;

    fn describe(&self) -> String {
        std::any::type_name::<Self>().to_string()
    }
}

impl<T: TableSource + ?Sized> TableSource for &T {
    fn fetch(&self, worksheet: &str) -> Result<RawTable> {
        (**self).fetch(worksheet)
    }

    fn overwrite(&self, worksheet: &str, table: &RawTable) -> Result<()> {
        (**self).overwrite(worksheet, table)
    }

    fn describe(&self) -> String {
        (**self).describe()
    }
}

impl<T: TableSource + ?Sized> TableSource for Box<T> {
    fn fetch(&self, worksheet: &str) -> Result<RawTable> {
        (**self).fetch(worksheet)
    }

    fn overwrite(&self, worksheet: &str, table: &RawTable) -> Result<()> {
        (**self).overwrite(worksheet, table)
    }

    fn describe(&self) -> String {
        (**self).describe()
    }
}

fn into_unavailable(operation: &str, err: CaseTrackerError) -> CaseTrackerError {
    match err {
        err @ CaseTrackerError::DataSourceUnavailable { .. } => err,
        other => CaseTrackerError::unavailable(operation, other),
    }
}

/// Converts a raw snapshot into the typed working set.
pub fn build_table(raw: &RawTable) -> CaseTable {
    let normalized = normalize_raw_table(raw);
    let records = normalized
        .rows
        .iter()
        .map(|row| CaseRecord::from_row(&normalized.headers, row))
        .collect();
    CaseTable::new(normalized.headers, records)
}

/// `max(existing ids) + 1`, or 1 when no row carries an id. Fails when the
/// largest id is already `i64::MAX`.
pub fn next_id(table: &CaseTable) -> Result<i64> {
    match table.iter().filter_map(|record| record.id).max() {
        Some(max) => max.checked_add(1).ok_or_else(|| {
            CaseTrackerError::validation("id", format!("no id is available after {}", max))
        }),
        None => Ok(1),
    }
}

/// Returns a copy of `table` with `record` at the end.
pub fn append(table: &CaseTable, record: CaseRecord) -> CaseTable {
    let mut updated = table.clone();
    updated.records.push(record);
    updated
}

/// Applies `patch` to every row where `field == value` and re-derives the
/// balance on each. Duplicate matches are all updated.
pub fn update_where(
    table: &CaseTable,
    field: MatchField,
    value: &str,
    patch: &RecordPatch,
) -> CaseTable {
    let mut updated = table.clone();
    for record in updated
        .records
        .iter_mut()
        .filter(|record| field.matches(record, value))
    {
        patch.apply_to(record);
        apply_derived_fields(record);
    }
    updated
}

/// Returns a copy of `table` without the rows where `field == value`.
pub fn delete_where(table: &CaseTable, field: MatchField, value: &str) -> CaseTable {
    let records = table
        .records
        .iter()
        .filter(|record| !field.matches(record, value))
        .cloned()
        .collect();
    CaseTable::new(table.columns.clone(), records)
}

/// Loads and persists the case sheet. Every `load` goes to the source; the
/// last loaded snapshot is kept only until [`RecordRepository::invalidate`].
///
/// Saves are last-write-wins: whatever another session wrote since this
/// session's load is overwritten.
pub struct RecordRepository<S: TableSource> {
    source: S,
    worksheet: String,
    snapshot: Option<CaseTable>,
}

impl<S: TableSource> RecordRepository<S> {
    pub fn new(source: S, worksheet: impl Into<String>) -> Self {
        Self {
            source,
            worksheet: worksheet.into(),
            snapshot: None,
        }
    }

    pub fn worksheet(&self) -> &str {
        &self.worksheet
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn load(&mut self) -> Result<CaseTable> {
        let raw = self
            .source
            .fetch(&self.worksheet)
            .map_err(|e| into_unavailable("load", e))?;

        let table = build_table(&raw);
        info!(
            "Loaded {} case record(s) from '{}' ({})",
            table.len(),
            self.worksheet,
            self.source.describe()
        );
        let missing = table.missing_columns();
        if !missing.is_empty() {
            debug!("Sheet '{}' lacks columns: {:?}", self.worksheet, missing);
        }

        self.snapshot = Some(table.clone());
        Ok(table)
    }

    /// The table from the last successful load, if not invalidated since.
    pub fn snapshot(&self) -> Option<&CaseTable> {
        self.snapshot.as_ref()
    }

    /// Writes the whole table back, replacing the worksheet.
    pub fn save(&mut self, table: &CaseTable) -> Result<()> {
        let raw = table.to_raw();
        self.source
            .overwrite(&self.worksheet, &raw)
            .map_err(|e| into_unavailable("save", e))?;

        info!(
            "Saved {} case record(s) to '{}' ({} columns)",
            raw.rows.len(),
            self.worksheet,
            raw.headers.len()
        );
        Ok(())
    }

    pub fn invalidate(&mut self) {
        if self.snapshot.take().is_some() {
            debug!("Invalidated cached snapshot of '{}'", self.worksheet);
        }
    }
}

/// Logs when a natural-key lookup hits more than one row. The first match
/// is still the one used.
pub(crate) fn warn_if_ambiguous(table: &CaseTable, field: MatchField, value: &str) -> usize {
    let matches = table.count_matches(field, value);
    if matches > 1 {
        warn!(
            "{} rows share {} = '{}'; all of them will be affected",
            matches,
            field.column(),
            value
        );
    }
    matches
}
