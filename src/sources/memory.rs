use crate::error::{CaseTrackerError, Result};
use crate::repository::TableSource;
use crate::schema::RawTable;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Debug, Default)]
struct SheetState {
    worksheets: HashMap<String, RawTable>,
    unavailable: bool,
    fetches: usize,
    writes: usize,
}

/// In-process workbook. Clones share the same worksheets, so a test can keep
/// one handle while a repository owns another.
#[derive(Debug, Clone, Default)]
pub struct InMemorySheet {
    state: Arc<Mutex<SheetState>>,
}

impl InMemorySheet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_worksheet(worksheet: &str, table: RawTable) -> Self {
        let sheet = Self::new();
        sheet.put(worksheet, table);
        sheet
    }

    fn lock(&self) -> MutexGuard<'_, SheetState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn put(&self, worksheet: &str, table: RawTable) {
        self.lock().worksheets.insert(worksheet.to_string(), table);
    }

    pub fn get(&self, worksheet: &str) -> Option<RawTable> {
        self.lock().worksheets.get(worksheet).cloned()
    }

    /// While set, every fetch and overwrite fails as if the remote were down.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.lock().unavailable = unavailable;
    }

    pub fn fetch_count(&self) -> usize {
        self.lock().fetches
    }

    pub fn write_count(&self) -> usize {
        self.lock().writes
    }
}

impl TableSource for InMemorySheet {
    fn fetch(&self, worksheet: &str) -> Result<RawTable> {
        let mut state = self.lock();
        if state.unavailable {
            return Err(CaseTrackerError::unavailable(
                "fetch",
                format!("worksheet '{}' is unreachable", worksheet),
            ));
        }
        state.fetches += 1;
        Ok(state.worksheets.get(worksheet).cloned().unwrap_or_default())
    }

    fn overwrite(&self, worksheet: &str, table: &RawTable) -> Result<()> {
        let mut state = self.lock();
        if state.unavailable {
            return Err(CaseTrackerError::unavailable(
                "overwrite",
                format!("worksheet '{}' is unreachable", worksheet),
            ));
        }
        state.writes += 1;
        state.worksheets.insert(worksheet.to_string(), table.clone());
        Ok(())
    }

    fn describe(&self) -> String {
        "in-memory sheet".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_worksheet_reads_empty() {
        let sheet = InMemorySheet::new();
        let table = sheet.fetch("NACIONALIDADE").unwrap();
        assert!(table.is_empty());
    }

    #[test]
    fn test_clones_share_state() {
        let sheet = InMemorySheet::new();
        let other = sheet.clone();
        other
            .overwrite("S", &RawTable::from_strs(&["A"], &[&["1"]]))
            .unwrap();

        assert_eq!(sheet.get("S").unwrap().rows.len(), 1);
        assert_eq!(sheet.write_count(), 1);
    }

    #[test]
    fn test_unavailable_rejects_reads_and_writes() {
        let sheet = InMemorySheet::new();
        sheet.set_unavailable(true);

        assert!(sheet.fetch("S").unwrap_err().is_data_source_unavailable());
        assert!(sheet
            .overwrite("S", &RawTable::default())
            .unwrap_err()
            .is_data_source_unavailable());
        assert_eq!(sheet.fetch_count(), 0);
    }
}
