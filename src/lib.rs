//! # Nationality Case Tracker
//!
//! Record normalization, upsert and dashboard metrics for a case sheet that
//! tracks nationality applications. The sheet lives in a remote store that is
//! read and written as whole snapshots; this crate turns a raw snapshot into
//! typed records, applies create/update/delete on copies, and writes the
//! entire table back.
//!
//! ## Core Concepts
//!
//! - **Column normalization**: hand-typed headers (`"Valor Honorários"`,
//!   `"e-Mail"`) map to canonical names (`VALOR_HONORARIOS`, `E_MAIL`); a
//!   decorative "CONTROLE" banner row above the headers is skipped
//! - **Full-table overwrite**: every mutation saves the whole table, last
//!   writer wins
//! - **Derived balance**: `saldo_devedor = valor_honorarios - valor_pago`,
//!   recomputed on every create and update
//! - **Graceful schema drift**: missing columns read as zero/empty
//!
//! ## Example
//!
//! ```rust,ignore
//! use nationality_case_tracker::*;
//! use chrono::NaiveDate;
//!
//! let sheet = InMemorySheet::with_worksheet(
//!     "NACIONALIDADE",
//!     RawTable::from_strs(
//!         &["ID", "Requerente", "Status", "Valor Honorários", "Valor Pago"],
//!         &[&["1", "Ana", "SUBMETIDO", "1000", "250"]],
//!     ),
//! );
//! let mut tracker = CaseTracker::new(sheet, "NACIONALIDADE");
//!
//! let created = tracker
//!     .include(
//!         &InclusionForm {
//!             requerente: "Bia".to_string(),
//!             valor_honorarios: 1000.0,
//!             valor_pago: 300.0,
//!             ..Default::default()
//!         },
//!         NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
//!     )
//!     .unwrap();
//! assert_eq!(created.id, Some(2));
//!
//! let metrics = tracker.dashboard().unwrap();
//! assert_eq!(metrics.total_count, 2);
//! ```

pub mod calculator;
pub mod config;
pub mod error;
pub mod forms;
pub mod metrics;
pub mod normalizer;
pub mod repository;
pub mod schema;
pub mod sources;
pub mod utils;

pub use calculator::{apply_derived_fields, compute_balance, compute_balance_from_text};
pub use config::{SourceConfig, TrackerConfig};
pub use error::{CaseTrackerError, ErrorCategory, Result};
pub use forms::*;
pub use metrics::*;
pub use normalizer::{is_title_row, normalize_header, normalize_headers, normalize_raw_table};
pub use repository::{
    append, build_table, delete_where, next_id, update_where, RecordRepository, TableSource,
};
pub use schema::*;
pub use sources::*;
pub use utils::*;

use chrono::NaiveDate;
use log::{debug, info};
use repository::warn_if_ambiguous;

/// One method per UI interaction. Each call runs a complete
/// load → compute/mutate → save → invalidate cycle against the injected
/// source; nothing is carried between calls except the repository.
pub struct CaseTracker<S: TableSource> {
    repository: RecordRepository<S>,
}

impl<S: TableSource> CaseTracker<S> {
    pub fn new(source: S, worksheet: impl Into<String>) -> Self {
        Self {
            repository: RecordRepository::new(source, worksheet),
        }
    }

    pub fn from_repository(repository: RecordRepository<S>) -> Self {
        Self { repository }
    }

    pub fn repository(&self) -> &RecordRepository<S> {
        &self.repository
    }

    pub fn load(&mut self) -> Result<CaseTable> {
        self.repository.load()
    }

    pub fn dashboard(&mut self) -> Result<DashboardMetrics> {
        let table = self.repository.load()?;
        let metrics = project_metrics(&table);
        debug!(
            "Dashboard: {} total, {} completed, paid {}, outstanding {}",
            metrics.total_count,
            metrics.completed_count,
            metrics.total_paid,
            metrics.total_outstanding
        );
        Ok(metrics)
    }

    /// Id the next inclusion will receive.
    pub fn next_id(&mut self) -> Result<i64> {
        let table = self.repository.load()?;
        next_id(&table)
    }

    /// Names offered by the management lookup.
    pub fn applicant_names(&mut self) -> Result<Vec<String>> {
        let table = self.repository.load()?;
        Ok(applicant_names(&table))
    }

    /// Validates, assigns the next id, appends and saves.
    pub fn include(&mut self, form: &InclusionForm, today: NaiveDate) -> Result<CaseRecord> {
        form.validate(today)?;

        let table = self.repository.load()?;
        let id = next_id(&table)?;
        let record = form.to_record(id);
        let updated = append(&table, record.clone());

        self.repository.save(&updated)?;
        self.repository.invalidate();

        info!("Created record {} ({})", id, record.requerente);
        Ok(record)
    }

    /// Edit form for the first record with this applicant name.
    pub fn edit_form(&mut self, requerente: &str) -> Result<ManagementForm> {
        let table = self.repository.load()?;
        let record = table
            .find_first(MatchField::Requerente, requerente)
            .ok_or_else(|| not_found(requerente))?;
        Ok(ManagementForm::from_record(record))
    }

    /// Rewrites every record with this applicant name. Returns how many rows
    /// changed.
    pub fn update(&mut self, requerente: &str, form: &ManagementForm) -> Result<usize> {
        form.validate()?;
        self.update_where(MatchField::Requerente, requerente, &form.to_patch())
    }

    pub fn update_where(
        &mut self,
        field: MatchField,
        value: &str,
        patch: &RecordPatch,
    ) -> Result<usize> {
        patch.validate()?;

        let table = self.repository.load()?;
        let matches = warn_if_ambiguous(&table, field, value);
        if matches == 0 {
            return Err(CaseTrackerError::RecordNotFound {
                field: field.column().to_string(),
                value: value.to_string(),
            });
        }

        let updated = update_where(&table, field, value, patch);
        self.repository.save(&updated)?;
        self.repository.invalidate();

        info!("Updated {} record(s) where {} = '{}'", matches, field.column(), value);
        Ok(matches)
    }

    /// Removes every record with this applicant name. Returns how many rows
    /// were removed.
    pub fn delete(&mut self, requerente: &str) -> Result<usize> {
        self.delete_where(MatchField::Requerente, requerente)
    }

    pub fn delete_where(&mut self, field: MatchField, value: &str) -> Result<usize> {
        let table = self.repository.load()?;
        let matches = warn_if_ambiguous(&table, field, value);
        if matches == 0 {
            return Err(CaseTrackerError::RecordNotFound {
                field: field.column().to_string(),
                value: value.to_string(),
            });
        }

        let updated = delete_where(&table, field, value);
        self.repository.save(&updated)?;
        self.repository.invalidate();

        info!("Deleted {} record(s) where {} = '{}'", matches, field.column(), value);
        Ok(matches)
    }
}

impl CaseTracker<Box<dyn TableSource>> {
    pub fn from_config(config: &TrackerConfig) -> Result<Self> {
        config.validate()?;
        let source = config.build_source()?;
        info!(
            "Using {} for worksheet '{}'",
            source.describe(),
            config.worksheet
        );
        Ok(Self::new(source, config.worksheet.clone()))
    }
}

fn not_found(requerente: &str) -> CaseTrackerError {
    CaseTrackerError::RecordNotFound {
        field: schema::CanonicalColumn::Requerente.to_string(),
        value: requerente.to_string(),
    }
}
