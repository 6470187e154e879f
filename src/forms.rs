//! Form models for the inclusion and management views.
//!
//! The UI collects these, the tracker validates and applies them. Neither
//! form carries a balance field: the balance is always derived.

use crate::calculator::{apply_derived_fields, compute_balance};
use crate::error::{CaseTrackerError, Result};
use crate::schema::{CaseRecord, CaseStatus, CaseTable, RecordPatch, ARTIGO_CHOICES};
use crate::utils::{check_amount, clean_value, format_birth_date, validate_birth_date};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

fn optional_text(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InclusionForm {
    pub requerente: String,
    #[serde(default)]
    pub cliente: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub aniversario: Option<NaiveDate>,
    pub artigo: String,
    #[serde(default)]
    pub status: CaseStatus,
    #[serde(default)]
    pub valor_honorarios: f64,
    #[serde(default)]
    pub valor_pago: f64,
    #[serde(default)]
    pub observacoes: String,
}

impl Default for InclusionForm {
    fn default() -> Self {
        Self {
            requerente: String::new(),
            cliente: String::new(),
            email: String::new(),
            aniversario: None,
            artigo: ARTIGO_CHOICES[0].to_string(),
            status: CaseStatus::default(),
            valor_honorarios: 0.0,
            valor_pago: 0.0,
            observacoes: String::new(),
        }
    }
}

impl InclusionForm {
    /// Checks run before anything is loaded or written.
    pub fn validate(&self, today: NaiveDate) -> Result<()> {
        if self.requerente.trim().is_empty() {
            return Err(CaseTrackerError::validation(
                "requerente",
                "applicant name is required",
            ));
        }
        if let Some(date) = self.aniversario {
            validate_birth_date(date, today)?;
        }
        check_amount("valor_honorarios", self.valor_honorarios)?;
        check_amount("valor_pago", self.valor_pago)?;
        Ok(())
    }

    /// The row to append, with the given id and a derived balance.
    pub fn to_record(&self, id: i64) -> CaseRecord {
        let mut record = CaseRecord {
            id: Some(id),
            requerente: self.requerente.trim().to_string(),
            cliente: optional_text(&self.cliente),
            email: optional_text(&self.email),
            aniversario: self.aniversario.map(format_birth_date),
            artigo: optional_text(&self.artigo),
            status: Some(self.status.label().to_string()),
            valor_honorarios: Some(self.valor_honorarios),
            valor_pago: Some(self.valor_pago),
            saldo_devedor: None,
            observacoes: optional_text(&self.observacoes),
            extra: Default::default(),
        };
        apply_derived_fields(&mut record);
        record
    }
}

/// Edit form, pre-populated from the first record matching the selected
/// applicant. Every editable field is written back on save.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManagementForm {
    pub id: Option<i64>,
    pub requerente: String,
    pub cliente: String,
    pub email: String,
    /// Free text, stored as typed.
    pub aniversario: String,
    pub status: CaseStatus,
    pub valor_honorarios: f64,
    pub valor_pago: f64,
    pub observacoes: String,
}

impl ManagementForm {
    pub fn from_record(record: &CaseRecord) -> Self {
        let text = |value: &Option<String>| clean_value(value.as_deref().unwrap_or(""));

        Self {
            id: record.id,
            requerente: record.requerente.clone(),
            cliente: text(&record.cliente),
            email: text(&record.email),
            aniversario: text(&record.aniversario),
            status: CaseStatus::from_label(record.status_text()).unwrap_or_default(),
            valor_honorarios: record.fees(),
            valor_pago: record.paid(),
            observacoes: text(&record.observacoes),
        }
    }

    /// Balance shown next to the form while editing.
    pub fn computed_balance(&self) -> f64 {
        compute_balance(self.valor_honorarios, self.valor_pago)
    }

    pub fn validate(&self) -> Result<()> {
        check_amount("valor_honorarios", self.valor_honorarios)?;
        check_amount("valor_pago", self.valor_pago)?;
        Ok(())
    }

    pub fn to_patch(&self) -> RecordPatch {
        RecordPatch {
            requerente: None,
            cliente: Some(self.cliente.trim().to_string()),
            email: Some(self.email.trim().to_string()),
            aniversario: Some(self.aniversario.trim().to_string()),
            artigo: None,
            status: Some(self.status.label().to_string()),
            valor_honorarios: Some(self.valor_honorarios),
            valor_pago: Some(self.valor_pago),
            observacoes: Some(self.observacoes.trim().to_string()),
        }
    }
}

/// Sorted, de-duplicated applicant names for the management select box.
pub fn applicant_names(table: &CaseTable) -> Vec<String> {
    table
        .iter()
        .map(|record| record.requerente.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
    }

    #[test]
    fn test_inclusion_requires_applicant() {
        let form = InclusionForm {
            requerente: "   ".to_string(),
            ..Default::default()
        };
        let err = form.validate(today()).unwrap_err();
        assert!(matches!(err, CaseTrackerError::ValidationError { ref field, .. } if field == "requerente"));
    }

    #[test]
    fn test_inclusion_rejects_future_birth_date_and_negative_amounts() {
        let future = InclusionForm {
            requerente: "Ana".to_string(),
            aniversario: NaiveDate::from_ymd_opt(2024, 6, 2),
            ..Default::default()
        };
        assert!(matches!(
            future.validate(today()),
            Err(CaseTrackerError::InvalidBirthDate(_))
        ));

        let negative = InclusionForm {
            requerente: "Ana".to_string(),
            valor_pago: -1.0,
            ..Default::default()
        };
        assert!(negative.validate(today()).is_err());
    }

    #[test]
    fn test_inclusion_to_record_derives_balance() {
        let form = InclusionForm {
            requerente: " Ana Souza ".to_string(),
            email: "ana@example.com".to_string(),
            aniversario: NaiveDate::from_ymd_opt(1985, 3, 15),
            status: CaseStatus::EmAnalise,
            valor_honorarios: 1000.0,
            valor_pago: 300.0,
            ..Default::default()
        };
        assert!(form.validate(today()).is_ok());

        let record = form.to_record(8);

        assert_eq!(record.id, Some(8));
        assert_eq!(record.requerente, "Ana Souza");
        assert_eq!(record.aniversario.as_deref(), Some("15/03/1985"));
        assert_eq!(record.status.as_deref(), Some("EM ANÁLISE"));
        assert_eq!(record.artigo.as_deref(), Some(ARTIGO_CHOICES[0]));
        assert_eq!(record.cliente, None);
        assert_eq!(record.saldo_devedor, Some(700.0));
    }

    #[test]
    fn test_management_form_prefill_cleans_values() {
        let record = CaseRecord {
            id: Some(3),
            requerente: "Bia".to_string(),
            cliente: Some("nan".to_string()),
            status: Some(" diligência ".to_string()),
            valor_honorarios: Some(500.0),
            ..Default::default()
        };

        let form = ManagementForm::from_record(&record);

        assert_eq!(form.cliente, "");
        assert_eq!(form.email, "");
        assert_eq!(form.status, CaseStatus::Diligencia);
        assert_eq!(form.valor_pago, 0.0);
        assert_eq!(form.computed_balance(), 500.0);
    }

    #[test]
    fn test_management_form_unknown_status_defaults_to_submitted() {
        let record = CaseRecord {
            requerente: "Caio".to_string(),
            status: Some("ARQUIVADO".to_string()),
            ..Default::default()
        };
        assert_eq!(ManagementForm::from_record(&record).status, CaseStatus::Submetido);
    }

    #[test]
    fn test_to_patch_writes_all_editable_fields() {
        let form = ManagementForm {
            id: Some(1),
            requerente: "Ana".to_string(),
            cliente: "Cliente X".to_string(),
            email: String::new(),
            aniversario: "01/02/1990".to_string(),
            status: CaseStatus::Concluido,
            valor_honorarios: 1200.0,
            valor_pago: 1200.0,
            observacoes: "ok".to_string(),
        };

        let patch = form.to_patch();

        assert_eq!(patch.requerente, None);
        assert_eq!(patch.email.as_deref(), Some(""));
        assert_eq!(patch.status.as_deref(), Some("CONCLUÍDO"));
        assert_eq!(patch.valor_pago, Some(1200.0));
    }

    #[test]
    fn test_applicant_names_sorted_unique() {
        let table = CaseTable::new(
            vec!["REQUERENTE".to_string()],
            ["Caio", "Ana", "Caio", "Bia"]
                .iter()
                .map(|name| CaseRecord {
                    requerente: name.to_string(),
                    ..Default::default()
                })
                .collect(),
        );

        assert_eq!(applicant_names(&table), vec!["Ana", "Bia", "Caio"]);
    }
}
