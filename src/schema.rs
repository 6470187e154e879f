use crate::error::{CaseTrackerError, Result};
use crate::utils::{check_amount, clean_value, coerce_decimal, format_number, parse_id};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Legal-basis choices offered by the inclusion form. Stored values are free
/// text, so older short labels ("Neto", "Filho") still load unchanged.
pub const ARTIGO_CHOICES: [&str; 4] = [
    "Art. 1º, nº1, al. d (neto)",
    "Art. 1º, nº1, al. c (filho)",
    "Casamento",
    "Outros",
];

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash, JsonSchema)]
pub enum CaseStatus {
    #[serde(rename = "SUBMETIDO")]
    #[schemars(description = "Application filed, awaiting registry intake")]
    Submetido,

    #[serde(rename = "EM ANÁLISE")]
    #[schemars(description = "Registry is examining the application")]
    EmAnalise,

    #[serde(rename = "DILIGÊNCIA")]
    #[schemars(description = "Registry requested additional documents or corrections")]
    Diligencia,

    #[serde(rename = "DECISÃO")]
    #[schemars(description = "A decision has been issued but the case is not closed")]
    Decisao,

    #[serde(rename = "CONCLUÍDO")]
    #[schemars(description = "Case closed")]
    Concluido,
}

impl CaseStatus {
    /// Workflow order. Transitions are not enforced.
    pub const ALL: [CaseStatus; 5] = [
        CaseStatus::Submetido,
        CaseStatus::EmAnalise,
        CaseStatus::Diligencia,
        CaseStatus::Decisao,
        CaseStatus::Concluido,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            CaseStatus::Submetido => "SUBMETIDO",
            CaseStatus::EmAnalise => "EM ANÁLISE",
            CaseStatus::Diligencia => "DILIGÊNCIA",
            CaseStatus::Decisao => "DECISÃO",
            CaseStatus::Concluido => "CONCLUÍDO",
        }
    }

    /// Matches a stored status after trimming and upper-casing.
    pub fn from_label(raw: &str) -> Option<Self> {
        let wanted = raw.trim().to_uppercase();
        Self::ALL.into_iter().find(|status| status.label() == wanted)
    }

    /// Position in the workflow, used to pre-select the status widget.
    pub fn index(&self) -> usize {
        Self::ALL
            .iter()
            .position(|status| status == self)
            .unwrap_or_default()
    }
}

impl Default for CaseStatus {
    fn default() -> Self {
        Self::Submetido
    }
}

impl std::fmt::Display for CaseStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Columns the record type models. Any other normalized header is carried
/// through untouched in [`CaseRecord::extra`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash, JsonSchema)]
pub enum CanonicalColumn {
    Id,
    Requerente,
    Cliente,
    Email,
    Aniversario,
    Artigo,
    Status,
    ValorHonorarios,
    ValorPago,
    SaldoDevedor,
    Observacoes,
}

impl CanonicalColumn {
    pub const ALL: [CanonicalColumn; 11] = [
        CanonicalColumn::Id,
        CanonicalColumn::Requerente,
        CanonicalColumn::Cliente,
        CanonicalColumn::Email,
        CanonicalColumn::Aniversario,
        CanonicalColumn::Artigo,
        CanonicalColumn::Status,
        CanonicalColumn::ValorHonorarios,
        CanonicalColumn::ValorPago,
        CanonicalColumn::SaldoDevedor,
        CanonicalColumn::Observacoes,
    ];

    pub fn header(&self) -> &'static str {
        match self {
            CanonicalColumn::Id => "ID",
            CanonicalColumn::Requerente => "REQUERENTE",
            CanonicalColumn::Cliente => "CLIENTE",
            CanonicalColumn::Email => "E_MAIL",
            CanonicalColumn::Aniversario => "ANIVERSARIO",
            CanonicalColumn::Artigo => "ARTIGO",
            CanonicalColumn::Status => "STATUS",
            CanonicalColumn::ValorHonorarios => "VALOR_HONORARIOS",
            CanonicalColumn::ValorPago => "VALOR_PAGO",
            CanonicalColumn::SaldoDevedor => "SALDO_DEVEDOR",
            CanonicalColumn::Observacoes => "OBSERVACOES",
        }
    }

    /// Resolves an already-normalized header.
    pub fn from_header(header: &str) -> Option<Self> {
        match header {
            "EMAIL" => Some(CanonicalColumn::Email),
            _ => Self::ALL.into_iter().find(|column| column.header() == header),
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            CanonicalColumn::Id
                | CanonicalColumn::ValorHonorarios
                | CanonicalColumn::ValorPago
                | CanonicalColumn::SaldoDevedor
        )
    }
}

impl std::fmt::Display for CanonicalColumn {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.header())
    }
}

/// A full-sheet snapshot as the remote store hands it over: the first sheet
/// row as headers, every other row as text cells. Empty cells are `""`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl RawTable {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self { headers, rows }
    }

    pub fn from_strs(headers: &[&str], rows: &[&[&str]]) -> Self {
        Self {
            headers: headers.iter().map(|h| h.to_string()).collect(),
            rows: rows
                .iter()
                .map(|row| row.iter().map(|cell| cell.to_string()).collect())
                .collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.headers.is_empty() && self.rows.is_empty()
    }
}

/// One case row. Columns the sheet does not carry stay `None`; numeric
/// accessors read those as zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct CaseRecord {
    #[schemars(description = "Sequential id, max existing + 1 at creation. None when the cell is blank or not numeric.")]
    pub id: Option<i64>,

    #[schemars(description = "Applicant name. Natural key for lookup; uniqueness is not enforced.")]
    pub requerente: String,

    pub cliente: Option<String>,

    pub email: Option<String>,

    #[schemars(description = "Birth date as text in DD/MM/YYYY format")]
    pub aniversario: Option<String>,

    #[schemars(description = "Legal basis category, e.g. 'Art. 1º, nº1, al. d (neto)' or 'Casamento'")]
    pub artigo: Option<String>,

    #[schemars(description = "Workflow stage as stored in the sheet (free text, may carry annotations)")]
    pub status: Option<String>,

    pub valor_honorarios: Option<f64>,

    pub valor_pago: Option<f64>,

    #[schemars(description = "Balance due. Recomputed as fees minus paid on every create/update.")]
    pub saldo_devedor: Option<f64>,

    pub observacoes: Option<String>,

    #[serde(default)]
    #[schemars(description = "Cells of columns the record type does not model, keyed by normalized header")]
    pub extra: BTreeMap<String, String>,
}

impl CaseRecord {
    pub fn fees(&self) -> f64 {
        self.valor_honorarios.unwrap_or(0.0)
    }

    pub fn paid(&self) -> f64 {
        self.valor_pago.unwrap_or(0.0)
    }

    pub fn balance(&self) -> f64 {
        self.saldo_devedor.unwrap_or(0.0)
    }

    pub fn status_text(&self) -> &str {
        self.status.as_deref().unwrap_or("")
    }

    /// Builds a record from one row of a normalized table. Numeric columns
    /// that are present but unparseable coerce to zero; absent ones stay `None`.
    pub fn from_row(headers: &[String], row: &[String]) -> Self {
        let mut record = CaseRecord::default();

        for (idx, header) in headers.iter().enumerate() {
            let cell = row.get(idx).map(String::as_str).unwrap_or("");
            match CanonicalColumn::from_header(header) {
                Some(column) => record.set_cell(column, cell),
                None => {
                    record.extra.insert(header.clone(), cell.to_string());
                }
            }
        }

        record
    }

    fn set_cell(&mut self, column: CanonicalColumn, cell: &str) {
        let text = || {
            let cleaned = clean_value(cell);
            if cleaned.is_empty() {
                None
            } else {
                Some(cleaned)
            }
        };

        match column {
            CanonicalColumn::Id => self.id = parse_id(cell),
            CanonicalColumn::Requerente => self.requerente = clean_value(cell).trim().to_string(),
            CanonicalColumn::Cliente => self.cliente = text(),
            CanonicalColumn::Email => self.email = text(),
            CanonicalColumn::Aniversario => self.aniversario = text(),
            CanonicalColumn::Artigo => self.artigo = text(),
            CanonicalColumn::Status => self.status = text(),
            CanonicalColumn::ValorHonorarios => self.valor_honorarios = Some(coerce_decimal(cell)),
            CanonicalColumn::ValorPago => self.valor_pago = Some(coerce_decimal(cell)),
            CanonicalColumn::SaldoDevedor => self.saldo_devedor = Some(coerce_decimal(cell)),
            CanonicalColumn::Observacoes => self.observacoes = text(),
        }
    }

    pub fn get(&self, column: CanonicalColumn) -> Option<String> {
        match column {
            CanonicalColumn::Id => self.id.map(|id| id.to_string()),
            CanonicalColumn::Requerente => Some(self.requerente.clone()),
            CanonicalColumn::Cliente => self.cliente.clone(),
            CanonicalColumn::Email => self.email.clone(),
            CanonicalColumn::Aniversario => self.aniversario.clone(),
            CanonicalColumn::Artigo => self.artigo.clone(),
            CanonicalColumn::Status => self.status.clone(),
            CanonicalColumn::ValorHonorarios => self.valor_honorarios.map(format_number),
            CanonicalColumn::ValorPago => self.valor_pago.map(format_number),
            CanonicalColumn::SaldoDevedor => self.saldo_devedor.map(format_number),
            CanonicalColumn::Observacoes => self.observacoes.clone(),
        }
    }

    pub fn to_row(&self, headers: &[String]) -> Vec<String> {
        headers
            .iter()
            .map(|header| match CanonicalColumn::from_header(header) {
                Some(column) => self.get(column).unwrap_or_default(),
                None => self.extra.get(header).cloned().unwrap_or_default(),
            })
            .collect()
    }
}

/// The normalized, filtered working set. `columns` keeps the sheet's column
/// order so a full-table save writes the same layout back.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CaseTable {
    pub columns: Vec<String>,
    pub records: Vec<CaseRecord>,
}

impl CaseTable {
    pub fn new(columns: Vec<String>, records: Vec<CaseRecord>) -> Self {
        Self { columns, records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, CaseRecord> {
        self.records.iter()
    }

    pub fn has_column(&self, column: CanonicalColumn) -> bool {
        self.columns
            .iter()
            .any(|header| CanonicalColumn::from_header(header) == Some(column))
    }

    pub fn missing_columns(&self) -> Vec<CanonicalColumn> {
        CanonicalColumn::ALL
            .into_iter()
            .filter(|column| !self.has_column(*column))
            .collect()
    }

    /// First record matching, mirroring the select-by-name lookup.
    pub fn find_first(&self, field: MatchField, value: &str) -> Option<&CaseRecord> {
        self.records.iter().find(|record| field.matches(record, value))
    }

    pub fn count_matches(&self, field: MatchField, value: &str) -> usize {
        self.records
            .iter()
            .filter(|record| field.matches(record, value))
            .count()
    }

    /// Columns written on save: the loaded layout, followed by any modelled
    /// column a record populates that the sheet did not have yet.
    pub fn output_columns(&self) -> Vec<String> {
        let mut columns = self.columns.clone();
        for column in CanonicalColumn::ALL {
            if self.has_column(column) {
                continue;
            }
            if self.records.iter().any(|record| record.get(column).is_some()) {
                columns.push(column.header().to_string());
            }
        }
        columns
    }

    pub fn to_raw(&self) -> RawTable {
        let headers = self.output_columns();
        let rows = self
            .records
            .iter()
            .map(|record| record.to_row(&headers))
            .collect();
        RawTable { headers, rows }
    }
}

impl<'a> IntoIterator for &'a CaseTable {
    type Item = &'a CaseRecord;
    type IntoIter = std::slice::Iter<'a, CaseRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

/// Field used to address rows in update/delete.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum MatchField {
    Id,
    Requerente,
    Cliente,
    Email,
    Status,
    Artigo,
}

impl MatchField {
    /// Exact comparison on the stored value. Ids compare numerically.
    pub fn matches(&self, record: &CaseRecord, value: &str) -> bool {
        match self {
            MatchField::Id => record.id.is_some() && record.id == parse_id(value),
            MatchField::Requerente => record.requerente == value,
            MatchField::Cliente => record.cliente.as_deref() == Some(value),
            MatchField::Email => record.email.as_deref() == Some(value),
            MatchField::Status => record.status.as_deref() == Some(value),
            MatchField::Artigo => record.artigo.as_deref() == Some(value),
        }
    }

    pub fn column(&self) -> CanonicalColumn {
        match self {
            MatchField::Id => CanonicalColumn::Id,
            MatchField::Requerente => CanonicalColumn::Requerente,
            MatchField::Cliente => CanonicalColumn::Cliente,
            MatchField::Email => CanonicalColumn::Email,
            MatchField::Status => CanonicalColumn::Status,
            MatchField::Artigo => CanonicalColumn::Artigo,
        }
    }
}

/// Field → value changes applied to every matching row. There is no
/// `saldo_devedor` field; the balance is always derived.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct RecordPatch {
    #[serde(default)]
    pub requerente: Option<String>,
    #[serde(default)]
    pub cliente: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub aniversario: Option<String>,
    #[serde(default)]
    pub artigo: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub valor_honorarios: Option<f64>,
    #[serde(default)]
    pub valor_pago: Option<f64>,
    #[serde(default)]
    pub observacoes: Option<String>,
}

impl RecordPatch {
    pub fn is_empty(&self) -> bool {
        self == &RecordPatch::default()
    }

    /// A set `requerente` must not be blank; set amounts must be finite and
    /// non-negative.
    pub fn validate(&self) -> Result<()> {
        if let Some(requerente) = &self.requerente {
            if requerente.trim().is_empty() {
                return Err(CaseTrackerError::validation(
                    "requerente",
                    "applicant name is required",
                ));
            }
        }
        if let Some(fees) = self.valor_honorarios {
            check_amount("valor_honorarios", fees)?;
        }
        if let Some(paid) = self.valor_pago {
            check_amount("valor_pago", paid)?;
        }
        Ok(())
    }

    /// Writes every set field onto `record`. Text fields set to `""` clear
    /// the cell.
    pub fn apply_to(&self, record: &mut CaseRecord) {
        fn text(value: &str) -> Option<String> {
            if value.is_empty() {
                None
            } else {
                Some(value.to_string())
            }
        }

        if let Some(requerente) = &self.requerente {
            record.requerente = requerente.trim().to_string();
        }
        if let Some(cliente) = &self.cliente {
            record.cliente = text(cliente);
        }
        if let Some(email) = &self.email {
            record.email = text(email);
        }
        if let Some(aniversario) = &self.aniversario {
            record.aniversario = text(aniversario);
        }
        if let Some(artigo) = &self.artigo {
            record.artigo = text(artigo);
        }
        if let Some(status) = &self.status {
            record.status = text(status);
        }
        if let Some(fees) = self.valor_honorarios {
            record.valor_honorarios = Some(fees);
        }
        if let Some(paid) = self.valor_pago {
            record.valor_pago = Some(paid);
        }
        if let Some(observacoes) = &self.observacoes {
            record.observacoes = text(observacoes);
        }
    }
}
