//! Header normalization for sheets whose column titles were typed by hand.
//!
//! Raw headers arrive in mixed case, with accents, spaces, slashes and hyphens
//! (`"Valor Honorários"`, `"e-Mail"`, `"Data/Hora"`). Every header is mapped to
//! an upper-case ASCII-ish identifier (`VALOR_HONORARIOS`, `E_MAIL`,
//! `DATA_HORA`). Headers that collide after normalization are kept as-is.

use crate::schema::{CanonicalColumn, RawTable};
use log::debug;

/// Marker found in the decorative banner row some sheets carry above the
/// real header row.
pub const TITLE_ROW_MARKER: &str = "CONTROLE";

fn transliterate(ch: char) -> char {
    match ch {
        'À' | 'Á' | 'Â' | 'Ã' => 'A',
        'É' | 'Ê' => 'E',
        'Í' => 'I',
        'Ó' | 'Ô' | 'Õ' => 'O',
        'Ú' | 'Ü' => 'U',
        'Ç' => 'C',
        other => other,
    }
}

/// Canonical form of a single header. Never fails, and is idempotent.
pub fn normalize_header(raw: &str) -> String {
    let mapped: String = raw
        .trim()
        .to_uppercase()
        .chars()
        .map(|ch| match ch {
            ' ' | '/' | '-' => '_',
            other => transliterate(other),
        })
        .collect();

    let mut collapsed = mapped;
    while collapsed.contains("__") {
        collapsed = collapsed.replace("__", "_");
    }
    collapsed
}

pub fn normalize_headers<S: AsRef<str>>(raw: &[S]) -> Vec<String> {
    raw.iter().map(|h| normalize_header(h.as_ref())).collect()
}

/// A banner row masquerading as headers: its second cell mentions "CONTROLE".
pub fn is_title_row<S: AsRef<str>>(headers: &[S]) -> bool {
    headers
        .get(1)
        .map(|cell| cell.as_ref().to_uppercase().contains(TITLE_ROW_MARKER))
        .unwrap_or(false)
}

/// Applies title-row detection, header normalization and row-width
/// alignment. Rows without an applicant name are dropped.
pub fn normalize_raw_table(raw: &RawTable) -> RawTable {
    let (headers, body) = if is_title_row(&raw.headers) {
        debug!(
            "Title row detected ('{}'); promoting the first data row to headers",
            raw.headers.get(1).map(String::as_str).unwrap_or_default()
        );
        match raw.rows.split_first() {
            Some((real_headers, rest)) => (real_headers.clone(), rest.to_vec()),
            None => (Vec::new(), Vec::new()),
        }
    } else {
        (raw.headers.clone(), raw.rows.clone())
    };

    let headers = normalize_headers(&headers);
    let width = headers.len();

    let requerente_idx = headers
        .iter()
        .position(|h| CanonicalColumn::from_header(h) == Some(CanonicalColumn::Requerente));

    let mut dropped = 0usize;
    let rows: Vec<Vec<String>> = body
        .into_iter()
        .map(|mut row| {
            row.resize(width, String::new());
            row
        })
        .filter(|row| {
            let keep = requerente_idx
                .map(|idx| !crate::utils::clean_value(&row[idx]).trim().is_empty())
                .unwrap_or(false);
            if !keep {
                dropped += 1;
            }
            keep
        })
        .collect();

    if requerente_idx.is_none() && !raw.rows.is_empty() {
        debug!("No REQUERENTE column after normalization; all rows dropped");
    } else if dropped > 0 {
        debug!("Dropped {} row(s) without an applicant name", dropped);
    }

    RawTable { headers, rows }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_normalize_header_examples() {
        assert_eq!(normalize_header("  Requerente "), "REQUERENTE");
        assert_eq!(normalize_header("Valor Honorários"), "VALOR_HONORARIOS");
        assert_eq!(normalize_header("Observações"), "OBSERVACOES");
        assert_eq!(normalize_header("Aniversário"), "ANIVERSARIO");
        assert_eq!(normalize_header("e-Mail"), "E_MAIL");
        assert_eq!(normalize_header("Data/Hora"), "DATA_HORA");
        assert_eq!(normalize_header("Valor - Pago"), "VALOR_PAGO");
        assert_eq!(normalize_header("Número do Processo"), "NUMERO_DO_PROCESSO");
        assert_eq!(normalize_header(""), "");
    }

    #[test]
    fn test_canonical_headers_are_unchanged() {
        let canonical: Vec<&str> = CanonicalColumn::ALL.iter().map(|c| c.header()).collect();
        assert_eq!(normalize_headers(&canonical), canonical);
    }

    #[test]
    fn test_collisions_are_not_deduplicated() {
        let headers = normalize_headers(&["Status", "STATUS ", "status"]);
        assert_eq!(headers, vec!["STATUS", "STATUS", "STATUS"]);
    }

    #[test]
    fn test_title_row_is_skipped() {
        let raw = RawTable::from_strs(
            &["", "CONTROLE DE PROCESSOS", ""],
            &[&["ID", "Requerente", "Status"], &["1", "Ana", "SUBMETIDO"]],
        );

        let normalized = normalize_raw_table(&raw);

        assert_eq!(normalized.headers, vec!["ID", "REQUERENTE", "STATUS"]);
        assert_eq!(normalized.rows.len(), 1);
        assert_eq!(normalized.rows[0][1], "Ana");
    }

    #[test]
    fn test_title_row_without_body_yields_empty_table() {
        let raw = RawTable::from_strs(&["", "Controle Nacionalidade"], &[]);
        let normalized = normalize_raw_table(&raw);
        assert!(normalized.headers.is_empty());
        assert!(normalized.rows.is_empty());
    }

    #[test]
    fn test_rows_without_applicant_are_dropped_and_short_rows_padded() {
        let raw = RawTable::from_strs(
            &["ID", "Requerente", "Status"],
            &[&["1", "Ana"], &["2", "", "SUBMETIDO"], &["3", "nan", "x"], &["4", "Bia", "DECISÃO"]],
        );

        let normalized = normalize_raw_table(&raw);

        assert_eq!(normalized.rows.len(), 2);
        assert_eq!(normalized.rows[0], vec!["1", "Ana", ""]);
        assert_eq!(normalized.rows[1][1], "Bia");
    }

    #[test]
    fn test_missing_applicant_column_drops_everything() {
        let raw = RawTable::from_strs(&["ID", "Nome"], &[&["1", "Ana"]]);
        let normalized = normalize_raw_table(&raw);
        assert_eq!(normalized.headers, vec!["ID", "NOME"]);
        assert!(normalized.rows.is_empty());
    }

    proptest! {
        #[test]
        fn prop_normalize_header_is_idempotent(raw in "[ a-zA-Z0-9çÇéÉêÊáÁâÂãÃõÕóÓíÍúÚ/_\\-]{0,24}") {
            let once = normalize_header(&raw);
            prop_assert_eq!(normalize_header(&once), once.clone());
        }

        #[test]
        fn prop_normalized_headers_have_no_separators(raw in "[ a-zA-Z/_\\-]{0,24}") {
            let normalized = normalize_header(&raw);
            prop_assert!(!normalized.contains(' '));
            prop_assert!(!normalized.contains('/'));
            prop_assert!(!normalized.contains('-'));
            prop_assert!(!normalized.contains("__"));
        }
    }
}
