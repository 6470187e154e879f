use crate::schema::CaseRecord;
use crate::utils::coerce_decimal;
use log::debug;

/// Balance due = fees − paid.
pub fn compute_balance(fees: f64, paid: f64) -> f64 {
    let fees = if fees.is_finite() { fees } else { 0.0 };
    let paid = if paid.is_finite() { paid } else { 0.0 };
    fees - paid
}

/// Same as [`compute_balance`] for operands still in cell form; blanks and
/// unparseable text count as zero.
pub fn compute_balance_from_text(fees: &str, paid: &str) -> f64 {
    compute_balance(coerce_decimal(fees), coerce_decimal(paid))
}

/// Overwrites `saldo_devedor` from the record's own fees and paid amounts.
/// Runs on every create and update, whatever balance the caller supplied.
pub fn apply_derived_fields(record: &mut CaseRecord) {
    let balance = compute_balance(record.fees(), record.paid());
    if let Some(previous) = record.saldo_devedor {
        if previous != balance {
            debug!(
                "Recomputed balance for '{}': {} -> {}",
                record.requerente, previous, balance
            );
        }
    }
    record.saldo_devedor = Some(balance);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compute_balance() {
        assert_eq!(compute_balance(1000.0, 300.0), 700.0);
        assert_eq!(compute_balance(0.0, 0.0), 0.0);
        assert_eq!(compute_balance(100.0, 250.0), -150.0);
        assert_eq!(compute_balance(f64::NAN, 50.0), -50.0);
    }

    #[test]
    fn test_compute_balance_from_text_coerces() {
        assert_eq!(compute_balance_from_text("1000", "300"), 700.0);
        assert_eq!(compute_balance_from_text("", "300"), -300.0);
        assert_eq!(compute_balance_from_text("1.200,50", "abc"), 1200.5);
    }

    #[test]
    fn test_apply_derived_fields_overrides_supplied_balance() {
        let mut record = CaseRecord {
            requerente: "Ana".to_string(),
            valor_honorarios: Some(1000.0),
            valor_pago: Some(300.0),
            saldo_devedor: Some(9999.0),
            ..Default::default()
        };

        apply_derived_fields(&mut record);

        assert_eq!(record.saldo_devedor, Some(700.0));
    }

    #[test]
    fn test_apply_derived_fields_treats_missing_operands_as_zero() {
        let mut record = CaseRecord {
            requerente: "Bia".to_string(),
            valor_pago: Some(150.25),
            ..Default::default()
        };

        apply_derived_fields(&mut record);

        assert_eq!(record.saldo_devedor, Some(-150.25));
    }
}
