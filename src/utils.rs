use crate::error::{CaseTrackerError, Result};
use chrono::NaiveDate;

pub const BIRTH_DATE_FORMAT: &str = "%d/%m/%Y";

/// Text the sheet client produces for empty numeric cells.
const MISSING_MARKERS: [&str; 4] = ["nan", "none", "null", "<na>"];

/// Reads a cell as display text, mapping `nan`-style placeholders to `""`.
pub fn clean_value(raw: &str) -> String {
    let trimmed = raw.trim();
    if MISSING_MARKERS
        .iter()
        .any(|marker| trimmed.eq_ignore_ascii_case(marker))
    {
        return String::new();
    }
    raw.to_string()
}

/// Parses a currency-ish cell ("1500", "1.500,00", "R$ 1,500.50", "(200)").
/// Returns `None` for blanks and anything unparseable.
pub fn parse_decimal(raw: &str) -> Option<f64> {
    let cleaned = clean_value(raw);
    let cleaned = cleaned.trim();
    if cleaned.is_empty() {
        return None;
    }

    // Accounting negatives
    let is_negative = cleaned.starts_with('(') && cleaned.ends_with(')');
    let cleaned = if is_negative {
        &cleaned[1..cleaned.len() - 1]
    } else {
        cleaned
    };

    let cleaned: String = cleaned
        .replace("R$", "")
        .chars()
        .filter(|c| !matches!(c, '€' | '$' | '£' | ' ' | '\u{a0}'))
        .collect();

    let normalized = match (cleaned.rfind(','), cleaned.rfind('.')) {
        // Both present: whichever comes last is the decimal separator.
        (Some(comma), Some(dot)) if comma > dot => cleaned.replace('.', "").replace(',', "."),
        (Some(_), Some(_)) => cleaned.replace(',', ""),
        (Some(comma), None) => {
            let after_comma = cleaned.len() - comma - 1;
            if cleaned.matches(',').count() == 1 && after_comma <= 2 {
                cleaned.replace(',', ".")
            } else {
                cleaned.replace(',', "")
            }
        }
        (None, _) => cleaned,
    };

    match normalized.parse::<f64>() {
        Ok(value) if value.is_finite() => Some(if is_negative { -value } else { value }),
        _ => None,
    }
}

/// Numeric coercion used for every financial column: blank or unparseable is 0.0.
pub fn coerce_decimal(raw: &str) -> f64 {
    parse_decimal(raw).unwrap_or(0.0)
}

/// Ids come back from the sheet as "3" or "3.0". Anything non-integral is absent.
pub fn parse_id(raw: &str) -> Option<i64> {
    let trimmed = raw.trim();
    if let Ok(id) = trimmed.parse::<i64>() {
        return Some(id);
    }
    // `as i64` saturates, so out-of-range floats are rejected first.
    // `i64::MAX as f64` rounds up to 2^63, hence the exclusive upper bound.
    const LOWER: f64 = i64::MIN as f64;
    const UPPER: f64 = i64::MAX as f64;
    match trimmed.parse::<f64>() {
        Ok(value) if value.fract() == 0.0 && (LOWER..UPPER).contains(&value) => Some(value as i64),
        _ => None,
    }
}

/// Rejects amounts that are not finite or below zero.
pub(crate) fn check_amount(field: &str, value: f64) -> Result<()> {
    if !value.is_finite() {
        return Err(CaseTrackerError::validation(field, "must be a number"));
    }
    if value < 0.0 {
        return Err(CaseTrackerError::validation(
            field,
            format!("must not be negative (got {})", value),
        ));
    }
    Ok(())
}

/// Storage representation of a number: shortest text that reads back to the
/// same `f64`, without a trailing ".0".
pub fn format_number(value: f64) -> String {
    if value == 0.0 {
        return "0".to_string();
    }
    format!("{}", value)
}

/// Two decimals with comma thousands separators.
pub fn format_decimal(value: f64) -> String {
    let fixed = format!("{:.2}", value.abs());
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (idx, ch) in int_part.chars().enumerate() {
        if idx > 0 && (int_part.len() - idx) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if value < 0.0 && fixed != "0.00" { "-" } else { "" };
    format!("{}{}.{}", sign, grouped, frac_part)
}

pub fn format_currency(value: f64, symbol: &str) -> String {
    format!("{} {}", symbol, format_decimal(value))
}

pub fn earliest_birth_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(1900, 1, 1).unwrap_or(NaiveDate::MIN)
}

pub fn parse_birth_date(raw: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), BIRTH_DATE_FORMAT).map_err(|_| {
        CaseTrackerError::InvalidBirthDate(format!(
            "'{}' is not a valid date. Expected DD/MM/YYYY",
            raw
        ))
    })
}

/// Birth dates must fall between 1900-01-01 and `today`, inclusive.
pub fn validate_birth_date(date: NaiveDate, today: NaiveDate) -> Result<()> {
    if date > today {
        return Err(CaseTrackerError::InvalidBirthDate(format!(
            "{} is in the future",
            date.format(BIRTH_DATE_FORMAT)
        )));
    }
    if date < earliest_birth_date() {
        return Err(CaseTrackerError::InvalidBirthDate(format!(
            "{} is before 01/01/1900",
            date.format(BIRTH_DATE_FORMAT)
        )));
    }
    Ok(())
}

pub fn format_birth_date(date: NaiveDate) -> String {
    date.format(BIRTH_DATE_FORMAT).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_decimal_formats() {
        assert_eq!(parse_decimal("1500"), Some(1500.0));
        assert_eq!(parse_decimal(" 1500.75 "), Some(1500.75));
        assert_eq!(parse_decimal("1.500,00"), Some(1500.0));
        assert_eq!(parse_decimal("R$ 1,500.50"), Some(1500.5));
        assert_eq!(parse_decimal("€ 300,5"), Some(300.5));
        assert_eq!(parse_decimal("1,234,567"), Some(1_234_567.0));
        assert_eq!(parse_decimal("(200)"), Some(-200.0));
    }

    #[test]
    fn test_parse_decimal_rejects_garbage() {
        assert_eq!(parse_decimal(""), None);
        assert_eq!(parse_decimal("   "), None);
        assert_eq!(parse_decimal("nan"), None);
        assert_eq!(parse_decimal("pendente"), None);
        assert_eq!(parse_decimal("inf"), None);
        assert_eq!(coerce_decimal("pendente"), 0.0);
    }

    #[test]
    fn test_parse_id() {
        assert_eq!(parse_id("3"), Some(3));
        assert_eq!(parse_id("7.0"), Some(7));
        assert_eq!(parse_id(" 12 "), Some(12));
        assert_eq!(parse_id("3.5"), None);
        assert_eq!(parse_id(""), None);
        assert_eq!(parse_id("ID"), None);
    }

    #[test]
    fn test_parse_id_rejects_out_of_range_floats() {
        assert_eq!(parse_id("1e30"), None);
        assert_eq!(parse_id("-1e30"), None);
        assert_eq!(parse_id("9223372036854775808"), None);
        assert_eq!(parse_id("inf"), None);
        assert_eq!(parse_id("9223372036854775807"), Some(i64::MAX));
        assert_eq!(parse_id("1e3"), Some(1000));
    }

    #[test]
    fn test_check_amount() {
        assert!(check_amount("valor_pago", 0.0).is_ok());
        assert!(check_amount("valor_pago", 12.5).is_ok());
        assert!(check_amount("valor_pago", -0.01).is_err());
        assert!(check_amount("valor_pago", f64::NAN).is_err());
        assert!(check_amount("valor_pago", f64::INFINITY).is_err());
    }

    #[test]
    fn test_clean_value() {
        assert_eq!(clean_value("nan"), "");
        assert_eq!(clean_value("NaN"), "");
        assert_eq!(clean_value("Maria"), "Maria");
        assert_eq!(clean_value("Nanda"), "Nanda");
    }

    #[test]
    fn test_format_number_round_trips() {
        assert_eq!(format_number(700.0), "700");
        assert_eq!(format_number(-0.0), "0");
        assert_eq!(format_number(700.05), "700.05");
        let value = 1000.1 - 300.05;
        assert_eq!(format_number(value).parse::<f64>().unwrap(), value);
    }

    #[test]
    fn test_format_currency() {
        assert_eq!(format_currency(1500.0, "R$"), "R$ 1,500.00");
        assert_eq!(format_currency(0.0, "€"), "€ 0.00");
        assert_eq!(format_currency(1_234_567.891, "R$"), "R$ 1,234,567.89");
        assert_eq!(format_currency(-250.5, "R$"), "R$ -250.50");
        assert_eq!(format_decimal(999.999), "1,000.00");
    }

    #[test]
    fn test_birth_date_validation() {
        let today = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();

        let date = parse_birth_date("15/03/1985").unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(1985, 3, 15).unwrap());
        assert!(validate_birth_date(date, today).is_ok());
        assert!(validate_birth_date(today, today).is_ok());

        let tomorrow = NaiveDate::from_ymd_opt(2024, 6, 2).unwrap();
        assert!(validate_birth_date(tomorrow, today).is_err());

        let too_old = NaiveDate::from_ymd_opt(1899, 12, 31).unwrap();
        assert!(validate_birth_date(too_old, today).is_err());

        assert!(parse_birth_date("1985-03-15").is_err());
        assert_eq!(format_birth_date(date), "15/03/1985");
    }
}
