//! Display formatting for dates and numbers.

use chrono::NaiveDate;

/// "2026-03-05" → "Mar 5, 2026". Empty input yields "", unparseable input
/// is returned unchanged.
pub fn format_date(date: &str) -> String {
    let date = date.trim();
    if date.is_empty() {
        return String::new();
    }
    match NaiveDate::parse_from_str(date, "%Y-%m-%d") {
        Ok(parsed) => parsed.format("%b %-d, %Y").to_string(),
        Err(_) => date.to_string(),
    }
}

/// Thousands separators: 1234567 → "1,234,567".
pub fn format_number(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Two decimals with thousands separators: 1234.5 → "1,234.50".
pub fn format_amount(amount: f64) -> String {
    let sign = if amount < 0.0 { "-" } else { "" };
    let cents = (amount.abs() * 100.0).round() as u64;
    format!("{sign}{}.{:02}", format_number(cents / 100), cents % 100)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_date() {
        assert_eq!(format_date("2026-03-05"), "Mar 5, 2026");
        assert_eq!(format_date("2025-12-25"), "Dec 25, 2025");
        assert_eq!(format_date(""), "");
        assert_eq!(format_date("soon"), "soon");
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(0), "0");
        assert_eq!(format_number(999), "999");
        assert_eq!(format_number(1000), "1,000");
        assert_eq!(format_number(67_391_582), "67,391,582");
    }

    #[test]
    fn test_format_amount() {
        assert_eq!(format_amount(1234.5), "1,234.50");
        assert_eq!(format_amount(0.004), "0.00");
        assert_eq!(format_amount(-12.5), "-12.50");
    }
}
