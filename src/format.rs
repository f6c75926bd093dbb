//! pt-BR display formatting
//!
//! Currency, dates and percentages the way Brazilian users expect to read
//! them: `R$ 1.234,56`, `12/05/2025`, `33,3%`.

use chrono::{DateTime, NaiveDate, NaiveDateTime};

/// Format a value as Brazilian reais (`R$ 4.120.901,70`)
pub fn currency(value: f64) -> String {
    if !value.is_finite() {
        return "R$ 0,00".to_string();
    }
    let cents = (value.abs() * 100.0).round() as u64;
    let units = group_thousands(cents / 100);
    let sign = if value < 0.0 && cents > 0 { "-" } else { "" };
    format!("{}R$ {},{:02}", sign, units, cents % 100)
}

/// Compact currency for narrow cells (`R$ 4,1 mi`, `R$ 242,0 mil`)
pub fn currency_compact(value: f64) -> String {
    let abs = value.abs();
    let sign = if value < 0.0 { "-" } else { "" };
    if abs >= 1_000_000_000.0 {
        format!("{}R$ {} bi", sign, decimal_comma(abs / 1_000_000_000.0, 1))
    } else if abs >= 1_000_000.0 {
        format!("{}R$ {} mi", sign, decimal_comma(abs / 1_000_000.0, 1))
    } else if abs >= 1_000.0 {
        format!("{}R$ {} mil", sign, decimal_comma(abs / 1_000.0, 1))
    } else {
        currency(value)
    }
}

/// Share of `part` in `total` as a pt-BR percentage with one decimal
pub fn percent(part: u64, total: u64) -> String {
    if total == 0 {
        return "0,0%".to_string();
    }
    let pct = part as f64 * 100.0 / total as f64;
    format!("{}%", decimal_comma(pct, 1))
}

/// Parse the timestamp shapes PNCP and SQLite hand us
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.naive_local());
    }
    for pattern in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, pattern) {
            return Some(dt);
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// `2025-05-12T08:16:48` -> `12/05/2025`. Unparsable input is returned as-is.
pub fn date(raw: &str) -> String {
    if raw.trim().is_empty() {
        return "-".to_string();
    }
    match parse_timestamp(raw) {
        Some(dt) => dt.format("%d/%m/%Y").to_string(),
        None => raw.to_string(),
    }
}

/// `2025-05-12T08:16:48` -> `12/05/2025 às 08:16`
pub fn datetime(raw: &str) -> String {
    if raw.trim().is_empty() {
        return "-".to_string();
    }
    match parse_timestamp(raw) {
        Some(dt) => dt.format("%d/%m/%Y às %H:%M").to_string(),
        None => raw.to_string(),
    }
}

/// Cut `text` to `max` characters, marking the cut with `...`
pub fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let head: String = text.chars().take(max).collect();
    format!("{}...", head)
}

/// Pad or cut to an exact display width (used by fixed-width table cells)
pub fn fit(text: &str, width: usize) -> String {
    let count = text.chars().count();
    if count > width {
        if width <= 1 {
            return text.chars().take(width).collect();
        }
        let head: String = text.chars().take(width - 1).collect();
        format!("{}…", head)
    } else {
        format!("{}{}", text, " ".repeat(width - count))
    }
}

fn decimal_comma(value: f64, decimals: usize) -> String {
    format!("{:.*}", decimals, value).replace('.', ",")
}

fn group_thousands(mut n: u64) -> String {
    if n == 0 {
        return "0".to_string();
    }
    let mut groups = Vec::new();
    while n > 0 {
        groups.push(n % 1000);
        n /= 1000;
    }
    let mut out = groups.pop().map(|g| g.to_string()).unwrap_or_default();
    while let Some(g) = groups.pop() {
        out.push_str(&format!(".{:03}", g));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_currency_groups_thousands() {
        assert_eq!(currency(4_120_901.70), "R$ 4.120.901,70");
        assert_eq!(currency(242_030.0), "R$ 242.030,00");
        assert_eq!(currency(999.999), "R$ 1.000,00");
    }

    #[test]
    fn test_currency_zero_and_negative() {
        assert_eq!(currency(0.0), "R$ 0,00");
        assert_eq!(currency(-1.5), "-R$ 1,50");
        assert_eq!(currency(-0.001), "R$ 0,00");
    }

    #[test]
    fn test_currency_compact() {
        assert_eq!(currency_compact(7_631_669.79), "R$ 7,6 mi");
        assert_eq!(currency_compact(242_030.0), "R$ 242,0 mil");
        assert_eq!(currency_compact(12.5), "R$ 12,50");
    }

    #[test]
    fn test_percent() {
        assert_eq!(percent(1, 3), "33,3%");
        assert_eq!(percent(3, 3), "100,0%");
        assert_eq!(percent(5, 0), "0,0%");
    }

    #[test]
    fn test_date_formats() {
        assert_eq!(date("2025-05-12T08:16:48"), "12/05/2025");
        assert_eq!(date("2025-05-12 08:16:48"), "12/05/2025");
        assert_eq!(date("2025-05-12T08:16:48.123Z"), "12/05/2025");
        assert_eq!(date("2025-05-12"), "12/05/2025");
        assert_eq!(date(""), "-");
        assert_eq!(date("ontem"), "ontem");
    }

    #[test]
    fn test_datetime_format() {
        assert_eq!(datetime("2025-05-13T07:19:16"), "13/05/2025 às 07:19");
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("Aquisição", 20), "Aquisição");
        assert_eq!(truncate("Aquisição de cimento", 9), "Aquisição...");
    }

    #[test]
    fn test_fit() {
        assert_eq!(fit("abc", 5), "abc  ");
        assert_eq!(fit("abcdef", 4), "abc…");
    }
}
