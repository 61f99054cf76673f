//! Display helpers shared by every front-end.

use chrono::{DateTime, NaiveDate};

/// Render `YYYY-MM-DD` or an RFC 3339 timestamp as `DD/MM/YYYY`.
///
/// Anything else is returned unchanged.
pub fn format_fecha(raw: &str) -> String {
    let trimmed = raw.trim();
    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return date.format("%d/%m/%Y").to_string();
    }
    if let Ok(stamp) = DateTime::parse_from_rfc3339(trimmed) {
        return stamp.date_naive().format("%d/%m/%Y").to_string();
    }
    // Server timestamps without an offset, e.g. 2024-01-15T00:00:00.000
    if let Some((day, _)) = trimmed.split_once('T') {
        if let Ok(date) = NaiveDate::parse_from_str(day, "%Y-%m-%d") {
            return date.format("%d/%m/%Y").to_string();
        }
    }
    trimmed.to_string()
}

pub fn minutos_label(minutos: u32) -> String {
    if minutos == 1 {
        "1 minuto".to_string()
    } else {
        format!("{minutos} minutos")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_plain_dates_and_timestamps() {
        assert_eq!(format_fecha("2024-01-15"), "15/01/2024");
        assert_eq!(format_fecha("2024-02-01T06:00:00Z"), "01/02/2024");
        assert_eq!(format_fecha("2024-03-09T00:00:00.000"), "09/03/2024");
        assert_eq!(format_fecha("mañana"), "mañana");
    }

    #[test]
    fn minutos_are_pluralised() {
        assert_eq!(minutos_label(1), "1 minuto");
        assert_eq!(minutos_label(15), "15 minutos");
    }
}
