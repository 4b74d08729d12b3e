use chrono::{DateTime, SecondsFormat, Utc};

use crate::error::StoreError;

/// Fixed-width RFC 3339 so that text ordering matches time ordering.
pub fn format_timestamp(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

/// Parse an RFC 3339 timestamp column, returning CorruptRow on failure.
pub fn parse_timestamp(
    raw: &str,
    table: &'static str,
    column: &'static str,
) -> Result<DateTime<Utc>, StoreError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| StoreError::CorruptRow {
            table,
            column,
            detail: format!("invalid timestamp {raw:?}: {e}"),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_rfc3339() {
        let dt = parse_timestamp("2026-03-01T10:00:00.5+00:00", "t", "c").unwrap();
        assert_eq!(dt.to_rfc3339(), "2026-03-01T10:00:00.500+00:00");
    }

    #[test]
    fn formatted_timestamps_sort_chronologically() {
        let early = DateTime::parse_from_rfc3339("2026-03-01T10:00:00Z").unwrap().with_timezone(&Utc);
        let late = DateTime::parse_from_rfc3339("2026-03-01T10:00:00.5Z").unwrap().with_timezone(&Utc);
        let (a, b) = (format_timestamp(&early), format_timestamp(&late));
        assert_eq!(a.len(), b.len());
        assert!(a < b);
        assert_eq!(parse_timestamp(&b, "t", "c").unwrap(), late);
    }

    #[test]
    fn garbage_is_corrupt_row() {
        let err = parse_timestamp("yesterday", "audio_files", "uploaded_at").unwrap_err();
        match err {
            StoreError::CorruptRow { table, column, .. } => {
                assert_eq!(table, "audio_files");
                assert_eq!(column, "uploaded_at");
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
